//! Tests for error types

use shardview::Error;
use std::path::PathBuf;

#[test]
fn test_not_found_error() {
    let error = Error::NotFound("index 7".to_string());
    assert!(error.is_not_found());
    assert!(format!("{error}").contains("index 7"));
}

#[test]
fn test_invalid_argument_error() {
    let error = Error::InvalidArgument("slice step cannot be zero".to_string());
    let error_str = format!("{error}");
    assert!(error_str.contains("Invalid argument"));
    assert!(error_str.contains("step"));
    assert!(!error.is_not_found());
}

#[test]
fn test_unsupported_error() {
    let error = Error::Unsupported("slice subscripts".to_string());
    assert!(format!("{error}").contains("Not implemented"));
}

#[test]
fn test_backend_unavailable_error() {
    let error = Error::BackendUnavailable {
        path: PathBuf::from("/data/meta/index"),
        reason: "shard directory does not exist".to_string(),
    };
    let error_str = format!("{error}");
    assert!(error_str.contains("/data/meta/index"));
    assert!(error_str.contains("does not exist"));
}

#[test]
fn test_type_mismatch_error() {
    let error = Error::TypeMismatch {
        expected: "float".to_string(),
        found: "str".to_string(),
    };
    let error_str = format!("{error}");
    assert!(error_str.contains("float"));
    assert!(error_str.contains("str"));
}

#[test]
fn test_io_error_conversion() {
    let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
    let error: Error = io.into();
    assert!(matches!(error, Error::Io(_)));
    assert!(!error.is_not_found());
}

#[test]
fn test_serde_error_conversion() {
    let bad = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
    let error: Error = bad.into();
    assert!(matches!(error, Error::Serde(_)));
}

#[test]
fn test_error_debug() {
    let error = Error::ReadOnly("set on a container-backed tree".to_string());
    let debug_str = format!("{error:?}");
    assert!(debug_str.contains("ReadOnly"));
}
