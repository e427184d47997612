//! Order-preserving path encoding
//!
//! A path is a sequence of components (names or non-negative indices).
//! Each component encodes to a self-delimiting byte string, so:
//! - the encoding of a path is a byte prefix of the encoding of every path below it
//! - sibling indices sort numerically (big-endian, fixed width)
//! - distinct paths never share an encoding
//!
//! Layout per component:
//!
//! ```text
//! name:  0x01 <utf8 bytes, 0x00 escaped as 0x00 0xff> 0x00 0x00
//! index: 0x02 <u64 big-endian>
//! ```

use crate::{Error, Result};

const TYPE_NAME: u8 = 0x01;
const TYPE_INDEX: u8 = 0x02;
const ESCAPE: u8 = 0xff;

/// Byte appended to a subtree prefix to obtain a key greater than every key in it
pub const SUBTREE_END: u8 = 0xff;

/// One step of a hierarchical path
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PathComponent {
    /// Named child (container, run hash, metric name, ...)
    Name(String),
    /// Integer child (array index, step)
    Index(u64),
}

impl From<&str> for PathComponent {
    fn from(name: &str) -> Self {
        Self::Name(name.to_string())
    }
}

impl From<String> for PathComponent {
    fn from(name: String) -> Self {
        Self::Name(name)
    }
}

impl From<u64> for PathComponent {
    fn from(idx: u64) -> Self {
        Self::Index(idx)
    }
}

/// Encode a single component, appending to `out`
pub fn encode_component(component: &PathComponent, out: &mut Vec<u8>) {
    match component {
        PathComponent::Name(name) => {
            out.push(TYPE_NAME);
            for &b in name.as_bytes() {
                out.push(b);
                if b == 0x00 {
                    out.push(ESCAPE);
                }
            }
            out.extend_from_slice(&[0x00, 0x00]);
        }
        PathComponent::Index(idx) => {
            out.push(TYPE_INDEX);
            out.extend_from_slice(&idx.to_be_bytes());
        }
    }
}

/// Encode a full path
#[must_use]
pub fn encode_path<'a, I>(path: I) -> Vec<u8>
where
    I: IntoIterator<Item = &'a PathComponent>,
{
    let mut out = Vec::new();
    for component in path {
        encode_component(component, &mut out);
    }
    out
}

/// Convenience: encode a path made only of names
#[must_use]
pub fn encode_names(names: &[&str]) -> Vec<u8> {
    let path: Vec<PathComponent> = names.iter().map(|&n| PathComponent::from(n)).collect();
    encode_path(&path)
}

/// Decode the first component of `bytes`, returning it and the remaining bytes
///
/// # Errors
/// Returns `Error::Encoding` on truncated or unknown input
pub fn decode_component(bytes: &[u8]) -> Result<(PathComponent, &[u8])> {
    let (&tag, rest) = bytes
        .split_first()
        .ok_or_else(|| Error::Encoding("empty component".to_string()))?;

    match tag {
        TYPE_INDEX => {
            if rest.len() < 8 {
                return Err(Error::Encoding("index component truncated".to_string()));
            }
            let mut buf = [0u8; 8];
            buf.copy_from_slice(&rest[..8]);
            Ok((PathComponent::Index(u64::from_be_bytes(buf)), &rest[8..]))
        }
        TYPE_NAME => {
            let mut name = Vec::new();
            let mut i = 0;
            loop {
                match (rest.get(i), rest.get(i + 1)) {
                    (Some(0x00), Some(0x00)) => break,
                    (Some(0x00), Some(&ESCAPE)) => {
                        name.push(0x00);
                        i += 2;
                    }
                    (Some(&b), _) if b != 0x00 => {
                        name.push(b);
                        i += 1;
                    }
                    _ => return Err(Error::Encoding("name component truncated".to_string())),
                }
            }
            let name = String::from_utf8(name)
                .map_err(|e| Error::Encoding(format!("name component is not utf-8: {e}")))?;
            Ok((PathComponent::Name(name), &rest[i + 2..]))
        }
        other => Err(Error::Encoding(format!("unknown component tag {other:#04x}"))),
    }
}

/// Decode a key that must be exactly one index component
///
/// # Errors
/// Returns `Error::Encoding` if `bytes` is not a single index component
pub fn decode_index(bytes: &[u8]) -> Result<u64> {
    match decode_component(bytes)? {
        (PathComponent::Index(idx), []) => Ok(idx),
        (PathComponent::Index(_), _) => Err(Error::Encoding(
            "trailing bytes after index component".to_string(),
        )),
        (PathComponent::Name(name), _) => Err(Error::Encoding(format!(
            "expected index component, found name {name:?}"
        ))),
    }
}

/// Smallest key strictly greater than every key that starts with `prefix`
#[must_use]
pub fn subtree_end(prefix: &[u8]) -> Vec<u8> {
    let mut end = prefix.to_vec();
    end.push(SUBTREE_END);
    end
}
