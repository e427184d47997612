//! Metric sequences of one run
//!
//! Each run owns the chunk domain named by its hash. Metric values live at
//!
//! ```text
//! <container> / chunks / <run hash> / seqs / <metric> / val / <step>
//! ```

use crate::array::TreeArrayView;
use crate::encoding::{encode_names, PathComponent};
use crate::shard::{chunk_domain, CHUNKS_DIR};
use crate::tree::KeyTree;
use crate::union::UnionStore;
use crate::value::ElementType;
use crate::{Error, Result};
use std::sync::Arc;

/// Subtree holding a run's sequences
pub const SEQS: &str = "seqs";
/// Leaf subtree holding a sequence's values
pub const VALUES: &str = "val";

/// Tree path of `metric`'s values in run `run_hash`
#[must_use]
pub fn metric_path(container: &str, run_hash: &str, metric: &str) -> Vec<PathComponent> {
    [container, CHUNKS_DIR, run_hash, SEQS, metric, VALUES]
        .into_iter()
        .map(PathComponent::from)
        .collect()
}

/// Read-only view of one run's sequences
#[derive(Debug, Clone)]
pub struct RunView {
    hash: String,
    seqs: KeyTree,
}

impl RunView {
    /// Open run `run_hash` of `store`'s container
    ///
    /// # Errors
    /// `Error::InvalidArgument` for an empty hash, or shard resolution failures
    pub fn open(store: &Arc<UnionStore>, run_hash: &str) -> Result<Self> {
        if run_hash.is_empty() {
            return Err(Error::InvalidArgument("run hash must not be empty".to_string()));
        }
        let run = store.view(&chunk_domain(store.name(), run_hash))?;
        Ok(Self {
            hash: run_hash.to_string(),
            seqs: KeyTree::new(run.subview(&encode_names(&[SEQS]))),
        })
    }

    /// Run hash
    #[must_use]
    pub fn hash(&self) -> &str {
        &self.hash
    }

    /// Values of `name`, indexed by step
    #[must_use]
    pub fn metric(&self, name: &str) -> TreeArrayView<KeyTree> {
        TreeArrayView::new(
            self.seqs.subtree(name).subtree(VALUES),
            Some(ElementType::Float),
        )
    }

    /// Names of the run's metrics, sorted
    ///
    /// # Errors
    /// Backend read failures
    pub fn metric_names(&self) -> Result<Vec<String>> {
        self.seqs.child_names()
    }
}
