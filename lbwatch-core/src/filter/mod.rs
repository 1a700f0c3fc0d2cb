//! File filters consulted once per candidate file and poll cycle.

use std::{fmt, sync::Arc};

use lbwatch_model::{CandidateFile, WatcherPriority};

mod factory;
mod name;
mod priority;

pub use factory::PriorityFilterFactory;
pub use name::NameFilter;
pub use priority::{FALLBACK_BUCKET, PriorityFileFilter, partition_bucket};

/// Admit/reject decision for a candidate file.
///
/// Implementations must not fail: any pathology in the candidate has to be
/// absorbed into a deterministic answer.
pub trait FileFilter: Send + Sync + fmt::Debug {
    fn accept(&self, file: &CandidateFile) -> bool;

    /// Watcher priority, for filters that partition a pool.
    ///
    /// Only filters exposing a priority get their endpoint's destination
    /// tagged.
    fn priority(&self) -> Option<WatcherPriority> {
        None
    }
}

/// Filter handle stored on an endpoint.
pub type SharedFilter = Arc<dyn FileFilter>;
