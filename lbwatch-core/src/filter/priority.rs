use std::{fmt, sync::Arc};

use lbwatch_model::{CandidateFile, WatcherPriority};
use sha2::{Digest, Sha256};
use tracing::trace;

use super::{FileFilter, factory::PoolState};

/// Bucket for candidates without a usable name. Owned by the base-priority
/// watcher.
pub const FALLBACK_BUCKET: usize = 0;

/// Bucket (zero based watcher index) owning `file` in a pool of `pool_size`.
///
/// The first eight bytes of the SHA-256 digest of the file name, read
/// big-endian, modulo the pool size. Depends on nothing but the name and the
/// pool size, so a file keeps its owner across poll cycles.
pub fn partition_bucket(file: &CandidateFile, pool_size: usize) -> usize {
    let Some(key) = file.partition_key() else {
        return FALLBACK_BUCKET;
    };
    if pool_size <= 1 {
        return 0;
    }

    let digest = Sha256::digest(key);
    let mut prefix = [0u8; 8];
    prefix.copy_from_slice(&digest[..8]);

    (u64::from_be_bytes(prefix) % pool_size as u64) as usize
}

/// Admits exactly the files whose partition bucket matches its priority.
#[derive(Clone)]
pub struct PriorityFileFilter {
    priority: WatcherPriority,
    pool: Arc<PoolState>,
}

impl PriorityFileFilter {
    pub(crate) fn new(priority: WatcherPriority, pool: Arc<PoolState>) -> Self {
        Self { priority, pool }
    }

    pub fn assigned_priority(&self) -> WatcherPriority {
        self.priority
    }

    /// Current size of the pool this filter belongs to.
    pub fn pool_size(&self) -> usize {
        self.pool.size()
    }
}

impl FileFilter for PriorityFileFilter {
    fn accept(&self, file: &CandidateFile) -> bool {
        let pool_size = self.pool.size();
        let bucket = partition_bucket(file, pool_size);
        let admitted = bucket == self.priority.index();

        trace!(
            file = %file.path().display(),
            priority = %self.priority,
            pool_size,
            bucket,
            admitted,
            "priority filter evaluated"
        );
        admitted
    }

    fn priority(&self) -> Option<WatcherPriority> {
        Some(self.priority)
    }
}

impl fmt::Debug for PriorityFileFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PriorityFileFilter")
            .field("priority", &self.priority)
            .field("pool_size", &self.pool.size())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::PriorityFilterFactory;

    #[test]
    fn single_watcher_admits_everything() {
        let factory = PriorityFilterFactory::new();
        let filter = factory.create_filter();

        for name in ["a.csv", "b.csv", "report-2024.xml", ""] {
            assert!(filter.accept(&CandidateFile::new(name)));
        }
    }

    #[test]
    fn nameless_candidates_fall_back_to_base_priority() {
        let factory = PriorityFilterFactory::new();
        let filters: Vec<_> = (0..3).map(|_| factory.create_filter()).collect();
        let root = CandidateFile::new("/");

        assert_eq!(partition_bucket(&root, 3), FALLBACK_BUCKET);
        assert!(filters[0].accept(&root));
        assert!(!filters[1].accept(&root));
        assert!(!filters[2].accept(&root));
    }

    #[test]
    fn bucket_ignores_parent_directories() {
        let a = CandidateFile::new("/inbox/one/orders.csv");
        let b = CandidateFile::new("/inbox/two/orders.csv");

        assert_eq!(partition_bucket(&a, 7), partition_bucket(&b, 7));
    }

    #[test]
    fn filters_see_pool_growth() {
        let factory = PriorityFilterFactory::new();
        let first = factory.create_filter();
        assert_eq!(first.pool_size(), 1);

        factory.create_filter();
        assert_eq!(first.pool_size(), 2);
    }
}
