use std::{
    convert::Infallible,
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
};

use lbwatch_model::WatcherPriority;
use parking_lot::Mutex;
use tracing::debug;

use super::priority::PriorityFileFilter;

/// Pool bookkeeping shared by a factory and every filter it issued.
#[derive(Debug, Default)]
pub(crate) struct PoolState {
    issued: Mutex<Vec<WatcherPriority>>,
    // Mirror of `issued.len()` for lock-free reads during filter evaluation.
    size: AtomicUsize,
}

impl PoolState {
    pub(crate) fn size(&self) -> usize {
        self.size.load(Ordering::Acquire)
    }
}

/// Issues one [`PriorityFileFilter`] per watcher and tracks the pool size.
///
/// The pool only grows. Clones share the same pool, so a factory can be
/// handed to every endpoint of a process while tests build a fresh one per
/// case.
#[derive(Debug, Clone, Default)]
pub struct PriorityFilterFactory {
    pool: Arc<PoolState>,
}

impl PriorityFilterFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Issue a filter carrying the next unused priority.
    pub fn create_filter(&self) -> PriorityFileFilter {
        match self.try_create_filter(|_| Ok::<(), Infallible>(())) {
            Ok(filter) => filter,
            Err(never) => match never {},
        }
    }

    /// Issue a filter only if `validate` accepts the resulting pool size.
    ///
    /// Validation, priority assignment and the pool-size increment happen in
    /// one critical section. When `validate` fails nothing is committed and
    /// the pool is left untouched.
    pub fn try_create_filter<E>(
        &self,
        validate: impl FnOnce(usize) -> Result<(), E>,
    ) -> Result<PriorityFileFilter, E> {
        let mut issued = self.pool.issued.lock();
        let priority = WatcherPriority::from_index(issued.len());
        let pool_size = issued.len() + 1;

        validate(pool_size)?;

        issued.push(priority);
        self.pool.size.store(pool_size, Ordering::Release);
        debug!(priority = %priority, pool_size, "issued priority filter");

        Ok(PriorityFileFilter::new(priority, Arc::clone(&self.pool)))
    }

    /// Number of filters issued so far.
    pub fn pool_size(&self) -> usize {
        self.pool.issued.lock().len()
    }

    /// Priorities issued so far, in issuance order.
    pub fn issued(&self) -> Vec<WatcherPriority> {
        self.pool.issued.lock().clone()
    }
}

#[cfg(test)]
mod tests {
    use std::{collections::HashSet, thread};

    use lbwatch_model::PRIORITY_BASE;

    use super::*;
    use crate::filter::FileFilter;

    #[test]
    fn pool_grows_with_each_filter() {
        let factory = PriorityFilterFactory::new();
        assert_eq!(factory.pool_size(), 0);

        let filters: Vec<_> = (0..4).map(|_| factory.create_filter()).collect();

        assert_eq!(factory.pool_size(), 4);
        for (k, filter) in filters.iter().enumerate() {
            assert_eq!(
                filter.assigned_priority().get(),
                PRIORITY_BASE + k as u32
            );
            assert_eq!(filter.priority(), Some(filter.assigned_priority()));
        }
        assert_eq!(
            factory.issued(),
            filters
                .iter()
                .map(PriorityFileFilter::assigned_priority)
                .collect::<Vec<_>>()
        );
    }

    #[test]
    fn rejected_validation_leaves_pool_untouched() {
        let factory = PriorityFilterFactory::new();
        factory.create_filter();

        let mut seen = None;
        let result = factory.try_create_filter(|pool_size| {
            seen = Some(pool_size);
            Err("nope")
        });

        assert_eq!(result.map(|f| f.assigned_priority()), Err("nope"));
        assert_eq!(seen, Some(2));
        assert_eq!(factory.pool_size(), 1);

        let next = factory.create_filter();
        assert_eq!(next.assigned_priority().get(), PRIORITY_BASE + 1);
    }

    #[test]
    fn clones_share_one_pool() {
        let factory = PriorityFilterFactory::new();
        let other = factory.clone();

        let first = factory.create_filter();
        other.create_filter();

        assert_eq!(factory.pool_size(), 2);
        assert_eq!(first.pool_size(), 2);
    }

    #[test]
    fn concurrent_issuance_assigns_unique_priorities() {
        let factory = PriorityFilterFactory::new();

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let factory = factory.clone();
                thread::spawn(move || {
                    (0..25)
                        .map(|_| factory.create_filter().assigned_priority())
                        .collect::<Vec<_>>()
                })
            })
            .collect();

        let mut priorities = HashSet::new();
        for handle in handles {
            for priority in handle.join().expect("issuer thread panicked") {
                assert!(priorities.insert(priority), "duplicate {priority}");
            }
        }

        assert_eq!(priorities.len(), 200);
        assert_eq!(factory.pool_size(), 200);
        assert!(priorities.iter().all(|p| p.index() < 200));
    }
}
