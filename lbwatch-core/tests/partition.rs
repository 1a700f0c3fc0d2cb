use std::path::PathBuf;

use lbwatch_core::{FileFilter, PriorityFileFilter, PriorityFilterFactory};
use lbwatch_model::{CandidateFile, PRIORITY_BASE};

fn pool(size: usize) -> (PriorityFilterFactory, Vec<PriorityFileFilter>) {
    let factory = PriorityFilterFactory::new();
    let filters = (0..size).map(|_| factory.create_filter()).collect();
    (factory, filters)
}

fn candidates() -> Vec<CandidateFile> {
    let mut files: Vec<CandidateFile> = (0..500)
        .map(|i| CandidateFile::new(format!("/inbox/order-{i:04}.csv")))
        .collect();

    for odd in [
        "/inbox/ünïcödé.txt",
        "/inbox/with space.dat",
        "/inbox/.hidden",
        "/inbox/no_extension",
        "/",
        "",
        "relative/..",
    ] {
        files.push(CandidateFile::new(odd));
    }
    files.push(CandidateFile::new(PathBuf::from("/inbox").join("x".repeat(255))));
    files
}

#[test]
fn exactly_one_watcher_admits_each_file() {
    for size in [1, 2, 5, 100] {
        let (factory, filters) = pool(size);
        assert_eq!(factory.pool_size(), size);

        for file in candidates() {
            let admitting: Vec<_> = filters
                .iter()
                .filter(|filter| filter.accept(&file))
                .map(|filter| filter.assigned_priority())
                .collect();

            assert_eq!(
                admitting.len(),
                1,
                "pool of {size}: {} admitted by {admitting:?}",
                file.path().display()
            );
        }
    }
}

#[test]
fn decisions_are_stable_across_cycles() {
    let (_factory, filters) = pool(5);
    let files = candidates();

    let first: Vec<Vec<bool>> = filters
        .iter()
        .map(|filter| files.iter().map(|file| filter.accept(file)).collect())
        .collect();

    for _ in 0..3 {
        let again: Vec<Vec<bool>> = filters
            .iter()
            .map(|filter| files.iter().map(|file| filter.accept(file)).collect())
            .collect();
        assert_eq!(first, again);
    }
}

#[test]
fn every_watcher_gets_a_share() {
    let (_factory, filters) = pool(5);
    let files = candidates();

    for filter in &filters {
        let share = files.iter().filter(|file| filter.accept(file)).count();
        assert!(
            share > 50,
            "priority {} only admitted {share} of {} files",
            filter.assigned_priority(),
            files.len()
        );
    }
}

#[test]
fn kth_filter_gets_base_plus_k_minus_one() {
    let (factory, filters) = pool(7);

    assert_eq!(factory.pool_size(), 7);
    for (k, filter) in (1..).zip(&filters) {
        assert_eq!(filter.assigned_priority().get(), PRIORITY_BASE + k - 1);
        assert_eq!(filter.priority(), Some(filter.assigned_priority()));
    }
}

#[test]
fn fresh_factories_do_not_share_pools() {
    let (first, _) = pool(3);
    let (second, filters) = pool(1);

    assert_eq!(first.pool_size(), 3);
    assert_eq!(second.pool_size(), 1);
    assert_eq!(filters[0].assigned_priority().get(), PRIORITY_BASE);
}
