//! End-to-end tests of the history tree through its public API.
//!
//! These tests exercise whole trees on real files: growth, sealing,
//! reopening, lifecycle operations and concurrent readers.

use std::fs;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

use htree_common::constants::{HISTORY_FILE_MAGIC, IGNORE_PROVIDER_VERSION, TREE_HEADER_SIZE};
use htree_common::types::{SeqNum, TimeRangeCondition};
use htree_storage::{BasicCodec, BasicInterval, HistoryTree, HistoryTreeError, TreeConfig};
use htree_test::utils::{brute_force, canonical, TreeFixture};
use htree_test::workload::{contiguous, nested, WorkloadSpec};

/// 64-byte intervals per 4 KB leaf.
const PER_LEAF: usize = 63;

// =============================================================================
// Round trip
// =============================================================================

#[test]
fn test_round_trip_through_file() {
    let fixture = TreeFixture::new(4).unwrap();
    let intervals = WorkloadSpec::default().with_count(2000).generate(11);
    fixture.insert_all(&intervals).unwrap();
    let end = fixture.tree.tree_end();

    let reopened = fixture.close_and_reopen(end + 5).unwrap();
    fixture.tree.close_file().unwrap();

    assert!(reopened.is_read_only());
    assert_eq!(reopened.tree_end(), end + 5);
    assert_eq!(reopened.node_count(), fixture.tree.node_count());
    assert_eq!(reopened.depth(), fixture.tree.depth());
    assert_eq!(reopened.root_seq(), fixture.tree.root_seq());

    let found = reopened.query(TimeRangeCondition::all()).unwrap();
    assert_eq!(canonical(found), canonical(intervals));
    assert_eq!(reopened.check_integrity().unwrap(), reopened.node_count());
}

#[test]
fn test_round_trip_with_tree_start() {
    let config = TreeConfig::for_testing()
        .with_tree_start(1_000_000)
        .with_provider_version(3);
    let fixture = TreeFixture::with_config(config).unwrap();
    let intervals = WorkloadSpec::default()
        .with_count(400)
        .with_start(1_000_000)
        .generate(5);
    fixture.insert_all(&intervals).unwrap();
    fixture.tree.close_tree(fixture.tree.tree_end()).unwrap();

    let reopened = HistoryTree::open(fixture.path(), 3, BasicCodec).unwrap();
    assert_eq!(reopened.tree_start(), 1_000_000);
    assert_eq!(reopened.provider_version(), 3);
    let found = reopened.query(TimeRangeCondition::all()).unwrap();
    assert_eq!(found.len(), 400);
}

#[test]
fn test_ignored_provider_version() {
    let config = TreeConfig::for_testing().with_provider_version(12);
    let fixture = TreeFixture::with_config(config).unwrap();
    fixture.insert_all(&contiguous(10, 64)).unwrap();
    fixture.tree.close_tree(200).unwrap();

    let reopened = HistoryTree::open(fixture.path(), IGNORE_PROVIDER_VERSION, BasicCodec).unwrap();
    assert_eq!(reopened.provider_version(), 12);
}

// =============================================================================
// Structural properties
// =============================================================================

#[test]
fn test_tree_end_never_decreases() {
    let fixture = TreeFixture::new(3).unwrap();
    let intervals = WorkloadSpec::default()
        .with_count(1500)
        .with_max_duration(200)
        .generate(3);

    let mut previous = fixture.tree.tree_end();
    for interval in intervals {
        let end = interval.end;
        fixture.tree.insert(interval).unwrap();
        let now = fixture.tree.tree_end();
        assert!(now >= end);
        assert!(now >= previous);
        previous = now;
    }
}

#[test]
fn test_single_open_leaf_throughout() {
    let fixture = TreeFixture::new(2).unwrap();
    let intervals = WorkloadSpec::default().with_count(1200).generate(21);

    for (n, interval) in intervals.into_iter().enumerate() {
        fixture.tree.insert(interval).unwrap();
        if n % 100 == 0 {
            fixture.tree.check_integrity().unwrap();
        }
    }

    let branch = fixture.tree.latest_branch();
    let leaf = fixture.tree.node(*branch.last().unwrap()).unwrap();
    assert!(leaf.is_leaf());
    assert!(!leaf.is_on_disk());
    assert_eq!(leaf.node_end(), i64::MAX);

    // Every allocated node outside the branch is sealed on disk
    for seq in 0..fixture.tree.node_count() {
        let seq = SeqNum::new(seq as i32);
        let node = fixture.tree.node(seq).unwrap();
        assert_eq!(node.is_on_disk(), !branch.contains(&seq), "node {seq}");
    }
}

#[test]
fn test_sealed_nodes_fit_their_block() {
    let fixture = TreeFixture::new(3).unwrap();
    fixture
        .insert_all(&WorkloadSpec::default().with_count(3000).generate(8))
        .unwrap();
    fixture.tree.close_tree(fixture.tree.tree_end()).unwrap();

    let block = fixture.tree.block_size() as u64;
    let size = fs::metadata(fixture.path()).unwrap().len();
    assert_eq!(
        size,
        TREE_HEADER_SIZE as u64 + block * fixture.tree.node_count() as u64
    );

    for seq in 0..fixture.tree.node_count() {
        let info = fixture.tree.node(SeqNum::new(seq as i32)).unwrap().info();
        assert!(info.content_size <= info.capacity, "node {}", info.seq);
        assert!(info.end.is_some());
    }
}

#[test]
fn test_intervals_climb_when_leaf_starts_later() {
    let fixture = TreeFixture::new(3).unwrap();
    // Long intervals starting early keep landing above the newest leaf
    fixture.insert_all(&nested(400, 100_000)).unwrap();
    assert!(fixture.tree.depth() >= 2);
    fixture.tree.check_integrity().unwrap();

    let found = fixture
        .tree
        .query(TimeRangeCondition::singleton(50_000))
        .unwrap();
    assert_eq!(found.len(), 400);
}

// =============================================================================
// Root growth
// =============================================================================

#[test]
fn test_root_growth_three_children() {
    let fixture = TreeFixture::new(3).unwrap();
    let intervals = contiguous(3 * PER_LEAF + 1, 64);

    let mut counts = Vec::new();
    let mut depths = Vec::new();
    for interval in intervals {
        fixture.tree.insert(interval).unwrap();
        let count = fixture.tree.node_count();
        if counts.last() != Some(&count) {
            counts.push(count);
            depths.push(fixture.tree.depth());
        }
    }
    assert_eq!(counts, vec![1, 3, 4, 7]);
    assert_eq!(depths, vec![1, 2, 2, 3]);
}

#[test]
fn test_root_growth_two_children() {
    let fixture = TreeFixture::new(2).unwrap();
    let intervals = contiguous(2 * PER_LEAF + 1, 64);

    let mut counts = Vec::new();
    for interval in intervals {
        fixture.tree.insert(interval).unwrap();
        let count = fixture.tree.node_count();
        if counts.last() != Some(&count) {
            counts.push(count);
        }
    }
    assert_eq!(counts, vec![1, 3, 6]);
    assert_eq!(fixture.tree.depth(), 3);
    assert_eq!(
        fixture.tree.latest_branch(),
        vec![SeqNum::new(3), SeqNum::new(4), SeqNum::new(5)]
    );
}

#[test]
fn test_single_child_trees_are_refused() {
    let result = TreeFixture::new(1);
    assert!(matches!(result, Err(HistoryTreeError::InvalidConfig(_))));

    // A header claiming one child per node is refused on open as well
    let fixture = TreeFixture::new(2).unwrap();
    closed_tree_file(&fixture);
    patch_i32(&fixture.path(), 16, 1);
    let err = HistoryTree::open(fixture.path(), IGNORE_PROVIDER_VERSION, BasicCodec).unwrap_err();
    assert!(matches!(err, HistoryTreeError::InvalidFile { .. }));
}

#[test]
fn test_inverted_interval_leaves_tree_untouched() {
    let fixture = TreeFixture::new(3).unwrap();
    let before = contiguous(PER_LEAF, 64);
    fixture.insert_all(&before).unwrap();
    let end = fixture.tree.tree_end();

    let err = fixture
        .tree
        .insert(BasicInterval::new(end + 100, end + 50, 7, Vec::<u8>::new()))
        .unwrap_err();
    assert!(matches!(err, HistoryTreeError::InvalidInterval { .. }));
    assert_eq!(fixture.tree.tree_end(), end);
    assert_eq!(fixture.tree.node_count(), 1);

    let reopened = fixture.close_and_reopen(end).unwrap();
    let found = reopened.query(TimeRangeCondition::all()).unwrap();
    assert_eq!(canonical(found), canonical(before));
}

#[test]
fn test_points_given_out_of_order() {
    let fixture = TreeFixture::new(3).unwrap();
    let intervals = vec![
        BasicInterval::new(0, 10, 1, Vec::<u8>::new()),
        BasicInterval::new(20, 30, 2, Vec::<u8>::new()),
    ];
    fixture.insert_all(&intervals).unwrap();

    let cond = TimeRangeCondition::points([25, 5, 25]).unwrap();
    let found = fixture.tree.query(cond).unwrap();
    assert_eq!(canonical(found), canonical(intervals));
}

// =============================================================================
// Concrete scenarios
// =============================================================================

#[test]
fn test_fifty_fixed_size_intervals() {
    let fixture = TreeFixture::new(3).unwrap();
    let intervals: Vec<BasicInterval> = (0..50i64)
        .map(|k| BasicInterval::with_encoded_size(k * 200, k * 200 + 150, k as i32, 64))
        .collect();
    fixture.insert_all(&intervals).unwrap();

    assert_eq!(fixture.tree.tree_end(), 49 * 200 + 150);
    let found = fixture
        .tree
        .query(TimeRangeCondition::range(0, 10_000))
        .unwrap();
    assert_eq!(found.len(), 50);
    assert_eq!(canonical(found), canonical(intervals));
}

#[test]
fn test_clean_file_resets_tree() {
    let fixture = TreeFixture::with_config(TreeConfig::for_testing().with_tree_start(10)).unwrap();
    fixture
        .insert_all(&WorkloadSpec::default().with_count(800).with_start(10).generate(2))
        .unwrap();
    assert!(fixture.tree.node_count() > 1);

    fixture.tree.clean_file().unwrap();
    assert_eq!(fixture.tree.node_count(), 1);
    assert_eq!(fixture.tree.tree_start(), 10);
    assert!(fixture.tree.query(TimeRangeCondition::all()).unwrap().is_empty());

    let again = contiguous(5, 64)
        .into_iter()
        .map(|i| BasicInterval::new(i.start + 10, i.end + 10, i.attribute, i.value))
        .collect::<Vec<_>>();
    fixture.insert_all(&again).unwrap();
    assert_eq!(fixture.tree.query(TimeRangeCondition::all()).unwrap().len(), 5);
}

#[test]
fn test_clean_reopened_tree_becomes_writable() {
    let fixture = TreeFixture::new(3).unwrap();
    fixture.insert_all(&contiguous(100, 64)).unwrap();
    let reopened = fixture.close_and_reopen(2000).unwrap();
    fixture.tree.close_file().unwrap();

    assert!(matches!(
        reopened.insert(BasicInterval::new(3000, 3001, 0, Vec::<u8>::new())),
        Err(HistoryTreeError::ReadOnly)
    ));
    reopened.clean_file().unwrap();
    assert!(!reopened.is_read_only());
    reopened
        .insert(BasicInterval::new(3000, 3001, 0, Vec::<u8>::new()))
        .unwrap();
}

#[test]
fn test_delete_file() {
    let fixture = TreeFixture::new(3).unwrap();
    fixture.insert_all(&contiguous(100, 64)).unwrap();
    fixture.tree.delete_file().unwrap();
    assert!(!fixture.path().exists());
    assert!(fixture.tree.insert(BasicInterval::new(2000, 2001, 0, Vec::<u8>::new())).is_err());
}

// =============================================================================
// Rejected files
// =============================================================================

fn closed_tree_file(fixture: &TreeFixture) {
    fixture.insert_all(&contiguous(100, 64)).unwrap();
    fixture.tree.close_tree(2000).unwrap();
    fixture.tree.close_file().unwrap();
}

fn patch_i32(path: &std::path::Path, offset: usize, value: i32) {
    let mut bytes = fs::read(path).unwrap();
    bytes[offset..offset + 4].copy_from_slice(&value.to_le_bytes());
    fs::write(path, bytes).unwrap();
}

#[test]
fn test_open_rejects_missing_and_empty_files() {
    let fixture = TreeFixture::new(3).unwrap();

    let missing = HistoryTree::open(fixture.sibling("missing.ht"), 0, BasicCodec).unwrap_err();
    assert!(matches!(missing, HistoryTreeError::InvalidFile { .. }));

    let empty = fixture.sibling("empty.ht");
    fs::write(&empty, b"").unwrap();
    let err = HistoryTree::open(&empty, 0, BasicCodec).unwrap_err();
    assert!(err.is_rebuild_required());

    let short = fixture.sibling("short.ht");
    fs::write(&short, vec![0u8; 100]).unwrap();
    assert!(HistoryTree::open(&short, 0, BasicCodec).is_err());
}

#[test]
fn test_open_rejects_unclosed_tree() {
    let fixture = TreeFixture::new(3).unwrap();
    fixture.insert_all(&contiguous(200, 64)).unwrap();
    // Nodes were sealed but the header was never written
    let err = HistoryTree::open(fixture.path(), 0, BasicCodec).unwrap_err();
    assert!(matches!(err, HistoryTreeError::InvalidFile { .. }));
}

#[test]
fn test_open_rejects_bad_magic() {
    let fixture = TreeFixture::new(3).unwrap();
    closed_tree_file(&fixture);
    patch_i32(&fixture.path(), 0, HISTORY_FILE_MAGIC + 1);

    let err = HistoryTree::open(fixture.path(), 0, BasicCodec).unwrap_err();
    assert!(matches!(err, HistoryTreeError::InvalidFile { .. }));
}

#[test]
fn test_open_rejects_other_file_version() {
    let fixture = TreeFixture::new(3).unwrap();
    closed_tree_file(&fixture);
    patch_i32(&fixture.path(), 4, 99);

    let err = HistoryTree::open(fixture.path(), 0, BasicCodec).unwrap_err();
    assert!(matches!(err, HistoryTreeError::InvalidFile { .. }));
}

#[test]
fn test_open_rejects_provider_mismatch() {
    let fixture = TreeFixture::new(3).unwrap();
    closed_tree_file(&fixture);

    let err = HistoryTree::open(fixture.path(), 1, BasicCodec).unwrap_err();
    assert!(matches!(
        err,
        HistoryTreeError::ProviderVersionMismatch {
            expected: 1,
            found: 0
        }
    ));
    assert!(err.is_rebuild_required());
}

#[test]
fn test_open_rejects_inconsistent_start() {
    let fixture = TreeFixture::new(3).unwrap();
    closed_tree_file(&fixture);
    // tree_start sits after the seven i32 fields
    let mut bytes = fs::read(fixture.path()).unwrap();
    bytes[28..36].copy_from_slice(&5i64.to_le_bytes());
    fs::write(fixture.path(), bytes).unwrap();

    let err = HistoryTree::open(fixture.path(), 0, BasicCodec).unwrap_err();
    match err {
        HistoryTreeError::InvalidFile { reason, .. } => {
            assert!(reason.contains("inconsistent start times"))
        }
        other => panic!("unexpected error {other}"),
    }
}

// =============================================================================
// Concurrency
// =============================================================================

#[test]
fn test_queries_run_during_inserts() {
    let fixture = TreeFixture::new(3).unwrap();
    let intervals = WorkloadSpec::default().with_count(4000).generate(99);
    let done = AtomicBool::new(false);
    let tree = &fixture.tree;

    thread::scope(|s| {
        let readers: Vec<_> = (0..4)
            .map(|r| {
                let done = &done;
                s.spawn(move || {
                    let mut queries = 0usize;
                    while !done.load(Ordering::Acquire) || queries == 0 {
                        let at = (queries as i64 * 37 + r * 1000) % 20_000;
                        let found = tree.query(TimeRangeCondition::singleton(at)).unwrap();
                        assert!(found.iter().all(|i| i.start <= at && at <= i.end));
                        queries += 1;
                    }
                    queries
                })
            })
            .collect();

        for interval in &intervals {
            tree.insert(interval.clone()).unwrap();
        }
        done.store(true, Ordering::Release);

        for reader in readers {
            assert!(reader.join().unwrap() > 0);
        }
    });

    tree.check_integrity().unwrap();
    let condition = TimeRangeCondition::range(5000, 6000);
    assert_eq!(
        canonical(tree.query(condition.clone()).unwrap()),
        canonical(brute_force(&intervals, &condition))
    );
}

#[test]
fn test_shared_tree_across_threads() {
    let fixture = TreeFixture::new(4).unwrap();
    fixture
        .insert_all(&WorkloadSpec::default().with_count(3000).generate(4))
        .unwrap();
    let reopened = Arc::new(fixture.close_and_reopen(fixture.tree.tree_end()).unwrap());
    let intervals = WorkloadSpec::default().with_count(3000).generate(4);

    let handles: Vec<_> = (0..4)
        .map(|t| {
            let tree = Arc::clone(&reopened);
            let intervals = intervals.clone();
            thread::spawn(move || {
                for q in 0..25i64 {
                    let low = (t * 2500 + q * 97) % 15_000;
                    let condition = TimeRangeCondition::range(low, low + 300);
                    let found = tree.query(condition.clone()).unwrap();
                    assert_eq!(canonical(found), canonical(brute_force(&intervals, &condition)));
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }
}
