#[path = "common/mod.rs"]
mod common;

use common::*;
use linedup::{
    discard_partition, load_partition, merge_partitions, LineWriter, Partition, RunStatistics,
};
use std::fs;
use std::collections::BTreeSet;

fn partition(dir: &std::path::Path, id: usize, lines: &[&str]) -> Partition {
    let path = dir.join(format!("{id}.txt"));
    write_lines(&path, lines);
    Partition { id, path }
}

fn output_lines(bytes: Vec<u8>) -> Vec<String> {
    String::from_utf8(bytes)
        .unwrap()
        .lines()
        .map(str::to_string)
        .collect()
}

#[test]
fn load_partition_collapses_duplicates() {
    let dir = scratch_root();
    let p = partition(&dir, 0, &["x", "y", "x", "x"]);

    let (set, count) = load_partition(&p, 8 * 1024).unwrap();
    assert_eq!(count, 4);
    assert_eq!(set.len(), 2);
    assert!(set.contains(b"x".as_slice()));
    assert!(set.contains(b"y".as_slice()));
}

/// Each partition contributes its distinct lines in id order; statistics add up
/// and partition files are deleted once merged.
#[test]
fn merges_partitions_in_id_order_and_deletes_them() {
    let dir = scratch_root();
    // Handed over out of order; merge must still go 0, 1, 2.
    let parts = vec![
        partition(&dir, 2, &["c", "c"]),
        partition(&dir, 0, &["a", "a", "a"]),
        partition(&dir, 1, &["b1", "b2", "b1"]),
    ];
    let paths: Vec<_> = parts.iter().map(|p| p.path.clone()).collect();

    let mut w = LineWriter::new(Vec::new(), 8 * 1024, b"\n");
    let stats = merge_partitions(parts, &mut w, 8 * 1024, None).unwrap();
    let out = output_lines(w.finish().unwrap());

    assert_eq!(out[0], "a");
    let middle: BTreeSet<&str> = out[1..3].iter().map(String::as_str).collect();
    assert_eq!(middle, BTreeSet::from(["b1", "b2"]));
    assert_eq!(out[3], "c");
    assert_eq!(out.len(), 4);

    assert_eq!(
        stats,
        RunStatistics { total_lines: 8, duplicate_lines: 4, cleanup_failures: 0 }
    );
    for p in paths {
        assert!(!p.exists(), "{} should be deleted", p.display());
    }
}

/// An empty partition contributes nothing and is still cleaned up.
#[test]
fn empty_partitions_contribute_nothing() {
    let dir = scratch_root();
    let parts = vec![partition(&dir, 0, &[]), partition(&dir, 1, &["only"])];

    let mut w = LineWriter::new(Vec::new(), 8 * 1024, b"\n");
    let stats = merge_partitions(parts, &mut w, 8 * 1024, None).unwrap();

    assert_eq!(output_lines(w.finish().unwrap()), vec!["only"]);
    assert_eq!(stats.total_lines, 1);
    assert_eq!(stats.duplicate_lines, 0);
    assert_eq!(stats.cleanup_failures, 0);
}

/// A missing partition file is a read failure and aborts the merge.
#[test]
fn missing_partition_is_fatal() {
    let dir = scratch_root();
    let parts = vec![Partition { id: 0, path: dir.join("0.txt") }];

    let mut w = LineWriter::new(Vec::new(), 8 * 1024, b"\n");
    let err = merge_partitions(parts, &mut w, 8 * 1024, None).unwrap_err();
    assert!(format!("{err:#}").contains("open partition"), "{err:#}");
}

#[test]
fn statistics_accumulate() {
    let mut a = RunStatistics::default();
    a.record(10, 4);
    a.record(5, 5);
    assert_eq!(a.total_lines, 15);
    assert_eq!(a.duplicate_lines, 6);
    assert_eq!(a.distinct_lines(), 9);
    assert_eq!(a.cleanup_failures, 0);
}

/// Lines ending in `\r` are kept distinct from their `\r`-less twins.
#[test]
fn load_partition_keeps_trailing_carriage_return() {
    let dir = scratch_root();
    let p = Partition { id: 0, path: dir.join("0.txt") };
    fs::write(&p.path, b"x\r\nx\nx\r\n").unwrap();

    let (set, count) = load_partition(&p, 8 * 1024).unwrap();
    assert_eq!(count, 3);
    assert_eq!(set.len(), 2);
    assert!(set.contains(b"x\r".as_slice()));
    assert!(set.contains(b"x".as_slice()));
}

/// A partition that cannot be deleted is counted and logged, never fatal.
#[test]
fn failed_partition_delete_is_counted_not_fatal() {
    let dir = scratch_root();
    let file = dir.join("plain");
    fs::write(&file, b"not a directory").unwrap();
    // Removing `<regular file>/0.txt` fails with ENOTDIR, even as root.
    let p = Partition { id: 0, path: file.join("0.txt") };

    let mut stats = RunStatistics { total_lines: 4, duplicate_lines: 1, cleanup_failures: 0 };
    discard_partition(&p, &mut stats);
    assert_eq!(stats, RunStatistics { total_lines: 4, duplicate_lines: 1, cleanup_failures: 1 });

    // A second failure keeps counting.
    discard_partition(&p, &mut stats);
    assert_eq!(stats.cleanup_failures, 2);
    assert!(file.is_file());
}

#[test]
fn discarding_a_merged_partition_removes_it() {
    let dir = scratch_root();
    let p = partition(&dir, 3, &["gone"]);
    let mut stats = RunStatistics::default();
    discard_partition(&p, &mut stats);
    assert!(!p.path.exists());
    assert_eq!(stats.cleanup_failures, 0);
}
