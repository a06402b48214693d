//! Hand-written operation sequences covering the radix tree's structural edge
//! cases: node splits, merges, valueless inner nodes and seeks that stop
//! inside an edge label.
//!
//! Each sequence is replayed through [`run_differential`], the same helper the
//! `differential` honggfuzz harness calls, against both [`RadixTree`] and the
//! `BTreeMap` adapter.

use std::collections::BTreeMap;

use radix_oracle::{Operation, RadixTree, ScanOp, run_differential};

fn insert(key: &[u8], value: u64) -> Operation {
    Operation::Insert {
        key: key.to_vec(),
        value,
    }
}

fn remove(key: &[u8]) -> Operation {
    Operation::Remove(key.to_vec())
}

fn lookup(key: &[u8]) -> Operation {
    Operation::Lookup(key.to_vec())
}

fn scan(op: ScanOp, from: &[u8]) -> Operation {
    Operation::Scan {
        op,
        from: from.to_vec(),
    }
}

fn replay(operations: &[Operation]) {
    if let Err(err) = run_differential::<RadixTree>(operations) {
        panic!("radix tree: {err}");
    }
    if let Err(err) = run_differential::<BTreeMap<Vec<u8>, u64>>(operations) {
        panic!("btree map: {err}");
    }
}

/// Removing a key stored on an inner node must not drop its descendants.
///
/// "app" becomes a valueless node with two children, which must stay in
/// place and keep both keys reachable.
#[test]
fn fuzz_regression_remove_inner_key_keeps_children() {
    replay(&[
        insert(b"app", 1),
        insert(b"apple", 2),
        insert(b"apply", 3),
        remove(b"app"),
        lookup(b"apple"),
        lookup(b"apply"),
        scan(ScanOp::First, b""),
    ]);
}

/// A removal that leaves a single child merges the labels back together.
///
/// Removing "abd" leaves "ab" with one child, which is merged into "abc".
/// The following inserts overwrite the merged key and split it again.
#[test]
fn fuzz_regression_merge_after_sibling_removal() {
    replay(&[
        insert(b"abc", 1),
        insert(b"abd", 2),
        remove(b"abd"),
        insert(b"abc", 3),
        insert(b"ab", 4),
        remove(b"abc"),
        lookup(b"ab"),
        scan(ScanOp::Ge, b"ab"),
    ]);
}

/// Removing a key that is only a path prefix must report absence.
#[test]
fn fuzz_regression_remove_path_prefix_reports_absent() {
    replay(&[
        insert(b"abcdef", 1),
        insert(b"abcxyz", 2),
        remove(b"abc"),
        remove(b"abcd"),
        remove(b"abcdefg"),
        lookup(b"abc"),
    ]);
}

/// The empty key and keys made of zero bytes are ordinary keys.
#[test]
fn fuzz_regression_empty_and_zero_keys() {
    replay(&[
        insert(b"", 1),
        insert(b"\0", 2),
        insert(b"\0\0", 3),
        scan(ScanOp::Gt, b""),
        scan(ScanOp::Ge, b"\0"),
        remove(b""),
        scan(ScanOp::First, b""),
        insert(b"", 4),
        lookup(b""),
    ]);
}

/// Seeks whose pattern stops inside an edge label.
///
/// "carp" ends inside the "pet" label, so the whole subtree below it is
/// greater than the pattern and must be yielded.
#[test]
fn fuzz_regression_gt_seek_inside_label() {
    replay(&[
        insert(b"carpet", 1),
        insert(b"carrot", 2),
        insert(b"cat", 3),
        scan(ScanOp::Gt, b"carp"),
        scan(ScanOp::Gt, b"carpet"),
        scan(ScanOp::Ge, b"carq"),
        scan(ScanOp::Gt, b"ca"),
    ]);
}

/// Seeks before the smallest and after the largest key.
#[test]
fn fuzz_regression_seek_out_of_range() {
    replay(&[
        insert(b"m", 1),
        insert(b"mm", 2),
        scan(ScanOp::Ge, b"a"),
        scan(ScanOp::Gt, b"z"),
        scan(ScanOp::Ge, b"mm\0"),
        scan(ScanOp::Gt, b"\xff\xff"),
    ]);
}

/// High bytes must sort after low bytes, as unsigned.
#[test]
fn fuzz_regression_high_bytes_sort_last() {
    replay(&[
        insert(b"\x80", 1),
        insert(b"\x7f", 2),
        insert(b"\xff\x00", 3),
        insert(b"\x01", 4),
        scan(ScanOp::First, b""),
        scan(ScanOp::Ge, b"\x80"),
    ]);
}

/// Overwrites must not change the key count.
#[test]
fn fuzz_regression_overwrite_then_remove() {
    replay(&[
        insert(b"k", 1),
        insert(b"k", 2),
        insert(b"k", 3),
        lookup(b"k"),
        remove(b"k"),
        remove(b"k"),
        lookup(b"k"),
        scan(ScanOp::First, b""),
    ]);
}

/// Clearing the tree and filling it again.
#[test]
fn fuzz_regression_refill_after_clear() {
    let keys: Vec<Vec<u8>> = (0u32..200).map(|n| n.to_string().into_bytes()).collect();
    let mut operations: Vec<Operation> = keys
        .iter()
        .zip(0u64..)
        .map(|(key, value)| insert(key, value))
        .collect();
    operations.extend(keys.iter().rev().map(|key| remove(key)));
    operations.push(scan(ScanOp::First, b""));
    operations.extend(keys.iter().map(|key| insert(key, 0)));
    operations.push(scan(ScanOp::Gt, b"1"));
    replay(&operations);
}
