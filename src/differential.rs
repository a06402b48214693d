//! Differential replay of arbitrary operation sequences.
//!
//! Where [`crate::fuzz`] drives fixed million-key workloads, this module
//! replays short, arbitrary sequences of inserts, removals, lookups and range
//! scans on the oracle and a fresh index, reporting the first disagreement.
//! It is shared by the honggfuzz harness and the regression tests.

use crate::errors::FuzzError;
use crate::index::{IndexCursor, OrderedIndex, SeekOp};
use crate::oracle::OracleTable;

/// Bucket count of the oracle used for replays. Small on purpose so that
/// chains are long.
const REPLAY_BUCKETS: usize = 61;

/// One step of a replayed sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "arbitrary", derive(arbitrary::Arbitrary))]
pub enum Operation {
    /// Insert `key` with `value` in both stores.
    Insert {
        /// Key to insert.
        key: Vec<u8>,
        /// Value to store.
        value: u64,
    },
    /// Remove `key` from both stores.
    Remove(Vec<u8>),
    /// Look `key` up in both stores.
    Lookup(Vec<u8>),
    /// Scan the index from `from` with `op`, comparing against the oracle's
    /// keys sorted in memory.
    Scan {
        /// Seek operator.
        op: ScanOp,
        /// Seek pattern.
        from: Vec<u8>,
    },
}

/// Seek operators available to [`Operation::Scan`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "arbitrary", derive(arbitrary::Arbitrary))]
pub enum ScanOp {
    /// [`SeekOp::First`].
    First,
    /// [`SeekOp::Ge`].
    Ge,
    /// [`SeekOp::Gt`].
    Gt,
}

impl From<ScanOp> for SeekOp {
    fn from(op: ScanOp) -> Self {
        match op {
            ScanOp::First => SeekOp::First,
            ScanOp::Ge => SeekOp::Ge,
            ScanOp::Gt => SeekOp::Gt,
        }
    }
}

fn scan_oracle(oracle: &OracleTable, op: ScanOp, from: &[u8]) -> Vec<Vec<u8>> {
    let mut keys: Vec<Vec<u8>> = oracle
        .iter()
        .map(|(key, _)| key)
        .filter(|key| match op {
            ScanOp::First => true,
            ScanOp::Ge => *key >= from,
            ScanOp::Gt => *key > from,
        })
        .map(<[u8]>::to_vec)
        .collect();
    keys.sort_unstable();
    keys
}

fn scan_index<I: OrderedIndex>(index: &I, op: ScanOp, from: &[u8]) -> Vec<Vec<u8>> {
    let mut cursor = index.cursor();
    cursor.seek(op.into(), from);
    let mut keys = Vec::new();
    while let Some(key) = cursor.next_key() {
        keys.push(key.to_vec());
    }
    keys
}

/// Replays `operations` on a fresh oracle and a fresh `I`.
///
/// # Errors
///
/// Returns the first disagreement. A scan that differs is reported as
/// [`FuzzError::IteratorCountMismatch`] when the lengths differ, and as
/// [`FuzzError::ValueMismatch`] on the first differing key otherwise.
pub fn run_differential<I: OrderedIndex>(operations: &[Operation]) -> Result<(), FuzzError> {
    let mut oracle = OracleTable::with_buckets(REPLAY_BUCKETS);
    let mut index = I::default();

    for (step, operation) in operations.iter().enumerate() {
        match operation {
            Operation::Insert { key, value } => {
                let expected = oracle.insert(key, *value).is_new();
                let actual = index.insert(key, *value);
                if expected != actual {
                    return Err(FuzzError::NoveltyMismatch {
                        step: u32::try_from(step).unwrap_or(u32::MAX),
                        key: key.clone(),
                        oracle: expected,
                        index: actual,
                    });
                }
            }
            Operation::Remove(key) => {
                let expected = oracle.remove(key);
                let actual = index.remove(key);
                if expected != actual {
                    return Err(FuzzError::RemovalMismatch {
                        key: key.clone(),
                        oracle: expected,
                        index: actual,
                    });
                }
            }
            Operation::Lookup(key) => {
                let expected = oracle.find(key);
                let actual = index.lookup(key);
                if expected != actual {
                    return Err(FuzzError::ValueMismatch {
                        key: key.clone(),
                        oracle: expected,
                        index: actual,
                        expected: expected.unwrap_or_default(),
                    });
                }
            }
            Operation::Scan { op, from } => {
                let expected = scan_oracle(&oracle, *op, from);
                let actual = scan_index(&index, *op, from);
                if expected.len() != actual.len() {
                    return Err(FuzzError::IteratorCountMismatch {
                        visited: actual.len(),
                        expected: expected.len(),
                    });
                }
                let first_difference = expected.iter().zip(&actual).find(|(want, got)| want != got);
                if let Some((want, _)) = first_difference {
                    let oracle_value = oracle.find(want);
                    return Err(FuzzError::ValueMismatch {
                        key: want.clone(),
                        oracle: oracle_value,
                        index: index.lookup(want),
                        expected: oracle_value.unwrap_or_default(),
                    });
                }
            }
        }

        if oracle.len() != index.len() {
            return Err(FuzzError::CountMismatch {
                oracle: oracle.len(),
                index: index.len(),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::radix::RadixTree;

    fn insert(key: &[u8], value: u64) -> Operation {
        Operation::Insert {
            key: key.to_vec(),
            value,
        }
    }

    #[test]
    fn test_scan_oracle_sorts_and_filters() {
        let mut oracle = OracleTable::with_buckets(3);
        for key in [&b"b"[..], b"a", b"ab"] {
            oracle.insert(key, 0);
        }
        assert_eq!(
            scan_oracle(&oracle, ScanOp::First, b"zzz"),
            [&b"a"[..], b"ab", b"b"]
        );
        assert_eq!(scan_oracle(&oracle, ScanOp::Ge, b"ab"), [&b"ab"[..], b"b"]);
        assert_eq!(scan_oracle(&oracle, ScanOp::Gt, b"ab"), [&b"b"[..]]);
    }

    #[test]
    fn test_mixed_sequence_on_radix_tree() {
        let operations = [
            insert(b"apple", 1),
            insert(b"applesauce", 2),
            insert(b"app", 3),
            Operation::Scan {
                op: ScanOp::First,
                from: Vec::new(),
            },
            Operation::Remove(b"apple".to_vec()),
            Operation::Lookup(b"apple".to_vec()),
            Operation::Lookup(b"applesauce".to_vec()),
            insert(b"", 4),
            Operation::Scan {
                op: ScanOp::Gt,
                from: b"app".to_vec(),
            },
            Operation::Remove(b"missing".to_vec()),
        ];
        run_differential::<RadixTree>(&operations).unwrap();
    }
}
