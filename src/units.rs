//! Built-in unit checks run by the `--units` category.
//!
//! Each check is self-contained and runs against the shipped [`RadixTree`],
//! using the oracle as reference wherever values are involved.

use hashbrown::HashSet;
use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::{error, info};

use crate::differential::{Operation, ScanOp, run_differential};
use crate::errors::FuzzError;
use crate::keygen::{KEY_BUFFER_LEN, KeyGenerator, KeyMode, feistel};
use crate::radix::RadixTree;

/// A named check.
#[derive(Debug, Clone, Copy)]
pub struct UnitCheck {
    /// Name printed in the logs.
    pub name: &'static str,
    /// The check itself.
    pub run: fn() -> Result<(), FuzzError>,
}

/// All checks, in the order they run.
pub const UNIT_CHECKS: &[UnitCheck] = &[
    UnitCheck {
        name: "prefix keys",
        run: prefix_keys,
    },
    UnitCheck {
        name: "overwrite",
        run: overwrite,
    },
    UnitCheck {
        name: "int keys distinct",
        run: int_keys_distinct,
    },
    UnitCheck {
        name: "feistel bijection sample",
        run: feistel_bijection_sample,
    },
    UnitCheck {
        name: "random keys with zero bytes",
        run: random_keys_with_zero_bytes,
    },
    UnitCheck {
        name: "seek operators",
        run: seek_operators,
    },
];

/// Number of sequence indices sampled by the distinctness checks.
const SAMPLE: u32 = 1_000_000;

fn insert(key: &[u8], value: u64) -> Operation {
    Operation::Insert {
        key: key.to_vec(),
        value,
    }
}

fn scan(op: ScanOp, from: &[u8]) -> Operation {
    Operation::Scan {
        op,
        from: from.to_vec(),
    }
}

fn prefix_keys() -> Result<(), FuzzError> {
    run_differential::<RadixTree>(&[
        insert(b"apple", 1),
        insert(b"applesauce", 2),
        insert(b"app", 3),
        scan(ScanOp::First, b""),
        Operation::Lookup(b"app".to_vec()),
        Operation::Lookup(b"apple".to_vec()),
        Operation::Lookup(b"applesauce".to_vec()),
        Operation::Lookup(b"appl".to_vec()),
    ])
}

fn overwrite() -> Result<(), FuzzError> {
    run_differential::<RadixTree>(&[
        insert(b"key", 10),
        insert(b"key", 20),
        Operation::Lookup(b"key".to_vec()),
        scan(ScanOp::First, b""),
    ])
}

fn distinct_keys(mode: KeyMode) -> Result<(), FuzzError> {
    let mut keys = KeyGenerator::new(StdRng::seed_from_u64(0));
    let mut buf = [0u8; KEY_BUFFER_LEN];
    let mut seen = HashSet::with_capacity(SAMPLE as usize);
    for step in 0..SAMPLE {
        let key = keys.generate(step, mode, &mut buf);
        if !seen.insert(key.to_vec()) {
            return Err(FuzzError::DuplicateKey {
                step,
                key: key.to_vec(),
            });
        }
    }
    Ok(())
}

fn int_keys_distinct() -> Result<(), FuzzError> {
    distinct_keys(KeyMode::Int)
}

fn feistel_bijection_sample() -> Result<(), FuzzError> {
    let mut seen = HashSet::with_capacity(2 * SAMPLE as usize);
    // Low indices plus the top of the domain, where the halves saturate.
    let low = 0..SAMPLE;
    let high = (u32::MAX - (SAMPLE - 1))..=u32::MAX;
    for step in low.chain(high) {
        let mixed = feistel(step);
        if !seen.insert(mixed) {
            return Err(FuzzError::DuplicateKey {
                step,
                key: mixed.to_be_bytes().to_vec(),
            });
        }
    }
    distinct_keys(KeyMode::UniqueAlpha)
}

fn random_keys_with_zero_bytes() -> Result<(), FuzzError> {
    let mut keys = KeyGenerator::new(StdRng::seed_from_u64(0x2a));
    let mut buf = [0u8; KEY_BUFFER_LEN];
    let mut operations = Vec::new();
    for step in 0..4096u32 {
        let key = keys.generate(step, KeyMode::Random, &mut buf).to_vec();
        // Short keys repeat often enough to exercise overwrites and removals.
        let short = key[..key.len().min(2)].to_vec();
        operations.push(insert(&key, u64::from(step)));
        operations.push(insert(&short, u64::from(step)));
        if step % 3 == 0 {
            operations.push(Operation::Remove(short.clone()));
        }
        operations.push(Operation::Lookup(short));
        if step % 512 == 0 {
            operations.push(scan(ScanOp::Ge, &key));
        }
    }
    operations.push(insert(b"", 1));
    operations.push(insert(b"\0", 2));
    operations.push(insert(b"\0\0", 3));
    operations.push(scan(ScanOp::First, b""));
    run_differential::<RadixTree>(&operations)
}

fn seek_operators() -> Result<(), FuzzError> {
    let mut operations: Vec<Operation> = [&b"a"[..], b"ab", b"abc", b"abd", b"b", b"ba", b"bb"]
        .iter()
        .zip(1..)
        .map(|(key, value)| insert(key, value))
        .collect();
    for pattern in [&b""[..], b"a", b"aa", b"ab", b"abca", b"abz", b"b", b"bc", b"z"] {
        operations.push(scan(ScanOp::Ge, pattern));
        operations.push(scan(ScanOp::Gt, pattern));
    }
    operations.push(Operation::Remove(b"ab".to_vec()));
    operations.push(scan(ScanOp::Ge, b"ab"));
    operations.push(scan(ScanOp::Gt, b"a"));
    run_differential::<RadixTree>(&operations)
}

/// Runs every check in [`UNIT_CHECKS`], returning the number that failed.
#[must_use]
pub fn run_units() -> usize {
    let mut failed = 0;
    for check in UNIT_CHECKS {
        match (check.run)() {
            Ok(()) => info!(unit = check.name, "unit check passed"),
            Err(err) => {
                error!(unit = check.name, %err, "unit check failed");
                failed += 1;
            }
        }
    }
    failed
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_unit_checks_pass() {
        for check in UNIT_CHECKS {
            assert_eq!((check.run)(), Ok(()), "{}", check.name);
        }
    }

    #[test]
    fn test_unit_check_names_are_unique() {
        let names: HashSet<&str> = UNIT_CHECKS.iter().map(|check| check.name).collect();
        assert_eq!(names.len(), UNIT_CHECKS.len());
    }
}
