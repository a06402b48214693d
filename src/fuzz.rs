//! Fuzz engine: drives a key workload through the oracle and an index in
//! lock-step and cross-checks them.
//!
//! A run goes through four checks, stopping at the first failure:
//! 1. **Populate**: every generated key is inserted in both stores, which must
//!    agree on whether the key was new.
//! 2. **Count**: both stores must hold the same number of keys.
//! 3. **Traverse**: an ordered walk of the index from its smallest key must
//!    yield strictly ascending keys whose values match both the oracle and the
//!    value recomputed from the key.
//! 4. **Done**: the walk must have yielded exactly as many keys as the oracle
//!    holds.
//!
//! Point lookups and ordered iteration fail independently in tree-like
//! indexes, so both are always exercised. When
//! [`FuzzConfig::check_removals`] is set, half of the keys are then removed
//! from both stores and the count and traversal checks run again.

use core::str::FromStr;

use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::{debug, info};

use crate::errors::{Error, FuzzError};
use crate::index::{IndexCursor, OrderedIndex, SeekOp};
use crate::keygen::{KEY_BUFFER_LEN, KeyGenerator, KeyMode};
use crate::oracle::{DEFAULT_BUCKETS, OracleTable};

/// Number of insertions performed by a default run.
pub const DEFAULT_OPERATIONS: u32 = 1_000_000;

/// Environment variable overriding [`FuzzConfig::operations`].
pub const ENV_OPERATIONS: &str = "RADIX_ORACLE_OPERATIONS";
/// Environment variable overriding [`FuzzConfig::buckets`].
pub const ENV_BUCKETS: &str = "RADIX_ORACLE_BUCKETS";
/// Environment variable overriding [`FuzzConfig::seed`].
pub const ENV_SEED: &str = "RADIX_ORACLE_SEED";
/// Environment variable overriding [`FuzzConfig::check_removals`].
pub const ENV_CHECK_REMOVALS: &str = "RADIX_ORACLE_CHECK_REMOVALS";

/// Parameters of a fuzz run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FuzzConfig {
    /// Number of keys generated and inserted.
    pub operations: u32,
    /// Bucket count of the oracle. Also bounds the stored values.
    pub buckets: usize,
    /// Seed of the random stream used by [`KeyMode::Random`].
    pub seed: u64,
    /// Whether to remove half of the keys after the traversal and check again.
    pub check_removals: bool,
}

impl Default for FuzzConfig {
    fn default() -> Self {
        Self {
            operations: DEFAULT_OPERATIONS,
            buckets: DEFAULT_BUCKETS,
            seed: 0,
            check_removals: false,
        }
    }
}

fn parse_var<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    var: &'static str,
) -> Result<Option<T>, Error> {
    let Some(value) = lookup(var) else {
        return Ok(None);
    };
    value
        .trim()
        .parse()
        .map(Some)
        .map_err(|_| Error::InvalidEnv { var, value })
}

fn parse_flag(
    lookup: &impl Fn(&str) -> Option<String>,
    var: &'static str,
) -> Result<Option<bool>, Error> {
    let Some(value) = lookup(var) else {
        return Ok(None);
    };
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(Some(true)),
        "0" | "false" | "no" | "off" => Ok(Some(false)),
        _ => Err(Error::InvalidEnv { var, value }),
    }
}

impl FuzzConfig {
    /// Builds a configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidEnv`] if a variable is set to an unparsable value.
    pub fn from_env() -> Result<Self, Error> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Builds a configuration from an arbitrary variable lookup, starting from
    /// the defaults.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidEnv`] if a variable is set to an unparsable value.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, Error> {
        let mut config = Self::default();
        if let Some(operations) = parse_var(&lookup, ENV_OPERATIONS)? {
            config.operations = operations;
        }
        if let Some(buckets) = parse_var::<usize>(&lookup, ENV_BUCKETS)? {
            if buckets == 0 {
                return Err(Error::InvalidEnv {
                    var: ENV_BUCKETS,
                    value: buckets.to_string(),
                });
            }
            config.buckets = buckets;
        }
        if let Some(seed) = parse_var(&lookup, ENV_SEED)? {
            config.seed = seed;
        }
        if let Some(check_removals) = parse_flag(&lookup, ENV_CHECK_REMOVALS)? {
            config.check_removals = check_removals;
        }
        Ok(config)
    }
}

/// Summary of a successful run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FuzzReport {
    /// Key generation mode of the run.
    pub mode: KeyMode,
    /// Distinct keys held by both stores after the population phase.
    pub keys: usize,
    /// Keys removed by the removal phase, zero when it is disabled.
    pub removed: usize,
}

/// Oracle and index driven in lock-step for one run.
struct FuzzRun<I> {
    oracle: OracleTable,
    index: I,
}

impl<I: OrderedIndex> FuzzRun<I> {
    fn new(buckets: usize) -> Self {
        Self {
            oracle: OracleTable::with_buckets(buckets),
            index: I::default(),
        }
    }

    fn expected_value(&self, key: &[u8]) -> u64 {
        u64::from(self.oracle.hash(key))
    }

    fn populate(&mut self, mode: KeyMode, config: &FuzzConfig) -> Result<(), FuzzError> {
        let mut keys = KeyGenerator::new(StdRng::seed_from_u64(config.seed));
        let mut buf = [0u8; KEY_BUFFER_LEN];
        for step in 0..config.operations {
            let key = keys.generate(step, mode, &mut buf);
            let value = self.expected_value(key);
            let oracle = self.oracle.insert(key, value).is_new();
            let index = self.index.insert(key, value);
            if oracle != index {
                return Err(FuzzError::NoveltyMismatch {
                    step,
                    key: key.to_vec(),
                    oracle,
                    index,
                });
            }
        }
        Ok(())
    }

    fn check_count(&self) -> Result<(), FuzzError> {
        let (oracle, index) = (self.oracle.len(), self.index.len());
        if oracle == index {
            Ok(())
        } else {
            Err(FuzzError::CountMismatch { oracle, index })
        }
    }

    /// Walks the whole index in order, checking every key. Yielded keys are
    /// handed to `visit`.
    fn traverse(&self, mut visit: impl FnMut(&[u8])) -> Result<(), FuzzError> {
        let mut cursor = self.index.cursor();
        cursor.seek(SeekOp::First, &[]);
        let mut previous: Option<Vec<u8>> = None;
        let mut visited = 0usize;
        while let Some(key) = cursor.next_key() {
            if let Some(previous) = previous.as_deref().filter(|previous| *previous >= key) {
                return Err(FuzzError::OrderViolation {
                    previous: previous.to_vec(),
                    key: key.to_vec(),
                });
            }
            let expected = self.expected_value(key);
            let oracle = self.oracle.find(key);
            let index = self.index.lookup(key);
            if oracle != Some(expected) || index != Some(expected) {
                return Err(FuzzError::ValueMismatch {
                    key: key.to_vec(),
                    oracle,
                    index,
                    expected,
                });
            }
            visit(key);
            visited += 1;
            let slot = previous.get_or_insert_with(Vec::new);
            slot.clear();
            slot.extend_from_slice(key);
        }

        if visited == self.oracle.len() {
            Ok(())
        } else {
            Err(FuzzError::IteratorCountMismatch {
                visited,
                expected: self.oracle.len(),
            })
        }
    }

    /// Removes every other key of `keys` from both stores.
    fn remove_half(&mut self, keys: &[Vec<u8>]) -> Result<usize, FuzzError> {
        let mut removed = 0;
        for key in keys.iter().step_by(2) {
            let oracle = self.oracle.remove(key);
            let index = self.index.remove(key);
            if oracle != index {
                return Err(FuzzError::RemovalMismatch {
                    key: key.clone(),
                    oracle,
                    index,
                });
            }
            removed += usize::from(oracle);
        }
        Ok(removed)
    }
}

/// Runs one fuzz category against a fresh instance of `I`.
///
/// # Errors
///
/// Returns the first [`FuzzError`] detected. The failing key is not isolated:
/// the whole workload, together with [`FuzzConfig::seed`] for
/// [`KeyMode::Random`], is the reproduction.
pub fn fuzz_test<I: OrderedIndex>(
    mode: KeyMode,
    config: &FuzzConfig,
) -> Result<FuzzReport, FuzzError> {
    let mut run = FuzzRun::<I>::new(config.buckets);

    // The seed only matters to the random workload.
    let seed = mode.is_random().then_some(config.seed);
    debug!(%mode, operations = config.operations, seed, "populating");
    run.populate(mode, config)?;
    run.check_count()?;
    let keys = run.oracle.len();
    info!(%mode, keys, "elements inserted");

    debug!(%mode, "traversing");
    let mut removed = 0;
    if config.check_removals {
        let mut visited = Vec::with_capacity(keys);
        run.traverse(|key| visited.push(key.to_vec()))?;
        removed = run.remove_half(&visited)?;
        run.check_count()?;
        run.traverse(|_| {})?;
        info!(%mode, removed, remaining = run.oracle.len(), "elements removed");
    } else {
        run.traverse(|_| {})?;
    }

    Ok(FuzzReport {
        mode,
        keys,
        removed,
    })
}
