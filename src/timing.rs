//! Wall-clock timings reported by the `--bench` category.
//!
//! This is instrumentation, not a benchmark suite: every mode is timed once,
//! with no warm-up or statistics, and the driver only logs the numbers.

use std::time::{Duration, Instant};

use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::debug;

use crate::index::{IndexCursor, OrderedIndex};
use crate::keygen::{KEY_BUFFER_LEN, KeyGenerator, KeyMode};

/// Elapsed time of each phase of a timed run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timing {
    /// Key generation mode of the run.
    pub mode: KeyMode,
    /// Number of keys generated.
    pub operations: u32,
    /// Distinct keys in the index after the insert phase.
    pub keys: usize,
    /// Time spent generating and inserting keys.
    pub insert: Duration,
    /// Time spent generating the same keys again and looking them up.
    pub lookup: Duration,
    /// Time spent walking every key in order.
    pub scan: Duration,
}

#[allow(clippy::cast_precision_loss)]
fn per_second(operations: usize, elapsed: Duration) -> f64 {
    let seconds = elapsed.as_secs_f64();
    if seconds == 0.0 {
        return f64::INFINITY;
    }
    operations as f64 / seconds
}

impl Timing {
    /// Insertions per second over the insert phase.
    #[must_use]
    pub fn inserts_per_sec(&self) -> f64 {
        per_second(self.operations as usize, self.insert)
    }

    /// Point lookups per second over the lookup phase.
    #[must_use]
    pub fn lookups_per_sec(&self) -> f64 {
        per_second(self.operations as usize, self.lookup)
    }
}

/// Times insertion, point lookup and a full scan on a fresh `I`.
#[must_use]
pub fn time_mode<I: OrderedIndex>(mode: KeyMode, operations: u32, seed: u64) -> Timing {
    let mut index = I::default();
    let mut buf = [0u8; KEY_BUFFER_LEN];

    let mut keys = KeyGenerator::new(StdRng::seed_from_u64(seed));
    let start = Instant::now();
    for step in 0..operations {
        let key = keys.generate(step, mode, &mut buf);
        index.insert(key, u64::from(step));
    }
    let insert = start.elapsed();

    // Same seed, same keys.
    let mut keys = KeyGenerator::new(StdRng::seed_from_u64(seed));
    let mut found = 0usize;
    let start = Instant::now();
    for step in 0..operations {
        let key = keys.generate(step, mode, &mut buf);
        found += usize::from(index.lookup(key).is_some());
    }
    let lookup = start.elapsed();

    let mut cursor = index.cursor();
    let mut scanned = 0usize;
    let start = Instant::now();
    while cursor.next_key().is_some() {
        scanned += 1;
    }
    let scan = start.elapsed();

    debug_assert_eq!(found, operations as usize);
    debug_assert_eq!(scanned, index.len());

    Timing {
        mode,
        operations,
        keys: index.len(),
        insert,
        lookup,
        scan,
    }
}

/// Times every key mode, in the order the driver runs them.
#[must_use]
pub fn run_timings<I: OrderedIndex>(operations: u32, seed: u64) -> Vec<Timing> {
    KeyMode::ALL
        .iter()
        .map(|&mode| {
            debug!(%mode, operations, "timing");
            time_mode::<I>(mode, operations, seed)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::radix::RadixTree;

    #[test]
    fn test_time_mode_counts_keys() {
        let timing = time_mode::<RadixTree>(KeyMode::Int, 5_000, 0);
        assert_eq!(timing.operations, 5_000);
        assert_eq!(timing.keys, 5_000);
    }

    #[test]
    fn test_run_timings_covers_all_modes() {
        let timings = run_timings::<RadixTree>(1_000, 3);
        let modes: Vec<KeyMode> = timings.iter().map(|timing| timing.mode).collect();
        assert_eq!(modes, KeyMode::ALL);
        assert!(timings[2].keys <= 1_000);
    }

    #[test]
    fn test_rates_follow_operation_count() {
        let timing = Timing {
            mode: KeyMode::Int,
            operations: 10,
            keys: 10,
            insert: Duration::from_secs(2),
            lookup: Duration::ZERO,
            scan: Duration::ZERO,
        };
        assert!((timing.inserts_per_sec() - 5.0).abs() < f64::EPSILON);
        assert!(timing.lookups_per_sec().is_infinite());
    }

    #[test]
    fn test_per_second_handles_zero() {
        assert!(per_second(10, Duration::ZERO).is_infinite());
        assert!((per_second(10, Duration::from_secs(2)) - 5.0).abs() < f64::EPSILON);
    }
}
