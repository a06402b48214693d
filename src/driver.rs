//! Category selection and sequencing for the command-line driver.

use tracing::{error, info, warn};

use crate::errors::Error;
use crate::fuzz::{FuzzConfig, FuzzReport, fuzz_test};
use crate::index::OrderedIndex;
use crate::keygen::KeyMode;
use crate::timing::run_timings;
use crate::units::run_units;

/// Exit status of a run aborted by an invalid configuration, before any
/// check ran. Failure counts never reach it.
pub const CONFIG_ERROR_STATUS: u8 = 78;

/// Exit status for `failures` failed checks, saturating just below
/// [`CONFIG_ERROR_STATUS`].
#[must_use]
pub fn exit_status(failures: usize) -> u8 {
    u8::try_from(failures)
        .unwrap_or(u8::MAX)
        .min(CONFIG_ERROR_STATUS - 1)
}

/// Test categories selected on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Categories {
    /// Log wall-clock timings for every key mode.
    pub bench: bool,
    /// Run the fuzz engine in every key mode.
    pub fuzz: bool,
    /// Run the built-in unit checks.
    pub units: bool,
}

impl Default for Categories {
    fn default() -> Self {
        Self {
            bench: false,
            fuzz: true,
            units: true,
        }
    }
}

impl Categories {
    /// Applies the command-line flags: with none set, the defaults run;
    /// otherwise exactly the named categories run.
    #[must_use]
    pub fn from_flags(bench: bool, fuzz: bool, units: bool) -> Self {
        if bench || fuzz || units {
            Self { bench, fuzz, units }
        } else {
            Self::default()
        }
    }
}

/// Runs the fuzz engine once per key mode, each against a fresh `I`.
///
/// A failing mode does not stop the following ones.
pub fn run_fuzz_modes<I: OrderedIndex>(config: &FuzzConfig) -> Vec<Result<FuzzReport, Error>> {
    KeyMode::ALL
        .iter()
        .map(|&mode| {
            info!(%mode, "fuzz test starting");
            fuzz_test::<I>(mode, config).map_err(|source| Error::Fuzz { mode, source })
        })
        .collect()
}

/// Runs the selected categories against `I` and returns the number of
/// failures, which becomes the process exit status.
#[must_use]
pub fn run_categories<I: OrderedIndex>(categories: Categories, config: &FuzzConfig) -> usize {
    let mut failures = 0;

    if categories.units {
        failures += run_units();
    }

    if categories.fuzz {
        for outcome in run_fuzz_modes::<I>(config) {
            match outcome {
                Ok(report) => info!(
                    mode = %report.mode,
                    keys = report.keys,
                    removed = report.removed,
                    "fuzz test passed"
                ),
                Err(err) => {
                    error!(%err, "fuzz test failed");
                    failures += 1;
                }
            }
        }
    }

    if categories.bench {
        for timing in run_timings::<I>(config.operations, config.seed) {
            info!(
                mode = %timing.mode,
                keys = timing.keys,
                insert = ?timing.insert,
                inserts_per_sec = timing.inserts_per_sec(),
                lookup = ?timing.lookup,
                lookups_per_sec = timing.lookups_per_sec(),
                scan = ?timing.scan,
                "timed"
            );
        }
    }

    if failures > 0 {
        warn!(failures, "some checks failed");
    }
    failures
}
