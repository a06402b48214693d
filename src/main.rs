//! Command-line driver: checks [`RadixTree`] against the oracle.
//!
//! With no arguments the unit checks and the three fuzz categories run. Any of
//! `--bench`, `--fuzz` and `--units` restricts the run to the named
//! categories. The exit status is the number of failed checks; an invalid
//! `RADIX_ORACLE_*` variable exits with 78 before any check runs.

use std::process::ExitCode;

use clap::Parser;
use radix_oracle::driver::{CONFIG_ERROR_STATUS, exit_status};
use radix_oracle::{Categories, FuzzConfig, RadixTree, run_categories};
use tracing::error;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

/// Differential fuzzing of a radix tree against a chaining hash table.
#[derive(Parser, Debug)]
#[command(name = "radix-oracle")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Log wall-clock timings of insertion, lookup and scans
    #[arg(long)]
    bench: bool,

    /// Run the fuzz engine in every key mode
    #[arg(long)]
    fuzz: bool,

    /// Run the built-in unit checks
    #[arg(long)]
    units: bool,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .from_env_lossy(),
        )
        .init();

    let cli = Cli::parse();
    let categories = Categories::from_flags(cli.bench, cli.fuzz, cli.units);

    let config = match FuzzConfig::from_env() {
        Ok(config) => config,
        Err(err) => {
            error!(%err, "invalid configuration");
            return ExitCode::from(CONFIG_ERROR_STATUS);
        }
    };

    let failures = run_categories::<RadixTree>(categories, &config);
    ExitCode::from(exit_status(failures))
}
