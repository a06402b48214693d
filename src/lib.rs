#![doc = include_str!("../README.md")]
#![deny(clippy::mod_module_files)]

pub mod differential;
pub mod driver;
pub mod errors;
pub mod fuzz;
pub mod index;
pub mod keygen;
pub mod oracle;
pub mod radix;
pub mod timing;
pub mod units;

pub use differential::{Operation, ScanOp, run_differential};
pub use driver::{Categories, run_categories, run_fuzz_modes};
pub use fuzz::{FuzzConfig, FuzzReport, fuzz_test};
pub use index::{IndexCursor, OrderedIndex, SeekOp};
pub use keygen::{KEY_BUFFER_LEN, KeyGenerator, KeyMode};
pub use oracle::{Insertion, OracleTable};
pub use radix::{RadixCursor, RadixTree};

// Re-export errors
pub use errors::{Error, FuzzError};
