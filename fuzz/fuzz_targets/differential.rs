//! Differential fuzzing: replay arbitrary operation sequences on the radix tree
//! and on the oracle hash table, and compare every answer.

use honggfuzz::fuzz;
use radix_oracle::{Operation, RadixTree, run_differential};

fn main() {
    loop {
        fuzz!(|ops: Vec<Operation>| {
            if let Err(err) = run_differential::<RadixTree>(&ops) {
                panic!("{err}");
            }
        });
    }
}
