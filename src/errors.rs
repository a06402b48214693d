//! Submodule defining the errors used across the crate.

use crate::keygen::KeyMode;

/// Renders a key as lowercase hex, the way failure reports print keys.
///
/// Keys produced in [`KeyMode::Random`] are arbitrary bytes, so they are never
/// printed as text.
#[must_use]
pub fn render_key(key: &[u8]) -> String {
    if key.is_empty() {
        return "<empty>".to_owned();
    }
    hex::encode(key)
}

/// Disagreements detected while cross-checking an index against the oracle.
///
/// Each variant carries the values the two stores reported so that the failing
/// check can be reproduced from the log alone.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FuzzError {
    /// The oracle and the index disagree on whether an insertion added a new key.
    #[error(
        "key insertion reported mismatching novelty at step {step} for key {}: oracle new={oracle}, index new={index}",
        render_key(.key)
    )]
    NoveltyMismatch {
        /// Sequence index of the insertion.
        step: u32,
        /// Key being inserted.
        key: Vec<u8>,
        /// Whether the oracle considered the key new.
        oracle: bool,
        /// Whether the index considered the key new.
        index: bool,
    },
    /// The two stores report a different number of keys.
    #[error("oracle / index key count mismatch: {oracle} vs {index}")]
    CountMismatch {
        /// Number of keys in the oracle.
        oracle: usize,
        /// Number of keys in the index.
        index: usize,
    },
    /// The oracle, the index and the recomputed value do not all agree.
    #[error(
        "oracle, index and expected value do not match for key {}: {oracle:?} {index:?} {expected}",
        render_key(.key)
    )]
    ValueMismatch {
        /// Key yielded by the traversal.
        key: Vec<u8>,
        /// Value stored in the oracle, if any.
        oracle: Option<u64>,
        /// Value stored in the index, if any.
        index: Option<u64>,
        /// Value recomputed from the key.
        expected: u64,
    },
    /// The ordered traversal yielded a different number of keys than the oracle holds.
    #[error("the iterator reported {visited} keys instead of {expected}")]
    IteratorCountMismatch {
        /// Keys yielded by the traversal.
        visited: usize,
        /// Keys held by the oracle.
        expected: usize,
    },
    /// The traversal yielded a key that is not strictly greater than its predecessor.
    #[error(
        "the iterator yielded {} after {}, breaking ascending order",
        render_key(.key),
        render_key(.previous)
    )]
    OrderViolation {
        /// Key yielded before the offending one.
        previous: Vec<u8>,
        /// Offending key.
        key: Vec<u8>,
    },
    /// A generator that must produce distinct keys repeated one.
    #[error("key {} produced at step {step} was already generated", render_key(.key))]
    DuplicateKey {
        /// Sequence index that produced the repeated key.
        step: u32,
        /// Repeated key.
        key: Vec<u8>,
    },
    /// The two stores disagree on whether a removal deleted a key.
    #[error(
        "key removal reported mismatching outcome for key {}: oracle removed={oracle}, index removed={index}",
        render_key(.key)
    )]
    RemovalMismatch {
        /// Key being removed.
        key: Vec<u8>,
        /// Whether the oracle removed the key.
        oracle: bool,
        /// Whether the index removed the key.
        index: bool,
    },
}

/// Errors surfaced by the harness.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// A fuzz category failed one of its checks.
    #[error("fuzz test in mode {mode} failed: {source}")]
    Fuzz {
        /// Key generation mode of the failing run.
        mode: KeyMode,
        /// The failing check.
        #[source]
        source: FuzzError,
    },
    /// An environment variable holds a value that cannot be parsed.
    #[error("environment variable {var} has invalid value {value:?}")]
    InvalidEnv {
        /// Name of the variable.
        var: &'static str,
        /// Raw value found in the environment.
        value: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_key_uses_hex() {
        assert_eq!(render_key(b"app"), "617070");
        assert_eq!(render_key(&[0x00, 0xff]), "00ff");
        assert_eq!(render_key(b""), "<empty>");
    }

    #[test]
    fn test_count_mismatch_message() {
        let err = FuzzError::CountMismatch {
            oracle: 10,
            index: 9,
        };
        assert_eq!(err.to_string(), "oracle / index key count mismatch: 10 vs 9");
    }

    #[test]
    fn test_fuzz_error_wraps_mode() {
        let err = Error::Fuzz {
            mode: KeyMode::UniqueAlpha,
            source: FuzzError::IteratorCountMismatch {
                visited: 3,
                expected: 4,
            },
        };
        assert_eq!(
            err.to_string(),
            "fuzz test in mode unique-alpha failed: the iterator reported 3 keys instead of 4"
        );
    }
}
