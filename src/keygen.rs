//! Key generation for the fuzz workloads.
//!
//! Every workload is a sequence of `u32` indices turned into keys by one of
//! three [`KeyMode`]s:
//! - [`KeyMode::Int`]: the decimal representation of the index. Dense, short
//!   alphabet and length-ordered, which stresses prefix compression.
//! - [`KeyMode::UniqueAlpha`]: the index is permuted by [`feistel`] and written
//!   in base 62, giving random-looking keys with wide branching that are still
//!   distinct for distinct indices.
//! - [`KeyMode::Random`]: random length, random bytes over the whole 0-255
//!   range. Keys may repeat, be empty, or be prefixes of each other.
//!
//! Keys are written into a caller buffer of [`KEY_BUFFER_LEN`] bytes and never
//! exceed `buf.len() - 1` bytes. Shorter buffers truncate deterministically.

use core::fmt;
use std::io::Write;

use rand::RngExt;
use rand::rngs::StdRng;

/// Documented capacity of the buffer handed to [`KeyGenerator::generate`].
pub const KEY_BUFFER_LEN: usize = 64;

/// Digits of the base-62 numeral system used by [`KeyMode::UniqueAlpha`].
const ALPHA_DIGITS: &[u8; 62] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";

/// How a sequence index is turned into a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyMode {
    /// Decimal ASCII representation of the index.
    Int,
    /// Feistel-permuted index written in base 62.
    UniqueAlpha,
    /// Random length and random bytes.
    Random,
}

impl KeyMode {
    /// All modes, in the order the driver runs them.
    pub const ALL: [KeyMode; 3] = [KeyMode::Int, KeyMode::UniqueAlpha, KeyMode::Random];

    /// Returns whether the mode consumes the random stream.
    #[must_use]
    pub fn is_random(self) -> bool {
        matches!(self, KeyMode::Random)
    }
}

impl fmt::Display for KeyMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            KeyMode::Int => "int",
            KeyMode::UniqueAlpha => "unique-alpha",
            KeyMode::Random => "random",
        })
    }
}

/// 8-round Feistel network over the 32-bit domain.
///
/// A bijection: every `u32` maps to a distinct `u32`.
#[must_use]
pub fn feistel(input: u32) -> u32 {
    let mut l = (input & 0xffff) as u16;
    let mut r = (input >> 16) as u16;
    for _ in 0..8 {
        let wide = u32::from(r);
        let f = ((wide * 31 + (wide >> 5) + 7 * 371) ^ wide) as u16;
        let next_l = r;
        r = l ^ f;
        l = next_l;
    }
    (u32::from(r) << 16) | u32::from(l)
}

/// Writes `value` in base 62, least significant digit first.
///
/// At least one digit is written when the buffer has room for it. Returns the
/// number of bytes written.
pub fn alpha_key(buf: &mut [u8], mut value: u32) -> usize {
    let cap = buf.len().saturating_sub(1);
    let mut len = 0;
    while len < cap {
        buf[len] = ALPHA_DIGITS[(value % 62) as usize];
        len += 1;
        value /= 62;
        if value == 0 {
            break;
        }
    }
    len
}

/// Writes the decimal representation of `value`, truncated to the buffer.
///
/// Returns the number of bytes written.
pub fn int_key(buf: &mut [u8], value: u32) -> usize {
    let cap = buf.len().saturating_sub(1);
    let mut cursor = &mut buf[..cap];
    let available = cursor.len();
    // A short buffer makes the write fail part way; what fits is kept.
    let _ = write!(cursor, "{value}");
    available - cursor.len()
}

/// Stateful key generator.
///
/// Only [`KeyMode::Random`] reads from the random stream, so the other modes
/// produce identical keys whatever the seed.
#[derive(Debug)]
pub struct KeyGenerator {
    rng: StdRng,
}

impl KeyGenerator {
    /// Creates a generator drawing random keys from `rng`.
    #[must_use]
    pub fn new(rng: StdRng) -> Self {
        Self { rng }
    }

    /// Writes the key for `index` under `mode` into `buf` and returns it.
    pub fn generate<'b>(&mut self, index: u32, mode: KeyMode, buf: &'b mut [u8]) -> &'b [u8] {
        let len = match mode {
            KeyMode::Int => int_key(buf, index),
            KeyMode::UniqueAlpha => alpha_key(buf, feistel(index)),
            KeyMode::Random => self.random_key(buf),
        };
        &buf[..len]
    }

    fn random_key(&mut self, buf: &mut [u8]) -> usize {
        if buf.is_empty() {
            return 0;
        }
        let len = self.rng.random_range(0..buf.len());
        for byte in &mut buf[..len] {
            *byte = self.rng.random::<u8>();
        }
        len
    }
}
