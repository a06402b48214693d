//! The interface an index must expose to be checked by the harness.
//!
//! The harness only relies on point operations, the key count, and a cursor
//! that walks keys in ascending lexicographic byte order after a seek.

use std::collections::BTreeMap;
use std::collections::btree_map;
use std::ops::Bound;

/// Where [`IndexCursor::seek`] positions a cursor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SeekOp {
    /// Before the smallest key; the pattern is ignored.
    First,
    /// Before the smallest key greater than or equal to the pattern.
    Ge,
    /// Before the smallest key strictly greater than the pattern.
    Gt,
}

/// Forward cursor over the keys of an [`OrderedIndex`].
pub trait IndexCursor {
    /// Repositions the cursor. A fresh cursor behaves as if seeked with [`SeekOp::First`].
    fn seek(&mut self, op: SeekOp, pattern: &[u8]);

    /// Advances to the next key in ascending order, or `None` once exhausted.
    fn next_key(&mut self) -> Option<&[u8]>;
}

/// Ordered byte-string to `u64` map checked against the oracle.
///
/// New instances are obtained through [`Default`].
pub trait OrderedIndex: Default {
    /// Cursor type returned by [`OrderedIndex::cursor`].
    type Cursor<'a>: IndexCursor
    where
        Self: 'a;

    /// Inserts or overwrites `key`, returning whether the key was new.
    fn insert(&mut self, key: &[u8], value: u64) -> bool;

    /// Returns the value stored under `key`.
    fn lookup(&self, key: &[u8]) -> Option<u64>;

    /// Removes `key`, returning whether it was present.
    fn remove(&mut self, key: &[u8]) -> bool;

    /// Number of keys stored.
    fn len(&self) -> usize;

    /// Returns whether the index holds no keys.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Opens a cursor positioned before the smallest key.
    fn cursor(&self) -> Self::Cursor<'_>;
}

/// Cursor over a [`BTreeMap`] used as an [`OrderedIndex`].
#[derive(Debug)]
pub struct BTreeCursor<'a> {
    map: &'a BTreeMap<Vec<u8>, u64>,
    range: btree_map::Range<'a, Vec<u8>, u64>,
}

impl IndexCursor for BTreeCursor<'_> {
    fn seek(&mut self, op: SeekOp, pattern: &[u8]) {
        let lower = match op {
            SeekOp::First => Bound::Unbounded,
            SeekOp::Ge => Bound::Included(pattern),
            SeekOp::Gt => Bound::Excluded(pattern),
        };
        self.range = self.map.range::<[u8], _>((lower, Bound::Unbounded));
    }

    fn next_key(&mut self) -> Option<&[u8]> {
        self.range.next().map(|(key, _)| key.as_slice())
    }
}

impl OrderedIndex for BTreeMap<Vec<u8>, u64> {
    type Cursor<'a> = BTreeCursor<'a>;

    fn insert(&mut self, key: &[u8], value: u64) -> bool {
        BTreeMap::insert(self, key.to_vec(), value).is_none()
    }

    fn lookup(&self, key: &[u8]) -> Option<u64> {
        self.get(key).copied()
    }

    fn remove(&mut self, key: &[u8]) -> bool {
        BTreeMap::remove(self, key).is_some()
    }

    fn len(&self) -> usize {
        BTreeMap::len(self)
    }

    fn cursor(&self) -> Self::Cursor<'_> {
        BTreeCursor {
            map: self,
            range: self.range::<[u8], _>(..),
        }
    }
}
