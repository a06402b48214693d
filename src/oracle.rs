//! Chaining hash table used as ground truth.
//!
//! No rehashing, just chaining: the bucket array is sized once for the
//! workload and never grows. It is deliberately simple so that it always
//! "tells the truth" when an index disagrees with it.

use core::iter;

/// Bucket count used by [`OracleTable::new`], sized for a million keys.
pub const DEFAULT_BUCKETS: usize = 100_000;

/// djb2 string hash: seed 5381, `hash * 33 + byte` for every byte, wrapping.
#[must_use]
pub fn djb2(key: &[u8]) -> u32 {
    key.iter().fold(5381u32, |hash, &byte| {
        hash.wrapping_mul(33).wrapping_add(u32::from(byte))
    })
}

/// Outcome of [`OracleTable::insert`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Insertion {
    /// The key was not present and has been added.
    Inserted,
    /// The key was present and its value has been replaced.
    Updated,
}

impl Insertion {
    /// Returns whether the insertion added a new key.
    #[must_use]
    pub fn is_new(self) -> bool {
        matches!(self, Insertion::Inserted)
    }
}

#[derive(Debug)]
struct Entry {
    key: Box<[u8]>,
    value: u64,
    next: Option<Box<Entry>>,
}

impl Entry {
    fn matches(&self, key: &[u8]) -> bool {
        self.key.len() == key.len() && *self.key == *key
    }
}

/// Fixed-size separate-chaining hash table over byte-string keys.
#[derive(Debug)]
pub struct OracleTable {
    buckets: Box<[Option<Box<Entry>>]>,
    len: usize,
}

impl Default for OracleTable {
    fn default() -> Self {
        Self::new()
    }
}

impl OracleTable {
    /// Creates an empty table with [`DEFAULT_BUCKETS`] buckets.
    #[must_use]
    pub fn new() -> Self {
        Self::with_buckets(DEFAULT_BUCKETS)
    }

    /// Creates an empty table with `buckets` buckets (at least one).
    #[must_use]
    pub fn with_buckets(buckets: usize) -> Self {
        let buckets = iter::repeat_with(|| None).take(buckets.max(1)).collect();
        Self { buckets, len: 0 }
    }

    /// Number of buckets, fixed at construction.
    #[must_use]
    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }

    /// Number of keys stored.
    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns whether the table holds no keys.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// [`djb2`] of `key` reduced modulo the bucket count.
    ///
    /// Also used as the payload stored under each key, so the expected value
    /// of any key can be recomputed without consulting a store.
    #[must_use]
    pub fn hash(&self, key: &[u8]) -> u32 {
        djb2(key) % self.buckets.len() as u32
    }

    fn chain(&self, bucket: usize) -> impl Iterator<Item = &Entry> {
        iter::successors(self.buckets[bucket].as_deref(), |entry| entry.next.as_deref())
    }

    /// Inserts `key` with `value`, replacing the value if the key exists.
    ///
    /// The table stores its own copy of the key.
    pub fn insert(&mut self, key: &[u8], value: u64) -> Insertion {
        let bucket = self.hash(key) as usize;
        let mut cursor = self.buckets[bucket].as_deref_mut();
        while let Some(entry) = cursor {
            if entry.matches(key) {
                entry.value = value;
                return Insertion::Updated;
            }
            cursor = entry.next.as_deref_mut();
        }

        let next = self.buckets[bucket].take();
        self.buckets[bucket] = Some(Box::new(Entry {
            key: key.into(),
            value,
            next,
        }));
        self.len += 1;
        Insertion::Inserted
    }

    /// Returns the value stored under `key`.
    #[must_use]
    pub fn find(&self, key: &[u8]) -> Option<u64> {
        self.chain(self.hash(key) as usize)
            .find(|entry| entry.matches(key))
            .map(|entry| entry.value)
    }

    /// Removes `key`, returning whether it was present.
    pub fn remove(&mut self, key: &[u8]) -> bool {
        let bucket = self.hash(key) as usize;
        let mut link = &mut self.buckets[bucket];
        loop {
            match link {
                None => return false,
                Some(entry) if entry.matches(key) => {
                    *link = entry.next.take();
                    self.len -= 1;
                    return true;
                }
                Some(entry) => link = &mut entry.next,
            }
        }
    }

    /// Iterates over all entries in bucket order.
    pub fn iter(&self) -> impl Iterator<Item = (&[u8], u64)> {
        (0..self.buckets.len())
            .flat_map(|bucket| self.chain(bucket))
            .map(|entry| (&*entry.key, entry.value))
    }
}

impl Drop for OracleTable {
    fn drop(&mut self) {
        // Unlink chains one entry at a time so long chains do not recurse.
        for bucket in self.buckets.iter_mut() {
            let mut cursor = bucket.take();
            while let Some(mut entry) = cursor {
                cursor = entry.next.take();
            }
        }
    }
}
