//! Compressed radix tree over byte-string keys.
//!
//! Every edge carries a non-empty label and the children of a node are kept
//! sorted by the first byte of their label, so a pre-order walk visits keys in
//! ascending lexicographic order. Apart from the root, a node without a value
//! always has at least two children: removals merge a lone child back into its
//! parent.

use core::mem;

use crate::index::{IndexCursor, OrderedIndex, SeekOp};

#[derive(Debug, Default)]
struct Node {
    label: Vec<u8>,
    value: Option<u64>,
    children: Vec<Node>,
}

fn common_prefix(a: &[u8], b: &[u8]) -> usize {
    a.iter().zip(b).take_while(|(x, y)| x == y).count()
}

impl Node {
    fn leaf(label: &[u8], value: u64) -> Self {
        Self {
            label: label.to_vec(),
            value: Some(value),
            children: Vec::new(),
        }
    }

    fn child_position(&self, first: u8) -> Result<usize, usize> {
        self.children
            .binary_search_by_key(&first, |child| child.label[0])
    }

    /// Splits the label at `at`, moving the suffix and everything below it
    /// into a single child.
    fn split(&mut self, at: usize) {
        let tail = Node {
            label: self.label.split_off(at),
            value: self.value.take(),
            children: mem::take(&mut self.children),
        };
        self.children = vec![tail];
    }

    /// Absorbs the only child into this node.
    fn merge_only_child(&mut self) {
        if let Some(only) = self.children.pop() {
            self.label.extend_from_slice(&only.label);
            self.value = only.value;
            self.children = only.children;
        }
    }

    fn remove(&mut self, key: &[u8]) -> bool {
        let Some(&first) = key.first() else {
            return self.value.take().is_some();
        };
        let Ok(pos) = self.child_position(first) else {
            return false;
        };
        let child = &mut self.children[pos];
        let Some(rest) = key.strip_prefix(child.label.as_slice()) else {
            return false;
        };
        if !child.remove(rest) {
            return false;
        }
        if child.value.is_none() {
            match child.children.len() {
                0 => {
                    self.children.remove(pos);
                }
                1 => child.merge_only_child(),
                _ => {}
            }
        }
        true
    }
}

/// Radix tree mapping byte strings to `u64` values.
#[derive(Debug, Default)]
pub struct RadixTree {
    root: Node,
    len: usize,
}

impl RadixTree {
    /// Creates an empty tree.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of keys stored.
    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns whether the tree holds no keys.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Inserts or overwrites `key`, returning whether the key was new.
    pub fn insert(&mut self, key: &[u8], value: u64) -> bool {
        let mut node = &mut self.root;
        let mut rest = key;
        loop {
            let Some(&first) = rest.first() else {
                let is_new = node.value.replace(value).is_none();
                if is_new {
                    self.len += 1;
                }
                return is_new;
            };
            match node.child_position(first) {
                Err(pos) => {
                    node.children.insert(pos, Node::leaf(rest, value));
                    self.len += 1;
                    return true;
                }
                Ok(pos) => {
                    let child = &mut node.children[pos];
                    let common = common_prefix(&child.label, rest);
                    if common < child.label.len() {
                        child.split(common);
                    }
                    rest = &rest[common..];
                    node = child;
                }
            }
        }
    }

    /// Returns the value stored under `key`.
    #[must_use]
    pub fn get(&self, key: &[u8]) -> Option<u64> {
        let mut node = &self.root;
        let mut rest = key;
        while let Some(&first) = rest.first() {
            let pos = node.child_position(first).ok()?;
            let child = &node.children[pos];
            rest = rest.strip_prefix(child.label.as_slice())?;
            node = child;
        }
        node.value
    }

    /// Removes `key`, returning whether it was present.
    pub fn remove(&mut self, key: &[u8]) -> bool {
        let removed = self.root.remove(key);
        if removed {
            self.len -= 1;
        }
        removed
    }

    /// Opens a cursor positioned before the smallest key.
    #[must_use]
    pub fn cursor(&self) -> RadixCursor<'_> {
        let mut cursor = RadixCursor {
            root: &self.root,
            stack: Vec::new(),
            key: Vec::new(),
        };
        cursor.seek(SeekOp::First, &[]);
        cursor
    }
}

#[derive(Debug, Clone, Copy)]
struct Frame<'a> {
    node: &'a Node,
    /// Length of the current key before this node's label.
    base: usize,
    /// Whether this node's own key has been yielded or skipped.
    emitted: bool,
    next_child: usize,
}

/// Pre-order cursor over a [`RadixTree`].
#[derive(Debug)]
pub struct RadixCursor<'a> {
    root: &'a Node,
    stack: Vec<Frame<'a>>,
    key: Vec<u8>,
}

impl IndexCursor for RadixCursor<'_> {
    fn seek(&mut self, op: SeekOp, pattern: &[u8]) {
        self.stack.clear();
        self.key.clear();
        let mut node = self.root;
        let mut base = 0;
        let mut rest = if op == SeekOp::First { None } else { Some(pattern) };
        loop {
            let Some(remaining) = rest else {
                self.stack.push(Frame {
                    node,
                    base,
                    emitted: false,
                    next_child: 0,
                });
                return;
            };
            let Some(&first) = remaining.first() else {
                // This node's key equals the pattern.
                self.stack.push(Frame {
                    node,
                    base,
                    emitted: op == SeekOp::Gt,
                    next_child: 0,
                });
                return;
            };

            // This node's key is a proper prefix of the pattern, hence smaller.
            let pos = node.children.partition_point(|child| child.label[0] < first);
            let mut frame = Frame {
                node,
                base,
                emitted: true,
                next_child: pos,
            };
            let Some(child) = node.children.get(pos).filter(|c| c.label[0] == first) else {
                self.stack.push(frame);
                return;
            };
            let common = common_prefix(&child.label, remaining);
            if common == child.label.len() {
                frame.next_child = pos + 1;
                self.stack.push(frame);
                base = self.key.len();
                self.key.extend_from_slice(&child.label);
                rest = Some(&remaining[common..]);
                node = child;
                continue;
            }
            // The label diverges from the pattern or outlives it: the whole
            // subtree is either below or above the pattern.
            if common < remaining.len() && child.label[common] < remaining[common] {
                frame.next_child = pos + 1;
            }
            self.stack.push(frame);
            return;
        }
    }

    fn next_key(&mut self) -> Option<&[u8]> {
        loop {
            let frame = self.stack.last_mut()?;
            let node = frame.node;
            if !frame.emitted {
                frame.emitted = true;
                if node.value.is_some() {
                    return Some(self.key.as_slice());
                }
            }
            if let Some(child) = node.children.get(frame.next_child) {
                frame.next_child += 1;
                let base = self.key.len();
                self.key.extend_from_slice(&child.label);
                self.stack.push(Frame {
                    node: child,
                    base,
                    emitted: false,
                    next_child: 0,
                });
            } else {
                let base = frame.base;
                self.stack.pop();
                self.key.truncate(base);
            }
        }
    }
}

impl OrderedIndex for RadixTree {
    type Cursor<'a> = RadixCursor<'a>;

    fn insert(&mut self, key: &[u8], value: u64) -> bool {
        RadixTree::insert(self, key, value)
    }

    fn lookup(&self, key: &[u8]) -> Option<u64> {
        self.get(key)
    }

    fn remove(&mut self, key: &[u8]) -> bool {
        RadixTree::remove(self, key)
    }

    fn len(&self) -> usize {
        RadixTree::len(self)
    }

    fn cursor(&self) -> Self::Cursor<'_> {
        RadixTree::cursor(self)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use rand::rngs::StdRng;
    use rand::{RngExt, SeedableRng};

    use super::*;

    fn keys_from(cursor: &mut RadixCursor<'_>) -> Vec<Vec<u8>> {
        let mut keys = Vec::new();
        while let Some(key) = cursor.next_key() {
            keys.push(key.to_vec());
        }
        keys
    }

    fn random_key(rng: &mut StdRng) -> Vec<u8> {
        // Tiny alphabet so that keys share prefixes often.
        let len = rng.random_range(0..6);
        (0..len).map(|_| rng.random_range(0..3u8)).collect()
    }

    #[test]
    fn test_prefix_keys_in_order() {
        let mut tree = RadixTree::new();
        assert!(tree.insert(b"apple", 1));
        assert!(tree.insert(b"applesauce", 2));
        assert!(tree.insert(b"app", 3));
        assert_eq!(tree.len(), 3);
        assert_eq!(
            keys_from(&mut tree.cursor()),
            [&b"app"[..], b"apple", b"applesauce"]
        );
        assert_eq!(tree.get(b"app"), Some(3));
        assert_eq!(tree.get(b"apple"), Some(1));
        assert_eq!(tree.get(b"applesauce"), Some(2));
        assert_eq!(tree.get(b"appl"), None);
        assert_eq!(tree.get(b"applesauces"), None);
    }

    #[test]
    fn test_overwrite_reports_existing() {
        let mut tree = RadixTree::new();
        assert!(tree.insert(b"k", 10));
        assert!(!tree.insert(b"k", 20));
        assert_eq!(tree.get(b"k"), Some(20));
        assert_eq!(tree.len(), 1);
    }

    #[test]
    fn test_empty_key_and_zero_bytes() {
        let mut tree = RadixTree::new();
        assert!(tree.insert(b"", 1));
        assert!(tree.insert(b"\0", 2));
        assert!(tree.insert(b"\0\0", 3));
        assert!(tree.insert(b"a\0b", 4));
        assert_eq!(tree.get(b""), Some(1));
        assert_eq!(tree.get(b"\0\0"), Some(3));
        assert_eq!(tree.get(b"a"), None);
        assert_eq!(
            keys_from(&mut tree.cursor()),
            [&b""[..], b"\0", b"\0\0", b"a\0b"]
        );
    }

    #[test]
    fn test_remove_merges_nodes() {
        let mut tree = RadixTree::new();
        tree.insert(b"romane", 1);
        tree.insert(b"romanus", 2);
        tree.insert(b"romulus", 3);
        assert!(tree.remove(b"romanus"));
        assert!(!tree.remove(b"romanus"));
        assert!(!tree.remove(b"roman"));
        assert_eq!(tree.len(), 2);
        assert_eq!(tree.get(b"romane"), Some(1));
        assert_eq!(tree.get(b"romulus"), Some(3));
        // "roman" lost its second child and was merged with "e".
        let rom = &tree.root.children[0];
        assert_eq!(rom.label, b"rom");
        assert_eq!(rom.children.len(), 2);
        assert_eq!(rom.children[0].label, b"ane");
        assert!(tree.remove(b"romane"));
        assert!(tree.remove(b"romulus"));
        assert!(tree.is_empty());
        assert!(tree.root.children.is_empty());
    }

    #[test]
    fn test_seek_operators() {
        let mut tree = RadixTree::new();
        for key in [&b"a"[..], b"ab", b"abc", b"abd", b"b", b"ba"] {
            tree.insert(key, 0);
        }
        let mut cursor = tree.cursor();

        cursor.seek(SeekOp::Ge, b"ab");
        assert_eq!(keys_from(&mut cursor), [&b"ab"[..], b"abc", b"abd", b"b", b"ba"]);

        cursor.seek(SeekOp::Gt, b"ab");
        assert_eq!(keys_from(&mut cursor), [&b"abc"[..], b"abd", b"b", b"ba"]);

        cursor.seek(SeekOp::Ge, b"abca");
        assert_eq!(keys_from(&mut cursor), [&b"abd"[..], b"b", b"ba"]);

        cursor.seek(SeekOp::Ge, b"aa");
        assert_eq!(keys_from(&mut cursor), [&b"ab"[..], b"abc", b"abd", b"b", b"ba"]);

        cursor.seek(SeekOp::Gt, b"z");
        assert_eq!(cursor.next_key(), None);

        cursor.seek(SeekOp::First, b"ignored");
        assert_eq!(cursor.next_key(), Some(&b"a"[..]));
    }

    #[test]
    fn test_matches_btree_under_random_operations() {
        let mut rng = StdRng::seed_from_u64(0x5eed);
        let mut tree = RadixTree::new();
        let mut map = BTreeMap::new();
        for step in 0..5_000u64 {
            let key = random_key(&mut rng);
            if rng.random_range(0..4) == 0 {
                assert_eq!(tree.remove(&key), map.remove(&key).is_some());
            } else {
                assert_eq!(tree.insert(&key, step), map.insert(key.clone(), step).is_none());
            }
            assert_eq!(tree.len(), map.len());
        }
        let expected: Vec<Vec<u8>> = map.keys().cloned().collect();
        assert_eq!(keys_from(&mut tree.cursor()), expected);
        for (key, value) in &map {
            assert_eq!(tree.get(key), Some(*value));
        }

        for _ in 0..500 {
            let pattern = random_key(&mut rng);
            let mut cursor = tree.cursor();
            cursor.seek(SeekOp::Ge, &pattern);
            let ge: Vec<Vec<u8>> = map.range(pattern.clone()..).map(|(k, _)| k.clone()).collect();
            assert_eq!(keys_from(&mut cursor), ge, "Ge {pattern:?}");

            cursor.seek(SeekOp::Gt, &pattern);
            let gt: Vec<Vec<u8>> = ge.into_iter().filter(|k| *k != pattern).collect();
            assert_eq!(keys_from(&mut cursor), gt, "Gt {pattern:?}");
        }
    }
}
