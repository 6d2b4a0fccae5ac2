//! Byte-string keyed ordered map used for both the file-count map and the
//! directory-map. Keys are arbitrary byte strings (path bytes); a sentinel
//! NUL byte is appended internally so that a key which is a strict prefix of
//! another key never collides with it, matching the byte-string model the
//! spec describes even though Rust's length-delimited `Vec<u8>` keys already
//! make this true structurally.
//!
//! This is a plain (non edge-compressed) trie: every byte of the key gets
//! its own node. That keeps operations O(k) in key length without the
//! bookkeeping of a compressed radix tree.

use std::collections::BTreeMap;
use std::ops::ControlFlow;

const TERMINATOR: u8 = 0;

struct Node<V> {
    children: BTreeMap<u8, Box<Node<V>>>,
    value: Option<V>,
}

impl<V> Default for Node<V> {
    fn default() -> Self {
        Node { children: BTreeMap::new(), value: None }
    }
}

/// A path-keyed ordered map over byte strings.
pub struct PathTrie<V> {
    root: Node<V>,
}

impl<V> Default for PathTrie<V> {
    fn default() -> Self {
        PathTrie { root: Node::default() }
    }
}

impl<V> PathTrie<V> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts `value` under `key`, replacing any existing value.
    pub fn insert(&mut self, key: &[u8], value: V) {
        let terminal = self.node_mut(key);
        terminal.value = Some(value);
    }

    /// Looks up the value stored under `key`, if any.
    pub fn lookup(&self, key: &[u8]) -> Option<&V> {
        let mut node = &self.root;
        for &b in key {
            node = node.children.get(&b)?;
        }
        node.children.get(&TERMINATOR)?.value.as_ref()
    }

    /// Returns a mutable reference to the value under `key`, inserting
    /// `V::default()` first if the key is absent.
    pub fn entry_or_default(&mut self, key: &[u8]) -> &mut V
    where
        V: Default,
    {
        let terminal = self.node_mut(key);
        terminal.value.get_or_insert_with(V::default)
    }

    fn node_mut(&mut self, key: &[u8]) -> &mut Node<V> {
        let mut node = &mut self.root;
        for &b in key {
            node = node.children.entry(b).or_insert_with(|| Box::new(Node::default()));
        }
        &mut *node.children.entry(TERMINATOR).or_insert_with(|| Box::new(Node::default()))
    }

    /// Visits every `(key, value)` pair in stable (lexicographic-by-byte)
    /// order. The visitor may stop iteration early by returning
    /// `ControlFlow::Break`.
    pub fn iterate<F>(&self, mut visitor: F)
    where
        F: FnMut(&[u8], &V) -> ControlFlow<()>,
    {
        let mut buf = Vec::new();
        Self::walk(&self.root, &mut buf, &mut visitor);
    }

    fn walk<F>(node: &Node<V>, buf: &mut Vec<u8>, visitor: &mut F) -> ControlFlow<()>
    where
        F: FnMut(&[u8], &V) -> ControlFlow<()>,
    {
        for (&b, child) in &node.children {
            if b == TERMINATOR {
                if let Some(value) = &child.value {
                    visitor(buf, value)?;
                }
            } else {
                buf.push(b);
                let result = Self::walk(child, buf, visitor);
                buf.pop();
                result?;
            }
        }
        ControlFlow::Continue(())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn insert_and_lookup() {
        let mut trie = PathTrie::new();
        trie.insert(b"/a", 1);
        trie.insert(b"/a/b", 2);
        trie.insert(b"/", 0);

        assert_eq!(trie.lookup(b"/a"), Some(&1));
        assert_eq!(trie.lookup(b"/a/b"), Some(&2));
        assert_eq!(trie.lookup(b"/"), Some(&0));
        assert_eq!(trie.lookup(b"/a/c"), None);
        assert_eq!(trie.lookup(b"/ab"), None);
    }

    #[test]
    fn replace_semantics() {
        let mut trie = PathTrie::new();
        trie.insert(b"/x", "first");
        trie.insert(b"/x", "second");
        assert_eq!(trie.lookup(b"/x"), Some(&"second"));
    }

    #[test]
    fn entry_or_default_increments() {
        let mut trie: PathTrie<usize> = PathTrie::new();
        *trie.entry_or_default(b"/a") += 1;
        *trie.entry_or_default(b"/a") += 1;
        *trie.entry_or_default(b"/b") += 1;
        assert_eq!(trie.lookup(b"/a"), Some(&2));
        assert_eq!(trie.lookup(b"/b"), Some(&1));
    }

    #[test]
    fn prefix_keys_are_distinct() {
        let mut trie = PathTrie::new();
        trie.insert(b"/a", "short");
        trie.insert(b"/ab", "long");
        assert_eq!(trie.lookup(b"/a"), Some(&"short"));
        assert_eq!(trie.lookup(b"/ab"), Some(&"long"));
    }

    #[test]
    fn iterate_visits_all_and_can_abort() {
        let mut trie = PathTrie::new();
        trie.insert(b"/a", 1);
        trie.insert(b"/b", 2);
        trie.insert(b"/c", 3);

        let mut seen = Vec::new();
        trie.iterate(|key, value| {
            seen.push((key.to_vec(), *value));
            ControlFlow::Continue(())
        });
        assert_eq!(seen.len(), 3);

        let mut count = 0;
        trie.iterate(|_, _| {
            count += 1;
            if count == 1 {
                ControlFlow::Break(())
            } else {
                ControlFlow::Continue(())
            }
        });
        assert_eq!(count, 1);
    }
}
