//! The `Directory` record: a directory's aggregate state as matched files
//! are folded into it, plus the equality check used to confirm a
//! fingerprint match is a real duplicate.

use crate::digest::{fingerprint_word, Digest};
use std::collections::HashMap;
use std::path::PathBuf;

#[derive(Debug)]
pub struct Directory {
    /// Canonical directory path. Immutable after creation.
    pub path: PathBuf,
    /// Files fed so far that live directly or transitively under `path`.
    pub matched_count: usize,
    /// Total regular files under `path`, from the count pass. Immutable.
    pub expected_count: usize,
    /// Commutative XOR-fold over the digests fed so far.
    pub rolling_fp: u64,
    /// Occurrence count per digest, for exact equality checks.
    pub digest_multiset: HashMap<Digest, u32>,
    /// Indices (into the merger's directory arena) of child directories
    /// already merged up into this one.
    pub children: Vec<usize>,
    /// Set once a duplicate report covers this directory or an ancestor of
    /// it; never cleared.
    pub finished: bool,
}

impl Directory {
    pub fn new(path: PathBuf, expected_count: usize) -> Self {
        Directory {
            path,
            matched_count: 0,
            expected_count,
            rolling_fp: 0,
            digest_multiset: HashMap::new(),
            children: Vec::new(),
            finished: false,
        }
    }

    /// Folds one file's digest into this directory. Order-independent:
    /// XOR and multiset-insert both commute, which is what lets callers
    /// feed files in arbitrary order.
    pub fn add(&mut self, digest: &[u8]) {
        self.matched_count += 1;
        self.rolling_fp ^= fingerprint_word(digest);
        *self.digest_multiset.entry(Digest::from_slice(digest)).or_insert(0) += 1;
    }

    /// True once every regular file under this directory has been matched.
    /// A directory whose `expected_count` is zero (the count pass never
    /// saw it) can never become full, by design: it is dropped silently
    /// rather than promoted.
    pub fn is_full(&self) -> bool {
        self.expected_count > 0 && self.matched_count == self.expected_count
    }

    /// Two directories are equal iff their fingerprints match *and* their
    /// digest multisets match exactly in cardinality and membership. The
    /// fingerprint is the cheap pre-filter; this is the resolver for
    /// fingerprint collisions.
    pub fn equal(&self, other: &Directory) -> bool {
        self.rolling_fp == other.rolling_fp
            && self.digest_multiset.len() == other.digest_multiset.len()
            && self
                .digest_multiset
                .iter()
                .all(|(digest, count)| other.digest_multiset.get(digest) == Some(count))
    }

    /// Depth used to sort equivalence classes shallowest-first: the number
    /// of path components.
    pub fn depth(&self) -> usize {
        self.path.components().count()
    }
}
