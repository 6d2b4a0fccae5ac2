//! The feeder, bottom-up merger and extractor: the streaming
//! entry point that owns every `Directory` record and turns a stream of
//! matched files into a list of duplicate-directory groups.

use crate::directory::Directory;
use crate::error::CoreError;
use crate::digest::MatchedFile;
use crate::count::build_count_map;
use crate::pathkey::path_to_bytes;
use crate::report::ReportSink;
use crate::session::Session;
use crate::trie::PathTrie;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

/// Owns every `Directory` record discovered while feeding, and implements
/// the bottom-up promotion and duplicate extraction over them.
pub struct TreeMerger {
    count_map: PathTrie<usize>,
    count_pass_complete: bool,
    /// The scan roots themselves: promotion never climbs above one of
    /// these, since everything above is outside the scanned set and would
    /// otherwise look "full" by sharing the same vertical chain of digests.
    roots: HashSet<PathBuf>,

    /// Single owner of every `Directory` record, addressed by index.
    dirs: Vec<Directory>,
    /// path -> index into `dirs`.
    dir_index: PathTrie<usize>,
    /// Directories that might still be promotion candidates.
    valid_dirs: Vec<usize>,
    /// fingerprint -> indices of directories that reached fullness with
    /// that fingerprint.
    groups: HashMap<u64, Vec<usize>>,
    /// Directories already placed into `groups`, so a fold that pushes an
    /// already-full directory no further doesn't register it twice, and so
    /// a fold into a *pre-existing* directory can still be detected as a
    /// fresh fullness transition (see `merge_upward`).
    grouped: HashSet<usize>,
}

impl TreeMerger {
    /// Runs the one-time file-count pass over `session.paths` and returns
    /// a merger ready to be fed. Infallible: a partial count pass is
    /// recorded, not raised as an error (see [`TreeMerger::count_pass_complete`]).
    pub fn new(session: &Session) -> Self {
        let (count_map, count_pass_complete) = build_count_map(&session.paths);
        TreeMerger {
            count_map,
            count_pass_complete,
            roots: session.paths.iter().cloned().collect(),
            dirs: Vec::new(),
            dir_index: PathTrie::new(),
            valid_dirs: Vec::new(),
            groups: HashMap::new(),
            grouped: HashSet::new(),
        }
    }

    /// Whether the file-count pass enumerated every file cleanly. `false`
    /// means some directories may be under-counted and will never reach
    /// fullness.
    pub fn count_pass_complete(&self) -> bool {
        self.count_pass_complete
    }

    /// Feeds one matched file into its owning directory, creating the
    /// directory record on first demand and promoting it into the
    /// fingerprint grouping table once it becomes full.
    ///
    /// Each file must be fed at most once; feeding the same file twice
    /// corrupts that directory's fingerprint. Rejects files with a
    /// relative path or an empty digest.
    pub fn feed(&mut self, file: &impl MatchedFile) -> Result<(), CoreError> {
        let path = file.path();
        if !path.is_absolute() {
            let error = CoreError::InvalidFile { reason: "file path must be absolute" };
            tracing::error!(path = %path.display(), %error, "rejecting file fed to merger");
            return Err(error);
        }
        let digest = file.digest();
        if digest.is_empty() {
            let error = CoreError::InvalidFile { reason: "file digest must not be empty" };
            tracing::error!(path = %path.display(), %error, "rejecting file fed to merger");
            return Err(error);
        }
        let dirname = match path.parent() {
            Some(dirname) => dirname,
            None => {
                let error = CoreError::InvalidFile { reason: "file path has no parent directory" };
                tracing::error!(path = %path.display(), %error, "rejecting file fed to merger");
                return Err(error);
            }
        };

        let idx = self.get_or_create_dir(dirname);
        self.dirs[idx].add(digest);
        if self.dirs[idx].is_full() && self.grouped.insert(idx) {
            self.groups.entry(self.dirs[idx].rolling_fp).or_default().push(idx);
        }
        Ok(())
    }

    /// Looks up or creates the `Directory` for `path`, registering freshly
    /// created directories onto `valid_dirs` so `finish` will consider
    /// promoting them.
    fn get_or_create_dir(&mut self, path: &Path) -> usize {
        let key = path_to_bytes(path);
        if let Some(&idx) = self.dir_index.lookup(&key) {
            return idx;
        }
        let expected = self.count_map.lookup(&key).copied().unwrap_or(0);
        let idx = self.dirs.len();
        self.dirs.push(Directory::new(path.to_path_buf(), expected));
        self.dir_index.insert(&key, idx);
        self.valid_dirs.push(idx);
        idx
    }

    /// Drains `valid_dirs`, repeatedly lifting full directories into their
    /// parents until no further promotion is possible, then emits
    /// duplicate-directory groups to `sink`.
    ///
    /// Must only be called after every file has been fed.
    pub fn finish(&mut self, sink: &mut impl ReportSink) {
        self.merge_upward();
        self.extract(sink);
    }

    fn merge_upward(&mut self) {
        while !self.valid_dirs.is_empty() {
            let current = std::mem::take(&mut self.valid_dirs);
            let mut touched = Vec::new();

            for child_idx in current {
                // A scan root is the ceiling of promotion: everything above
                // it lies outside the scanned set, so it must never be
                // folded into a not-really-candidate ancestor.
                if self.roots.contains(&self.dirs[child_idx].path) {
                    continue;
                }

                let parent_path = match self.dirs[child_idx].path.parent() {
                    Some(parent) => parent.to_path_buf(),
                    None => continue, // reached the filesystem root; nothing left to promote into
                };

                let parent_idx = self.lookup_or_create_parent(&parent_path);
                touched.push(parent_idx);

                let digests: Vec<_> = self.dirs[child_idx]
                    .digest_multiset
                    .iter()
                    .map(|(digest, count)| (digest.clone(), *count))
                    .collect();
                for (digest, count) in digests {
                    for _ in 0..count {
                        self.dirs[parent_idx].add(&digest);
                    }
                }
                self.dirs[parent_idx].children.push(child_idx);
            }

            // A parent may have existed before this round (created directly
            // by `feed`, or promoted into on an earlier round) and only
            // cross into fullness because of *this* round's fold -- so every
            // touched parent is checked here, not just freshly created ones.
            for idx in touched {
                if self.dirs[idx].is_full() && self.grouped.insert(idx) {
                    self.valid_dirs.push(idx);
                    self.groups.entry(self.dirs[idx].rolling_fp).or_default().push(idx);
                }
            }
        }
    }

    fn lookup_or_create_parent(&mut self, parent_path: &Path) -> usize {
        let key = path_to_bytes(parent_path);
        if let Some(&idx) = self.dir_index.lookup(&key) {
            return idx;
        }
        let expected = self.count_map.lookup(&key).copied().unwrap_or(0);
        let idx = self.dirs.len();
        self.dirs.push(Directory::new(parent_path.to_path_buf(), expected));
        self.dir_index.insert(&key, idx);
        idx
    }

    /// Groups full directories by fingerprint, splits each bucket into
    /// true-equality equivalence classes, then visits classes in global
    /// shallow-to-deep order so that once an ancestor is reported, every
    /// descendant class processed afterwards sees `finished == true` and
    /// is suppressed. (Processing merely in per-bucket or insertion order
    /// does not give this guarantee: a deep directory can reach fullness,
    /// and so enter `groups`, strictly before the shallower ancestor that
    /// later subsumes it.)
    fn extract(&mut self, sink: &mut impl ReportSink) {
        let mut classes: Vec<Vec<usize>> = Vec::new();
        for bucket in std::mem::take(&mut self.groups).into_values() {
            classes.extend(self.partition_by_equality(bucket));
        }

        for class in &mut classes {
            class.sort_by_key(|&idx| self.dirs[idx].depth());
        }
        classes.sort_by_key(|class| class.first().map(|&idx| self.dirs[idx].depth()).unwrap_or(0));

        for class in classes {
            let survivors = self.surviving_members(&class);
            if survivors.len() < 2 {
                continue;
            }

            sink.begin_group();
            for &idx in &survivors {
                sink.member(self.dirs[idx].rolling_fp, &self.dirs[idx].path);
                mark_finished(&mut self.dirs, idx);
            }
            sink.end_group();
        }
    }

    /// Walks a class in its already shallow-to-deep order and decides, one
    /// member at a time, whether it still stands once earlier members in
    /// the *same* class have claimed their subtrees. A member covered by an
    /// earlier member's `children` back-links (i.e. it's a descendant of
    /// something this class already reports) never survives to be reported
    /// itself — checking `finished` only at the end, after the whole class
    /// has been scanned, misses exactly this case.
    fn surviving_members(&self, class: &[usize]) -> Vec<usize> {
        let mut covered: HashSet<usize> = HashSet::new();
        let mut survivors = Vec::new();
        for &idx in class {
            if self.dirs[idx].finished || covered.contains(&idx) {
                continue;
            }
            survivors.push(idx);
            self.collect_subtree(idx, &mut covered);
        }
        survivors
    }

    fn collect_subtree(&self, idx: usize, out: &mut HashSet<usize>) {
        if !out.insert(idx) {
            return;
        }
        for &child in &self.dirs[idx].children {
            self.collect_subtree(child, out);
        }
    }

    fn partition_by_equality(&self, bucket: Vec<usize>) -> Vec<Vec<usize>> {
        let mut classes: Vec<Vec<usize>> = Vec::new();
        for idx in bucket {
            let class = classes.iter_mut().find(|class| self.dirs[class[0]].equal(&self.dirs[idx]));
            match class {
                Some(class) => class.push(idx),
                None => classes.push(vec![idx]),
            }
        }
        classes
    }
}

fn mark_finished(dirs: &mut [Directory], idx: usize) {
    if dirs[idx].finished {
        return;
    }
    dirs[idx].finished = true;
    let children = dirs[idx].children.clone();
    for child in children {
        mark_finished(dirs, child);
    }
}
