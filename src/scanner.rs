//! Demo filesystem walker and content-grouper: a worked example of
//! the "per-file hashing pipeline" and "upstream deduplication" the core
//! treats as external collaborators. Walks the session's root paths,
//! BLAKE3-hashes every regular file, and groups paths by digest so the
//! binary can hand the core a real `MatchedFile` stream. Not part of the
//! core's contract — an alternate scanner could feed `TreeMerger` just as
//! well.

use crate::digest::{Digest, OwnedMatchedFile};
use crate::error::CoreError;
use crate::hasher::hash_file;
use std::collections::{BinaryHeap, HashMap, HashSet};
use std::ffi::OsString;
use std::fmt::Debug;
use std::fs;
#[cfg(unix)]
use std::os::unix::fs::MetadataExt;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::{Duration, Instant};

#[cfg(unix)]
fn inode(metadata: &fs::Metadata) -> u64 {
    metadata.ino()
}

#[cfg(not(unix))]
fn inode(_metadata: &fs::Metadata) -> u64 {
    0
}

#[cfg(unix)]
fn small_file_threshold(metadata: &fs::Metadata) -> u64 {
    metadata.blksize().min(16 * 1024)
}

#[cfg(not(unix))]
fn small_file_threshold(_metadata: &fs::Metadata) -> u64 {
    4096
}

#[derive(Debug)]
pub struct Settings {
    /// Ignore files smaller than a filesystem block: hashing them wins
    /// little and dilutes directories with trivially-unique digests.
    pub ignore_small: bool,
    /// If > 0, a Ctrl-C handler has requested the scan stop at the next
    /// directory boundary.
    pub break_on: Option<&'static AtomicU32>,
}

impl Settings {
    pub fn breaks(&self) -> u32 {
        self.break_on.map_or(0, |b| b.load(Ordering::SeqCst))
    }
}

#[derive(Debug, Default, Copy, Clone)]
#[cfg_attr(feature = "json", derive(serde_derive::Serialize))]
pub struct Stats {
    pub added: usize,
    pub skipped: usize,
    /// Files whose content matched at least one other file in the scan.
    pub matched: usize,
}

pub trait ScanListener: Debug {
    fn file_scanned(&mut self, path: &Path, stats: &Stats);
    fn scan_over(&self, stats: &Stats, scan_duration: Duration);
}

#[derive(Debug)]
struct SilentListener;
impl ScanListener for SilentListener {
    fn file_scanned(&mut self, _: &Path, _: &Stats) {}
    fn scan_over(&self, _: &Stats, _: Duration) {}
}

#[derive(Debug)]
pub struct Scanner {
    by_content: HashMap<Digest, Vec<PathBuf>>,
    /// Directories left to scan, ordered by (truncated) inode so traversal
    /// stays roughly sequential on spinning disks.
    to_scan: BinaryHeap<(u64, Box<Path>)>,
    exclude: HashSet<OsString>,
    scan_listener: Box<dyn ScanListener>,
    stats: Stats,
    pub settings: Settings,
}

impl Scanner {
    pub fn new() -> Self {
        Scanner {
            by_content: HashMap::new(),
            to_scan: BinaryHeap::new(),
            exclude: HashSet::new(),
            scan_listener: Box::new(SilentListener),
            stats: Stats::default(),
            settings: Settings { ignore_small: true, break_on: None },
        }
    }

    pub fn exclude(&mut self, exclude: Vec<String>) {
        self.exclude = exclude.into_iter().map(From::from).collect();
    }

    /// Caution: overrides any previously set listener.
    pub fn set_listener(&mut self, listener: Box<dyn ScanListener>) {
        self.scan_listener = listener;
    }

    pub fn scan(&mut self, path: impl AsRef<Path>) -> Result<(), CoreError> {
        self.enqueue(path)?;
        self.flush()
    }

    pub fn enqueue(&mut self, path: impl AsRef<Path>) -> Result<(), CoreError> {
        let path = path.as_ref();
        let canonical = fs::canonicalize(path)
            .map_err(|source| CoreError::Scan { path: path.to_path_buf(), source })?
            .into_boxed_path();
        let metadata = fs::symlink_metadata(&canonical)
            .map_err(|source| CoreError::Scan { path: canonical.to_path_buf(), source })?;
        self.add(canonical, &metadata)
    }

    /// Drains the queue of directories to scan.
    pub fn flush(&mut self) -> Result<(), CoreError> {
        let start_time = Instant::now();
        while let Some((_, path)) = self.to_scan.pop() {
            if let Err(error) = self.scan_dir(&path) {
                tracing::warn!(%error, "failed to read directory");
                self.stats.skipped += 1;
            }
            if self.settings.breaks() > 0 {
                tracing::info!("scan interrupted");
                break;
            }
        }
        self.scan_listener.scan_over(&self.stats, start_time.elapsed());
        Ok(())
    }

    fn scan_dir(&mut self, path: &Path) -> Result<(), CoreError> {
        // Permission-denied and broken-symlink entries are common and
        // shouldn't abort the whole walk; they're counted as skipped.
        let entries = fs::read_dir(path)
            .map_err(|source| CoreError::Scan { path: path.to_path_buf(), source })?;
        for entry in entries.filter_map(|e| e.ok()) {
            if self.settings.breaks() > 0 {
                break;
            }
            if self.exclude.contains(&entry.file_name()) {
                self.stats.skipped += 1;
                continue;
            }
            let path = entry.path().into_boxed_path();
            let metadata = match entry.metadata() {
                Ok(m) => m,
                Err(source) => {
                    let error = CoreError::Scan { path: path.to_path_buf(), source };
                    tracing::warn!(%error, "failed to stat entry");
                    self.stats.skipped += 1;
                    continue;
                }
            };
            if let Err(error) = self.add(path.clone(), &metadata) {
                tracing::warn!(%error, "failed to hash file");
                self.stats.skipped += 1;
            }
        }
        Ok(())
    }

    fn add(&mut self, path: Box<Path>, metadata: &fs::Metadata) -> Result<(), CoreError> {
        self.scan_listener.file_scanned(&path, &self.stats);

        let ty = metadata.file_type();
        if ty.is_dir() {
            let order_key = !(inode(metadata) >> 8);
            self.to_scan.push((order_key, path));
            return Ok(());
        }
        // Symlinks are never followed, matching the count pass's policy.
        if ty.is_symlink() || !ty.is_file() {
            self.stats.skipped += 1;
            return Ok(());
        }
        if metadata.len() == 0 || (self.settings.ignore_small && metadata.len() < small_file_threshold(metadata)) {
            self.stats.skipped += 1;
            return Ok(());
        }

        self.stats.added += 1;
        let digest = hash_file(&path).map_err(|source| CoreError::Scan { path: path.to_path_buf(), source })?;
        self.by_content.entry(digest).or_default().push(path.into_path_buf());
        Ok(())
    }

    /// Every scanned file whose content matched at least one other scanned
    /// file, as an owned `MatchedFile` stream ready to `feed` into a
    /// `TreeMerger`. Files with a unique digest are never produced here:
    /// they can never belong to a whole-directory duplicate.
    pub fn matched_files(&mut self) -> Vec<OwnedMatchedFile> {
        let mut out = Vec::new();
        for (digest, paths) in &self.by_content {
            if paths.len() < 2 {
                continue;
            }
            for path in paths {
                out.push(OwnedMatchedFile::new(path.clone(), digest.clone()));
            }
        }
        self.stats.matched = out.len();
        out
    }

    pub fn stats(&self) -> &Stats {
        &self.stats
    }
}

impl Default for Scanner {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::fs::File;
    use std::io::Write;
    use tempdir::TempDir;

    fn write(path: &Path, content: &[u8]) {
        let mut f = File::create(path).unwrap();
        f.write_all(content).unwrap();
    }

    #[test]
    fn groups_identical_files_across_the_tree() {
        let tmp = TempDir::new("scan1").unwrap();
        fs::create_dir(tmp.path().join("sub")).unwrap();
        write(&tmp.path().join("a"), b"hello world, this is plenty of bytes");
        write(&tmp.path().join("sub").join("b"), b"hello world, this is plenty of bytes");
        write(&tmp.path().join("unique"), b"nothing else looks like this at all");

        let mut scanner = Scanner::new();
        scanner.settings.ignore_small = false;
        scanner.scan(tmp.path()).unwrap();

        let matched = scanner.matched_files();
        assert_eq!(matched.len(), 2);
        assert_eq!(scanner.stats().added, 3);
    }

    #[test]
    fn excluded_names_are_skipped() {
        let tmp = TempDir::new("scan2").unwrap();
        fs::create_dir(tmp.path().join(".git")).unwrap();
        write(&tmp.path().join(".git").join("x"), b"irrelevant content");
        write(&tmp.path().join("a"), b"relevant content right here");

        let mut scanner = Scanner::new();
        scanner.settings.ignore_small = false;
        scanner.exclude(vec![".git".to_string()]);
        scanner.scan(tmp.path()).unwrap();

        assert_eq!(scanner.stats().added, 1);
    }
}
