//! The one-time file-count pass: walks the configured root paths
//! and records, for every ancestor directory, how many regular files sit
//! beneath it. Runs once in `TreeMerger::new`, well before any `feed`
//! call.

use crate::error::CoreError;
use crate::pathkey::{ancestor_prefixes, path_to_bytes};
use crate::trie::PathTrie;
use std::fs;
use std::ops::ControlFlow;
use std::path::{Path, PathBuf};

/// Populates a count-map from the given root paths. Returns `true` if the
/// whole tree was enumerated cleanly; `false` if some entry could not be
/// read, in which case the map is still usable but some directories may be
/// under-counted (and thus never reach "full").
pub fn build_count_map(roots: &[PathBuf]) -> (PathTrie<usize>, bool) {
    let mut file_trie: PathTrie<()> = PathTrie::new();
    let mut completed = true;

    for root in roots {
        if !collect_files(root, &mut file_trie) {
            completed = false;
        }
    }

    let mut counts: PathTrie<usize> = PathTrie::new();
    file_trie.iterate(|key, ()| {
        for prefix in ancestor_prefixes(key) {
            *counts.entry_or_default(&prefix) += 1;
        }
        ControlFlow::Continue(())
    });

    (counts, completed)
}

/// Recursively walks `root`, inserting every regular file's path into
/// `file_trie`. Symlinks are never followed, matching the demo scanner's
/// own policy of not traversing into symlinked entries (to avoid
/// cycles); a file reached only through a symlink is therefore not
/// counted.
fn collect_files(root: &Path, file_trie: &mut PathTrie<()>) -> bool {
    let mut ok = true;
    let mut stack = vec![root.to_path_buf()];

    while let Some(dir) = stack.pop() {
        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(source) => {
                let error = CoreError::Enumeration { path: dir.clone(), source };
                tracing::warn!(%error, "count pass: failed to read directory");
                ok = false;
                continue;
            }
        };

        for entry in entries {
            let entry = match entry {
                Ok(entry) => entry,
                Err(source) => {
                    let error = CoreError::Enumeration { path: dir.clone(), source };
                    tracing::warn!(%error, "count pass: failed to read directory entry");
                    ok = false;
                    continue;
                }
            };

            let file_type = match entry.file_type() {
                Ok(file_type) => file_type,
                Err(source) => {
                    let error = CoreError::Enumeration { path: entry.path(), source };
                    tracing::warn!(%error, "count pass: failed to stat entry");
                    ok = false;
                    continue;
                }
            };

            if file_type.is_dir() {
                stack.push(entry.path());
            } else if file_type.is_file() {
                file_trie.insert(&path_to_bytes(&entry.path()), ());
            }
            // Symlinks (and anything else) are neither followed nor counted.
        }
    }

    ok
}

#[cfg(test)]
mod test {
    use super::*;
    use std::fs::{self, File};
    use tempdir::TempDir;

    #[test]
    fn counts_every_ancestor_of_a_nested_file() {
        let tmp = TempDir::new("count-nested").unwrap();
        let sub = tmp.path().join("a").join("b");
        fs::create_dir_all(&sub).unwrap();
        File::create(sub.join("c.txt")).unwrap();

        let (counts, completed) = build_count_map(&[tmp.path().to_path_buf()]);
        assert!(completed);

        assert_eq!(counts.lookup(&path_to_bytes(&sub)), Some(&1));
        assert_eq!(counts.lookup(&path_to_bytes(&tmp.path().join("a"))), Some(&1));
        assert_eq!(counts.lookup(&path_to_bytes(tmp.path())), Some(&1));
    }

    #[test]
    fn root_file_counts_toward_root() {
        let tmp = TempDir::new("count-root").unwrap();
        File::create(tmp.path().join("x")).unwrap();

        let (counts, _) = build_count_map(&[tmp.path().to_path_buf()]);
        assert_eq!(counts.lookup(&path_to_bytes(tmp.path())), Some(&1));
    }

    #[test]
    fn sibling_files_accumulate() {
        let tmp = TempDir::new("count-siblings").unwrap();
        File::create(tmp.path().join("x")).unwrap();
        File::create(tmp.path().join("y")).unwrap();
        fs::create_dir(tmp.path().join("sub")).unwrap();
        File::create(tmp.path().join("sub").join("z")).unwrap();

        let (counts, _) = build_count_map(&[tmp.path().to_path_buf()]);
        assert_eq!(counts.lookup(&path_to_bytes(tmp.path())), Some(&3));
        assert_eq!(counts.lookup(&path_to_bytes(&tmp.path().join("sub"))), Some(&1));
    }
}
