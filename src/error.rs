use std::path::PathBuf;
use thiserror::Error;

/// Errors the tree-merger core and its demo collaborators can produce.
#[derive(Debug, Error)]
pub enum CoreError {
    /// The one-time file-count pass failed to read part of the tree.
    /// Non-fatal: the merger stays usable, it will just under-count the
    /// affected directories.
    #[error("failed to enumerate files under {path}: {source}")]
    Enumeration {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// `feed` was called with a file that violates the merger's
    /// preconditions (relative path, empty digest, path with no parent).
    #[error("invalid file fed to merger: {reason}")]
    InvalidFile { reason: &'static str },

    /// A failure in the demo scanner's own filesystem walk or hashing.
    #[error("scan error at {path}: {source}")]
    Scan {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
