//! The external "File" record the merger consumes, and the fingerprint
//! folding rule shared by [`crate::directory::Directory`].

use smallvec::SmallVec;
use std::path::Path;

/// Owned digest bytes. Most hash functions in use (BLAKE3, SHA-1, ...) fit
/// in 32 bytes, so a `SmallVec` avoids a heap allocation per digest in the
/// common case.
pub type Digest = SmallVec<[u8; 32]>;

/// A single already-hashed, already-matched file handed to the merger by
/// the caller's upstream deduplication pipeline. The core never opens the
/// file or inspects anything beyond these two accessors.
pub trait MatchedFile {
    /// Absolute path of the file.
    fn path(&self) -> &Path;
    /// Fixed-width digest of the file's content.
    fn digest(&self) -> &[u8];
}

/// A concrete, owned `MatchedFile`, used by tests and by the demo scanner.
#[derive(Debug, Clone)]
pub struct OwnedMatchedFile {
    pub path: std::path::PathBuf,
    pub digest: Digest,
}

impl OwnedMatchedFile {
    pub fn new(path: impl Into<std::path::PathBuf>, digest: impl Into<Digest>) -> Self {
        OwnedMatchedFile { path: path.into(), digest: digest.into() }
    }
}

impl MatchedFile for OwnedMatchedFile {
    fn path(&self) -> &Path {
        &self.path
    }

    fn digest(&self) -> &[u8] {
        &self.digest
    }
}

/// Folds the leading 8 bytes of `digest` into an unsigned little-endian
/// integer, zero-padding short digests on the right. Pinned to
/// little-endian so the fingerprint is reproducible across platforms.
pub fn fingerprint_word(digest: &[u8]) -> u64 {
    let mut buf = [0u8; 8];
    let n = digest.len().min(8);
    buf[..n].copy_from_slice(&digest[..n]);
    u64::from_le_bytes(buf)
}
