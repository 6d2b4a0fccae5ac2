//! Settings/session layer: the minimal configuration the merger and the
//! demo scanner are constructed from.

use std::path::PathBuf;

/// Root paths to scan, plus the handful of tunables the demo scanner and
/// binary expose. Constructed once per run.
#[derive(Debug, Clone, Default)]
pub struct Session {
    pub paths: Vec<PathBuf>,
}

impl Session {
    pub fn new(paths: Vec<PathBuf>) -> Self {
        Session { paths }
    }
}
