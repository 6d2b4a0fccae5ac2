//! Text progress listener for the demo scanner: periodic console updates
//! while walking, and a one-line summary once the walk finishes.
//! Duplicate-directory results themselves go through a
//! [`crate::report::ReportSink`], not this type.

use crate::scanner::{ScanListener, Stats};
use std::path::Path;
use std::time::{Duration, Instant};

#[derive(Debug)]
pub struct TextListener {
    start_time: Instant,
    next_update: u64,
}

impl TextListener {
    pub fn new() -> Self {
        TextListener { start_time: Instant::now(), next_update: 0 }
    }
}

impl Default for TextListener {
    fn default() -> Self {
        Self::new()
    }
}

impl ScanListener for TextListener {
    fn file_scanned(&mut self, path: &Path, stats: &Stats) {
        let elapsed = self.start_time.elapsed().as_secs();
        if elapsed > self.next_update {
            self.next_update = elapsed + 1;
            eprintln!("{} hashed, {} skipped. {}/…", stats.added, stats.skipped, path.parent().unwrap_or(path).display());
        }
    }

    fn scan_over(&self, stats: &Stats, scan_duration: Duration) {
        eprintln!(
            "Scanned {} files ({} skipped) in {:.1}s.",
            stats.added,
            stats.skipped,
            scan_duration.as_secs_f64()
        );
    }
}
