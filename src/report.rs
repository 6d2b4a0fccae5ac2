//! Where the extractor sends finished duplicate-directory groups.
//! `TreeMerger::finish` is generic over this trait so callers can plug in
//! their own sink; the crate ships a line-oriented text sink and, behind
//! the `json` feature, a `serde_json`-backed one.

use std::io::Write;
use std::path::{Path, PathBuf};

/// Receives one duplicate-directory group at a time, member by member.
///
/// `begin_group`/`end_group` bracket each group; `member` is called once
/// per directory in the group, shallowest first. A sink never sees a
/// singleton "group" — the extractor only calls `begin_group` once it has
/// at least two surviving members.
pub trait ReportSink {
    fn begin_group(&mut self);
    fn member(&mut self, fingerprint: u64, path: &Path);
    fn end_group(&mut self);
}

/// Emits the `<hex_fingerprint> <directory_path>` / `--` line format.
pub struct TextReportSink<W> {
    out: W,
}

impl<W: Write> TextReportSink<W> {
    pub fn new(out: W) -> Self {
        TextReportSink { out }
    }
}

impl<W: Write> ReportSink for TextReportSink<W> {
    fn begin_group(&mut self) {}

    fn member(&mut self, fingerprint: u64, path: &Path) {
        if let Err(err) = writeln!(self.out, "{:016x} {}", fingerprint, path.display()) {
            tracing::error!(%err, "failed to write report line");
        }
    }

    fn end_group(&mut self) {
        if let Err(err) = writeln!(self.out, "--") {
            tracing::error!(%err, "failed to write report terminator");
        }
    }
}

/// Accumulates every group in memory and serializes the whole run once.
#[cfg(feature = "json")]
pub struct JsonReportSink {
    groups: Vec<JsonGroup>,
    current: Option<JsonGroup>,
}

#[cfg(feature = "json")]
#[derive(serde_derive::Serialize)]
struct JsonGroup {
    members: Vec<JsonMember>,
}

#[cfg(feature = "json")]
#[derive(serde_derive::Serialize)]
struct JsonMember {
    fingerprint: String,
    path: PathBuf,
}

#[cfg(feature = "json")]
impl JsonReportSink {
    pub fn new() -> Self {
        JsonReportSink { groups: Vec::new(), current: None }
    }

    /// Serializes every group collected so far. Call once `finish` returns.
    pub fn to_json_string(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(&self.groups)
    }
}

#[cfg(feature = "json")]
impl Default for JsonReportSink {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(feature = "json")]
impl ReportSink for JsonReportSink {
    fn begin_group(&mut self) {
        self.current = Some(JsonGroup { members: Vec::new() });
    }

    fn member(&mut self, fingerprint: u64, path: &Path) {
        if let Some(group) = &mut self.current {
            group.members.push(JsonMember { fingerprint: format!("{:016x}", fingerprint), path: path.to_path_buf() });
        }
    }

    fn end_group(&mut self) {
        if let Some(group) = self.current.take() {
            self.groups.push(group);
        }
    }
}
