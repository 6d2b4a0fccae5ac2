//! `duptree`: bottom-up directory aggregation and equality engine for
//! reporting whole-tree duplicates from an already-hashed file stream.
//!
//! The core is [`TreeMerger`]: feed it [`MatchedFile`]s
//! one at a time, then call [`TreeMerger::finish`] to drain a
//! [`ReportSink`] with whole-directory duplicate groups. The core never
//! touches a filesystem beyond the one-time file-count pass in
//! [`TreeMerger::new`]. [`Scanner`] is a worked-example collaborator that
//! walks a real tree and hashes real files to produce that stream; callers
//! with their own scanning/hashing pipeline can skip it entirely and
//! implement [`MatchedFile`] themselves.

mod count;
mod digest;
mod directory;
mod error;
mod hasher;
mod merger;
mod pathkey;
mod report;
mod scanner;
mod session;
mod trie;
mod ui;

pub use crate::digest::{Digest, MatchedFile, OwnedMatchedFile};
pub use crate::error::CoreError;
pub use crate::merger::TreeMerger;
#[cfg(feature = "json")]
pub use crate::report::JsonReportSink;
pub use crate::report::{ReportSink, TextReportSink};
pub use crate::scanner::{ScanListener, Scanner, Stats as ScanStats};
pub use crate::session::Session;
pub use crate::ui::TextListener;
