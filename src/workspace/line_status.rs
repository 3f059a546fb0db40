//! Dirty-status classification for open files.
//!
//! This is deliberately a line-count heuristic, not a diff: the
//! presentation layer's file tree only needs a coarse "has unsaved
//! changes, roughly how" marker, and the classification below is the
//! contract it renders. Callers must not replace it with a real line
//! diff without revising the protocol contract.

use serde::{Serialize, Serializer};

/// How the live content of an open file relates to its saved baseline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirtyStatus {
    Clean,
    /// Live content has more lines than the baseline.
    Added,
    /// Live content has fewer lines than the baseline.
    Deleted,
    /// Same line count, at least one line differs.
    Modified,
}

impl DirtyStatus {
    pub fn is_clean(self) -> bool {
        self == DirtyStatus::Clean
    }
}

// The wire encodes Clean as null and the rest as lowercase strings,
// matching what the file tree renderer expects.
impl Serialize for DirtyStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            DirtyStatus::Clean => serializer.serialize_unit(),
            DirtyStatus::Added => serializer.serialize_str("added"),
            DirtyStatus::Deleted => serializer.serialize_str("deleted"),
            DirtyStatus::Modified => serializer.serialize_str("modified"),
        }
    }
}

/// Classify `live` against `saved`.
///
/// Split both on `'\n'`; a smaller line count is `Deleted`, a larger
/// one `Added`, and on equal counts any differing line is `Modified`.
pub fn line_status(saved: &str, live: &str) -> DirtyStatus {
    let saved_lines: Vec<&str> = saved.split('\n').collect();
    let live_lines: Vec<&str> = live.split('\n').collect();

    if live_lines.len() < saved_lines.len() {
        DirtyStatus::Deleted
    } else if live_lines.len() > saved_lines.len() {
        DirtyStatus::Added
    } else if saved_lines
        .iter()
        .zip(&live_lines)
        .any(|(saved, live)| saved != live)
    {
        DirtyStatus::Modified
    } else {
        DirtyStatus::Clean
    }
}
