//! Registry of files currently open in the presentation layer.
//!
//! One entry per canonical path, holding the live (in-memory) text and
//! the saved baseline. Status is never stored; it is recomputed from
//! the two copies on every query, so it can never go stale or sticky.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use super::line_status::{line_status, DirtyStatus};

#[derive(Debug, Clone)]
struct OpenFileEntry {
    live: String,
    saved: String,
}

/// Tracks live vs. saved content for every open file.
#[derive(Debug, Default)]
pub struct OpenFileRegistry {
    files: HashMap<PathBuf, OpenFileEntry>,
}

impl OpenFileRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `path` as open with `content` as both live and saved
    /// text. Opening an already-open path is a no-op, preserving any
    /// unsaved edits the entry carries.
    pub fn open(&mut self, path: impl Into<PathBuf>, content: impl Into<String>) {
        let path = path.into();
        if self.files.contains_key(&path) {
            return;
        }
        let content = content.into();
        self.files.insert(
            path,
            OpenFileEntry {
                live: content.clone(),
                saved: content,
            },
        );
    }

    pub fn is_open(&self, path: &Path) -> bool {
        self.files.contains_key(path)
    }

    /// Replace the live content of an open file and report the
    /// recomputed status. Unknown paths are ignored (`None`).
    pub fn edit(&mut self, path: &Path, new_content: impl Into<String>) -> Option<DirtyStatus> {
        let entry = self.files.get_mut(path)?;
        entry.live = new_content.into();
        Some(line_status(&entry.saved, &entry.live))
    }

    /// Current status of an open file, recomputed from content.
    pub fn status(&self, path: &Path) -> Option<DirtyStatus> {
        let entry = self.files.get(path)?;
        Some(line_status(&entry.saved, &entry.live))
    }

    /// Commit the saved baseline to the current live content. Call only
    /// after the corresponding disk write succeeded. Returns false for
    /// paths that are not open.
    pub fn mark_saved(&mut self, path: &Path) -> bool {
        match self.files.get_mut(path) {
            Some(entry) => {
                entry.saved = entry.live.clone();
                true
            }
            None => false,
        }
    }

    /// Commit an explicit content as both live and saved text, for
    /// saves where the presentation layer supplies the content written.
    /// No-op for paths that are not open.
    pub fn mark_saved_with(&mut self, path: &Path, content: impl Into<String>) -> bool {
        match self.files.get_mut(path) {
            Some(entry) => {
                entry.live = content.into();
                entry.saved = entry.live.clone();
                true
            }
            None => false,
        }
    }

    /// Remove an entry unconditionally, discarding unsaved changes.
    pub fn close(&mut self, path: &Path) -> bool {
        self.files.remove(path).is_some()
    }

    /// Snapshot of (path, live content) for every non-clean entry.
    pub fn dirty_files(&self) -> Vec<(PathBuf, String)> {
        let mut dirty: Vec<_> = self
            .files
            .iter()
            .filter(|(_, entry)| !line_status(&entry.saved, &entry.live).is_clean())
            .map(|(path, entry)| (path.clone(), entry.live.clone()))
            .collect();
        dirty.sort_by(|a, b| a.0.cmp(&b.0));
        dirty
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}
