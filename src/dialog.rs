//! Folder-selection seam.
//!
//! Native picker dialogs belong to the embedding shell, not to this
//! process; the gateway only needs the answer. `FolderPicker` is the
//! interface the embedder implements. Cancellation is a `None`, never
//! an error.

use async_trait::async_trait;
use std::path::PathBuf;
use tracing::warn;

use crate::ipc::protocol::PickerOptions;

#[async_trait]
pub trait FolderPicker: Send + Sync {
    /// Present an open-folder dialog. `None` when the user cancels.
    async fn pick_folder(&self, options: &PickerOptions) -> Option<PathBuf>;

    /// Present a create-folder (save-style) dialog for a folder that
    /// does not exist yet. `None` when the user cancels.
    async fn pick_new_folder(&self) -> Option<PathBuf>;
}

/// Picker for headless operation: every prompt reports cancellation.
pub struct HeadlessPicker;

#[async_trait]
impl FolderPicker for HeadlessPicker {
    async fn pick_folder(&self, _options: &PickerOptions) -> Option<PathBuf> {
        warn!("folder prompt requested but no picker is wired; reporting cancellation");
        None
    }

    async fn pick_new_folder(&self) -> Option<PathBuf> {
        warn!("create-folder prompt requested but no picker is wired; reporting cancellation");
        None
    }
}
