//! Wire types for the presentation-layer protocol.
//!
//! Two delivery contracts cross the boundary:
//!
//! - **Request/response**: the caller sends `{"id": n, "method": ...,
//!   "params": ...}` and awaits a correlated `Reply` carrying either a
//!   typed payload or a typed error.
//! - **Fire-and-forget**: `Command`s arrive without an id and are never
//!   acknowledged; `Event`s are pushed from this side at most once,
//!   with no retry.
//!
//! Method and event names match the channel names the renderer listens
//! on, so this file is the single place where the two sides agree.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

use crate::error::HostError;
use crate::fs::FsNode;
use crate::workspace::DirtyStatus;

/// Operations that produce a correlated reply.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "method", content = "params", rename_all = "camelCase")]
pub enum Request {
    ScanDirectory {
        path: String,
    },
    ReadFile {
        path: String,
    },
    WriteFile {
        path: String,
        #[serde(default)]
        content: String,
    },
    SaveFile {
        path: String,
        #[serde(default)]
        content: String,
    },
    SaveAllFiles {
        files: Vec<SaveFileItem>,
    },
    /// Save every open file whose status is not clean, from the
    /// registry's own live content.
    SaveOpenFiles,
    MakeDirectory {
        path: String,
    },
    CheckExists {
        path: String,
    },
    PromptSelectFolder {
        #[serde(default)]
        options: PickerOptions,
    },
    PromptCreateFolder,
    UpdateFile {
        path: String,
        #[serde(default)]
        content: String,
    },
    CloseFile {
        path: String,
    },
    FileStatus {
        path: String,
    },
}

#[derive(Debug, Clone, Deserialize)]
pub struct SaveFileItem {
    pub path: String,
    #[serde(default)]
    pub content: String,
}

/// Options forwarded to the folder-selection dialog.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PickerOptions {
    pub title: Option<String>,
    pub button_label: Option<String>,
    pub default_path: Option<String>,
    /// Skip the eager scan of the selected folder's contents.
    pub skip_contents: bool,
}

/// Fire-and-forget messages from the presentation layer.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "method", content = "params")]
pub enum Command {
    #[serde(rename = "terminal:create")]
    TerminalCreate,
    #[serde(rename = "terminal:write")]
    TerminalWrite { data: String },
    #[serde(rename = "terminal:resize")]
    TerminalResize { cols: u16, rows: u16 },
    #[serde(rename = "terminal:destroy")]
    TerminalDestroy,
}

/// Events pushed to every registered listener, at most once each.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "event", content = "data")]
pub enum Event {
    #[serde(rename = "terminal:ready")]
    TerminalReady,
    #[serde(rename = "terminal:failed")]
    TerminalFailed { message: String },
    #[serde(rename = "terminal:data")]
    TerminalOutput { data: String },
    #[serde(rename = "terminal:exit")]
    TerminalExited,
    #[serde(rename = "menu:new-file")]
    MenuNewFile,
    #[serde(rename = "menu:open-folder")]
    MenuOpenFolder,
    #[serde(rename = "menu:save-file")]
    MenuSaveFile,
    #[serde(rename = "menu:save-all")]
    MenuSaveAll,
    #[serde(rename = "menu:toggle-terminal")]
    MenuToggleTerminal,
}

/// Successful reply payloads. Untagged: the caller knows the shape from
/// the request it sent.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum Response {
    Tree(Vec<FsNode>),
    Text(String),
    Exists(bool),
    SaveAll(BTreeMap<String, SaveOutcome>),
    Folder(Option<FolderSelection>),
    Status(Option<DirtyStatus>),
    Ok(OkMarker),
}

impl Response {
    pub fn ok() -> Self {
        Response::Ok(OkMarker { success: true })
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct OkMarker {
    pub success: bool,
}

/// Per-path outcome of a save-all: one failed write never masks the
/// others.
#[derive(Debug, Clone, Serialize)]
pub struct SaveOutcome {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorBody>,
}

impl SaveOutcome {
    pub fn success() -> Self {
        Self {
            ok: true,
            error: None,
        }
    }

    pub fn failure(err: &HostError) -> Self {
        Self {
            ok: false,
            error: Some(ErrorBody::from(err)),
        }
    }
}

/// A selected folder plus its eagerly scanned contents.
#[derive(Debug, Clone, Serialize)]
pub struct FolderSelection {
    pub path: PathBuf,
    pub contents: Vec<FsNode>,
}

/// Typed failure attached to a reply.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorBody {
    pub kind: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

impl From<&HostError> for ErrorBody {
    fn from(err: &HostError) -> Self {
        Self {
            kind: err.kind().to_string(),
            message: err.to_string(),
            path: err.path().map(|p| p.display().to_string()),
        }
    }
}

/// One line on the outgoing wire for a request/response exchange.
#[derive(Debug, Clone, Serialize)]
pub struct Reply {
    pub id: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ok: Option<Response>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorBody>,
}

impl Reply {
    pub fn ok(id: u64, response: Response) -> Self {
        Self {
            id,
            ok: Some(response),
            error: None,
        }
    }

    pub fn error(id: u64, err: &HostError) -> Self {
        Self {
            id,
            ok: None,
            error: Some(ErrorBody::from(err)),
        }
    }
}
