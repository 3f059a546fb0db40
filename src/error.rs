//! Error taxonomy for everything that crosses the IPC boundary.
//!
//! The presentation layer distinguishes failures by a small set of wire
//! kinds; everything the gateway returns is classified here. User
//! cancellation of a dialog is not an error and never appears in this
//! enum (it is modeled as a null result).

use std::io;
use std::path::{Path, PathBuf};

/// A failure reported to the presentation layer.
#[derive(Debug, thiserror::Error)]
pub enum HostError {
    #[error("path does not exist: {}", .0.display())]
    NotFound(PathBuf),

    #[error("permission denied: {}", .0.display())]
    PermissionDenied(PathBuf),

    #[error("i/o failure on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to start shell process: {0}")]
    ProcessSpawn(String),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

impl HostError {
    /// Classify an `io::Error` for a specific path.
    pub fn from_io(path: impl Into<PathBuf>, err: io::Error) -> Self {
        let path = path.into();
        match err.kind() {
            io::ErrorKind::NotFound => HostError::NotFound(path),
            io::ErrorKind::PermissionDenied => HostError::PermissionDenied(path),
            _ => HostError::Io { path, source: err },
        }
    }

    /// Wire-level discriminator understood by the presentation layer.
    pub fn kind(&self) -> &'static str {
        match self {
            HostError::NotFound(_) => "NotFound",
            HostError::PermissionDenied(_) => "PermissionDenied",
            HostError::Io { .. } => "IOError",
            HostError::ProcessSpawn(_) => "ProcessSpawnError",
            HostError::InvalidArgument(_) => "InvalidArgument",
        }
    }

    /// The offending path, when the failure is about one.
    pub fn path(&self) -> Option<&Path> {
        match self {
            HostError::NotFound(p) | HostError::PermissionDenied(p) => Some(p),
            HostError::Io { path, .. } => Some(path),
            HostError::ProcessSpawn(_) | HostError::InvalidArgument(_) => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, HostError>;
