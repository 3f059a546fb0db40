//! File-level operations behind the request/response surface.
//!
//! Unlike the scanner these do surface failures, classified into the
//! wire taxonomy with the offending path attached.

use std::io;
use std::path::Path;

use tokio::fs;
use tracing::debug;

use crate::error::{HostError, Result};

/// Read a file as UTF-8 text. `NotFound` if the path does not exist.
pub async fn read_file(path: &Path) -> Result<String> {
    let bytes = fs::read(path)
        .await
        .map_err(|err| HostError::from_io(path, err))?;
    let text = String::from_utf8(bytes).map_err(|_| HostError::Io {
        path: path.to_path_buf(),
        source: io::Error::new(io::ErrorKind::InvalidData, "file is not valid UTF-8"),
    })?;
    debug!(path = %path.display(), bytes = text.len(), "read file");
    Ok(text)
}

/// Write `content` to `path`, replacing any existing file.
pub async fn write_file(path: &Path, content: &str) -> Result<()> {
    fs::write(path, content)
        .await
        .map_err(|err| HostError::from_io(path, err))?;
    debug!(path = %path.display(), bytes = content.len(), "wrote file");
    Ok(())
}

/// Create a directory, creating missing parents.
pub async fn make_directory(path: &Path) -> Result<()> {
    fs::create_dir_all(path)
        .await
        .map_err(|err| HostError::from_io(path, err))?;
    debug!(path = %path.display(), "created directory");
    Ok(())
}

/// Whether `path` exists. A missing path is `Ok(false)`; any other
/// access failure propagates.
pub async fn exists(path: &Path) -> Result<bool> {
    match fs::metadata(path).await {
        Ok(_) => Ok(true),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(err) => Err(HostError::from_io(path, err)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn read_missing_file_is_not_found() {
        let temp = TempDir::new().unwrap();
        let err = read_file(&temp.path().join("nope.txt")).await.unwrap_err();
        assert!(matches!(err, HostError::NotFound(_)));
    }

    #[tokio::test]
    async fn write_then_read_round_trips() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("note.md");
        write_file(&path, "hello\nworld").await.unwrap();
        assert_eq!(read_file(&path).await.unwrap(), "hello\nworld");
    }

    #[tokio::test]
    async fn non_utf8_content_is_an_io_error() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("blob.bin");
        std::fs::write(&path, [0xff, 0xfe, 0x00]).unwrap();
        let err = read_file(&path).await.unwrap_err();
        assert_eq!(err.kind(), "IOError");
    }

    #[tokio::test]
    async fn make_directory_creates_missing_parents() {
        let temp = TempDir::new().unwrap();
        let nested = temp.path().join("a/b/c");
        make_directory(&nested).await.unwrap();
        assert!(nested.is_dir());
        // Recreating is fine.
        make_directory(&nested).await.unwrap();
    }

    #[tokio::test]
    async fn exists_maps_not_found_to_false() {
        let temp = TempDir::new().unwrap();
        assert!(!exists(&temp.path().join("ghost")).await.unwrap());
        std::fs::write(temp.path().join("real"), "x").unwrap();
        assert!(exists(&temp.path().join("real")).await.unwrap());
    }
}
