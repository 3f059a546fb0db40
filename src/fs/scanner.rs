//! Recursive directory tree scanner.
//!
//! Produces a full snapshot of a subtree as an ordered `FsNode` tree.
//! Traversal failures never surface to the caller: an unreadable root
//! yields an empty sequence, an unreadable subdirectory yields a
//! directory node with no children, and a file whose metadata cannot be
//! read yields `FileInfo::Unreadable`. Each swallowed failure is logged
//! with its path so the operator can tell an empty directory from an
//! inaccessible one.

use std::future::Future;
use std::path::Path;
use std::pin::Pin;
use std::time::{SystemTime, UNIX_EPOCH};

use tokio::fs;
use tracing::warn;

use super::node::{sort_children, FileInfo, FsNode};

/// Scan a subtree rooted at `root` into an ordered snapshot.
///
/// The root itself is not part of the result; its direct children are
/// the top-level entries, sorted directories-first then by name, as is
/// every nested level. Hidden entries (leading `.`) and entries that
/// are neither regular files nor directories are excluded.
pub async fn scan(root: impl AsRef<Path>) -> Vec<FsNode> {
    let root = root.as_ref();
    let canonical = match fs::canonicalize(root).await {
        Ok(path) => path,
        Err(err) => {
            warn!(path = %root.display(), error = %err, "scan root is not accessible");
            return Vec::new();
        }
    };
    scan_dir(&canonical).await
}

// Async recursion needs an explicitly boxed future.
fn scan_dir(dir: &Path) -> Pin<Box<dyn Future<Output = Vec<FsNode>> + Send + '_>> {
    Box::pin(async move {
        let mut entries = match fs::read_dir(dir).await {
            Ok(entries) => entries,
            Err(err) => {
                warn!(path = %dir.display(), error = %err, "cannot read directory");
                return Vec::new();
            }
        };

        let mut nodes = Vec::new();
        loop {
            let entry = match entries.next_entry().await {
                Ok(Some(entry)) => entry,
                Ok(None) => break,
                Err(err) => {
                    warn!(path = %dir.display(), error = %err, "directory enumeration aborted");
                    break;
                }
            };

            let name = entry.file_name().to_string_lossy().into_owned();
            if name.starts_with('.') {
                continue;
            }
            let path = dir.join(&name);

            let file_type = match entry.file_type().await {
                Ok(file_type) => file_type,
                Err(err) => {
                    warn!(path = %path.display(), error = %err, "cannot determine entry type");
                    continue;
                }
            };

            if file_type.is_dir() {
                let children = scan_dir(&path).await;
                nodes.push(FsNode::directory(name, path, children));
            } else if file_type.is_file() {
                let info = match entry.metadata().await {
                    Ok(meta) => FileInfo::Known {
                        size: meta.len(),
                        modified_ms: epoch_millis(meta.modified().ok()),
                    },
                    Err(err) => {
                        warn!(path = %path.display(), error = %err, "cannot read file metadata");
                        FileInfo::Unreadable
                    }
                };
                nodes.push(FsNode::file(name, path, info));
            }
            // Symlinks, sockets, fifos and the like are not part of the tree.
        }

        sort_children(&mut nodes);
        nodes
    })
}

fn epoch_millis(time: Option<SystemTime>) -> u64 {
    time.and_then(|t| t.duration_since(UNIX_EPOCH).ok())
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
