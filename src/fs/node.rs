//! Tree snapshot model produced by the scanner.
//!
//! A scan yields an immutable `FsNode` tree: nodes are constructed once,
//! never mutated, and superseded wholesale by the next scan. File
//! metadata is a tagged variant rather than an error flag so callers
//! must handle the unreadable case explicitly.

use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;
use std::cmp::Ordering;
use std::path::PathBuf;

/// A file or directory at a point in time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FsNode {
    /// Final path segment.
    pub name: String,
    /// Absolute path, canonicalized at the scan root.
    pub path: PathBuf,
    pub kind: NodeKind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    /// Ordered children: directories first, then lexicographic by name.
    Directory { children: Vec<FsNode> },
    File(FileInfo),
}

/// Per-file metadata, or the explicit absence of it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileInfo {
    Known {
        size: u64,
        /// Modification time, UNIX-epoch milliseconds.
        modified_ms: u64,
    },
    /// Metadata could not be read; the entry still appears in the tree.
    Unreadable,
}

impl FsNode {
    pub fn file(name: impl Into<String>, path: impl Into<PathBuf>, info: FileInfo) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            kind: NodeKind::File(info),
        }
    }

    pub fn directory(
        name: impl Into<String>,
        path: impl Into<PathBuf>,
        children: Vec<FsNode>,
    ) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            kind: NodeKind::Directory { children },
        }
    }

    pub fn is_dir(&self) -> bool {
        matches!(self.kind, NodeKind::Directory { .. })
    }

    pub fn is_file(&self) -> bool {
        matches!(self.kind, NodeKind::File(_))
    }

    pub fn children(&self) -> &[FsNode] {
        match &self.kind {
            NodeKind::Directory { children } => children,
            NodeKind::File(_) => &[],
        }
    }
}

/// Sort siblings into presentation order: directories before files,
/// lexicographic by name within each group.
pub fn sort_children(nodes: &mut [FsNode]) {
    nodes.sort_by(tree_order);
}

fn tree_order(a: &FsNode, b: &FsNode) -> Ordering {
    match (a.is_dir(), b.is_dir()) {
        (true, false) => Ordering::Less,
        (false, true) => Ordering::Greater,
        _ => a.name.cmp(&b.name),
    }
}

// Wire shape expected by the presentation layer:
// {name, path, type, size?, modified?, children?, error?}.
// Unreadable files keep size/modified at 0 alongside the error marker.
impl Serialize for FsNode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry("name", &self.name)?;
        map.serialize_entry("path", &self.path)?;
        match &self.kind {
            NodeKind::Directory { children } => {
                map.serialize_entry("type", "directory")?;
                map.serialize_entry("children", children)?;
            }
            NodeKind::File(FileInfo::Known { size, modified_ms }) => {
                map.serialize_entry("type", "file")?;
                map.serialize_entry("size", size)?;
                map.serialize_entry("modified", modified_ms)?;
            }
            NodeKind::File(FileInfo::Unreadable) => {
                map.serialize_entry("type", "file")?;
                map.serialize_entry("size", &0u64)?;
                map.serialize_entry("modified", &0u64)?;
                map.serialize_entry("error", "could not read file metadata")?;
            }
        }
        map.end()
    }
}
