//! Filesystem layer: the tree snapshot scanner and file-level operations.

pub mod node;
pub mod ops;
pub mod scanner;

pub use node::{sort_children, FileInfo, FsNode, NodeKind};
pub use scanner::scan;
