// Host library - exposes all core modules for testing

pub mod dialog;
pub mod error;
pub mod fs;
pub mod ipc;
pub mod logging;
pub mod terminal;
pub mod workspace;
