//! Tracing subscriber setup.
//!
//! stdout carries the wire protocol, so log output must go elsewhere:
//! stderr by default, or a file when the embedder passes one.

use std::fs::File;
use std::path::Path;
use std::sync::Arc;

use tracing_subscriber::{fmt, EnvFilter};

/// Initialize the global subscriber with RUST_LOG filtering and an
/// INFO default.
pub fn init_global(log_file: Option<&Path>) -> anyhow::Result<()> {
    let env_filter = EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into());

    match log_file {
        Some(path) => {
            let file = File::create(path)?;
            fmt()
                .with_env_filter(env_filter)
                .with_writer(Arc::new(file))
                .with_ansi(false)
                .init();
        }
        None => {
            fmt()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
    Ok(())
}
