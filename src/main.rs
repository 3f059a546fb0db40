use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;

use atelier_host::dialog::HeadlessPicker;
use atelier_host::ipc::{serve, Gateway};
use atelier_host::logging;
use atelier_host::terminal::{TerminalSettings, DEFAULT_COLS, DEFAULT_ROWS};

/// Privileged backend for the Atelier code-editing shell.
///
/// Speaks newline-delimited JSON on stdin/stdout; the presentation
/// layer owns the other end of the pipe. Logs go to stderr unless
/// `--log-file` redirects them.
#[derive(Debug, Parser)]
#[command(name = "atelier-host", version, about)]
struct Args {
    /// Write logs to this file instead of stderr.
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Shell binary for terminal sessions (default: $SHELL, or the
    /// platform default).
    #[arg(long)]
    shell: Option<String>,

    /// Initial terminal width in columns.
    #[arg(long, default_value_t = DEFAULT_COLS)]
    cols: u16,

    /// Initial terminal height in rows.
    #[arg(long, default_value_t = DEFAULT_ROWS)]
    rows: u16,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    logging::init_global(args.log_file.as_deref()).context("failed to initialize logging")?;

    let settings = TerminalSettings {
        shell: args.shell,
        cols: args.cols,
        rows: args.rows,
    };
    let gateway = Arc::new(Gateway::new(settings, Arc::new(HeadlessPicker)));

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "atelier-host started");

    let result = serve(Arc::clone(&gateway), tokio::io::stdin(), tokio::io::stdout()).await;

    // The presentation layer is gone; take the shell session down too.
    gateway.shutdown();
    result.context("protocol loop failed")?;
    Ok(())
}
