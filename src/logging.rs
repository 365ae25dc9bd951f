//! Tracing setup.

use anyhow::{Context, Result};
use std::fs;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Where log output goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogTarget {
    /// Text/JSON modes: stderr, next to the progress lines
    Stderr,
    /// TUI mode: a file, so logging never tears the alternate screen
    File,
}

pub fn log_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("busy-indicator")
        .join("logs")
}

/// Install the global subscriber. `RUST_LOG` directives are honored on top of the
/// base level.
pub fn init(verbose: bool, target: LogTarget) -> Result<()> {
    let level = if verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    let filter = EnvFilter::from_default_env().add_directive(level.into());

    match target {
        LogTarget::Stderr => {
            tracing_subscriber::fmt()
                .with_writer(std::io::stderr)
                .with_env_filter(filter)
                .init();
        }
        LogTarget::File => {
            let dir = log_dir();
            fs::create_dir_all(&dir).context("Failed to create log directory")?;
            let log_file =
                fs::File::create(dir.join("busy-indicator.log")).context("Failed to create log file")?;
            tracing_subscriber::fmt()
                .with_writer(log_file)
                .with_ansi(false)
                .with_env_filter(filter)
                .init();
        }
    }

    tracing::info!("Logging initialized (verbose: {}, target: {:?})", verbose, target);
    Ok(())
}
