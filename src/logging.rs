//! Tracing setup. The terminal belongs to the UI, so records only ever go
//! to a file, and only when one was configured.

use std::fs::File;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

/// Installs the global subscriber writing to `log_file_path`.
pub(crate) fn init_global(log_file_path: &Path) -> Result<()> {
    let log_file = File::create(log_file_path)
        .with_context(|| format!("create log file {}", log_file_path.display()))?;
    build_subscriber(log_file)
        .try_init()
        .context("install tracing subscriber")?;
    Ok(())
}

/// RUST_LOG wins when set; otherwise this crate logs at DEBUG.
pub(crate) fn build_subscriber(log_file: File) -> impl tracing::Subscriber + Send + Sync {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("buildcap=debug"));

    let fmt_layer = fmt::layer()
        .with_writer(Arc::new(log_file))
        .with_ansi(false)
        .with_thread_names(true);

    tracing_subscriber::registry().with(fmt_layer).with(env_filter)
}
