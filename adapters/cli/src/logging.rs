//! Tracing subscriber installation for the command-line adapter.

use anyhow::{Context, Result};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Installs a global subscriber writing to stderr.
///
/// `RUST_LOG` takes precedence over `default_filter` when it is set.
pub(crate) fn init(default_filter: &str) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_filter))
        .with_context(|| format!("invalid log filter `{default_filter}`"))?;

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false),
        )
        .try_init()
        .context("failed to install tracing subscriber")?;
    Ok(())
}
