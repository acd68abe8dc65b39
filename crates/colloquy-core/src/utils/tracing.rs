use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, fmt};

use crate::error::{Error, Result};

/// Installs the global subscriber. `RUST_LOG` wins over `default_directives`
/// when set. Output goes to stderr so stdout stays free for program output.
pub fn init_tracing(default_directives: &str) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_directives))
        .map_err(|e| Error::Configuration(format!("Invalid log filter: {e}")))?;

    tracing_subscriber::registry()
        .with(
            fmt::Layer::new()
                .with_writer(std::io::stderr)
                .with_span_events(FmtSpan::CLOSE)
                .with_target(true),
        )
        .with(filter)
        .try_init()
        .map_err(|e| Error::Configuration(format!("Failed to install tracing subscriber: {e}")))?;

    tracing::debug!(
        target: "colloquy_core::utils::tracing",
        directives = default_directives,
        "Tracing initialized. Filter configured via RUST_LOG env var."
    );
    Ok(())
}
