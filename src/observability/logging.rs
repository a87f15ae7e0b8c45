//! Structured logging.
//!
//! `RUST_LOG` wins when set; otherwise the configured level applies to the
//! service and chatty dependencies are held at `warn`.

use tracing::Level;
use tracing_subscriber::{fmt, prelude::*, registry, EnvFilter};

use crate::config::LogFormat;

pub fn init(level: Level, format: LogFormat) -> anyhow::Result<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_directives(level)))?;

    let formatting_layer = match format {
        LogFormat::Json => fmt::layer()
            .json()
            .flatten_event(true)
            .with_current_span(false)
            .boxed(),
        LogFormat::Pretty => fmt::layer().pretty().boxed(),
        LogFormat::Compact => fmt::layer().compact().with_target(false).boxed(),
    };

    registry()
        .with(env_filter)
        .with(formatting_layer)
        .try_init()
        .map_err(|e| anyhow::anyhow!("failed to initialize logging: {e}"))
}

fn default_directives(level: Level) -> String {
    let level = level.as_str().to_ascii_lowercase();
    format!("{level},sqlx=warn,hyper=warn,tower_http=warn")
}
