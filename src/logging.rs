//! Logging setup.
//!
//! Thin console-only initialization; applications embedding this crate may
//! install their own subscriber instead.

use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

use crate::error::LoggingError;

/// Initialize console logging at `level`, honoring `RUST_LOG` overrides.
pub fn init_console_logging(level: LevelFilter) -> Result<(), LoggingError> {
    let filter = EnvFilter::builder().with_default_directive(level.into()).from_env_lossy();
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init()
        .map_err(|e| LoggingError::SubscriberInit(e.to_string()))
}
