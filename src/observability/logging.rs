//! # Structured Logging
//!
//! Installs the global `tracing` subscriber. `RUST_LOG` overrides the
//! configured level when set.

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::config::{AppConfig, ObservabilityConfig};
use crate::errors::{Error, Result};

/// Install the global subscriber.
///
/// Returns `Ok(false)` when a subscriber was already installed (tests,
/// embedding binaries), which is not an error.
pub fn init_logging(config: &ObservabilityConfig) -> Result<bool> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(&config.log_level).map_err(|e| {
            Error::config(format!("Invalid log level '{}': {}", config.log_level, e))
        })?,
    };

    let registry = tracing_subscriber::registry().with(filter);
    let installed = if config.json_logging {
        registry.with(fmt::layer().json().with_current_span(true)).try_init().is_ok()
    } else {
        registry.with(fmt::layer().with_target(true)).try_init().is_ok()
    };

    Ok(installed)
}

/// Log configuration at startup
pub fn log_config_info(config: &AppConfig) {
    tracing::info!(
        server_address = %config.server.bind_address(),
        environment = %config.environment,
        secrets_provider = ?config.secrets.provider.map(|p| p.as_str()),
        log_level = %config.observability.log_level,
        json_logging = config.observability.json_logging,
        "RefactorForge backend configuration"
    );
}
