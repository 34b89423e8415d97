//! # Configuration Settings
//!
//! Defines the configuration structure for the RefactorForge backend.
//!
//! | Variable | Default |
//! |---|---|
//! | `REFACTORFORGE_HOST` | `0.0.0.0` |
//! | `REFACTORFORGE_PORT` | `8001` |
//! | `REFACTORFORGE_LOG_LEVEL` | `info` |
//! | `REFACTORFORGE_LOG_JSON` | `false` |
//! | `REFACTORFORGE_ENV` | `development` |
//! | `REFACTORFORGE_SECRETS_PROVIDER` | detected |
//! | `REFACTORFORGE_SECRETS_CACHE_TTL_MS` | `300000` |
//! | `REFACTORFORGE_SECRETS_TIMEOUT_MS` | `5000` |

use serde::{Deserialize, Serialize};
use std::str::FromStr;
use validator::Validate;

use super::Environment;
use crate::errors::{Error, Result};
use crate::secrets::{AmbientEnv, ProviderKind, SecretsError, SecretsManagerConfig};

pub const HOST_VAR: &str = "REFACTORFORGE_HOST";
pub const PORT_VAR: &str = "REFACTORFORGE_PORT";
pub const LOG_LEVEL_VAR: &str = "REFACTORFORGE_LOG_LEVEL";
pub const LOG_JSON_VAR: &str = "REFACTORFORGE_LOG_JSON";
pub const SECRETS_PROVIDER_VAR: &str = "REFACTORFORGE_SECRETS_PROVIDER";
pub const SECRETS_CACHE_TTL_VAR: &str = "REFACTORFORGE_SECRETS_CACHE_TTL_MS";
pub const SECRETS_TIMEOUT_VAR: &str = "REFACTORFORGE_SECRETS_TIMEOUT_MS";

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize, Validate, Default)]
pub struct AppConfig {
    /// Server configuration
    #[validate(nested)]
    pub server: ServerConfig,

    /// Observability configuration
    #[validate(nested)]
    pub observability: ObservabilityConfig,

    /// Secrets manager configuration
    pub secrets: SecretsManagerConfig,

    /// Running mode
    pub environment: Environment,
}

impl AppConfig {
    /// Build configuration from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_ambient(&AmbientEnv::from_process())
    }

    /// Build configuration from an environment snapshot and validate it.
    pub fn from_ambient(env: &AmbientEnv) -> Result<Self> {
        let defaults = ServerConfig::default();
        let server = ServerConfig {
            host: env.get(HOST_VAR).map(str::to_string).unwrap_or(defaults.host),
            port: parse_var(env, PORT_VAR)?.unwrap_or(defaults.port),
        };

        let defaults = ObservabilityConfig::default();
        let observability = ObservabilityConfig {
            log_level: env.get(LOG_LEVEL_VAR).map(str::to_string).unwrap_or(defaults.log_level),
            json_logging: env.get(LOG_JSON_VAR).map(parse_flag).unwrap_or(defaults.json_logging),
            service_name: defaults.service_name,
        };

        let secrets = SecretsManagerConfig {
            provider: parse_var::<ProviderKind>(env, SECRETS_PROVIDER_VAR)?,
            cache_ttl_millis: parse_var(env, SECRETS_CACHE_TTL_VAR)?,
            request_timeout_millis: parse_var(env, SECRETS_TIMEOUT_VAR)?,
        };

        let environment = env.running_mode().map_err(|err| match err {
            SecretsError::Config { message } => Error::config(message),
            other => other.into(),
        })?;

        let config = Self { server, observability, secrets, environment };
        config.validate()?;
        Ok(config)
    }

    /// Validate the entire configuration
    pub fn validate(&self) -> Result<()> {
        Validate::validate(self).map_err(Error::from)?;

        // Zero durations are rejected by the secrets layer itself.
        self.secrets.cache_ttl()?;
        self.secrets.request_timeout()?;

        Ok(())
    }
}

fn parse_var<T>(env: &AmbientEnv, key: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    env.get(key)
        .map(|raw| raw.trim().parse::<T>().map_err(|e| Error::config(format!("Invalid {}: {}", key, e))))
        .transpose()
}

fn parse_flag(raw: &str) -> bool {
    let raw = raw.trim();
    raw.eq_ignore_ascii_case("true") || raw == "1"
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ServerConfig {
    /// Server bind address
    #[validate(length(min = 1, message = "Host cannot be empty"))]
    pub host: String,

    /// Server port
    #[validate(range(min = 1, message = "Port must be between 1 and 65535"))]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { host: "0.0.0.0".to_string(), port: 8001 }
    }
}

impl ServerConfig {
    /// Get the server bind address
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ObservabilityConfig {
    /// Service name reported by health endpoints
    #[validate(length(min = 1, message = "Service name cannot be empty"))]
    pub service_name: String,

    /// Log level (trace, debug, info, warn, error)
    #[validate(length(min = 1, message = "Log level cannot be empty"))]
    pub log_level: String,

    /// Enable JSON structured logging
    pub json_logging: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            service_name: "refactorforge".to_string(),
            log_level: "info".to_string(),
            json_logging: false,
        }
    }
}
