//! # RefactorForge
//!
//! Backend core for RefactorForge. Secrets such as the GitHub API token and
//! session keys are resolved from Azure Key Vault, AWS Secrets Manager, GCP
//! Secret Manager or local environment variables, depending on where the
//! process runs.
//!
//! ## Architecture
//!
//! ```text
//! REST API (health) → AppSecrets → SecretsManager → SecretProvider
//!                                       ↓
//!                                  SecretCache (TTL)
//! ```
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use refactorforge::{config::AppConfig, startup, Result};
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let config = AppConfig::from_env()?;
//!     let secrets = startup::initialize_secrets(&config).await?;
//!     let token = secrets.get_github_token().await?;
//!     assert!(!token.is_empty());
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod config;
pub mod errors;
pub mod observability;
pub mod secrets;
pub mod startup;

// Re-export commonly used types and traits
pub use config::{AppConfig, Environment};
pub use errors::{Error, Result};
pub use secrets::{AppSecrets, SecretString, SecretsError, SecretsManager};

/// Application version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name from Cargo.toml
pub const APP_NAME: &str = env!("CARGO_PKG_NAME");
