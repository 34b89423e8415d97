//! Secrets management for RefactorForge.
//!
//! Secrets are resolved through one of four providers, chosen from the
//! process environment at startup:
//!
//! - **Azure Key Vault** when `AZURE_CLIENT_ID`, `MSI_ENDPOINT` or
//!   `IDENTITY_ENDPOINT` is set
//! - **AWS Secrets Manager** when `AWS_REGION` or `AWS_DEFAULT_REGION` is set
//! - **GCP Secret Manager** when a Google project variable is set
//! - **Local environment variables** otherwise, outside production
//!
//! [`SecretsManager`] wraps the provider with a TTL cache and sanitizes
//! every failure into a generic [`SecretsError::SecretRetrieval`]. The
//! [`AppSecrets`] context adds named accessors and startup validation.
//!
//! # Example
//!
//! ```rust,ignore
//! use refactorforge::secrets::{AppSecrets, SecretsManagerConfig};
//!
//! let secrets = AppSecrets::initialize(SecretsManagerConfig::default()).await?;
//! secrets.validate_all_secrets().await?;
//!
//! let token = secrets.get_github_token().await?;
//! client.bearer_auth(token.expose_secret());
//! ```
//!
//! Secret values are never logged. Diagnostics carry the secret name,
//! the provider and a failure category only.

pub mod app;
pub mod cache;
pub mod detector;
pub mod env;
pub mod error;
pub mod manager;
pub mod providers;
pub mod types;

pub use app::{AppSecrets, REQUIRED_SECRETS};
pub use cache::{SecretCache, DEFAULT_CACHE_TTL};
pub use detector::{detect, ProviderKind};
pub use env::AmbientEnv;
pub use error::{FetchFailure, ProviderFetchError, Result, SecretsError};
pub use manager::{SecretsManager, SecretsManagerConfig, DEFAULT_REQUEST_TIMEOUT};
pub use providers::SecretProvider;
pub use types::SecretString;
