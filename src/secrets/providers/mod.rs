//! Provider adapters.
//!
//! Each [`ProviderKind`] has one adapter implementing [`SecretProvider`].
//! Adapters fetch raw values and classify failures; they never cache and
//! never decide what a caller is allowed to see. That is the manager's job.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

use super::detector::ProviderKind;
use super::env::AmbientEnv;
use super::error::{ProviderFetchError, Result};
use super::types::SecretString;

pub mod aws;
pub mod azure;
pub mod gcp;
pub mod local;

pub use aws::AwsSecretProvider;
pub use azure::{AzureKeyVaultConfig, AzureKeyVaultProvider, AzureTokenSource};
pub use gcp::{GcpSecretManagerConfig, GcpSecretProvider};
pub use local::LocalEnvProvider;

/// Fetches a raw secret value from one source system.
#[async_trait]
pub trait SecretProvider: Send + Sync + std::fmt::Debug {
    /// Fetch the current value of `name`.
    ///
    /// Unresolvable names, denied access, unreachable upstreams and
    /// timeouts all surface as [`ProviderFetchError`].
    async fn fetch_raw(&self, name: &str) -> std::result::Result<SecretString, ProviderFetchError>;

    /// Which provider this adapter talks to.
    fn kind(&self) -> ProviderKind;
}

/// Build the adapter for `kind`.
///
/// `timeout` is passed to adapters whose clients take an upstream-call
/// deadline of their own.
pub async fn build_provider(
    kind: ProviderKind,
    env: &AmbientEnv,
    timeout: Duration,
) -> Result<Arc<dyn SecretProvider>> {
    let provider: Arc<dyn SecretProvider> = match kind {
        ProviderKind::Local => Arc::new(LocalEnvProvider::new()),
        ProviderKind::Azure => {
            Arc::new(AzureKeyVaultProvider::new(AzureKeyVaultConfig::from_env(env)?, timeout)?)
        }
        ProviderKind::Aws => Arc::new(AwsSecretProvider::from_env(env, timeout).await?),
        ProviderKind::Gcp => {
            Arc::new(GcpSecretProvider::new(GcpSecretManagerConfig::from_env(env)?).await?)
        }
    };
    Ok(provider)
}
