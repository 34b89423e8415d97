//! Secrets manager: provider resolution, caching, and sanitized failures.
//!
//! [`SecretsManager`] is the only boundary application code crosses to read
//! secrets. Whatever an adapter reports, callers observe a single
//! [`SecretsError::SecretRetrieval`] with the fixed message
//! "Secret retrieval failed". Logs record the logical name, the provider and
//! the failure category; never the provider detail and never a value.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use super::cache::{SecretCache, DEFAULT_CACHE_TTL};
use super::detector::{self, ProviderKind};
use super::env::AmbientEnv;
use super::error::{ProviderFetchError, Result, SecretsError};
use super::providers::{build_provider, SecretProvider};
use super::types::SecretString;

/// Default upstream-call deadline for provider fetches.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

/// Construction-time configuration for a [`SecretsManager`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecretsManagerConfig {
    /// Explicit provider; detected from the environment when `None`.
    pub provider: Option<ProviderKind>,

    /// Cache TTL in milliseconds (default 300000).
    pub cache_ttl_millis: Option<u64>,

    /// Deadline for each provider call in milliseconds (default 5000).
    pub request_timeout_millis: Option<u64>,
}

impl SecretsManagerConfig {
    pub fn with_provider(mut self, provider: ProviderKind) -> Self {
        self.provider = Some(provider);
        self
    }

    pub fn with_cache_ttl_millis(mut self, millis: u64) -> Self {
        self.cache_ttl_millis = Some(millis);
        self
    }

    pub fn with_request_timeout_millis(mut self, millis: u64) -> Self {
        self.request_timeout_millis = Some(millis);
        self
    }

    pub fn cache_ttl(&self) -> Result<Duration> {
        positive_millis("cache_ttl_millis", self.cache_ttl_millis, DEFAULT_CACHE_TTL)
    }

    pub fn request_timeout(&self) -> Result<Duration> {
        positive_millis("request_timeout_millis", self.request_timeout_millis, DEFAULT_REQUEST_TIMEOUT)
    }
}

fn positive_millis(field: &str, value: Option<u64>, default: Duration) -> Result<Duration> {
    match value {
        None => Ok(default),
        Some(0) => Err(SecretsError::config(format!("{} must be a positive integer", field))),
        Some(ms) => Ok(Duration::from_millis(ms)),
    }
}

/// Cache-backed, provider-abstracted secret access.
#[derive(Debug)]
pub struct SecretsManager {
    provider: Arc<dyn SecretProvider>,
    cache: SecretCache,
    cache_ttl: Duration,
    request_timeout: Duration,
}

impl SecretsManager {
    /// Build a manager, detecting the provider from the process environment
    /// when the config does not name one.
    pub async fn new(config: SecretsManagerConfig) -> Result<Self> {
        Self::from_env(config, &AmbientEnv::from_process()).await
    }

    /// Build a manager against an explicit environment snapshot.
    pub async fn from_env(config: SecretsManagerConfig, env: &AmbientEnv) -> Result<Self> {
        let cache_ttl = config.cache_ttl()?;
        let request_timeout = config.request_timeout()?;

        let kind = match config.provider {
            Some(kind) => kind,
            None => detector::detect(env)?,
        };
        let provider = build_provider(kind, env, request_timeout).await?;

        info!(
            provider = %kind,
            cache_ttl_ms = cache_ttl.as_millis() as u64,
            request_timeout_ms = request_timeout.as_millis() as u64,
            "Initialized secrets manager"
        );

        Ok(Self { provider, cache: SecretCache::new(), cache_ttl, request_timeout })
    }

    /// Build a manager around an existing adapter.
    pub fn with_provider(provider: Arc<dyn SecretProvider>, cache_ttl: Duration) -> Self {
        Self { provider, cache: SecretCache::new(), cache_ttl, request_timeout: DEFAULT_REQUEST_TIMEOUT }
    }

    /// Override the per-call deadline.
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn provider_kind(&self) -> ProviderKind {
        self.provider.kind()
    }

    pub fn cache_ttl(&self) -> Duration {
        self.cache_ttl
    }

    /// Fetch `name` straight from the provider, bypassing the cache.
    pub async fn get_secret(&self, name: &str) -> Result<SecretString> {
        match self.fetch(name).await {
            Ok(value) => {
                debug!(secret = %name, provider = %self.provider_kind(), "Fetched secret from provider");
                Ok(value)
            }
            Err(err) => {
                warn!(
                    secret = %name,
                    provider = %self.provider_kind(),
                    reason = %err.failure(),
                    "Secret retrieval failed"
                );
                Err(SecretsError::retrieval(name))
            }
        }
    }

    /// Serve `name` from the cache, fetching and caching it on a miss.
    ///
    /// Failed fetches are never cached.
    pub async fn get_cached_secret(&self, name: &str) -> Result<SecretString> {
        if let Some(value) = self.cache.get(name).await {
            return Ok(value);
        }

        debug!(secret = %name, "Cache miss, fetching from provider");
        let value = self.get_secret(name).await?;
        self.cache.put(name, value.clone(), self.cache_ttl).await;
        Ok(value)
    }

    /// Fetch `name` fresh and overwrite its cache entry.
    pub async fn refresh_secret(&self, name: &str) -> Result<SecretString> {
        let value = self.get_secret(name).await?;
        self.cache.put(name, value.clone(), self.cache_ttl).await;
        debug!(secret = %name, "Refreshed secret in cache");
        Ok(value)
    }

    /// Drop the cache entry for `name`.
    pub async fn invalidate(&self, name: &str) {
        self.cache.invalidate(name).await;
    }

    /// Empty the cache. Configuration is untouched.
    pub async fn clear_cache(&self) {
        self.cache.clear().await;
        info!("Cleared secrets cache");
    }

    pub async fn cached_count(&self) -> usize {
        self.cache.len().await
    }

    async fn fetch(&self, name: &str) -> std::result::Result<SecretString, ProviderFetchError> {
        match tokio::time::timeout(self.request_timeout, self.provider.fetch_raw(name)).await {
            Ok(result) => result,
            Err(_) => Err(ProviderFetchError::timeout(format!(
                "provider call exceeded {}ms",
                self.request_timeout.as_millis()
            ))),
        }
    }
}
