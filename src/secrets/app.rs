//! Application secrets context.
//!
//! [`AppSecrets`] is built once during bootstrap and handed to every
//! collaborator that needs secret access (route handlers, webhook
//! verification, token signing). Cloning is cheap; all clones share one
//! [`SecretsManager`] and its cache.

use std::sync::Arc;
use tracing::{error, info};

use super::error::{Result, SecretsError};
use super::manager::{SecretsManager, SecretsManagerConfig};
use super::types::SecretString;

pub const JWT_SECRET: &str = "JWT_SECRET";
pub const SESSION_SECRET: &str = "SESSION_SECRET";
pub const GITHUB_TOKEN: &str = "GITHUB_TOKEN";
pub const GITHUB_WEBHOOK_SECRET: &str = "GITHUB_WEBHOOK_SECRET";

/// Secrets that must resolve before the service accepts traffic.
pub const REQUIRED_SECRETS: &[&str] = &[JWT_SECRET, SESSION_SECRET, GITHUB_WEBHOOK_SECRET];

#[derive(Debug, Clone)]
pub struct AppSecrets {
    manager: Arc<SecretsManager>,
    required: Arc<[String]>,
}

impl AppSecrets {
    /// Build the context with a fresh [`SecretsManager`].
    pub async fn initialize(config: SecretsManagerConfig) -> Result<Self> {
        let manager = SecretsManager::new(config).await?;
        Ok(Self::from_manager(manager))
    }

    /// Wrap an existing manager.
    pub fn from_manager(manager: SecretsManager) -> Self {
        Self {
            manager: Arc::new(manager),
            required: REQUIRED_SECRETS.iter().map(|s| s.to_string()).collect(),
        }
    }

    /// Replace the required set checked by [`validate_all_secrets`](Self::validate_all_secrets).
    pub fn with_required_secrets<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.required = names.into_iter().map(Into::into).collect();
        self
    }

    /// Swap in a newly built manager. Nothing from the old one is kept,
    /// and existing clones of this context keep the old manager.
    pub async fn reinitialize(&mut self, config: SecretsManagerConfig) -> Result<()> {
        let manager = SecretsManager::new(config).await?;
        self.manager = Arc::new(manager);
        info!(provider = %self.manager.provider_kind(), "Reinitialized application secrets");
        Ok(())
    }

    pub fn manager(&self) -> &SecretsManager {
        &self.manager
    }

    pub fn required_secrets(&self) -> &[String] {
        &self.required
    }

    pub async fn get_github_token(&self) -> Result<SecretString> {
        self.manager.get_cached_secret(GITHUB_TOKEN).await
    }

    pub async fn get_jwt_secret(&self) -> Result<SecretString> {
        self.manager.get_cached_secret(JWT_SECRET).await
    }

    pub async fn get_session_secret(&self) -> Result<SecretString> {
        self.manager.get_cached_secret(SESSION_SECRET).await
    }

    pub async fn get_github_webhook_secret(&self) -> Result<SecretString> {
        self.manager.get_cached_secret(GITHUB_WEBHOOK_SECRET).await
    }

    /// Check that every required secret resolves.
    ///
    /// Every name is attempted; the error lists all that failed, by name.
    pub async fn validate_all_secrets(&self) -> Result<()> {
        let mut missing = Vec::new();
        for name in self.required.iter() {
            if self.manager.get_secret(name).await.is_err() {
                missing.push(name.clone());
            }
        }

        if missing.is_empty() {
            info!(count = self.required.len(), "All required secrets resolved");
            Ok(())
        } else {
            error!(missing = ?missing, "Required secrets could not be resolved");
            Err(SecretsError::MissingSecrets { names: missing })
        }
    }
}
