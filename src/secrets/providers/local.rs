//! Environment variable provider for local development.
//!
//! Secrets are read from the process environment by their exact name:
//!
//! ```bash
//! export GITHUB_TOKEN="ghp_..."
//! export JWT_SECRET="..."
//! ```
//!
//! The variable is read at call time, so changes to the environment are seen
//! on the next uncached fetch. Production never resolves to this provider
//! through detection.

use async_trait::async_trait;
use std::env;

use super::SecretProvider;
use crate::secrets::detector::ProviderKind;
use crate::secrets::error::ProviderFetchError;
use crate::secrets::types::SecretString;

/// Reads secrets from process environment variables.
#[derive(Debug, Clone, Default)]
pub struct LocalEnvProvider {}

impl LocalEnvProvider {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SecretProvider for LocalEnvProvider {
    async fn fetch_raw(&self, name: &str) -> Result<SecretString, ProviderFetchError> {
        match env::var(name) {
            Ok(value) if !value.is_empty() => Ok(SecretString::new(value)),
            Ok(_) => Err(ProviderFetchError::not_found(format!(
                "environment variable {} is empty",
                name
            ))),
            Err(env::VarError::NotPresent) => Err(ProviderFetchError::not_found(format!(
                "environment variable {} is not set",
                name
            ))),
            Err(env::VarError::NotUnicode(_)) => Err(ProviderFetchError::invalid_payload(
                format!("environment variable {} is not valid unicode", name),
            )),
        }
    }

    fn kind(&self) -> ProviderKind {
        ProviderKind::Local
    }
}
