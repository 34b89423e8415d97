//! GCP Secret Manager provider.
//!
//! ## Configuration
//!
//! Environment variables:
//! - `GOOGLE_CLOUD_PROJECT`, `GCP_PROJECT` or `GCLOUD_PROJECT` - Required
//! - `GOOGLE_APPLICATION_CREDENTIALS` - Optional path to a service account key;
//!   without it Application Default Credentials use the metadata server
//!
//! Secrets are read from `projects/{project}/secrets/{name}/versions/latest`
//! and must hold UTF-8 text.
//!
//! Requires the `gcp` cargo feature.

use crate::secrets::detector::GCP_INDICATORS;
use crate::secrets::env::AmbientEnv;
use crate::secrets::error::{Result, SecretsError};

#[cfg(feature = "gcp")]
use super::SecretProvider;
#[cfg(feature = "gcp")]
use crate::secrets::detector::ProviderKind;
#[cfg(any(feature = "gcp", test))]
use crate::secrets::error::ProviderFetchError;
#[cfg(any(feature = "gcp", test))]
use crate::secrets::types::SecretString;
#[cfg(feature = "gcp")]
use async_trait::async_trait;
#[cfg(feature = "gcp")]
use tracing::{debug, info};

#[cfg(feature = "gcp")]
use google_secretmanager1::{hyper_rustls, hyper_util, SecretManager};

/// Configuration for the GCP Secret Manager provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GcpSecretManagerConfig {
    pub project_id: String,
}

impl GcpSecretManagerConfig {
    pub fn from_env(env: &AmbientEnv) -> Result<Self> {
        let project_id = env.first_of(GCP_INDICATORS).ok_or_else(|| {
            SecretsError::config(format!(
                "GCP provider requires one of {}",
                GCP_INDICATORS.join(", ")
            ))
        })?;
        Ok(Self { project_id: project_id.to_string() })
    }

    /// Resource name of the latest version of `name`.
    pub fn resource_name(&self, name: &str) -> String {
        format!("projects/{}/secrets/{}/versions/latest", self.project_id, name)
    }
}

/// Reads secrets from GCP Secret Manager.
#[cfg(feature = "gcp")]
pub struct GcpSecretProvider {
    hub: SecretManager<
        hyper_rustls::HttpsConnector<hyper_util::client::legacy::connect::HttpConnector>,
    >,
    config: GcpSecretManagerConfig,
}

#[cfg(feature = "gcp")]
impl std::fmt::Debug for GcpSecretProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GcpSecretProvider")
            .field("project_id", &self.config.project_id)
            .field("hub", &"[SecretManager]")
            .finish()
    }
}

#[cfg(feature = "gcp")]
impl GcpSecretProvider {
    pub async fn new(config: GcpSecretManagerConfig) -> Result<Self> {
        let client =
            hyper_util::client::legacy::Client::builder(hyper_util::rt::TokioExecutor::new())
                .build(
                    hyper_rustls::HttpsConnectorBuilder::new()
                        .with_native_roots()
                        .map_err(|e| {
                            SecretsError::config(format!("Failed to load native TLS roots: {}", e))
                        })?
                        .https_or_http()
                        .enable_http2()
                        .build(),
                );

        // GOOGLE_APPLICATION_CREDENTIALS first, then the metadata server.
        let opts = yup_oauth2::ApplicationDefaultCredentialsFlowOpts::default();
        let auth = match yup_oauth2::ApplicationDefaultCredentialsAuthenticator::builder(opts).await
        {
            yup_oauth2::authenticator::ApplicationDefaultCredentialsTypes::ServiceAccount(builder) => {
                builder.build().await
            }
            yup_oauth2::authenticator::ApplicationDefaultCredentialsTypes::InstanceMetadata(
                builder,
            ) => builder.build().await,
        }
        .map_err(|e| SecretsError::config(format!("Failed to build GCP authenticator: {}", e)))?;

        let hub = SecretManager::new(client, auth);

        info!(project_id = %config.project_id, "Initialized GCP Secret Manager provider");

        Ok(Self { hub, config })
    }
}

#[cfg(feature = "gcp")]
#[async_trait]
impl SecretProvider for GcpSecretProvider {
    async fn fetch_raw(&self, name: &str) -> std::result::Result<SecretString, ProviderFetchError> {
        let resource_name = self.config.resource_name(name);

        debug!(secret = %name, resource_name = %resource_name, "Fetching secret from GCP Secret Manager");

        let (_, response) = self
            .hub
            .projects()
            .secrets_versions_access(&resource_name)
            .doit()
            .await
            .map_err(|e| classify_api_error(e.to_string()))?;

        decode_payload(response.payload.and_then(|payload| payload.data))
    }

    fn kind(&self) -> ProviderKind {
        ProviderKind::Gcp
    }
}

/// Classify a Secret Manager API error by its rendered status.
#[cfg(any(feature = "gcp", test))]
fn classify_api_error(detail: String) -> ProviderFetchError {
    if detail.contains("NOT_FOUND") || detail.contains("404") {
        ProviderFetchError::not_found(detail)
    } else if detail.contains("PERMISSION_DENIED") || detail.contains("403") {
        ProviderFetchError::access_denied(detail)
    } else {
        ProviderFetchError::unavailable(detail)
    }
}

/// Secret payloads must be non-empty UTF-8.
#[cfg(any(feature = "gcp", test))]
fn decode_payload(data: Option<Vec<u8>>) -> std::result::Result<SecretString, ProviderFetchError> {
    let data = data
        .filter(|data| !data.is_empty())
        .ok_or_else(|| ProviderFetchError::invalid_payload("secret version has no payload"))?;

    String::from_utf8(data)
        .map(SecretString::new)
        .map_err(|_| ProviderFetchError::invalid_payload("secret payload is not valid UTF-8"))
}

/// Stub for builds without the `gcp` feature. Construction always fails.
#[cfg(not(feature = "gcp"))]
#[derive(Debug)]
pub struct GcpSecretProvider {
    _private: (),
}

#[cfg(not(feature = "gcp"))]
impl GcpSecretProvider {
    pub async fn new(_config: GcpSecretManagerConfig) -> Result<Self> {
        Err(SecretsError::config(
            "GCP provider support is not compiled in; rebuild with the `gcp` feature",
        ))
    }
}

#[cfg(not(feature = "gcp"))]
#[async_trait::async_trait]
impl super::SecretProvider for GcpSecretProvider {
    async fn fetch_raw(
        &self,
        _name: &str,
    ) -> std::result::Result<crate::secrets::SecretString, crate::secrets::ProviderFetchError> {
        Err(crate::secrets::ProviderFetchError::unavailable("gcp feature disabled"))
    }

    fn kind(&self) -> crate::secrets::ProviderKind {
        crate::secrets::ProviderKind::Gcp
    }
}
