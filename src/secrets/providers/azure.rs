//! Azure Key Vault provider using managed identity.
//!
//! ## Configuration
//!
//! Environment variables:
//! - `AZURE_KEY_VAULT_URL` (e.g. `https://my-vault.vault.azure.net`) or
//!   `AZURE_KEY_VAULT_NAME` - one is required
//! - `AZURE_CLIENT_ID` - Optional, selects a user-assigned identity
//! - `IDENTITY_ENDPOINT` + `IDENTITY_HEADER` - Set by App Service / Functions
//! - `MSI_ENDPOINT` + `MSI_SECRET` - Older App Service / Functions hosts
//!
//! When neither pair is present the Instance Metadata Service is used. A
//! half-configured pair is a configuration error.
//!
//! ## Naming
//!
//! Key Vault secret names only allow alphanumerics and hyphens, so
//! underscores are mapped to hyphens: `JWT_SECRET` is read from `JWT-SECRET`.

use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

use super::SecretProvider;
use crate::secrets::detector::ProviderKind;
use crate::secrets::env::AmbientEnv;
use crate::secrets::error::{ProviderFetchError, Result, SecretsError};
use crate::secrets::types::SecretString;

/// Token audience for Key Vault.
pub const KEY_VAULT_RESOURCE: &str = "https://vault.azure.net";

const KEY_VAULT_API_VERSION: &str = "7.4";
const IMDS_TOKEN_ENDPOINT: &str = "http://169.254.169.254/metadata/identity/oauth2/token";
const IMDS_API_VERSION: &str = "2018-02-01";
const APP_SERVICE_API_VERSION: &str = "2019-08-01";
const LEGACY_MSI_API_VERSION: &str = "2017-09-01";

/// Where managed identity tokens come from.
#[derive(Debug, Clone, PartialEq)]
pub enum AzureTokenSource {
    /// App Service / Functions identity endpoint
    AppService { endpoint: String, header: SecretString },
    /// Pre-2019 App Service identity endpoint
    LegacyMsi { endpoint: String, secret: SecretString },
    /// Instance Metadata Service (VMs, AKS, Container Apps)
    Imds { endpoint: String },
}

/// Configuration for the Key Vault provider.
#[derive(Debug, Clone, PartialEq)]
pub struct AzureKeyVaultConfig {
    pub vault_url: String,
    pub client_id: Option<String>,
    pub token_source: AzureTokenSource,
}

impl AzureKeyVaultConfig {
    pub fn from_env(env: &AmbientEnv) -> Result<Self> {
        let vault_url = match (env.get("AZURE_KEY_VAULT_URL"), env.get("AZURE_KEY_VAULT_NAME")) {
            (Some(url), _) => url.to_string(),
            (None, Some(name)) => format!("https://{}.vault.azure.net", name),
            (None, None) => {
                return Err(SecretsError::config(
                    "Azure provider requires AZURE_KEY_VAULT_URL or AZURE_KEY_VAULT_NAME",
                ))
            }
        };

        url::Url::parse(&vault_url)
            .map_err(|e| SecretsError::config(format!("Invalid Azure Key Vault URL: {}", e)))?;

        let token_source = token_source_from_env(env)?;

        Ok(Self {
            vault_url: vault_url.trim_end_matches('/').to_string(),
            client_id: env.get("AZURE_CLIENT_ID").map(String::from),
            token_source,
        })
    }
}

fn token_source_from_env(env: &AmbientEnv) -> Result<AzureTokenSource> {
    match (env.get("IDENTITY_ENDPOINT"), env.get("IDENTITY_HEADER")) {
        (Some(endpoint), Some(header)) => {
            return Ok(AzureTokenSource::AppService {
                endpoint: endpoint.to_string(),
                header: SecretString::new(header),
            })
        }
        (Some(_), None) => {
            return Err(SecretsError::config("IDENTITY_ENDPOINT is set but IDENTITY_HEADER is not"))
        }
        (None, Some(_)) => {
            return Err(SecretsError::config("IDENTITY_HEADER is set but IDENTITY_ENDPOINT is not"))
        }
        (None, None) => {}
    }

    match (env.get("MSI_ENDPOINT"), env.get("MSI_SECRET")) {
        (Some(endpoint), Some(secret)) => Ok(AzureTokenSource::LegacyMsi {
            endpoint: endpoint.to_string(),
            secret: SecretString::new(secret),
        }),
        (Some(_), None) => Err(SecretsError::config("MSI_ENDPOINT is set but MSI_SECRET is not")),
        (None, Some(_)) => Err(SecretsError::config("MSI_SECRET is set but MSI_ENDPOINT is not")),
        (None, None) => Ok(AzureTokenSource::Imds { endpoint: IMDS_TOKEN_ENDPOINT.to_string() }),
    }
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Deserialize)]
struct SecretBundle {
    value: Option<String>,
}

/// Reads secrets from Azure Key Vault over REST.
#[derive(Debug)]
pub struct AzureKeyVaultProvider {
    http: reqwest::Client,
    config: AzureKeyVaultConfig,
}

impl AzureKeyVaultProvider {
    pub fn new(config: AzureKeyVaultConfig, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| SecretsError::config(format!("Failed to build Azure HTTP client: {}", e)))?;

        debug!(vault_url = %config.vault_url, "Initialized Azure Key Vault provider");
        Ok(Self { http, config })
    }

    /// Key Vault name for a logical secret name.
    fn vault_secret_name(name: &str) -> Option<String> {
        let mapped = name.replace('_', "-");
        let valid = !mapped.is_empty()
            && mapped.len() <= 127
            && mapped.chars().all(|c| c.is_ascii_alphanumeric() || c == '-');
        valid.then_some(mapped)
    }

    async fn access_token(&self) -> std::result::Result<SecretString, ProviderFetchError> {
        // The legacy endpoint spells the identity parameter `clientid`.
        let (mut request, client_id_param) = match &self.config.token_source {
            AzureTokenSource::AppService { endpoint, header } => (
                self.http
                    .get(endpoint)
                    .query(&[("resource", KEY_VAULT_RESOURCE), ("api-version", APP_SERVICE_API_VERSION)])
                    .header("X-IDENTITY-HEADER", header.expose_secret()),
                "client_id",
            ),
            AzureTokenSource::LegacyMsi { endpoint, secret } => (
                self.http
                    .get(endpoint)
                    .query(&[("resource", KEY_VAULT_RESOURCE), ("api-version", LEGACY_MSI_API_VERSION)])
                    .header("Secret", secret.expose_secret()),
                "clientid",
            ),
            AzureTokenSource::Imds { endpoint } => (
                self.http
                    .get(endpoint)
                    .query(&[("api-version", IMDS_API_VERSION), ("resource", KEY_VAULT_RESOURCE)])
                    .header("Metadata", "true"),
                "client_id",
            ),
        };
        if let Some(client_id) = &self.config.client_id {
            request = request.query(&[(client_id_param, client_id.as_str())]);
        }

        let response = request.send().await.map_err(|e| transport_error("token request", e))?;
        let status = response.status();
        if !status.is_success() {
            return Err(status_error("token endpoint", status));
        }

        let token: TokenResponse = response.json().await.map_err(|e| {
            ProviderFetchError::invalid_payload(format!("token response unreadable: {}", e))
        })?;
        Ok(SecretString::new(token.access_token))
    }
}

#[async_trait]
impl SecretProvider for AzureKeyVaultProvider {
    async fn fetch_raw(&self, name: &str) -> std::result::Result<SecretString, ProviderFetchError> {
        let vault_name = Self::vault_secret_name(name).ok_or_else(|| {
            ProviderFetchError::not_found(format!("'{}' is not a valid Key Vault secret name", name))
        })?;

        let token = self.access_token().await?;
        let url = format!("{}/secrets/{}", self.config.vault_url, vault_name);

        debug!(secret = %name, vault_name = %vault_name, "Fetching secret from Azure Key Vault");

        let response = self
            .http
            .get(&url)
            .query(&[("api-version", KEY_VAULT_API_VERSION)])
            .bearer_auth(token.expose_secret())
            .send()
            .await
            .map_err(|e| transport_error("secret request", e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(status_error("key vault", status));
        }

        let bundle: SecretBundle = response.json().await.map_err(|e| {
            ProviderFetchError::invalid_payload(format!("secret bundle unreadable: {}", e))
        })?;

        bundle
            .value
            .map(SecretString::new)
            .ok_or_else(|| ProviderFetchError::invalid_payload("secret bundle has no value"))
    }

    fn kind(&self) -> ProviderKind {
        ProviderKind::Azure
    }
}

fn transport_error(stage: &str, err: reqwest::Error) -> ProviderFetchError {
    if err.is_timeout() {
        ProviderFetchError::timeout(format!("{} timed out: {}", stage, err))
    } else {
        ProviderFetchError::unavailable(format!("{} failed: {}", stage, err))
    }
}

fn status_error(stage: &str, status: reqwest::StatusCode) -> ProviderFetchError {
    match status.as_u16() {
        404 => ProviderFetchError::not_found(format!("{} returned {}", stage, status)),
        401 | 403 => ProviderFetchError::access_denied(format!("{} returned {}", stage, status)),
        _ => ProviderFetchError::unavailable(format!("{} returned {}", stage, status)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::secrets::detector::detect;
    use crate::secrets::error::FetchFailure;
    use serde_json::json;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const TOKEN_PATH: &str = "/metadata/identity/oauth2/token";

    fn imds_config(server: &MockServer) -> AzureKeyVaultConfig {
        AzureKeyVaultConfig {
            vault_url: server.uri(),
            client_id: None,
            token_source: AzureTokenSource::Imds {
                endpoint: format!("{}{}", server.uri(), TOKEN_PATH),
            },
        }
    }

    async fn mount_imds_token(server: &MockServer) {
        Mock::given(method("GET"))
            .and(path(TOKEN_PATH))
            .and(header("Metadata", "true"))
            .and(query_param("resource", KEY_VAULT_RESOURCE))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({ "access_token": "tok-123", "expires_in": "3599" })),
            )
            .mount(server)
            .await;
    }

    #[test]
    fn test_config_from_env_vault_name() {
        let env = AmbientEnv::from_pairs([
            ("AZURE_KEY_VAULT_NAME", "forge-kv"),
            ("AZURE_CLIENT_ID", "client-1"),
        ]);
        let config = AzureKeyVaultConfig::from_env(&env).unwrap();
        assert_eq!(config.vault_url, "https://forge-kv.vault.azure.net");
        assert_eq!(config.client_id.as_deref(), Some("client-1"));
        assert_eq!(
            config.token_source,
            AzureTokenSource::Imds { endpoint: IMDS_TOKEN_ENDPOINT.to_string() }
        );
    }

    #[test]
    fn test_config_from_env_app_service() {
        let env = AmbientEnv::from_pairs([
            ("AZURE_KEY_VAULT_URL", "https://forge-kv.vault.azure.net/"),
            ("IDENTITY_ENDPOINT", "http://127.0.0.1:41741/msi/token"),
            ("IDENTITY_HEADER", "header-secret"),
        ]);
        let config = AzureKeyVaultConfig::from_env(&env).unwrap();
        assert_eq!(config.vault_url, "https://forge-kv.vault.azure.net");
        assert!(matches!(config.token_source, AzureTokenSource::AppService { .. }));
        assert!(!format!("{:?}", config).contains("header-secret"));
    }

    #[test]
    fn test_config_from_env_legacy_msi() {
        let env = AmbientEnv::from_pairs([
            ("AZURE_KEY_VAULT_NAME", "forge-kv"),
            ("MSI_ENDPOINT", "http://127.0.0.1:41741/MSI/token/"),
            ("MSI_SECRET", "msi-secret"),
        ]);
        assert_eq!(detect(&env).unwrap(), ProviderKind::Azure);

        let config = AzureKeyVaultConfig::from_env(&env).unwrap();
        assert_eq!(
            config.token_source,
            AzureTokenSource::LegacyMsi {
                endpoint: "http://127.0.0.1:41741/MSI/token/".to_string(),
                secret: SecretString::new("msi-secret"),
            }
        );
        assert!(!format!("{:?}", config).contains("msi-secret"));
    }

    #[test]
    fn test_config_half_configured_identity_is_rejected() {
        for pairs in [
            [("IDENTITY_ENDPOINT", "http://127.0.0.1:41741/msi/token"), ("AZURE_KEY_VAULT_NAME", "kv")],
            [("IDENTITY_HEADER", "header-secret"), ("AZURE_KEY_VAULT_NAME", "kv")],
            [("MSI_ENDPOINT", "http://127.0.0.1:41741/MSI/token/"), ("AZURE_KEY_VAULT_NAME", "kv")],
            [("MSI_SECRET", "msi-secret"), ("AZURE_KEY_VAULT_NAME", "kv")],
        ] {
            let err = AzureKeyVaultConfig::from_env(&AmbientEnv::from_pairs(pairs)).unwrap_err();
            assert!(matches!(err, SecretsError::Config { .. }));
            let message = err.to_string();
            assert!(!message.contains("header-secret"));
            assert!(!message.contains("msi-secret"));
        }
    }

    #[test]
    fn test_config_requires_vault() {
        let err = AzureKeyVaultConfig::from_env(&AmbientEnv::default()).unwrap_err();
        assert!(matches!(err, SecretsError::Config { .. }));
    }

    #[test]
    fn test_vault_secret_name_mapping() {
        assert_eq!(
            AzureKeyVaultProvider::vault_secret_name("GITHUB_WEBHOOK_SECRET").as_deref(),
            Some("GITHUB-WEBHOOK-SECRET")
        );
        assert!(AzureKeyVaultProvider::vault_secret_name("../keys").is_none());
        assert!(AzureKeyVaultProvider::vault_secret_name("").is_none());
    }

    #[tokio::test]
    async fn test_fetch_secret_with_imds_token() {
        let server = MockServer::start().await;
        mount_imds_token(&server).await;
        Mock::given(method("GET"))
            .and(path("/secrets/JWT-SECRET"))
            .and(query_param("api-version", KEY_VAULT_API_VERSION))
            .and(header("Authorization", "Bearer tok-123"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "value": "kv-jwt-value",
                "id": "https://forge-kv.vault.azure.net/secrets/JWT-SECRET/abc"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let provider = AzureKeyVaultProvider::new(imds_config(&server), Duration::from_secs(5)).unwrap();
        let value = provider.fetch_raw("JWT_SECRET").await.unwrap();
        assert_eq!(value.expose_secret(), "kv-jwt-value");
    }

    #[tokio::test]
    async fn test_fetch_secret_with_app_service_token() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/msi/token"))
            .and(header("X-IDENTITY-HEADER", "header-secret"))
            .and(query_param("api-version", APP_SERVICE_API_VERSION))
            .and(query_param("client_id", "client-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "access_token": "app-tok" })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/secrets/SESSION-SECRET"))
            .and(header("Authorization", "Bearer app-tok"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "value": "sess" })))
            .mount(&server)
            .await;

        let config = AzureKeyVaultConfig {
            vault_url: server.uri(),
            client_id: Some("client-1".to_string()),
            token_source: AzureTokenSource::AppService {
                endpoint: format!("{}/msi/token", server.uri()),
                header: SecretString::new("header-secret"),
            },
        };
        let provider = AzureKeyVaultProvider::new(config, Duration::from_secs(5)).unwrap();
        assert_eq!(provider.fetch_raw("SESSION_SECRET").await.unwrap().expose_secret(), "sess");
    }

    #[tokio::test]
    async fn test_fetch_secret_with_legacy_msi_token() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/MSI/token/"))
            .and(header("Secret", "msi-secret"))
            .and(query_param("api-version", LEGACY_MSI_API_VERSION))
            .and(query_param("resource", KEY_VAULT_RESOURCE))
            .and(query_param("clientid", "client-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "access_token": "msi-tok" })))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/secrets/GITHUB-TOKEN"))
            .and(header("Authorization", "Bearer msi-tok"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "value": "ghp_legacy" })))
            .mount(&server)
            .await;

        let config = AzureKeyVaultConfig {
            vault_url: server.uri(),
            client_id: Some("client-1".to_string()),
            token_source: AzureTokenSource::LegacyMsi {
                endpoint: format!("{}/MSI/token/", server.uri()),
                secret: SecretString::new("msi-secret"),
            },
        };
        let provider = AzureKeyVaultProvider::new(config, Duration::from_secs(5)).unwrap();
        assert_eq!(provider.fetch_raw("GITHUB_TOKEN").await.unwrap().expose_secret(), "ghp_legacy");
    }

    #[tokio::test]
    async fn test_missing_secret_is_not_found() {
        let server = MockServer::start().await;
        mount_imds_token(&server).await;
        Mock::given(method("GET"))
            .and(path("/secrets/MISSING"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let provider = AzureKeyVaultProvider::new(imds_config(&server), Duration::from_secs(5)).unwrap();
        let err = provider.fetch_raw("MISSING").await.unwrap_err();
        assert_eq!(err.failure(), FetchFailure::NotFound);
    }

    #[tokio::test]
    async fn test_forbidden_is_access_denied() {
        let server = MockServer::start().await;
        mount_imds_token(&server).await;
        Mock::given(method("GET"))
            .and(path("/secrets/LOCKED"))
            .respond_with(ResponseTemplate::new(403))
            .mount(&server)
            .await;

        let provider = AzureKeyVaultProvider::new(imds_config(&server), Duration::from_secs(5)).unwrap();
        let err = provider.fetch_raw("LOCKED").await.unwrap_err();
        assert_eq!(err.failure(), FetchFailure::AccessDenied);
    }

    #[tokio::test]
    async fn test_token_failure_stops_before_vault_call() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(TOKEN_PATH))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/secrets/JWT-SECRET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "value": "x" })))
            .expect(0)
            .mount(&server)
            .await;

        let provider = AzureKeyVaultProvider::new(imds_config(&server), Duration::from_secs(5)).unwrap();
        let err = provider.fetch_raw("JWT_SECRET").await.unwrap_err();
        assert_eq!(err.failure(), FetchFailure::Unavailable);
    }

    #[tokio::test]
    async fn test_bundle_without_value_is_invalid() {
        let server = MockServer::start().await;
        mount_imds_token(&server).await;
        Mock::given(method("GET"))
            .and(path("/secrets/EMPTY"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": "x" })))
            .mount(&server)
            .await;

        let provider = AzureKeyVaultProvider::new(imds_config(&server), Duration::from_secs(5)).unwrap();
        let err = provider.fetch_raw("EMPTY").await.unwrap_err();
        assert_eq!(err.failure(), FetchFailure::InvalidPayload);
    }

    #[tokio::test]
    async fn test_slow_vault_times_out() {
        let server = MockServer::start().await;
        mount_imds_token(&server).await;
        Mock::given(method("GET"))
            .and(path("/secrets/SLOW"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({ "value": "late" }))
                    .set_delay(Duration::from_millis(500)),
            )
            .mount(&server)
            .await;

        let provider =
            AzureKeyVaultProvider::new(imds_config(&server), Duration::from_millis(50)).unwrap();
        let err = provider.fetch_raw("SLOW").await.unwrap_err();
        assert_eq!(err.failure(), FetchFailure::Timeout);
    }
}
