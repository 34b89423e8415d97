//! AWS Secrets Manager provider.
//!
//! Credentials come from the SDK default chain (environment, ECS task role,
//! EC2 instance profile, IRSA web identity). The region is taken from
//! `AWS_REGION` or `AWS_DEFAULT_REGION`. Only `SecretString` payloads are
//! supported; binary secrets are reported as an invalid payload.
//!
//! Requires the `aws` cargo feature.

use std::time::Duration;

use crate::secrets::env::AmbientEnv;
use crate::secrets::error::Result;

#[cfg(feature = "aws")]
use super::SecretProvider;
#[cfg(feature = "aws")]
use crate::secrets::detector::{ProviderKind, AWS_INDICATORS};
#[cfg(any(feature = "aws", test))]
use crate::secrets::error::ProviderFetchError;
#[cfg(any(feature = "aws", test))]
use crate::secrets::types::SecretString;
#[cfg(feature = "aws")]
use async_trait::async_trait;
#[cfg(feature = "aws")]
use aws_sdk_secretsmanager::error::{ProvideErrorMetadata, SdkError};
#[cfg(feature = "aws")]
use tracing::{debug, info};

/// Reads secrets from AWS Secrets Manager.
#[cfg(feature = "aws")]
#[derive(Debug)]
pub struct AwsSecretProvider {
    client: aws_sdk_secretsmanager::Client,
}

#[cfg(feature = "aws")]
impl AwsSecretProvider {
    pub async fn from_env(env: &AmbientEnv, timeout: Duration) -> Result<Self> {
        let mut loader = aws_config::defaults(aws_config::BehaviorVersion::latest()).timeout_config(
            aws_config::timeout::TimeoutConfig::builder().operation_timeout(timeout).build(),
        );
        if let Some(region) = env.first_of(AWS_INDICATORS) {
            loader = loader.region(aws_config::Region::new(region.to_string()));
        }
        let shared = loader.load().await;

        info!(
            region = ?shared.region().map(|r| r.as_ref().to_string()),
            "Initialized AWS Secrets Manager provider"
        );

        Ok(Self { client: aws_sdk_secretsmanager::Client::new(&shared) })
    }
}

#[cfg(feature = "aws")]
#[async_trait]
impl SecretProvider for AwsSecretProvider {
    async fn fetch_raw(&self, name: &str) -> std::result::Result<SecretString, ProviderFetchError> {
        debug!(secret = %name, "Fetching secret from AWS Secrets Manager");

        let output = self
            .client
            .get_secret_value()
            .secret_id(name)
            .send()
            .await
            .map_err(|err| classify_sdk_error(&err))?;

        decode_secret_string(output.secret_string())
    }

    fn kind(&self) -> ProviderKind {
        ProviderKind::Aws
    }
}

#[cfg(feature = "aws")]
fn classify_sdk_error<E, R>(err: &SdkError<E, R>) -> ProviderFetchError
where
    E: ProvideErrorMetadata + std::error::Error + 'static,
    R: std::fmt::Debug,
{
    match err {
        SdkError::TimeoutError(_) => {
            ProviderFetchError::timeout(format!("GetSecretValue timed out: {}", err))
        }
        SdkError::DispatchFailure(_) => {
            ProviderFetchError::unavailable(format!("GetSecretValue dispatch failed: {}", err))
        }
        _ => classify_error_code(err.code(), format!("GetSecretValue failed: {}", err)),
    }
}

/// Map a Secrets Manager error code onto a fetch failure.
#[cfg(any(feature = "aws", test))]
fn classify_error_code(code: Option<&str>, detail: String) -> ProviderFetchError {
    match code {
        Some("ResourceNotFoundException") => ProviderFetchError::not_found(detail),
        Some("AccessDeniedException")
        | Some("UnrecognizedClientException")
        | Some("ExpiredTokenException") => ProviderFetchError::access_denied(detail),
        _ => ProviderFetchError::unavailable(detail),
    }
}

/// Only non-empty `SecretString` payloads are usable.
#[cfg(any(feature = "aws", test))]
fn decode_secret_string(value: Option<&str>) -> std::result::Result<SecretString, ProviderFetchError> {
    value
        .filter(|value| !value.is_empty())
        .map(SecretString::new)
        .ok_or_else(|| ProviderFetchError::invalid_payload("secret has no SecretString value"))
}

/// Stub for builds without the `aws` feature. Construction always fails.
#[cfg(not(feature = "aws"))]
#[derive(Debug)]
pub struct AwsSecretProvider {
    _private: (),
}

#[cfg(not(feature = "aws"))]
impl AwsSecretProvider {
    pub async fn from_env(_env: &AmbientEnv, _timeout: Duration) -> Result<Self> {
        Err(crate::secrets::error::SecretsError::config(
            "AWS provider support is not compiled in; rebuild with the `aws` feature",
        ))
    }
}

#[cfg(not(feature = "aws"))]
#[async_trait::async_trait]
impl super::SecretProvider for AwsSecretProvider {
    async fn fetch_raw(
        &self,
        _name: &str,
    ) -> std::result::Result<crate::secrets::SecretString, crate::secrets::ProviderFetchError> {
        Err(crate::secrets::ProviderFetchError::unavailable("aws feature disabled"))
    }

    fn kind(&self) -> crate::secrets::ProviderKind {
        crate::secrets::ProviderKind::Aws
    }
}
