//! Provider kinds and ambient provider detection.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::debug;

use super::env::AmbientEnv;
use super::error::{Result, SecretsError};

/// Azure managed identity indicators.
pub const AZURE_INDICATORS: &[&str] = &["AZURE_CLIENT_ID", "MSI_ENDPOINT", "IDENTITY_ENDPOINT"];

/// AWS region indicators.
pub const AWS_INDICATORS: &[&str] = &["AWS_REGION", "AWS_DEFAULT_REGION"];

/// GCP project indicators.
pub const GCP_INDICATORS: &[&str] = &["GOOGLE_CLOUD_PROJECT", "GCP_PROJECT", "GCLOUD_PROJECT"];

/// Source system a secret's raw value is fetched from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    /// Process environment variables
    Local,
    /// Azure Key Vault via managed identity
    Azure,
    /// AWS Secrets Manager via the default credential chain
    Aws,
    /// GCP Secret Manager via Application Default Credentials
    Gcp,
}

impl ProviderKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Local => "local",
            Self::Azure => "azure",
            Self::Aws => "aws",
            Self::Gcp => "gcp",
        }
    }

    pub fn is_cloud(&self) -> bool {
        !matches!(self, Self::Local)
    }
}

impl FromStr for ProviderKind {
    type Err = SecretsError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "local" => Ok(Self::Local),
            "azure" => Ok(Self::Azure),
            "aws" => Ok(Self::Aws),
            "gcp" => Ok(Self::Gcp),
            other => Err(SecretsError::config(format!("Unknown secrets provider: {}", other))),
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Select a provider from ambient indicators.
///
/// Azure wins over AWS, which wins over GCP. With no indicator present the
/// local provider is only allowed outside production.
pub fn detect(env: &AmbientEnv) -> Result<ProviderKind> {
    let provider = if env.first_of(AZURE_INDICATORS).is_some() {
        ProviderKind::Azure
    } else if env.first_of(AWS_INDICATORS).is_some() {
        ProviderKind::Aws
    } else if env.first_of(GCP_INDICATORS).is_some() {
        ProviderKind::Gcp
    } else if env.running_mode()?.is_production() {
        return Err(SecretsError::EnvironmentDetection);
    } else {
        ProviderKind::Local
    };

    debug!(provider = %provider, "Detected secrets provider");
    Ok(provider)
}
