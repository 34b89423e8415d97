//! Startup sequence for the RefactorForge backend
//!
//! Builds the secrets context from configuration and checks that every
//! required secret resolves before the API starts serving.

use tracing::{info, warn};

use crate::config::{AppConfig, Environment};
use crate::errors::Result;
use crate::secrets::{AppSecrets, SecretsError};

/// Initialize application secrets and validate the required set.
///
/// Missing secrets abort startup in production. Elsewhere they are logged
/// and the service starts degraded; `/health/secrets` keeps reporting them.
pub async fn initialize_secrets(config: &AppConfig) -> Result<AppSecrets> {
    let secrets = AppSecrets::initialize(config.secrets.clone()).await?;
    info!(
        provider = %secrets.manager().provider_kind(),
        environment = %config.environment,
        "Application secrets initialized"
    );

    validate_required_secrets(secrets, config.environment).await
}

/// Apply the startup policy to an already built secrets context.
pub async fn validate_required_secrets(
    secrets: AppSecrets,
    environment: Environment,
) -> Result<AppSecrets> {
    match secrets.validate_all_secrets().await {
        Ok(()) => Ok(secrets),
        Err(err @ SecretsError::MissingSecrets { .. }) if !environment.is_production() => {
            warn!(
                missing = ?err.missing_names(),
                environment = %environment,
                "Starting with unresolved required secrets"
            );
            Ok(secrets)
        }
        Err(err) => Err(err.into()),
    }
}
