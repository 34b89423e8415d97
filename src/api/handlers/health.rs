//! Health check endpoints for monitoring and readiness probes

use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};

use crate::api::routes::ApiState;
use crate::secrets::{ProviderKind, SecretsError};

/// Liveness response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Service status (always "ok" when responding)
    pub status: String,
    pub service: String,
    pub version: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

/// Secrets readiness response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecretsHealthResponse {
    /// "ok" or "degraded"
    pub status: String,
    pub provider: ProviderKind,
    /// Names of required secrets that could not be resolved
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub missing: Vec<String>,
}

/// Health check endpoint
///
/// Returns 200 OK when the API server is operational.
pub async fn health_handler(State(state): State<ApiState>) -> (StatusCode, Json<HealthResponse>) {
    (
        StatusCode::OK,
        Json(HealthResponse {
            status: "ok".to_string(),
            service: state.service_name.to_string(),
            version: crate::VERSION.to_string(),
            timestamp: chrono::Utc::now(),
        }),
    )
}

/// Secrets readiness endpoint
///
/// Resolves every required secret against the provider. A failure yields
/// 503 with the missing names; values and causes are never included.
pub async fn secrets_health_handler(
    State(state): State<ApiState>,
) -> (StatusCode, Json<SecretsHealthResponse>) {
    let provider = state.secrets.manager().provider_kind();

    match state.secrets.validate_all_secrets().await {
        Ok(()) => (
            StatusCode::OK,
            Json(SecretsHealthResponse { status: "ok".to_string(), provider, missing: Vec::new() }),
        ),
        Err(err) => {
            let missing = match err {
                SecretsError::MissingSecrets { names } => names,
                _ => state.secrets.required_secrets().to_vec(),
            };
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(SecretsHealthResponse { status: "degraded".to_string(), provider, missing }),
            )
        }
    }
}
