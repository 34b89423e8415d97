use std::sync::Arc;

use axum::{routing::get, Router};
use tower_http::trace::TraceLayer;

use crate::secrets::AppSecrets;

use super::handlers::{health_handler, secrets_health_handler};

#[derive(Clone)]
pub struct ApiState {
    pub secrets: AppSecrets,
    pub service_name: Arc<str>,
}

impl ApiState {
    pub fn new(secrets: AppSecrets, service_name: impl Into<Arc<str>>) -> Self {
        Self { secrets, service_name: service_name.into() }
    }
}

pub fn build_router(state: ApiState) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/health/secrets", get(secrets_health_handler))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}
