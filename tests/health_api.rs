//! Integration tests for the health endpoints
//!
//! Tests that set secret variables serialize on a shared lock.

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use refactorforge::{
    api::{build_router, ApiState},
    secrets::{AppSecrets, ProviderKind, SecretsManagerConfig},
};
use std::env;
use tokio::sync::Mutex;
use tower::ServiceExt;

static ENV_MUTEX: Mutex<()> = Mutex::const_new(());

async fn router_requiring(names: &[&str]) -> Router {
    let secrets =
        AppSecrets::initialize(SecretsManagerConfig::default().with_provider(ProviderKind::Local))
            .await
            .unwrap()
            .with_required_secrets(names.iter().copied());
    build_router(ApiState::new(secrets, "refactorforge"))
}

async fn get(router: Router, uri: &str) -> (StatusCode, serde_json::Value) {
    let response =
        router.oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap()).await.unwrap();
    let status = response.status();
    let body = response.into_body().collect().await.unwrap().to_bytes();
    (status, serde_json::from_slice(&body).unwrap())
}

#[tokio::test]
async fn test_liveness() {
    let (status, body) = get(router_requiring(&[]).await, "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["version"], refactorforge::VERSION);
}

#[tokio::test]
async fn test_secrets_ready() {
    let _lock = ENV_MUTEX.lock().await;
    env::set_var("REFACTORFORGE_IT_HEALTH_READY", "ready-value");

    let router = router_requiring(&["REFACTORFORGE_IT_HEALTH_READY"]).await;
    let (status, body) = get(router, "/health/secrets").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, serde_json::json!({"status": "ok", "provider": "local"}));

    env::remove_var("REFACTORFORGE_IT_HEALTH_READY");
}

#[tokio::test]
async fn test_secrets_degraded() {
    let _lock = ENV_MUTEX.lock().await;
    env::set_var("REFACTORFORGE_IT_HEALTH_PRESENT", "present-value");
    env::remove_var("REFACTORFORGE_IT_HEALTH_ABSENT");

    let router =
        router_requiring(&["REFACTORFORGE_IT_HEALTH_PRESENT", "REFACTORFORGE_IT_HEALTH_ABSENT"])
            .await;
    let (status, body) = get(router, "/health/secrets").await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(
        body,
        serde_json::json!({
            "status": "degraded",
            "provider": "local",
            "missing": ["REFACTORFORGE_IT_HEALTH_ABSENT"]
        })
    );
    assert!(!body.to_string().contains("present-value"));

    env::remove_var("REFACTORFORGE_IT_HEALTH_PRESENT");
}

#[tokio::test]
async fn test_validation_reflects_current_values() {
    let _lock = ENV_MUTEX.lock().await;
    env::remove_var("REFACTORFORGE_IT_HEALTH_LATE");
    let router = router_requiring(&["REFACTORFORGE_IT_HEALTH_LATE"]).await;

    let (status, _) = get(router.clone(), "/health/secrets").await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);

    env::set_var("REFACTORFORGE_IT_HEALTH_LATE", "arrived");
    let (status, _) = get(router, "/health/secrets").await;
    assert_eq!(status, StatusCode::OK);

    env::remove_var("REFACTORFORGE_IT_HEALTH_LATE");
}
