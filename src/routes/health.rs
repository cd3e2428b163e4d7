use std::time::Instant;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};

use crate::content::ContentKind;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(health_check))
        .route("/live", get(liveness))
        .route("/ready", get(readiness))
        .route("/database", get(database_health))
}

pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "uptimeSecs": state.uptime_secs(),
    }))
}

pub async fn liveness() -> StatusCode {
    StatusCode::OK
}

/// 存储可读即视为就绪
pub async fn readiness(State(state): State<AppState>) -> StatusCode {
    match state.store().any_admin_exists() {
        Ok(_) => StatusCode::OK,
        Err(e) => {
            tracing::warn!(error = %e, "Readiness check failed");
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}

pub async fn database_health(State(state): State<AppState>) -> impl IntoResponse {
    let start = Instant::now();
    let healthy = state.store().any_admin_exists().is_ok();
    let latency_us = start.elapsed().as_micros() as u64;

    let counts: serde_json::Map<String, serde_json::Value> = ContentKind::ALL
        .into_iter()
        .map(|kind| {
            (
                kind.slug().to_string(),
                serde_json::Value::from(state.store().count_documents(kind)),
            )
        })
        .collect();

    Json(serde_json::json!({
        "healthy": healthy,
        "latencyUs": latency_us,
        "records": counts,
    }))
}
