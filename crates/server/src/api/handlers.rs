use axum::{extract::State, Json};
use serde::Serialize;
use std::sync::Arc;
use titlegate_core::SanitizedConfig;

use crate::metrics;
use crate::state::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
}

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}

#[derive(Serialize)]
pub struct VersionResponse {
    pub server: String,
    pub core: String,
}

pub async fn version() -> Json<VersionResponse> {
    Json(VersionResponse {
        server: env!("CARGO_PKG_VERSION").to_string(),
        core: env!("CARGO_PKG_VERSION").to_string(),
    })
}

pub async fn root() -> &'static str {
    "titlegate title packaging service"
}

pub async fn get_config(State(state): State<Arc<AppState>>) -> Json<SanitizedConfig> {
    Json(state.sanitized_config())
}

pub async fn get_metrics() -> String {
    metrics::gather()
}
