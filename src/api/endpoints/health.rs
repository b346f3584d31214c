//! Health check endpoint.

use axum::extract::State;
use axum::Json;
use serde::Serialize;

use crate::api::types::ApiContext;
use crate::config::BackendKind;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub app: &'static str,
    pub backend: &'static str,
    pub version: &'static str,
}

/// `GET /api/health`: liveness check.
pub async fn check(State(ctx): State<ApiContext>) -> Json<HealthResponse> {
    let backend = match ctx.backend_kind {
        BackendKind::Appwrite => "appwrite",
        BackendKind::Memory => "memory",
    };

    Json(HealthResponse {
        status: "ok",
        app: crate::config::APP_NAME,
        backend,
        version: crate::config::APP_VERSION,
    })
}
