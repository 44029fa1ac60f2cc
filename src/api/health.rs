//! Health check endpoints

use axum::{Json, Router, routing::get};
use serde::Serialize;

/// Health check response
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

/// Root banner response
#[derive(Serialize)]
pub struct RootResponse {
    pub message: &'static str,
}

/// Build health router (no state required)
pub fn router() -> Router {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
}

async fn root() -> Json<RootResponse> {
    Json(RootResponse {
        message: "Twilio Media Stream Server is running!",
    })
}

/// Basic liveness check
async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}
