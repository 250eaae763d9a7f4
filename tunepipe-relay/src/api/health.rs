//! Liveness endpoint for process supervisors and load balancers

use axum::{routing::get, Json, Router};
use serde::Serialize;

use crate::AppState;

const SERVICE_NAME: &str = "tunepipe-relay";

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub module: String,
    pub version: String,
}

/// Answers as long as the HTTP loop is serving
///
/// Neither the resolution service nor the transcoder is touched, so a slow
/// resolver never makes the relay look dead.
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        module: SERVICE_NAME.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

pub fn health_routes() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}
