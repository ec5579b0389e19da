//! Liveness and info handlers.

use axum::{extract::State, Json};
use serde::Serialize;
use serde_json::{json, Value};

use crate::state::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: String,
}

/// GET / - Service info and endpoint list.
///
/// Reports whether a credential is configured, never the credential itself.
pub async fn index(State(state): State<AppState>) -> Json<Value> {
    let analyzer = &state.analyzer;
    Json(json!({
        "status": "ok",
        "message": "萬物價格掃描器 API 運行中",
        "service": state.service_name,
        "version": env!("CARGO_PKG_VERSION"),
        "model": analyzer.model_id(),
        "policy": analyzer.policy(),
        "credentialConfigured": analyzer.is_configured(),
        "endpoints": {
            "health": "/api/health",
            "analyze": "/api/analyze (POST)"
        }
    }))
}

/// GET /api/health
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        service: state.service_name.clone(),
    })
}
