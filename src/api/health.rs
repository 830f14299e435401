use axum::{extract::State, Json};
use serde::Serialize;

use super::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub supported_chains: usize,
    pub host_bridge: String,
}

pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let host_bridge = if state.config.host_bridge_url.is_some() {
        "configured".to_string()
    } else {
        "absent".to_string()
    };

    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        supported_chains: state.chains.all().len(),
        host_bridge,
    })
}
