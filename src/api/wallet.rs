use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};

use super::AppState;
use crate::error::Result;
use crate::models::{ApiResponse, SessionInfo, WalletKind};

#[derive(Debug, Deserialize)]
pub struct ConnectRequest {
    pub kind: WalletKind,
}

/// POST /api/v1/wallet/connect
pub async fn connect(
    State(state): State<AppState>,
    Json(req): Json<ConnectRequest>,
) -> Result<Json<ApiResponse<SessionInfo>>> {
    let info = state.sessions.connect(req.kind).await?;
    Ok(Json(ApiResponse::success(info)))
}

#[derive(Serialize)]
pub struct AddressResponse {
    pub address: Option<String>,
}

/// GET /api/v1/wallet/address
///
/// No session is a normal answer here, not an error.
pub async fn get_address(State(state): State<AppState>) -> Json<ApiResponse<AddressResponse>> {
    let address = state.sessions.get_address().await;
    Json(ApiResponse::success(AddressResponse { address }))
}

/// POST /api/v1/wallet/disconnect
pub async fn disconnect(State(state): State<AppState>) -> Json<ApiResponse<&'static str>> {
    state.sessions.disconnect().await;
    Json(ApiResponse::success("disconnected"))
}

#[derive(Serialize)]
pub struct KindEntry {
    pub kind: WalletKind,
    pub label: &'static str,
}

#[derive(Serialize)]
pub struct KindsResponse {
    pub host_mode: bool,
    pub kinds: Vec<KindEntry>,
}

/// GET /api/v1/wallet/kinds
pub async fn kinds(State(state): State<AppState>) -> Json<ApiResponse<KindsResponse>> {
    let kinds = state
        .sessions
        .available_kinds()
        .into_iter()
        .map(|kind| KindEntry {
            kind,
            label: kind.label(),
        })
        .collect();

    Json(ApiResponse::success(KindsResponse {
        host_mode: state.sessions.host_mode(),
        kinds,
    }))
}
