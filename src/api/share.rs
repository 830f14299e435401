use axum::{
    extract::{Query, RawQuery, State},
    Json,
};
use serde::Deserialize;

use super::AppState;
use crate::error::Result;
use crate::models::ApiResponse;
use crate::services::share::{decode_prefill, PrefillRequest, ShareLinks};

fn default_recipients() -> usize {
    1
}

#[derive(Debug, Deserialize)]
pub struct ComposeQuery {
    #[serde(default = "default_recipients")]
    pub recipients: usize,
    pub network: String,
}

/// GET /api/v1/share/links?recipients=5&network=Base
pub async fn links(
    State(state): State<AppState>,
    Query(query): Query<ComposeQuery>,
) -> Result<Json<ApiResponse<ShareLinks>>> {
    let links = state.share.compose_links(query.recipients, &query.network)?;
    Ok(Json(ApiResponse::success(links)))
}

#[derive(Debug, Deserialize)]
pub struct TrackRequest {
    pub event: String,
}

/// POST /api/v1/share/track
///
/// Fire-and-forget: the beacon runs in the background and its failures stay
/// there.
pub async fn track(
    State(state): State<AppState>,
    Json(req): Json<TrackRequest>,
) -> Json<ApiResponse<&'static str>> {
    let share = state.share.clone();
    tokio::spawn(async move {
        share.track(&req.event).await;
    });
    Json(ApiResponse::success("accepted"))
}

/// GET /api/v1/share/prefill?chain=8453&rows=0xA:1.0,0xB:2.5
///
/// Decodes a share deep link back into form rows; unrecognizable links
/// simply prefill nothing.
pub async fn prefill(
    RawQuery(query): RawQuery,
) -> Json<ApiResponse<Option<PrefillRequest>>> {
    let decoded = query.as_deref().and_then(decode_prefill);
    Json(ApiResponse::success(decoded))
}
