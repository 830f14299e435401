use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;

use super::AppState;
use crate::error::Result;
use crate::models::{ApiResponse, TokenInfo};
use crate::services::tokens::ApproveOutcome;

#[derive(Debug, Deserialize)]
pub struct TokenQuery {
    pub address: String,
}

/// GET /api/v1/token/info?address=0x...
pub async fn info(
    State(state): State<AppState>,
    Query(query): Query<TokenQuery>,
) -> Result<Json<ApiResponse<TokenInfo>>> {
    let info = state.tokens.token_info(&query.address).await?;
    Ok(Json(ApiResponse::success(info)))
}

#[derive(Debug, Deserialize)]
pub struct ApproveRequest {
    pub token_address: String,
}

/// POST /api/v1/token/approve
pub async fn approve(
    State(state): State<AppState>,
    Json(req): Json<ApproveRequest>,
) -> Result<Json<ApiResponse<ApproveOutcome>>> {
    let outcome = state.tokens.approve(&req.token_address).await?;
    Ok(Json(ApiResponse::success(outcome)))
}
