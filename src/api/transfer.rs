use axum::{
    extract::{Path, State},
    Json,
};

use super::AppState;
use crate::error::Result;
use crate::models::{ApiResponse, BatchSubmitRequest, SubmissionRecord};

/// POST /api/v1/transfer/submit
///
/// Validates the rows, launches the batch call and returns the Pending
/// record; the rest of the lifecycle arrives on the status feed.
pub async fn submit(
    State(state): State<AppState>,
    Json(req): Json<BatchSubmitRequest>,
) -> Result<Json<ApiResponse<SubmissionRecord>>> {
    let record = state.submitter.submit(req).await?;
    Ok(Json(ApiResponse::success(record)))
}

/// GET /api/v1/transfer/status/{submission_id}
pub async fn status(
    State(state): State<AppState>,
    Path(submission_id): Path<String>,
) -> Result<Json<ApiResponse<SubmissionRecord>>> {
    let record = state.submitter.status(&submission_id).await?;
    Ok(Json(ApiResponse::success(record)))
}
