use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Invalid recipient row {index}: {reason}")]
    InvalidRow { index: usize, reason: String },

    #[error("Unsupported chain: {0}")]
    UnsupportedChain(u64),

    #[error("Wallet provider not found: {0}")]
    ProviderNotFound(String),

    #[error("No active wallet session")]
    NoActiveSession,

    #[error("{0} is not available inside the host app")]
    UnsupportedInHostMode(String),

    #[error("Wallet connection already in progress")]
    ConnectionInProgress,

    #[error("A batch submission is already pending")]
    SubmissionInProgress,

    #[error("User rejected the request")]
    UserCancelled,

    #[error("Wallet provider error: {0}")]
    Provider(String),

    #[error("Host runtime error: {0}")]
    HostRuntime(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl AppError {
    /// Wrap an error coming out of a wallet/host SDK, keeping the original
    /// message for diagnostics. A user rejection (EIP-1193 code 4001) is
    /// surfaced as its own variant so callers can tell cancellation apart
    /// from network or contract failure.
    pub fn from_provider(message: impl Into<String>) -> Self {
        let message = message.into();
        if is_user_rejection(&message) {
            AppError::UserCancelled
        } else {
            AppError::Provider(message)
        }
    }

    pub fn is_cancellation(&self) -> bool {
        matches!(self, AppError::UserCancelled)
    }
}

fn is_user_rejection(message: &str) -> bool {
    let lower = message.to_ascii_lowercase();
    lower.contains("user rejected")
        || lower.contains("user denied")
        || lower.contains("code: 4001")
        || lower.contains("\"code\":4001")
}

#[derive(Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: ErrorDetail,
}

#[derive(Serialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match self {
            AppError::InvalidRow { .. } => {
                (StatusCode::BAD_REQUEST, "INVALID_ROW", self.to_string())
            }
            AppError::UnsupportedChain(_) => (
                StatusCode::BAD_REQUEST,
                "UNSUPPORTED_CHAIN",
                self.to_string(),
            ),
            AppError::ProviderNotFound(_) => (
                StatusCode::NOT_FOUND,
                "PROVIDER_NOT_FOUND",
                self.to_string(),
            ),
            AppError::NoActiveSession => (
                StatusCode::BAD_REQUEST,
                "NO_ACTIVE_SESSION",
                self.to_string(),
            ),
            AppError::UnsupportedInHostMode(_) => (
                StatusCode::BAD_REQUEST,
                "UNSUPPORTED_IN_HOST_MODE",
                self.to_string(),
            ),
            AppError::ConnectionInProgress => (
                StatusCode::CONFLICT,
                "CONNECTION_IN_PROGRESS",
                self.to_string(),
            ),
            AppError::SubmissionInProgress => (
                StatusCode::CONFLICT,
                "SUBMISSION_IN_PROGRESS",
                self.to_string(),
            ),
            AppError::UserCancelled => {
                (StatusCode::BAD_REQUEST, "USER_CANCELLED", self.to_string())
            }
            AppError::Provider(ref msg) => (StatusCode::BAD_GATEWAY, "PROVIDER_ERROR", msg.clone()),
            AppError::HostRuntime(ref msg) => {
                (StatusCode::BAD_GATEWAY, "HOST_RUNTIME_ERROR", msg.clone())
            }
            AppError::NotFound(ref msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone()),
            AppError::BadRequest(ref msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg.clone()),
            AppError::Internal(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                self.to_string(),
            ),
        };

        let body = Json(ErrorResponse {
            success: false,
            error: ErrorDetail {
                code: code.to_string(),
                message,
                details: None,
            },
        });

        (status, body).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
