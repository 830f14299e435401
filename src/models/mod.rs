// src/models/mod.rs
pub mod transfer;
pub mod wallet;

// Re-export commonly used types so other modules can use `crate::models::X`
pub use transfer::{
    ApiResponse, AssetKind, BatchSubmitRequest, RecipientEntry, StatusEvent, SubmissionRecord,
    SubmissionStatus, TokenInfo, TransferRequest,
};
pub use wallet::{SessionInfo, WalletKind};
