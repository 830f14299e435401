use chrono::{DateTime, Utc};
use ethers::types::{Address, U256};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetKind {
    Eth,
    Erc20,
}

/// One form row as entered by the user: raw strings, validated later.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecipientEntry {
    pub address: String,
    pub amount: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BatchSubmitRequest {
    pub asset: AssetKind,
    #[serde(default)]
    pub token_address: Option<String>,
    /// Decimal precision used to parse the row amounts for a token batch.
    /// Defaults to 18 when absent, matching the native asset.
    #[serde(default)]
    pub token_decimals: Option<u8>,
    pub rows: Vec<RecipientEntry>,
}

/// A fully validated batch, immutable once constructed. Amounts are in the
/// asset's smallest unit; `call_value` is what goes on the wire with the
/// contract call (sum + fee for a native batch, fee only for a token batch).
#[derive(Debug, Clone)]
pub struct TransferRequest {
    pub asset: AssetKind,
    pub token_address: Option<Address>,
    pub recipients: Vec<Address>,
    pub amounts: Vec<U256>,
    pub fee: U256,
    pub call_value: U256,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "lowercase")]
pub enum SubmissionStatus {
    Pending,
    Submitted { tx_hash: String },
    Confirmed { tx_hash: String },
    Failed { reason: String, user_cancelled: bool },
}

impl SubmissionStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Confirmed { .. } | Self::Failed { .. })
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SubmissionRecord {
    pub submission_id: String,
    pub chain_id: u64,
    pub asset: AssetKind,
    pub recipient_count: usize,
    pub call_value_wei: String,
    pub status: SubmissionStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Payload pushed on the status feed for every lifecycle transition.
#[derive(Debug, Clone, Serialize)]
pub struct StatusEvent {
    pub submission_id: String,
    pub status: SubmissionStatus,
    pub at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TokenInfo {
    pub address: String,
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
    pub balance: String,
    pub allowance: String,
    pub needs_approval: bool,
}

#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: T,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_response_success_sets_flag() {
        // Memastikan helper ApiResponse::success mengisi flag sukses
        let response = ApiResponse::success("ok");
        assert!(response.success);
        assert_eq!(response.data, "ok");
    }

    #[test]
    fn submission_status_terminal_states() {
        // Memastikan hanya Confirmed/Failed yang terminal
        assert!(!SubmissionStatus::Pending.is_terminal());
        assert!(!SubmissionStatus::Submitted {
            tx_hash: "0x1".into()
        }
        .is_terminal());
        assert!(SubmissionStatus::Confirmed {
            tx_hash: "0x1".into()
        }
        .is_terminal());
        assert!(SubmissionStatus::Failed {
            reason: "boom".into(),
            user_cancelled: false
        }
        .is_terminal());
    }

    #[test]
    fn submission_status_serializes_with_state_tag() {
        let json = serde_json::to_string(&SubmissionStatus::Submitted {
            tx_hash: "0xabc".into(),
        })
        .unwrap();
        assert!(json.contains("\"state\":\"submitted\""));
        assert!(json.contains("\"tx_hash\":\"0xabc\""));
    }

    #[test]
    fn asset_kind_deserializes_lowercase() {
        let kind: AssetKind = serde_json::from_str("\"erc20\"").unwrap();
        assert_eq!(kind, AssetKind::Erc20);
    }
}
