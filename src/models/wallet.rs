use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Supported wallet kinds. `Host` is the wallet injected by the embedding
/// host app; everything else is a regular injected browser wallet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WalletKind {
    Metamask,
    Coinbase,
    Rainbow,
    Trust,
    Host,
}

impl WalletKind {
    pub fn all() -> Vec<Self> {
        vec![
            Self::Metamask,
            Self::Coinbase,
            Self::Rainbow,
            Self::Trust,
            Self::Host,
        ]
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Metamask => "MetaMask",
            Self::Coinbase => "Coinbase Wallet",
            Self::Rainbow => "Rainbow",
            Self::Trust => "Trust Wallet",
            Self::Host => "Farcaster Wallet",
        }
    }

    pub fn is_host(&self) -> bool {
        matches!(self, Self::Host)
    }
}

impl std::fmt::Display for WalletKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SessionInfo {
    pub kind: WalletKind,
    pub wallet_label: String,
    pub address: String,
    pub short_address: String,
    pub chain_id: u64,
    pub connected_at: DateTime<Utc>,
}
