use std::collections::HashMap;

use ethers::types::Address;
use serde::Serialize;

use crate::error::{AppError, Result};

/// Per-network configuration for the batch-send contract. Static, trusted
/// data loaded at startup; never mutated at runtime.
#[derive(Debug, Clone, Serialize)]
pub struct ChainProfile {
    pub chain_id: u64,
    pub display_name: String,
    pub batch_contract: Address,
    pub rpc_url: String,
}

// chain id, display name, batch contract, default RPC endpoint
const PROFILE_TABLE: &[(u64, &str, &str, &str)] = &[
    (
        8453,
        "Base",
        "0x74a2c6466d98253ca932fe6a6ccb811d4d7d5784",
        "https://mainnet.base.org",
    ),
    (
        10,
        "Optimism",
        "0x5e86e9cd50e7f64b692b90fae1487d2f6ed1aba9",
        "https://mainnet.optimism.io",
    ),
    (
        42161,
        "Arbitrum",
        "0x5e86e9cd50e7f64b692b90fae1487d2f6ed1aba9",
        "https://arb1.arbitrum.io/rpc",
    ),
    (
        1868,
        "Soneium",
        "0x84e4dd821c8f848470fc49def3b14fc870fa97f0",
        "https://rpc.soneium.org",
    ),
    (
        130,
        "Unichain",
        "0x84e4dd821c8f848470fc49def3b14fc870fa97f0",
        "https://mainnet.unichain.org",
    ),
    (
        57073,
        "Ink",
        "0x84e4dd821c8f848470fc49def3b14fc870fa97f0",
        "https://rpc-gel.inkonchain.com",
    ),
];

#[derive(Debug, Clone)]
pub struct ChainRegistry {
    profiles: HashMap<u64, ChainProfile>,
}

impl ChainRegistry {
    /// Build the registry from the static table. RPC endpoints can be
    /// overridden per chain with `RPC_URL_<chain_id>` env vars.
    pub fn from_env() -> Result<Self> {
        let mut profiles = HashMap::new();
        for (chain_id, display_name, contract, default_rpc) in PROFILE_TABLE {
            let batch_contract: Address = contract.parse().map_err(|e| {
                AppError::Internal(format!("Invalid batch contract for chain {chain_id}: {e}"))
            })?;
            let rpc_url = std::env::var(format!("RPC_URL_{chain_id}"))
                .unwrap_or_else(|_| default_rpc.to_string());

            profiles.insert(
                *chain_id,
                ChainProfile {
                    chain_id: *chain_id,
                    display_name: display_name.to_string(),
                    batch_contract,
                    rpc_url,
                },
            );
        }
        Ok(Self { profiles })
    }

    pub fn get(&self, chain_id: u64) -> Result<&ChainProfile> {
        self.profiles
            .get(&chain_id)
            .ok_or(AppError::UnsupportedChain(chain_id))
    }

    pub fn contains(&self, chain_id: u64) -> bool {
        self.profiles.contains_key(&chain_id)
    }

    pub fn all(&self) -> Vec<&ChainProfile> {
        let mut profiles: Vec<&ChainProfile> = self.profiles.values().collect();
        profiles.sort_by_key(|p| p.chain_id);
        profiles
    }

    pub fn display_name(&self, chain_id: u64) -> String {
        self.profiles
            .get(&chain_id)
            .map(|p| p.display_name.clone())
            .unwrap_or_else(|| format!("Chain {chain_id}"))
    }
}
