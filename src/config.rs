use ethers::types::U256;
use ethers::utils::parse_ether;
use serde::Deserialize;
use std::env;

use crate::constants::{
    DEFAULT_APP_SHARE_URL, DEFAULT_BATCH_FEE_ETH, DEFAULT_BATCH_GAS_LIMIT, DEFAULT_CHAIN_ID,
    HOST_READY_TIMEOUT_MS,
};

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    // Server
    pub host: String,
    pub port: u16,
    pub environment: String,

    // Batch transfer
    pub default_chain_id: u64,
    pub batch_fee_eth: String,
    pub batch_gas_limit: u64,

    // Signing
    pub wallet_private_key: Option<String>,

    // Host runtime bridge
    pub host_bridge_url: Option<String>,
    pub host_ready_timeout_ms: u64,

    // Sharing & analytics
    pub app_share_url: String,
    pub analytics_endpoint: Option<String>,

    // CORS
    pub cors_allowed_origins: String,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenv::dotenv().ok();

        Ok(Config {
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()?,
            environment: env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string()),

            default_chain_id: env::var("DEFAULT_CHAIN_ID")
                .unwrap_or_else(|_| DEFAULT_CHAIN_ID.to_string())
                .parse()?,
            batch_fee_eth: env::var("BATCH_FEE_ETH")
                .unwrap_or_else(|_| DEFAULT_BATCH_FEE_ETH.to_string()),
            batch_gas_limit: env::var("BATCH_GAS_LIMIT")
                .unwrap_or_else(|_| DEFAULT_BATCH_GAS_LIMIT.to_string())
                .parse()?,

            wallet_private_key: env::var("WALLET_PRIVATE_KEY").ok(),

            host_bridge_url: env::var("HOST_BRIDGE_URL").ok(),
            host_ready_timeout_ms: env::var("HOST_READY_TIMEOUT_MS")
                .unwrap_or_else(|_| HOST_READY_TIMEOUT_MS.to_string())
                .parse()?,

            app_share_url: env::var("APP_SHARE_URL")
                .unwrap_or_else(|_| DEFAULT_APP_SHARE_URL.to_string()),
            analytics_endpoint: env::var("ANALYTICS_ENDPOINT").ok(),

            cors_allowed_origins: env::var("CORS_ALLOWED_ORIGINS")
                .unwrap_or_else(|_| "*".to_string()),
        })
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if parse_ether(self.batch_fee_eth.as_str()).is_err() {
            anyhow::bail!("BATCH_FEE_ETH is not a valid decimal amount");
        }
        if self.batch_gas_limit == 0 {
            anyhow::bail!("BATCH_GAS_LIMIT must be > 0");
        }

        if self.wallet_private_key.is_none() && self.host_bridge_url.is_none() {
            tracing::warn!(
                "No signing path configured; set WALLET_PRIVATE_KEY or HOST_BRIDGE_URL"
            );
        }
        if let Some(key) = &self.wallet_private_key {
            if key.contains("123456") {
                tracing::warn!("Detected dev credentials in config");
            }
        }
        if self.host_ready_timeout_ms < 1_000 {
            tracing::warn!("HOST_READY_TIMEOUT_MS below 1s; splash handshake may fire early");
        }
        if self.cors_allowed_origins.trim().is_empty() {
            tracing::warn!("CORS_ALLOWED_ORIGINS is empty; requests may be blocked");
        }

        Ok(())
    }

    /// Flat protocol fee in wei, added to every batch submission.
    pub fn fee_wei(&self) -> crate::error::Result<U256> {
        parse_ether(self.batch_fee_eth.as_str()).map_err(|e| {
            crate::error::AppError::Internal(format!("Invalid batch fee configured: {e}"))
        })
    }

    pub fn is_dev(&self) -> bool {
        self.environment == "development" || self.environment == "test"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_config() -> Config {
        Config {
            host: "0.0.0.0".into(),
            port: 3000,
            environment: "test".into(),
            default_chain_id: 8453,
            batch_fee_eth: "0.001".into(),
            batch_gas_limit: 500_000,
            wallet_private_key: None,
            host_bridge_url: None,
            host_ready_timeout_ms: 5_000,
            app_share_url: DEFAULT_APP_SHARE_URL.into(),
            analytics_endpoint: None,
            cors_allowed_origins: "*".into(),
        }
    }

    #[test]
    fn fee_wei_converts_default_fee() {
        // Memastikan fee default 0.001 ETH menjadi wei tanpa pembulatan
        let config = base_config();
        assert_eq!(config.fee_wei().unwrap(), U256::from(1_000_000_000_000_000u64));
    }

    #[test]
    fn validate_rejects_bad_fee() {
        let mut config = base_config();
        config.batch_fee_eth = "not-a-number".into();
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_accepts_base_config() {
        assert!(base_config().validate().is_ok());
    }
}
