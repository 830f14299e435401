use std::sync::Arc;

use ethers::providers::{Http, Provider};
use ethers::types::{Address, TransactionRequest};
use ethers::utils::format_units;
use serde::Serialize;

use crate::{
    chains::ChainRegistry,
    config::Config,
    contracts::{self, Erc20Token},
    error::{AppError, Result},
    models::TokenInfo,
    services::{providers::wait_for_receipt, session::WalletSessionManager},
};

/// Read side of the ERC-20 path: metadata, balance and allowance for the
/// token the user typed, plus the approval that gates the token batch.
pub struct TokenService {
    config: Config,
    chains: Arc<ChainRegistry>,
    sessions: Arc<WalletSessionManager>,
}

#[derive(Debug, Serialize)]
pub struct ApproveOutcome {
    pub tx_hash: String,
    pub approved_amount: String,
}

impl TokenService {
    pub fn new(
        config: Config,
        chains: Arc<ChainRegistry>,
        sessions: Arc<WalletSessionManager>,
    ) -> Self {
        Self {
            config,
            chains,
            sessions,
        }
    }

    pub async fn token_info(&self, token: &str) -> Result<TokenInfo> {
        let session = self.sessions.current().await?;
        let profile = self.chains.get(session.chain_id)?;
        let token_address = parse_token_address(token)?;

        let provider = Provider::<Http>::try_from(profile.rpc_url.as_str())
            .map_err(|e| AppError::Internal(format!("Invalid RPC URL: {e}")))?;
        let contract = Erc20Token::new(token_address, Arc::new(provider));

        let name_call = contract.name();
        let symbol_call = contract.symbol();
        let decimals_call = contract.decimals();
        let balance_call = contract.balance_of(session.address);
        let allowance_call = contract.allowance(session.address, profile.batch_contract);

        let (name, symbol, decimals, balance, allowance) = tokio::try_join!(
            name_call.call(),
            symbol_call.call(),
            decimals_call.call(),
            balance_call.call(),
            allowance_call.call(),
        )
        .map_err(|e| AppError::from_provider(e.to_string()))?;

        Ok(TokenInfo {
            address: format!("{token_address:?}"),
            name,
            symbol,
            decimals,
            balance: format_units(balance, u32::from(decimals))
                .map_err(|e| AppError::Internal(format!("Unformattable balance: {e}")))?,
            allowance: format_units(allowance, u32::from(decimals))
                .map_err(|e| AppError::Internal(format!("Unformattable allowance: {e}")))?,
            needs_approval: allowance.is_zero(),
        })
    }

    /// Approve the chain's batch contract for the user's full token balance.
    /// Refuses when there is nothing to approve.
    pub async fn approve(&self, token: &str) -> Result<ApproveOutcome> {
        let session = self.sessions.current().await?;
        let profile = self.chains.get(session.chain_id)?;
        let token_address = parse_token_address(token)?;

        let provider = Provider::<Http>::try_from(profile.rpc_url.as_str())
            .map_err(|e| AppError::Internal(format!("Invalid RPC URL: {e}")))?;
        let contract = Erc20Token::new(token_address, Arc::new(provider));

        let balance = contract
            .balance_of(session.address)
            .call()
            .await
            .map_err(|e| AppError::from_provider(e.to_string()))?;
        if balance.is_zero() {
            return Err(AppError::BadRequest("No tokens to approve".to_string()));
        }

        let calldata = contracts::encode_approve(profile.batch_contract, balance)?;
        let tx = TransactionRequest::new()
            .to(token_address)
            .from(session.address)
            .data(calldata)
            .gas(self.config.batch_gas_limit);

        let tx_hash = session.signer.send_transaction(tx).await?;
        tracing::info!("Approval transaction sent: {tx_hash:?}");
        wait_for_receipt(session.signer.as_ref(), tx_hash).await?;

        Ok(ApproveOutcome {
            tx_hash: format!("{tx_hash:?}"),
            approved_amount: balance.to_string(),
        })
    }
}

fn parse_token_address(token: &str) -> Result<Address> {
    let trimmed = token.trim();
    trimmed
        .parse()
        .map_err(|_| AppError::BadRequest(format!("Malformed token address: {trimmed}")))
}
