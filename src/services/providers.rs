use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use ethers::middleware::SignerMiddleware;
use ethers::providers::{Http, Middleware, Provider};
use ethers::signers::{LocalWallet, Signer};
use ethers::types::{Address, TransactionReceipt, TransactionRequest, TxHash, U64};
use tokio::time::{sleep, Duration};

use crate::{
    chains::ChainRegistry,
    config::Config,
    constants::{DEFAULT_RECEIPT_POLL_ATTEMPTS, DEFAULT_RECEIPT_POLL_INTERVAL_MS},
    error::{AppError, Result},
    models::WalletKind,
    services::host::HostRuntime,
};

/// A live signing capability bound to one address on one chain. Resolved
/// once when the session is created; call sites never re-probe it.
#[async_trait]
pub trait ActiveSigner: Send + Sync {
    fn address(&self) -> Address;
    fn chain_id(&self) -> u64;
    async fn send_transaction(&self, tx: TransactionRequest) -> Result<TxHash>;
    async fn transaction_receipt(&self, tx_hash: TxHash) -> Result<Option<TransactionReceipt>>;
}

pub struct ConnectedWallet {
    pub address: Address,
    pub chain_id: u64,
    pub signer: Arc<dyn ActiveSigner>,
}

/// One named way of establishing a wallet session.
#[async_trait]
pub trait WalletConnector: Send + Sync {
    fn kind(&self) -> WalletKind;
    async fn connect(&self) -> Result<ConnectedWallet>;
}

/// Connector for injected-style wallets: a JSON-RPC endpoint plus a local
/// signing key standing in for the browser extension.
pub struct RpcWalletConnector {
    kind: WalletKind,
    rpc_url: String,
    private_key: String,
}

impl RpcWalletConnector {
    pub fn new(kind: WalletKind, rpc_url: String, private_key: String) -> Self {
        Self {
            kind,
            rpc_url,
            private_key,
        }
    }
}

#[async_trait]
impl WalletConnector for RpcWalletConnector {
    fn kind(&self) -> WalletKind {
        self.kind
    }

    async fn connect(&self) -> Result<ConnectedWallet> {
        let provider = Provider::<Http>::try_from(self.rpc_url.as_str())
            .map_err(|e| AppError::ProviderNotFound(format!("{}: {e}", self.kind.label())))?;
        let chain_id = provider
            .get_chainid()
            .await
            .map_err(|e| AppError::from_provider(e.to_string()))?
            .as_u64();

        let wallet: LocalWallet = self
            .private_key
            .parse()
            .map_err(|e| AppError::ProviderNotFound(format!("{}: {e}", self.kind.label())))?;
        let wallet = wallet.with_chain_id(chain_id);
        let address = wallet.address();

        let client = SignerMiddleware::new(provider, wallet);
        Ok(ConnectedWallet {
            address,
            chain_id,
            signer: Arc::new(RpcSigner {
                client: Arc::new(client),
                address,
                chain_id,
            }),
        })
    }
}

struct RpcSigner {
    client: Arc<SignerMiddleware<Provider<Http>, LocalWallet>>,
    address: Address,
    chain_id: u64,
}

#[async_trait]
impl ActiveSigner for RpcSigner {
    fn address(&self) -> Address {
        self.address
    }

    fn chain_id(&self) -> u64 {
        self.chain_id
    }

    async fn send_transaction(&self, tx: TransactionRequest) -> Result<TxHash> {
        let pending = self
            .client
            .send_transaction(tx, None)
            .await
            .map_err(|e| AppError::from_provider(e.to_string()))?;
        Ok(*pending)
    }

    async fn transaction_receipt(&self, tx_hash: TxHash) -> Result<Option<TransactionReceipt>> {
        self.client
            .get_transaction_receipt(tx_hash)
            .await
            .map_err(|e| AppError::from_provider(e.to_string()))
    }
}

/// Connector for the wallet injected by the embedding host, reached through
/// the host runtime's wallet provider capability.
pub struct HostWalletConnector {
    host: Arc<dyn HostRuntime>,
}

impl HostWalletConnector {
    pub fn new(host: Arc<dyn HostRuntime>) -> Self {
        Self { host }
    }
}

#[async_trait]
impl WalletConnector for HostWalletConnector {
    fn kind(&self) -> WalletKind {
        WalletKind::Host
    }

    async fn connect(&self) -> Result<ConnectedWallet> {
        if !self.host.discover().await.is_present() {
            return Err(AppError::ProviderNotFound(
                WalletKind::Host.label().to_string(),
            ));
        }

        let accounts = self
            .host
            .wallet_request("eth_requestAccounts", serde_json::json!([]))
            .await?;
        let address = accounts
            .as_array()
            .and_then(|list| list.first())
            .and_then(|value| value.as_str())
            .ok_or_else(|| AppError::Provider("Host wallet returned no accounts".to_string()))?;
        let address: Address = address
            .parse()
            .map_err(|e| AppError::Provider(format!("Malformed host account: {e}")))?;

        let chain_hex = self
            .host
            .wallet_request("eth_chainId", serde_json::json!([]))
            .await?;
        let chain_id = parse_hex_u64(chain_hex.as_str().unwrap_or_default())?;

        Ok(ConnectedWallet {
            address,
            chain_id,
            signer: Arc::new(HostSigner {
                host: self.host.clone(),
                address,
                chain_id,
            }),
        })
    }
}

struct HostSigner {
    host: Arc<dyn HostRuntime>,
    address: Address,
    chain_id: u64,
}

#[async_trait]
impl ActiveSigner for HostSigner {
    fn address(&self) -> Address {
        self.address
    }

    fn chain_id(&self) -> u64 {
        self.chain_id
    }

    async fn send_transaction(&self, tx: TransactionRequest) -> Result<TxHash> {
        let tx = tx.from(self.address);
        let payload = serde_json::to_value(&tx)
            .map_err(|e| AppError::Internal(format!("Unserializable transaction: {e}")))?;

        let result = self
            .host
            .wallet_request("eth_sendTransaction", serde_json::json!([payload]))
            .await?;
        let hash = result
            .as_str()
            .ok_or_else(|| AppError::Provider("Host wallet returned no tx hash".to_string()))?;
        hash.parse::<TxHash>()
            .map_err(|e| AppError::Provider(format!("Malformed tx hash from host: {e}")))
    }

    async fn transaction_receipt(&self, tx_hash: TxHash) -> Result<Option<TransactionReceipt>> {
        let result = self
            .host
            .wallet_request(
                "eth_getTransactionReceipt",
                serde_json::json!([format!("{tx_hash:?}")]),
            )
            .await?;
        if result.is_null() {
            return Ok(None);
        }
        let receipt: TransactionReceipt = serde_json::from_value(result)
            .map_err(|e| AppError::Provider(format!("Malformed receipt from host: {e}")))?;
        Ok(Some(receipt))
    }
}

fn parse_hex_u64(value: &str) -> Result<u64> {
    let trimmed = value.trim().trim_start_matches("0x");
    if trimmed.is_empty() {
        return Err(AppError::Provider("Empty chain id".to_string()));
    }
    u64::from_str_radix(trimmed, 16)
        .map_err(|e| AppError::Provider(format!("Invalid chain id {value}: {e}")))
}

/// Connectors keyed by wallet kind, built once at startup. A kind without a
/// registered connector means the underlying provider object is absent.
#[derive(Default)]
pub struct ProviderRegistry {
    connectors: HashMap<WalletKind, Arc<dyn WalletConnector>>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, connector: Arc<dyn WalletConnector>) {
        self.connectors.insert(connector.kind(), connector);
    }

    pub fn get(&self, kind: WalletKind) -> Result<Arc<dyn WalletConnector>> {
        self.connectors
            .get(&kind)
            .cloned()
            .ok_or_else(|| AppError::ProviderNotFound(kind.label().to_string()))
    }

    /// Kinds with a live connector, in presentation order.
    pub fn kinds(&self) -> Vec<WalletKind> {
        WalletKind::all()
            .into_iter()
            .filter(|kind| self.connectors.contains_key(kind))
            .collect()
    }

    pub fn from_config(
        config: &Config,
        chains: &ChainRegistry,
        host: Arc<dyn HostRuntime>,
    ) -> Result<Self> {
        let mut registry = Self::new();

        if let Some(private_key) = &config.wallet_private_key {
            let rpc_url = chains.get(config.default_chain_id)?.rpc_url.clone();
            for kind in WalletKind::all() {
                if kind.is_host() {
                    continue;
                }
                registry.register(Arc::new(RpcWalletConnector::new(
                    kind,
                    rpc_url.clone(),
                    private_key.clone(),
                )));
            }
        }

        if config.host_bridge_url.is_some() {
            registry.register(Arc::new(HostWalletConnector::new(host)));
        }

        Ok(registry)
    }
}

/// Poll for the transaction receipt until it lands or attempts run out.
pub async fn wait_for_receipt(signer: &dyn ActiveSigner, tx_hash: TxHash) -> Result<()> {
    let poll_attempts = std::env::var("RECEIPT_POLL_ATTEMPTS")
        .ok()
        .and_then(|value| value.parse::<usize>().ok())
        .filter(|value| *value > 0)
        .unwrap_or(DEFAULT_RECEIPT_POLL_ATTEMPTS);
    let poll_interval_ms = std::env::var("RECEIPT_POLL_INTERVAL_MS")
        .ok()
        .and_then(|value| value.parse::<u64>().ok())
        .filter(|value| *value > 0)
        .unwrap_or(DEFAULT_RECEIPT_POLL_INTERVAL_MS);

    wait_for_receipt_with(signer, tx_hash, poll_attempts, poll_interval_ms).await
}

async fn wait_for_receipt_with(
    signer: &dyn ActiveSigner,
    tx_hash: TxHash,
    poll_attempts: usize,
    poll_interval_ms: u64,
) -> Result<()> {
    let mut last_error = String::new();

    for attempt in 0..poll_attempts {
        match signer.transaction_receipt(tx_hash).await {
            Ok(Some(receipt)) => {
                if receipt.status == Some(U64::zero()) {
                    return Err(AppError::Provider(format!(
                        "Transaction {tx_hash:?} reverted on-chain"
                    )));
                }
                return Ok(());
            }
            Ok(None) => {
                last_error = "receipt not yet available".to_string();
            }
            Err(err) => {
                last_error = err.to_string();
            }
        }
        if attempt + 1 < poll_attempts {
            sleep(Duration::from_millis(poll_interval_ms)).await;
        }
    }

    Err(AppError::Provider(format!(
        "Transaction not confirmed: {last_error}"
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct ScriptedSigner {
        receipts: Mutex<Vec<Option<TransactionReceipt>>>,
    }

    impl ScriptedSigner {
        fn new(mut receipts: Vec<Option<TransactionReceipt>>) -> Self {
            receipts.reverse();
            Self {
                receipts: Mutex::new(receipts),
            }
        }
    }

    #[async_trait]
    impl ActiveSigner for ScriptedSigner {
        fn address(&self) -> Address {
            Address::zero()
        }

        fn chain_id(&self) -> u64 {
            8453
        }

        async fn send_transaction(&self, _tx: TransactionRequest) -> Result<TxHash> {
            Ok(TxHash::zero())
        }

        async fn transaction_receipt(
            &self,
            _tx_hash: TxHash,
        ) -> Result<Option<TransactionReceipt>> {
            Ok(self.receipts.lock().unwrap().pop().unwrap_or(None))
        }
    }

    fn receipt_with_status(status: u64) -> TransactionReceipt {
        TransactionReceipt {
            status: Some(U64::from(status)),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn receipt_poll_succeeds_after_a_miss() {
        // Memastikan polling receipt lanjut setelah percobaan kosong
        let signer = ScriptedSigner::new(vec![None, Some(receipt_with_status(1))]);
        let result = wait_for_receipt_with(&signer, TxHash::zero(), 3, 1).await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn reverted_receipt_is_an_error() {
        let signer = ScriptedSigner::new(vec![Some(receipt_with_status(0))]);
        let result = wait_for_receipt_with(&signer, TxHash::zero(), 3, 1).await;
        match result {
            Err(AppError::Provider(msg)) => assert!(msg.contains("reverted")),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[tokio::test]
    async fn exhausted_attempts_report_the_last_error() {
        let signer = ScriptedSigner::new(vec![None, None]);
        let result = wait_for_receipt_with(&signer, TxHash::zero(), 2, 1).await;
        match result {
            Err(AppError::Provider(msg)) => assert!(msg.contains("not confirmed")),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn registry_reports_missing_provider() {
        // Memastikan kind tanpa connector menghasilkan ProviderNotFound
        let registry = ProviderRegistry::new();
        match registry.get(WalletKind::Metamask) {
            Err(AppError::ProviderNotFound(name)) => assert_eq!(name, "MetaMask"),
            _other => panic!("unexpected result"),
        }
    }

    #[test]
    fn hex_chain_ids_parse() {
        assert_eq!(parse_hex_u64("0x2105").unwrap(), 8453);
        assert_eq!(parse_hex_u64("0xa").unwrap(), 10);
        assert!(parse_hex_u64("").is_err());
    }
}
