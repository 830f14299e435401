use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use ethers::types::{Address, Bytes, TransactionRequest, U256};
use ethers::utils::{parse_units, ParseUnits};
use tokio::sync::{broadcast, Mutex, RwLock};

use crate::{
    chains::{ChainProfile, ChainRegistry},
    config::Config,
    constants::{MAX_RECIPIENTS_PER_BATCH, NATIVE_DECIMALS},
    contracts,
    error::{AppError, Result},
    models::{
        AssetKind, BatchSubmitRequest, RecipientEntry, StatusEvent, SubmissionRecord,
        SubmissionStatus, TransferRequest,
    },
    services::{
        host::HostRuntime,
        providers::wait_for_receipt,
        session::{ActiveSession, WalletSessionManager},
        share::ShareService,
    },
};

const STATUS_FEED_CAPACITY: usize = 64;

/// Turns validated form input into a single on-chain batch call and reports
/// its lifecycle. Tracks exactly one in-flight submission at a time.
pub struct BatchSubmitter {
    config: Config,
    chains: Arc<ChainRegistry>,
    sessions: Arc<WalletSessionManager>,
    host: Arc<dyn HostRuntime>,
    share: Arc<ShareService>,
    in_flight: Mutex<Option<String>>,
    records: RwLock<HashMap<String, SubmissionRecord>>,
    events: broadcast::Sender<StatusEvent>,
}

impl BatchSubmitter {
    pub fn new(
        config: Config,
        chains: Arc<ChainRegistry>,
        sessions: Arc<WalletSessionManager>,
        host: Arc<dyn HostRuntime>,
        share: Arc<ShareService>,
    ) -> Self {
        let (events, _) = broadcast::channel(STATUS_FEED_CAPACITY);
        Self {
            config,
            chains,
            sessions,
            host,
            share,
            in_flight: Mutex::new(None),
            records: RwLock::new(HashMap::new()),
            events,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<StatusEvent> {
        self.events.subscribe()
    }

    pub async fn status(&self, submission_id: &str) -> Result<SubmissionRecord> {
        self.records
            .read()
            .await
            .get(submission_id)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("Submission {submission_id}")))
    }

    /// Validate, build and launch one batch submission. Returns the Pending
    /// record; the lifecycle continues on the status feed.
    pub async fn submit(self: &Arc<Self>, request: BatchSubmitRequest) -> Result<SubmissionRecord> {
        let session = self.sessions.current().await?;
        let fee = self.config.fee_wei()?;

        // All row validation happens before any network traffic.
        let transfer = build_transfer(&request, fee)?;
        let profile = self.chains.get(session.chain_id)?.clone();

        let submission_id = {
            let mut in_flight = self.in_flight.lock().await;
            if let Some(pending) = in_flight.as_ref() {
                tracing::debug!("Submission {pending} still pending, rejecting new attempt");
                return Err(AppError::SubmissionInProgress);
            }
            let id = new_submission_id();
            *in_flight = Some(id.clone());
            id
        };

        let now = Utc::now();
        let record = SubmissionRecord {
            submission_id: submission_id.clone(),
            chain_id: profile.chain_id,
            asset: transfer.asset,
            recipient_count: transfer.recipients.len(),
            call_value_wei: transfer.call_value.to_string(),
            status: SubmissionStatus::Pending,
            created_at: now,
            updated_at: now,
        };
        self.records
            .write()
            .await
            .insert(submission_id.clone(), record.clone());
        let _ = self.events.send(StatusEvent {
            submission_id: submission_id.clone(),
            status: SubmissionStatus::Pending,
            at: now,
        });

        tracing::info!(
            "Submitting batch {}: {} recipients on {}, {} wei attached (fee {})",
            submission_id,
            record.recipient_count,
            profile.display_name,
            record.call_value_wei,
            transfer.fee
        );

        let this = Arc::clone(self);
        let generation = session.generation;
        tokio::spawn(async move {
            this.drive(submission_id, session, profile, transfer, generation)
                .await;
        });

        Ok(record)
    }

    async fn drive(
        &self,
        submission_id: String,
        session: ActiveSession,
        profile: ChainProfile,
        transfer: TransferRequest,
        generation: u64,
    ) {
        let calldata = match build_calldata(&transfer) {
            Ok(data) => data,
            Err(e) => {
                self.finish(&submission_id, generation, failed(&e)).await;
                return;
            }
        };

        let tx = TransactionRequest::new()
            .to(profile.batch_contract)
            .from(session.address)
            .data(calldata)
            .value(transfer.call_value)
            .gas(self.config.batch_gas_limit);

        let tx_hash = match session.signer.send_transaction(tx).await {
            Ok(hash) => hash,
            Err(e) => {
                // Rejected before broadcast, e.g. the user cancelled signing.
                self.finish(&submission_id, generation, failed(&e)).await;
                return;
            }
        };

        let hash_hex = format!("{tx_hash:?}");
        let submitted = SubmissionStatus::Submitted {
            tx_hash: hash_hex.clone(),
        };
        if !self.apply(&submission_id, generation, submitted).await {
            self.clear_in_flight(&submission_id).await;
            return;
        }

        match wait_for_receipt(session.signer.as_ref(), tx_hash).await {
            Ok(()) => {
                let confirmed = SubmissionStatus::Confirmed { tx_hash: hash_hex };
                if self.finish(&submission_id, generation, confirmed).await {
                    self.celebrate(&profile, transfer.recipients.len()).await;
                }
            }
            Err(e) => {
                self.finish(&submission_id, generation, failed(&e)).await;
            }
        }
    }

    /// Apply a lifecycle transition unless the session changed underneath
    /// the submission, in which case the completion is discarded.
    async fn apply(&self, submission_id: &str, generation: u64, status: SubmissionStatus) -> bool {
        if self.sessions.generation() != generation {
            tracing::warn!(
                "Ignoring completion for {submission_id}: wallet session changed mid-flight"
            );
            return false;
        }

        let mut records = self.records.write().await;
        if let Some(record) = records.get_mut(submission_id) {
            record.status = status.clone();
            record.updated_at = Utc::now();
        }
        drop(records);

        let _ = self.events.send(StatusEvent {
            submission_id: submission_id.to_string(),
            status,
            at: Utc::now(),
        });
        true
    }

    async fn finish(&self, submission_id: &str, generation: u64, status: SubmissionStatus) -> bool {
        let applied = self.apply(submission_id, generation, status).await;
        self.clear_in_flight(submission_id).await;
        applied
    }

    async fn clear_in_flight(&self, submission_id: &str) {
        let mut in_flight = self.in_flight.lock().await;
        if in_flight.as_deref() == Some(submission_id) {
            *in_flight = None;
        }
    }

    /// Post-success affordances. Strictly best-effort: nothing in here may
    /// touch the reported transfer outcome.
    async fn celebrate(&self, profile: &ChainProfile, recipient_count: usize) {
        if let Err(e) = self
            .host
            .notify(
                "Sendwise",
                &format!(
                    "Batch transfer to {recipient_count} recipients confirmed on {}",
                    profile.display_name
                ),
            )
            .await
        {
            tracing::debug!("Host notification skipped: {e}");
        }
        self.share.track("batch_transfer_confirmed").await;
    }
}

fn failed(error: &AppError) -> SubmissionStatus {
    SubmissionStatus::Failed {
        reason: error.to_string(),
        user_cancelled: error.is_cancellation(),
    }
}

fn new_submission_id() -> String {
    format!("SUB_{}", hex::encode(rand::random::<[u8; 8]>()))
}

/// Validate every row and freeze the batch. Fails fast on the first invalid
/// row; rows are numbered from 1 the way the form shows them.
pub fn build_transfer(request: &BatchSubmitRequest, fee: U256) -> Result<TransferRequest> {
    let decimals = match request.asset {
        AssetKind::Eth => NATIVE_DECIMALS,
        AssetKind::Erc20 => request.token_decimals.unwrap_or(NATIVE_DECIMALS),
    };

    let token_address = match request.asset {
        AssetKind::Eth => None,
        AssetKind::Erc20 => {
            let raw = request
                .token_address
                .as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .ok_or_else(|| {
                    AppError::BadRequest("Token address is required for a token batch".to_string())
                })?;
            let address: Address = raw
                .parse()
                .map_err(|_| AppError::BadRequest(format!("Malformed token address: {raw}")))?;
            Some(address)
        }
    };

    let (recipients, amounts) = validate_rows(&request.rows, decimals)?;
    let call_value = compute_call_value(request.asset, &amounts, fee)?;

    Ok(TransferRequest {
        asset: request.asset,
        token_address,
        recipients,
        amounts,
        fee,
        call_value,
    })
}

pub fn validate_rows(rows: &[RecipientEntry], decimals: u8) -> Result<(Vec<Address>, Vec<U256>)> {
    if rows.is_empty() {
        return Err(AppError::BadRequest("No recipients provided".to_string()));
    }
    if rows.len() > MAX_RECIPIENTS_PER_BATCH {
        return Err(AppError::BadRequest(format!(
            "Too many recipients: {} (max {MAX_RECIPIENTS_PER_BATCH})",
            rows.len()
        )));
    }

    let mut recipients = Vec::with_capacity(rows.len());
    let mut amounts = Vec::with_capacity(rows.len());

    for (position, row) in rows.iter().enumerate() {
        let index = position + 1;

        let raw_address = row.address.trim();
        if raw_address.is_empty() {
            return Err(AppError::InvalidRow {
                index,
                reason: "empty address".to_string(),
            });
        }
        let address: Address = raw_address.parse().map_err(|_| AppError::InvalidRow {
            index,
            reason: format!("malformed address {raw_address}"),
        })?;

        let amount =
            parse_amount(row.amount.trim(), decimals).map_err(|reason| AppError::InvalidRow {
                index,
                reason,
            })?;

        recipients.push(address);
        amounts.push(amount);
    }

    Ok((recipients, amounts))
}

/// Parse a decimal literal into the asset's smallest unit. Pure integer
/// arithmetic; no floating point anywhere near amounts.
fn parse_amount(raw: &str, decimals: u8) -> std::result::Result<U256, String> {
    if raw.is_empty() {
        return Err("empty amount".to_string());
    }
    if raw.starts_with('-') {
        return Err("amount must be positive".to_string());
    }

    let parsed =
        parse_units(raw, u32::from(decimals)).map_err(|e| format!("invalid amount: {e}"))?;
    let value = match parsed {
        ParseUnits::U256(value) => value,
        ParseUnits::I256(_) => return Err("amount must be positive".to_string()),
    };
    if value.is_zero() {
        return Err("amount must be positive".to_string());
    }
    Ok(value)
}

/// Native batches attach the recipient sum plus the flat fee; token batches
/// attach the fee only (the token amounts move inside the contract).
pub fn compute_call_value(asset: AssetKind, amounts: &[U256], fee: U256) -> Result<U256> {
    match asset {
        AssetKind::Eth => {
            let mut total = fee;
            for amount in amounts {
                total = total.checked_add(*amount).ok_or_else(|| {
                    AppError::BadRequest("Batch total overflows the value field".to_string())
                })?;
            }
            Ok(total)
        }
        AssetKind::Erc20 => Ok(fee),
    }
}

fn build_calldata(transfer: &TransferRequest) -> Result<Bytes> {
    match transfer.asset {
        AssetKind::Eth => contracts::encode_batch_send(&transfer.recipients, &transfer.amounts),
        AssetKind::Erc20 => {
            let token = transfer.token_address.ok_or_else(|| {
                AppError::Internal("Token batch constructed without a token address".to_string())
            })?;
            contracts::encode_batch_send_erc20(token, &transfer.recipients, &transfer.amounts)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::DEFAULT_APP_SHARE_URL;
    use crate::models::WalletKind;
    use crate::services::host::{DiscoveryOutcome, DiscoveryReport, HostRuntime};
    use crate::services::providers::{
        ActiveSigner, ConnectedWallet, ProviderRegistry, WalletConnector,
    };
    use async_trait::async_trait;
    use ethers::types::{TransactionReceipt, TxHash, U64};
    use ethers::utils::parse_ether;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex as StdMutex;
    use tokio::sync::Notify;
    use tokio::time::{sleep, Duration};

    fn test_config() -> Config {
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

    struct ScriptedSigner {
        address: Address,
        chain_id: u64,
        fail_send: Option<String>,
        gate: Option<Arc<Notify>>,
        sent: Arc<StdMutex<Vec<TransactionRequest>>>,
    }

    impl ScriptedSigner {
        fn happy(chain_id: u64) -> Self {
            Self {
                address: Address::from([0x42; 20]),
                chain_id,
                fail_send: None,
                gate: None,
                sent: Arc::new(StdMutex::new(Vec::new())),
            }
        }
    }

    #[async_trait]
    impl ActiveSigner for ScriptedSigner {
        fn address(&self) -> Address {
            self.address
        }

        fn chain_id(&self) -> u64 {
            self.chain_id
        }

        async fn send_transaction(&self, tx: TransactionRequest) -> Result<TxHash> {
            if let Some(gate) = &self.gate {
                gate.notified().await;
            }
            self.sent.lock().unwrap().push(tx);
            if let Some(message) = &self.fail_send {
                return Err(AppError::from_provider(message.clone()));
            }
            Ok(TxHash::from([0x77u8; 32]))
        }

        async fn transaction_receipt(
            &self,
            _tx_hash: TxHash,
        ) -> Result<Option<TransactionReceipt>> {
            Ok(Some(TransactionReceipt {
                status: Some(U64::one()),
                ..Default::default()
            }))
        }
    }

    struct FixedConnector {
        signer: Arc<ScriptedSigner>,
    }

    #[async_trait]
    impl WalletConnector for FixedConnector {
        fn kind(&self) -> WalletKind {
            WalletKind::Metamask
        }

        async fn connect(&self) -> Result<ConnectedWallet> {
            Ok(ConnectedWallet {
                address: self.signer.address,
                chain_id: self.signer.chain_id,
                signer: self.signer.clone(),
            })
        }
    }

    struct NoisyHost {
        fail_notify: bool,
        notify_calls: AtomicUsize,
    }

    #[async_trait]
    impl HostRuntime for NoisyHost {
        async fn discover(&self) -> DiscoveryReport {
            DiscoveryReport {
                outcome: DiscoveryOutcome::NotPresent,
                attempts: Vec::new(),
            }
        }

        async fn signal_ready(&self) -> Result<()> {
            Ok(())
        }

        async fn notify(&self, _title: &str, _body: &str) -> Result<()> {
            self.notify_calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_notify {
                Err(AppError::HostRuntime("notification pipe burst".to_string()))
            } else {
                Ok(())
            }
        }

        async fn wallet_request(
            &self,
            _method: &str,
            _params: serde_json::Value,
        ) -> Result<serde_json::Value> {
            Ok(serde_json::Value::Null)
        }
    }

    struct Harness {
        submitter: Arc<BatchSubmitter>,
        sessions: Arc<WalletSessionManager>,
        signer: Arc<ScriptedSigner>,
        host: Arc<NoisyHost>,
    }

    async fn harness_with(signer: ScriptedSigner, fail_notify: bool) -> Harness {
        let signer = Arc::new(signer);
        let mut registry = ProviderRegistry::new();
        registry.register(Arc::new(FixedConnector {
            signer: signer.clone(),
        }));

        let sessions = Arc::new(WalletSessionManager::new(registry));
        sessions.connect(WalletKind::Metamask).await.unwrap();

        let host = Arc::new(NoisyHost {
            fail_notify,
            notify_calls: AtomicUsize::new(0),
        });
        let config = test_config();
        let submitter = Arc::new(BatchSubmitter::new(
            config.clone(),
            Arc::new(ChainRegistry::from_env().unwrap()),
            sessions.clone(),
            host.clone(),
            Arc::new(ShareService::new(config)),
        ));

        Harness {
            submitter,
            sessions,
            signer,
            host,
        }
    }

    fn rows(entries: &[(&str, &str)]) -> Vec<RecipientEntry> {
        entries
            .iter()
            .map(|(address, amount)| RecipientEntry {
                address: address.to_string(),
                amount: amount.to_string(),
            })
            .collect()
    }

    fn eth_request(entries: &[(&str, &str)]) -> BatchSubmitRequest {
        BatchSubmitRequest {
            asset: AssetKind::Eth,
            token_address: None,
            token_decimals: None,
            rows: rows(entries),
        }
    }

    async fn wait_terminal(submitter: &Arc<BatchSubmitter>, id: &str) -> SubmissionStatus {
        for _ in 0..100 {
            let record = submitter.status(id).await.unwrap();
            if record.status.is_terminal() {
                return record.status;
            }
            sleep(Duration::from_millis(10)).await;
        }
        panic!("submission {id} never reached a terminal status");
    }

    const ADDR_A: &str = "0xaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa1111";
    const ADDR_B: &str = "0xbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbb2222";

    #[test]
    fn native_total_is_exact_for_a_thousand_rows() {
        // Memastikan penjumlahan 1000 baris presisi penuh tanpa float
        let entries: Vec<RecipientEntry> = (0..1000)
            .map(|i| RecipientEntry {
                address: format!("0x{:040x}", i + 1),
                amount: "1.5".to_string(),
            })
            .collect();

        let fee: U256 = parse_ether("0.001").unwrap();
        let (_, amounts) = validate_rows(&entries, NATIVE_DECIMALS).unwrap();
        let total = compute_call_value(AssetKind::Eth, &amounts, fee).unwrap();

        let per_row = U256::from(1_500_000_000_000_000_000u64);
        assert_eq!(total, per_row * U256::from(1000u64) + fee);
    }

    #[test]
    fn value_matches_the_two_row_example() {
        // Memastikan 1.0 + 2.5 + fee 0.001 = 3.501 ETH dalam wei
        let fee: U256 = parse_ether("0.001").unwrap();
        let request = eth_request(&[(ADDR_A, "1.0"), (ADDR_B, "2.5")]);
        let transfer = build_transfer(&request, fee).unwrap();

        assert_eq!(transfer.call_value, parse_ether("3.501").unwrap());
        assert_eq!(transfer.recipients.len(), 2);
        assert_eq!(transfer.amounts[0], parse_ether("1.0").unwrap());
        assert_eq!(transfer.amounts[1], parse_ether("2.5").unwrap());

        let calldata = build_calldata(&transfer).unwrap();
        assert_eq!(
            &calldata[..4],
            ethers::utils::id("batchSend(address[],uint256[])").as_slice()
        );
    }

    #[test]
    fn token_batch_attaches_the_fee_only() {
        let fee: U256 = parse_ether("0.001").unwrap();
        let request = BatchSubmitRequest {
            asset: AssetKind::Erc20,
            token_address: Some("0xcccccccccccccccccccccccccccccccccccc3333".to_string()),
            token_decimals: Some(6),
            rows: rows(&[(ADDR_A, "12.5")]),
        };
        let transfer = build_transfer(&request, fee).unwrap();

        assert_eq!(transfer.call_value, fee);
        assert_eq!(transfer.amounts[0], U256::from(12_500_000u64));

        let calldata = build_calldata(&transfer).unwrap();
        assert_eq!(
            &calldata[..4],
            ethers::utils::id("batchSendERC20(address,address[],uint256[])").as_slice()
        );
    }

    #[test]
    fn first_invalid_row_fails_fast() {
        // Memastikan baris pertama yang invalid menghentikan validasi
        let entries = rows(&[(ADDR_A, "1.0"), ("not-an-address", "2.0"), ("", "3.0")]);
        match validate_rows(&entries, NATIVE_DECIMALS) {
            Err(AppError::InvalidRow { index, reason }) => {
                assert_eq!(index, 2);
                assert!(reason.contains("malformed address"));
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn zero_and_negative_amounts_are_invalid() {
        let entries = rows(&[(ADDR_A, "0")]);
        assert!(matches!(
            validate_rows(&entries, NATIVE_DECIMALS),
            Err(AppError::InvalidRow { index: 1, .. })
        ));

        let entries = rows(&[(ADDR_A, "-1.0")]);
        assert!(matches!(
            validate_rows(&entries, NATIVE_DECIMALS),
            Err(AppError::InvalidRow { index: 1, .. })
        ));
    }

    #[test]
    fn empty_batch_is_rejected() {
        assert!(matches!(
            validate_rows(&[], NATIVE_DECIMALS),
            Err(AppError::BadRequest(_))
        ));
    }

    #[tokio::test]
    async fn invalid_row_makes_no_network_call() {
        // Memastikan InvalidRow terjadi tanpa satu pun call jaringan
        let harness = harness_with(ScriptedSigner::happy(8453), false).await;
        let request = eth_request(&[(ADDR_A, "1.0"), ("bogus", "2.0")]);

        match harness.submitter.submit(request).await {
            Err(AppError::InvalidRow { index: 2, .. }) => {}
            other => panic!("unexpected result: {other:?}"),
        }
        assert!(harness.signer.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn unsupported_chain_rejected_before_any_call() {
        let harness = harness_with(ScriptedSigner::happy(999), false).await;
        let request = eth_request(&[(ADDR_A, "1.0")]);

        match harness.submitter.submit(request).await {
            Err(AppError::UnsupportedChain(999)) => {}
            other => panic!("unexpected result: {other:?}"),
        }
        assert!(harness.signer.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn happy_path_reaches_confirmed() {
        let harness = harness_with(ScriptedSigner::happy(8453), false).await;
        let record = harness
            .submitter
            .submit(eth_request(&[(ADDR_A, "1.0")]))
            .await
            .unwrap();
        assert_eq!(record.status, SubmissionStatus::Pending);

        match wait_terminal(&harness.submitter, &record.submission_id).await {
            SubmissionStatus::Confirmed { tx_hash } => assert!(tx_hash.starts_with("0x")),
            other => panic!("unexpected status: {other:?}"),
        }
        assert_eq!(harness.host.notify_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn notification_failure_never_touches_the_outcome() {
        // Memastikan gagal notifikasi host tidak mengubah status transfer
        let harness = harness_with(ScriptedSigner::happy(8453), true).await;
        let record = harness
            .submitter
            .submit(eth_request(&[(ADDR_A, "1.0")]))
            .await
            .unwrap();

        match wait_terminal(&harness.submitter, &record.submission_id).await {
            SubmissionStatus::Confirmed { .. } => {}
            other => panic!("unexpected status: {other:?}"),
        }
        assert_eq!(harness.host.notify_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn user_cancellation_is_distinguished() {
        let mut signer = ScriptedSigner::happy(8453);
        signer.fail_send = Some("MetaMask Tx Signature: User denied transaction".to_string());
        let harness = harness_with(signer, false).await;

        let record = harness
            .submitter
            .submit(eth_request(&[(ADDR_A, "1.0")]))
            .await
            .unwrap();

        match wait_terminal(&harness.submitter, &record.submission_id).await {
            SubmissionStatus::Failed {
                user_cancelled, ..
            } => assert!(user_cancelled),
            other => panic!("unexpected status: {other:?}"),
        }
    }

    #[tokio::test]
    async fn second_submission_rejected_while_pending() {
        // Memastikan submission kedua ditolak saat masih ada yang pending
        let gate = Arc::new(Notify::new());
        let mut signer = ScriptedSigner::happy(8453);
        signer.gate = Some(gate.clone());
        let harness = harness_with(signer, false).await;

        let first = harness
            .submitter
            .submit(eth_request(&[(ADDR_A, "1.0")]))
            .await
            .unwrap();

        match harness
            .submitter
            .submit(eth_request(&[(ADDR_B, "2.0")]))
            .await
        {
            Err(AppError::SubmissionInProgress) => {}
            other => panic!("unexpected result: {other:?}"),
        }

        gate.notify_one();
        wait_terminal(&harness.submitter, &first.submission_id).await;

        // Terminal state frees the slot for the next attempt.
        assert!(harness
            .submitter
            .submit(eth_request(&[(ADDR_B, "2.0")]))
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn stale_completion_is_ignored_after_disconnect() {
        // Memastikan penyelesaian basi tidak diterapkan ke sesi baru
        let gate = Arc::new(Notify::new());
        let mut signer = ScriptedSigner::happy(8453);
        signer.gate = Some(gate.clone());
        let harness = harness_with(signer, false).await;

        let record = harness
            .submitter
            .submit(eth_request(&[(ADDR_A, "1.0")]))
            .await
            .unwrap();

        // The wallet goes away while the signature request is outstanding.
        harness.sessions.disconnect().await;
        gate.notify_one();
        sleep(Duration::from_millis(100)).await;

        let stale = harness.submitter.status(&record.submission_id).await.unwrap();
        assert_eq!(stale.status, SubmissionStatus::Pending);

        // The slot is free again for the next session.
        harness
            .sessions
            .connect(WalletKind::Metamask)
            .await
            .unwrap();
        assert!(harness
            .submitter
            .submit(eth_request(&[(ADDR_B, "2.0")]))
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn status_feed_carries_lifecycle_events() {
        let harness = harness_with(ScriptedSigner::happy(8453), false).await;
        let mut feed = harness.submitter.subscribe();

        let record = harness
            .submitter
            .submit(eth_request(&[(ADDR_A, "1.0")]))
            .await
            .unwrap();
        wait_terminal(&harness.submitter, &record.submission_id).await;

        let mut states = Vec::new();
        while let Ok(event) = feed.try_recv() {
            states.push(event.status);
        }
        assert!(states.contains(&SubmissionStatus::Pending));
        assert!(states
            .iter()
            .any(|s| matches!(s, SubmissionStatus::Submitted { .. })));
        assert!(states
            .iter()
            .any(|s| matches!(s, SubmissionStatus::Confirmed { .. })));
    }

    #[tokio::test]
    async fn unknown_submission_id_is_not_found() {
        let harness = harness_with(ScriptedSigner::happy(8453), false).await;
        assert!(matches!(
            harness.submitter.status("SUB_missing").await,
            Err(AppError::NotFound(_))
        ));
    }
}
