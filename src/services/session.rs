use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use ethers::types::{Address, TransactionRequest, TxHash};
use tokio::sync::RwLock;

use crate::error::{AppError, Result};
use crate::models::{SessionInfo, WalletKind};
use crate::services::providers::{ActiveSigner, ProviderRegistry};
use crate::utils::short_address;

/// The one active wallet session. Replaced wholesale on reconnect, never
/// partially mutated; the generation ties in-flight work to the session it
/// started under.
#[derive(Clone)]
pub struct ActiveSession {
    pub kind: WalletKind,
    pub address: Address,
    pub chain_id: u64,
    pub signer: Arc<dyn ActiveSigner>,
    pub generation: u64,
    pub connected_at: DateTime<Utc>,
}

enum SessionState {
    Disconnected,
    Connecting,
    Connected(ActiveSession),
}

/// Owns the active signer and mediates every address/signing operation.
/// All session mutation goes through `connect` / `disconnect`.
pub struct WalletSessionManager {
    registry: ProviderRegistry,
    state: RwLock<SessionState>,
    generation: AtomicU64,
    host_mode: AtomicBool,
}

impl WalletSessionManager {
    pub fn new(registry: ProviderRegistry) -> Self {
        Self {
            registry,
            state: RwLock::new(SessionState::Disconnected),
            generation: AtomicU64::new(0),
            host_mode: AtomicBool::new(false),
        }
    }

    /// Restrict connects to the host wallet kind. Set once the environment
    /// resolver declares host-embedded mode.
    pub fn set_host_mode(&self, host_mode: bool) {
        self.host_mode.store(host_mode, Ordering::SeqCst);
    }

    pub fn host_mode(&self) -> bool {
        self.host_mode.load(Ordering::SeqCst)
    }

    /// Wallet kinds that can currently be offered to the user.
    pub fn available_kinds(&self) -> Vec<WalletKind> {
        let kinds = self.registry.kinds();
        if self.host_mode() {
            kinds.into_iter().filter(|kind| kind.is_host()).collect()
        } else {
            kinds
        }
    }

    /// Establish a session with the named wallet kind, replacing any previous
    /// session atomically. A second connect while one is being established is
    /// rejected, never queued.
    pub async fn connect(&self, kind: WalletKind) -> Result<SessionInfo> {
        if self.host_mode() && !kind.is_host() {
            return Err(AppError::UnsupportedInHostMode(kind.label().to_string()));
        }

        {
            let mut state = self.state.write().await;
            if matches!(*state, SessionState::Connecting) {
                return Err(AppError::ConnectionInProgress);
            }
            *state = SessionState::Connecting;
        }

        let connector = match self.registry.get(kind) {
            Ok(connector) => connector,
            Err(e) => {
                self.abort_connecting().await;
                return Err(e);
            }
        };

        match connector.connect().await {
            Ok(wallet) => {
                let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
                let session = ActiveSession {
                    kind,
                    address: wallet.address,
                    chain_id: wallet.chain_id,
                    signer: wallet.signer,
                    generation,
                    connected_at: Utc::now(),
                };
                let info = describe(&session);

                let mut state = self.state.write().await;
                *state = SessionState::Connected(session);
                tracing::info!("Wallet connected: {} via {}", info.short_address, kind);
                Ok(info)
            }
            Err(e) => {
                self.abort_connecting().await;
                Err(e)
            }
        }
    }

    /// Drop the active session. Safe to call with no session at all; external
    /// disconnect events route through here too.
    pub async fn disconnect(&self) {
        let mut state = self.state.write().await;
        if matches!(*state, SessionState::Connected(_)) {
            *state = SessionState::Disconnected;
            self.generation.fetch_add(1, Ordering::SeqCst);
            tracing::info!("Wallet disconnected");
        }
    }

    /// The connected address, or None when no session is active. Never an
    /// error for the common no-session case.
    pub async fn get_address(&self) -> Option<String> {
        self.session_info().await.map(|info| info.address)
    }

    pub async fn session_info(&self) -> Option<SessionInfo> {
        match &*self.state.read().await {
            SessionState::Connected(session) => Some(describe(session)),
            _ => None,
        }
    }

    /// Snapshot of the active session for components that need the signer.
    pub async fn current(&self) -> Result<ActiveSession> {
        match &*self.state.read().await {
            SessionState::Connected(session) => Ok(session.clone()),
            _ => Err(AppError::NoActiveSession),
        }
    }

    pub async fn sign_and_send(&self, tx: TransactionRequest) -> Result<TxHash> {
        let session = self.current().await?;
        session.signer.send_transaction(tx).await
    }

    /// Generation of the current session state; bumped on every connect and
    /// disconnect so stale async completions can be detected.
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    async fn abort_connecting(&self) {
        let mut state = self.state.write().await;
        if matches!(*state, SessionState::Connecting) {
            *state = SessionState::Disconnected;
        }
    }
}

fn describe(session: &ActiveSession) -> SessionInfo {
    let address = format!("{:?}", session.address);
    SessionInfo {
        kind: session.kind,
        wallet_label: session.kind.label().to_string(),
        address: address.clone(),
        short_address: short_address(&address),
        chain_id: session.chain_id,
        connected_at: session.connected_at,
    }
}
