// src/api/mod.rs

pub mod environment;
pub mod health;
pub mod share;
pub mod tokens;
pub mod transfer;
pub mod wallet;

use std::sync::Arc;

use crate::chains::ChainRegistry;
use crate::config::Config;
use crate::services::{
    BatchSubmitter, EnvironmentResolver, HostRuntime, ShareService, TokenService,
    WalletSessionManager,
};

/// Application context handed to every handler. Components receive these
/// references; nothing reads process-wide globals.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub chains: Arc<ChainRegistry>,
    pub sessions: Arc<WalletSessionManager>,
    pub submitter: Arc<BatchSubmitter>,
    pub resolver: Arc<EnvironmentResolver>,
    pub tokens: Arc<TokenService>,
    pub share: Arc<ShareService>,
    pub host: Arc<dyn HostRuntime>,
}
