// All service modules
pub mod environment;
pub mod host;
pub mod providers;
pub mod session;
pub mod share;
pub mod submitter;
pub mod tokens;

// Re-export for convenience
pub use environment::EnvironmentResolver;
pub use host::{HostRuntime, HttpHostBridge};
pub use providers::ProviderRegistry;
pub use session::WalletSessionManager;
pub use share::ShareService;
pub use submitter::BatchSubmitter;
pub use tokens::TokenService;
