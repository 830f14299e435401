/// Application constants

// Host environment detection
pub const HOST_USER_AGENT_MARKERS: &[&str] = &["farcaster", "warpcast"];
pub const HOST_REFERRER_DOMAINS: &[&str] =
    &["warpcast.com", "farcaster.xyz", "client.farcaster.xyz"];
pub const HOST_QUERY_FLAGS: &[&str] = &["fc", "farcaster", "frame"];

// Host readiness handshake
pub const HOST_READY_TIMEOUT_MS: u64 = 5_000;
pub const HOST_PROBE_TIMEOUT_MS: u64 = 1_000;

// Batch transfer defaults
pub const DEFAULT_BATCH_FEE_ETH: &str = "0.001";
pub const DEFAULT_BATCH_GAS_LIMIT: u64 = 500_000;
pub const DEFAULT_CHAIN_ID: u64 = 8453;
pub const MAX_RECIPIENTS_PER_BATCH: usize = 1_000;
pub const NATIVE_DECIMALS: u8 = 18;

// Receipt polling
pub const DEFAULT_RECEIPT_POLL_ATTEMPTS: usize = 20;
pub const DEFAULT_RECEIPT_POLL_INTERVAL_MS: u64 = 1_500;

// Share targets
pub const WARPCAST_COMPOSE_URL: &str = "https://warpcast.com/~/compose";
pub const TWITTER_INTENT_URL: &str = "https://twitter.com/intent/tweet";
pub const DEFAULT_APP_SHARE_URL: &str = "https://farcaster.xyz/miniapps/hkVHvP2VMNsW/sendwise";

// WebSocket configuration
pub const WS_HEARTBEAT_INTERVAL_SECS: u64 = 30;
pub const WS_CLIENT_TIMEOUT_SECS: u64 = 60;

// API version
pub const API_VERSION: &str = "v1";
