use axum::http::HeaderValue;
use axum::{
    routing::{get, post},
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod api;
mod chains;
mod config;
mod constants;
mod contracts;
mod error;
mod models;
mod services;
mod utils;
mod websocket;

use chains::ChainRegistry;
use config::Config;
use constants::API_VERSION;
use services::{
    BatchSubmitter, EnvironmentResolver, HostRuntime, HttpHostBridge, ProviderRegistry,
    ShareService, TokenService, WalletSessionManager,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "sendwise_backend=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::from_env()?;
    config.validate()?;

    tracing::info!("Starting Sendwise Backend Server");
    tracing::info!("Environment: {}", config.environment);
    tracing::info!("API Version: {}", API_VERSION);

    // Static chain table, wallet connectors and host bridge
    let chains = Arc::new(ChainRegistry::from_env()?);
    let host: Arc<dyn HostRuntime> = Arc::new(HttpHostBridge::from_config(&config));
    let registry = ProviderRegistry::from_config(&config, &chains, host.clone())?;

    let sessions = Arc::new(WalletSessionManager::new(registry));
    let resolver = Arc::new(EnvironmentResolver::new(host.clone(), &config));
    let share = Arc::new(ShareService::new(config.clone()));
    let tokens = Arc::new(TokenService::new(
        config.clone(),
        chains.clone(),
        sessions.clone(),
    ));
    let submitter = Arc::new(BatchSubmitter::new(
        config.clone(),
        chains.clone(),
        sessions.clone(),
        host.clone(),
        share.clone(),
    ));

    let app_state = api::AppState {
        config: config.clone(),
        chains,
        sessions,
        submitter,
        resolver: resolver.clone(),
        tokens,
        share,
        host: host.clone(),
    };

    // Build router
    let app = build_router(app_state);

    // Probe the host early so an embedded launch never sits on the splash
    // screen waiting for the first environment request.
    let enable_host_probe = if std::env::var("ENABLE_HOST_STARTUP_PROBE").is_ok() {
        utils::is_env_flag_enabled("ENABLE_HOST_STARTUP_PROBE")
    } else {
        true
    };
    if enable_host_probe {
        tokio::spawn(async move {
            if host.discover().await.is_present() {
                resolver.ensure_ready().await;
            }
        });
    } else {
        tracing::warn!("Host startup probe disabled via ENABLE_HOST_STARTUP_PROBE");
    }

    // Start server
    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .expect("Invalid address");

    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

fn build_router(state: api::AppState) -> Router {
    // CORS configuration
    let cors = cors_from_config(&state.config);

    Router::new()
        // Health check
        .route("/health", get(api::health::health_check))
        // Environment detection
        .route("/api/v1/environment", get(api::environment::resolve))
        // Wallet session
        .route("/api/v1/wallet/connect", post(api::wallet::connect))
        .route("/api/v1/wallet/address", get(api::wallet::get_address))
        .route("/api/v1/wallet/disconnect", post(api::wallet::disconnect))
        .route("/api/v1/wallet/kinds", get(api::wallet::kinds))
        // Batch transfer
        .route("/api/v1/transfer/submit", post(api::transfer::submit))
        .route(
            "/api/v1/transfer/status/{submission_id}",
            get(api::transfer::status),
        )
        // Token helpers
        .route("/api/v1/token/info", get(api::tokens::info))
        .route("/api/v1/token/approve", post(api::tokens::approve))
        // Sharing
        .route("/api/v1/share/links", get(api::share::links))
        .route("/api/v1/share/track", post(api::share::track))
        .route("/api/v1/share/prefill", get(api::share::prefill))
        // WebSocket endpoints
        .route("/ws/status", get(websocket::status::handler))
        .layer(cors)
        .with_state(state)
}

fn cors_from_config(config: &Config) -> CorsLayer {
    let raw = config.cors_allowed_origins.trim();
    if raw.is_empty() || raw == "*" {
        return CorsLayer::very_permissive();
    }

    let allowed: Vec<HeaderValue> = raw
        .split(',')
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .filter_map(|s| s.parse::<HeaderValue>().ok())
        .collect();

    if allowed.is_empty() {
        tracing::warn!("No valid CORS origins parsed; falling back to permissive");
        return CorsLayer::very_permissive();
    }

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(allowed))
        .allow_methods(Any)
        .allow_headers(Any)
}
