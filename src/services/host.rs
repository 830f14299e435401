use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::sync::OnceCell;

use crate::{
    config::Config,
    constants::HOST_PROBE_TIMEOUT_MS,
    error::{AppError, Result},
};

/// Capabilities advertised by the embedding host, resolved once at discovery
/// time. Every capability is optional; absence degrades gracefully instead of
/// being re-checked at each call site.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HostCapabilities {
    #[serde(default)]
    pub ready_endpoint: Option<String>,
    #[serde(default)]
    pub notify_endpoint: Option<String>,
    #[serde(default)]
    pub share_endpoint: Option<String>,
    #[serde(default)]
    pub wallet_rpc_endpoint: Option<String>,
}

#[derive(Debug, Clone)]
pub enum DiscoveryOutcome {
    Found(HostCapabilities),
    NotPresent,
}

/// One named probe and how it went. Kept as data so the probe order and
/// exhaustion behavior stay testable.
#[derive(Debug, Clone)]
pub struct DiscoveryAttempt {
    pub strategy: &'static str,
    pub succeeded: bool,
    pub detail: String,
}

#[derive(Debug, Clone)]
pub struct DiscoveryReport {
    pub outcome: DiscoveryOutcome,
    pub attempts: Vec<DiscoveryAttempt>,
}

impl DiscoveryReport {
    pub fn is_present(&self) -> bool {
        matches!(self.outcome, DiscoveryOutcome::Found(_))
    }

    pub fn capabilities(&self) -> Option<&HostCapabilities> {
        match &self.outcome {
            DiscoveryOutcome::Found(caps) => Some(caps),
            DiscoveryOutcome::NotPresent => None,
        }
    }
}

#[async_trait]
pub trait HostRuntime: Send + Sync {
    /// Probe for the host capability object. Never errors: any probe failure
    /// counts toward a definite `NotPresent` outcome.
    async fn discover(&self) -> DiscoveryReport;

    /// The splash-screen handshake. Errors when the host advertises no
    /// readiness capability; callers decide the fallback.
    async fn signal_ready(&self) -> Result<()>;

    /// Best-effort notification action. Callers must swallow errors.
    async fn notify(&self, title: &str, body: &str) -> Result<()>;

    /// JSON-RPC request routed through the host wallet provider.
    async fn wallet_request(
        &self,
        method: &str,
        params: serde_json::Value,
    ) -> Result<serde_json::Value>;
}

// Probes tried in order; the first one that answers wins.
const DISCOVERY_PROBES: &[(&str, &str)] = &[
    ("capabilities", "/capabilities"),
    ("legacy-sdk-info", "/sdk/info"),
];

/// Host runtime reached over a configured HTTP bridge endpoint. With no
/// bridge configured it degrades to a permanent `NotPresent`.
pub struct HttpHostBridge {
    base_url: Option<String>,
    http: reqwest::Client,
    discovered: OnceCell<DiscoveryReport>,
}

impl HttpHostBridge {
    pub fn from_config(config: &Config) -> Self {
        Self {
            base_url: config
                .host_bridge_url
                .as_ref()
                .map(|url| url.trim_end_matches('/').to_string()),
            http: reqwest::Client::new(),
            discovered: OnceCell::new(),
        }
    }

    async fn run_probes(&self) -> DiscoveryReport {
        let Some(base_url) = &self.base_url else {
            return DiscoveryReport {
                outcome: DiscoveryOutcome::NotPresent,
                attempts: vec![DiscoveryAttempt {
                    strategy: "not-configured",
                    succeeded: false,
                    detail: "HOST_BRIDGE_URL is not set".to_string(),
                }],
            };
        };

        let mut attempts = Vec::new();
        for &(strategy, path) in DISCOVERY_PROBES {
            let url = format!("{base_url}{path}");
            match self.probe(&url).await {
                Ok(caps) => {
                    attempts.push(DiscoveryAttempt {
                        strategy,
                        succeeded: true,
                        detail: url,
                    });
                    tracing::info!("Host capabilities discovered via {}", strategy);
                    return DiscoveryReport {
                        outcome: DiscoveryOutcome::Found(caps),
                        attempts,
                    };
                }
                Err(e) => {
                    attempts.push(DiscoveryAttempt {
                        strategy,
                        succeeded: false,
                        detail: e.to_string(),
                    });
                }
            }
        }

        tracing::debug!("Host capability probes exhausted; running standalone");
        DiscoveryReport {
            outcome: DiscoveryOutcome::NotPresent,
            attempts,
        }
    }

    async fn probe(&self, url: &str) -> Result<HostCapabilities> {
        let response = self
            .http
            .get(url)
            .timeout(Duration::from_millis(HOST_PROBE_TIMEOUT_MS))
            .send()
            .await
            .map_err(|e| AppError::HostRuntime(e.to_string()))?;

        if !response.status().is_success() {
            return Err(AppError::HostRuntime(format!(
                "Probe {url} returned {}",
                response.status()
            )));
        }

        response
            .json::<HostCapabilities>()
            .await
            .map_err(|e| AppError::HostRuntime(format!("Malformed capability payload: {e}")))
    }

    async fn capabilities(&self) -> DiscoveryReport {
        self.discovered
            .get_or_init(|| self.run_probes())
            .await
            .clone()
    }
}

#[async_trait]
impl HostRuntime for HttpHostBridge {
    async fn discover(&self) -> DiscoveryReport {
        self.capabilities().await
    }

    async fn signal_ready(&self) -> Result<()> {
        let report = self.capabilities().await;
        let endpoint = report
            .capabilities()
            .and_then(|caps| caps.ready_endpoint.clone())
            .ok_or_else(|| {
                AppError::HostRuntime("Host advertises no readiness handshake".to_string())
            })?;

        self.http
            .post(&endpoint)
            .json(&serde_json::json!({ "ready": true }))
            .send()
            .await
            .map_err(|e| AppError::HostRuntime(e.to_string()))?
            .error_for_status()
            .map_err(|e| AppError::HostRuntime(e.to_string()))?;
        Ok(())
    }

    async fn notify(&self, title: &str, body: &str) -> Result<()> {
        let report = self.capabilities().await;
        let endpoint = report
            .capabilities()
            .and_then(|caps| caps.notify_endpoint.clone())
            .ok_or_else(|| {
                AppError::HostRuntime("Host advertises no notification action".to_string())
            })?;

        self.http
            .post(&endpoint)
            .json(&serde_json::json!({ "title": title, "body": body }))
            .send()
            .await
            .map_err(|e| AppError::HostRuntime(e.to_string()))?
            .error_for_status()
            .map_err(|e| AppError::HostRuntime(e.to_string()))?;
        Ok(())
    }

    async fn wallet_request(
        &self,
        method: &str,
        params: serde_json::Value,
    ) -> Result<serde_json::Value> {
        let report = self.capabilities().await;
        let endpoint = report
            .capabilities()
            .and_then(|caps| caps.wallet_rpc_endpoint.clone())
            .ok_or_else(|| AppError::ProviderNotFound("Farcaster Wallet".to_string()))?;

        let payload = serde_json::json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": method,
            "params": params,
        });

        let response: serde_json::Value = self
            .http
            .post(&endpoint)
            .json(&payload)
            .send()
            .await
            .map_err(|e| AppError::from_provider(e.to_string()))?
            .json()
            .await
            .map_err(|e| AppError::from_provider(e.to_string()))?;

        if let Some(error) = response.get("error") {
            return Err(AppError::from_provider(error.to_string()));
        }
        Ok(response.get("result").cloned().unwrap_or(serde_json::Value::Null))
    }
}
