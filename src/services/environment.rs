use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;
use url::Url;

use crate::config::Config;
use crate::constants::{HOST_QUERY_FLAGS, HOST_REFERRER_DOMAINS, HOST_USER_AGENT_MARKERS};
use crate::services::host::HostRuntime;

/// Raw signals describing the embedding page, as reported by the client
/// request: user agent, referrer, query-string keys, and whether the page
/// sits inside a parent frame.
#[derive(Debug, Clone, Default)]
pub struct RuntimeSignals {
    pub user_agent: String,
    pub referrer: String,
    pub query_keys: Vec<String>,
    pub frame_embedded: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct SignalSet {
    pub user_agent: bool,
    pub referrer: bool,
    pub query_flag: bool,
    pub frame_embedded: bool,
    pub host_object: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct EnvironmentReport {
    pub host_embedded: bool,
    pub matched_rule: Option<&'static str>,
    pub signals: SignalSet,
    pub ready_signalled: bool,
}

/// Decides whether the app runs inside the host client or a plain browser,
/// and owns the one-shot splash-screen handshake toward the host.
///
/// No single signal is trustworthy on its own (referrers get stripped, user
/// agents get spoofed, deep links lose query flags), so host mode requires
/// either a conjunction of two signals or the explicit flag.
pub struct EnvironmentResolver {
    host: Arc<dyn HostRuntime>,
    ready_fired: AtomicBool,
    ready_timeout: Duration,
}

impl EnvironmentResolver {
    pub fn new(host: Arc<dyn HostRuntime>, config: &Config) -> Self {
        Self {
            host,
            ready_fired: AtomicBool::new(false),
            ready_timeout: Duration::from_millis(config.host_ready_timeout_ms),
        }
    }

    /// Resolve the environment to a definite answer. Host-object probing
    /// failures count as "object not usable"; nothing in here can abort
    /// initialization.
    pub async fn resolve(&self, raw: &RuntimeSignals) -> EnvironmentReport {
        let host_object = self.host.discover().await.is_present();
        let signals = SignalSet {
            user_agent: user_agent_matches(&raw.user_agent),
            referrer: referrer_matches(&raw.referrer),
            query_flag: query_flag_present(&raw.query_keys),
            frame_embedded: raw.frame_embedded,
            host_object,
        };

        let (host_embedded, matched_rule) = classify(&signals);
        if host_embedded {
            self.ensure_ready().await;
        }

        EnvironmentReport {
            host_embedded,
            matched_rule,
            signals,
            ready_signalled: self.ready_signalled(),
        }
    }

    /// Fire the readiness handshake at most once. The handshake races a
    /// bounded deadline; on timeout or on a host without the capability we
    /// still mark readiness so the UI can never stay stuck on the splash
    /// screen.
    pub async fn ensure_ready(&self) {
        if self.ready_fired.swap(true, Ordering::SeqCst) {
            return;
        }

        match timeout(self.ready_timeout, self.host.signal_ready()).await {
            Ok(Ok(())) => tracing::info!("Host readiness handshake delivered"),
            Ok(Err(e)) => {
                tracing::warn!("Host handshake unavailable ({e}); marking ready unconditionally")
            }
            Err(_) => tracing::warn!(
                "Host handshake timed out after {:?}; marking ready unconditionally",
                self.ready_timeout
            ),
        }
    }

    pub fn ready_signalled(&self) -> bool {
        self.ready_fired.load(Ordering::SeqCst)
    }
}

/// Host mode iff (UA ∧ referrer) ∨ (UA ∧ frame) ∨ explicit flag ∨ (UA ∧ host
/// object usable). Returns the first rule that fired.
fn classify(signals: &SignalSet) -> (bool, Option<&'static str>) {
    let rules: [(&'static str, bool); 4] = [
        ("user-agent+referrer", signals.user_agent && signals.referrer),
        (
            "user-agent+frame",
            signals.user_agent && signals.frame_embedded,
        ),
        ("query-flag", signals.query_flag),
        (
            "user-agent+host-object",
            signals.user_agent && signals.host_object,
        ),
    ];

    for (name, fired) in rules {
        if fired {
            return (true, Some(name));
        }
    }
    (false, None)
}

fn user_agent_matches(user_agent: &str) -> bool {
    let lower = user_agent.to_ascii_lowercase();
    HOST_USER_AGENT_MARKERS
        .iter()
        .any(|marker| lower.contains(marker))
}

fn referrer_matches(referrer: &str) -> bool {
    if referrer.trim().is_empty() {
        return false;
    }

    if let Ok(parsed) = Url::parse(referrer) {
        if let Some(host) = parsed.host_str() {
            let host = host.to_ascii_lowercase();
            return HOST_REFERRER_DOMAINS
                .iter()
                .any(|domain| host == *domain || host.ends_with(&format!(".{domain}")));
        }
    }

    // Non-URL referrer strings still get the substring treatment.
    let lower = referrer.to_ascii_lowercase();
    HOST_REFERRER_DOMAINS
        .iter()
        .any(|domain| lower.contains(domain))
}

fn query_flag_present(query_keys: &[String]) -> bool {
    query_keys.iter().any(|key| {
        let key = key.to_ascii_lowercase();
        HOST_QUERY_FLAGS.iter().any(|flag| key == *flag)
    })
}
