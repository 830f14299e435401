use chrono::Utc;
use serde::Serialize;
use url::Url;

use crate::config::Config;
use crate::constants::{TWITTER_INTENT_URL, WARPCAST_COMPOSE_URL};
use crate::error::{AppError, Result};
use crate::models::RecipientEntry;

#[derive(Debug, Clone, Serialize)]
pub struct ShareLink {
    pub target: &'static str,
    pub text: String,
    pub url: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ShareLinks {
    pub farcaster: ShareLink,
    pub x: ShareLink,
}

/// Batch data carried in a share deep link, used to prefill the form.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PrefillRequest {
    pub chain_id: Option<u64>,
    pub rows: Vec<RecipientEntry>,
}

pub struct ShareService {
    config: Config,
    http: reqwest::Client,
}

impl ShareService {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            http: reqwest::Client::new(),
        }
    }

    /// Compose-intents for the share affordance shown after a confirmed
    /// batch.
    pub fn compose_links(&self, recipient_count: usize, network: &str) -> Result<ShareLinks> {
        let cast_text = format!(
            "Just completed a batch transfer with Sendwise! 🚀\n\n\
             💰 Sent to {recipient_count} addresses on {network} in one transaction\n\n\
             Try it: {}",
            self.config.app_share_url
        );
        let tweet_text = format!(
            "🚀 Sendwise - the smartest way to send crypto to multiple addresses!\n\n\
             Just paid {recipient_count} recipients on {network} in a single transaction.\n\n\
             Try it out: {}\n\n\
             #Sendwise #BatchTransfer #DeFi",
            self.config.app_share_url
        );

        Ok(ShareLinks {
            farcaster: ShareLink {
                target: "farcaster",
                url: compose_url(WARPCAST_COMPOSE_URL, &cast_text)?,
                text: cast_text,
            },
            x: ShareLink {
                target: "x",
                url: compose_url(TWITTER_INTENT_URL, &tweet_text)?,
                text: tweet_text,
            },
        })
    }

    /// Fire an analytics beacon. Strictly best-effort: failures are logged
    /// and dropped, never surfaced to the caller.
    pub async fn track(&self, event: &str) {
        if self.config.is_dev() {
            tracing::debug!("Dev mode: skipping analytics event {event}");
            return;
        }
        let Some(endpoint) = &self.config.analytics_endpoint else {
            return;
        };

        let payload = serde_json::json!({
            "event": event,
            "app": "sendwise",
            "at": Utc::now(),
        });
        if let Err(e) = self.http.post(endpoint).json(&payload).send().await {
            tracing::debug!("Analytics beacon dropped: {e}");
        }
    }
}

fn compose_url(base: &str, text: &str) -> Result<String> {
    Url::parse_with_params(base, &[("text", text)])
        .map(|url| url.to_string())
        .map_err(|e| AppError::Internal(format!("Failed to build share URL: {e}")))
}

/// Decode a share deep link query (`chain=8453&rows=0xA:1.0,0xB:2.5`) into a
/// prefill payload. Best-effort: anything unrecognizable yields None.
pub fn decode_prefill(query: &str) -> Option<PrefillRequest> {
    let mut chain_id = None;
    let mut rows = Vec::new();

    for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
        match key.as_ref() {
            "chain" => chain_id = value.parse::<u64>().ok(),
            "rows" => {
                for entry in value.split(',') {
                    let Some((address, amount)) = entry.split_once(':') else {
                        continue;
                    };
                    if address.is_empty() || amount.is_empty() {
                        continue;
                    }
                    rows.push(RecipientEntry {
                        address: address.to_string(),
                        amount: amount.to_string(),
                    });
                }
            }
            _ => {}
        }
    }

    if chain_id.is_none() && rows.is_empty() {
        return None;
    }
    Some(PrefillRequest { chain_id, rows })
}
