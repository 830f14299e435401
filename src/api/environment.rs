use std::collections::HashMap;

use axum::extract::{Query, State};
use axum::http::HeaderMap;
use axum::Json;

use super::AppState;
use crate::models::ApiResponse;
use crate::services::environment::{EnvironmentReport, RuntimeSignals};

/// GET /api/v1/environment
///
/// Classifies the embedding runtime from the request's own signals and, in
/// host mode, restricts the wallet offering to the host wallet.
pub async fn resolve(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> Json<ApiResponse<EnvironmentReport>> {
    let raw = signals_from_request(&headers, &params);
    let report = state.resolver.resolve(&raw).await;
    state.sessions.set_host_mode(report.host_embedded);
    Json(ApiResponse::success(report))
}

fn signals_from_request(headers: &HeaderMap, params: &HashMap<String, String>) -> RuntimeSignals {
    let header = |name: &str| {
        headers
            .get(name)
            .and_then(|value| value.to_str().ok())
            .unwrap_or_default()
            .to_string()
    };

    // Fetch metadata is the only way the backend can see frame embedding.
    let frame_embedded = headers
        .get("sec-fetch-dest")
        .and_then(|value| value.to_str().ok())
        .map(|value| value.eq_ignore_ascii_case("iframe"))
        .unwrap_or(false);

    RuntimeSignals {
        user_agent: header("user-agent"),
        referrer: header("referer"),
        query_keys: params.keys().cloned().collect(),
        frame_embedded,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn signals_come_from_headers_and_query() {
        // Memastikan sinyal mentah diekstrak dari header dan query
        let mut headers = HeaderMap::new();
        headers.insert("user-agent", HeaderValue::from_static("Warpcast/2.0"));
        headers.insert("referer", HeaderValue::from_static("https://warpcast.com/"));
        headers.insert("sec-fetch-dest", HeaderValue::from_static("iframe"));

        let mut params = HashMap::new();
        params.insert("fc".to_string(), "1".to_string());

        let raw = signals_from_request(&headers, &params);
        assert_eq!(raw.user_agent, "Warpcast/2.0");
        assert_eq!(raw.referrer, "https://warpcast.com/");
        assert!(raw.frame_embedded);
        assert_eq!(raw.query_keys, vec!["fc".to_string()]);
    }

    #[test]
    fn missing_headers_default_to_empty_signals() {
        let raw = signals_from_request(&HeaderMap::new(), &HashMap::new());
        assert!(raw.user_agent.is_empty());
        assert!(raw.referrer.is_empty());
        assert!(!raw.frame_embedded);
        assert!(raw.query_keys.is_empty());
    }
}
