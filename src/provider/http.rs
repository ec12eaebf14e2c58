//! Shared HTTP client and auth utilities.

use std::sync::OnceLock;

use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};

use crate::error::MuseError;

static SHARED_CLIENT: OnceLock<reqwest::Client> = OnceLock::new();

/// Get (or create) the shared reqwest client.
pub fn shared_client() -> &'static reqwest::Client {
    SHARED_CLIENT.get_or_init(|| {
        reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(120))
            .pool_max_idle_per_host(10)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new())
    })
}

/// Build Anthropic-style headers (x-api-key).
pub fn anthropic_headers(api_key: &str, version: &str) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    if let Ok(val) = HeaderValue::from_str(api_key) {
        headers.insert("x-api-key", val);
    }
    if let Ok(val) = HeaderValue::from_str(version) {
        headers.insert("anthropic-version", val);
    }
    headers
}

/// Map a non-success HTTP status to an error.
pub fn status_to_error(status: u16, body: &str, retry_after: Option<&str>) -> MuseError {
    let message = extract_error_message(body).unwrap_or_else(|| body.to_string());
    match status {
        401 | 403 => MuseError::Authentication(message),
        429 => MuseError::RateLimited {
            retry_after_ms: retry_after
                .and_then(|v| v.trim().parse::<f64>().ok())
                .map(|secs| (secs * 1000.0) as u64),
        },
        _ => MuseError::api(status, message),
    }
}

fn extract_error_message(body: &str) -> Option<String> {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()?
        .get("error")?
        .get("message")?
        .as_str()
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_maps_to_error_variants() {
        assert!(matches!(
            status_to_error(401, "denied", None),
            MuseError::Authentication(_)
        ));
        assert!(matches!(
            status_to_error(429, "", Some("2")),
            MuseError::RateLimited {
                retry_after_ms: Some(2000)
            }
        ));
        assert!(matches!(
            status_to_error(529, "", None),
            MuseError::Api { status: 529, .. }
        ));
    }

    #[test]
    fn error_message_is_pulled_from_json_body() {
        let body = r#"{"type":"error","error":{"type":"invalid_request_error","message":"max_tokens too large"}}"#;
        match status_to_error(400, body, None) {
            MuseError::Api { message, .. } => assert_eq!(message, "max_tokens too large"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn headers_carry_key_and_version() {
        let headers = anthropic_headers("sk-test", "2023-06-01");
        assert_eq!(headers["x-api-key"], "sk-test");
        assert_eq!(headers["anthropic-version"], "2023-06-01");
    }
}
