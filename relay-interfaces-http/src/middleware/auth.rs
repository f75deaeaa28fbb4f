use std::io::Read;

use anyhow::Result;
use axum::http::HeaderMap;
use flate2::read::GzDecoder;
use serde::de::DeserializeOwned;
use tracing::warn;

use relay_application::AppState;

pub const API_KEY_HEADER: &str = "X-API-Key";

/// Exact match of the `X-API-Key` header against the configured key. With
/// no key configured every request is refused.
pub fn authorize(state: &AppState, headers: &HeaderMap) -> bool {
    let presented = headers.get(API_KEY_HEADER).and_then(|value| value.to_str().ok());
    let accepted = match (state.config.api_key.as_deref(), presented) {
        (Some(expected), Some(presented)) => presented == expected,
        _ => false,
    };
    if !accepted {
        state.metrics.record_auth_failure();
        warn!(
            key_present = presented.is_some(),
            "rejected request with missing or invalid api key"
        );
    }
    accepted
}

/// Decodes a JSON body, gunzipping first when the client says so.
pub fn parse_json<T: DeserializeOwned>(headers: &HeaderMap, body: &[u8]) -> Result<T> {
    let content = maybe_gunzip(headers, body)?;
    Ok(serde_json::from_str(&content)?)
}

fn maybe_gunzip(headers: &HeaderMap, body: &[u8]) -> Result<String> {
    if let Some(encoding) = headers.get("Content-Encoding") {
        if encoding.to_str().unwrap_or("").eq_ignore_ascii_case("gzip") {
            let mut decoder = GzDecoder::new(body);
            let mut out = String::new();
            decoder.read_to_string(&mut out)?;
            return Ok(out);
        }
    }
    Ok(String::from_utf8(body.to_vec())?)
}
