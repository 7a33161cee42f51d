//! Shared HTTP plumbing for the remote providers.
//!
//! Every provider call maps a `reqwest` failure into a [`TransportError`],
//! which keeps the distinction the user cares about: the server answered
//! with an error, or nothing answered at all.

use std::time::Duration;

use reqwest::blocking::{Client, RequestBuilder};
use serde::Deserialize;
use serde::de::DeserializeOwned;

/// Failures talking to a remote provider.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    /// The server responded with a non-2xx status.
    #[error("server rejected request (HTTP {status}){}", detail_suffix(.detail))]
    Rejected { status: u16, detail: Option<String> },

    /// No response was received.
    #[error("no response: {0}")]
    NoResponse(String),

    /// A response arrived but could not be decoded.
    #[error("malformed response: {0}")]
    Decode(String),
}

fn detail_suffix(detail: &Option<String>) -> String {
    detail.as_deref().map(|d| format!(": {d}")).unwrap_or_default()
}

/// Build a client with one overall request timeout.
pub fn build_client(timeout_ms: u64) -> Result<Client, reqwest::Error> {
    Client::builder()
        .timeout(Duration::from_millis(timeout_ms.max(100)))
        .user_agent(concat!("krishi/", env!("CARGO_PKG_VERSION")))
        .build()
}

/// Error body shape: `{"detail": "..."}`.
///
/// Validation failures put a list of objects in `detail`; those are kept
/// as their JSON text.
#[derive(Deserialize)]
struct ErrorBody {
    detail: Option<serde_json::Value>,
}

/// Send a request and decode a JSON answer.
///
/// A non-2xx status becomes [`TransportError::Rejected`] carrying the
/// server's `detail` message if the body has one.
pub fn send_json<T: DeserializeOwned>(request: RequestBuilder) -> Result<T, TransportError> {
    let response = request
        .header(reqwest::header::ACCEPT, "application/json")
        .send()
        .map_err(|e| TransportError::NoResponse(e.to_string()))?;
    let status = response.status();
    if !status.is_success() {
        let detail = response.text().ok().and_then(|body| detail_from_body(&body));
        return Err(TransportError::Rejected {
            status: status.as_u16(),
            detail,
        });
    }
    response
        .json()
        .map_err(|e| TransportError::Decode(e.to_string()))
}

fn detail_from_body(body: &str) -> Option<String> {
    let parsed: ErrorBody = serde_json::from_str(body).ok()?;
    match parsed.detail? {
        serde_json::Value::String(s) if !s.trim().is_empty() => Some(s),
        serde_json::Value::String(_) | serde_json::Value::Null => None,
        other => Some(other.to_string()),
    }
}
