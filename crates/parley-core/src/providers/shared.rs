//! Provider-agnostic helpers and the provider error type.

use std::fmt;
use std::time::Duration;

use anyhow::{Context, Result};
use serde_json::Value;

/// Standard User-Agent header for Parley API requests.
pub const USER_AGENT: &str = concat!("parley/", env!("CARGO_PKG_VERSION"));

// ============================================================================
// Config resolution helpers
// ============================================================================

/// Resolves an API key with precedence: config > env.
///
/// Blank values count as unset.
pub fn resolve_api_key(config_api_key: Option<&str>, env_var: &str) -> Option<String> {
    if let Some(key) = config_api_key {
        let trimmed = key.trim();
        if !trimmed.is_empty() {
            return Some(trimmed.to_string());
        }
    }

    std::env::var(env_var)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Resolves a base URL with precedence: config > default, without a trailing slash.
pub fn resolve_base_url(config_base_url: Option<&str>, default_url: &str) -> String {
    let url = config_base_url
        .map(str::trim)
        .filter(|u| !u.is_empty())
        .unwrap_or(default_url);
    url.trim_end_matches('/').to_string()
}

/// Builds the HTTP client shared by one provider instance.
///
/// # Errors
/// Returns an error if the TLS backend cannot be initialized.
pub fn build_http_client(timeout: Option<Duration>) -> Result<reqwest::Client> {
    let mut builder = reqwest::Client::builder().user_agent(USER_AGENT);
    if let Some(timeout) = timeout {
        builder = builder.timeout(timeout);
    }
    builder.build().context("Failed to build HTTP client")
}

// ============================================================================
// Errors
// ============================================================================

/// Categories of provider errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderErrorKind {
    /// No API key in config or environment
    MissingApiKey,
    /// Request exceeded the configured timeout
    Timeout,
    /// Could not connect or the transport failed
    Connection,
    /// Non-success HTTP status (4xx, 5xx)
    HttpStatus,
    /// Success status carrying an API-level error body
    ApiError,
    /// Response body did not have the expected shape
    Parse,
    /// Response parsed but contained no text
    EmptyReply,
    /// Every provider in a fallback chain failed
    Exhausted,
}

impl fmt::Display for ProviderErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ProviderErrorKind::MissingApiKey => "missing_api_key",
            ProviderErrorKind::Timeout => "timeout",
            ProviderErrorKind::Connection => "connection",
            ProviderErrorKind::HttpStatus => "http_status",
            ProviderErrorKind::ApiError => "api_error",
            ProviderErrorKind::Parse => "parse",
            ProviderErrorKind::EmptyReply => "empty_reply",
            ProviderErrorKind::Exhausted => "exhausted",
        };
        f.write_str(s)
    }
}

/// Structured error from a provider with kind and one-line message.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{message}")]
pub struct ProviderError {
    pub kind: ProviderErrorKind,
    pub message: String,
}

impl ProviderError {
    pub fn new(kind: ProviderErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn missing_api_key(env_var: &str, config_section: &str) -> Self {
        Self::new(
            ProviderErrorKind::MissingApiKey,
            format!("No API key available. Set {env_var} or api_key in [providers.{config_section}]."),
        )
    }

    /// Creates an HTTP status error, preferring a message found in a JSON body.
    pub fn http_status(status: u16, body: &str) -> Self {
        let message = match extract_error_message(body) {
            Some(msg) => format!("HTTP {status}: {msg}"),
            None if body.trim().is_empty() => format!("HTTP {status}"),
            None => format!("HTTP {status}: {}", first_line(body)),
        };
        Self::new(ProviderErrorKind::HttpStatus, message)
    }

    pub fn api_error(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorKind::ApiError, message)
    }

    pub fn parse(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorKind::Parse, message)
    }

    pub fn empty_reply(provider: &str) -> Self {
        Self::new(
            ProviderErrorKind::EmptyReply,
            format!("{provider} returned an empty reply"),
        )
    }
}

/// Result type for provider operations.
pub type ProviderResult<T> = std::result::Result<T, ProviderError>;

/// Classifies a reqwest error into a `ProviderError`.
pub fn classify_reqwest_error(e: &reqwest::Error) -> ProviderError {
    if e.is_timeout() {
        ProviderError::new(ProviderErrorKind::Timeout, format!("Request timed out: {e}"))
    } else if e.is_connect() {
        ProviderError::new(ProviderErrorKind::Connection, format!("Connection failed: {e}"))
    } else if e.is_decode() {
        ProviderError::parse(format!("Failed to decode response: {e}"))
    } else {
        ProviderError::new(ProviderErrorKind::Connection, format!("Network error: {e}"))
    }
}

/// Pulls `message` / `error` / `error.message` out of a JSON error body.
fn extract_error_message(body: &str) -> Option<String> {
    let json: Value = serde_json::from_str(body).ok()?;
    let candidate = json
        .get("error")
        .and_then(|e| e.get("message").or(Some(e)))
        .or_else(|| json.get("message"))?;
    candidate.as_str().map(str::to_string)
}

fn first_line(body: &str) -> &str {
    body.trim().lines().next().unwrap_or_default()
}

/// Sends a prepared request and returns the body of a successful response.
///
/// # Errors
/// Returns a classified transport error or an HTTP status error.
pub async fn send_for_text(request: reqwest::RequestBuilder) -> ProviderResult<String> {
    let response = request
        .send()
        .await
        .map_err(|e| classify_reqwest_error(&e))?;
    let status = response.status();
    let body = response
        .text()
        .await
        .map_err(|e| classify_reqwest_error(&e))?;
    if !status.is_success() {
        return Err(ProviderError::http_status(status.as_u16(), &body));
    }
    Ok(body)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_key_wins_over_env() {
        assert_eq!(
            resolve_api_key(Some("  from-config "), "PARLEY_TEST_UNSET_KEY"),
            Some("from-config".to_string())
        );
        assert_eq!(resolve_api_key(Some("  "), "PARLEY_TEST_UNSET_KEY"), None);
    }

    #[test]
    fn test_base_url_trailing_slash_removed() {
        assert_eq!(
            resolve_base_url(Some("http://localhost:9000/"), "https://x"),
            "http://localhost:9000"
        );
        assert_eq!(resolve_base_url(None, "https://x"), "https://x");
        assert_eq!(resolve_base_url(Some(""), "https://x"), "https://x");
    }

    #[test]
    fn test_http_status_extracts_message() {
        let err = ProviderError::http_status(401, r#"{"message":"invalid api token"}"#);
        assert_eq!(err.kind, ProviderErrorKind::HttpStatus);
        assert_eq!(err.to_string(), "HTTP 401: invalid api token");

        let err = ProviderError::http_status(503, r#"{"error":"Model is loading"}"#);
        assert_eq!(err.to_string(), "HTTP 503: Model is loading");

        let err = ProviderError::http_status(500, "");
        assert_eq!(err.to_string(), "HTTP 500");
    }
}
