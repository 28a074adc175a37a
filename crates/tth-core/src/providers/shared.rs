//! Provider-agnostic types shared by model backends.

use std::fmt;

use anyhow::{Context, Result};
use futures_util::stream::BoxStream;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// User-Agent header sent with every provider request.
pub const USER_AGENT: &str = concat!("tth/", env!("CARGO_PKG_VERSION"));

/// Resolves a base URL with precedence: env > config > default.
///
/// # Errors
/// Returns an error if the env or config value is not a valid URL.
pub fn resolve_base_url(
    config_base_url: Option<&str>,
    env_var: &str,
    default_url: &str,
    provider_name: &str,
) -> Result<String> {
    if let Ok(env_url) = std::env::var(env_var) {
        let trimmed = env_url.trim();
        if !trimmed.is_empty() {
            validate_url(trimmed, provider_name)?;
            return Ok(trimmed.to_string());
        }
    }

    if let Some(config_url) = config_base_url {
        let trimmed = config_url.trim();
        if !trimmed.is_empty() {
            validate_url(trimmed, provider_name)?;
            return Ok(trimmed.to_string());
        }
    }

    Ok(default_url.to_string())
}

fn validate_url(url: &str, provider_name: &str) -> Result<()> {
    url::Url::parse(url).with_context(|| format!("Invalid {provider_name} base URL: {url}"))?;
    Ok(())
}

/// Categories of provider errors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderErrorKind {
    /// HTTP status error (4xx, 5xx)
    HttpStatus,
    /// Connection failure or request timeout
    Timeout,
    /// Response body could not be decoded
    Parse,
    /// Error reported by the model server inside a response
    ApiError,
}

impl fmt::Display for ProviderErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProviderErrorKind::HttpStatus => write!(f, "http_status"),
            ProviderErrorKind::Timeout => write!(f, "timeout"),
            ProviderErrorKind::Parse => write!(f, "parse"),
            ProviderErrorKind::ApiError => write!(f, "api_error"),
        }
    }
}

/// Structured error from the provider with kind and details.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderError {
    pub kind: ProviderErrorKind,
    /// One-line summary suitable for display
    pub message: String,
    /// Optional additional details (e.g., raw error body)
    pub details: Option<String>,
}

impl ProviderError {
    pub fn new(kind: ProviderErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            details: None,
        }
    }

    /// Creates an HTTP status error, surfacing the server's error message
    /// when the body is JSON with an `error` field (either a string or an
    /// object with a `message`).
    pub fn http_status(status: u16, body: &str) -> Self {
        if body.trim().is_empty() {
            return Self::new(ProviderErrorKind::HttpStatus, format!("HTTP {status}"));
        }

        let server_message = serde_json::from_str::<Value>(body)
            .ok()
            .and_then(|json| json.get("error").cloned())
            .and_then(|error| match error {
                Value::String(msg) => Some(msg),
                Value::Object(obj) => obj
                    .get("message")
                    .and_then(Value::as_str)
                    .map(str::to_string),
                _ => None,
            });

        let message = match server_message {
            Some(msg) => format!("HTTP {status}: {msg}"),
            None => format!("HTTP {status}"),
        };
        Self {
            kind: ProviderErrorKind::HttpStatus,
            message,
            details: Some(body.to_string()),
        }
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorKind::Timeout, message)
    }

    pub fn parse(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorKind::Parse, message)
    }

    /// Creates an API error (from an in-band error record).
    pub fn api_error(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorKind::ApiError, message)
    }
}

impl fmt::Display for ProviderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ProviderError {}

/// Result type for provider operations.
pub type ProviderResult<T> = std::result::Result<T, ProviderError>;

/// Events emitted while a response streams in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamEvent {
    /// Next piece of generated text
    TextDelta { text: String },
    /// Generation finished
    Completed { done_reason: Option<String> },
    /// Error reported mid-stream by the server
    Error { message: String },
}

/// Boxed stream of provider events.
pub type ProviderStream = BoxStream<'static, ProviderResult<StreamEvent>>;

#[cfg(test)]
mod tests {
    use super::*;

    const UNSET_ENV: &str = "TTH_TEST_BASE_URL_NEVER_SET";

    #[test]
    fn test_resolve_base_url_prefers_config_over_default() {
        let url = resolve_base_url(
            Some(" http://gpu-box:11434 "),
            UNSET_ENV,
            "http://localhost:11434",
            "Ollama",
        )
        .unwrap();
        assert_eq!(url, "http://gpu-box:11434");
    }

    #[test]
    fn test_resolve_base_url_falls_back_to_default() {
        let url = resolve_base_url(Some("  "), UNSET_ENV, "http://localhost:11434", "Ollama")
            .unwrap();
        assert_eq!(url, "http://localhost:11434");
    }

    #[test]
    fn test_resolve_base_url_rejects_invalid_url() {
        let err = resolve_base_url(Some("not a url"), UNSET_ENV, "http://x", "Ollama").unwrap_err();
        assert!(err.to_string().contains("Invalid Ollama base URL"));
    }

    #[test]
    fn test_http_status_with_ollama_error_string() {
        let err = ProviderError::http_status(404, r#"{"error":"model 'nope' not found"}"#);
        assert_eq!(err.kind, ProviderErrorKind::HttpStatus);
        assert_eq!(err.message, "HTTP 404: model 'nope' not found");
        assert!(err.details.is_some());
    }

    #[test]
    fn test_http_status_with_error_object() {
        let err = ProviderError::http_status(500, r#"{"error":{"message":"boom"}}"#);
        assert_eq!(err.to_string(), "HTTP 500: boom");
    }

    #[test]
    fn test_http_status_plain_body() {
        let err = ProviderError::http_status(502, "bad gateway");
        assert_eq!(err.message, "HTTP 502");
        assert_eq!(err.details.as_deref(), Some("bad gateway"));

        let empty = ProviderError::http_status(503, "");
        assert_eq!(empty.message, "HTTP 503");
        assert!(empty.details.is_none());
    }
}
