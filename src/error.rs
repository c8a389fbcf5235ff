//! Error types for the Spotify Web API client
//!
//! This module defines the error hierarchy for the entire crate.
//! All public APIs return `Result<T, Error>` where Error is defined here.

use thiserror::Error;

/// Hint attached to `invalid_client` failures on the token endpoint
pub const INVALID_CLIENT_HINT: &str =
    "Probably missing header Content-Type: application/x-www-form-urlencoded";

/// The main error type for the client
#[derive(Error, Debug)]
pub enum Error {
    // ============================================================================
    // Token Errors
    // ============================================================================
    #[error("The access token expired")]
    ExpiredToken,

    #[error("Invalid client credentials: {hint}")]
    InvalidClient { hint: String },

    #[error("Access token missing in response")]
    MissingAccessToken,

    #[error("No refresh token available")]
    MissingRefreshToken,

    #[error("Could not refresh access token - {message}")]
    TokenRefresh { message: String },

    // ============================================================================
    // HTTP Errors
    // ============================================================================
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Rate limited after {attempts} attempts, retry after {retry_after_seconds}s")]
    RateLimited {
        retry_after_seconds: u64,
        attempts: u32,
    },

    #[error("Request timeout after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    #[error("Request cancelled")]
    Cancelled,

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    // ============================================================================
    // Data Processing Errors
    // ============================================================================
    #[error("The response is not valid json: {message}")]
    MalformedResponse { message: String },

    #[error("Failed to parse JSON: {0}")]
    Json(#[from] serde_json::Error),

    // ============================================================================
    // Configuration Errors
    // ============================================================================
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Failed to parse YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Create a config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create an API error from a status code and message
    pub fn api(status: u16, message: impl Into<String>) -> Self {
        Self::Api {
            status,
            message: message.into(),
        }
    }

    /// Create a malformed response error
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedResponse {
            message: message.into(),
        }
    }

    /// Create an invalid client error carrying the default hint
    pub fn invalid_client() -> Self {
        Self::InvalidClient {
            hint: INVALID_CLIENT_HINT.to_string(),
        }
    }

    /// Wrap a failure raised while refreshing the access token
    pub fn token_refresh(inner: &Error) -> Self {
        Self::TokenRefresh {
            message: inner.to_string(),
        }
    }

    /// HTTP status code carried by this error, if any
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::Api { status, .. } => Some(*status),
            Error::RateLimited { .. } => Some(429),
            Error::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Check if a caller could reasonably retry the same call later
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::Http(_) | Error::RateLimited { .. } | Error::Timeout { .. } => true,
            Error::Api { status, .. } => is_retryable_status(*status),
            _ => false,
        }
    }
}

/// Check if an HTTP status code is retryable
fn is_retryable_status(status: u16) -> bool {
    matches!(status, 429 | 500 | 502 | 503 | 504)
}

/// Result type alias for the crate
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::config("missing client id");
        assert_eq!(err.to_string(), "Configuration error: missing client id");

        let err = Error::api(404, "Non existing id");
        assert_eq!(err.to_string(), "API error 404: Non existing id");

        assert_eq!(Error::ExpiredToken.to_string(), "The access token expired");
    }

    #[test]
    fn test_invalid_client_hint() {
        let err = Error::invalid_client();
        assert!(err.to_string().contains("application/x-www-form-urlencoded"));
    }

    #[test]
    fn test_token_refresh_wraps_inner_message() {
        let err = Error::token_refresh(&Error::api(400, "invalid_grant"));
        assert_eq!(
            err.to_string(),
            "Could not refresh access token - API error 400: invalid_grant"
        );
    }

    #[test]
    fn test_status() {
        assert_eq!(Error::api(403, "Forbidden").status(), Some(403));
        assert_eq!(
            Error::RateLimited {
                retry_after_seconds: 1,
                attempts: 3
            }
            .status(),
            Some(429)
        );
        assert_eq!(Error::ExpiredToken.status(), None);
    }

    #[test]
    fn test_is_retryable() {
        assert!(Error::RateLimited {
            retry_after_seconds: 60,
            attempts: 5
        }
        .is_retryable());
        assert!(Error::Timeout { timeout_ms: 1000 }.is_retryable());
        assert!(Error::api(503, "").is_retryable());

        assert!(!Error::api(400, "").is_retryable());
        assert!(!Error::api(404, "").is_retryable());
        assert!(!Error::ExpiredToken.is_retryable());
        assert!(!Error::invalid_client().is_retryable());
        assert!(!Error::malformed("eof").is_retryable());
    }
}
