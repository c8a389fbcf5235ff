//! Failure classification
//!
//! Maps a failed HTTP exchange onto the small set of outcomes the executor
//! knows how to handle. The status code is checked before the body: a 429 is
//! rate limiting whatever the body says, and non-JSON error bodies carry no
//! message to match on.

use crate::error::Error;
use reqwest::header::{HeaderMap, RETRY_AFTER};
use reqwest::StatusCode;
use serde_json::Value;

/// Error message Spotify returns when a bearer token has expired
pub const TOKEN_EXPIRED_MESSAGE: &str = "The access token expired";

/// Error message the token endpoint returns for bad client credentials
pub const INVALID_CLIENT_MESSAGE: &str = "invalid_client";

/// Wait used when a 429 carries no usable `Retry-After`
pub const DEFAULT_RETRY_AFTER_SECS: u64 = 1;

/// Classified outcome of a failed exchange
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// Bearer token expired; recoverable by refreshing
    ExpiredToken,
    /// Client id/secret rejected by the token endpoint
    InvalidClient,
    /// Throttled; recoverable by waiting
    RateLimited { retry_after_seconds: u64 },
    /// A success response whose body is not JSON
    MalformedResponse { message: String },
    /// Anything else
    Other { message: String, status: u16 },
}

impl ErrorKind {
    /// Whether the executor can recover from this kind on its own
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::ExpiredToken | Self::RateLimited { .. })
    }

    /// Convert a terminal kind into the crate error
    pub fn into_error(self) -> Error {
        match self {
            Self::ExpiredToken => Error::ExpiredToken,
            Self::InvalidClient => Error::invalid_client(),
            Self::RateLimited {
                retry_after_seconds,
            } => Error::RateLimited {
                retry_after_seconds,
                attempts: 1,
            },
            Self::MalformedResponse { message } => Error::MalformedResponse { message },
            Self::Other { message, status } => Error::Api { status, message },
        }
    }
}

/// Classify a non-success response
pub fn classify_failure(status: StatusCode, headers: &HeaderMap, body: &str) -> ErrorKind {
    if status == StatusCode::TOO_MANY_REQUESTS {
        return ErrorKind::RateLimited {
            retry_after_seconds: retry_after(headers),
        };
    }

    let message = error_message(body);
    match message.as_deref() {
        Some(TOKEN_EXPIRED_MESSAGE) => ErrorKind::ExpiredToken,
        Some(INVALID_CLIENT_MESSAGE) => ErrorKind::InvalidClient,
        _ => ErrorKind::Other {
            message: message.unwrap_or_else(|| fallback_message(status, body)),
            status: status.as_u16(),
        },
    }
}

/// Decode a success body as JSON
///
/// An empty body (204 and most write endpoints) decodes to `null` instead of
/// failing as malformed; any other non-JSON body is `MalformedResponse`.
pub fn decode_success(body: &str) -> Result<Value, ErrorKind> {
    if body.trim().is_empty() {
        return Ok(Value::Null);
    }
    serde_json::from_str(body).map_err(|e| ErrorKind::MalformedResponse {
        message: e.to_string(),
    })
}

/// Extract the error message from a Spotify error body
///
/// Handles both shapes: `{"error": "invalid_client", ...}` from the
/// accounts service and `{"error": {"status": 401, "message": "..."}}` from
/// the resource API.
pub fn error_message(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    match value.get("error")? {
        Value::String(s) => Some(s.clone()),
        Value::Object(obj) => obj
            .get("message")
            .and_then(Value::as_str)
            .map(String::from),
        _ => None,
    }
}

/// Seconds to wait from the `Retry-After` header
pub fn retry_after(headers: &HeaderMap) -> u64 {
    headers
        .get(RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.trim().parse().ok())
        .unwrap_or(DEFAULT_RETRY_AFTER_SECS)
}

fn fallback_message(status: StatusCode, body: &str) -> String {
    let body = body.trim();
    if body.is_empty() {
        status
            .canonical_reason()
            .unwrap_or("Unknown error")
            .to_string()
    } else {
        body.chars().take(512).collect()
    }
}
