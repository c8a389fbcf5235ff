//! HTTP execution module
//!
//! Turns request descriptors into HTTP exchanges and resolves recoverable
//! failures before returning.
//!
//! # Features
//!
//! - **Token Recovery**: An expired access token is refreshed once and the
//!   original request replayed
//! - **Rate Limiting**: 429 responses are waited out per `Retry-After`, with a
//!   retry cap and a backoff ceiling
//! - **Classification**: Failures map onto a fixed set of error kinds
//! - **Pacing**: Optional token bucket ahead of dispatch using governor
//! - **Cancellation**: Sends and backoff sleeps abort on a cancellation token

mod classify;
mod descriptor;
mod executor;
mod rate_limit;

pub use classify::{
    classify_failure, decode_success, error_message, retry_after, ErrorKind,
    DEFAULT_RETRY_AFTER_SECS, INVALID_CLIENT_MESSAGE, TOKEN_EXPIRED_MESSAGE,
};
pub use descriptor::{PreparedRequest, RequestDescriptor};
pub use executor::{ExecutorConfig, ExecutorConfigBuilder, Outcome, RequestExecutor};
pub use rate_limit::{Pacer, PacingConfig};
