// Allow common clippy pedantic lints that aren't critical for this codebase
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_lossless)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::ref_option)]
#![allow(clippy::unused_self)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::return_self_not_must_use)]
#![allow(clippy::items_after_statements)]
#![allow(clippy::unnecessary_wraps)]
#![allow(clippy::match_same_arms)]
#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::unused_async)]

//! # Spotify Web API client
//!
//! The request pipeline behind a Spotify Web API SDK: dispatch, OAuth2 token
//! handling, pagination bookkeeping and recovery from expired tokens and
//! rate limiting.
//!
//! ## Features
//!
//! - **Token Flows**: Authorization code, client credentials and refresh token
//! - **Transparent Refresh**: An expired access token is refreshed once and
//!   the original request replayed
//! - **Rate Limiting**: 429 responses are waited out per `Retry-After`
//! - **Pagination**: `limit`/`offset` merged into paginated calls and updated
//!   from response envelopes
//! - **Pacing**: Optional client-side token bucket
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use spotify_web_api::{ClientConfig, RequestDescriptor, SpotifyClient, Result};
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let config = ClientConfig::builder()
//!         .client("client-id", "client-secret")
//!         .refresh_token("refresh-token")
//!         .build();
//!     let client = SpotifyClient::new(config)?;
//!     client.refresh_access_token().await?;
//!
//!     client.set_pagination_limit(50);
//!     let outcome = client
//!         .send(RequestDescriptor::get("/v1/me/playlists").paginated(true))
//!         .await?;
//!     println!("{:?} of {:?}", outcome.body(), client.pagination_total());
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                         SpotifyClient                           │
//! │  token flows   pagination knobs   send(descriptor) → Outcome    │
//! └─────────────────────────────────────────────────────────────────┘
//!                                │
//! ┌────────────────┬─────────────┴────────┬─────────────────────────┐
//! │  TokenManager  │   RequestExecutor    │   PaginationContext     │
//! ├────────────────┼──────────────────────┼─────────────────────────┤
//! │ Credentials    │ Snapshot + replay    │ limit / offset / total  │
//! │ Refresh grant  │ 429 backoff          │ Query merge             │
//! │ Client creds   │ Classification       │ Envelope update         │
//! │ Authorize URL  │ Pacing, cancellation │                         │
//! └────────────────┴──────────────────────┴─────────────────────────┘
//! ```

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::doc_markdown)]

// ============================================================================
// Module declarations
// ============================================================================

/// Error types for the client
pub mod error;

/// Common types and type aliases
pub mod types;

/// OAuth2 credentials and token flows
pub mod auth;

/// Request execution with token recovery and rate limiting
pub mod http;

/// Pagination state
pub mod pagination;

/// Client configuration
pub mod config;

/// Client facade
pub mod client;

/// Command-line interface
pub mod cli;

// ============================================================================
// Re-exports
// ============================================================================

pub use error::{Error, Result};
pub use types::*;

pub use auth::{AccessToken, AuthorizeOptions, Credentials, TokenSet};
pub use client::SpotifyClient;
pub use config::ClientConfig;
pub use http::{Outcome, RequestDescriptor, RequestExecutor};
pub use pagination::{PaginationContext, PaginationState};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");
