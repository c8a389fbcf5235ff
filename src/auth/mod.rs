//! Authentication module
//!
//! Spotify OAuth2: authorization code, client credentials and refresh token
//! grants against the accounts service.
//!
//! The `TokenManager` owns the credentials of one client instance. Token
//! requests run through the executor like any other call, but on a path that
//! never tries to refresh a token itself.

mod token;
mod types;

pub use token::{TokenManager, AUTHORIZE_PATH, TOKEN_PATH};
pub use types::{AccessToken, AuthorizeOptions, Credentials, Grant, TokenSet};
