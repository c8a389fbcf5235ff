//! CLI module
//!
//! Command-line interface over the client.
//!
//! # Commands
//!
//! - `authorize-url` - Print the authorization-code flow URL
//! - `exchange-code` - Exchange an authorization code for tokens
//! - `client-token` - Mint a client-credentials token
//! - `refresh` - Refresh the access token
//! - `request` - Send a request and print the JSON response

mod commands;
mod runner;

pub use commands::{Cli, Commands, HostArg, OutputFormat};
pub use runner::Runner;
