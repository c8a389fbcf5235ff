//! CLI commands and argument parsing

use crate::types::{Host, Method};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Spotify Web API command-line client
#[derive(Parser, Debug)]
#[command(name = "spotify-web-api")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Client configuration file (YAML or JSON)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Output format
    #[arg(short, long, global = true, default_value = "json")]
    pub format: OutputFormat,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print the URL that starts the authorization-code flow
    AuthorizeUrl {
        /// Callback URL registered for the application
        #[arg(long)]
        redirect_uri: String,

        /// Client id to use instead of the configured one
        #[arg(long)]
        client_id: Option<String>,

        /// Scopes to request (comma-separated)
        #[arg(long, value_delimiter = ',')]
        scope: Vec<String>,

        /// Force the consent dialog
        #[arg(long)]
        show_dialog: Option<bool>,

        /// Opaque state echoed back on the redirect
        #[arg(long)]
        state: Option<String>,
    },

    /// Exchange an authorization code for tokens
    ExchangeCode {
        /// Code from the authorize redirect
        #[arg(long)]
        code: String,

        /// Callback URL used for the authorize request
        #[arg(long)]
        redirect_uri: String,
    },

    /// Mint an app-only token with the client-credentials grant
    ClientToken {
        /// Client id to use instead of the configured one
        #[arg(long)]
        client_id: Option<String>,

        /// Client secret to use instead of the configured one
        #[arg(long)]
        client_secret: Option<String>,
    },

    /// Exchange the configured refresh token for a new access token
    Refresh,

    /// Send a request to the API and print the response
    Request {
        /// Path, e.g. /v1/me/playlists
        path: String,

        /// HTTP method
        #[arg(short = 'X', long, default_value = "GET")]
        method: Method,

        /// Target host
        #[arg(long, default_value = "api")]
        host: HostArg,

        /// Query parameter (repeatable)
        #[arg(short, long, value_parser = parse_key_val)]
        query: Vec<(String, String)>,

        /// Form body parameter (repeatable)
        #[arg(long, value_parser = parse_key_val)]
        form: Vec<(String, String)>,

        /// Treat the response as a paginated collection
        #[arg(long)]
        paginate: bool,

        /// Page size for paginated requests
        #[arg(long)]
        limit: Option<i64>,

        /// Offset for paginated requests
        #[arg(long)]
        offset: Option<i64>,

        /// Do not send the access token
        #[arg(long)]
        no_auth: bool,
    },
}

/// Output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Compact JSON (one document per line)
    Json,
    /// Indented JSON
    Pretty,
}

/// Host selection on the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum HostArg {
    /// accounts.spotify.com
    Accounts,
    /// api.spotify.com
    Api,
}

impl From<HostArg> for Host {
    fn from(host: HostArg) -> Self {
        match host {
            HostArg::Accounts => Host::Accounts,
            HostArg::Api => Host::Api,
        }
    }
}

/// Parse a `key=value` pair
fn parse_key_val(s: &str) -> Result<(String, String), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected key=value, got '{s}'"))?;
    if key.is_empty() {
        return Err(format!("empty key in '{s}'"));
    }
    Ok((key.to_string(), value.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_key_val() {
        assert_eq!(
            parse_key_val("q=artist:abba"),
            Ok(("q".to_string(), "artist:abba".to_string()))
        );
        assert_eq!(
            parse_key_val("ids=a=b"),
            Ok(("ids".to_string(), "a=b".to_string()))
        );
        assert!(parse_key_val("novalue").is_err());
        assert!(parse_key_val("=x").is_err());
    }

    #[test]
    fn test_parse_request_command() {
        let cli = Cli::try_parse_from([
            "spotify-web-api",
            "--verbose",
            "request",
            "/v1/search",
            "-q",
            "q=abba",
            "-q",
            "type=artist",
            "--paginate",
            "--limit",
            "10",
        ])
        .unwrap();

        assert!(cli.verbose);
        match cli.command {
            Commands::Request {
                path,
                method,
                host,
                query,
                paginate,
                limit,
                offset,
                no_auth,
                ..
            } => {
                assert_eq!(path, "/v1/search");
                assert_eq!(method, Method::GET);
                assert_eq!(host, HostArg::Api);
                assert_eq!(query.len(), 2);
                assert!(paginate);
                assert_eq!(limit, Some(10));
                assert_eq!(offset, None);
                assert!(!no_auth);
            }
            other => panic!("Expected Request, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_authorize_url_scopes() {
        let cli = Cli::try_parse_from([
            "spotify-web-api",
            "authorize-url",
            "--redirect-uri",
            "http://localhost/cb",
            "--scope",
            "user-read-private,user-read-email",
            "--show-dialog",
            "true",
        ])
        .unwrap();

        match cli.command {
            Commands::AuthorizeUrl {
                scope, show_dialog, ..
            } => {
                assert_eq!(scope, vec!["user-read-private", "user-read-email"]);
                assert_eq!(show_dialog, Some(true));
            }
            other => panic!("Expected AuthorizeUrl, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_method_case_insensitive() {
        let cli = Cli::try_parse_from(["spotify-web-api", "request", "/v1/me", "-X", "put"]).unwrap();
        match cli.command {
            Commands::Request { method, .. } => assert_eq!(method, Method::PUT),
            other => panic!("Expected Request, got {other:?}"),
        }
    }
}
