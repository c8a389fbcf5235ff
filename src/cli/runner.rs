//! CLI runner - executes commands

use crate::auth::{AccessToken, AuthorizeOptions};
use crate::cli::commands::{Cli, Commands, OutputFormat};
use crate::client::SpotifyClient;
use crate::config::ClientConfig;
use crate::error::Result;
use crate::http::{Outcome, RequestDescriptor};
use crate::types::Params;
use serde_json::{json, Value};
use tracing::debug;

/// CLI runner
pub struct Runner {
    cli: Cli,
}

impl Runner {
    /// Create a new runner
    pub fn new(cli: Cli) -> Self {
        Self { cli }
    }

    /// Run the CLI command
    pub async fn run(&self) -> Result<()> {
        let client = SpotifyClient::new(self.load_config()?)?;

        match &self.cli.command {
            Commands::AuthorizeUrl {
                redirect_uri,
                client_id,
                scope,
                show_dialog,
                state,
            } => {
                let mut options = AuthorizeOptions::new().scope(scope.iter().cloned());
                options.show_dialog = *show_dialog;
                options.state.clone_from(state);

                let url = client
                    .authorize_url(redirect_uri, client_id.as_deref(), &options)
                    .await?;
                self.output_message(&json!({ "authorize_url": url.as_str() }));
                Ok(())
            }
            Commands::ExchangeCode { code, redirect_uri } => {
                let tokens = client.access_token_with_code(code, redirect_uri).await?;
                let mut msg = token_json(&tokens.access_token);
                msg["refresh_token"] = json!(tokens.refresh_token);
                self.output_message(&msg);
                Ok(())
            }
            Commands::ClientToken {
                client_id,
                client_secret,
            } => {
                let token = client
                    .access_token_with_credentials(client_id.as_deref(), client_secret.as_deref())
                    .await?;
                self.output_message(&token_json(&token));
                Ok(())
            }
            Commands::Refresh => {
                let token = client.refresh_access_token().await?;
                let mut msg = token_json(&token);
                msg["refresh_token"] = json!(client.refresh_token().await);
                self.output_message(&msg);
                Ok(())
            }
            Commands::Request {
                path,
                method,
                host,
                query,
                form,
                paginate,
                limit,
                offset,
                no_auth,
            } => {
                if let Some(limit) = limit {
                    client.set_pagination_limit(*limit);
                }
                if let Some(offset) = offset {
                    client.set_pagination_offset(*offset);
                }

                let mut descriptor = RequestDescriptor::new(*method, path)
                    .host((*host).into())
                    .query_params(query.iter().cloned().collect::<Params>())
                    .form_params(form.iter().cloned().collect::<Params>())
                    .paginated(*paginate);
                if *no_auth {
                    descriptor = descriptor.without_auth();
                }

                debug!("Sending {} {}", descriptor.method, descriptor.path);
                match client.send(descriptor).await? {
                    Outcome::Body(body) => self.output_message(&body),
                    Outcome::TokenRefreshed(token) => self.output_message(&token_json(&token)),
                }

                if *paginate {
                    let state = client.pagination().snapshot();
                    self.output_message(&json!({
                        "pagination": {
                            "limit": state.limit(),
                            "offset": state.offset,
                            "total": state.total,
                        }
                    }));
                }
                Ok(())
            }
        }
    }

    /// Load client config from `--config`, then the environment
    fn load_config(&self) -> Result<ClientConfig> {
        match &self.cli.config {
            Some(path) => ClientConfig::load(path),
            None => {
                let mut config = ClientConfig::default();
                config.apply_env();
                Ok(config)
            }
        }
    }

    /// Output a message
    fn output_message(&self, msg: &Value) {
        match self.cli.format {
            OutputFormat::Json => {
                println!("{}", serde_json::to_string(msg).unwrap_or_default());
            }
            OutputFormat::Pretty => {
                println!("{}", serde_json::to_string_pretty(msg).unwrap_or_default());
            }
        }
    }
}

fn token_json(token: &AccessToken) -> Value {
    json!({
        "access_token": token.value,
        "expires_at": token.expires_at.map(|at| at.to_rfc3339()),
        "scope": token.scope,
    })
}
