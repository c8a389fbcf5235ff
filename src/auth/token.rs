//! Token manager
//!
//! Owns the client credentials and tokens of one client instance and knows
//! how to mint or renew an access token through the token endpoint.

use super::types::{AccessToken, AuthorizeOptions, Credentials, Grant, TokenResponse, TokenSet};
use crate::error::{Error, Result};
use crate::http::{RequestDescriptor, RequestExecutor};
use crate::types::Host;
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};
use url::Url;

/// Token endpoint path on the accounts host
pub const TOKEN_PATH: &str = "/api/token";

/// Authorize page path on the accounts host
pub const AUTHORIZE_PATH: &str = "/authorize";

/// Holds credentials and performs OAuth2 token exchanges
pub struct TokenManager {
    credentials: RwLock<Credentials>,
}

impl TokenManager {
    pub fn new(credentials: Credentials) -> Self {
        Self {
            credentials: RwLock::new(credentials),
        }
    }

    /// Copy of the current credentials
    pub async fn credentials(&self) -> Credentials {
        self.credentials.read().await.clone()
    }

    pub async fn access_token(&self) -> Option<String> {
        self.credentials.read().await.access_token.clone()
    }

    pub async fn refresh_token(&self) -> Option<String> {
        self.credentials.read().await.refresh_token.clone()
    }

    pub async fn client_id(&self) -> Option<String> {
        self.credentials.read().await.client_id.clone()
    }

    /// Store a token; every later authorized request carries it
    pub async fn set_access_token(&self, token: impl Into<String>) {
        self.credentials.write().await.access_token = Some(token.into());
    }

    /// Drop the stored token and with it the Authorization header
    pub async fn clear_access_token(&self) {
        self.credentials.write().await.access_token = None;
    }

    pub async fn set_refresh_token(&self, token: impl Into<String>) {
        self.credentials.write().await.refresh_token = Some(token.into());
    }

    pub async fn set_client_id(&self, client_id: impl Into<String>) {
        self.credentials.write().await.client_id = Some(client_id.into());
    }

    pub async fn set_client_secret(&self, client_secret: impl Into<String>) {
        self.credentials.write().await.client_secret = Some(client_secret.into());
    }

    /// `Authorization` header value for the stored token
    pub async fn bearer_header(&self) -> Option<String> {
        self.access_token()
            .await
            .map(|token| format!("Bearer {token}"))
    }

    /// Client id and secret for HTTP Basic authentication
    pub(crate) async fn client_credentials(&self) -> Result<(String, String)> {
        let creds = self.credentials.read().await;
        match (&creds.client_id, &creds.client_secret) {
            (Some(id), Some(secret)) => Ok((id.clone(), secret.clone())),
            _ => Err(Error::config(
                "client id and client secret are required for token requests",
            )),
        }
    }

    /// Descriptor for a token endpoint call
    pub fn token_request(grant: &Grant) -> RequestDescriptor {
        RequestDescriptor::post(TOKEN_PATH)
            .host(Host::Accounts)
            .form_params(grant.form())
            .with_client_auth()
    }

    /// Exchange the stored refresh token for a new access token
    ///
    /// The new token is returned, not stored. A rotated refresh token in the
    /// response replaces the stored one.
    pub async fn refresh(
        &self,
        executor: &RequestExecutor,
        cancel: &CancellationToken,
    ) -> Result<AccessToken> {
        let refresh_token = self.refresh_token().await.ok_or(Error::MissingRefreshToken)?;
        let grant = Grant::RefreshToken { refresh_token };

        let body = executor
            .execute_unrecovered(Self::token_request(&grant), cancel)
            .await
            .map_err(|e| match e {
                Error::Cancelled => Error::Cancelled,
                other => Error::token_refresh(&other),
            })?;

        let response = TokenResponse::from_body(body);
        let token = response.access_token().ok_or(Error::MissingAccessToken)?;
        if let Some(rotated) = response.refresh_token {
            debug!("Token endpoint rotated the refresh token");
            self.set_refresh_token(rotated).await;
        }

        match token.expires_at {
            Some(at) => info!("Access token refreshed, expires at {at}"),
            None => info!("Access token refreshed"),
        }
        Ok(token)
    }

    /// Mint an app-only access token with the client-credentials grant
    pub async fn mint_from_client_credentials(
        &self,
        executor: &RequestExecutor,
        cancel: &CancellationToken,
    ) -> Result<AccessToken> {
        let body = executor
            .execute_unrecovered(Self::token_request(&Grant::ClientCredentials), cancel)
            .await?;

        TokenResponse::from_body(body)
            .access_token()
            .ok_or(Error::MissingAccessToken)
    }

    /// Complete the authorization-code flow
    pub async fn exchange_authorization_code(
        &self,
        executor: &RequestExecutor,
        code: &str,
        redirect_uri: &str,
        cancel: &CancellationToken,
    ) -> Result<TokenSet> {
        let grant = Grant::AuthorizationCode {
            code: code.to_string(),
            redirect_uri: redirect_uri.to_string(),
        };
        let body = executor
            .execute_unrecovered(Self::token_request(&grant), cancel)
            .await?;

        let response = TokenResponse::from_body(body);
        let access_token = response.access_token().ok_or(Error::MissingAccessToken)?;
        Ok(TokenSet {
            access_token,
            refresh_token: response.refresh_token,
        })
    }

    /// Build the URL to send a user to for the authorization-code flow
    ///
    /// `client_id` overrides the stored client id. Options that are not set
    /// are left out of the query string.
    pub async fn authorize_url(
        &self,
        accounts_url: &str,
        redirect_uri: &str,
        client_id: Option<&str>,
        options: &AuthorizeOptions,
    ) -> Result<Url> {
        let client_id = match client_id {
            Some(id) => id.to_string(),
            None => self
                .client_id()
                .await
                .ok_or_else(|| Error::config("client id is required for the authorize URL"))?,
        };

        let mut url = Url::parse(&format!(
            "{}{}",
            accounts_url.trim_end_matches('/'),
            AUTHORIZE_PATH
        ))?;

        {
            let mut query = url.query_pairs_mut();
            query
                .append_pair("client_id", &client_id)
                .append_pair("redirect_uri", redirect_uri)
                .append_pair("response_type", "code");
            if !options.scope.is_empty() {
                query.append_pair("scope", &options.scope.join(" "));
            }
            if let Some(show) = options.show_dialog {
                query.append_pair("show_dialog", if show { "true" } else { "false" });
            }
            if let Some(ref state) = options.state {
                query.append_pair("state", state);
            }
        }

        Ok(url)
    }
}

impl std::fmt::Debug for TokenManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenManager").finish_non_exhaustive()
    }
}
