//! Spotify client facade
//!
//! `SpotifyClient` bundles one executor, its credentials and its pagination
//! context behind the operations an application calls directly: token
//! flows, pagination knobs and descriptor dispatch.

use crate::auth::{AccessToken, AuthorizeOptions, Credentials, TokenSet};
use crate::config::ClientConfig;
use crate::error::Result;
use crate::http::{Outcome, RequestDescriptor, RequestExecutor};
use crate::pagination::PaginationContext;
use serde::de::DeserializeOwned;
use tokio_util::sync::CancellationToken;
use tracing::debug;
use url::Url;

/// Client for the Spotify Web API
#[derive(Debug)]
pub struct SpotifyClient {
    executor: RequestExecutor,
}

impl SpotifyClient {
    /// Create a client from a full configuration
    pub fn new(config: ClientConfig) -> Result<Self> {
        let executor = RequestExecutor::with_config(config.executor_config(), config.credentials())?;
        Ok(Self { executor })
    }

    /// Create a client with default settings
    pub fn with_credentials(credentials: Credentials) -> Result<Self> {
        Ok(Self {
            executor: RequestExecutor::new(credentials)?,
        })
    }

    /// The underlying executor
    pub fn executor(&self) -> &RequestExecutor {
        &self.executor
    }

    // ========================================================================
    // Pagination
    // ========================================================================

    /// Page size for paginated calls; values below 1 are ignored
    pub fn set_pagination_limit(&self, limit: i64) {
        self.executor.pagination().set_limit(limit);
    }

    /// Offset for paginated calls; negative values are ignored
    pub fn set_pagination_offset(&self, offset: i64) {
        self.executor.pagination().set_offset(offset);
    }

    /// Total reported by the last paginated response
    pub fn pagination_total(&self) -> Option<u64> {
        self.executor.pagination().total()
    }

    pub fn pagination(&self) -> &PaginationContext {
        self.executor.pagination()
    }

    // ========================================================================
    // Credentials
    // ========================================================================

    pub async fn access_token(&self) -> Option<String> {
        self.executor.tokens().access_token().await
    }

    pub async fn refresh_token(&self) -> Option<String> {
        self.executor.tokens().refresh_token().await
    }

    pub async fn client_id(&self) -> Option<String> {
        self.executor.tokens().client_id().await
    }

    pub async fn set_access_token(&self, token: impl Into<String>) {
        self.executor.tokens().set_access_token(token).await;
    }

    pub async fn set_refresh_token(&self, token: impl Into<String>) {
        self.executor.tokens().set_refresh_token(token).await;
    }

    pub async fn set_client_id(&self, client_id: impl Into<String>) {
        self.executor.tokens().set_client_id(client_id).await;
    }

    pub async fn set_client_secret(&self, client_secret: impl Into<String>) {
        self.executor.tokens().set_client_secret(client_secret).await;
    }

    // ========================================================================
    // Token Flows
    // ========================================================================

    /// URL to send a user to for the authorization-code flow
    pub async fn authorize_url(
        &self,
        redirect_uri: &str,
        client_id: Option<&str>,
        options: &AuthorizeOptions,
    ) -> Result<Url> {
        self.executor
            .tokens()
            .authorize_url(
                &self.executor.config().accounts_url,
                redirect_uri,
                client_id,
                options,
            )
            .await
    }

    /// Exchange an authorization code for access and refresh tokens
    ///
    /// Nothing is stored; pass the tokens to the setters to use them.
    pub async fn access_token_with_code(&self, code: &str, redirect_uri: &str) -> Result<TokenSet> {
        self.executor
            .tokens()
            .exchange_authorization_code(
                &self.executor,
                code,
                redirect_uri,
                &CancellationToken::new(),
            )
            .await
    }

    /// Mint an app-only token with the client-credentials grant
    ///
    /// A given id or secret replaces the stored one before the exchange.
    pub async fn access_token_with_credentials(
        &self,
        client_id: Option<&str>,
        client_secret: Option<&str>,
    ) -> Result<AccessToken> {
        let tokens = self.executor.tokens();
        if let Some(id) = client_id {
            tokens.set_client_id(id).await;
        }
        if let Some(secret) = client_secret {
            tokens.set_client_secret(secret).await;
        }

        tokens
            .mint_from_client_credentials(&self.executor, &CancellationToken::new())
            .await
    }

    /// Refresh the access token and store it
    pub async fn refresh_access_token(&self) -> Result<AccessToken> {
        let tokens = self.executor.tokens();
        let token = tokens
            .refresh(&self.executor, &CancellationToken::new())
            .await?;
        tokens.set_access_token(token.value.clone()).await;
        Ok(token)
    }

    // ========================================================================
    // Dispatch
    // ========================================================================

    /// Execute a request descriptor
    pub async fn send(&self, descriptor: RequestDescriptor) -> Result<Outcome> {
        self.executor.execute(descriptor).await
    }

    /// Execute a request descriptor, aborting on `cancel`
    pub async fn send_with_cancel(
        &self,
        descriptor: RequestDescriptor,
        cancel: &CancellationToken,
    ) -> Result<Outcome> {
        self.executor.execute_with_cancel(descriptor, cancel).await
    }

    /// Execute and decode the body into `T`
    pub async fn get_json<T: DeserializeOwned>(&self, descriptor: RequestDescriptor) -> Result<T> {
        debug!("Decoding {} {} into a typed value", descriptor.method, descriptor.path);
        self.executor.execute_json(descriptor).await
    }
}
