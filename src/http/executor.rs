//! Request executor
//!
//! Dispatches request descriptors and resolves the two recoverable failure
//! modes before a result reaches the caller:
//! - an expired access token is refreshed once and the original call replayed
//! - a 429 is waited out and the same request sent again, a bounded number
//!   of times

use super::classify::{classify_failure, decode_success, ErrorKind};
use super::descriptor::{PreparedRequest, RequestDescriptor};
use super::rate_limit::{Pacer, PacingConfig};
use crate::auth::{AccessToken, Credentials, TokenManager};
use crate::error::{Error, Result};
use crate::pagination::PaginationContext;
use crate::types::{Host, ACCOUNTS_URL, API_URL};
use reqwest::header::ACCEPT;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Configuration for the request executor
#[derive(Debug, Clone)]
pub struct ExecutorConfig {
    /// Base URL of the accounts service
    pub accounts_url: String,
    /// Base URL of the resource API
    pub api_url: String,
    /// Transport timeout per request
    pub timeout: Duration,
    /// How many 429 responses to wait out before giving up
    pub max_rate_limit_retries: u32,
    /// Ceiling applied to `Retry-After`
    pub max_backoff: Duration,
    /// Hand a refreshed token back instead of replaying the expired call
    pub return_new_token_if_expired: bool,
    /// Optional client-side pacing
    pub pacing: Option<PacingConfig>,
    /// User agent string
    pub user_agent: String,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            accounts_url: ACCOUNTS_URL.to_string(),
            api_url: API_URL.to_string(),
            timeout: Duration::from_secs(30),
            max_rate_limit_retries: 5,
            max_backoff: Duration::from_secs(60),
            return_new_token_if_expired: false,
            pacing: None,
            user_agent: format!("spotify-web-api/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl ExecutorConfig {
    /// Create a new config builder
    pub fn builder() -> ExecutorConfigBuilder {
        ExecutorConfigBuilder::default()
    }

    /// Base URL for a host
    pub fn base_url(&self, host: Host) -> &str {
        match host {
            Host::Accounts => &self.accounts_url,
            Host::Api => &self.api_url,
        }
    }
}

/// Builder for executor config
#[derive(Default)]
pub struct ExecutorConfigBuilder {
    config: ExecutorConfig,
}

impl ExecutorConfigBuilder {
    /// Set the accounts service URL
    pub fn accounts_url(mut self, url: impl Into<String>) -> Self {
        self.config.accounts_url = url.into();
        self
    }

    /// Set the resource API URL
    pub fn api_url(mut self, url: impl Into<String>) -> Self {
        self.config.api_url = url.into();
        self
    }

    /// Point both hosts at one base URL
    pub fn base_url(self, url: impl Into<String>) -> Self {
        let url = url.into();
        self.accounts_url(url.clone()).api_url(url)
    }

    /// Set the transport timeout
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    /// Set how many 429 responses to wait out
    pub fn max_rate_limit_retries(mut self, retries: u32) -> Self {
        self.config.max_rate_limit_retries = retries;
        self
    }

    /// Set the ceiling on a single Retry-After wait
    pub fn max_backoff(mut self, max: Duration) -> Self {
        self.config.max_backoff = max;
        self
    }

    /// Return a refreshed token instead of replaying the expired call
    pub fn return_new_token_if_expired(mut self, enabled: bool) -> Self {
        self.config.return_new_token_if_expired = enabled;
        self
    }

    /// Enable client-side pacing
    pub fn pacing(mut self, pacing: PacingConfig) -> Self {
        self.config.pacing = Some(pacing);
        self
    }

    /// Set the user agent
    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.config.user_agent = agent.into();
        self
    }

    /// Build the config
    pub fn build(self) -> ExecutorConfig {
        self.config
    }
}

/// What a successful execution produced
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// Decoded response body
    Body(Value),
    /// The token expired and was refreshed; the original call was not
    /// replayed (`return_new_token_if_expired` mode)
    TokenRefreshed(AccessToken),
}

impl Outcome {
    /// The decoded body, if this is one
    pub fn body(&self) -> Option<&Value> {
        match self {
            Self::Body(body) => Some(body),
            Self::TokenRefreshed(_) => None,
        }
    }

    pub fn into_body(self) -> Option<Value> {
        match self {
            Self::Body(body) => Some(body),
            Self::TokenRefreshed(_) => None,
        }
    }
}

/// Result of one send, after rate-limit waits
enum Dispatch {
    Success(Value),
    Failed(ErrorKind),
}

/// Executes request descriptors against the Spotify hosts
pub struct RequestExecutor {
    client: Client,
    config: ExecutorConfig,
    tokens: TokenManager,
    pagination: PaginationContext,
    pacer: Option<Pacer>,
}

impl RequestExecutor {
    /// Create an executor with default configuration
    pub fn new(credentials: Credentials) -> Result<Self> {
        Self::with_config(ExecutorConfig::default(), credentials)
    }

    /// Create an executor with custom configuration
    pub fn with_config(config: ExecutorConfig, credentials: Credentials) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(&config.user_agent)
            .build()?;

        let pacer = config.pacing.as_ref().map(Pacer::new);

        Ok(Self {
            client,
            config,
            tokens: TokenManager::new(credentials),
            pagination: PaginationContext::new(),
            pacer,
        })
    }

    pub fn config(&self) -> &ExecutorConfig {
        &self.config
    }

    pub fn tokens(&self) -> &TokenManager {
        &self.tokens
    }

    /// Pagination context shared by every call of this executor
    pub fn pagination(&self) -> &PaginationContext {
        &self.pagination
    }

    /// Execute a descriptor with token and rate-limit recovery
    pub async fn execute(&self, descriptor: RequestDescriptor) -> Result<Outcome> {
        self.execute_with_cancel(descriptor, &CancellationToken::new())
            .await
    }

    /// Execute a descriptor, aborting sends and backoff sleeps on `cancel`
    pub async fn execute_with_cancel(
        &self,
        descriptor: RequestDescriptor,
        cancel: &CancellationToken,
    ) -> Result<Outcome> {
        let snapshot = self.prepare(descriptor);
        debug!(
            "Captured request snapshot: {} {}",
            snapshot.method,
            snapshot.url()
        );

        let mut refreshed = false;
        loop {
            match self.send_with_backoff(&snapshot, cancel).await? {
                Dispatch::Success(body) => {
                    self.pagination.update_from_envelope(&body);
                    return Ok(Outcome::Body(body));
                }
                Dispatch::Failed(ErrorKind::ExpiredToken)
                    if snapshot.requires_auth && !refreshed =>
                {
                    warn!("Access token expired, refreshing");
                    self.tokens.clear_access_token().await;
                    let token = self.tokens.refresh(self, cancel).await?;

                    if self.config.return_new_token_if_expired {
                        return Ok(Outcome::TokenRefreshed(token));
                    }

                    self.tokens.set_access_token(token.value).await;
                    refreshed = true;
                    debug!(
                        "Replaying request after refresh: {} {}",
                        snapshot.method,
                        snapshot.url()
                    );
                }
                Dispatch::Failed(kind) => return Err(kind.into_error()),
            }
        }
    }

    /// Execute and decode the body into `T`
    ///
    /// Fails with `ExpiredToken` if the executor handed back a refreshed
    /// token instead of a body.
    pub async fn execute_json<T: DeserializeOwned>(
        &self,
        descriptor: RequestDescriptor,
    ) -> Result<T> {
        match self.execute(descriptor).await? {
            Outcome::Body(body) => Ok(serde_json::from_value(body)?),
            Outcome::TokenRefreshed(_) => Err(Error::ExpiredToken),
        }
    }

    /// Execute without token recovery
    ///
    /// Token endpoint calls go through here so an auth failure while
    /// refreshing can never trigger another refresh.
    pub(crate) async fn execute_unrecovered(
        &self,
        descriptor: RequestDescriptor,
        cancel: &CancellationToken,
    ) -> Result<Value> {
        let prepared = self.prepare(descriptor);
        match self.send_with_backoff(&prepared, cancel).await? {
            Dispatch::Success(body) => {
                self.pagination.update_from_envelope(&body);
                Ok(body)
            }
            Dispatch::Failed(kind) => Err(kind.into_error()),
        }
    }

    /// Apply the descriptor's pagination flag and merge the query
    fn prepare(&self, descriptor: RequestDescriptor) -> PreparedRequest {
        let query = self
            .pagination
            .prepare_query(descriptor.paginated, &descriptor.query);

        PreparedRequest {
            method: descriptor.method,
            base_url: self.config.base_url(descriptor.host).to_string(),
            path: descriptor.path,
            query,
            form: descriptor.form,
            requires_auth: descriptor.requires_auth,
            client_auth: descriptor.client_auth,
        }
    }

    /// Send, waiting out 429s up to the configured retry count
    async fn send_with_backoff(
        &self,
        prepared: &PreparedRequest,
        cancel: &CancellationToken,
    ) -> Result<Dispatch> {
        let max_retries = self.config.max_rate_limit_retries;
        let mut attempts = 0;

        loop {
            match self.send(prepared, cancel).await? {
                Dispatch::Failed(ErrorKind::RateLimited {
                    retry_after_seconds,
                }) => {
                    attempts += 1;
                    if attempts > max_retries {
                        return Err(Error::RateLimited {
                            retry_after_seconds,
                            attempts,
                        });
                    }

                    let wait = self.backoff(retry_after_seconds);
                    warn!(
                        "Rate limited (429), attempt {}/{}, waiting {:?}",
                        attempts,
                        max_retries + 1,
                        wait
                    );
                    tokio::select! {
                        () = cancel.cancelled() => return Err(Error::Cancelled),
                        () = tokio::time::sleep(wait) => {}
                    }
                }
                dispatch => return Ok(dispatch),
            }
        }
    }

    /// One exchange with the server
    async fn send(&self, prepared: &PreparedRequest, cancel: &CancellationToken) -> Result<Dispatch> {
        if let Some(ref pacer) = self.pacer {
            tokio::select! {
                () = cancel.cancelled() => return Err(Error::Cancelled),
                () = pacer.wait() => {}
            }
        }

        let url = prepared.url();
        let mut req = self
            .client
            .request(prepared.method.into(), &url)
            .header(ACCEPT, "application/json");

        if !prepared.query.is_empty() {
            req = req.query(prepared.query.as_pairs());
        }

        // reqwest sets Content-Type: application/x-www-form-urlencoded here
        if !prepared.form.is_empty() {
            req = req.form(prepared.form.as_pairs());
        }

        if prepared.requires_auth {
            if let Some(token) = self.tokens.access_token().await {
                req = req.bearer_auth(token);
            }
        }

        if prepared.client_auth {
            let (client_id, client_secret) = self.tokens.client_credentials().await?;
            req = req.basic_auth(client_id, Some(client_secret));
        }

        let response = tokio::select! {
            () = cancel.cancelled() => return Err(Error::Cancelled),
            result = req.send() => result.map_err(|e| self.transport_error(e))?,
        };

        let status = response.status();
        let headers = response.headers().clone();
        let body = response.text().await.map_err(|e| self.transport_error(e))?;

        if status.is_success() {
            debug!("Request succeeded: {} {}", prepared.method, url);
            return Ok(match decode_success(&body) {
                Ok(value) => Dispatch::Success(value),
                Err(kind) => Dispatch::Failed(kind),
            });
        }

        let kind = classify_failure(status, &headers, &body);
        debug!(
            "Request failed: {} {} -> {} ({:?})",
            prepared.method,
            url,
            status.as_u16(),
            kind
        );
        Ok(Dispatch::Failed(kind))
    }

    /// Delay before retrying a 429, capped at `max_backoff`
    pub fn backoff(&self, retry_after_seconds: u64) -> Duration {
        std::cmp::min(
            Duration::from_secs(retry_after_seconds),
            self.config.max_backoff,
        )
    }

    fn transport_error(&self, e: reqwest::Error) -> Error {
        if e.is_timeout() {
            Error::Timeout {
                timeout_ms: self.config.timeout.as_millis() as u64,
            }
        } else {
            Error::Http(e)
        }
    }
}

impl std::fmt::Debug for RequestExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestExecutor")
            .field("config", &self.config)
            .field("pagination", &self.pagination.snapshot())
            .field("has_pacer", &self.pacer.is_some())
            .finish_non_exhaustive()
    }
}
