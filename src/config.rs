//! Client configuration
//!
//! `ClientConfig` is read from YAML or JSON, then overridden from the
//! environment. Every field except the credentials has a default.

use crate::auth::Credentials;
use crate::error::{Error, Result};
use crate::http::{ExecutorConfig, PacingConfig};
use crate::types::{ACCOUNTS_URL, API_URL};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

/// Environment variable overriding `client_id`
pub const ENV_CLIENT_ID: &str = "SPOTIFY_CLIENT_ID";
/// Environment variable overriding `client_secret`
pub const ENV_CLIENT_SECRET: &str = "SPOTIFY_CLIENT_SECRET";
/// Environment variable overriding `access_token`
pub const ENV_ACCESS_TOKEN: &str = "SPOTIFY_ACCESS_TOKEN";
/// Environment variable overriding `refresh_token`
pub const ENV_REFRESH_TOKEN: &str = "SPOTIFY_REFRESH_TOKEN";

// ============================================================================
// Client Config
// ============================================================================

/// Complete client configuration
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Application client id
    #[serde(default)]
    pub client_id: Option<String>,

    /// Application client secret
    #[serde(default)]
    pub client_secret: Option<String>,

    /// Access token to start with
    #[serde(default)]
    pub access_token: Option<String>,

    /// Refresh token to start with
    #[serde(default)]
    pub refresh_token: Option<String>,

    /// Accounts service base URL
    #[serde(default = "default_accounts_url")]
    pub accounts_url: String,

    /// Resource API base URL
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// Transport timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// 429 responses waited out before giving up
    #[serde(default = "default_max_rate_limit_retries")]
    pub max_rate_limit_retries: u32,

    /// Ceiling on a single Retry-After wait, in seconds
    #[serde(default = "default_max_backoff")]
    pub max_backoff_secs: u64,

    /// Return a refreshed token instead of replaying the expired call
    #[serde(default)]
    pub return_new_token_if_expired: bool,

    /// Client-side pacing; off when absent
    #[serde(default)]
    pub pacing: Option<PacingConfig>,

    /// User agent sent with every request
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

fn default_accounts_url() -> String {
    ACCOUNTS_URL.to_string()
}

fn default_api_url() -> String {
    API_URL.to_string()
}

fn default_timeout() -> u64 {
    30
}

fn default_max_rate_limit_retries() -> u32 {
    5
}

fn default_max_backoff() -> u64 {
    60
}

fn default_user_agent() -> String {
    format!("{}/{}", crate::NAME, crate::VERSION)
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            client_id: None,
            client_secret: None,
            access_token: None,
            refresh_token: None,
            accounts_url: default_accounts_url(),
            api_url: default_api_url(),
            timeout_secs: default_timeout(),
            max_rate_limit_retries: default_max_rate_limit_retries(),
            max_backoff_secs: default_max_backoff(),
            return_new_token_if_expired: false,
            pacing: None,
            user_agent: default_user_agent(),
        }
    }
}

impl ClientConfig {
    /// Create a new config builder
    pub fn builder() -> ClientConfigBuilder {
        ClientConfigBuilder::default()
    }

    /// Read a config file, then apply environment overrides
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let mut config = Self::from_file(path)?;
        config.apply_env();
        Ok(config)
    }

    /// Read a config file; `.json` is parsed as JSON, anything else as YAML
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            Error::config(format!(
                "Failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;

        let is_json = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

        if is_json {
            Self::from_json_str(&content)
        } else {
            Self::from_yaml_str(&content)
        }
    }

    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml)
            .map_err(|e| Error::config(format!("Failed to parse config YAML: {e}")))
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        serde_json::from_str(json)
            .map_err(|e| Error::config(format!("Failed to parse config JSON: {e}")))
    }

    /// Override credentials from `SPOTIFY_*` environment variables
    pub fn apply_env(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Override credentials from a key lookup; empty values are ignored
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let get = |key: &str| lookup(key).filter(|v| !v.is_empty());

        if let Some(v) = get(ENV_CLIENT_ID) {
            self.client_id = Some(v);
        }
        if let Some(v) = get(ENV_CLIENT_SECRET) {
            self.client_secret = Some(v);
        }
        if let Some(v) = get(ENV_ACCESS_TOKEN) {
            self.access_token = Some(v);
        }
        if let Some(v) = get(ENV_REFRESH_TOKEN) {
            self.refresh_token = Some(v);
        }
    }

    /// Credentials carried by this config
    pub fn credentials(&self) -> Credentials {
        Credentials {
            client_id: self.client_id.clone(),
            client_secret: self.client_secret.clone(),
            access_token: self.access_token.clone(),
            refresh_token: self.refresh_token.clone(),
        }
    }

    /// Executor settings carried by this config
    pub fn executor_config(&self) -> ExecutorConfig {
        ExecutorConfig {
            accounts_url: self.accounts_url.clone(),
            api_url: self.api_url.clone(),
            timeout: Duration::from_secs(self.timeout_secs),
            max_rate_limit_retries: self.max_rate_limit_retries,
            max_backoff: Duration::from_secs(self.max_backoff_secs),
            return_new_token_if_expired: self.return_new_token_if_expired,
            pacing: self.pacing.clone(),
            user_agent: self.user_agent.clone(),
        }
    }
}

impl std::fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientConfig")
            .field("credentials", &self.credentials())
            .field("accounts_url", &self.accounts_url)
            .field("api_url", &self.api_url)
            .field("timeout_secs", &self.timeout_secs)
            .field("max_rate_limit_retries", &self.max_rate_limit_retries)
            .field("max_backoff_secs", &self.max_backoff_secs)
            .field(
                "return_new_token_if_expired",
                &self.return_new_token_if_expired,
            )
            .field("pacing", &self.pacing)
            .field("user_agent", &self.user_agent)
            .finish()
    }
}

// ============================================================================
// Builder
// ============================================================================

/// Builder for client config
#[derive(Default)]
pub struct ClientConfigBuilder {
    config: ClientConfig,
}

impl ClientConfigBuilder {
    /// Set client id and secret
    #[must_use]
    pub fn client(mut self, client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        self.config.client_id = Some(client_id.into());
        self.config.client_secret = Some(client_secret.into());
        self
    }

    #[must_use]
    pub fn access_token(mut self, token: impl Into<String>) -> Self {
        self.config.access_token = Some(token.into());
        self
    }

    #[must_use]
    pub fn refresh_token(mut self, token: impl Into<String>) -> Self {
        self.config.refresh_token = Some(token.into());
        self
    }

    #[must_use]
    pub fn accounts_url(mut self, url: impl Into<String>) -> Self {
        self.config.accounts_url = url.into();
        self
    }

    #[must_use]
    pub fn api_url(mut self, url: impl Into<String>) -> Self {
        self.config.api_url = url.into();
        self
    }

    /// Point both hosts at one base URL
    #[must_use]
    pub fn base_url(self, url: impl Into<String>) -> Self {
        let url = url.into();
        self.accounts_url(url.clone()).api_url(url)
    }

    #[must_use]
    pub fn timeout_secs(mut self, secs: u64) -> Self {
        self.config.timeout_secs = secs;
        self
    }

    #[must_use]
    pub fn max_rate_limit_retries(mut self, retries: u32) -> Self {
        self.config.max_rate_limit_retries = retries;
        self
    }

    #[must_use]
    pub fn max_backoff_secs(mut self, secs: u64) -> Self {
        self.config.max_backoff_secs = secs;
        self
    }

    #[must_use]
    pub fn return_new_token_if_expired(mut self, enabled: bool) -> Self {
        self.config.return_new_token_if_expired = enabled;
        self
    }

    #[must_use]
    pub fn pacing(mut self, pacing: PacingConfig) -> Self {
        self.config.pacing = Some(pacing);
        self
    }

    #[must_use]
    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.config.user_agent = agent.into();
        self
    }

    /// Build the config
    pub fn build(self) -> ClientConfig {
        self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;
    use std::io::Write;

    #[test]
    fn test_parse_minimal_yaml() {
        let yaml = r#"
client_id: "abc"
client_secret: "def"
"#;

        let config = ClientConfig::from_yaml_str(yaml).unwrap();
        assert_eq!(config.client_id.as_deref(), Some("abc"));
        assert_eq!(config.client_secret.as_deref(), Some("def"));
        assert_eq!(config.accounts_url, "https://accounts.spotify.com");
        assert_eq!(config.api_url, "https://api.spotify.com");
        assert_eq!(config.timeout_secs, 30);
        assert_eq!(config.max_rate_limit_retries, 5);
        assert_eq!(config.max_backoff_secs, 60);
        assert!(!config.return_new_token_if_expired);
        assert!(config.pacing.is_none());
    }

    #[test]
    fn test_parse_full_yaml() {
        let yaml = r#"
client_id: "abc"
client_secret: "def"
access_token: "at"
refresh_token: "rt"
accounts_url: "http://localhost:9000"
api_url: "http://localhost:9001"
timeout_secs: 5
max_rate_limit_retries: 2
max_backoff_secs: 10
return_new_token_if_expired: true
pacing:
  requests_per_second: 3
user_agent: "my-app/0.1"
"#;

        let config = ClientConfig::from_yaml_str(yaml).unwrap();
        assert_eq!(config.refresh_token.as_deref(), Some("rt"));
        assert_eq!(config.pacing, Some(PacingConfig::new(3, 1)));

        let exec = config.executor_config();
        assert_eq!(exec.accounts_url, "http://localhost:9000");
        assert_eq!(exec.api_url, "http://localhost:9001");
        assert_eq!(exec.timeout, Duration::from_secs(5));
        assert_eq!(exec.max_backoff, Duration::from_secs(10));
        assert_eq!(exec.max_rate_limit_retries, 2);
        assert!(exec.return_new_token_if_expired);
        assert_eq!(exec.user_agent, "my-app/0.1");
    }

    #[test]
    fn test_parse_invalid_yaml() {
        let result = ClientConfig::from_yaml_str("timeout_secs: [not a number");
        assert!(matches!(result, Err(Error::Config { .. })));
    }

    #[test]
    fn test_from_json_file() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        write!(file, r#"{{"client_id": "json-id", "timeout_secs": 12}}"#).unwrap();

        let config = ClientConfig::from_file(file.path()).unwrap();
        assert_eq!(config.client_id.as_deref(), Some("json-id"));
        assert_eq!(config.timeout_secs, 12);
    }

    #[test]
    fn test_from_yaml_file() {
        let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        writeln!(file, "client_id: yaml-id").unwrap();
        writeln!(file, "max_backoff_secs: 15").unwrap();

        let config = ClientConfig::from_file(file.path()).unwrap();
        assert_eq!(config.client_id.as_deref(), Some("yaml-id"));
        assert_eq!(config.max_backoff_secs, 15);
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let result = ClientConfig::from_file(dir.path().join("nope.yaml"));
        match result {
            Err(Error::Config { message }) => assert!(message.contains("nope.yaml")),
            other => panic!("Expected Config error, got {other:?}"),
        }
    }

    #[test]
    fn test_overrides_replace_credentials() {
        let mut config = ClientConfig::builder().client("file-id", "file-secret").build();
        let env: HashMap<&str, &str> = [
            (ENV_CLIENT_ID, "env-id"),
            (ENV_ACCESS_TOKEN, "env-token"),
            (ENV_REFRESH_TOKEN, ""),
        ]
        .into_iter()
        .collect();

        config.apply_overrides(|key| env.get(key).map(|v| (*v).to_string()));

        assert_eq!(config.client_id.as_deref(), Some("env-id"));
        assert_eq!(config.client_secret.as_deref(), Some("file-secret"));
        assert_eq!(config.access_token.as_deref(), Some("env-token"));
        assert!(config.refresh_token.is_none());
    }

    #[test]
    fn test_builder_and_credentials() {
        let config = ClientConfig::builder()
            .client("id", "secret")
            .access_token("at")
            .refresh_token("rt")
            .base_url("http://127.0.0.1:8080")
            .pacing(PacingConfig::new(5, 5))
            .build();

        assert_eq!(
            config.credentials(),
            Credentials::new("id", "secret")
                .with_access_token("at")
                .with_refresh_token("rt")
        );
        assert_eq!(config.accounts_url, "http://127.0.0.1:8080");
        assert_eq!(config.api_url, "http://127.0.0.1:8080");
        assert_eq!(config.executor_config().pacing, Some(PacingConfig::new(5, 5)));
    }

    #[test]
    fn test_debug_hides_secrets() {
        let config = ClientConfig::builder()
            .client("id", "top-secret")
            .access_token("token-value")
            .build();
        let debug = format!("{config:?}");
        assert!(!debug.contains("top-secret"));
        assert!(!debug.contains("token-value"));
    }
}
