//! Auth types
//!
//! Client credentials, token values, OAuth2 grants and the token endpoint
//! response shape.

use crate::types::Params;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Client credentials and the tokens minted for them
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    /// Application client id
    #[serde(default)]
    pub client_id: Option<String>,
    /// Application client secret
    #[serde(default)]
    pub client_secret: Option<String>,
    /// Current access token
    #[serde(default)]
    pub access_token: Option<String>,
    /// Long-lived refresh token
    #[serde(default)]
    pub refresh_token: Option<String>,
}

impl Credentials {
    /// Credentials for the client-credentials or authorization-code flows
    pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        Self {
            client_id: Some(client_id.into()),
            client_secret: Some(client_secret.into()),
            ..Default::default()
        }
    }

    #[must_use]
    pub fn with_access_token(mut self, token: impl Into<String>) -> Self {
        self.access_token = Some(token.into());
        self
    }

    #[must_use]
    pub fn with_refresh_token(mut self, token: impl Into<String>) -> Self {
        self.refresh_token = Some(token.into());
        self
    }
}

// Secrets stay out of logs
impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        fn redact(value: &Option<String>) -> &'static str {
            if value.is_some() {
                "<redacted>"
            } else {
                "<none>"
            }
        }

        f.debug_struct("Credentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &redact(&self.client_secret))
            .field("access_token", &redact(&self.access_token))
            .field("refresh_token", &redact(&self.refresh_token))
            .finish()
    }
}

/// Access token with optional expiration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessToken {
    /// The bearer token
    pub value: String,
    /// When the token expires, if the server said
    pub expires_at: Option<DateTime<Utc>>,
    /// Space-separated scopes granted
    pub scope: Option<String>,
}

impl AccessToken {
    /// Create a token without expiry information
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            expires_at: None,
            scope: None,
        }
    }

    /// Create a token that expires in N seconds from now
    ///
    /// An out-of-range lifetime leaves the expiry unknown.
    pub fn expires_in(value: impl Into<String>, seconds: i64) -> Self {
        let expires_at = chrono::Duration::try_seconds(seconds)
            .and_then(|lifetime| Utc::now().checked_add_signed(lifetime));
        Self {
            value: value.into(),
            expires_at,
            scope: None,
        }
    }

    /// Check if the token is expired (with 30 second buffer)
    pub fn is_expired(&self) -> bool {
        match self.expires_at {
            Some(expires_at) => Utc::now() + chrono::Duration::seconds(30) >= expires_at,
            None => false,
        }
    }
}

/// Tokens returned by the authorization-code exchange
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenSet {
    pub access_token: AccessToken,
    pub refresh_token: Option<String>,
}

/// OAuth2 grant sent to the token endpoint
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Grant {
    /// Complete the authorization-code flow
    AuthorizationCode { code: String, redirect_uri: String },
    /// App-only token from client id/secret
    ClientCredentials,
    /// Exchange a refresh token for a new access token
    RefreshToken { refresh_token: String },
}

impl Grant {
    /// `grant_type` value
    pub fn grant_type(&self) -> &'static str {
        match self {
            Self::AuthorizationCode { .. } => "authorization_code",
            Self::ClientCredentials => "client_credentials",
            Self::RefreshToken { .. } => "refresh_token",
        }
    }

    /// Form body for the token request
    pub fn form(&self) -> Params {
        let mut form = Params::new();
        form.insert("grant_type", self.grant_type());
        match self {
            Self::AuthorizationCode { code, redirect_uri } => {
                form.insert("code", code.as_str());
                form.insert("redirect_uri", redirect_uri.as_str());
            }
            Self::ClientCredentials => {}
            Self::RefreshToken { refresh_token } => {
                form.insert("refresh_token", refresh_token.as_str());
            }
        }
        form
    }
}

/// Optional parameters of the authorize URL
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthorizeOptions {
    /// Scopes to request; joined with spaces
    pub scope: Vec<String>,
    /// Force the consent dialog even if already approved
    pub show_dialog: Option<bool>,
    /// Opaque value echoed back on the redirect
    pub state: Option<String>,
}

impl AuthorizeOptions {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn scope<I, S>(mut self, scopes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.scope = scopes.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn show_dialog(mut self, show: bool) -> Self {
        self.show_dialog = Some(show);
        self
    }

    #[must_use]
    pub fn state(mut self, state: impl Into<String>) -> Self {
        self.state = Some(state.into());
        self
    }
}

/// Token endpoint response
///
/// Read field by field so an oddly typed optional field never hides the
/// access token.
#[derive(Debug, Default)]
pub(crate) struct TokenResponse {
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
    pub expires_in: Option<i64>,
    pub scope: Option<String>,
}

impl TokenResponse {
    /// Decode a token response; fields that are missing or unusable are `None`
    pub fn from_body(body: serde_json::Value) -> Self {
        let text = |field: &str| body.get(field).and_then(Value::as_str).map(String::from);
        Self {
            access_token: text("access_token"),
            refresh_token: text("refresh_token").filter(|t| !t.is_empty()),
            expires_in: body.get("expires_in").and_then(lenient_int),
            scope: text("scope"),
        }
    }

    /// The access token, if the response carried a non-empty one
    pub fn access_token(&self) -> Option<AccessToken> {
        let value = self.access_token.as_deref().filter(|t| !t.is_empty())?;
        let mut token = match self.expires_in {
            Some(secs) => AccessToken::expires_in(value, secs),
            None => AccessToken::new(value),
        };
        token.scope = self.scope.clone();
        Some(token)
    }
}

/// Integer from a JSON number or a numeric string
fn lenient_int(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
