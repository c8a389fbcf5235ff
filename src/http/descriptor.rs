//! Request descriptors and the prepared-request snapshot
//!
//! A [`RequestDescriptor`] is what an endpoint catalog hands to the executor:
//! verb, host, path and parameters for one logical operation. The executor
//! turns it into a [`PreparedRequest`] by merging pagination and resolving
//! the base URL; that prepared value is also the snapshot replayed after a
//! token refresh.

use crate::types::{Host, Method, Params};

/// Description of one logical API call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestDescriptor {
    /// HTTP verb
    pub method: Method,
    /// Target host
    pub host: Host,
    /// Path, always with a single leading slash
    pub path: String,
    /// Query string parameters
    pub query: Params,
    /// Form-encoded body parameters
    pub form: Params,
    /// Attach `Authorization: Bearer <access token>`
    pub requires_auth: bool,
    /// Authenticate with client id/secret (HTTP Basic) instead of a bearer
    pub client_auth: bool,
    /// Whether the response is a paginated collection
    pub paginated: bool,
}

impl RequestDescriptor {
    /// Create an authorized, non-paginated call against the API host
    pub fn new(method: Method, path: impl AsRef<str>) -> Self {
        Self {
            method,
            host: Host::Api,
            path: normalize_path(path.as_ref()),
            query: Params::new(),
            form: Params::new(),
            requires_auth: true,
            client_auth: false,
            paginated: false,
        }
    }

    pub fn get(path: impl AsRef<str>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl AsRef<str>) -> Self {
        Self::new(Method::POST, path)
    }

    pub fn put(path: impl AsRef<str>) -> Self {
        Self::new(Method::PUT, path)
    }

    pub fn delete(path: impl AsRef<str>) -> Self {
        Self::new(Method::DELETE, path)
    }

    /// Target a different host
    #[must_use]
    pub fn host(mut self, host: Host) -> Self {
        self.host = host;
        self
    }

    /// Add a query parameter
    #[must_use]
    pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.insert(key, value);
        self
    }

    /// Replace all query parameters
    #[must_use]
    pub fn query_params(mut self, params: Params) -> Self {
        self.query = params;
        self
    }

    /// Add a form body parameter
    #[must_use]
    pub fn form(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.form.insert(key, value);
        self
    }

    /// Replace all form body parameters
    #[must_use]
    pub fn form_params(mut self, params: Params) -> Self {
        self.form = params;
        self
    }

    /// Mark the call as returning a paginated collection
    #[must_use]
    pub fn paginated(mut self, paginated: bool) -> Self {
        self.paginated = paginated;
        self
    }

    /// Send without a bearer token
    #[must_use]
    pub fn without_auth(mut self) -> Self {
        self.requires_auth = false;
        self
    }

    /// Authenticate with the client credentials (token endpoint)
    #[must_use]
    pub fn with_client_auth(mut self) -> Self {
        self.requires_auth = false;
        self.client_auth = true;
        self
    }
}

/// A descriptor after pagination merge, ready to dispatch
///
/// Captured once before the first send and replayed unchanged after a
/// token refresh.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedRequest {
    pub method: Method,
    pub base_url: String,
    pub path: String,
    pub query: Params,
    pub form: Params,
    pub requires_auth: bool,
    pub client_auth: bool,
}

impl PreparedRequest {
    /// Full request URL without the query string
    pub fn url(&self) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), self.path)
    }
}

fn normalize_path(path: &str) -> String {
    format!("/{}", path.trim_start_matches('/'))
}
