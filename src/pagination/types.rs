//! Pagination state and the shared context handle
//!
//! Spotify collection endpoints take `limit`/`offset` query parameters and
//! echo `limit`, `offset` and `total` back in the response envelope.

use crate::types::Params;
use serde_json::Value;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Default page size when nothing else has been set
pub const DEFAULT_LIMIT: u32 = 20;

/// Query parameter carrying the page size
pub const LIMIT_PARAM: &str = "limit";

/// Query parameter carrying the page offset
pub const OFFSET_PARAM: &str = "offset";

/// Tracks pagination for the operation currently being executed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaginationState {
    /// Whether the upcoming call returns a paginated collection
    pub has_pagination: bool,
    /// Page size, always at least 1
    limit: u32,
    /// Offset of the first item
    pub offset: u32,
    /// Total item count reported by the last collection response
    pub total: Option<u64>,
}

impl Default for PaginationState {
    fn default() -> Self {
        Self {
            has_pagination: false,
            limit: DEFAULT_LIMIT,
            offset: 0,
            total: None,
        }
    }
}

impl PaginationState {
    /// Create a new pagination state with defaults
    pub fn new() -> Self {
        Self::default()
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }

    /// Declare whether the upcoming call is paginated
    pub fn set_has_pagination(&mut self, has_pagination: bool) {
        self.has_pagination = has_pagination;
    }

    /// Set the page size; non-positive values are ignored
    pub fn set_limit(&mut self, limit: i64) {
        if limit > 0 {
            self.limit = u32::try_from(limit).unwrap_or(u32::MAX);
        }
    }

    /// Set the offset; negative values are ignored
    pub fn set_offset(&mut self, offset: i64) {
        if offset >= 0 {
            self.offset = u32::try_from(offset).unwrap_or(u32::MAX);
        }
    }

    pub fn set_total(&mut self, total: u64) {
        self.total = Some(total);
    }

    /// Normalize a query string against the current state
    ///
    /// Paginated calls get `limit` and `offset` added or overwritten; all
    /// other calls have any stray `limit`/`offset` stripped.
    pub fn merge_into_query(&self, query: &Params) -> Params {
        let mut merged = query.clone();
        if self.has_pagination {
            merged.insert(LIMIT_PARAM, self.limit.to_string());
            merged.insert(OFFSET_PARAM, self.offset.to_string());
        } else {
            merged.remove(LIMIT_PARAM);
            merged.remove(OFFSET_PARAM);
        }
        merged
    }

    /// Adopt `limit`, `offset` and `total` from a decoded response body
    ///
    /// Fields absent from the body leave the corresponding state untouched.
    pub fn update_from_envelope(&mut self, body: &Value) {
        if let Some(limit) = envelope_int(body, "limit") {
            self.set_limit(limit);
        }
        if let Some(offset) = envelope_int(body, "offset") {
            self.set_offset(offset);
        }
        if let Some(total) = envelope_int(body, "total") {
            if let Ok(total) = u64::try_from(total) {
                self.set_total(total);
            }
        }
    }
}

/// Read an integer field from the top level of a response body
///
/// Accepts JSON numbers and numeric strings.
fn envelope_int(body: &Value, field: &str) -> Option<i64> {
    match body.get(field)? {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Shared handle to a client's pagination state
///
/// Cloning the handle shares the underlying state. The lock is never held
/// across an await point.
#[derive(Debug, Clone, Default)]
pub struct PaginationContext {
    inner: Arc<Mutex<PaginationState>>,
}

impl PaginationContext {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, PaginationState> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Copy of the current state
    pub fn snapshot(&self) -> PaginationState {
        self.lock().clone()
    }

    pub fn set_has_pagination(&self, has_pagination: bool) {
        self.lock().set_has_pagination(has_pagination);
    }

    pub fn set_limit(&self, limit: i64) {
        self.lock().set_limit(limit);
    }

    pub fn set_offset(&self, offset: i64) {
        self.lock().set_offset(offset);
    }

    pub fn limit(&self) -> u32 {
        self.lock().limit()
    }

    pub fn offset(&self) -> u32 {
        self.lock().offset
    }

    pub fn total(&self) -> Option<u64> {
        self.lock().total
    }

    pub fn merge_into_query(&self, query: &Params) -> Params {
        self.lock().merge_into_query(query)
    }

    /// Declare the upcoming call and merge its query under one lock
    ///
    /// A concurrent call on the same context cannot flip the flag between
    /// the two steps.
    pub fn prepare_query(&self, paginated: bool, query: &Params) -> Params {
        let mut state = self.lock();
        state.set_has_pagination(paginated);
        state.merge_into_query(query)
    }

    pub fn update_from_envelope(&self, body: &Value) {
        self.lock().update_from_envelope(body);
    }
}
