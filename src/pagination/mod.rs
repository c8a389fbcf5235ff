//! Pagination module
//!
//! Offset/limit pagination as used by Spotify collection endpoints.
//!
//! # Overview
//!
//! Every operation declares whether it is paginated before it runs. The
//! executor merges the current `limit`/`offset` into the query string right
//! before dispatch and adopts the `limit`/`offset`/`total` envelope of every
//! successful response.

mod types;

pub use types::{
    PaginationContext, PaginationState, DEFAULT_LIMIT, LIMIT_PARAM, OFFSET_PARAM,
};
