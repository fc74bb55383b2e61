//! cond-cache - conditional-revalidation caching for outbound HTTP requests
//!
//! This library wraps any outbound request executor with an RFC
//! 7234-style client cache:
//! - Fresh cached responses are replayed without touching the origin
//! - Stale entries are revalidated with `If-None-Match` /
//!   `If-Modified-Since`, and a 304 replays the prior body
//! - Responses carrying an `ETag` or `Last-Modified` are stored with a
//!   freshness lifetime from `Cache-Control: max-age` or a configured
//!   per-domain override
//! - Storage is pluggable: in-memory, PostgreSQL, or DynamoDB behind
//!   one [`Store`] trait
//!
//! # Example
//!
//! ```ignore
//! use cond_cache::{CacheConfig, CacheLayer, DomainOverride, MemoryStore, RoundTripper};
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! // `executor` is any RoundTripper adapting your HTTP client.
//! let store = Arc::new(MemoryStore::new());
//! let config = CacheConfig {
//!     domain_overrides: vec![DomainOverride {
//!         uri_prefix: "api.example.com/v1".into(),
//!         duration: Duration::from_secs(3600),
//!     }],
//!     ..CacheConfig::default()
//! };
//!
//! let client = CacheLayer::new(store, config).wrap(executor);
//! let res = client.round_trip(req).await?;
//! ```
//!
//! Store failures are downgraded so caching never worsens the success
//! rate of the uncached path; the only cache-originated error a caller
//! can see is a stored response that no longer parses.

mod config;
mod entry;
mod error;
mod headers;
mod key;
mod store;
pub mod stores;
mod transport;
mod wire;

// Re-export public API
pub use config::{
    CacheConfig, Clock, DEFAULT_EXPIRED_TASK_TIMER, DEFAULT_ITEM_EXPIRATION, DomainOverride,
    wall_clock,
};
pub use entry::CacheEntry;
pub use error::CacheError;
pub use headers::{response_etag, response_last_modified, response_max_age, time_to_cache};
pub use key::request_key;
pub use store::{Lookup, Store};
pub use stores::{DynamoConfig, DynamoStore, MemoryStore, PostgresConfig, PostgresStore};
pub use transport::{BoxError, CacheLayer, CacheTransport, RoundTripper};
pub use wire::{dump_response, read_response};
