use std::time::SystemTime;

use async_trait::async_trait;

use crate::entry::CacheEntry;
use crate::error::CacheError;

/// Outcome of a store lookup.
///
/// `Expired` still carries the entry: the transport needs the prior
/// validators to build a conditional request, and the prior response
/// bytes to replay after a 304.
#[derive(Debug, Clone)]
pub enum Lookup {
    /// The entry exists and is fresh.
    Hit(CacheEntry),
    /// The entry exists but its expiration has passed.
    Expired(CacheEntry),
    /// Nothing is stored under the key.
    Miss,
}

/// A store is a common interface for the cache backends.
///
/// Misses and expired entries are reported through [`Lookup`], never as
/// errors; `Err` is reserved for backend I/O failures. Every operation
/// is an honest async fn, so dropping its future cancels the work.
#[async_trait]
pub trait Store: Send + Sync {
    /// A name for tracing.
    ///
    /// # Example
    /// - "memory"
    /// - "postgres"
    /// - "dynamodb"
    fn name(&self) -> &'static str;

    /// Look up the entry stored under `key`.
    async fn get(&self, key: &str) -> Result<Lookup, CacheError>;

    /// Store `entry` under `key`, replacing any previous entry whole.
    async fn set(&self, key: &str, entry: CacheEntry) -> Result<(), CacheError>;

    /// Extend the expiration of an existing entry without touching its
    /// stored response. Updating a missing key is a no-op.
    async fn update(&self, key: &str, expiration: SystemTime) -> Result<(), CacheError>;
}
