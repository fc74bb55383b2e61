//! Store implementations for the cache.

pub mod dynamodb;
pub mod memory;
pub mod postgres;

pub use dynamodb::{DynamoConfig, DynamoStore};
pub use memory::MemoryStore;
pub use postgres::{PostgresConfig, PostgresStore};

use std::time::{Duration, SystemTime};

use crate::entry::{CacheEntry, unix_seconds};

/// Row expiration written at insertion: the entry's own deadline, or
/// `created_at + item_expiration` for entries without a freshness
/// lifetime of their own.
pub(crate) fn row_expiration(
    entry: &CacheEntry,
    created_at: SystemTime,
    item_expiration: Duration,
) -> i64 {
    if entry.expiration > created_at {
        unix_seconds(entry.expiration)
    } else {
        unix_seconds(created_at + item_expiration)
    }
}
