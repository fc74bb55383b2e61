use std::sync::Arc;
use std::time::{Duration, SystemTime};

/// Injectable time source shared by the transport and the stores.
pub type Clock = Arc<dyn Fn() -> SystemTime + Send + Sync>;

/// The wall clock, the default time source for every component.
pub fn wall_clock() -> Clock {
    Arc::new(SystemTime::now)
}

/// Default backend row lifetime for entries that carry no freshness
/// lifetime of their own.
pub const DEFAULT_ITEM_EXPIRATION: Duration = Duration::from_secs(24 * 60 * 60);

/// Default period of the expired-row sweeper.
pub const DEFAULT_EXPIRED_TASK_TIMER: Duration = Duration::from_secs(10 * 60);

/// Transport-level caching configuration.
#[derive(Debug, Clone, Default)]
pub struct CacheConfig {
    /// Fallback freshness lifetime used when the response carries no
    /// usable cache directive and no override matches. Zero disables
    /// the fallback, so such responses are stale immediately.
    pub default_expiration: Duration,

    /// Per-prefix TTL overrides, consulted in order. The first prefix
    /// matching `authority + path` wins over the server's directives.
    pub domain_overrides: Vec<DomainOverride>,
}

/// A `(uri_prefix, duration)` pair that supersedes the server's cache
/// directives for matching requests.
#[derive(Debug, Clone)]
pub struct DomainOverride {
    /// Matched as a prefix of the concatenated request authority and
    /// path, e.g. `example.com/api`.
    pub uri_prefix: String,

    /// Freshness lifetime applied to matching requests.
    pub duration: Duration,
}
