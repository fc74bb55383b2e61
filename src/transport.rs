use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use http::header::{HeaderValue, IF_MODIFIED_SINCE, IF_NONE_MATCH};
use http::{Request, Response, StatusCode};
use tracing::{debug, warn};

use crate::config::{CacheConfig, Clock, wall_clock};
use crate::entry::CacheEntry;
use crate::headers::{response_etag, response_last_modified, time_to_cache};
use crate::key::request_key;
use crate::store::{Lookup, Store};
use crate::wire;

/// Error type produced by executors; boxed so any HTTP client's error
/// can flow through unchanged.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// An outbound request executor, the seam the cache wraps.
///
/// Implementations forward the request to the origin and return the
/// response with the body fully collected. Any HTTP client can be
/// adapted by implementing this for a thin wrapper around it.
#[async_trait]
pub trait RoundTripper: Send + Sync {
    /// Execute `req` against the origin.
    async fn round_trip(&self, req: Request<Bytes>) -> Result<Response<Bytes>, BoxError>;
}

#[async_trait]
impl<T: RoundTripper + ?Sized> RoundTripper for Arc<T> {
    async fn round_trip(&self, req: Request<Bytes>) -> Result<Response<Bytes>, BoxError> {
        (**self).round_trip(req).await
    }
}

/// Factory that wraps executors with conditional-revalidation caching.
///
/// # Example
/// ```ignore
/// use cond_cache::{CacheConfig, CacheLayer, MemoryStore, RoundTripper};
/// use std::sync::Arc;
///
/// let store = Arc::new(MemoryStore::new());
/// let client = CacheLayer::new(store, CacheConfig::default()).wrap(executor);
/// let res = client.round_trip(req).await?;
/// ```
pub struct CacheLayer {
    store: Arc<dyn Store>,
    config: CacheConfig,
    now: Clock,
}

impl CacheLayer {
    /// Create a layer over `store` with the given configuration.
    pub fn new(store: Arc<dyn Store>, config: CacheConfig) -> Self {
        CacheLayer {
            store,
            config,
            now: wall_clock(),
        }
    }

    /// Replace the wall clock, mainly for tests.
    pub fn with_clock(mut self, now: Clock) -> Self {
        self.now = now;
        self
    }

    /// Wrap `inner`, producing an executor with the same signature that
    /// serves fresh hits from the store and revalidates stale entries
    /// with conditional requests.
    pub fn wrap<T: RoundTripper>(self, inner: T) -> CacheTransport<T> {
        CacheTransport {
            inner,
            store: self.store,
            config: self.config,
            now: self.now,
        }
    }
}

/// Caching executor produced by [`CacheLayer::wrap`].
///
/// Per request: a fresh cached entry is replayed without forwarding; a
/// stale one turns the request conditional (`If-None-Match`,
/// `If-Modified-Since`) before forwarding; everything else forwards
/// unchanged. Responses carrying validators are stored on the way
/// back. The wrapper only ever adds those two headers and never strips
/// any, and store failures never fail the request.
pub struct CacheTransport<T> {
    inner: T,
    store: Arc<dyn Store>,
    config: CacheConfig,
    now: Clock,
}

#[async_trait]
impl<T: RoundTripper> RoundTripper for CacheTransport<T> {
    async fn round_trip(&self, req: Request<Bytes>) -> Result<Response<Bytes>, BoxError> {
        let key = request_key(&req);
        let uri = req.uri().clone();

        let lookup = match self.store.get(&key).await {
            Ok(lookup) => lookup,
            // a failing store must never fail the request
            Err(err) => {
                warn!(url = %uri, error = %err, "cache read failed, treating as miss");
                Lookup::Miss
            }
        };

        let mut req = req;
        let prior = match lookup {
            Lookup::Hit(entry) => {
                debug!(url = %uri, "cache item found");
                return Ok(wire::read_response(&entry.response)?);
            }
            Lookup::Expired(entry) => {
                debug!(url = %uri, "cache item expired, attempting revalidation");
                if !entry.etag.is_empty() {
                    if let Ok(value) = HeaderValue::from_str(&entry.etag) {
                        req.headers_mut().insert(IF_NONE_MATCH, value);
                    }
                }
                if let Some(last_modified) = entry.last_modified {
                    if let Ok(value) = HeaderValue::from_str(&httpdate::fmt_http_date(last_modified))
                    {
                        req.headers_mut().insert(IF_MODIFIED_SINCE, value);
                    }
                }
                Some(entry)
            }
            Lookup::Miss => {
                debug!(url = %uri, "cache item not found");
                None
            }
        };

        let res = self.inner.round_trip(req).await?;

        // 412 is handled like an ordinary cacheable response; anything
        // else outside 200..=399 passes through untouched
        let status = res.status();
        if status != StatusCode::PRECONDITION_FAILED
            && (status.as_u16() < 200 || status.as_u16() > 399)
        {
            return Ok(res);
        }

        if status == StatusCode::NOT_MODIFIED {
            if let Some(entry) = prior {
                debug!(url = %uri, "cache item successfully revalidated");
                let ttl = time_to_cache(&uri, res.headers(), &self.config);
                let expiration = (self.now)() + ttl;
                if let Err(err) = self.store.update(&key, expiration).await {
                    warn!(url = %uri, error = %err, "error updating cache item");
                }
                return Ok(wire::read_response(&entry.response)?);
            }
            // a 304 with no prior entry has nothing to replay; it falls
            // through and, lacking validators, passes through below
        }

        let etag = response_etag(res.headers());
        let last_modified = response_last_modified(res.headers());
        if etag.is_empty() && last_modified.is_none() {
            debug!(url = %uri, "no etag or last-modified header found, not caching response");
            return Ok(res);
        }

        let ttl = time_to_cache(&uri, res.headers(), &self.config);
        let entry = CacheEntry {
            etag,
            last_modified,
            response: wire::dump_response(&res),
            expiration: (self.now)() + ttl,
        };
        if let Err(err) = self.store.set(&key, entry).await {
            warn!(url = %uri, error = %err, "error caching response");
        }

        Ok(res)
    }
}
