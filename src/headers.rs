use std::time::{Duration, SystemTime};

use http::{HeaderMap, Uri, header};
use tracing::debug;

use crate::config::CacheConfig;

const DIRECTIVE_MAX_AGE: &str = "max-age";

/// Value of the `ETag` response header, or an empty string.
pub fn response_etag(headers: &HeaderMap) -> String {
    headers
        .get(header::ETAG)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string()
}

/// Parsed `Last-Modified` response header.
///
/// Absent or unparseable dates yield `None`; RFC 1123 is the preferred
/// form but the older HTTP-date formats parse too.
pub fn response_last_modified(headers: &HeaderMap) -> Option<SystemTime> {
    let raw = headers.get(header::LAST_MODIFIED)?.to_str().ok()?;
    httpdate::parse_http_date(raw).ok()
}

/// `max-age` freshness lifetime from the `Cache-Control` header.
///
/// Only the `max-age` directive is honored; `no-store`, `private`,
/// `must-revalidate` and every other directive are ignored. A missing
/// header, a missing directive, or a missing or empty value all yield
/// zero.
pub fn response_max_age(headers: &HeaderMap) -> Duration {
    let Some(cache_control) = headers
        .get(header::CACHE_CONTROL)
        .and_then(|v| v.to_str().ok())
    else {
        return Duration::ZERO;
    };

    for directive in cache_control.split(',') {
        let directive = directive.trim();
        if !directive.starts_with(DIRECTIVE_MAX_AGE) {
            continue;
        }
        let Some((_, value)) = directive.split_once('=') else {
            return Duration::ZERO;
        };
        return value
            .trim()
            .parse::<u64>()
            .map(Duration::from_secs)
            .unwrap_or(Duration::ZERO);
    }

    Duration::ZERO
}

/// Resolve the freshness lifetime for a response.
///
/// Domain overrides are consulted first: the first configured prefix
/// matching `authority + path` wins regardless of server directives,
/// in configured order. Otherwise the response's `max-age` applies,
/// falling back to the configured default expiration when that is
/// zero.
pub fn time_to_cache(uri: &Uri, headers: &HeaderMap, config: &CacheConfig) -> Duration {
    let target = format!(
        "{}{}",
        uri.authority().map(|a| a.as_str()).unwrap_or_default(),
        uri.path()
    );
    for over in &config.domain_overrides {
        if target.starts_with(&over.uri_prefix) {
            debug!(prefix = %over.uri_prefix, "caching override found");
            return over.duration;
        }
    }

    let max_age = response_max_age(headers);
    if max_age.is_zero() {
        config.default_expiration
    } else {
        max_age
    }
}
