use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::error::CacheError;

/// A cached HTTP response together with its validators and freshness
/// deadline.
///
/// The response is kept as a full wire-format dump rather than as
/// structured fields so headers replay bit-exact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    /// Opaque server-provided validator; empty when the server sent no
    /// `ETag`.
    pub etag: String,

    /// Parsed `Last-Modified` timestamp, when the server supplied one.
    pub last_modified: Option<SystemTime>,

    /// Full wire-format dump of the origin response: status line,
    /// headers, blank line, body.
    pub response: Vec<u8>,

    /// Instant after which the entry is stale. An entry stored with a
    /// zero freshness lifetime has `expiration` equal to its insertion
    /// time and is stale on the very next access.
    pub expiration: SystemTime,
}

impl CacheEntry {
    /// Check whether the entry is still fresh at `now`.
    pub fn is_fresh(&self, now: SystemTime) -> bool {
        self.expiration > now
    }

    /// Encode the entry with the binary codec shared by the persistent
    /// backends. Blobs written by one backend decode in any other.
    pub fn to_bytes(&self) -> Result<Vec<u8>, CacheError> {
        bincode::serialize(self)
            .map_err(|e| CacheError::Serialization(format!("encoding cache entry: {e}")))
    }

    /// Decode an entry previously produced by [`CacheEntry::to_bytes`].
    pub fn from_bytes(raw: &[u8]) -> Result<Self, CacheError> {
        bincode::deserialize(raw)
            .map_err(|e| CacheError::Serialization(format!("decoding cache entry: {e}")))
    }

    /// Expiration as Unix seconds, the representation kept in backend
    /// rows.
    pub fn unix_expiration(&self) -> i64 {
        unix_seconds(self.expiration)
    }
}

/// Convert an absolute instant to Unix seconds.
pub(crate) fn unix_seconds(t: SystemTime) -> i64 {
    match t.duration_since(UNIX_EPOCH) {
        Ok(d) => d.as_secs() as i64,
        Err(e) => -(e.duration().as_secs() as i64),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn sample_entry() -> CacheEntry {
        CacheEntry {
            etag: "\"abc123\"".to_string(),
            last_modified: Some(UNIX_EPOCH + Duration::from_secs(1_445_412_480)),
            response: b"HTTP/1.1 200 OK\r\ncontent-length: 1\r\n\r\nX".to_vec(),
            expiration: UNIX_EPOCH + Duration::from_secs(1_700_000_060),
        }
    }

    #[test]
    fn test_codec_round_trip() {
        let entry = sample_entry();
        let raw = entry.to_bytes().unwrap();
        let decoded = CacheEntry::from_bytes(&raw).unwrap();
        assert_eq!(decoded, entry);
    }

    #[test]
    fn test_decode_garbage_is_an_error() {
        let result = CacheEntry::from_bytes(b"\x00\x01definitely not an entry");
        assert!(matches!(result, Err(CacheError::Serialization(_))));
    }

    #[test]
    fn test_is_fresh_boundary() {
        let entry = sample_entry();
        let before = entry.expiration - Duration::from_secs(1);
        let after = entry.expiration + Duration::from_secs(1);

        assert!(entry.is_fresh(before));
        // an entry expiring exactly now is already stale
        assert!(!entry.is_fresh(entry.expiration));
        assert!(!entry.is_fresh(after));
    }

    #[test]
    fn test_unix_seconds() {
        let t = UNIX_EPOCH + Duration::from_secs(1_700_000_000);
        assert_eq!(unix_seconds(t), 1_700_000_000);
        assert_eq!(unix_seconds(UNIX_EPOCH), 0);
    }
}
