use std::collections::HashMap;
use std::time::SystemTime;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::config::{Clock, wall_clock};
use crate::entry::CacheEntry;
use crate::error::CacheError;
use crate::store::{Lookup, Store};

/// Thread-safe in-memory cache store using HashMap with RwLock.
///
/// Reads take the shared lock, writes the exclusive lock. Freshness is
/// evaluated on read against the injected clock. Entries are never
/// evicted; memory grows until the process exits.
pub struct MemoryStore {
    entries: RwLock<HashMap<String, CacheEntry>>,
    now: Clock,
}

impl MemoryStore {
    /// Create an empty store on the wall clock.
    pub fn new() -> Self {
        Self::with_clock(wall_clock())
    }

    /// Create an empty store reading time from `now`.
    ///
    /// # Example
    /// ```ignore
    /// let t0 = SystemTime::now();
    /// let store = MemoryStore::with_clock(Arc::new(move || t0));
    /// ```
    pub fn with_clock(now: Clock) -> Self {
        MemoryStore {
            entries: RwLock::new(HashMap::new()),
            now,
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Store for MemoryStore {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn get(&self, key: &str) -> Result<Lookup, CacheError> {
        let entries = self.entries.read().await;

        let Some(entry) = entries.get(key) else {
            return Ok(Lookup::Miss);
        };

        if entry.is_fresh((self.now)()) {
            Ok(Lookup::Hit(entry.clone()))
        } else {
            Ok(Lookup::Expired(entry.clone()))
        }
    }

    async fn set(&self, key: &str, entry: CacheEntry) -> Result<(), CacheError> {
        let mut entries = self.entries.write().await;
        entries.insert(key.to_string(), entry);
        Ok(())
    }

    // NOTE: the read and the write happen in two separate critical
    // sections; a concurrent `set` between them can be lost. Only the
    // transport calls `update`, after a successful 304, where the
    // replacing `set` carries its own fresh expiration.
    async fn update(&self, key: &str, expiration: SystemTime) -> Result<(), CacheError> {
        let mut entry = match self.get(key).await? {
            Lookup::Hit(entry) | Lookup::Expired(entry) => entry,
            Lookup::Miss => return Ok(()),
        };

        entry.expiration = expiration;
        self.set(key, entry).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    fn t0() -> SystemTime {
        SystemTime::UNIX_EPOCH + Duration::from_secs(1_700_000_000)
    }

    fn fixed_clock(at: SystemTime) -> Clock {
        Arc::new(move || at)
    }

    fn entry(body: &[u8], expiration: SystemTime) -> CacheEntry {
        CacheEntry {
            etag: "\"e1\"".to_string(),
            last_modified: None,
            response: body.to_vec(),
            expiration,
        }
    }

    #[tokio::test]
    async fn test_get_set() {
        let store = MemoryStore::with_clock(fixed_clock(t0()));

        // initially empty
        assert!(matches!(store.get("GET#/a").await.unwrap(), Lookup::Miss));

        store
            .set("GET#/a", entry(b"one", t0() + Duration::from_secs(60)))
            .await
            .unwrap();

        let Lookup::Hit(found) = store.get("GET#/a").await.unwrap() else {
            panic!("expected a fresh hit");
        };
        assert_eq!(found.response, b"one");

        // other keys are unaffected
        assert!(matches!(store.get("GET#/b").await.unwrap(), Lookup::Miss));
    }

    #[tokio::test]
    async fn test_expired_entry_is_returned_with_the_verdict() {
        let store = MemoryStore::with_clock(fixed_clock(t0()));

        store
            .set("GET#/a", entry(b"old", t0() - Duration::from_secs(1)))
            .await
            .unwrap();

        let Lookup::Expired(found) = store.get("GET#/a").await.unwrap() else {
            panic!("expected an expired entry");
        };
        assert_eq!(found.response, b"old");
        assert_eq!(found.etag, "\"e1\"");
    }

    #[tokio::test]
    async fn test_zero_lifetime_entry_is_stale_immediately() {
        let store = MemoryStore::with_clock(fixed_clock(t0()));

        store.set("GET#/a", entry(b"x", t0())).await.unwrap();

        assert!(matches!(
            store.get("GET#/a").await.unwrap(),
            Lookup::Expired(_)
        ));
    }

    #[tokio::test]
    async fn test_update_extends_expiration_and_keeps_response() {
        let store = MemoryStore::with_clock(fixed_clock(t0()));

        store
            .set("GET#/a", entry(b"body", t0() - Duration::from_secs(1)))
            .await
            .unwrap();

        let extended = t0() + Duration::from_secs(60);
        store.update("GET#/a", extended).await.unwrap();

        let Lookup::Hit(found) = store.get("GET#/a").await.unwrap() else {
            panic!("expected the entry to be fresh again");
        };
        assert_eq!(found.expiration, extended);
        assert_eq!(found.response, b"body");
    }

    #[tokio::test]
    async fn test_update_missing_key_is_a_noop() {
        let store = MemoryStore::with_clock(fixed_clock(t0()));

        store
            .update("GET#/missing", t0() + Duration::from_secs(60))
            .await
            .unwrap();

        assert!(matches!(
            store.get("GET#/missing").await.unwrap(),
            Lookup::Miss
        ));
    }

    // `update` is read-then-write across two critical sections. Racing
    // it against `set` must not panic, and the map must converge to one
    // of the two competing writes.
    #[tokio::test]
    async fn test_update_racing_set_converges() {
        let advancing = Arc::new(Mutex::new(t0()));
        let clock_state = advancing.clone();
        let store = Arc::new(MemoryStore::with_clock(Arc::new(move || {
            *clock_state.lock().unwrap()
        })));

        let set_expiration = t0() + Duration::from_secs(120);
        let update_expiration = t0() + Duration::from_secs(60);

        for round in 0..100 {
            store
                .set("GET#/a", entry(b"seed", t0() - Duration::from_secs(1)))
                .await
                .unwrap();

            let setter = {
                let store = store.clone();
                tokio::spawn(async move {
                    store
                        .set("GET#/a", entry(b"replacement", set_expiration))
                        .await
                })
            };
            let updater = {
                let store = store.clone();
                tokio::spawn(async move { store.update("GET#/a", update_expiration).await })
            };

            setter.await.unwrap().unwrap();
            updater.await.unwrap().unwrap();

            let Lookup::Hit(found) = store.get("GET#/a").await.unwrap() else {
                panic!("round {round}: entry disappeared");
            };
            assert!(
                found.expiration == set_expiration || found.expiration == update_expiration,
                "round {round}: unexpected expiration"
            );
        }
    }
}
