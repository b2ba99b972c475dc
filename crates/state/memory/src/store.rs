use std::time::Duration;

use async_trait::async_trait;
use dashmap::DashMap;
use tokio::time::Instant;

use dropfade_state::error::StateError;
use dropfade_state::key::{KeyKind, StateKey};
use dropfade_state::store::StateStore;

/// A single entry in the in-memory store.
#[derive(Debug, Clone)]
struct Entry {
    value: String,
    expires_at: Option<Instant>,
}

impl Entry {
    /// Returns `true` if this entry has passed its TTL deadline.
    fn is_expired(&self) -> bool {
        self.expires_at
            .is_some_and(|deadline| Instant::now() >= deadline)
    }
}

/// Compute the expiry instant from an optional TTL duration.
fn expiry_from_ttl(ttl: Option<Duration>) -> Option<Instant> {
    ttl.map(|d| Instant::now() + d)
}

/// In-memory [`StateStore`] backed by a [`DashMap`].
///
/// Entries are lazily evicted on read when their TTL has elapsed. Per-key
/// operations run under the map's shard lock, which makes `delete` atomic:
/// of several concurrent deletes for one key, exactly one returns `true`.
#[derive(Debug, Default)]
pub struct MemoryStateStore {
    data: DashMap<String, Entry>,
}

impl MemoryStateStore {
    /// Create a new, empty in-memory state store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of entries currently held, including expired ones not yet evicted.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether the store holds no entries.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Render a [`StateKey`] into the string used as the map key.
    fn render_key(key: &StateKey) -> String {
        key.canonical()
    }
}

#[async_trait]
impl StateStore for MemoryStateStore {
    async fn check_and_set(
        &self,
        key: &StateKey,
        value: &str,
        ttl: Option<Duration>,
    ) -> Result<bool, StateError> {
        let rendered = Self::render_key(key);

        // Remove any expired entry, then insert only if vacant.
        self.data.remove_if(&rendered, |_, entry| entry.is_expired());

        let was_inserted = match self.data.entry(rendered) {
            dashmap::mapref::entry::Entry::Occupied(_) => false,
            dashmap::mapref::entry::Entry::Vacant(vacant) => {
                vacant.insert(Entry {
                    value: value.to_owned(),
                    expires_at: expiry_from_ttl(ttl),
                });
                true
            }
        };

        Ok(was_inserted)
    }

    async fn get(&self, key: &StateKey) -> Result<Option<String>, StateError> {
        let rendered = Self::render_key(key);

        // Lazy TTL eviction: check and remove if expired.
        if let Some(entry) = self.data.get(&rendered) {
            if entry.is_expired() {
                drop(entry);
                self.data.remove_if(&rendered, |_, entry| entry.is_expired());
                return Ok(None);
            }
            return Ok(Some(entry.value.clone()));
        }

        Ok(None)
    }

    async fn set(
        &self,
        key: &StateKey,
        value: &str,
        ttl: Option<Duration>,
    ) -> Result<(), StateError> {
        let rendered = Self::render_key(key);
        self.data.insert(
            rendered,
            Entry {
                value: value.to_owned(),
                expires_at: expiry_from_ttl(ttl),
            },
        );
        Ok(())
    }

    async fn delete(&self, key: &StateKey) -> Result<bool, StateError> {
        let rendered = Self::render_key(key);

        // Remove, but treat expired entries as "not found".
        match self.data.remove(&rendered) {
            Some((_, entry)) => Ok(!entry.is_expired()),
            None => Ok(false),
        }
    }

    async fn remaining_ttl(&self, key: &StateKey) -> Result<Option<Duration>, StateError> {
        let rendered = Self::render_key(key);
        let Some(entry) = self.data.get(&rendered) else {
            return Ok(None);
        };
        if entry.is_expired() {
            return Ok(None);
        }
        Ok(entry
            .expires_at
            .map(|deadline| deadline.saturating_duration_since(Instant::now())))
    }

    async fn scan_keys_by_kind(
        &self,
        kind: KeyKind,
    ) -> Result<Vec<(String, String)>, StateError> {
        let prefix = format!("{kind}:");
        let results = self
            .data
            .iter()
            .filter(|entry| entry.key().starts_with(&prefix) && !entry.value().is_expired())
            .map(|entry| (entry.key().clone(), entry.value().value.clone()))
            .collect();
        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use dropfade_state::key::StateKey;
    use dropfade_state::testing::run_store_conformance_tests;

    use super::*;

    #[tokio::test]
    async fn conformance() {
        let store = MemoryStateStore::new();
        run_store_conformance_tests(&store)
            .await
            .expect("conformance tests should pass");
    }

    #[tokio::test(start_paused = true)]
    async fn ttl_expiry_via_get() {
        let store = MemoryStateStore::new();
        let key = StateKey::drop("TTLEXP");

        store
            .set(&key, "short-lived", Some(Duration::from_secs(5)))
            .await
            .unwrap();

        // Value should be present before TTL elapses.
        let val = store.get(&key).await.unwrap();
        assert_eq!(val.as_deref(), Some("short-lived"));

        // Advance time past TTL.
        tokio::time::advance(Duration::from_secs(6)).await;

        // Lazy eviction: get should return None.
        let val = store.get(&key).await.unwrap();
        assert!(val.is_none(), "value should be expired");
        assert!(store.is_empty(), "expired entry should be evicted on read");
    }

    #[tokio::test(start_paused = true)]
    async fn remaining_ttl_counts_down() {
        let store = MemoryStateStore::new();
        let key = StateKey::drop("COUNT");

        store
            .set(&key, "v", Some(Duration::from_secs(300)))
            .await
            .unwrap();
        tokio::time::advance(Duration::from_secs(100)).await;

        let ttl = store.remaining_ttl(&key).await.unwrap();
        assert_eq!(ttl, Some(Duration::from_secs(200)));

        tokio::time::advance(Duration::from_secs(201)).await;
        assert_eq!(store.remaining_ttl(&key).await.unwrap(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn check_and_set_after_expiry() {
        let store = MemoryStateStore::new();
        let key = StateKey::drop("REUSE");

        let created = store
            .check_and_set(&key, "v1", Some(Duration::from_secs(3)))
            .await
            .unwrap();
        assert!(created);

        // Should fail while still alive.
        let created = store.check_and_set(&key, "v2", None).await.unwrap();
        assert!(!created);

        // Advance past TTL.
        tokio::time::advance(Duration::from_secs(4)).await;

        // Should succeed now that the entry has expired.
        let created = store.check_and_set(&key, "v2", None).await.unwrap();
        assert!(created, "should re-create after expiry");

        let val = store.get(&key).await.unwrap();
        assert_eq!(val.as_deref(), Some("v2"));
    }

    #[tokio::test(start_paused = true)]
    async fn delete_of_expired_entry_reports_false() {
        let store = MemoryStateStore::new();
        let key = StateKey::drop("STALE");
        store
            .set(&key, "v", Some(Duration::from_secs(1)))
            .await
            .unwrap();
        tokio::time::advance(Duration::from_secs(2)).await;
        assert!(!store.delete(&key).await.unwrap());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_deletes_have_one_winner() {
        let store = Arc::new(MemoryStateStore::new());
        let key = StateKey::drop("RACE01");
        store.set(&key, "v", None).await.unwrap();

        let tasks = (0..32).map(|_| {
            let store = Arc::clone(&store);
            let key = key.clone();
            tokio::spawn(async move { store.delete(&key).await.unwrap() })
        });
        let results = futures::future::join_all(tasks).await;
        let winners = results.into_iter().filter(|r| *r.as_ref().unwrap()).count();
        assert_eq!(winners, 1, "exactly one delete should observe the key");
    }
}
