use std::time::Duration;

use async_trait::async_trait;

use crate::error::StateError;
use crate::key::{KeyKind, StateKey};

/// Trait for a key/value metadata store with per-key expiry.
///
/// Implementations must be `Send + Sync` and safe for concurrent access.
/// `delete` must be atomic per key: when several callers delete the same key
/// concurrently, exactly one of them observes `true`, and every read that
/// starts after a delete returns must observe the key as absent.
#[async_trait]
pub trait StateStore: Send + Sync {
    /// Check if a key exists; if not, set it atomically with an optional TTL.
    /// Returns `true` if the key was newly set, `false` if it already existed.
    async fn check_and_set(
        &self,
        key: &StateKey,
        value: &str,
        ttl: Option<Duration>,
    ) -> Result<bool, StateError>;

    /// Get the value for a key. Returns `None` if not found or expired.
    async fn get(&self, key: &StateKey) -> Result<Option<String>, StateError>;

    /// Set a value with an optional TTL, overwriting any previous value.
    async fn set(
        &self,
        key: &StateKey,
        value: &str,
        ttl: Option<Duration>,
    ) -> Result<(), StateError>;

    /// Delete a key. Returns `true` if the key existed.
    async fn delete(&self, key: &StateKey) -> Result<bool, StateError>;

    /// Time left before the store evicts `key`.
    ///
    /// Returns `None` when the key is absent or has no expiry.
    async fn remaining_ttl(&self, key: &StateKey) -> Result<Option<Duration>, StateError>;

    /// Scan all live keys of a given kind.
    ///
    /// Returns a list of (key, value) pairs. The key format is `{kind}:{id}`.
    ///
    /// This operation scans the entire keyspace for the given kind, which
    /// can be expensive. Use sparingly.
    async fn scan_keys_by_kind(&self, kind: KeyKind)
    -> Result<Vec<(String, String)>, StateError>;

    /// Check that the backend is reachable.
    async fn ping(&self) -> Result<(), StateError> {
        Ok(())
    }
}
