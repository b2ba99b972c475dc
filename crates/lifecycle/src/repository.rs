use std::sync::Arc;
use std::time::Duration;

use dropfade_core::DropRecord;
use dropfade_state::{KeyKind, StateError, StateKey, StateStore};
use tracing::warn;

/// Typed access to drop records in the metadata store.
///
/// Records are stored as JSON under `drop:<CODE>`. A stored value that does
/// not parse is corrupt: it is logged, deleted, and reported as absent.
#[derive(Clone)]
pub(crate) struct DropRepository {
    state: Arc<dyn StateStore>,
}

impl DropRepository {
    pub(crate) fn new(state: Arc<dyn StateStore>) -> Self {
        Self { state }
    }

    pub(crate) fn state(&self) -> &Arc<dyn StateStore> {
        &self.state
    }

    pub(crate) async fn get(&self, code: &str) -> Result<Option<DropRecord>, StateError> {
        let key = StateKey::drop(code);
        let Some(raw) = self.state.get(&key).await? else {
            return Ok(None);
        };
        match serde_json::from_str(&raw) {
            Ok(record) => Ok(Some(record)),
            Err(e) => {
                warn!(code, error = %e, "discarding corrupt drop record");
                self.state.delete(&key).await?;
                Ok(None)
            }
        }
    }

    /// Persist a record under `code` only if the code is free.
    pub(crate) async fn insert_new(
        &self,
        code: &str,
        record: &DropRecord,
        ttl: Duration,
    ) -> Result<bool, StateError> {
        let value = encode(record)?;
        self.state
            .check_and_set(&StateKey::drop(code), &value, Some(ttl))
            .await
    }

    /// Persist a record under `code`, overwriting anything already there.
    pub(crate) async fn put(
        &self,
        code: &str,
        record: &DropRecord,
        ttl: Duration,
    ) -> Result<(), StateError> {
        let value = encode(record)?;
        self.state.set(&StateKey::drop(code), &value, Some(ttl)).await
    }

    pub(crate) async fn delete(&self, code: &str) -> Result<bool, StateError> {
        self.state.delete(&StateKey::drop(code)).await
    }

    pub(crate) async fn remaining_ttl(&self, code: &str) -> Result<Option<Duration>, StateError> {
        self.state.remaining_ttl(&StateKey::drop(code)).await
    }

    /// All stored drops as `(code, record)`; corrupt entries carry `None`.
    pub(crate) async fn scan(&self) -> Result<Vec<(String, Option<DropRecord>)>, StateError> {
        let entries = self.state.scan_keys_by_kind(KeyKind::Drop).await?;
        Ok(entries
            .into_iter()
            .filter_map(|(key, value)| {
                let code = StateKey::parse(&key)?.id;
                Some((code, serde_json::from_str(&value).ok()))
            })
            .collect())
    }
}

fn encode(record: &DropRecord) -> Result<String, StateError> {
    serde_json::to_string(record).map_err(|e| StateError::Serialization(e.to_string()))
}
