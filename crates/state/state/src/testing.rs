use std::time::Duration;

use crate::error::StateError;
use crate::key::{KeyKind, StateKey};
use crate::store::StateStore;

fn test_key(id: &str) -> StateKey {
    StateKey::drop(id)
}

/// Run the full state store conformance test suite.
///
/// Call this from your backend's test module with a fresh store instance.
///
/// # Errors
///
/// Returns an error if any conformance test fails.
pub async fn run_store_conformance_tests(store: &dyn StateStore) -> Result<(), StateError> {
    test_get_missing(store).await?;
    test_set_and_get(store).await?;
    test_set_overwrites(store).await?;
    test_check_and_set_new(store).await?;
    test_check_and_set_existing(store).await?;
    test_delete_is_idempotent(store).await?;
    test_remaining_ttl(store).await?;
    test_scan_by_kind(store).await?;
    test_ping(store).await?;
    Ok(())
}

async fn test_get_missing(store: &dyn StateStore) -> Result<(), StateError> {
    let val = store.get(&test_key("MISSING")).await?;
    assert!(val.is_none(), "get on missing key should return None");
    Ok(())
}

async fn test_set_and_get(store: &dyn StateStore) -> Result<(), StateError> {
    let key = test_key("SETGET");
    store.set(&key, "hello", None).await?;
    let val = store.get(&key).await?;
    assert_eq!(val.as_deref(), Some("hello"));
    Ok(())
}

async fn test_set_overwrites(store: &dyn StateStore) -> Result<(), StateError> {
    let key = test_key("OVERWR");
    store.set(&key, "v1", Some(Duration::from_secs(60))).await?;
    store.set(&key, "v2", Some(Duration::from_secs(60))).await?;
    let val = store.get(&key).await?;
    assert_eq!(val.as_deref(), Some("v2"), "set should overwrite silently");
    Ok(())
}

async fn test_check_and_set_new(store: &dyn StateStore) -> Result<(), StateError> {
    let key = test_key("CASNEW");
    let created = store.check_and_set(&key, "v1", None).await?;
    assert!(created, "check_and_set on new key should return true");
    let val = store.get(&key).await?;
    assert_eq!(val.as_deref(), Some("v1"));
    Ok(())
}

async fn test_check_and_set_existing(store: &dyn StateStore) -> Result<(), StateError> {
    let key = test_key("CASOLD");
    store.set(&key, "v1", None).await?;
    let created = store.check_and_set(&key, "v2", None).await?;
    assert!(
        !created,
        "check_and_set on existing key should return false"
    );
    let val = store.get(&key).await?;
    assert_eq!(val.as_deref(), Some("v1"), "original value should remain");
    Ok(())
}

async fn test_delete_is_idempotent(store: &dyn StateStore) -> Result<(), StateError> {
    let key = test_key("DELETE");
    store.set(&key, "bye", None).await?;
    let existed = store.delete(&key).await?;
    assert!(existed, "delete should return true for existing key");
    let val = store.get(&key).await?;
    assert!(val.is_none(), "get after delete should return None");

    let existed = store.delete(&key).await?;
    assert!(!existed, "delete on missing key should return false");
    Ok(())
}

async fn test_remaining_ttl(store: &dyn StateStore) -> Result<(), StateError> {
    let key = test_key("TTLSET");
    store
        .set(&key, "ephemeral", Some(Duration::from_secs(3600)))
        .await?;
    let ttl = store.remaining_ttl(&key).await?;
    let ttl = ttl.expect("key with TTL should report remaining time");
    assert!(ttl <= Duration::from_secs(3600));
    assert!(ttl > Duration::from_secs(3500));

    let persistent = test_key("TTLNON");
    store.set(&persistent, "forever", None).await?;
    assert!(store.remaining_ttl(&persistent).await?.is_none());

    assert!(store.remaining_ttl(&test_key("TTLGONE")).await?.is_none());
    Ok(())
}

async fn test_scan_by_kind(store: &dyn StateStore) -> Result<(), StateError> {
    let key = test_key("SCANME");
    store.set(&key, "found", None).await?;
    let other = StateKey::new(KeyKind::Custom("other".into()), "SCANME");
    store.set(&other, "hidden", None).await?;

    let entries = store.scan_keys_by_kind(KeyKind::Drop).await?;
    assert!(
        entries
            .iter()
            .any(|(k, v)| k == "drop:SCANME" && v == "found"),
        "scan should return drop keys in canonical form"
    );
    assert!(
        entries.iter().all(|(k, _)| k.starts_with("drop:")),
        "scan should only return keys of the requested kind"
    );
    Ok(())
}

async fn test_ping(store: &dyn StateStore) -> Result<(), StateError> {
    store.ping().await
}
