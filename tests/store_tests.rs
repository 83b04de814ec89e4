/// Credential store and auth cache tests.
///
/// Exercises the file-backed store end to end: token round-trips, logout
/// idempotence, persistence across handles, and degraded documents.
use std::fs;
use std::sync::Arc;

use reachard::auth::AuthCache;
use reachard::store::{FileStore, KeyValueStore, StoreError};

fn file_auth(dir: &tempfile::TempDir) -> AuthCache {
    let store = FileStore::open(dir.path().join("store.json")).unwrap();
    AuthCache::new(Arc::new(store))
}

// ---------------------------------------------------------------------------
// Token round-trip
// ---------------------------------------------------------------------------

#[test]
fn token_round_trips_verbatim() {
    let dir = tempfile::tempdir().unwrap();
    let auth = file_auth(&dir);

    let tokens = [
        "abc123",
        r#"{"not":"json","really":true}"#,
        "quote\" backslash\\ newline\n tab\t",
        "ünïcødé 🔑",
        "   padded   ",
    ];
    for token in tokens {
        auth.set_token(token).unwrap();
        assert_eq!(auth.get_token(), token);
        assert!(auth.is_logged_in());
    }
}

#[test]
fn last_put_wins() {
    let dir = tempfile::tempdir().unwrap();
    let auth = file_auth(&dir);
    auth.set_token("first").unwrap();
    auth.set_token("second").unwrap();
    assert_eq!(auth.get_token(), "second");
}

// ---------------------------------------------------------------------------
// Logout
// ---------------------------------------------------------------------------

#[test]
fn clearing_twice_is_fine() {
    let dir = tempfile::tempdir().unwrap();
    let auth = file_auth(&dir);
    auth.set_token("tok").unwrap();

    auth.clear_token().unwrap();
    auth.clear_token().unwrap();
    assert_eq!(auth.get_token(), "");
    assert!(!auth.is_logged_in());
}

#[test]
fn clearing_a_fresh_store_is_fine() {
    let dir = tempfile::tempdir().unwrap();
    let auth = file_auth(&dir);
    auth.clear_token().unwrap();
    assert_eq!(auth.get_token(), "");
}

// ---------------------------------------------------------------------------
// Persistence
// ---------------------------------------------------------------------------

#[test]
fn token_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    file_auth(&dir).set_token("persisted").unwrap();

    let reopened = file_auth(&dir);
    assert_eq!(reopened.get_token(), "persisted");
}

#[test]
fn two_handles_see_each_others_writes() {
    let dir = tempfile::tempdir().unwrap();
    let a = file_auth(&dir);
    let b = file_auth(&dir);

    a.set_token("from-a").unwrap();
    assert_eq!(b.get_token(), "from-a");
    b.clear_token().unwrap();
    assert!(!a.is_logged_in());
}

#[test]
fn document_layout_on_disk() {
    let dir = tempfile::tempdir().unwrap();
    let auth = file_auth(&dir);
    auth.set_token("tok").unwrap();

    let raw = fs::read_to_string(dir.path().join("store.json")).unwrap();
    let doc: serde_json::Value = serde_json::from_str(&raw).unwrap();
    assert_eq!(doc["name"], "reachard");
    assert_eq!(doc["version"], 1);
    assert_eq!(doc["partitions"]["auth"]["sessionToken"], "tok");
}

#[test]
fn open_creates_missing_directories() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("deeper").join("store.json");
    let store = FileStore::open(&path).unwrap();
    assert!(path.exists());
    assert_eq!(store.path(), path.as_path());
}

// ---------------------------------------------------------------------------
// Degraded documents
// ---------------------------------------------------------------------------

#[test]
fn non_string_value_reads_as_absent() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("store.json");
    fs::write(
        &path,
        r#"{"name":"reachard","version":1,"partitions":{"auth":{"sessionToken":42}}}"#,
    )
    .unwrap();

    let store = FileStore::open(&path).unwrap();
    assert_eq!(store.get("sessionToken").unwrap(), "");
}

#[test]
fn corrupt_document_reads_empty_and_is_replaced_on_write() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("store.json");
    fs::write(&path, "{ not json").unwrap();

    let auth = file_auth(&dir);
    assert!(!auth.is_logged_in());
    auth.set_token("fresh").unwrap();
    assert_eq!(auth.get_token(), "fresh");
}

#[test]
fn newer_schema_is_unavailable() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("store.json");
    fs::write(&path, r#"{"name":"reachard","version":2,"partitions":{}}"#).unwrap();

    let err = FileStore::open(&path).unwrap_err();
    assert!(matches!(err, StoreError::Unavailable(_)));
}

#[test]
fn unversioned_document_is_upgraded_in_place() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("store.json");
    fs::write(&path, r#"{"partitions":{"auth":{"sessionToken":"old"}}}"#).unwrap();

    let store = FileStore::open(&path).unwrap();
    assert_eq!(store.get("sessionToken").unwrap(), "old");

    let doc: serde_json::Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(doc["version"], 1);
}

#[test]
fn partitions_are_isolated() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("store.json");
    let auth = FileStore::open_partition(&path, "auth").unwrap();
    let prefs = FileStore::open_partition(&path, "prefs").unwrap();

    auth.put("sessionToken", "tok").unwrap();
    assert_eq!(prefs.get("sessionToken").unwrap(), "");
    prefs.put("sessionToken", "other").unwrap();
    assert_eq!(auth.get("sessionToken").unwrap(), "tok");
}
