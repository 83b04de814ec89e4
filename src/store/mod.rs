/// Credential store: durable key-value persistence for client secrets.
///
/// The store is a single JSON document on disk, modelled after a browser
/// object database:
///
/// ```text
/// {
///   "name": "reachard",
///   "version": 1,
///   "partitions": {
///     "auth": { "sessionToken": "..." }
///   }
/// }
/// ```
///
/// A [`FileStore`] handle is scoped to one partition. Values are stored as
/// raw JSON so that a corrupted or foreign value can be detected on read and
/// treated as absent instead of failing the caller.
///
/// Two implementations share the [`KeyValueStore`] seam:
///
/// - [`FileStore`]: persistent, survives process restarts
/// - [`MemoryStore`]: in-process only, used by tests and ephemeral sessions
mod file;
mod memory;

use thiserror::Error;

pub use file::FileStore;
pub use memory::MemoryStore;

/// Document name written into every store file.
pub const STORE_NAME: &str = "reachard";

/// Current schema version of the store document.
pub const SCHEMA_VERSION: u32 = 1;

/// Partition holding authentication state.
pub const AUTH_PARTITION: &str = "auth";

/// Errors surfaced by store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The environment denies access to persistent storage (missing home
    /// directory, permission denied, unsupported schema version).
    #[error("storage unavailable: {0}")]
    Unavailable(String),

    /// A write could not be completed (disk full, permission denied).
    #[error("storage write failed: {0}")]
    Write(String),
}

/// Key-value persistence scoped to a single partition.
///
/// All operations are blocking. Implementations must serialize operations on
/// one handle so that two puts to the same key are observed in call order.
pub trait KeyValueStore: Send + Sync {
    /// Return the stored string for `key`, or `""` when the key is absent or
    /// holds a non-string value.
    fn get(&self, key: &str) -> Result<String, StoreError>;

    /// Insert or replace the value under `key`.
    fn put(&self, key: &str, value: &str) -> Result<(), StoreError>;

    /// Remove `key`. Removing an absent key succeeds.
    fn delete(&self, key: &str) -> Result<(), StoreError>;
}

/// Decode a stored JSON value, treating anything but a string as absent.
pub(crate) fn decode_string(value: Option<&serde_json::Value>) -> String {
    match value {
        Some(serde_json::Value::String(s)) => s.clone(),
        _ => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn decode_string_accepts_strings() {
        let value = json!("tok123");
        assert_eq!(decode_string(Some(&value)), "tok123");
    }

    #[test]
    fn decode_string_treats_non_strings_as_absent() {
        assert_eq!(decode_string(None), "");
        assert_eq!(decode_string(Some(&json!(42))), "");
        assert_eq!(decode_string(Some(&json!(null))), "");
        assert_eq!(decode_string(Some(&json!({"token": "x"}))), "");
    }

    #[test]
    fn store_error_display() {
        let err = StoreError::Write("disk full".to_string());
        assert_eq!(err.to_string(), "storage write failed: disk full");
    }
}
