use std::collections::BTreeMap;
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use super::{AUTH_PARTITION, KeyValueStore, SCHEMA_VERSION, STORE_NAME, StoreError, decode_string};

// ---------------------------------------------------------------------------
// On-disk document
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoreDocument {
    #[serde(default = "default_name")]
    name: String,
    #[serde(default)]
    version: u32,
    #[serde(default)]
    partitions: BTreeMap<String, BTreeMap<String, Value>>,
}

fn default_name() -> String {
    STORE_NAME.to_string()
}

impl StoreDocument {
    fn fresh() -> Self {
        let mut partitions = BTreeMap::new();
        partitions.insert(AUTH_PARTITION.to_string(), BTreeMap::new());
        Self {
            name: STORE_NAME.to_string(),
            version: SCHEMA_VERSION,
            partitions,
        }
    }
}

// ---------------------------------------------------------------------------
// FileStore
// ---------------------------------------------------------------------------

/// JSON-file backed store scoped to one partition.
///
/// Every operation re-reads the document so that state written by another
/// `reachard` process is observed. Writes go through a temp file and a
/// rename so readers never see a half-written document.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    partition: String,
    lock: Mutex<()>,
}

impl FileStore {
    /// Open (creating if needed) the store at `path`, scoped to the `auth`
    /// partition.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        Self::open_partition(path, AUTH_PARTITION)
    }

    /// Open the store at `path`, scoped to `partition`.
    ///
    /// Idempotent: creates the parent directory, the document, and the
    /// partition when missing, and upgrades documents written before
    /// versioning. Refuses documents with a newer schema version.
    pub fn open_partition(
        path: impl Into<PathBuf>,
        partition: &str,
    ) -> Result<Self, StoreError> {
        let store = Self {
            path: path.into(),
            partition: partition.to_string(),
            lock: Mutex::new(()),
        };

        if let Some(parent) = store.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).map_err(|e| {
                StoreError::Unavailable(format!("cannot create {}: {e}", parent.display()))
            })?;
        }

        let existing = match fs::read_to_string(&store.path) {
            Ok(content) => Some(content),
            Err(e) if e.kind() == ErrorKind::NotFound => None,
            Err(e) => {
                return Err(StoreError::Unavailable(format!(
                    "cannot read {}: {e}",
                    store.path.display()
                )));
            }
        };

        let Some(content) = existing else {
            debug!(path = %store.path.display(), "creating credential store");
            write_document(&store.path, &StoreDocument::fresh())
                .map_err(|e| StoreError::Unavailable(e.to_string()))?;
            return Ok(store);
        };

        let mut doc = match serde_json::from_str::<StoreDocument>(&content) {
            Ok(doc) => doc,
            Err(e) => {
                // Left in place; the next put replaces it.
                warn!(path = %store.path.display(), error = %e, "credential store is corrupt, treating as empty");
                return Ok(store);
            }
        };

        if doc.version > SCHEMA_VERSION {
            return Err(StoreError::Unavailable(format!(
                "store schema version {} is newer than supported version {SCHEMA_VERSION}",
                doc.version
            )));
        }

        let needs_upgrade =
            doc.version < SCHEMA_VERSION || !doc.partitions.contains_key(&store.partition);
        if needs_upgrade {
            doc.version = SCHEMA_VERSION;
            doc.partitions.entry(store.partition.clone()).or_default();
            write_document(&store.path, &doc).map_err(|e| StoreError::Unavailable(e.to_string()))?;
        }

        Ok(store)
    }

    /// Path of the backing document.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the current document, or `None` when it is missing or corrupt.
    fn load(&self) -> Result<Option<StoreDocument>, StoreError> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(StoreError::Unavailable(format!(
                    "cannot read {}: {e}",
                    self.path.display()
                )));
            }
        };

        match serde_json::from_str(&content) {
            Ok(doc) => Ok(Some(doc)),
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "credential store is corrupt, treating as empty");
                Ok(None)
            }
        }
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<String, StoreError> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        let doc = self.load()?;
        let value = doc
            .as_ref()
            .and_then(|d| d.partitions.get(&self.partition))
            .and_then(|p| p.get(key));
        Ok(decode_string(value))
    }

    fn put(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        let mut doc = self
            .load()
            .map_err(|e| StoreError::Write(e.to_string()))?
            .unwrap_or_else(StoreDocument::fresh);
        doc.partitions
            .entry(self.partition.clone())
            .or_default()
            .insert(key.to_string(), Value::String(value.to_string()));
        write_document(&self.path, &doc)
    }

    fn delete(&self, key: &str) -> Result<(), StoreError> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        let Some(mut doc) = self.load().map_err(|e| StoreError::Write(e.to_string()))? else {
            return Ok(());
        };
        let removed = doc
            .partitions
            .get_mut(&self.partition)
            .and_then(|p| p.remove(key))
            .is_some();
        if !removed {
            return Ok(());
        }
        write_document(&self.path, &doc)
    }
}

// ---------------------------------------------------------------------------
// File I/O
// ---------------------------------------------------------------------------

/// Replace the document at `path` atomically.
///
/// The JSON goes to a uniquely named sibling temp file which is renamed over
/// `path`. The temp file is created owner-only on unix since the document
/// holds a session secret, and it is removed again on any failure.
fn write_document(path: &Path, doc: &StoreDocument) -> Result<(), StoreError> {
    let json = serde_json::to_string_pretty(doc)
        .map_err(|e| StoreError::Write(format!("cannot serialize store: {e}")))?;

    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut tmp = tempfile::Builder::new()
        .prefix(".reachard-store-")
        .suffix(".tmp")
        .tempfile_in(dir)
        .map_err(|e| StoreError::Write(format!("cannot create temp file in {}: {e}", dir.display())))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        if let Err(e) = tmp.as_file().set_permissions(fs::Permissions::from_mode(0o600)) {
            warn!(path = %tmp.path().display(), error = %e, "cannot restrict store permissions");
        }
    }

    tmp.write_all(json.as_bytes())
        .and_then(|()| tmp.as_file().sync_all())
        .map_err(|e| StoreError::Write(format!("cannot write {}: {e}", tmp.path().display())))?;

    // On failure the temp file comes back inside the error and is deleted
    // when dropped.
    tmp.persist(path).map_err(|e| {
        warn!(path = %path.display(), error = %e.error, "cannot replace credential store");
        StoreError::Write(format!("cannot replace {}: {}", path.display(), e.error))
    })?;
    Ok(())
}
