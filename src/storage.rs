//! Local key-value storage for analytics data.
//!
//! The tracker persists everything through the [`Storage`] trait, a flat
//! string-keyed store matching the key layout earlier releases wrote. Two
//! implementations are provided:
//!
//! - [`JsonFileStore`]: a single JSON document on disk, written through on
//!   every mutation. This is the durable store holding the visitor id and
//!   counter state.
//! - [`MemoryStore`]: an in-memory map. Used for the session-scoped store
//!   (which must not outlive the process) and in tests.
//!
//! Reads of structured values go through [`Storage::read_json_or_default`]:
//! a missing key or a malformed value falls back to the type's default and
//! is never surfaced as an error. A corrupt counter blob must degrade to
//! fresh counters, not break the page.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::{debug, warn};

/// Storage key holding the persistent visitor identifier.
pub const VISITOR_ID_KEY: &str = "visitor_id";

/// Storage key for the legacy page-view counter blob.
pub const LEGACY_VIEWS_KEY: &str = "portfolio_views";

/// Storage key for the legacy click counter blob.
pub const LEGACY_CLICKS_KEY: &str = "portfolio_clicks_count";

/// Storage key for the versioned analytics state blob.
pub const STATE_KEY: &str = "portfolio_analytics_data";

/// Storage key for the schema-version migration marker.
pub const SCHEMA_VERSION_KEY: &str = "analytics_schema_version";

/// Session-store key for the last recorded session duration (seconds).
pub const SESSION_DURATION_KEY: &str = "last_session_duration";

/// Errors that can occur during storage operations.
#[derive(Error, Debug)]
pub enum StorageError {
    /// File system I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization failed.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// A flat string-keyed store.
///
/// Writes are synchronous: when `set` returns, the value is durable for
/// the implementation's durability level (disk for [`JsonFileStore`],
/// process memory for [`MemoryStore`]).
pub trait Storage {
    /// Returns the raw value stored under `key`, if any.
    fn get(&self, key: &str) -> Option<String>;

    /// Stores `value` under `key`, replacing any previous value.
    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Removes the value stored under `key`. Removing an absent key is a no-op.
    fn remove(&mut self, key: &str) -> Result<(), StorageError>;

    /// Returns `true` if a value is stored under `key`.
    fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Reads a JSON value under `key`, falling back to `T::default()`.
    ///
    /// A missing key yields the default silently; a present-but-malformed
    /// value yields the default and logs a warning. This accessor is the
    /// single place where parse failures are absorbed.
    fn read_json_or_default<T>(&self, key: &str) -> T
    where
        T: DeserializeOwned + Default,
    {
        match self.get(key) {
            None => T::default(),
            Some(raw) => match serde_json::from_str(&raw) {
                Ok(value) => value,
                Err(e) => {
                    warn!(key, error = %e, "Discarding malformed stored value");
                    T::default()
                }
            },
        }
    }

    /// Serializes `value` as JSON and stores it under `key`.
    fn write_json<T>(&mut self, key: &str, value: &T) -> Result<(), StorageError>
    where
        T: serde::Serialize,
    {
        let json = serde_json::to_string(value)?;
        self.set(key, &json)
    }
}

/// An in-memory store.
///
/// Backs the session-scoped storage and unit tests. Contents are lost when
/// the value is dropped.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    entries: BTreeMap<String, String>,
}

impl MemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of stored entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the store holds no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Storage for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), StorageError> {
        self.entries.remove(key);
        Ok(())
    }
}

/// A file-backed store holding all entries in one JSON document.
///
/// The whole document is rewritten on every mutation. That is acceptable
/// here: the store holds a handful of small counter blobs and mutations
/// are driven by single user interactions.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    entries: BTreeMap<String, String>,
}

impl JsonFileStore {
    /// Opens the store at `path`, creating parent directories as needed.
    ///
    /// A missing file yields an empty store. A present-but-corrupt file is
    /// discarded with a warning and the store starts empty; it will be
    /// rewritten on the next mutation.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the parent directory cannot be created or
    /// the file exists but cannot be read.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StorageError> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let entries = if path.exists() {
            let raw = fs::read_to_string(&path)?;
            match serde_json::from_str(&raw) {
                Ok(entries) => entries,
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Discarding corrupt store file");
                    BTreeMap::new()
                }
            }
        } else {
            debug!(path = %path.display(), "No existing store file, starting empty");
            BTreeMap::new()
        };

        Ok(Self { path, entries })
    }

    /// Returns the path of the backing file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn write_through(&self) -> Result<(), StorageError> {
        let json = serde_json::to_string_pretty(&self.entries)?;
        fs::write(&self.path, json)?;
        Ok(())
    }
}

impl Storage for JsonFileStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        self.entries.insert(key.to_string(), value.to_string());
        self.write_through()
    }

    fn remove(&mut self, key: &str) -> Result<(), StorageError> {
        if self.entries.remove(key).is_some() {
            self.write_through()?;
        }
        Ok(())
    }
}
