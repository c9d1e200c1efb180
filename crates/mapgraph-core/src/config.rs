// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Editor configuration and its storage port.
//!
//! Configuration values are serialized as JSON blobs and persisted through a
//! [`ConfigStore`]. The core ships an in-memory store; the CLI provides a
//! filesystem-backed one.
use std::collections::BTreeMap;
use std::sync::Mutex;

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use thiserror::Error;

/// Key under which [`EditorConfig`] is stored.
pub const EDITOR_CONFIG_KEY: &str = "editor";

/// Default number of undoable edits kept.
pub const DEFAULT_MAX_HISTORY: usize = 100;

/// Tunables for an [`Editor`](crate::Editor).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Maximum number of committed edits kept for undo. Older edits are folded
    /// into the history base. `0` means unbounded.
    pub max_history: usize,
    /// Run [`Graph::validate`](crate::Graph::validate) on every commit and log
    /// a warning when it fails.
    pub validate_on_commit: bool,
    /// Log every change through [`TracingSink`](crate::TracingSink).
    pub log_changes: bool,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            max_history: DEFAULT_MAX_HISTORY,
            validate_on_commit: false,
            log_changes: false,
        }
    }
}

/// Backing storage for serialized config, addressed by key
/// (for example [`EDITOR_CONFIG_KEY`]).
pub trait ConfigStore {
    /// Bytes stored under `key`, or [`ConfigError::NotFound`].
    fn load_raw(&self, key: &str) -> Result<Vec<u8>, ConfigError>;
    /// Stores `data` under `key`, replacing any previous value.
    fn save_raw(&self, key: &str, data: &[u8]) -> Result<(), ConfigError>;
}

/// Failure to read or write editor config.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Nothing is stored under the key.
    #[error("no config stored under `{0}`")]
    NotFound(String),
    /// Reading or writing the backing storage failed.
    #[error("config i/o failed: {0}")]
    Io(#[from] std::io::Error),
    /// Stored bytes are not valid JSON for the requested type.
    #[error("malformed config: {0}")]
    Serde(#[from] serde_json::Error),
    /// The store cannot be reached (no config directory, poisoned lock).
    #[error("config store unavailable: {0}")]
    Unavailable(String),
}

/// Typed JSON access on top of a [`ConfigStore`].
///
/// A missing key and an empty blob both read as "not configured", so callers
/// fall back to defaults instead of failing on first run.
#[derive(Debug)]
pub struct ConfigService<S> {
    store: S,
}

impl<S> ConfigService<S> {
    /// Wraps `store`.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Returns the wrapped store.
    pub fn into_inner(self) -> S {
        self.store
    }
}

impl<S: ConfigStore> ConfigService<S> {
    /// Reads the value under `key`; `Ok(None)` when it was never saved.
    pub fn load<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, ConfigError> {
        let bytes = match self.store.load_raw(key) {
            Err(ConfigError::NotFound(_)) => return Ok(None),
            other => other?,
        };
        if bytes.is_empty() {
            return Ok(None);
        }
        Ok(Some(serde_json::from_slice(&bytes)?))
    }

    /// Writes `value` under `key` as pretty-printed JSON.
    pub fn save<T: Serialize>(&self, key: &str, value: &T) -> Result<(), ConfigError> {
        self.store.save_raw(key, &serde_json::to_vec_pretty(value)?)
    }

    /// Stored [`EditorConfig`], or the defaults when none is stored.
    pub fn editor_config(&self) -> Result<EditorConfig, ConfigError> {
        Ok(self.load(EDITOR_CONFIG_KEY)?.unwrap_or_default())
    }

    /// Persists `config` under [`EDITOR_CONFIG_KEY`].
    pub fn save_editor_config(&self, config: &EditorConfig) -> Result<(), ConfigError> {
        self.save(EDITOR_CONFIG_KEY, config)
    }
}

/// Process-local [`ConfigStore`], mainly for tests and embedding.
#[derive(Debug, Default)]
pub struct MemoryConfigStore {
    blobs: Mutex<BTreeMap<String, Vec<u8>>>,
}

impl MemoryConfigStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl ConfigStore for MemoryConfigStore {
    fn load_raw(&self, key: &str) -> Result<Vec<u8>, ConfigError> {
        let blobs = self
            .blobs
            .lock()
            .map_err(|_| ConfigError::Unavailable("lock poisoned".to_owned()))?;
        blobs
            .get(key)
            .cloned()
            .ok_or_else(|| ConfigError::NotFound(key.to_owned()))
    }

    fn save_raw(&self, key: &str, data: &[u8]) -> Result<(), ConfigError> {
        let mut blobs = self
            .blobs
            .lock()
            .map_err(|_| ConfigError::Unavailable("lock poisoned".to_owned()))?;
        blobs.insert(key.to_owned(), data.to_vec());
        Ok(())
    }
}
