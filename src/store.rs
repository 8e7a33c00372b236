//! Secondary property stores consulted when an artifact has no sidecar
//!
//! Timestamps used to live in a central property table before sidecars
//! existed. A [`PropertyStore`] exposes that older record read-only so a
//! freshly migrated mirror is not treated as never updated.

use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

use crate::cache::sidecar::{decode_latin1, parse_properties};

/// Epoch values with more digits than this are taken to be milliseconds
const MAX_SECONDS_DIGITS: usize = 10;

/// Read-only access to timestamps kept outside the sidecar
pub trait PropertyStore: Send + Sync {
    /// Returns the timestamp stored under `key` in epoch seconds, or `0` if
    /// the store has nothing usable for it.
    fn timestamp_in_seconds(&self, key: &str) -> i64;
}

/// Normalizes a stored epoch value to seconds.
///
/// Older writers stored milliseconds; anything longer than ten digits is
/// divided down. Values that do not parse yield `0`.
pub fn epoch_seconds(raw: &str) -> i64 {
    let raw = raw.trim();
    let value = match raw.parse::<i64>() {
        Ok(value) => value,
        Err(_) => return 0,
    };

    let digits = raw.trim_start_matches(&['-', '+'][..]).len();
    if digits > MAX_SECONDS_DIGITS {
        value / 1000
    } else {
        value
    }
}

/// In-memory property store
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    properties: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a property, replacing any previous value for `key`
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.properties.insert(key.into(), value.into());
    }
}

impl PropertyStore for MemoryStore {
    fn timestamp_in_seconds(&self, key: &str) -> i64 {
        self.properties.get(key).map_or(0, |raw| epoch_seconds(raw))
    }
}

/// Property store backed by a properties file on disk
///
/// The file is re-read on every lookup. A missing or unreadable file yields
/// `0` for every key.
#[derive(Debug, Clone)]
pub struct PropertiesFileStore {
    path: PathBuf,
}

impl PropertiesFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl PropertyStore for PropertiesFileStore {
    fn timestamp_in_seconds(&self, key: &str) -> i64 {
        match fs::read(&self.path) {
            Ok(bytes) => parse_properties(&decode_latin1(&bytes))
                .get(key)
                .map_or(0, |raw| epoch_seconds(raw)),
            Err(e) => {
                tracing::debug!(
                    path = %self.path.display(),
                    key,
                    error = %e,
                    "secondary property file unreadable"
                );
                0
            }
        }
    }
}
