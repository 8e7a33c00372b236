//! Timestamp cache for a locally mirrored artifact
//!
//! Provides a `TimestampCache` that records when an artifact was last refreshed
//! in a sidecar next to it, and resolves that time again with graceful
//! degradation when the sidecar is missing or damaged.

use chrono::{DateTime, Duration, Utc};
use directories::ProjectDirs;
use serde::Serialize;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;
use thiserror::Error;
use tracing::Span;

use super::sidecar::{self, SidecarError};
use crate::store::PropertyStore;

/// Errors that can occur when recording a timestamp
///
/// Reads never produce these; they degrade instead.
#[derive(Debug, Error)]
pub enum TimestampError {
    /// The sidecar could not be created or written
    #[error("failed to write timestamp sidecar {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Timestamps before the epoch cannot be recorded
    #[error("refusing to record negative timestamp {0}")]
    Negative(i64),
}

/// Where a resolved timestamp came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TimestampSource {
    /// A readable sidecar next to the artifact
    Sidecar,
    /// The artifact's modification time, used when the sidecar is damaged
    ModifiedTime,
    /// The secondary property store, used when there is no sidecar at all
    SecondaryStore,
    /// Nothing could be resolved
    Never,
}

/// A resolved timestamp together with the tier that produced it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ResolvedTimestamp {
    /// Epoch seconds; `0` means never updated
    pub seconds: i64,
    pub source: TimestampSource,
}

impl ResolvedTimestamp {
    const NEVER: Self = Self {
        seconds: 0,
        source: TimestampSource::Never,
    };

    /// Returns the timestamp as a UTC date, or `None` for "never updated"
    pub fn as_datetime(&self) -> Option<DateTime<Utc>> {
        if self.seconds == 0 {
            return None;
        }
        DateTime::from_timestamp(self.seconds, 0)
    }

    /// How long before `now` the artifact was last updated
    pub fn age_at(&self, now: DateTime<Utc>) -> Option<Duration> {
        self.as_datetime().map(|updated| now - updated)
    }
}

/// Records and resolves the last-updated time of one cached artifact
///
/// The cache holds no state beyond the artifact path and its diagnostic span;
/// every call goes back to the filesystem, so clones can be shared freely
/// between callers. There is no locking: concurrent writers to the same
/// artifact race and the last write wins.
#[derive(Debug, Clone)]
pub struct TimestampCache {
    /// The cached file or directory
    artifact: PathBuf,
    /// Parent span for diagnostics about degraded reads
    span: Span,
}

impl TimestampCache {
    /// Creates a cache scoped to the given artifact
    pub fn new(artifact: impl Into<PathBuf>) -> Self {
        let artifact = artifact.into();
        let span = tracing::debug_span!("timestamp_cache", artifact = %artifact.display());
        Self { artifact, span }
    }

    /// Replaces the span diagnostics are reported under
    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    /// The artifact this cache tracks
    pub fn artifact(&self) -> &Path {
        &self.artifact
    }

    /// Returns the path of the sidecar for this artifact
    pub fn sidecar_path(&self) -> PathBuf {
        sidecar::sidecar_path(&self.artifact)
    }

    /// Records `timestamp` (epoch seconds) as the artifact's last update
    ///
    /// Any existing sidecar is overwritten entirely.
    ///
    /// # Returns
    /// * `Ok(())` on success
    /// * `Err(TimestampError)` if the timestamp is negative or the sidecar
    ///   cannot be written; callers should abort the refresh cycle
    pub fn record(&self, timestamp: i64) -> Result<(), TimestampError> {
        if timestamp < 0 {
            return Err(TimestampError::Negative(timestamp));
        }

        let path = self.sidecar_path();
        let content = sidecar::render(timestamp, Utc::now());

        fs::write(&path, content).map_err(|source| TimestampError::Write { path, source })
    }

    /// Records the current time as the artifact's last update
    pub fn record_now(&self) -> Result<(), TimestampError> {
        self.record(Utc::now().timestamp())
    }

    /// Resolves the last-updated time in epoch seconds, `0` if unknown
    ///
    /// See [`TimestampCache::resolve_detailed`] for the fallback order.
    pub fn resolve(&self, store: Option<&dyn PropertyStore>, key: Option<&str>) -> i64 {
        self.resolve_detailed(store, key).seconds
    }

    /// Resolves the last-updated time and reports which tier answered
    ///
    /// 1. A sidecar that reads and parses is authoritative.
    /// 2. A sidecar that exists but fails to read or parse is logged and the
    ///    artifact's modification time is used instead.
    /// 3. Without a sidecar, the secondary store is asked for `key` when both
    ///    are supplied; otherwise the result is `0`.
    pub fn resolve_detailed(
        &self,
        store: Option<&dyn PropertyStore>,
        key: Option<&str>,
    ) -> ResolvedTimestamp {
        let path = self.sidecar_path();

        if path.is_file() {
            return match sidecar::read_last_updated(&path) {
                Ok(seconds) => ResolvedTimestamp {
                    seconds,
                    source: TimestampSource::Sidecar,
                },
                Err(e) => self.degrade_to_mtime(&path, e),
            };
        }

        match (store, key) {
            (Some(store), Some(key)) => ResolvedTimestamp {
                seconds: store.timestamp_in_seconds(key),
                source: TimestampSource::SecondaryStore,
            },
            _ => ResolvedTimestamp::NEVER,
        }
    }

    fn degrade_to_mtime(&self, path: &Path, error: SidecarError) -> ResolvedTimestamp {
        tracing::debug!(
            parent: &self.span,
            sidecar = %path.display(),
            error = %error,
            "error reading timestamp sidecar, falling back to artifact modification time"
        );

        match modified_seconds(&self.artifact) {
            Ok(seconds) => ResolvedTimestamp {
                seconds,
                source: TimestampSource::ModifiedTime,
            },
            Err(e) => {
                tracing::debug!(
                    parent: &self.span,
                    error = %e,
                    "artifact modification time unavailable"
                );
                ResolvedTimestamp::NEVER
            }
        }
    }
}

/// Records `timestamp` in the sidecar of `artifact`
pub fn record_timestamp(artifact: &Path, timestamp: i64) -> Result<(), TimestampError> {
    TimestampCache::new(artifact).record(timestamp)
}

/// Resolves the last-updated time of `artifact`, `0` if unknown
pub fn resolve_timestamp(
    artifact: &Path,
    store: Option<&dyn PropertyStore>,
    key: Option<&str>,
) -> i64 {
    TimestampCache::new(artifact).resolve(store, key)
}

/// Returns the platform cache directory for mirrored artifacts
///
/// Uses `~/.cache/stampfile/` on Linux, or equivalent XDG path on other platforms.
/// Returns `None` if the cache directory cannot be determined (e.g., no home directory).
pub fn default_cache_dir() -> Option<PathBuf> {
    let project_dirs = ProjectDirs::from("", "", "stampfile")?;
    Some(project_dirs.cache_dir().to_path_buf())
}

/// Modification time of `path` in whole epoch seconds
fn modified_seconds(path: &Path) -> io::Result<i64> {
    let modified = fs::metadata(path)?.modified()?;
    let secs = match modified.duration_since(UNIX_EPOCH) {
        Ok(elapsed) => elapsed.as_secs() as i64,
        Err(before) => -(before.duration().as_secs() as i64),
    };
    Ok(secs)
}
