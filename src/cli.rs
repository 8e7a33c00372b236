//! Command-line interface parsing for the stampfile inspection tool
//!
//! This module handles parsing of CLI arguments using clap and renders the
//! result of a timestamp lookup for humans or as JSON.

use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::cache::{default_cache_dir, ResolvedTimestamp, TimestampSource};

/// Error types for CLI argument handling
#[derive(Debug, Error)]
pub enum CliError {
    /// `--xdg` was requested but the platform has no cache directory
    #[error("Could not determine the platform cache directory; pass --cache-dir instead")]
    NoCacheDir,

    /// JSON rendering failed
    #[error("Failed to render JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// stampfile - Inspect and record last-updated sidecars of cached artifacts
#[derive(Parser, Debug)]
#[command(name = "stampfile")]
#[command(about = "Inspect and record last-updated sidecars of locally cached artifacts")]
#[command(version)]
pub struct Cli {
    /// Log degraded reads and other diagnostics to stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Resolve relative artifact paths against this directory
    #[arg(long, global = true, value_name = "DIR", conflicts_with = "xdg")]
    pub cache_dir: Option<PathBuf>,

    /// Resolve relative artifact paths against the platform cache directory
    #[arg(long, global = true)]
    pub xdg: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Show when an artifact was last updated
    Show {
        /// The cached file or directory
        artifact: PathBuf,

        /// Properties file consulted when the artifact has no sidecar
        #[arg(long, value_name = "FILE", requires = "fallback_key")]
        fallback_file: Option<PathBuf>,

        /// Key to look up in the fallback file
        #[arg(long, value_name = "KEY", requires = "fallback_file")]
        fallback_key: Option<String>,

        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },

    /// Record a last-updated timestamp for an artifact
    Record {
        /// The cached file or directory
        artifact: PathBuf,

        /// Epoch seconds to record; defaults to now
        #[arg(long, value_name = "SECONDS", allow_hyphen_values = true)]
        at: Option<i64>,
    },
}

impl Cli {
    /// Returns the directory relative artifact paths are resolved against
    ///
    /// # Returns
    /// * `Ok(None)` when paths are used as given
    /// * `Err(CliError::NoCacheDir)` if `--xdg` was given but no cache dir exists
    pub fn base_dir(&self) -> Result<Option<PathBuf>, CliError> {
        if let Some(dir) = &self.cache_dir {
            return Ok(Some(dir.clone()));
        }
        if self.xdg {
            return default_cache_dir().map(Some).ok_or(CliError::NoCacheDir);
        }
        Ok(None)
    }

    /// Resolves an artifact argument to the path the cache should track
    pub fn artifact_path(&self, artifact: &Path) -> Result<PathBuf, CliError> {
        if artifact.is_absolute() {
            return Ok(artifact.to_path_buf());
        }
        Ok(match self.base_dir()? {
            Some(base) => base.join(artifact),
            None => artifact.to_path_buf(),
        })
    }
}

/// Result of `stampfile show`
#[derive(Debug, Serialize)]
pub struct ShowReport {
    pub artifact: PathBuf,
    pub sidecar: PathBuf,
    pub seconds: i64,
    pub source: TimestampSource,
    pub updated_at: Option<DateTime<Utc>>,
}

impl ShowReport {
    pub fn new(artifact: PathBuf, sidecar: PathBuf, resolved: ResolvedTimestamp) -> Self {
        Self {
            artifact,
            sidecar,
            seconds: resolved.seconds,
            source: resolved.source,
            updated_at: resolved.as_datetime(),
        }
    }

    pub fn to_json(&self) -> Result<String, CliError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Renders the report as a single human-readable line
    pub fn to_text(&self) -> String {
        let origin = match self.source {
            TimestampSource::Sidecar => "sidecar",
            TimestampSource::ModifiedTime => "artifact modification time",
            TimestampSource::SecondaryStore => "fallback store",
            TimestampSource::Never => "no record",
        };
        match self.updated_at {
            Some(at) => format!(
                "{}: {} ({}, from {})",
                self.artifact.display(),
                self.seconds,
                at.to_rfc3339(),
                origin
            ),
            None => format!("{}: never updated ({})", self.artifact.display(), origin),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parse_show() {
        let cli = Cli::parse_from(["stampfile", "show", "mirror.db"]);
        match cli.command {
            Command::Show {
                artifact,
                fallback_file,
                fallback_key,
                json,
            } => {
                assert_eq!(artifact, PathBuf::from("mirror.db"));
                assert!(fallback_file.is_none());
                assert!(fallback_key.is_none());
                assert!(!json);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_cli_parse_show_with_fallback() {
        let cli = Cli::parse_from([
            "stampfile",
            "show",
            "mirror.db",
            "--fallback-file",
            "db.properties",
            "--fallback-key",
            "nvd.last",
            "--json",
        ]);
        match cli.command {
            Command::Show {
                fallback_file,
                fallback_key,
                json,
                ..
            } => {
                assert_eq!(fallback_file, Some(PathBuf::from("db.properties")));
                assert_eq!(fallback_key.as_deref(), Some("nvd.last"));
                assert!(json);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_cli_fallback_file_requires_key() {
        let result = Cli::try_parse_from(["stampfile", "show", "mirror.db", "--fallback-file", "db.properties"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_cli_parse_record_at() {
        let cli = Cli::parse_from(["stampfile", "record", "mirror.db", "--at", "1700000000"]);
        match cli.command {
            Command::Record { at, .. } => assert_eq!(at, Some(1_700_000_000)),
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_cli_parse_record_negative_at() {
        let cli = Cli::parse_from(["stampfile", "record", "mirror.db", "--at", "-5"]);
        match cli.command {
            Command::Record { at, .. } => assert_eq!(at, Some(-5)),
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_cache_dir_conflicts_with_xdg() {
        let result = Cli::try_parse_from(["stampfile", "--xdg", "--cache-dir", "/tmp", "show", "a"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_artifact_path_joins_cache_dir() {
        let cli = Cli::parse_from(["stampfile", "--cache-dir", "/srv/mirrors", "show", "kev.json"]);
        let path = cli.artifact_path(Path::new("kev.json")).unwrap();
        assert_eq!(path, PathBuf::from("/srv/mirrors/kev.json"));
    }

    #[test]
    fn test_artifact_path_keeps_absolute() {
        let cli = Cli::parse_from(["stampfile", "--cache-dir", "/srv/mirrors", "show", "/data/kev.json"]);
        let path = cli.artifact_path(Path::new("/data/kev.json")).unwrap();
        assert_eq!(path, PathBuf::from("/data/kev.json"));
    }

    #[test]
    fn test_artifact_path_without_base() {
        let cli = Cli::parse_from(["stampfile", "show", "kev.json"]);
        let path = cli.artifact_path(Path::new("kev.json")).unwrap();
        assert_eq!(path, PathBuf::from("kev.json"));
    }

    #[test]
    fn test_show_report_text() {
        let report = ShowReport::new(
            PathBuf::from("kev.json"),
            PathBuf::from("kev.json.properties"),
            ResolvedTimestamp {
                seconds: 1_709_632_800,
                source: TimestampSource::Sidecar,
            },
        );
        assert_eq!(
            report.to_text(),
            "kev.json: 1709632800 (2024-03-05T10:00:00+00:00, from sidecar)"
        );
    }

    #[test]
    fn test_show_report_never() {
        let report = ShowReport::new(
            PathBuf::from("kev.json"),
            PathBuf::from("kev.json.properties"),
            ResolvedTimestamp {
                seconds: 0,
                source: TimestampSource::Never,
            },
        );
        assert_eq!(report.to_text(), "kev.json: never updated (no record)");
    }

    #[test]
    fn test_show_report_json() {
        let report = ShowReport::new(
            PathBuf::from("kev.json"),
            PathBuf::from("kev.json.properties"),
            ResolvedTimestamp {
                seconds: 12345,
                source: TimestampSource::SecondaryStore,
            },
        );
        let value: serde_json::Value = serde_json::from_str(&report.to_json().unwrap()).unwrap();
        assert_eq!(value["seconds"], 12345);
        assert_eq!(value["source"], "secondary_store");
    }
}
