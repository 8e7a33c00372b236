//! Sidecar records stored next to a cached artifact
//!
//! A sidecar is a flat `key=value` properties file named after the artifact
//! with a `.properties` suffix. Only `LAST_UPDATED` is interpreted; any other
//! keys are carried through parsing and ignored.

use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::ffi::OsString;
use std::fs;
use std::io;
use std::num::ParseIntError;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Suffix appended to the artifact path to locate its sidecar
pub const SIDECAR_SUFFIX: &str = ".properties";

/// Property holding the epoch seconds of the last successful refresh
pub const LAST_UPDATED_KEY: &str = "LAST_UPDATED";

/// Reasons a present sidecar could not be turned into a timestamp
#[derive(Debug, Error)]
pub enum SidecarError {
    /// The sidecar exists but could not be read
    #[error("failed to read sidecar: {0}")]
    Io(#[from] io::Error),

    /// `LAST_UPDATED` is present but not an integer
    #[error("invalid LAST_UPDATED value '{value}': {source}")]
    InvalidValue {
        value: String,
        #[source]
        source: ParseIntError,
    },
}

/// Returns the sidecar location for an artifact.
///
/// Trailing separators are dropped first, so a directory artifact `mirror/`
/// maps to `mirror.properties` rather than a hidden file inside it.
pub fn sidecar_path(artifact: &Path) -> PathBuf {
    let mut name: OsString = artifact.components().as_path().as_os_str().to_owned();
    name.push(SIDECAR_SUFFIX);
    PathBuf::from(name)
}

/// Parses properties text into a key/value map.
///
/// Blank lines and lines starting with `#` or `!` are skipped. A line ending
/// in an odd number of backslashes continues onto the next one. The key ends
/// at the first unescaped `=`, `:` or whitespace, and `\`-escapes (including
/// `\uXXXX`) are decoded in both key and value. A later duplicate key
/// replaces an earlier one.
pub fn parse_properties(content: &str) -> HashMap<String, String> {
    logical_lines(content)
        .iter()
        .map(|line| split_entry(line))
        .collect()
}

/// Joins continued physical lines, dropping comments and blank lines
fn logical_lines(content: &str) -> Vec<String> {
    let mut lines = Vec::new();
    let mut physical = content.lines();

    while let Some(line) = physical.next() {
        let line = line.trim_start();
        if line.is_empty() || line.starts_with('#') || line.starts_with('!') {
            continue;
        }

        let mut logical = String::new();
        let mut current = line;
        while continues(current) {
            logical.push_str(&current[..current.len() - 1]);
            match physical.next() {
                Some(next) => current = next.trim_start(),
                None => {
                    current = "";
                    break;
                }
            }
        }
        logical.push_str(current);
        lines.push(logical);
    }

    lines
}

fn continues(line: &str) -> bool {
    line.chars().rev().take_while(|&c| c == '\\').count() % 2 == 1
}

fn split_entry(line: &str) -> (String, String) {
    let mut key_end = line.len();
    let mut escaped = false;

    for (idx, c) in line.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        if c == '\\' {
            escaped = true;
        } else if c == '=' || c == ':' || c.is_whitespace() {
            key_end = idx;
            break;
        }
    }

    let rest = line[key_end..].trim_start();
    let rest = rest.strip_prefix(&['=', ':'][..]).unwrap_or(rest).trim_start();
    (unescape(&line[..key_end]), unescape(rest))
}

fn unescape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();

    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('t') => out.push('\t'),
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('f') => out.push('\u{c}'),
            Some('u') => {
                let hex: String = chars.by_ref().take(4).collect();
                match u32::from_str_radix(&hex, 16).ok().and_then(char::from_u32) {
                    Some(decoded) => out.push(decoded),
                    None => {
                        out.push_str("\\u");
                        out.push_str(&hex);
                    }
                }
            }
            Some(other) => out.push(other),
            None => {}
        }
    }

    out
}

/// Extracts `LAST_UPDATED` from parsed properties.
///
/// A missing key reads as `0`, meaning "never updated".
pub fn last_updated_from(props: &HashMap<String, String>) -> Result<i64, SidecarError> {
    match props.get(LAST_UPDATED_KEY) {
        None => Ok(0),
        Some(value) => value.trim().parse::<i64>().map_err(|source| SidecarError::InvalidValue {
            value: value.clone(),
            source,
        }),
    }
}

/// Reads a sidecar file and returns its `LAST_UPDATED` value
///
/// Bytes are decoded as ISO-8859-1, so stray non-UTF-8 bytes in comments or
/// other keys never hide a valid timestamp.
pub fn read_last_updated(path: &Path) -> Result<i64, SidecarError> {
    let bytes = fs::read(path)?;
    last_updated_from(&parse_properties(&decode_latin1(&bytes)))
}

/// Decodes ISO-8859-1 bytes; every byte maps to the code point of equal value
pub fn decode_latin1(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| char::from(b)).collect()
}

/// Renders the full sidecar contents for a timestamp.
///
/// The leading comment records when the file was written, in the usual
/// `.properties` header layout.
pub fn render(timestamp: i64, written_at: DateTime<Utc>) -> String {
    format!(
        "#{}\n{}={}\n",
        written_at.format("%a %b %d %H:%M:%S UTC %Y"),
        LAST_UPDATED_KEY,
        timestamp
    )
}
