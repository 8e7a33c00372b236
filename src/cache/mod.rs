//! Cache module for tracking when local mirrors were last refreshed
//!
//! This module provides a timestamp cache that persists a `LAST_UPDATED` value in a
//! sidecar file next to each cached artifact. Reads degrade gracefully: a damaged
//! sidecar falls back to the artifact's modification time, and a missing one to a
//! secondary property store, so a bad hint never blocks an update check.

mod manager;
pub mod sidecar;

pub use manager::{
    default_cache_dir, record_timestamp, resolve_timestamp, ResolvedTimestamp, TimestampCache,
    TimestampError, TimestampSource,
};
