//! Sidecar last-updated timestamps for locally mirrored data sources
//!
//! This module exposes the cache, store and CLI modules for use in integration tests.

pub mod cache;
pub mod cli;
pub mod source;
pub mod store;

pub use cache::{record_timestamp, resolve_timestamp, TimestampCache, TimestampError};
pub use source::LocalDataSource;
pub use store::PropertyStore;
