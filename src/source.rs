//! Capability for data sources that keep a local copy of a remote feed

use crate::cache::{TimestampCache, TimestampError};
use crate::store::PropertyStore;

/// A data source backed by a locally cached artifact
///
/// Implementors hold a [`TimestampCache`] scoped to their artifact and get
/// the save/lookup pair for free.
pub trait LocalDataSource {
    /// The timestamp cache for this source's artifact
    fn timestamp_cache(&self) -> &TimestampCache;

    /// Records a successful refresh at `timestamp` (epoch seconds)
    fn save_last_updated(&self, timestamp: i64) -> Result<(), TimestampError> {
        self.timestamp_cache().record(timestamp)
    }

    /// Returns when the local copy was last refreshed, `0` if never
    fn last_updated(&self, store: Option<&dyn PropertyStore>, key: Option<&str>) -> i64 {
        self.timestamp_cache().resolve(store, key)
    }
}
