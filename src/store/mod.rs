//! The seam between offline transfer-map construction and the online router
//! (spec.md §4.3): a trait an embedder plugs a cache or persistence layer
//! into, plus an in-memory implementation sufficient for tests.

use std::sync::Arc;

use dashmap::DashMap;

use crate::model::ServiceDay;
use crate::transfers::TransferMap;

/// Looks up and stores a built [`TransferMap`] by [`ServiceDay`].
///
/// A file-backed implementation is out of scope for this crate; callers that
/// need persistence implement this trait against their own storage.
pub trait TransferStore: Send + Sync {
    fn get(&self, day: ServiceDay) -> Option<Arc<TransferMap>>;
    fn put(&self, day: ServiceDay, map: TransferMap);

    /// An unprepared day is not an error (spec.md §4.3): the router falls
    /// back to same-trip rides only, at reduced pruning.
    fn get_or_empty(&self, day: ServiceDay) -> Arc<TransferMap> {
        self.get(day).unwrap_or_else(|| Arc::new(TransferMap::new()))
    }
}

/// A `DashMap`-backed [`TransferStore`], matching the concurrent-insert idiom
/// used throughout `index`/`transfers`.
#[derive(Default)]
pub struct InMemoryTransferStore {
    maps: DashMap<ServiceDay, Arc<TransferMap>>,
}

impl InMemoryTransferStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TransferStore for InMemoryTransferStore {
    fn get(&self, day: ServiceDay) -> Option<Arc<TransferMap>> {
        self.maps.get(&day).map(|entry| entry.value().clone())
    }

    fn put(&self, day: ServiceDay, map: TransferMap) {
        self.maps.insert(day, Arc::new(map));
    }
}
