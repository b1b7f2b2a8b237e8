//! Durable per-list table preferences.
//!
//! A layout is stored as one JSON record per list id:
//!
//! ```text
//! { "v": 1, "order": [..], "hidden": [..], "widths": {"id": 120}, "sort": {"columnId": "status", "direction": "asc"} | null }
//! ```
//!
//! Records are always written in full. Reading is defensive: each field is
//! validated on its own and anything with the wrong shape is dropped, so a
//! corrupted or foreign record degrades to defaults instead of failing.

mod memory;
mod record;
mod sqlite;
mod store;

pub use memory::MemoryStore;
pub use record::{LayoutRecord, RECORD_VERSION};
pub use sqlite::SqliteStore;
pub use store::LayoutStore;

use std::sync::Arc;

use log::{debug, warn};

use crate::error::StoreError;

/// Handle to the layout store shared by every table of an application.
#[derive(Clone)]
pub struct Preferences {
    store: Arc<dyn LayoutStore>,
}

impl std::fmt::Debug for Preferences {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Preferences").finish_non_exhaustive()
    }
}

impl Preferences {
    pub fn new(store: impl LayoutStore + 'static) -> Self {
        Self {
            store: Arc::new(store),
        }
    }

    /// Shares an existing store.
    pub fn from_arc(store: Arc<dyn LayoutStore>) -> Self {
        Self { store }
    }

    /// Process-local store, useful for tests and ephemeral sessions.
    pub fn memory() -> Self {
        Self::new(MemoryStore::new())
    }

    /// Reads the layout stored for `list_id`.
    ///
    /// Returns `None` when nothing is stored. Store failures are logged and
    /// treated as "nothing stored".
    pub async fn load(&self, list_id: &str) -> Option<LayoutRecord> {
        match self.store.load(list_id).await {
            Ok(record) => record,
            Err(e) => {
                warn!("failed to read layout {:?}: {}", list_id, e);
                None
            }
        }
    }

    /// Writes the full record for `list_id`.
    pub async fn save(&self, list_id: &str, record: &LayoutRecord) -> Result<(), StoreError> {
        debug!("writing layout {:?}", list_id);
        self.store.save(list_id, record).await
    }

    /// Removes the record for `list_id`.
    pub async fn clear(&self, list_id: &str) -> Result<(), StoreError> {
        if self.store.remove(list_id).await? {
            debug!("removed layout {:?}", list_id);
        }
        Ok(())
    }

    /// List ids that have a stored record.
    pub async fn list_ids(&self) -> Result<Vec<String>, StoreError> {
        self.store.list_ids().await
    }
}
