//! In-memory layout store.

use async_trait::async_trait;
use dashmap::DashMap;

use super::{LayoutRecord, LayoutStore};
use crate::error::StoreError;

/// Layouts that live as long as the process.
///
/// Shared by cloning the surrounding `Arc`; every table holding the same
/// instance sees the same records (last writer wins).
#[derive(Debug, Default)]
pub struct MemoryStore {
    layouts: DashMap<String, LayoutRecord>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.layouts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layouts.is_empty()
    }
}

#[async_trait]
impl LayoutStore for MemoryStore {
    async fn load(&self, list_id: &str) -> Result<Option<LayoutRecord>, StoreError> {
        Ok(self.layouts.get(list_id).map(|record| record.clone()))
    }

    async fn save(&self, list_id: &str, record: &LayoutRecord) -> Result<(), StoreError> {
        self.layouts.insert(list_id.to_string(), record.clone());
        Ok(())
    }

    async fn remove(&self, list_id: &str) -> Result<bool, StoreError> {
        Ok(self.layouts.remove(list_id).is_some())
    }

    async fn list_ids(&self) -> Result<Vec<String>, StoreError> {
        let mut ids: Vec<String> = self.layouts.iter().map(|entry| entry.key().clone()).collect();
        ids.sort();
        Ok(ids)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::SortSpec;

    #[tokio::test]
    async fn test_save_load_remove() {
        let store = MemoryStore::new();
        let record = LayoutRecord {
            sort: Some(Some(SortSpec::asc("name"))),
            ..Default::default()
        };
        store.save("users", &record).await.unwrap();
        store.save("instances", &LayoutRecord::default()).await.unwrap();

        assert_eq!(store.load("users").await.unwrap(), Some(record));
        assert_eq!(store.list_ids().await.unwrap(), vec!["instances", "users"]);

        assert!(store.remove("users").await.unwrap());
        assert!(!store.remove("users").await.unwrap());
        assert_eq!(store.load("users").await.unwrap(), None);
        assert_eq!(store.len(), 1);
    }
}
