//! Layout store trait.

use async_trait::async_trait;

use super::LayoutRecord;
use crate::error::StoreError;

/// Durable home for one [`LayoutRecord`] per list id.
///
/// Stores own their encoding. Reading never fails on bad data: a record
/// that cannot be decoded comes back with the unreadable fields dropped, and
/// only I/O problems surface as [`StoreError`].
#[async_trait]
pub trait LayoutStore: Send + Sync {
    /// The record stored for `list_id`, if any.
    async fn load(&self, list_id: &str) -> Result<Option<LayoutRecord>, StoreError>;

    /// Replaces the record for `list_id` with `record`.
    async fn save(&self, list_id: &str, record: &LayoutRecord) -> Result<(), StoreError>;

    /// Deletes the record for `list_id`. Returns `true` if one existed.
    async fn remove(&self, list_id: &str) -> Result<bool, StoreError>;

    /// List ids with a stored record, ascending.
    async fn list_ids(&self) -> Result<Vec<String>, StoreError>;
}
