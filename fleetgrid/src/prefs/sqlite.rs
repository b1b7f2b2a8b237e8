//! SQLite layout store.

use std::path::Path;

use async_sqlite::Client;
use async_sqlite::rusqlite::{self, OptionalExtension, types::ValueRef};
use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use log::{debug, trace};

use super::{LayoutRecord, LayoutStore, RECORD_VERSION};
use crate::error::StoreError;

/// Layouts persisted in a `table_layouts` SQLite table.
///
/// Each row keeps the record's JSON document next to the version that wrote
/// it. Decoded records are cached, so repeated mounts of the same list only
/// hit the database once.
pub struct SqliteStore {
    client: Client,
    cache: DashMap<String, LayoutRecord>,
}

/// One stored row as read from the database.
struct StoredRow {
    version: Option<i64>,
    document: Vec<u8>,
    saved_at: Option<String>,
}

impl SqliteStore {
    /// Opens (or creates) the layout database at `path`.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref();
        debug!("opening layout store at {}", path.display());
        let client = async_sqlite::ClientBuilder::new()
            .path(path)
            .open()
            .await?;

        client
            .conn(|conn| {
                conn.execute(
                    "CREATE TABLE IF NOT EXISTS table_layouts (
                        list_id TEXT PRIMARY KEY,
                        version INTEGER NOT NULL,
                        document BLOB NOT NULL,
                        saved_at TEXT NOT NULL
                    )",
                    [],
                )
            })
            .await?;

        Ok(Self {
            client,
            cache: DashMap::new(),
        })
    }

    async fn fetch(&self, list_id: &str) -> Result<Option<StoredRow>, StoreError> {
        let list_id = list_id.to_string();
        let row = self
            .client
            .conn(move |conn| {
                conn.query_row(
                    "SELECT version, document, saved_at FROM table_layouts WHERE list_id = ?1",
                    [&list_id],
                    |row| {
                        let document = match row.get_ref(1)? {
                            ValueRef::Blob(bytes) | ValueRef::Text(bytes) => bytes.to_vec(),
                            _ => Vec::new(),
                        };
                        Ok(StoredRow {
                            version: row.get_ref(0)?.as_i64().ok(),
                            document,
                            saved_at: row.get_ref(2)?.as_str().ok().map(str::to_string),
                        })
                    },
                )
                .optional()
            })
            .await?;
        Ok(row)
    }
}

/// Decodes a stored document. Records from other versions are read field by
/// field like any other; unknown fields are ignored.
fn decode(list_id: &str, row: &StoredRow) -> LayoutRecord {
    match row.version {
        Some(version) if version == RECORD_VERSION as i64 => {}
        Some(version) if version > RECORD_VERSION as i64 => debug!(
            "layout {:?} written by newer version {}; reading known fields",
            list_id, version
        ),
        version => debug!(
            "layout {:?} has version {:?}; reading known fields",
            list_id, version
        ),
    }
    LayoutRecord::from_slice(&row.document)
}

#[async_trait]
impl LayoutStore for SqliteStore {
    async fn load(&self, list_id: &str) -> Result<Option<LayoutRecord>, StoreError> {
        if let Some(record) = self.cache.get(list_id) {
            return Ok(Some(record.clone()));
        }

        let Some(row) = self.fetch(list_id).await? else {
            return Ok(None);
        };
        trace!(
            "layout {:?} read from disk (saved {})",
            list_id,
            row.saved_at.as_deref().unwrap_or("at an unknown time")
        );
        let record = decode(list_id, &row);
        self.cache.insert(list_id.to_string(), record.clone());
        Ok(Some(record))
    }

    async fn save(&self, list_id: &str, record: &LayoutRecord) -> Result<(), StoreError> {
        let id = list_id.to_string();
        let document = record.to_vec()?;
        let saved_at = Utc::now().to_rfc3339();

        self.client
            .conn(move |conn| {
                conn.execute(
                    "INSERT INTO table_layouts (list_id, version, document, saved_at)
                     VALUES (?1, ?2, ?3, ?4)
                     ON CONFLICT(list_id) DO UPDATE SET
                        version = excluded.version,
                        document = excluded.document,
                        saved_at = excluded.saved_at",
                    rusqlite::params![&id, RECORD_VERSION as i64, &document, &saved_at],
                )
            })
            .await?;

        self.cache.insert(list_id.to_string(), record.clone());
        Ok(())
    }

    async fn remove(&self, list_id: &str) -> Result<bool, StoreError> {
        let id = list_id.to_string();
        let removed = self
            .client
            .conn(move |conn| conn.execute("DELETE FROM table_layouts WHERE list_id = ?1", [&id]))
            .await?;

        self.cache.remove(list_id);
        Ok(removed > 0)
    }

    async fn list_ids(&self) -> Result<Vec<String>, StoreError> {
        self.client
            .conn(|conn| {
                let mut stmt = conn.prepare("SELECT list_id FROM table_layouts ORDER BY list_id")?;
                let ids = stmt.query_map([], |row| row.get(0))?;
                ids.collect::<Result<Vec<String>, _>>()
            })
            .await
            .map_err(StoreError::from)
    }
}
