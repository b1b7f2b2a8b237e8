//! Shared fixtures for integration tests.

#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use fleetgrid::SourceError;
use fleetgrid::table::{ColumnDef, GridRow, SortValue};
use fleetgrid::window::{RangeRequest, RangeResponse, RangeSource};

/// A fleet instance row.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    pub id: usize,
    pub name: String,
    pub status: Option<String>,
    pub cost: f64,
}

impl Row {
    pub fn new(id: usize, name: &str, status: Option<&str>, cost: f64) -> Self {
        Self {
            id,
            name: name.to_string(),
            status: status.map(str::to_string),
            cost,
        }
    }

    pub fn numbered(label: &str, id: usize) -> Self {
        Self::new(id, &format!("{}-{}", label, id), Some("running"), id as f64)
    }
}

impl GridRow for Row {
    fn cell(&self, column_id: &str) -> String {
        match column_id {
            "id" => self.id.to_string(),
            "name" => self.name.clone(),
            "status" => self.status.clone().unwrap_or_default(),
            "cost" => format!("{:.2}", self.cost),
            _ => String::new(),
        }
    }

    fn sort_value(&self, column_id: &str) -> SortValue {
        match column_id {
            "id" => self.id.into(),
            "status" => self.status.clone().into(),
            "cost" => self.cost.into(),
            _ => self.cell(column_id).into(),
        }
    }
}

pub fn columns() -> Vec<ColumnDef<Row>> {
    vec![
        ColumnDef::new("name", "Name").sortable().width(200),
        ColumnDef::new("status", "Status").sortable().width(100),
        ColumnDef::new("region", "Region").hidden_by_default(),
        ColumnDef::new("cost", "Cost")
            .sortable()
            .width(100)
            .min_width(80)
            .max_width(240),
        ColumnDef::new("id", "ID").fixed().width(80),
    ]
}

struct Inner {
    label: &'static str,
    rows: AtomicUsize,
    delay: Duration,
    requests: Mutex<Vec<RangeRequest>>,
    fail_once: Mutex<HashSet<usize>>,
}

/// In-process range source that records every request.
#[derive(Clone)]
pub struct RecordingSource {
    inner: Arc<Inner>,
}

impl RecordingSource {
    pub fn new(label: &'static str, rows: usize) -> Self {
        Self::with_delay(label, rows, Duration::ZERO)
    }

    pub fn with_delay(label: &'static str, rows: usize, delay: Duration) -> Self {
        Self {
            inner: Arc::new(Inner {
                label,
                rows: AtomicUsize::new(rows),
                delay,
                requests: Mutex::new(Vec::new()),
                fail_once: Mutex::new(HashSet::new()),
            }),
        }
    }

    /// Rejects the next request at `offset`.
    pub fn fail_once_at(&self, offset: usize) {
        self.inner.fail_once.lock().unwrap().insert(offset);
    }

    pub fn set_rows(&self, rows: usize) {
        self.inner.rows.store(rows, Ordering::SeqCst);
    }

    /// Offsets requested so far, in issue order.
    pub fn offsets(&self) -> Vec<usize> {
        self.inner
            .requests
            .lock()
            .unwrap()
            .iter()
            .map(|r| r.offset)
            .collect()
    }

    pub fn request_count(&self) -> usize {
        self.inner.requests.lock().unwrap().len()
    }

    pub fn clear_requests(&self) {
        self.inner.requests.lock().unwrap().clear();
    }
}

#[async_trait]
impl RangeSource for RecordingSource {
    type Row = Row;

    async fn load_range(&self, request: RangeRequest) -> Result<RangeResponse<Row>, SourceError> {
        self.inner.requests.lock().unwrap().push(request);
        if !self.inner.delay.is_zero() {
            tokio::time::sleep(self.inner.delay).await;
        }
        if self.inner.fail_once.lock().unwrap().remove(&request.offset) {
            return Err(SourceError::failed(format!("offset {}", request.offset)));
        }

        let len = self.inner.rows.load(Ordering::SeqCst);
        let end = request.end().min(len);
        let items = (request.offset.min(end)..end)
            .map(|i| Row::numbered(self.inner.label, i))
            .collect();
        Ok(RangeResponse::new(request.offset, items).with_counts(len, len))
    }
}
