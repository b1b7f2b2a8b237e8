//! Range data source contract and the in-memory implementation.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use serde::Serialize;

use crate::error::SourceError;

/// Default number of rows per request.
pub const DEFAULT_LIMIT: usize = 200;

/// Largest number of rows a single request may ask for.
pub const MAX_LIMIT: usize = 500;

/// Free-form metadata attached to a range response.
pub type Meta = serde_json::Map<String, serde_json::Value>;

/// Clamps a requested row count into `1..=MAX_LIMIT`.
pub fn clamp_limit(limit: usize) -> usize {
    limit.clamp(1, MAX_LIMIT)
}

/// A request for `limit` rows starting at absolute row `offset`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RangeRequest {
    pub offset: usize,
    pub limit: usize,
}

impl RangeRequest {
    /// Creates a request, clamping `limit` into `1..=MAX_LIMIT`.
    pub fn new(offset: usize, limit: usize) -> Self {
        Self {
            offset,
            limit: clamp_limit(limit),
        }
    }

    /// Creates the request covering page `page` of `page_size` rows.
    pub fn for_page(page: usize, page_size: usize) -> Self {
        let limit = clamp_limit(page_size);
        Self {
            offset: page * limit,
            limit,
        }
    }

    /// One past the last row index covered by this request.
    pub fn end(&self) -> usize {
        self.offset + self.limit
    }
}

impl Default for RangeRequest {
    fn default() -> Self {
        Self::new(0, DEFAULT_LIMIT)
    }
}

/// Rows and counts returned for a [`RangeRequest`].
///
/// Field names follow the backend search routes, so a response body can be
/// decoded directly with `serde_json`. `rows` is accepted for `items`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RangeResponse<R> {
    #[serde(default)]
    pub offset: usize,
    #[serde(alias = "rows", default = "Vec::new")]
    pub items: Vec<R>,
    #[serde(default)]
    pub total_count: usize,
    #[serde(default)]
    pub filtered_count: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<Meta>,
}

impl<R> RangeResponse<R> {
    /// Creates a response carrying `items` starting at `offset`, with zero counts.
    pub fn new(offset: usize, items: Vec<R>) -> Self {
        Self {
            offset,
            items,
            total_count: 0,
            filtered_count: 0,
            meta: None,
        }
    }

    /// Sets the total and filtered counts.
    pub fn with_counts(mut self, total_count: usize, filtered_count: usize) -> Self {
        self.total_count = total_count;
        self.filtered_count = filtered_count;
        self
    }

    /// Attaches response metadata.
    pub fn with_meta(mut self, meta: Meta) -> Self {
        self.meta = Some(meta);
        self
    }
}

/// Turns `(offset, limit)` requests into rows plus live counts.
///
/// Implementations must accept arbitrary offsets (not just sequential
/// paging) and must be safe to call repeatedly for the same offset.
/// Counts are returned with every response and are treated as the current
/// truth by the renderer.
#[async_trait]
pub trait RangeSource: Send + Sync {
    /// The row type produced by this source.
    type Row: Clone + Send + Sync + 'static;

    /// Loads the rows covered by `request`.
    async fn load_range(
        &self,
        request: RangeRequest,
    ) -> Result<RangeResponse<Self::Row>, SourceError>;
}

/// A static collection served as an in-memory range source.
#[derive(Debug)]
pub struct VecSource<R> {
    rows: Arc<Vec<R>>,
    meta: Option<Meta>,
}

impl<R> VecSource<R> {
    /// Creates a source over the given rows.
    pub fn new(rows: Vec<R>) -> Self {
        Self::from_arc(Arc::new(rows))
    }

    /// Creates a source over shared rows without copying them.
    pub fn from_arc(rows: Arc<Vec<R>>) -> Self {
        Self { rows, meta: None }
    }

    /// Attaches metadata returned with every page.
    pub fn with_meta(mut self, meta: Meta) -> Self {
        self.meta = Some(meta);
        self
    }

    /// Returns all rows in source order.
    pub fn rows(&self) -> &[R] {
        &self.rows
    }

    /// Returns the number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Returns `true` if the collection is empty.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

#[async_trait]
impl<R> RangeSource for VecSource<R>
where
    R: Clone + Send + Sync + 'static,
{
    type Row = R;

    async fn load_range(&self, request: RangeRequest) -> Result<RangeResponse<R>, SourceError> {
        let len = self.rows.len();
        let start = request.offset.min(len);
        let end = request.end().min(len);

        let mut response =
            RangeResponse::new(request.offset, self.rows[start..end].to_vec()).with_counts(len, len);
        if let Some(meta) = &self.meta {
            response = response.with_meta(meta.clone());
        }
        Ok(response)
    }
}
