//! The windowed list: scroll state, visible range, page scheduling.

use std::ops::Range;
use std::sync::Arc;

use futures::FutureExt;
use futures::StreamExt;
use futures::future::BoxFuture;
use futures::stream::FuturesUnordered;
use log::{debug, trace, warn};
use thiserror::Error;

use crate::error::SourceError;

use super::cache::{InFlight, RowWindow};
use super::source::{Meta, RangeRequest, RangeResponse, RangeSource, VecSource};
use super::viewport::{RowStyle, WindowConfig, pages_for};

/// Live row counts reported by the data source.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Counts {
    /// Rows in the whole collection.
    pub total: usize,
    /// Rows matching the current query; this is what the list scrolls over.
    pub filtered: usize,
}

/// One row handed to the render callback.
#[derive(Debug)]
pub struct RowSlot<'a, R> {
    pub index: usize,
    /// `None` until the row's page has resolved.
    pub item: Option<&'a R>,
    pub style: RowStyle,
    pub is_loaded: bool,
}

/// A page request the data source rejected.
#[derive(Debug, Clone, Error)]
#[error("page {page} (offset {}, limit {}) failed: {error}", .request.offset, .request.limit)]
pub struct PageFailure {
    pub page: usize,
    pub request: RangeRequest,
    pub error: SourceError,
}

/// What happened when a page load settled successfully.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageEvent {
    /// Rows were merged into the cache.
    Loaded { page: usize, rows: usize },
    /// The response belonged to an older query and was dropped.
    Stale { page: usize },
}

type CountsCallback = Box<dyn FnMut(Counts) + Send>;
type RangeCallback = Box<dyn FnMut(Range<usize>) + Send>;

struct PageOutcome<R> {
    generation: u64,
    page: usize,
    request: RangeRequest,
    result: Result<RangeResponse<R>, SourceError>,
}

/// Renders only the rows intersecting the viewport while paging them in
/// from a [`RangeSource`].
///
/// Page loads are boxed futures owned by the list. The owner drives them
/// with [`next_completion`](Self::next_completion) (typically from its event
/// loop) or [`settle`](Self::settle); nothing runs in the background.
///
/// Every request is tagged with the query generation current when it was
/// issued. Changing the query key bumps the generation, so late responses
/// for an old query are discarded instead of leaking into the new cache.
///
/// # Example
///
/// ```ignore
/// let source = Arc::new(VecSource::new(rows));
/// let mut list = WindowedList::new(source, "all", WindowConfig::default());
/// list.settle().await;
/// list.scroll_to(8000);
/// list.settle().await;
/// let rendered = list.render(|slot| (slot.index, slot.item.cloned()));
/// ```
pub struct WindowedList<R> {
    source: Arc<dyn RangeSource<Row = R>>,
    config: WindowConfig,
    query_key: String,
    reload_token: u64,
    generation: u64,
    scroll_top: u64,
    counts: Counts,
    meta: Option<Meta>,
    rows: RowWindow<R>,
    in_flight: InFlight,
    pending: FuturesUnordered<BoxFuture<'static, PageOutcome<R>>>,
    visible: Range<usize>,
    on_counts_changed: Option<CountsCallback>,
    on_range_changed: Option<RangeCallback>,
    dirty: bool,
}

impl<R> std::fmt::Debug for WindowedList<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WindowedList")
            .field("query_key", &self.query_key)
            .field("generation", &self.generation)
            .field("scroll_top", &self.scroll_top)
            .field("counts", &self.counts)
            .field("visible", &self.visible)
            .field("cached_rows", &self.rows.len())
            .field("in_flight", &self.in_flight.pages())
            .finish()
    }
}

impl<R> WindowedList<R>
where
    R: Clone + Send + Sync + 'static,
{
    /// Mounts a list over `source`. Requests page 0 immediately.
    pub fn new(
        source: Arc<dyn RangeSource<Row = R>>,
        query_key: impl Into<String>,
        config: WindowConfig,
    ) -> Self {
        let mut list = Self::with_source(source, query_key.into(), config);
        list.request_page(0, true);
        list
    }

    /// A list with no rows and nothing requested. Loading starts with the
    /// first [`set_source`](Self::set_source).
    pub fn unbound(config: WindowConfig) -> Self {
        Self::with_source(Arc::new(VecSource::new(Vec::new())), String::new(), config)
    }

    fn with_source(
        source: Arc<dyn RangeSource<Row = R>>,
        query_key: String,
        config: WindowConfig,
    ) -> Self {
        Self {
            source,
            config,
            query_key,
            reload_token: 0,
            generation: 0,
            scroll_top: 0,
            counts: Counts::default(),
            meta: None,
            rows: RowWindow::new(),
            in_flight: InFlight::new(),
            pending: FuturesUnordered::new(),
            visible: 0..0,
            on_counts_changed: None,
            on_range_changed: None,
            dirty: true,
        }
    }

    /// Registers a callback fired whenever total/filtered counts change.
    pub fn on_counts_changed(&mut self, callback: impl FnMut(Counts) + Send + 'static) {
        self.on_counts_changed = Some(Box::new(callback));
    }

    /// Registers a callback fired whenever the visible index window changes.
    pub fn on_range_changed(&mut self, callback: impl FnMut(Range<usize>) + Send + 'static) {
        self.on_range_changed = Some(Box::new(callback));
    }

    // -------------------------------------------------------------------------
    // Accessors
    // -------------------------------------------------------------------------

    pub fn config(&self) -> &WindowConfig {
        &self.config
    }

    pub fn query_key(&self) -> &str {
        &self.query_key
    }

    pub fn reload_token(&self) -> u64 {
        self.reload_token
    }

    /// Current query generation (bumped on every hard reset).
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn scroll_top(&self) -> u64 {
        self.scroll_top
    }

    /// Latest counts adopted from the data source.
    pub fn counts(&self) -> Counts {
        self.counts
    }

    /// Metadata from the most recent response that carried any.
    pub fn meta(&self) -> Option<&Meta> {
        self.meta.as_ref()
    }

    /// Number of rows the list scrolls over.
    pub fn row_count(&self) -> usize {
        self.counts.filtered
    }

    /// Half-open range of indices currently rendered.
    pub fn visible_range(&self) -> Range<usize> {
        self.visible.clone()
    }

    /// Total scrollable height, header included.
    pub fn content_height(&self) -> u64 {
        self.config.content_height(self.row_count())
    }

    /// Returns the cached row at `index`.
    pub fn row(&self, index: usize) -> Option<&R> {
        self.rows.get(index)
    }

    /// Returns `true` if the row at `index` has been received.
    pub fn is_loaded(&self, index: usize) -> bool {
        self.rows.contains(index)
    }

    /// Number of rows held in the cache.
    pub fn cached_rows(&self) -> usize {
        self.rows.len()
    }

    /// Pages with a request outstanding for the current generation.
    pub fn in_flight_pages(&self) -> Vec<usize> {
        self.in_flight.pages()
    }

    /// Number of load futures not yet settled, stale ones included.
    pub fn pending_loads(&self) -> usize {
        self.pending.len()
    }

    /// Returns `true` if something changed since the last [`clear_dirty`](Self::clear_dirty).
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn clear_dirty(&mut self) {
        self.dirty = false;
    }

    // -------------------------------------------------------------------------
    // Inputs
    // -------------------------------------------------------------------------

    /// Changes the query identity. A different key hard-resets the list.
    pub fn set_query_key(&mut self, query_key: impl Into<String>) {
        let query_key = query_key.into();
        if query_key != self.query_key {
            self.query_key = query_key;
            self.hard_reset();
        }
    }

    /// Swaps the data source and hard-resets under `query_key`.
    pub fn set_source(
        &mut self,
        source: Arc<dyn RangeSource<Row = R>>,
        query_key: impl Into<String>,
    ) {
        self.source = source;
        self.query_key = query_key.into();
        self.hard_reset();
    }

    /// Changes the reload token. A different token soft-refreshes the list.
    pub fn set_reload_token(&mut self, token: u64) {
        if token != self.reload_token {
            self.reload_token = token;
            self.soft_reload();
        }
    }

    /// Updates the viewport height.
    pub fn set_height(&mut self, height: u32) {
        if height != self.config.height {
            self.config.height = height;
            self.clamp_scroll();
            self.update_visible();
            self.schedule_visible();
        }
    }

    /// Scrolls to an absolute offset (clamped to the content).
    pub fn scroll_to(&mut self, scroll_top: u64) {
        self.scroll_top = scroll_top.min(self.config.max_scroll_top(self.row_count()));
        self.update_visible();
        self.schedule_visible();
    }

    /// Scrolls by a relative amount.
    pub fn scroll_by(&mut self, delta: i64) {
        let target = if delta < 0 {
            self.scroll_top.saturating_sub(delta.unsigned_abs())
        } else {
            self.scroll_top.saturating_add(delta as u64)
        };
        self.scroll_to(target);
    }

    /// Scrolls by one body height.
    pub fn page_down(&mut self) {
        self.scroll_by(self.config.body_height() as i64);
    }

    pub fn page_up(&mut self) {
        self.scroll_by(-(self.config.body_height() as i64));
    }

    // -------------------------------------------------------------------------
    // Resets
    // -------------------------------------------------------------------------

    /// Clears the cache and in-flight registry, zeroes counts, scrolls to the
    /// top and requests page 0.
    pub fn hard_reset(&mut self) {
        self.generation += 1;
        debug!(
            "windowed list reset: key={:?} generation={}",
            self.query_key, self.generation
        );
        self.rows.clear();
        self.in_flight.clear();
        self.meta = None;
        self.scroll_top = 0;
        self.set_counts(Counts::default());
        self.update_visible();
        self.dirty = true;
        self.request_page(0, true);
    }

    /// Re-requests page 0 (for fresh counts) and every visible page, keeping
    /// the cache and the scroll position.
    pub fn soft_reload(&mut self) {
        debug!(
            "windowed list soft reload: key={:?} token={}",
            self.query_key, self.reload_token
        );
        self.request_page(0, true);
        for page in pages_for(&self.visible, self.config.page_size) {
            self.request_page(page, true);
        }
    }

    // -------------------------------------------------------------------------
    // Completion
    // -------------------------------------------------------------------------

    /// Waits for the next page load to settle and merges it.
    ///
    /// Returns `None` immediately when nothing is pending. A data-source
    /// rejection comes back as `Err`; the page stays unloaded and is not
    /// retried until something requests it again.
    pub async fn next_completion(&mut self) -> Option<Result<PageEvent, PageFailure>> {
        let outcome = self.pending.next().await?;
        Some(self.apply(outcome))
    }

    /// Drives every pending load (and any follow-up it schedules) to
    /// completion, returning the failures.
    pub async fn settle(&mut self) -> Vec<PageFailure> {
        let mut failures = Vec::new();
        while let Some(result) = self.next_completion().await {
            if let Err(failure) = result {
                failures.push(failure);
            }
        }
        failures
    }

    fn apply(&mut self, outcome: PageOutcome<R>) -> Result<PageEvent, PageFailure> {
        let PageOutcome {
            generation,
            page,
            request,
            result,
        } = outcome;

        if generation != self.generation {
            debug!(
                "discarding page {} from generation {} (current {})",
                page, generation, self.generation
            );
            return Ok(PageEvent::Stale { page });
        }

        self.in_flight.finish(page);

        match result {
            Ok(response) => {
                let rows = response.items.len();
                debug!(
                    "page {} resolved: offset={} rows={} total={} filtered={}",
                    page, response.offset, rows, response.total_count, response.filtered_count
                );
                self.set_counts(Counts {
                    total: response.total_count,
                    filtered: response.filtered_count,
                });
                if response.meta.is_some() {
                    self.meta = response.meta;
                }
                self.rows.insert_page(response.offset, response.items);
                self.dirty = true;

                self.clamp_scroll();
                if self.update_visible() {
                    self.schedule_visible();
                }
                Ok(PageEvent::Loaded { page, rows })
            }
            Err(error) => {
                warn!("page {} failed: {}", page, error);
                Err(PageFailure {
                    page,
                    request,
                    error,
                })
            }
        }
    }

    // -------------------------------------------------------------------------
    // Rendering
    // -------------------------------------------------------------------------

    /// Calls `render` once per visible index, in order.
    pub fn render<O>(&self, mut render: impl FnMut(RowSlot<'_, R>) -> O) -> Vec<O> {
        self.visible
            .clone()
            .map(|index| {
                let item = self.rows.get(index);
                render(RowSlot {
                    index,
                    item,
                    style: self.config.row_style(index),
                    is_loaded: item.is_some(),
                })
            })
            .collect()
    }

    // -------------------------------------------------------------------------
    // Internals
    // -------------------------------------------------------------------------

    fn set_counts(&mut self, counts: Counts) {
        if counts != self.counts {
            self.counts = counts;
            if let Some(callback) = self.on_counts_changed.as_mut() {
                callback(counts);
            }
        }
    }

    fn clamp_scroll(&mut self) {
        let max = self.config.max_scroll_top(self.row_count());
        if self.scroll_top > max {
            self.scroll_top = max;
        }
    }

    /// Recomputes the visible window. Returns `true` if it changed.
    fn update_visible(&mut self) -> bool {
        let visible = self
            .config
            .visible_range(self.scroll_top, self.row_count());
        if visible == self.visible {
            return false;
        }
        trace!("visible range {:?} -> {:?}", self.visible, visible);
        self.visible = visible.clone();
        self.dirty = true;
        if let Some(callback) = self.on_range_changed.as_mut() {
            callback(visible);
        }
        true
    }

    /// Requests every visible page that is neither cached nor in flight.
    fn schedule_visible(&mut self) {
        for page in pages_for(&self.visible, self.config.page_size) {
            self.request_page(page, false);
        }
    }

    /// Row indices of `page` that exist at the current row count.
    fn page_rows(&self, page: usize) -> Range<usize> {
        let request = RangeRequest::for_page(page, self.config.page_size);
        let end = request.end().min(self.row_count());
        request.offset..end.max(request.offset)
    }

    /// Issues a load for `page` unless one is already in flight. Without
    /// `refresh`, pages whose rows are all cached are skipped as well.
    fn request_page(&mut self, page: usize, refresh: bool) -> bool {
        if !refresh && self.rows.covers(self.page_rows(page)) {
            return false;
        }
        if !self.in_flight.try_begin(page) {
            return false;
        }

        let request = RangeRequest::for_page(page, self.config.page_size);
        let generation = self.generation;
        let source = Arc::clone(&self.source);
        debug!(
            "requesting page {} (offset {}, limit {}) generation {}",
            page, request.offset, request.limit, generation
        );

        self.pending.push(
            async move {
                let result = source.load_range(request).await;
                PageOutcome {
                    generation,
                    page,
                    request,
                    result,
                }
            }
            .boxed(),
        );
        true
    }
}
