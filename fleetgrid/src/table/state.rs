//! Configurable table state.

use std::collections::BTreeMap;
use std::ops::Range;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use log::{debug, info, trace, warn};
use tokio::time::Instant;

use crate::debounce::Debouncer;
use crate::error::StoreError;
use crate::prefs::{LayoutRecord, Preferences};
use crate::window::{
    Counts, Meta, PageEvent, PageFailure, RangeSource, RowStyle, VecSource, WindowedList,
};

use super::column::{ColumnDef, GridRow, ROW_NUMBER_COLUMN, WidthBounds, column_signature};
use super::config::TableConfig;
use super::gesture::{DropSide, DropTarget, Gesture, GestureState, drop_side, resize_width};
use super::layout::ColumnLayout;
use super::sort::{SortDirection, SortMode, SortSpec, sorted};

/// Where a table's rows come from.
pub enum RowSource<R> {
    /// A paged data source. `query_key` identifies the query; changing it
    /// later hard-resets the list.
    Remote {
        source: Arc<dyn RangeSource<Row = R>>,
        query_key: String,
    },
    /// A collection held in memory.
    Static(Arc<Vec<R>>),
}

impl<R: GridRow> RowSource<R> {
    pub fn remote(source: impl RangeSource<Row = R> + 'static, query_key: impl Into<String>) -> Self {
        RowSource::Remote {
            source: Arc::new(source),
            query_key: query_key.into(),
        }
    }

    pub fn rows(rows: Vec<R>) -> Self {
        RowSource::Static(Arc::new(rows))
    }
}

enum Binding<R> {
    Remote {
        source: Arc<dyn RangeSource<Row = R>>,
        query_key: String,
    },
    Static {
        rows: Arc<Vec<R>>,
        instance: u64,
    },
}

impl<R> Binding<R> {
    fn from_source(source: RowSource<R>) -> Self {
        match source {
            RowSource::Remote { source, query_key } => Binding::Remote { source, query_key },
            RowSource::Static(rows) => Binding::Static {
                rows,
                instance: next_binding(),
            },
        }
    }
}

/// Every static collection bound to a table gets its own instance number,
/// which is part of the query key.
fn next_binding() -> u64 {
    static COUNTER: AtomicU64 = AtomicU64::new(1);
    COUNTER.fetch_add(1, Ordering::SeqCst)
}

type SortCallback = Box<dyn FnMut(Option<SortSpec>) + Send>;

enum SortControl {
    Uncontrolled,
    Controlled { on_change: SortCallback },
}

/// A column as currently laid out in the header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VisibleColumn {
    pub id: String,
    pub label: String,
    /// Offset from the left edge of the content (before horizontal scroll).
    pub left: u32,
    pub width: u32,
    pub sortable: bool,
    pub resizable: bool,
    /// Direction if this column is the active sort.
    pub sort: Option<SortDirection>,
    pub is_row_number: bool,
    /// Drop hint while another column is dragged over this one.
    pub drop_hint: Option<DropSide>,
}

impl VisibleColumn {
    /// One past the right edge.
    pub fn right(&self) -> u32 {
        self.left + self.width
    }
}

/// Part of a header cell under the pointer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderZone {
    Cell,
    ResizeHandle,
}

/// Result of [`Table::header_hit`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderHit {
    pub column_id: String,
    pub zone: HeaderZone,
    pub left: u32,
    pub width: u32,
}

/// One row handed to [`Table::render_rows`].
#[derive(Debug)]
pub struct TableRowSlot<'a, R> {
    pub index: usize,
    /// `None` until the row's page has resolved.
    pub item: Option<&'a R>,
    pub style: RowStyle,
    pub is_loaded: bool,
    pub columns: &'a [VisibleColumn],
}

impl<R: GridRow> TableRowSlot<'_, R> {
    /// Text for `column_id`, or `None` while the row is loading. The
    /// row-number column is always available.
    pub fn cell(&self, column_id: &str) -> Option<String> {
        cell_text(self.index, self.item, column_id)
    }

    /// Cells in column order.
    pub fn cells(&self) -> impl Iterator<Item = (&VisibleColumn, Option<String>)> {
        self.columns
            .iter()
            .map(|column| (column, self.cell(&column.id)))
    }
}

fn cell_text<R: GridRow>(index: usize, item: Option<&R>, column_id: &str) -> Option<String> {
    if column_id == ROW_NUMBER_COLUMN {
        return Some((index + 1).to_string());
    }
    item.map(|row| row.cell(column_id))
}

/// Builds and mounts a [`Table`].
///
/// # Example
///
/// ```ignore
/// let table = TableBuilder::new(columns, RowSource::remote(source, "all"))
///     .config(TableConfig::default().with_list_id("instances"))
///     .preferences(prefs)
///     .mount()
///     .await;
/// ```
pub struct TableBuilder<R: GridRow> {
    columns: Vec<ColumnDef<R>>,
    source: RowSource<R>,
    config: TableConfig,
    preferences: Option<Preferences>,
    control: SortControl,
    sort: Option<SortSpec>,
}

impl<R: GridRow> TableBuilder<R> {
    pub fn new(columns: Vec<ColumnDef<R>>, source: RowSource<R>) -> Self {
        Self {
            columns,
            source,
            config: TableConfig::default(),
            preferences: None,
            control: SortControl::Uncontrolled,
            sort: None,
        }
    }

    pub fn config(mut self, config: TableConfig) -> Self {
        self.config = config;
        self
    }

    /// Persist the layout in `preferences` under the configured list id.
    pub fn preferences(mut self, preferences: Preferences) -> Self {
        self.preferences = Some(preferences);
        self
    }

    /// Default sort for an uncontrolled table, used when nothing is stored.
    pub fn initial_sort(mut self, sort: SortSpec) -> Self {
        self.sort = Some(sort);
        self
    }

    /// Hand sort ownership to the caller.
    ///
    /// The table never changes its sort on its own: clicks are announced
    /// through `on_change` and the caller answers with
    /// [`Table::set_controlled_sort`].
    pub fn controlled_sort(
        mut self,
        current: Option<SortSpec>,
        on_change: impl FnMut(Option<SortSpec>) + Send + 'static,
    ) -> Self {
        self.sort = current;
        self.control = SortControl::Controlled {
            on_change: Box::new(on_change),
        };
        self
    }

    /// Hydrates the stored layout and mounts the list. Page 0 is requested
    /// immediately.
    pub async fn mount(self) -> Table<R> {
        let Self {
            columns,
            source,
            config,
            preferences,
            control,
            sort,
        } = self;

        let binding = Binding::from_source(source);
        // Bound once layout and sort are hydrated, since the sort can change
        // the query.
        let list = WindowedList::unbound(config.window.clone());

        let mut table = Table {
            signature: column_signature(&columns),
            layout: ColumnLayout::defaults(&columns, config.row_numbers),
            persist: Debouncer::new(config.persist_debounce),
            columns,
            config,
            sort,
            control,
            hydration_offered: false,
            binding,
            list,
            gesture: GestureState::new(),
            scroll_x: 0,
            preferences,
            dirty: true,
        };
        table.hydrate(true).await;

        let (source, key) = table.resolve();
        table.list.set_source(source, key);
        info!(
            "table mounted: list={:?} columns={} sort={:?}",
            table.config.list_id,
            table.columns.len(),
            table.sort
        );
        table
    }
}

/// A windowed table with configurable columns, tri-state sort, header
/// gestures and persisted layout.
///
/// The table is owned by one event loop. Page loads are driven through
/// [`next_completion`](Self::next_completion) and layout writes through
/// [`tick`](Self::tick).
pub struct Table<R: GridRow> {
    columns: Vec<ColumnDef<R>>,
    signature: String,
    config: TableConfig,
    layout: ColumnLayout,
    sort: Option<SortSpec>,
    control: SortControl,
    hydration_offered: bool,
    binding: Binding<R>,
    list: WindowedList<R>,
    gesture: GestureState,
    scroll_x: u32,
    persist: Debouncer,
    preferences: Option<Preferences>,
    dirty: bool,
}

impl<R: GridRow> std::fmt::Debug for Table<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Table")
            .field("list_id", &self.config.list_id)
            .field("layout", &self.layout)
            .field("sort", &self.sort)
            .field("gesture", self.gesture.current())
            .field("list", &self.list)
            .finish()
    }
}

impl<R: GridRow> Table<R> {
    // -------------------------------------------------------------------------
    // Accessors
    // -------------------------------------------------------------------------

    pub fn columns(&self) -> &[ColumnDef<R>] {
        &self.columns
    }

    pub fn config(&self) -> &TableConfig {
        &self.config
    }

    pub fn list_id(&self) -> Option<&str> {
        self.config.list_id.as_deref()
    }

    pub fn layout(&self) -> &ColumnLayout {
        &self.layout
    }

    /// The current sort (for a controlled table, the last value the caller
    /// passed in).
    pub fn sort(&self) -> Option<&SortSpec> {
        self.sort.as_ref()
    }

    pub fn gesture(&self) -> &Gesture {
        self.gesture.current()
    }

    /// The underlying windowed list.
    pub fn list(&self) -> &WindowedList<R> {
        &self.list
    }

    pub fn counts(&self) -> Counts {
        self.list.counts()
    }

    pub fn meta(&self) -> Option<&Meta> {
        self.list.meta()
    }

    pub fn row_count(&self) -> usize {
        self.list.row_count()
    }

    pub fn row(&self, index: usize) -> Option<&R> {
        self.list.row(index)
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty || self.list.is_dirty()
    }

    pub fn clear_dirty(&mut self) {
        self.dirty = false;
        self.list.clear_dirty();
    }

    /// The record that would be persisted right now.
    pub fn record(&self) -> LayoutRecord {
        self.layout.to_record(self.sort.clone())
    }

    fn column(&self, id: &str) -> Option<&ColumnDef<R>> {
        self.columns.iter().find(|c| c.id == id)
    }

    fn bounds_of(&self, id: &str) -> Option<WidthBounds> {
        self.column(id).map(|c| c.bounds(self.config.width_bounds()))
    }

    /// Effective width of a column.
    pub fn width_of(&self, id: &str) -> Option<u32> {
        if id == ROW_NUMBER_COLUMN && self.config.row_numbers {
            return Some(self.config.row_number_width);
        }
        let bounds = self.bounds_of(id)?;
        Some(self.layout.width(id).unwrap_or(bounds.default))
    }

    /// Effective widths of every column, hidden ones included.
    pub fn column_widths(&self) -> BTreeMap<String, u32> {
        self.layout
            .order()
            .iter()
            .filter(|id| *id != ROW_NUMBER_COLUMN)
            .filter_map(|id| Some((id.clone(), self.width_of(id)?)))
            .collect()
    }

    // -------------------------------------------------------------------------
    // Header geometry
    // -------------------------------------------------------------------------

    /// Visible columns in display order with their geometry and state.
    pub fn visible_columns(&self) -> Vec<VisibleColumn> {
        let drop = match self.gesture.current() {
            Gesture::Dragging {
                target: Some(target),
                ..
            } => Some(target),
            _ => None,
        };
        let sortable_mode = self.config.sort_mode != SortMode::None;

        let mut left = 0;
        let mut visible = Vec::new();
        for id in self.layout.visible_ids() {
            let column = if id == ROW_NUMBER_COLUMN {
                VisibleColumn {
                    id: id.to_string(),
                    label: "#".to_string(),
                    left,
                    width: self.config.row_number_width,
                    sortable: false,
                    resizable: false,
                    sort: None,
                    is_row_number: true,
                    drop_hint: None,
                }
            } else {
                let Some(def) = self.column(id) else {
                    continue;
                };
                VisibleColumn {
                    id: id.to_string(),
                    label: def.label.clone(),
                    left,
                    width: self.width_of(id).unwrap_or(self.config.column_width),
                    sortable: sortable_mode && def.sortable,
                    resizable: def.resizable,
                    sort: self
                        .sort
                        .as_ref()
                        .filter(|s| s.column_id == id)
                        .map(|s| s.direction),
                    is_row_number: false,
                    drop_hint: drop.filter(|t| t.column_id == id).map(|t| t.side),
                }
            };
            left = column.right();
            visible.push(column);
        }
        visible
    }

    /// Total width of the visible columns.
    pub fn content_width(&self) -> u32 {
        self.visible_columns()
            .last()
            .map(VisibleColumn::right)
            .unwrap_or(0)
    }

    pub fn scroll_x(&self) -> u32 {
        self.scroll_x
    }

    /// Sets the horizontal scroll offset of the header and body.
    pub fn set_scroll_x(&mut self, scroll_x: u32) {
        let scroll_x = scroll_x.min(self.content_width());
        if scroll_x != self.scroll_x {
            self.scroll_x = scroll_x;
            self.dirty = true;
        }
    }

    /// Maps a viewport x coordinate to the header cell under it.
    ///
    /// The last `resize_handle_width` units of a resizable column are its
    /// resize handle.
    pub fn header_hit(&self, x: i32) -> Option<HeaderHit> {
        let x = u32::try_from(x as i64 + self.scroll_x as i64).ok()?;
        let column = self
            .visible_columns()
            .into_iter()
            .find(|c| x >= c.left && x < c.right())?;

        let handle = self.config.resize_handle_width.min(column.width);
        let zone = if column.resizable && x >= column.right() - handle {
            HeaderZone::ResizeHandle
        } else {
            HeaderZone::Cell
        };
        Some(HeaderHit {
            column_id: column.id,
            zone,
            left: column.left,
            width: column.width,
        })
    }

    // -------------------------------------------------------------------------
    // Sort
    // -------------------------------------------------------------------------

    /// Handles a click on a column header.
    ///
    /// Ignored while a gesture is active or just ended, in `None` sort mode
    /// and on unsortable columns. Otherwise returns the next sort in the
    /// cycle, which has been applied (uncontrolled) or announced
    /// (controlled).
    pub fn header_click(&mut self, column_id: &str) -> Option<Option<SortSpec>> {
        if self.gesture.suppresses_click() {
            trace!("header click on {:?} suppressed by gesture", column_id);
            return None;
        }
        if self.config.sort_mode == SortMode::None {
            return None;
        }
        if !self.column(column_id).is_some_and(|c| c.sortable) {
            return None;
        }

        let next = self.config.sort_cycle.next(self.sort.as_ref(), column_id);
        debug!("sort {:?} -> {:?}", self.sort, next);
        self.request_sort(next.clone());
        Some(next)
    }

    /// Requests a sort change the same way a header click does.
    pub fn request_sort(&mut self, next: Option<SortSpec>) {
        match &mut self.control {
            SortControl::Controlled { on_change } => on_change(next),
            SortControl::Uncontrolled => self.apply_sort(next),
        }
    }

    /// Updates the sort from the caller's state (controlled tables).
    pub fn set_controlled_sort(&mut self, sort: Option<SortSpec>) {
        self.apply_sort(sort);
    }

    fn apply_sort(&mut self, sort: Option<SortSpec>) {
        if sort == self.sort {
            return;
        }
        self.sort = sort;
        self.layout_changed();
        self.rebind();
    }

    fn is_valid_sort(&self, spec: &SortSpec) -> bool {
        self.config.sort_mode != SortMode::None
            && self.column(&spec.column_id).is_some_and(|c| c.sortable)
    }

    // -------------------------------------------------------------------------
    // Resize gesture
    // -------------------------------------------------------------------------

    /// Starts resizing `column_id` with the pointer at `x`.
    pub fn begin_resize(&mut self, column_id: &str, x: i32) -> bool {
        if column_id == ROW_NUMBER_COLUMN || self.layout.is_hidden(column_id) {
            return false;
        }
        if !self.column(column_id).is_some_and(|c| c.resizable) {
            return false;
        }
        let Some(anchor_width) = self.width_of(column_id) else {
            return false;
        };

        let started = self.gesture.begin(Gesture::Resizing {
            column_id: column_id.to_string(),
            anchor_x: x,
            anchor_width,
        });
        if started {
            trace!("resize start: {} at x={} width={}", column_id, x, anchor_width);
            self.dirty = true;
        }
        started
    }

    /// Moves the resize pointer to `x`. Returns the new width.
    ///
    /// The width applies immediately; the write to storage waits until the
    /// gesture ends.
    pub fn update_resize(&mut self, x: i32) -> Option<u32> {
        let Gesture::Resizing {
            column_id,
            anchor_x,
            anchor_width,
        } = self.gesture.current()
        else {
            return None;
        };
        let (column_id, anchor_x, anchor_width) = (column_id.clone(), *anchor_x, *anchor_width);

        let bounds = self.bounds_of(&column_id)?;
        let width = resize_width(anchor_width, anchor_x, x, bounds);
        if self.width_of(&column_id) != Some(width) {
            self.layout.set_width(&column_id, width, bounds);
            self.layout_changed();
        }
        Some(width)
    }

    /// Ends a resize.
    pub fn end_resize(&mut self) -> bool {
        if !self.gesture.current().is_resizing() {
            return false;
        }
        self.end_gesture();
        true
    }

    // -------------------------------------------------------------------------
    // Reorder gesture
    // -------------------------------------------------------------------------

    /// Starts dragging `column_id`. Refused while resizing and for the
    /// row-number column.
    pub fn begin_drag(&mut self, column_id: &str) -> bool {
        if column_id == ROW_NUMBER_COLUMN || self.layout.is_hidden(column_id) {
            return false;
        }
        if self.column(column_id).is_none() {
            return false;
        }
        let started = self.gesture.begin(Gesture::Dragging {
            source_id: column_id.to_string(),
            target: None,
        });
        if started {
            trace!("drag start: {}", column_id);
            self.dirty = true;
        }
        started
    }

    /// Updates the drop hint while hovering `target_id` with the pointer at
    /// viewport x `cursor_x`.
    pub fn drag_over(&mut self, target_id: &str, cursor_x: i32) -> Option<DropTarget> {
        let Gesture::Dragging { source_id, .. } = self.gesture.current() else {
            return None;
        };

        let hint = if source_id == target_id || target_id == ROW_NUMBER_COLUMN {
            None
        } else {
            let content_x = (cursor_x as i64 + self.scroll_x as i64).clamp(0, i32::MAX as i64);
            self.visible_columns()
                .into_iter()
                .find(|c| c.id == target_id)
                .map(|c| DropTarget {
                    column_id: c.id,
                    side: drop_side(content_x as i32, c.left, c.width),
                })
        };

        if let Gesture::Dragging { target, .. } = self.gesture.current_mut()
            && *target != hint
        {
            *target = hint.clone();
            self.dirty = true;
        }
        hint
    }

    /// Drops the dragged column at the current hint. Returns `true` if the
    /// order changed.
    pub fn drop_column(&mut self) -> bool {
        let Gesture::Dragging { source_id, target } = self.gesture.current().clone() else {
            return false;
        };
        let moved = target.is_some_and(|t| self.layout.move_column(&source_id, &t.column_id, t.side));
        if moved {
            debug!("column {} moved; order={:?}", source_id, self.layout.order());
            self.layout_changed();
        }
        self.end_gesture();
        moved
    }

    /// Ends a drag without dropping.
    pub fn end_drag(&mut self) -> bool {
        if !self.gesture.current().is_dragging() {
            return false;
        }
        self.end_gesture();
        true
    }

    /// Ends whatever gesture is active, keeping what it changed so far.
    pub fn cancel_gesture(&mut self) {
        self.end_gesture();
    }

    fn end_gesture(&mut self) {
        if !self.gesture.is_active() {
            return;
        }
        trace!("gesture end: {:?}", self.gesture.current());
        self.dirty = true;
        if let Some(token) = self.gesture.finish() {
            debug!("applying reload token {} deferred by gesture", token);
            self.list.set_reload_token(token);
        }
    }

    // -------------------------------------------------------------------------
    // Column visibility
    // -------------------------------------------------------------------------

    pub fn set_column_hidden(&mut self, column_id: &str, hidden: bool) -> bool {
        let changed = self.layout.set_hidden(column_id, hidden);
        if changed {
            self.layout_changed();
            self.set_scroll_x(self.scroll_x);
        }
        changed
    }

    pub fn toggle_column(&mut self, column_id: &str) -> bool {
        let hidden = self.layout.is_hidden(column_id);
        self.set_column_hidden(column_id, !hidden)
    }

    pub fn show_all_columns(&mut self) -> bool {
        let changed = self.layout.show_all();
        if changed {
            self.layout_changed();
        }
        changed
    }

    /// Moves a column next to another one, like a completed drag.
    pub fn move_column(&mut self, source_id: &str, target_id: &str, side: DropSide) -> bool {
        if self.gesture.is_active() {
            return false;
        }
        let moved = self.layout.move_column(source_id, target_id, side);
        if moved {
            self.layout_changed();
        }
        moved
    }

    /// Restores the column definitions' defaults and removes the stored
    /// record. The sort is kept.
    pub async fn reset_layout(&mut self) -> Result<(), StoreError> {
        self.end_gesture();
        self.layout = ColumnLayout::defaults(&self.columns, self.config.row_numbers);
        self.scroll_x = 0;
        self.persist.reset();
        self.dirty = true;
        if let (Some(preferences), Some(list_id)) = (&self.preferences, &self.config.list_id) {
            info!("resetting layout {:?}", list_id);
            preferences.clear(list_id).await?;
        }
        if self.sort.is_some() {
            self.layout_changed();
        }
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Columns and list identity
    // -------------------------------------------------------------------------

    /// Replaces the column definitions.
    ///
    /// Definitions may be rebuilt every frame; the stored layout is only
    /// re-applied when their signature changes. Returns `true` in that case.
    pub async fn set_columns(&mut self, columns: Vec<ColumnDef<R>>) -> bool {
        let signature = column_signature(&columns);
        self.columns = columns;
        if signature == self.signature {
            return false;
        }
        debug!("column signature changed; rehydrating layout");
        self.signature = signature;
        self.flush_quietly().await;
        self.hydrate(false).await;
        self.rebind();
        true
    }

    /// Switches the persistence key, flushing pending writes for the old one
    /// and hydrating from the new one.
    pub async fn set_list_id(&mut self, list_id: Option<String>) {
        if list_id == self.config.list_id {
            return;
        }
        self.flush_quietly().await;
        self.config.list_id = list_id;
        self.hydrate(true).await;
        self.rebind();
    }

    /// Changes the query identity of a remote source (hard reset).
    pub fn set_query_key(&mut self, query_key: impl Into<String>) {
        let Binding::Remote {
            query_key: current, ..
        } = &mut self.binding
        else {
            debug!("ignoring query key on a static table");
            return;
        };
        let query_key = query_key.into();
        if *current != query_key {
            *current = query_key.clone();
            self.list.set_query_key(query_key);
        }
    }

    /// Binds a new remote source under `query_key` (hard reset).
    pub fn set_source(
        &mut self,
        source: Arc<dyn RangeSource<Row = R>>,
        query_key: impl Into<String>,
    ) {
        let query_key = query_key.into();
        self.binding = Binding::Remote {
            source: Arc::clone(&source),
            query_key: query_key.clone(),
        };
        self.list.set_source(source, query_key);
    }

    /// Binds a new static collection (hard reset).
    pub fn set_rows(&mut self, rows: Vec<R>) {
        self.binding = Binding::Static {
            rows: Arc::new(rows),
            instance: next_binding(),
        };
        self.rebind();
    }

    /// Changes the reload token. During a gesture the reload is held back
    /// and applied once when the gesture ends.
    pub fn set_reload_token(&mut self, token: u64) {
        if self.gesture.is_active() {
            trace!("deferring reload token {} until gesture ends", token);
            self.gesture.defer_reload(token);
        } else {
            self.list.set_reload_token(token);
        }
    }

    pub fn reload_token(&self) -> u64 {
        self.gesture
            .deferred_reload()
            .unwrap_or_else(|| self.list.reload_token())
    }

    // -------------------------------------------------------------------------
    // Scrolling and loading
    // -------------------------------------------------------------------------

    pub fn scroll_top(&self) -> u64 {
        self.list.scroll_top()
    }

    pub fn scroll_to(&mut self, scroll_top: u64) {
        self.list.scroll_to(scroll_top);
    }

    pub fn scroll_by(&mut self, delta: i64) {
        self.list.scroll_by(delta);
    }

    pub fn page_down(&mut self) {
        self.list.page_down();
    }

    pub fn page_up(&mut self) {
        self.list.page_up();
    }

    pub fn set_height(&mut self, height: u32) {
        self.list.set_height(height);
    }

    pub fn visible_range(&self) -> Range<usize> {
        self.list.visible_range()
    }

    pub fn on_counts_changed(&mut self, callback: impl FnMut(Counts) + Send + 'static) {
        self.list.on_counts_changed(callback);
    }

    pub fn on_range_changed(&mut self, callback: impl FnMut(Range<usize>) + Send + 'static) {
        self.list.on_range_changed(callback);
    }

    /// See [`WindowedList::next_completion`].
    pub async fn next_completion(&mut self) -> Option<Result<PageEvent, PageFailure>> {
        self.list.next_completion().await
    }

    /// See [`WindowedList::settle`].
    pub async fn settle(&mut self) -> Vec<PageFailure> {
        self.list.settle().await
    }

    // -------------------------------------------------------------------------
    // Rendering
    // -------------------------------------------------------------------------

    /// Calls `render` once per visible row with the visible columns.
    pub fn render_rows<O>(&self, mut render: impl FnMut(TableRowSlot<'_, R>) -> O) -> Vec<O> {
        let columns = self.visible_columns();
        self.list.render(|slot| {
            render(TableRowSlot {
                index: slot.index,
                item: slot.item,
                style: slot.style,
                is_loaded: slot.is_loaded,
                columns: &columns,
            })
        })
    }

    /// Cell text at `index`, or `None` while the row is loading.
    pub fn cell_text(&self, index: usize, column_id: &str) -> Option<String> {
        cell_text(index, self.list.row(index), column_id)
    }

    // -------------------------------------------------------------------------
    // Persistence
    // -------------------------------------------------------------------------

    /// When the next debounced write is due. `None` while nothing is pending
    /// or a gesture is active.
    pub fn next_persist_deadline(&self) -> Option<Instant> {
        if self.gesture.is_active() {
            return None;
        }
        self.persist.deadline()
    }

    pub fn persist_pending(&self) -> bool {
        self.persist.is_pending()
    }

    /// Writes the layout if the debounce period has passed and no gesture
    /// is active. Returns `true` if a write happened.
    pub async fn tick(&mut self) -> Result<bool, StoreError> {
        if self.gesture.is_active() || !self.persist.should_execute() {
            return Ok(false);
        }
        self.write_record().await?;
        Ok(true)
    }

    /// Writes a pending layout change immediately.
    pub async fn flush(&mut self) -> Result<bool, StoreError> {
        if !self.persist.is_pending() {
            return Ok(false);
        }
        self.persist.reset();
        self.write_record().await?;
        Ok(true)
    }

    async fn flush_quietly(&mut self) {
        if let Err(e) = self.flush().await {
            warn!("failed to write layout {:?}: {}", self.config.list_id, e);
        }
    }

    async fn write_record(&self) -> Result<(), StoreError> {
        let (Some(preferences), Some(list_id)) = (&self.preferences, &self.config.list_id) else {
            return Ok(());
        };
        preferences.save(list_id, &self.record()).await
    }

    fn layout_changed(&mut self) {
        self.dirty = true;
        if self.persists() {
            self.persist.trigger();
        }
    }

    fn persists(&self) -> bool {
        self.preferences.is_some() && self.config.list_id.is_some()
    }

    // -------------------------------------------------------------------------
    // Internals
    // -------------------------------------------------------------------------

    /// Reads the stored record for the current list id and applies it to
    /// the layout. The stored sort is only restored when `restore_sort` is
    /// set (mount and list id switches, not column changes).
    async fn hydrate(&mut self, restore_sort: bool) {
        self.end_gesture();
        self.persist.reset();

        let record = match (&self.preferences, &self.config.list_id) {
            (Some(preferences), Some(list_id)) => preferences.load(list_id).await,
            _ => None,
        };
        let base = match &record {
            Some(record) => record.clone(),
            None if self.persists() => LayoutRecord::default(),
            // A table that never persists keeps its in-memory arrangement.
            None => self.record(),
        };
        self.layout = ColumnLayout::reconcile(
            &base,
            &self.columns,
            self.config.row_numbers,
            self.config.width_bounds(),
        );
        self.dirty = true;

        let stored_sort = record.and_then(|r| r.sort).filter(|_| restore_sort);
        if matches!(self.control, SortControl::Controlled { .. }) {
            if let Some(Some(stored)) = stored_sort {
                self.offer_sort_hydration(stored);
            }
            return;
        }

        if let Some(stored) = stored_sort {
            self.sort = stored;
        }
        if self.sort.as_ref().is_some_and(|s| !self.is_valid_sort(s)) {
            debug!("dropping sort {:?}: column unavailable", self.sort);
            self.sort = None;
        }
    }

    /// Offers a stored sort to a controlled caller, once per mount and only
    /// while the caller has no sort of its own.
    fn offer_sort_hydration(&mut self, stored: SortSpec) {
        if self.hydration_offered || self.sort.is_some() || !self.is_valid_sort(&stored) {
            return;
        }
        if let SortControl::Controlled { on_change } = &mut self.control {
            debug!("offering stored sort {:?} to caller", stored);
            self.hydration_offered = true;
            on_change(Some(stored));
        }
    }

    /// Source and query key for the current binding and sort.
    fn resolve(&self) -> (Arc<dyn RangeSource<Row = R>>, String) {
        match &self.binding {
            Binding::Remote { source, query_key } => (Arc::clone(source), query_key.clone()),
            Binding::Static { rows, instance } => {
                let client_sort = self
                    .sort
                    .as_ref()
                    .filter(|_| self.config.sort_mode == SortMode::Client);
                match client_sort {
                    Some(spec) => {
                        let rows = sorted(rows, spec, &self.columns);
                        let source: Arc<dyn RangeSource<Row = R>> =
                            Arc::new(VecSource::new(rows));
                        (source, format!("static:{}:{}", instance, spec.key()))
                    }
                    None => {
                        let source: Arc<dyn RangeSource<Row = R>> =
                            Arc::new(VecSource::from_arc(Arc::clone(rows)));
                        (source, format!("static:{}", instance))
                    }
                }
            }
        }
    }

    /// Re-binds the list if the resolved query identity changed.
    fn rebind(&mut self) {
        let (source, key) = self.resolve();
        if key != self.list.query_key() {
            self.list.set_source(source, key);
        }
    }
}
