//! Table configuration

use std::time::Duration;

use crate::window::WindowConfig;

use super::column::{
    DEFAULT_COLUMN_WIDTH, DEFAULT_MAX_WIDTH, DEFAULT_MIN_WIDTH, ROW_NUMBER_WIDTH, WidthBounds,
};
use super::gesture::RESIZE_HANDLE_WIDTH;
use super::sort::{SortCycle, SortMode};

/// Configuration for a [`Table`](super::Table).
///
/// # Example
///
/// ```
/// use std::time::Duration;
/// use fleetgrid::table::{SortMode, TableConfig};
///
/// let config = TableConfig::default()
///     .with_list_id("instances")
///     .with_sort_mode(SortMode::Server)
///     .with_row_numbers(true)
///     .with_persist_debounce(Duration::from_millis(300));
/// assert_eq!(config.list_id.as_deref(), Some("instances"));
/// ```
#[derive(Debug, Clone)]
pub struct TableConfig {
    /// Key under which the layout is persisted. `None` disables persistence.
    pub list_id: Option<String>,

    /// Where sorting happens.
    ///
    /// Default: client
    pub sort_mode: SortMode,

    /// States a column steps through on repeated header clicks.
    ///
    /// Default: asc, desc, unsorted
    pub sort_cycle: SortCycle,

    /// Show a pinned row-number column first.
    pub row_numbers: bool,

    /// Width of the row-number column.
    pub row_number_width: u32,

    /// Quiet period before a layout change is written.
    ///
    /// Default: 150 ms
    pub persist_debounce: Duration,

    /// Width of columns that do not set one.
    pub column_width: u32,
    pub min_column_width: u32,
    pub max_column_width: u32,

    /// Width of the resize handle at each column's right edge.
    pub resize_handle_width: u32,

    /// Viewport geometry and paging.
    pub window: WindowConfig,
}

impl Default for TableConfig {
    fn default() -> Self {
        Self {
            list_id: None,
            sort_mode: SortMode::Client,
            sort_cycle: SortCycle::default(),
            row_numbers: false,
            row_number_width: ROW_NUMBER_WIDTH,
            persist_debounce: Duration::from_millis(150),
            column_width: DEFAULT_COLUMN_WIDTH,
            min_column_width: DEFAULT_MIN_WIDTH,
            max_column_width: DEFAULT_MAX_WIDTH,
            resize_handle_width: RESIZE_HANDLE_WIDTH,
            window: WindowConfig::default(),
        }
    }
}

impl TableConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the persistence key.
    pub fn with_list_id(mut self, list_id: impl Into<String>) -> Self {
        self.list_id = Some(list_id.into());
        self
    }

    pub fn with_sort_mode(mut self, mode: SortMode) -> Self {
        self.sort_mode = mode;
        self
    }

    pub fn with_sort_cycle(mut self, cycle: SortCycle) -> Self {
        self.sort_cycle = cycle;
        self
    }

    pub fn with_row_numbers(mut self, enabled: bool) -> Self {
        self.row_numbers = enabled;
        self
    }

    pub fn with_row_number_width(mut self, width: u32) -> Self {
        self.row_number_width = width;
        self
    }

    pub fn with_persist_debounce(mut self, delay: Duration) -> Self {
        self.persist_debounce = delay;
        self
    }

    /// Sets the default, minimum and maximum column widths.
    pub fn with_column_widths(mut self, default: u32, min: u32, max: u32) -> Self {
        self.min_column_width = min;
        self.max_column_width = max.max(min);
        self.column_width = default.clamp(min, self.max_column_width);
        self
    }

    pub fn with_resize_handle_width(mut self, width: u32) -> Self {
        self.resize_handle_width = width;
        self
    }

    pub fn with_window(mut self, window: WindowConfig) -> Self {
        self.window = window;
        self
    }

    /// Table-wide width bounds.
    pub fn width_bounds(&self) -> WidthBounds {
        WidthBounds {
            default: self.column_width,
            min: self.min_column_width,
            max: self.max_column_width,
        }
    }
}
