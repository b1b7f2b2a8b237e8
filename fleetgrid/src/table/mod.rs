//! Configurable table on top of the windowed renderer.
//!
//! - [`ColumnDef`] / [`GridRow`]: column definitions and cell access
//! - [`ColumnLayout`]: order, visibility and widths, reconciled with storage
//! - [`SortCycle`] / [`sort_rows`]: tri-state sort and stable client sort
//! - [`Table`]: gestures, sort intent and debounced persistence
//! - [`HeaderPointer`]: raw pointer input to gestures

mod column;
mod config;
mod gesture;
mod layout;
mod pointer;
mod sort;
mod state;
mod value;

pub use column::{
    Comparator, ColumnDef, DEFAULT_COLUMN_WIDTH, DEFAULT_MAX_WIDTH, DEFAULT_MIN_WIDTH, GridRow,
    ROW_NUMBER_COLUMN, ROW_NUMBER_WIDTH, WidthBounds, column_signature,
};
pub use config::TableConfig;
pub use gesture::{
    CLICK_SUPPRESS_WINDOW, DropSide, DropTarget, Gesture, GestureState, RESIZE_HANDLE_WIDTH,
    drop_side, resize_width,
};
pub use layout::ColumnLayout;
pub use pointer::{DRAG_THRESHOLD, HeaderPointer, PointerEvent, PointerOutcome};
pub use sort::{SortCycle, SortDirection, SortMode, SortSpec, sort_rows, sorted};
pub use state::{
    HeaderHit, HeaderZone, RowSource, Table, TableBuilder, TableRowSlot, VisibleColumn,
};
pub use value::{SortValue, natural_cmp};
