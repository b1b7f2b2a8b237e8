//! fleetgrid - a headless windowed table engine.
//!
//! Renders arbitrarily large, server-backed collections by fetching only the
//! rows near the viewport, and layers a configurable table on top: column
//! order, visibility and widths, tri-state sorting, resize and reorder
//! gestures, and debounced, validated layout persistence.
//!
//! # Modules
//!
//! - [`window`]: range data sources, viewport math and the windowed list
//! - [`table`]: columns, sort, gestures and the [`Table`](table::Table)
//! - [`prefs`]: layout stores and the stored layout record
//! - [`debounce`]: trailing-edge debounce timer
//! - [`error`]: error types

pub mod debounce;
pub mod error;
pub mod prefs;
pub mod table;
pub mod window;

pub use error::{SourceError, StoreError};
