//! Windowed renderer: renders the rows intersecting the viewport and pages
//! them in from a remote or in-memory source.
//!
//! - [`RangeSource`]: the `(offset, limit) -> rows + counts` contract
//! - [`WindowConfig`]: viewport geometry, page size and overscan
//! - [`WindowedList`]: scroll state, sparse cache and fetch scheduling

mod cache;
mod list;
mod source;
mod viewport;

pub use cache::{InFlight, RowWindow};
pub use list::{Counts, PageEvent, PageFailure, RowSlot, WindowedList};
pub use source::{
    DEFAULT_LIMIT, MAX_LIMIT, Meta, RangeRequest, RangeResponse, RangeSource, VecSource,
    clamp_limit,
};
pub use viewport::{DEFAULT_OVERSCAN, RowStyle, WindowConfig, pages_for};
