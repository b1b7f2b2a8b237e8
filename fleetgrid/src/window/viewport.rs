//! Viewport geometry: which rows intersect the scroll window and which
//! pages cover them.

use std::ops::Range;
use std::ops::RangeInclusive;

use super::source::DEFAULT_LIMIT;
use super::source::clamp_limit;

/// Default number of extra rows rendered above and below the viewport.
pub const DEFAULT_OVERSCAN: usize = 10;

/// Geometry and paging configuration for a windowed list.
///
/// # Example
///
/// ```
/// use fleetgrid::window::WindowConfig;
///
/// let config = WindowConfig::default()
///     .with_height(400)
///     .with_row_height(40)
///     .with_overscan(5);
/// assert_eq!(config.visible_range(8000, 10_000), 195..216);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowConfig {
    /// Total viewport height, sticky header included.
    pub height: u32,
    /// Fixed height of every row.
    pub row_height: u32,
    /// Height of the sticky header (0 when there is none).
    pub header_height: u32,
    /// Rows per page request.
    ///
    /// Default: 200
    pub page_size: usize,
    /// Rows rendered beyond each edge of the viewport.
    ///
    /// Default: 10
    pub overscan: usize,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            height: 400,
            row_height: 40,
            header_height: 0,
            page_size: DEFAULT_LIMIT,
            overscan: DEFAULT_OVERSCAN,
        }
    }
}

impl WindowConfig {
    /// Creates a config with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the viewport height.
    pub fn with_height(mut self, height: u32) -> Self {
        self.height = height;
        self
    }

    /// Sets the row height.
    pub fn with_row_height(mut self, row_height: u32) -> Self {
        self.row_height = row_height;
        self
    }

    /// Sets the sticky header height.
    pub fn with_header_height(mut self, header_height: u32) -> Self {
        self.header_height = header_height;
        self
    }

    /// Sets the page size, clamped to what a single request may carry.
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = clamp_limit(page_size);
        self
    }

    /// Sets the overscan.
    pub fn with_overscan(mut self, overscan: usize) -> Self {
        self.overscan = overscan;
        self
    }

    /// Height available to rows below the sticky header.
    pub fn body_height(&self) -> u32 {
        self.height.saturating_sub(self.header_height)
    }

    /// Total scrollable height, header included.
    ///
    /// The header sits at the top of the scroll content and sticks to the
    /// top of the viewport, overlaying the first `header_height` units of it.
    pub fn content_height(&self, rows: usize) -> u64 {
        self.header_height as u64 + rows as u64 * self.row_height as u64
    }

    /// Largest valid scroll offset for `rows` rows. At this offset the last
    /// row ends exactly at the bottom edge of the body.
    pub fn max_scroll_top(&self, rows: usize) -> u64 {
        self.content_height(rows).saturating_sub(self.height as u64)
    }

    /// Computes the half-open range of row indices to render.
    ///
    /// The range is `[max(0, first - overscan), min(rows - 1, last + overscan)]`
    /// where `first`/`last` are the rows under the top and bottom edge of the
    /// body.
    pub fn visible_range(&self, scroll_top: u64, rows: usize) -> Range<usize> {
        if rows == 0 || self.row_height == 0 {
            return 0..0;
        }

        // The body's top edge sits at `scroll_top + header` in scroll content
        // and rows start `header` below the content top, so the offset into
        // the row area is `scroll_top` itself.
        let row_height = self.row_height as u64;
        let offset = scroll_top;
        let first = (offset / row_height) as usize;
        let last = ((offset + self.body_height() as u64) / row_height) as usize;

        let start = first.saturating_sub(self.overscan);
        let end = last.saturating_add(self.overscan).min(rows - 1);
        if start > end {
            return rows..rows;
        }
        start..end + 1
    }

    /// Position of the row at `index`.
    pub fn row_style(&self, index: usize) -> RowStyle {
        RowStyle {
            top: index as u64 * self.row_height as u64,
            height: self.row_height,
        }
    }

    /// Where the row at `index` starts relative to the top edge of the body
    /// when scrolled to `scroll_top`. Negative above the body.
    pub fn body_y(&self, index: usize, scroll_top: u64) -> i64 {
        self.row_style(index).top as i64 - scroll_top as i64
    }
}

/// Absolute placement of a rendered row inside the scroll content.
///
/// Callers must apply it verbatim for the virtualized layout to line up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowStyle {
    /// Offset from the top of the row area (`index * row_height`).
    pub top: u64,
    pub height: u32,
}

/// Page indices intersecting a half-open row range.
#[allow(clippy::reversed_empty_ranges)]
pub fn pages_for(range: &Range<usize>, page_size: usize) -> RangeInclusive<usize> {
    let page_size = page_size.max(1);
    if range.is_empty() {
        return 1..=0;
    }
    range.start / page_size..=(range.end - 1) / page_size
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scenario() -> WindowConfig {
        WindowConfig::default()
            .with_height(400)
            .with_row_height(40)
            .with_overscan(5)
    }

    #[test]
    fn test_range_at_top() {
        assert_eq!(scenario().visible_range(0, 10_000), 0..16);
    }

    #[test]
    fn test_range_mid_scroll() {
        assert_eq!(scenario().visible_range(8000, 10_000), 195..216);
    }

    #[test]
    fn test_range_clamped_to_row_count() {
        assert_eq!(scenario().visible_range(0, 3), 0..3);
        assert_eq!(scenario().visible_range(0, 0), 0..0);
    }

    #[test]
    fn test_range_past_end_is_empty() {
        let range = scenario().visible_range(1_000_000, 10);
        assert!(range.is_empty());
    }

    #[test]
    fn test_sticky_header_overlays_body() {
        let config = scenario().with_height(440).with_header_height(40);
        assert_eq!(config.body_height(), 400);
        assert_eq!(config.visible_range(0, 10_000), 0..16);
        assert_eq!(config.visible_range(8000, 10_000), 195..216);
        assert_eq!(config.body_y(200, 8000), 0);
        assert_eq!(config.body_y(199, 8000), -40);
    }

    #[test]
    fn test_last_row_reachable_under_sticky_header() {
        // One-line rows under a one-line header, 23 lines tall.
        let config = WindowConfig::default()
            .with_height(23)
            .with_row_height(1)
            .with_header_height(1)
            .with_overscan(0);
        let max = config.max_scroll_top(100);
        assert_eq!(max, 78);

        let range = config.visible_range(max, 100);
        assert!(range.contains(&99));
        assert_eq!(config.body_y(99, max), 21);
        assert!(config.body_y(99, max) < config.body_height() as i64);
        assert_eq!(config.body_y(78, max), 0);

        // Every scroll step moves the first body row.
        assert_eq!(config.body_y(0, 0), 0);
        assert_eq!(config.body_y(0, 1), -1);
    }

    #[test]
    fn test_pages_for_range() {
        assert_eq!(pages_for(&(195..216), 200), 0..=1);
        assert_eq!(pages_for(&(0..16), 200), 0..=0);
        assert!(pages_for(&(0..0), 200).is_empty());
    }

    #[test]
    fn test_max_scroll_top() {
        let config = scenario();
        assert_eq!(config.max_scroll_top(10_000), 400_000 - 400);
        assert_eq!(config.max_scroll_top(5), 0);
    }
}
