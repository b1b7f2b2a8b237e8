//! Header gesture state: column resize and drag-reorder.

use std::time::Duration;

use tokio::time::Instant;

use super::column::WidthBounds;

/// Clicks arriving this soon after a gesture ends are treated as part of it.
pub const CLICK_SUPPRESS_WINDOW: Duration = Duration::from_millis(250);

/// Default width of the resize handle at a column's right edge.
pub const RESIZE_HANDLE_WIDTH: u32 = 6;

/// Which side of the hovered column a dragged column lands on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropSide {
    Before,
    After,
}

/// Drop hint shown while dragging.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DropTarget {
    pub column_id: String,
    pub side: DropSide,
}

/// The active header gesture. Resize and reorder never overlap.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Gesture {
    #[default]
    Idle,
    Resizing {
        column_id: String,
        anchor_x: i32,
        anchor_width: u32,
    },
    Dragging {
        source_id: String,
        target: Option<DropTarget>,
    },
}

impl Gesture {
    pub fn is_idle(&self) -> bool {
        matches!(self, Gesture::Idle)
    }

    pub fn is_resizing(&self) -> bool {
        matches!(self, Gesture::Resizing { .. })
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self, Gesture::Dragging { .. })
    }

    /// The column the gesture operates on.
    pub fn column_id(&self) -> Option<&str> {
        match self {
            Gesture::Idle => None,
            Gesture::Resizing { column_id, .. } => Some(column_id),
            Gesture::Dragging { source_id, .. } => Some(source_id),
        }
    }
}

/// Before/after hint from the cursor position relative to the hovered
/// column's midpoint.
pub fn drop_side(cursor_x: i32, left: u32, width: u32) -> DropSide {
    let midpoint = left as i64 + width as i64 / 2;
    if (cursor_x as i64) < midpoint {
        DropSide::Before
    } else {
        DropSide::After
    }
}

/// Width for a resize anchored at `anchor_x` with `anchor_width`, after the
/// pointer moved to `current_x`.
pub fn resize_width(anchor_width: u32, anchor_x: i32, current_x: i32, bounds: WidthBounds) -> u32 {
    let width = anchor_width as i64 + (current_x as i64 - anchor_x as i64);
    width.clamp(bounds.min as i64, bounds.max as i64) as u32
}

/// Gesture plus the bookkeeping around its end: click suppression and the
/// reload token held back while it ran.
#[derive(Debug, Default)]
pub struct GestureState {
    current: Gesture,
    ended_at: Option<Instant>,
    deferred_reload: Option<u64>,
}

impl GestureState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> &Gesture {
        &self.current
    }

    pub fn current_mut(&mut self) -> &mut Gesture {
        &mut self.current
    }

    pub fn is_active(&self) -> bool {
        !self.current.is_idle()
    }

    /// Starts a gesture. Refused while another one is active.
    pub fn begin(&mut self, gesture: Gesture) -> bool {
        if self.is_active() || gesture.is_idle() {
            return false;
        }
        self.current = gesture;
        true
    }

    /// Ends the active gesture, returning the reload token that arrived
    /// while it ran (the latest one only).
    pub fn finish(&mut self) -> Option<u64> {
        if !self.is_active() {
            return None;
        }
        self.current = Gesture::Idle;
        self.ended_at = Some(Instant::now());
        self.deferred_reload.take()
    }

    /// Holds a reload token until the gesture ends. Later tokens replace
    /// earlier ones.
    pub fn defer_reload(&mut self, token: u64) {
        self.deferred_reload = Some(token);
    }

    pub fn deferred_reload(&self) -> Option<u64> {
        self.deferred_reload
    }

    /// Returns `true` if a header click now should be ignored.
    pub fn suppresses_click(&self) -> bool {
        if self.is_active() {
            return true;
        }
        self.ended_at
            .is_some_and(|ended| ended.elapsed() < CLICK_SUPPRESS_WINDOW)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_drop_side_uses_midpoint() {
        assert_eq!(drop_side(10, 0, 100), DropSide::Before);
        assert_eq!(drop_side(49, 0, 100), DropSide::Before);
        assert_eq!(drop_side(50, 0, 100), DropSide::After);
        assert_eq!(drop_side(190, 100, 100), DropSide::After);
    }

    #[test]
    fn test_resize_width_clamps() {
        let bounds = WidthBounds {
            default: 100,
            min: 60,
            max: 300,
        };
        assert_eq!(resize_width(100, 500, 540, bounds), 140);
        assert_eq!(resize_width(100, 500, 400, bounds), 60);
        assert_eq!(resize_width(100, 500, 2000, bounds), 300);
    }

    #[test]
    fn test_gestures_are_exclusive() {
        let mut state = GestureState::new();
        assert!(state.begin(Gesture::Dragging {
            source_id: "name".into(),
            target: None,
        }));
        assert!(!state.begin(Gesture::Resizing {
            column_id: "name".into(),
            anchor_x: 0,
            anchor_width: 100,
        }));
    }

    #[tokio::test(start_paused = true)]
    async fn test_deferred_reload_is_coalesced() {
        let mut state = GestureState::new();
        state.begin(Gesture::Resizing {
            column_id: "name".into(),
            anchor_x: 0,
            anchor_width: 100,
        });
        state.defer_reload(1);
        state.defer_reload(2);
        state.defer_reload(3);
        assert_eq!(state.finish(), Some(3));
        assert_eq!(state.finish(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_click_suppressed_right_after_gesture() {
        let mut state = GestureState::new();
        state.begin(Gesture::Dragging {
            source_id: "name".into(),
            target: None,
        });
        assert!(state.suppresses_click());
        state.finish();
        assert!(state.suppresses_click());
        tokio::time::advance(CLICK_SUPPRESS_WINDOW).await;
        assert!(!state.suppresses_click());
    }
}
