//! Raw pointer input to header gestures.

use log::trace;

use super::column::GridRow;
use super::gesture::{DropTarget, Gesture};
use super::sort::SortSpec;
use super::state::{HeaderZone, Table};

/// Default movement before a pressed header turns into a drag.
pub const DRAG_THRESHOLD: u32 = 3;

/// Pointer input over the header row. `x` is viewport-relative.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerEvent {
    Down { x: i32 },
    Move { x: i32 },
    Up { x: i32 },
    Cancel,
}

/// What a pointer event did to the table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PointerOutcome {
    Ignored,
    Pressed { column_id: String },
    ResizeStarted { column_id: String },
    Resized { column_id: String, width: u32 },
    ResizeEnded { column_id: String },
    DragStarted { column_id: String },
    DragOver { target: Option<DropTarget> },
    Dropped { moved: bool },
    /// A click that changed (or announced) the sort.
    Sorted { column_id: String, sort: Option<SortSpec> },
    Cancelled,
}

#[derive(Debug, Clone)]
struct Press {
    column_id: String,
    origin_x: i32,
}

/// Turns down/move/up sequences into resize, reorder and click gestures for
/// hosts without native drag events.
///
/// Pressing a resize handle starts a resize. Pressing a header cell and
/// moving past the threshold starts a drag; releasing without one is a
/// click.
#[derive(Debug, Clone)]
pub struct HeaderPointer {
    threshold: u32,
    press: Option<Press>,
}

impl Default for HeaderPointer {
    fn default() -> Self {
        Self::new(DRAG_THRESHOLD)
    }
}

impl HeaderPointer {
    pub fn new(threshold: u32) -> Self {
        Self {
            threshold,
            press: None,
        }
    }

    pub fn handle<R: GridRow>(&mut self, table: &mut Table<R>, event: PointerEvent) -> PointerOutcome {
        trace!("header pointer: {:?}", event);
        match event {
            PointerEvent::Down { x } => self.down(table, x),
            PointerEvent::Move { x } => self.motion(table, x),
            PointerEvent::Up { x } => self.up(table, x),
            PointerEvent::Cancel => {
                self.press = None;
                if table.gesture().is_idle() {
                    return PointerOutcome::Ignored;
                }
                table.cancel_gesture();
                PointerOutcome::Cancelled
            }
        }
    }

    fn down<R: GridRow>(&mut self, table: &mut Table<R>, x: i32) -> PointerOutcome {
        self.press = None;
        if !table.gesture().is_idle() {
            return PointerOutcome::Ignored;
        }
        let Some(hit) = table.header_hit(x) else {
            return PointerOutcome::Ignored;
        };

        if hit.zone == HeaderZone::ResizeHandle && table.begin_resize(&hit.column_id, x) {
            return PointerOutcome::ResizeStarted {
                column_id: hit.column_id,
            };
        }
        self.press = Some(Press {
            column_id: hit.column_id.clone(),
            origin_x: x,
        });
        PointerOutcome::Pressed {
            column_id: hit.column_id,
        }
    }

    fn motion<R: GridRow>(&mut self, table: &mut Table<R>, x: i32) -> PointerOutcome {
        match table.gesture() {
            Gesture::Resizing { column_id, .. } => {
                let column_id = column_id.clone();
                match table.update_resize(x) {
                    Some(width) => PointerOutcome::Resized { column_id, width },
                    None => PointerOutcome::Ignored,
                }
            }
            Gesture::Dragging { .. } => self.hover(table, x),
            Gesture::Idle => {
                let Some(press) = &self.press else {
                    return PointerOutcome::Ignored;
                };
                if x.abs_diff(press.origin_x) < self.threshold {
                    return PointerOutcome::Ignored;
                }
                let column_id = press.column_id.clone();
                if !table.begin_drag(&column_id) {
                    self.press = None;
                    return PointerOutcome::Ignored;
                }
                self.hover(table, x);
                PointerOutcome::DragStarted { column_id }
            }
        }
    }

    fn hover<R: GridRow>(&mut self, table: &mut Table<R>, x: i32) -> PointerOutcome {
        let target = match table.header_hit(x) {
            Some(hit) => table.drag_over(&hit.column_id, x),
            None => None,
        };
        PointerOutcome::DragOver { target }
    }

    fn up<R: GridRow>(&mut self, table: &mut Table<R>, x: i32) -> PointerOutcome {
        let press = self.press.take();
        match table.gesture() {
            Gesture::Resizing { column_id, .. } => {
                let column_id = column_id.clone();
                table.end_resize();
                PointerOutcome::ResizeEnded { column_id }
            }
            Gesture::Dragging { .. } => {
                self.hover(table, x);
                PointerOutcome::Dropped {
                    moved: table.drop_column(),
                }
            }
            Gesture::Idle => {
                let Some(press) = press else {
                    return PointerOutcome::Ignored;
                };
                match table.header_click(&press.column_id) {
                    Some(sort) => PointerOutcome::Sorted {
                        column_id: press.column_id,
                        sort,
                    },
                    None => PointerOutcome::Ignored,
                }
            }
        }
    }
}
