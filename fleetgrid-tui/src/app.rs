//! Console state and input handling.

use std::sync::Arc;

use crossterm::event::{
    Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseButton, MouseEvent, MouseEventKind,
};
use log::{debug, info, warn};

use fleetgrid::table::{HeaderPointer, PointerEvent, PointerOutcome, ROW_NUMBER_COLUMN, Table};
use fleetgrid::window::{PageEvent, PageFailure};

use crate::fleet::{Fleet, Instance};

/// Screen row of the sticky header.
pub const HEADER_ROW: u16 = 0;

/// Rows below the table (the status line).
pub const FOOTER_ROWS: u16 = 1;

/// Rows scrolled per wheel notch.
const WHEEL_ROWS: i64 = 3;

/// Columns scrolled per horizontal step.
const HORIZONTAL_STEP: u32 = 4;

/// Instances added on every live reload.
const LIVE_GROWTH: usize = 2;

/// Status filter toggled with `f`.
const FILTER_STATUS: &str = "running";

/// Pointer movement, in cells, before a pressed header becomes a drag.
const DRAG_THRESHOLD: u32 = 1;

pub struct App {
    pub table: Table<Instance>,
    pointer: HeaderPointer,
    fleet: Fleet,
    filter: Option<&'static str>,
    reload_token: u64,
    cursor_x: Option<u16>,
    width: u16,
    height: u16,
    message: Option<String>,
    redraw: bool,
    quit: bool,
}

impl App {
    pub fn new(table: Table<Instance>, fleet: Fleet, width: u16, height: u16) -> Self {
        let mut app = Self {
            table,
            pointer: HeaderPointer::new(DRAG_THRESHOLD),
            fleet,
            filter: None,
            reload_token: 0,
            cursor_x: None,
            width,
            height,
            message: None,
            redraw: true,
            quit: false,
        };
        app.resize(width, height);
        // A hydrated sort only reaches the source through the query.
        app.requery();
        app
    }

    pub fn width(&self) -> u16 {
        self.width
    }

    pub fn height(&self) -> u16 {
        self.height
    }

    pub fn filter(&self) -> Option<&str> {
        self.filter
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    pub fn should_quit(&self) -> bool {
        self.quit
    }

    pub fn needs_redraw(&self) -> bool {
        self.redraw || self.table.is_dirty()
    }

    pub fn drawn(&mut self) {
        self.redraw = false;
        self.table.clear_dirty();
    }

    // -------------------------------------------------------------------------
    // Events
    // -------------------------------------------------------------------------

    pub async fn handle_event(&mut self, event: Event) {
        match event {
            Event::Key(key) if key.kind == KeyEventKind::Press => self.handle_key(key).await,
            Event::Mouse(mouse) => self.handle_mouse(mouse),
            Event::Resize(width, height) => self.resize(width, height),
            Event::FocusLost => {
                let outcome = self.pointer.handle(&mut self.table, PointerEvent::Cancel);
                self.on_pointer(outcome);
            }
            _ => {}
        }
    }

    async fn handle_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => self.quit = true,
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.quit = true
            }
            KeyCode::Down | KeyCode::Char('j') => self.table.scroll_by(1),
            KeyCode::Up | KeyCode::Char('k') => self.table.scroll_by(-1),
            KeyCode::PageDown => self.table.page_down(),
            KeyCode::PageUp => self.table.page_up(),
            KeyCode::Home => self.table.scroll_to(0),
            KeyCode::End => self.table.scroll_to(u64::MAX),
            KeyCode::Left => self.scroll_horizontal(-1),
            KeyCode::Right => self.scroll_horizontal(1),
            KeyCode::Char('h') => self.hide_hovered(),
            KeyCode::Char('a') => {
                if self.table.show_all_columns() {
                    self.notify("all columns shown");
                }
            }
            KeyCode::Char('x') => match self.table.reset_layout().await {
                Ok(()) => self.notify("layout reset"),
                Err(e) => {
                    warn!("failed to reset layout: {}", e);
                    self.notify(format!("layout reset failed: {}", e));
                }
            },
            KeyCode::Char('r') => self.reload(),
            KeyCode::Char('f') => self.toggle_filter(),
            _ => {}
        }
    }

    fn handle_mouse(&mut self, mouse: MouseEvent) {
        self.cursor_x = Some(mouse.column);
        let x = mouse.column as i32;

        let event = match mouse.kind {
            MouseEventKind::Down(MouseButton::Left) if mouse.row == HEADER_ROW => {
                PointerEvent::Down { x }
            }
            MouseEventKind::Drag(MouseButton::Left) => PointerEvent::Move { x },
            MouseEventKind::Up(MouseButton::Left) => PointerEvent::Up { x },
            MouseEventKind::ScrollDown => return self.table.scroll_by(WHEEL_ROWS),
            MouseEventKind::ScrollUp => return self.table.scroll_by(-WHEEL_ROWS),
            MouseEventKind::ScrollRight => return self.scroll_horizontal(1),
            MouseEventKind::ScrollLeft => return self.scroll_horizontal(-1),
            _ => return,
        };
        let outcome = self.pointer.handle(&mut self.table, event);
        self.on_pointer(outcome);
    }

    fn on_pointer(&mut self, outcome: PointerOutcome) {
        match outcome {
            PointerOutcome::Sorted { column_id, sort } => {
                match &sort {
                    Some(spec) => {
                        self.notify(format!("sorted by {} {}", column_id, spec.direction.as_param()))
                    }
                    None => self.notify("sort cleared"),
                }
                self.requery();
            }
            PointerOutcome::ResizeEnded { column_id } => {
                debug!("resized {} to {:?}", column_id, self.table.width_of(&column_id));
            }
            PointerOutcome::Dropped { moved: true } => self.notify("column moved"),
            _ => {}
        }
    }

    /// Merges a settled page load.
    pub fn on_page(&mut self, result: Result<PageEvent, PageFailure>) {
        match result {
            Ok(PageEvent::Loaded { .. }) => {}
            Ok(PageEvent::Stale { page }) => debug!("dropped stale page {}", page),
            Err(failure) => self.notify(failure.to_string()),
        }
    }

    // -------------------------------------------------------------------------
    // Commands
    // -------------------------------------------------------------------------

    /// Soft reload: refresh counts and the visible pages in place.
    pub fn reload(&mut self) {
        self.reload_token += 1;
        self.table.set_reload_token(self.reload_token);
    }

    /// Simulated fleet activity followed by a soft reload.
    pub fn live_tick(&mut self) {
        self.fleet.churn(LIVE_GROWTH);
        self.reload();
    }

    fn toggle_filter(&mut self) {
        self.filter = match self.filter {
            Some(_) => None,
            None => Some(FILTER_STATUS),
        };
        info!("status filter: {:?}", self.filter);
        self.requery();
    }

    /// Rebinds the table to a query for the current filter and sort. A new
    /// query key hard-resets the list.
    fn requery(&mut self) {
        let query = self.fleet.query(self.filter, self.table.sort());
        let key = query.key();
        if key != self.table.list().query_key() {
            self.table.set_source(Arc::new(query), key);
        }
    }

    fn hide_hovered(&mut self) {
        let Some(x) = self.cursor_x else {
            self.notify("point at a column header first");
            return;
        };
        let Some(hit) = self.table.header_hit(x as i32) else {
            return;
        };
        if hit.column_id == ROW_NUMBER_COLUMN {
            return;
        }
        if self.table.set_column_hidden(&hit.column_id, true) {
            self.notify(format!("{} hidden (a to show all)", hit.column_id));
        }
    }

    fn scroll_horizontal(&mut self, steps: i32) {
        let scroll_x = self.table.scroll_x();
        let target = if steps < 0 {
            scroll_x.saturating_sub(HORIZONTAL_STEP)
        } else {
            scroll_x.saturating_add(HORIZONTAL_STEP)
        };
        self.table.set_scroll_x(target);
    }

    fn resize(&mut self, width: u16, height: u16) {
        self.width = width;
        self.height = height;
        self.table.set_height(height.saturating_sub(FOOTER_ROWS) as u32);
        self.redraw = true;
    }

    fn notify(&mut self, message: impl Into<String>) {
        self.message = Some(message.into());
        self.redraw = true;
    }
}
