//! Terminal drawing.

use std::io::{self, Write};

use crossterm::cursor::MoveTo;
use crossterm::queue;
use crossterm::style::{Attribute, Color, Print, SetAttribute, SetForegroundColor};
use crossterm::terminal::{Clear, ClearType};
use serde_json::Value;
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use fleetgrid::table::{DropSide, SortDirection, VisibleColumn};

use crate::app::{App, HEADER_ROW};

const SEPARATOR: char = '│';
const DROP_MARK: char = '┃';
const PLACEHOLDER: &str = "…";

pub fn draw(out: &mut impl Write, app: &App) -> io::Result<()> {
    let table = &app.table;
    let width = app.width() as usize;
    // The list holds the live geometry; it follows terminal resizes.
    let window = table.list().config();
    let body_rows = window.body_height() as i64;
    let scroll_x = table.scroll_x() as usize;
    let columns = table.visible_columns();

    queue!(out, Clear(ClearType::All))?;

    let header: String = columns.iter().map(header_cell).collect();
    queue!(
        out,
        MoveTo(0, HEADER_ROW),
        SetAttribute(Attribute::Reverse),
        Print(pad(&clip(&header, scroll_x, width), width)),
        SetAttribute(Attribute::Reset),
    )?;

    let scroll_top = table.scroll_top();
    let rows = table.render_rows(|slot| {
        let line: String = slot
            .cells()
            .map(|(column, text)| fit(text.as_deref().unwrap_or(PLACEHOLDER), column.width))
            .collect();
        (window.body_y(slot.index, scroll_top), slot.is_loaded, line)
    });
    for (y, loaded, line) in rows {
        if !(0..body_rows).contains(&y) {
            continue;
        }
        let attribute = if loaded {
            Attribute::Reset
        } else {
            Attribute::Dim
        };
        queue!(
            out,
            MoveTo(0, HEADER_ROW + 1 + y as u16),
            SetAttribute(attribute),
            Print(clip(&line, scroll_x, width)),
            SetAttribute(Attribute::Reset),
        )?;
    }

    queue!(
        out,
        MoveTo(0, app.height().saturating_sub(1)),
        SetForegroundColor(Color::DarkGrey),
        Print(pad(&clip(&status_line(app), 0, width), width)),
        SetForegroundColor(Color::Reset),
    )?;
    out.flush()
}

fn header_cell(column: &VisibleColumn) -> String {
    let arrow = match column.sort {
        Some(SortDirection::Asc) => " ▲",
        Some(SortDirection::Desc) => " ▼",
        None => "",
    };
    let mut cell: Vec<char> = fit(&format!("{}{}", column.label, arrow), column.width)
        .chars()
        .collect();
    match (column.drop_hint, cell.len()) {
        (Some(DropSide::Before), len) if len > 0 => cell[0] = DROP_MARK,
        (Some(DropSide::After), len) if len > 0 => cell[len - 1] = DROP_MARK,
        _ => {}
    }
    cell.into_iter().collect()
}

fn status_line(app: &App) -> String {
    let table = &app.table;
    let counts = table.counts();
    let range = table.visible_range();
    let mut parts = vec![format!("{}/{} instances", counts.filtered, counts.total)];
    if !range.is_empty() {
        parts.push(format!("rows {}-{}", range.start + 1, range.end));
    }
    if let Some(sort) = table.sort() {
        parts.push(format!("sort {} {}", sort.column_id, sort.direction.as_param()));
    }
    if let Some(filter) = app.filter() {
        parts.push(format!("status={}", filter));
    }
    if let Some(Value::Object(status_counts)) = table.meta().and_then(|m| m.get("status_counts")) {
        let summary: Vec<String> = status_counts
            .iter()
            .map(|(status, count)| format!("{} {}", status, count))
            .collect();
        parts.push(summary.join(" "));
    }
    if let Some(message) = app.message() {
        parts.push(message.to_string());
    }
    parts.push("h hide · a all · x reset · r reload · f filter · q quit".to_string());
    parts.join(" │ ")
}

/// Text fitted to `width - 1` cells, followed by a separator.
fn fit(text: &str, width: u32) -> String {
    let inner = (width as usize).saturating_sub(1);
    let mut cell = pad(&truncate_to_width(text, inner), inner);
    if width > 0 {
        cell.push(SEPARATOR);
    }
    cell
}

fn truncate_to_width(text: &str, max_width: usize) -> String {
    if text.width() <= max_width {
        return text.to_string();
    }
    if max_width == 0 {
        return String::new();
    }

    let target = max_width - 1;
    let mut result = String::new();
    let mut width = 0;
    for ch in text.chars() {
        let ch_width = ch.width().unwrap_or(0);
        if width + ch_width > target {
            break;
        }
        result.push(ch);
        width += ch_width;
    }
    result.push('…');
    result
}

/// The `width` cells of `line` starting at cell `scroll_x`.
fn clip(line: &str, scroll_x: usize, width: usize) -> String {
    let mut result = String::new();
    let mut x = 0;
    for ch in line.chars() {
        let ch_width = ch.width().unwrap_or(0);
        if x >= scroll_x && x + ch_width <= scroll_x + width {
            result.push(ch);
        }
        x += ch_width;
        if x >= scroll_x + width {
            break;
        }
    }
    result
}

/// Pads `text` with spaces to `width` cells.
fn pad(text: &str, width: usize) -> String {
    let fill = width.saturating_sub(text.width());
    format!("{}{}", text, " ".repeat(fill))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fit_truncates_and_separates() {
        assert_eq!(fit("provisioning", 6), "prov…│");
        assert_eq!(fit("ok", 5), "ok  │");
        assert_eq!(fit("x", 0), "");
    }

    #[test]
    fn test_pad_counts_display_width() {
        assert_eq!(pad("▲", 3), "▲  ");
        assert_eq!(pad("toolong", 3), "toolong");
    }

    #[test]
    fn test_clip_scrolls_by_cells() {
        assert_eq!(clip("gpu-12│run│", 4, 4), "12│r");
    }

    #[test]
    fn test_header_marks_drop_side() {
        let column = VisibleColumn {
            id: "status".to_string(),
            label: "Status".to_string(),
            left: 0,
            width: 10,
            sortable: true,
            resizable: true,
            sort: Some(SortDirection::Asc),
            is_row_number: false,
            drop_hint: Some(DropSide::Before),
        };
        assert_eq!(header_cell(&column), "┃tatus ▲ │");
    }
}
