//! Column layout: order, visibility and user-chosen widths.

use std::collections::{BTreeMap, BTreeSet, HashSet};

use crate::prefs::LayoutRecord;

use super::column::{ColumnDef, ROW_NUMBER_COLUMN, WidthBounds};
use super::gesture::DropSide;

/// Effective column layout.
///
/// `order` is a permutation of every column id (hidden ones included) with
/// the row-number column pinned first when enabled. `widths` only holds
/// widths the user chose; other columns use their definition default.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ColumnLayout {
    order: Vec<String>,
    hidden: BTreeSet<String>,
    widths: BTreeMap<String, u32>,
}

impl ColumnLayout {
    /// Layout straight from the column definitions.
    pub fn defaults<R>(columns: &[ColumnDef<R>], row_numbers: bool) -> Self {
        let mut order = Vec::with_capacity(columns.len() + 1);
        if row_numbers {
            order.push(ROW_NUMBER_COLUMN.to_string());
        }
        order.extend(live_ids(columns));

        let hidden = columns
            .iter()
            .filter(|c| c.default_hidden && c.id != ROW_NUMBER_COLUMN)
            .map(|c| c.id.clone())
            .collect();

        Self {
            order,
            hidden,
            widths: BTreeMap::new(),
        }
    }

    /// Merges a stored record against the live column set.
    ///
    /// Unknown stored ids are dropped and new columns are appended in
    /// definition order. A column the record already knew about keeps the
    /// stored visibility; a new one follows its `default_hidden` flag.
    /// Stored widths are clamped into each column's bounds.
    pub fn reconcile<R>(
        record: &LayoutRecord,
        columns: &[ColumnDef<R>],
        row_numbers: bool,
        defaults: WidthBounds,
    ) -> Self {
        let live: Vec<String> = live_ids(columns);
        let live_set: HashSet<&str> = live.iter().map(String::as_str).collect();

        let mut order = Vec::with_capacity(live.len() + 1);
        if row_numbers {
            order.push(ROW_NUMBER_COLUMN.to_string());
        }
        let mut placed: HashSet<&str> = HashSet::new();
        for id in record.order.iter().flatten() {
            if live_set.contains(id.as_str()) && placed.insert(id.as_str()) {
                order.push(id.clone());
            }
        }
        for id in &live {
            if placed.insert(id.as_str()) {
                order.push(id.clone());
            }
        }

        let stored_hidden: Option<HashSet<&str>> = record
            .hidden
            .as_ref()
            .map(|ids| ids.iter().map(String::as_str).collect());
        let known: HashSet<&str> = record
            .order
            .iter()
            .flatten()
            .chain(record.hidden.iter().flatten())
            .map(String::as_str)
            .collect();

        let hidden = columns
            .iter()
            .filter(|c| c.id != ROW_NUMBER_COLUMN)
            .filter(|c| match &stored_hidden {
                Some(stored) if known.contains(c.id.as_str()) => stored.contains(c.id.as_str()),
                _ => c.default_hidden,
            })
            .map(|c| c.id.clone())
            .collect();

        let widths = record
            .widths
            .iter()
            .flatten()
            .filter_map(|(id, width)| {
                let column = columns
                    .iter()
                    .find(|c| &c.id == id && c.resizable && c.id != ROW_NUMBER_COLUMN)?;
                Some((id.clone(), column.bounds(defaults).clamp(*width)))
            })
            .collect();

        Self {
            order,
            hidden,
            widths,
        }
    }

    pub fn order(&self) -> &[String] {
        &self.order
    }

    pub fn hidden(&self) -> &BTreeSet<String> {
        &self.hidden
    }

    pub fn widths(&self) -> &BTreeMap<String, u32> {
        &self.widths
    }

    pub fn contains(&self, id: &str) -> bool {
        self.order.iter().any(|c| c == id)
    }

    pub fn is_hidden(&self, id: &str) -> bool {
        self.hidden.contains(id)
    }

    /// Ids in display order, hidden columns skipped.
    pub fn visible_ids(&self) -> impl Iterator<Item = &str> {
        self.order
            .iter()
            .map(String::as_str)
            .filter(|id| !self.hidden.contains(*id))
    }

    /// Stored width for `id`, if the user changed it.
    pub fn width(&self, id: &str) -> Option<u32> {
        self.widths.get(id).copied()
    }

    /// Moves `source` next to `target`. Returns `true` if the order changed.
    ///
    /// The row-number column can be neither moved nor displaced from the
    /// front.
    pub fn move_column(&mut self, source: &str, target: &str, side: DropSide) -> bool {
        if source == target || source == ROW_NUMBER_COLUMN {
            return false;
        }
        if target == ROW_NUMBER_COLUMN && side == DropSide::Before {
            return false;
        }
        let Some(from) = self.order.iter().position(|id| id == source) else {
            return false;
        };
        if !self.contains(target) {
            return false;
        }

        let before = self.order.clone();
        let moved = self.order.remove(from);
        // Position of the target after the removal shift.
        let Some(to) = self.order.iter().position(|id| id == target) else {
            self.order = before;
            return false;
        };
        let insert_at = match side {
            DropSide::Before => to,
            DropSide::After => to + 1,
        };
        self.order.insert(insert_at, moved);
        self.order != before
    }

    /// Shows or hides a column. The row-number column is always visible.
    pub fn set_hidden(&mut self, id: &str, hidden: bool) -> bool {
        if id == ROW_NUMBER_COLUMN || !self.contains(id) {
            return false;
        }
        if hidden {
            self.hidden.insert(id.to_string())
        } else {
            self.hidden.remove(id)
        }
    }

    /// Unhides every column. Returns `true` if anything changed.
    pub fn show_all(&mut self) -> bool {
        let changed = !self.hidden.is_empty();
        self.hidden.clear();
        changed
    }

    /// Records a user-chosen width, clamped into `bounds`.
    pub fn set_width(&mut self, id: &str, width: u32, bounds: WidthBounds) -> u32 {
        let width = bounds.clamp(width);
        if id != ROW_NUMBER_COLUMN && self.contains(id) {
            self.widths.insert(id.to_string(), width);
        }
        width
    }

    /// The record persisted for this layout. Always complete.
    pub fn to_record(&self, sort: Option<super::SortSpec>) -> LayoutRecord {
        LayoutRecord {
            order: Some(
                self.order
                    .iter()
                    .filter(|id| *id != ROW_NUMBER_COLUMN)
                    .cloned()
                    .collect(),
            ),
            hidden: Some(self.hidden.iter().cloned().collect()),
            widths: Some(self.widths.clone()),
            sort: Some(sort),
        }
    }
}

fn live_ids<R>(columns: &[ColumnDef<R>]) -> Vec<String> {
    let mut seen = HashSet::new();
    columns
        .iter()
        .filter(|c| c.id != ROW_NUMBER_COLUMN && seen.insert(c.id.as_str()))
        .map(|c| c.id.clone())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::SortSpec;

    fn columns() -> Vec<ColumnDef<()>> {
        vec![
            ColumnDef::new("name", "Name"),
            ColumnDef::new("status", "Status"),
            ColumnDef::new("region", "Region").hidden_by_default(),
            ColumnDef::new("cost", "Cost").max_width(300),
        ]
    }

    fn ids(layout: &ColumnLayout) -> Vec<&str> {
        layout.order().iter().map(String::as_str).collect()
    }

    #[test]
    fn test_defaults_pin_row_number() {
        let layout = ColumnLayout::defaults(&columns(), true);
        assert_eq!(
            ids(&layout),
            vec![ROW_NUMBER_COLUMN, "name", "status", "region", "cost"]
        );
        assert!(layout.is_hidden("region"));
    }

    #[test]
    fn test_reconcile_drops_unknown_and_appends_new() {
        let record = LayoutRecord {
            order: Some(vec!["cost".into(), "gone".into(), "name".into()]),
            ..Default::default()
        };
        let layout = ColumnLayout::reconcile(&record, &columns(), true, WidthBounds::default());
        assert_eq!(
            ids(&layout),
            vec![ROW_NUMBER_COLUMN, "cost", "name", "status", "region"]
        );
    }

    #[test]
    fn test_reconcile_respects_explicit_visibility() {
        // "region" was known and shown; "status" was known and hidden.
        let record = LayoutRecord {
            order: Some(vec!["name".into(), "status".into(), "region".into()]),
            hidden: Some(vec!["status".into()]),
            ..Default::default()
        };
        let layout = ColumnLayout::reconcile(&record, &columns(), false, WidthBounds::default());
        assert!(!layout.is_hidden("region"));
        assert!(layout.is_hidden("status"));
        assert!(!layout.is_hidden("cost"));
    }

    #[test]
    fn test_reconcile_new_column_uses_default_hidden() {
        let record = LayoutRecord {
            order: Some(vec!["name".into(), "status".into(), "cost".into()]),
            hidden: Some(vec![]),
            ..Default::default()
        };
        let layout = ColumnLayout::reconcile(&record, &columns(), false, WidthBounds::default());
        assert!(layout.is_hidden("region"));
    }

    #[test]
    fn test_reconcile_clamps_widths() {
        let record = LayoutRecord {
            widths: Some(BTreeMap::from([
                ("cost".to_string(), 900),
                ("name".to_string(), 5),
                (ROW_NUMBER_COLUMN.to_string(), 300),
            ])),
            ..Default::default()
        };
        let layout = ColumnLayout::reconcile(&record, &columns(), true, WidthBounds::default());
        assert_eq!(layout.width("cost"), Some(300));
        assert_eq!(layout.width("name"), Some(60));
        assert_eq!(layout.width(ROW_NUMBER_COLUMN), None);
    }

    #[test]
    fn test_move_column_accounts_for_removal_shift() {
        let mut layout = ColumnLayout::defaults(&columns(), false);
        assert!(layout.move_column("name", "region", DropSide::After));
        assert_eq!(ids(&layout), vec!["status", "region", "name", "cost"]);

        assert!(layout.move_column("cost", "status", DropSide::Before));
        assert_eq!(ids(&layout), vec!["cost", "status", "region", "name"]);

        // Already in place.
        assert!(!layout.move_column("status", "region", DropSide::Before));
    }

    #[test]
    fn test_row_number_stays_first() {
        let mut layout = ColumnLayout::defaults(&columns(), true);
        assert!(!layout.move_column(ROW_NUMBER_COLUMN, "cost", DropSide::After));
        assert!(!layout.move_column("cost", ROW_NUMBER_COLUMN, DropSide::Before));
        assert!(layout.move_column("cost", ROW_NUMBER_COLUMN, DropSide::After));
        assert_eq!(ids(&layout)[0], ROW_NUMBER_COLUMN);
        assert_eq!(ids(&layout)[1], "cost");

        assert!(!layout.set_hidden(ROW_NUMBER_COLUMN, true));
        assert_eq!(
            layout.set_width(ROW_NUMBER_COLUMN, 200, WidthBounds::default()),
            200
        );
        assert_eq!(layout.width(ROW_NUMBER_COLUMN), None);
    }

    #[test]
    fn test_record_excludes_row_number() {
        let layout = ColumnLayout::defaults(&columns(), true);
        let record = layout.to_record(Some(SortSpec::asc("name")));
        assert_eq!(
            record.order.unwrap(),
            vec!["name", "status", "region", "cost"]
        );
        assert_eq!(record.hidden.unwrap(), vec!["region"]);
        assert_eq!(record.sort, Some(Some(SortSpec::asc("name"))));
    }
}
