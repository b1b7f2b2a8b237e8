//! Column definitions, the row trait and the content signature.

use std::cmp::Ordering;
use std::sync::Arc;

use serde::Serialize;

use super::value::SortValue;

/// Id of the optional row-number column. It is always first, never hidden,
/// resized or reordered.
pub const ROW_NUMBER_COLUMN: &str = "__row_number";

/// Default width of the row-number column.
pub const ROW_NUMBER_WIDTH: u32 = 56;

pub const DEFAULT_COLUMN_WIDTH: u32 = 160;
pub const DEFAULT_MIN_WIDTH: u32 = 60;
pub const DEFAULT_MAX_WIDTH: u32 = 800;

/// Custom ascending comparator for a column.
pub type Comparator<R> = Arc<dyn Fn(&R, &R) -> Ordering + Send + Sync>;

/// Trait for rows displayed by a [`Table`](super::Table).
///
/// # Example
///
/// ```ignore
/// impl GridRow for Instance {
///     fn cell(&self, column_id: &str) -> String {
///         match column_id {
///             "status" => self.status.clone(),
///             "cost" => format!("{:.2}", self.cost_per_hour),
///             _ => String::new(),
///         }
///     }
///
///     fn sort_value(&self, column_id: &str) -> SortValue {
///         match column_id {
///             "cost" => self.cost_per_hour.into(),
///             _ => self.cell(column_id).into(),
///         }
///     }
/// }
/// ```
pub trait GridRow: Clone + Send + Sync + 'static {
    /// Display text for the cell in `column_id`.
    fn cell(&self, column_id: &str) -> String;

    /// Value used for client-side sorting. Defaults to the cell text.
    fn sort_value(&self, column_id: &str) -> SortValue {
        SortValue::Text(self.cell(column_id))
    }
}

/// A column definition.
///
/// Definitions may be rebuilt on every frame; only their static metadata
/// (see [`column_signature`]) decides whether stored layout is re-applied.
pub struct ColumnDef<R> {
    pub id: String,
    pub label: String,
    /// Initial width; `None` uses the table default.
    pub width: Option<u32>,
    pub min_width: Option<u32>,
    pub max_width: Option<u32>,
    pub sortable: bool,
    pub resizable: bool,
    pub default_hidden: bool,
    comparator: Option<Comparator<R>>,
}

impl<R> Clone for ColumnDef<R> {
    fn clone(&self) -> Self {
        Self {
            id: self.id.clone(),
            label: self.label.clone(),
            width: self.width,
            min_width: self.min_width,
            max_width: self.max_width,
            sortable: self.sortable,
            resizable: self.resizable,
            default_hidden: self.default_hidden,
            comparator: self.comparator.clone(),
        }
    }
}

impl<R> std::fmt::Debug for ColumnDef<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ColumnDef")
            .field("id", &self.id)
            .field("label", &self.label)
            .field("width", &self.width)
            .field("min_width", &self.min_width)
            .field("max_width", &self.max_width)
            .field("sortable", &self.sortable)
            .field("resizable", &self.resizable)
            .field("default_hidden", &self.default_hidden)
            .field("comparator", &self.comparator.is_some())
            .finish()
    }
}

impl<R> ColumnDef<R> {
    /// Creates a resizable, unsortable, visible column.
    pub fn new(id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            width: None,
            min_width: None,
            max_width: None,
            sortable: false,
            resizable: true,
            default_hidden: false,
            comparator: None,
        }
    }

    pub fn width(mut self, width: u32) -> Self {
        self.width = Some(width);
        self
    }

    pub fn min_width(mut self, width: u32) -> Self {
        self.min_width = Some(width);
        self
    }

    pub fn max_width(mut self, width: u32) -> Self {
        self.max_width = Some(width);
        self
    }

    /// Make the column sortable.
    pub fn sortable(mut self) -> Self {
        self.sortable = true;
        self
    }

    /// Disable resizing.
    pub fn fixed(mut self) -> Self {
        self.resizable = false;
        self
    }

    /// Hide the column unless the user has chosen otherwise.
    pub fn hidden_by_default(mut self) -> Self {
        self.default_hidden = true;
        self
    }

    /// Sort with a custom ascending comparator instead of [`GridRow::sort_value`].
    pub fn compare_with(
        mut self,
        comparator: impl Fn(&R, &R) -> Ordering + Send + Sync + 'static,
    ) -> Self {
        self.comparator = Some(Arc::new(comparator));
        self
    }

    pub fn comparator(&self) -> Option<&Comparator<R>> {
        self.comparator.as_ref()
    }

    /// Resolves this column's width bounds against table-wide defaults.
    pub fn bounds(&self, defaults: WidthBounds) -> WidthBounds {
        let min = self.min_width.unwrap_or(defaults.min);
        let max = self.max_width.unwrap_or(defaults.max).max(min);
        let default = self.width.unwrap_or(defaults.default).clamp(min, max);
        WidthBounds { default, min, max }
    }
}

/// Width bounds for a column after applying table defaults.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WidthBounds {
    pub default: u32,
    pub min: u32,
    pub max: u32,
}

impl Default for WidthBounds {
    fn default() -> Self {
        Self {
            default: DEFAULT_COLUMN_WIDTH,
            min: DEFAULT_MIN_WIDTH,
            max: DEFAULT_MAX_WIDTH,
        }
    }
}

impl WidthBounds {
    pub fn clamp(&self, width: u32) -> u32 {
        width.clamp(self.min, self.max)
    }
}

#[derive(Serialize)]
struct ColumnMeta<'a> {
    id: &'a str,
    label: &'a str,
    width: Option<u32>,
    min_width: Option<u32>,
    max_width: Option<u32>,
    sortable: bool,
    resizable: bool,
    default_hidden: bool,
}

/// Content-derived change key for a column set.
///
/// Built from ids and static metadata only, never from closure identity, so
/// definitions recreated every frame produce the same signature.
pub fn column_signature<R>(columns: &[ColumnDef<R>]) -> String {
    let metas: Vec<_> = columns
        .iter()
        .map(|c| ColumnMeta {
            id: &c.id,
            label: &c.label,
            width: c.width,
            min_width: c.min_width,
            max_width: c.max_width,
            sortable: c.sortable,
            resizable: c.resizable,
            default_hidden: c.default_hidden,
        })
        .collect();
    serde_json::to_string(&metas).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone)]
    struct Row;

    impl GridRow for Row {
        fn cell(&self, _column_id: &str) -> String {
            String::new()
        }
    }

    fn columns() -> Vec<ColumnDef<Row>> {
        vec![
            ColumnDef::new("name", "Name").sortable(),
            ColumnDef::new("status", "Status")
                .width(120)
                .compare_with(|_, _| Ordering::Equal),
        ]
    }

    #[test]
    fn test_signature_ignores_closure_identity() {
        // Two independently built sets carry different closure allocations.
        assert_eq!(column_signature(&columns()), column_signature(&columns()));
    }

    #[test]
    fn test_signature_tracks_metadata() {
        let mut changed = columns();
        changed[1].default_hidden = true;
        assert_ne!(column_signature(&columns()), column_signature(&changed));
    }

    #[test]
    fn test_bounds_clamp() {
        let bounds = WidthBounds {
            default: 100,
            min: 60,
            max: 200,
        };
        assert_eq!(bounds.clamp(10), 60);
        assert_eq!(bounds.clamp(500), 200);
    }

    #[test]
    fn test_column_bounds_override_defaults() {
        let column: ColumnDef<Row> = ColumnDef::new("cost", "Cost").width(20).min_width(40);
        let bounds = column.bounds(WidthBounds::default());
        assert_eq!(bounds.min, 40);
        assert_eq!(bounds.max, DEFAULT_MAX_WIDTH);
        assert_eq!(bounds.default, 40);
    }
}
