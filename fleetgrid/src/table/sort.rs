//! Sort intent: direction, per-column tri-state cycle and stable client sort.

use std::cmp::Ordering;

use serde::Deserialize;
use serde::Serialize;

use super::column::{ColumnDef, GridRow};

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    /// Query parameter value (`"asc"` / `"desc"`).
    pub fn as_param(&self) -> &'static str {
        match self {
            SortDirection::Asc => "asc",
            SortDirection::Desc => "desc",
        }
    }

    /// Parses a query parameter value; anything but `desc` is ascending.
    pub fn from_param(value: &str) -> Self {
        if value.trim().eq_ignore_ascii_case("desc") {
            SortDirection::Desc
        } else {
            SortDirection::Asc
        }
    }

    /// Parses `"asc"`/`"desc"` strictly.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "asc" => Some(SortDirection::Asc),
            "desc" => Some(SortDirection::Desc),
            _ => None,
        }
    }

    pub fn reverse(&self) -> Self {
        match self {
            SortDirection::Asc => SortDirection::Desc,
            SortDirection::Desc => SortDirection::Asc,
        }
    }
}

/// A single-column sort.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SortSpec {
    pub column_id: String,
    pub direction: SortDirection,
}

impl SortSpec {
    pub fn new(column_id: impl Into<String>, direction: SortDirection) -> Self {
        Self {
            column_id: column_id.into(),
            direction,
        }
    }

    pub fn asc(column_id: impl Into<String>) -> Self {
        Self::new(column_id, SortDirection::Asc)
    }

    pub fn desc(column_id: impl Into<String>) -> Self {
        Self::new(column_id, SortDirection::Desc)
    }

    /// Server sort parameters: `sort_by` and `sort_dir`.
    pub fn query_params(&self) -> [(&'static str, String); 2] {
        [
            ("sort_by", self.column_id.clone()),
            ("sort_dir", self.direction.as_param().to_string()),
        ]
    }

    /// Stable textual key, used in query identities.
    pub fn key(&self) -> String {
        format!("{}:{}", self.column_id, self.direction.as_param())
    }
}

/// Where sorting happens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortMode {
    /// Rows are sorted in memory before windowing.
    #[default]
    Client,
    /// Sort changes are only announced; the caller re-queries.
    Server,
    /// Headers are not sortable.
    None,
}

/// The sequence of states a column steps through on repeated clicks.
///
/// `None` entries stand for "unsorted". The default is
/// `[asc, desc, unsorted]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortCycle(Vec<Option<SortDirection>>);

impl Default for SortCycle {
    fn default() -> Self {
        Self(vec![
            Some(SortDirection::Asc),
            Some(SortDirection::Desc),
            None,
        ])
    }
}

impl SortCycle {
    /// Creates a cycle from explicit steps. An empty list yields the default.
    pub fn new(steps: impl IntoIterator<Item = Option<SortDirection>>) -> Self {
        let steps: Vec<_> = steps.into_iter().collect();
        if steps.is_empty() {
            Self::default()
        } else {
            Self(steps)
        }
    }

    pub fn steps(&self) -> &[Option<SortDirection>] {
        &self.0
    }

    /// The sort that follows a click on `column_id` given the current sort.
    ///
    /// A column that is not the current sort column starts at the first
    /// sorted step after the unsorted position.
    pub fn next(&self, current: Option<&SortSpec>, column_id: &str) -> Option<SortSpec> {
        let position = match current {
            Some(spec) if spec.column_id == column_id => {
                self.0.iter().position(|step| *step == Some(spec.direction))
            }
            _ => None,
        };

        let next = match position {
            Some(i) => self.0[(i + 1) % self.0.len()],
            None => self.first_from_unsorted(),
        };
        next.map(|direction| SortSpec::new(column_id, direction))
    }

    fn first_from_unsorted(&self) -> Option<SortDirection> {
        let len = self.0.len();
        let start = self
            .0
            .iter()
            .position(Option::is_none)
            .map(|i| i + 1)
            .unwrap_or(0);
        (0..len).find_map(|offset| self.0[(start + offset) % len])
    }
}

/// Stable-sorts `rows` by `spec`.
///
/// Null sort values always go last, whatever the direction. A column's
/// custom comparator is used when present, otherwise normalized values are
/// compared.
pub fn sort_rows<R: GridRow>(rows: &mut [R], spec: &SortSpec, columns: &[ColumnDef<R>]) {
    let column = columns.iter().find(|c| c.id == spec.column_id);
    let comparator = column.and_then(|c| c.comparator());

    rows.sort_by(|a, b| {
        let left = a.sort_value(&spec.column_id);
        let right = b.sort_value(&spec.column_id);
        match (left.is_null(), right.is_null()) {
            (true, true) => return Ordering::Equal,
            (true, false) => return Ordering::Greater,
            (false, true) => return Ordering::Less,
            (false, false) => {}
        }

        let ord = match comparator {
            Some(compare) => compare(a, b),
            None => left.compare(&right),
        };
        match spec.direction {
            SortDirection::Asc => ord,
            SortDirection::Desc => ord.reverse(),
        }
    });
}

/// Returns a sorted copy of `rows`.
pub fn sorted<R: GridRow>(rows: &[R], spec: &SortSpec, columns: &[ColumnDef<R>]) -> Vec<R> {
    let mut rows = rows.to_vec();
    sort_rows(&mut rows, spec, columns);
    rows
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_cycle_steps_through_three_states() {
        let cycle = SortCycle::default();
        let first = cycle.next(None, "status");
        assert_eq!(first, Some(SortSpec::asc("status")));
        let second = cycle.next(first.as_ref(), "status");
        assert_eq!(second, Some(SortSpec::desc("status")));
        let third = cycle.next(second.as_ref(), "status");
        assert_eq!(third, None);
    }

    #[test]
    fn test_other_column_restarts_cycle() {
        let cycle = SortCycle::default();
        let current = SortSpec::desc("status");
        assert_eq!(
            cycle.next(Some(&current), "region"),
            Some(SortSpec::asc("region"))
        );
    }

    #[test]
    fn test_custom_cycle_order() {
        let cycle = SortCycle::new([Some(SortDirection::Desc), Some(SortDirection::Asc), None]);
        let first = cycle.next(None, "cost");
        assert_eq!(first, Some(SortSpec::desc("cost")));
        assert_eq!(cycle.next(first.as_ref(), "cost"), Some(SortSpec::asc("cost")));
    }

    #[test]
    fn test_cycle_without_unsorted_state_wraps() {
        let cycle = SortCycle::new([Some(SortDirection::Asc), Some(SortDirection::Desc)]);
        let desc = SortSpec::desc("name");
        assert_eq!(cycle.next(Some(&desc), "name"), Some(SortSpec::asc("name")));
    }

    #[test]
    fn test_direction_params() {
        assert_eq!(SortDirection::from_param("DESC"), SortDirection::Desc);
        assert_eq!(SortDirection::from_param("bogus"), SortDirection::Asc);
        let params = SortSpec::desc("created_at").query_params();
        assert_eq!(params[0], ("sort_by", "created_at".to_string()));
        assert_eq!(params[1], ("sort_dir", "desc".to_string()));
    }

    #[test]
    fn test_spec_serializes_camel_case() {
        let json = serde_json::to_string(&SortSpec::asc("status")).unwrap();
        assert_eq!(json, r#"{"columnId":"status","direction":"asc"}"#);
    }
}
