//! Normalized cell values used for client-side sorting.

use std::cmp::Ordering;

use chrono::DateTime;
use chrono::Utc;

/// A cell value normalized for comparison.
///
/// Numbers compare numerically, dates by timestamp, booleans as 0/1 and
/// everything else as natural-order text. `Null` is handled by the caller
/// (it always sorts last).
#[derive(Debug, Clone, PartialEq, Default)]
pub enum SortValue {
    #[default]
    Null,
    Bool(bool),
    Number(f64),
    Date(DateTime<Utc>),
    Text(String),
}

impl SortValue {
    /// Returns `true` if this is a null value.
    pub fn is_null(&self) -> bool {
        matches!(self, SortValue::Null)
    }

    /// Numeric key for numbers, dates and booleans.
    fn numeric_key(&self) -> Option<f64> {
        match self {
            SortValue::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            SortValue::Number(n) => Some(*n),
            SortValue::Date(d) => Some(d.timestamp_millis() as f64),
            _ => None,
        }
    }

    fn text_key(&self) -> String {
        match self {
            SortValue::Null => String::new(),
            SortValue::Bool(b) => b.to_string(),
            SortValue::Number(n) => n.to_string(),
            SortValue::Date(d) => d.to_rfc3339(),
            SortValue::Text(s) => s.clone(),
        }
    }

    /// Compares two non-null values in ascending order.
    ///
    /// Mixed kinds fall back to comparing their text forms.
    pub fn compare(&self, other: &SortValue) -> Ordering {
        match (self.numeric_key(), other.numeric_key()) {
            (Some(a), Some(b)) => a.total_cmp(&b),
            _ => match (self, other) {
                (SortValue::Text(a), SortValue::Text(b)) => natural_cmp(a, b),
                _ => natural_cmp(&self.text_key(), &other.text_key()),
            },
        }
    }
}

impl From<bool> for SortValue {
    fn from(value: bool) -> Self {
        SortValue::Bool(value)
    }
}

macro_rules! impl_from_number {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for SortValue {
                fn from(value: $ty) -> Self {
                    SortValue::Number(value as f64)
                }
            }
        )*
    };
}

impl_from_number!(i32, i64, u32, u64, usize, f32, f64);

impl From<&str> for SortValue {
    fn from(value: &str) -> Self {
        SortValue::Text(value.to_string())
    }
}

impl From<String> for SortValue {
    fn from(value: String) -> Self {
        SortValue::Text(value)
    }
}

impl From<DateTime<Utc>> for SortValue {
    fn from(value: DateTime<Utc>) -> Self {
        SortValue::Date(value)
    }
}

impl<T: Into<SortValue>> From<Option<T>> for SortValue {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(SortValue::Null)
    }
}

/// Natural-order string comparison.
///
/// Digit runs compare by numeric value (`"gpu-2" < "gpu-10"`), other
/// characters compare case-insensitively. Ties are broken by a plain
/// comparison so the order is total.
pub fn natural_cmp(a: &str, b: &str) -> Ordering {
    let mut left = a.chars().peekable();
    let mut right = b.chars().peekable();

    loop {
        match (left.peek().copied(), right.peek().copied()) {
            (None, None) => return a.cmp(b),
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(l), Some(r)) if l.is_ascii_digit() && r.is_ascii_digit() => {
                let l_run = take_digits(&mut left);
                let r_run = take_digits(&mut right);
                let ord = compare_digit_runs(&l_run, &r_run);
                if ord != Ordering::Equal {
                    return ord;
                }
            }
            (Some(l), Some(r)) => {
                let ord = l.to_lowercase().cmp(r.to_lowercase());
                if ord != Ordering::Equal {
                    return ord;
                }
                left.next();
                right.next();
            }
        }
    }
}

fn take_digits(chars: &mut std::iter::Peekable<std::str::Chars<'_>>) -> String {
    let mut run = String::new();
    while let Some(c) = chars.peek().copied() {
        if !c.is_ascii_digit() {
            break;
        }
        run.push(c);
        chars.next();
    }
    run
}

fn compare_digit_runs(a: &str, b: &str) -> Ordering {
    let a = a.trim_start_matches('0');
    let b = b.trim_start_matches('0');
    a.len().cmp(&b.len()).then_with(|| a.cmp(b))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_natural_order_numbers_in_text() {
        assert_eq!(natural_cmp("gpu-2", "gpu-10"), Ordering::Less);
        assert_eq!(natural_cmp("gpu-10", "gpu-9"), Ordering::Greater);
        assert_eq!(natural_cmp("zone-007", "zone-7"), Ordering::Less);
    }

    #[test]
    fn test_natural_order_ignores_case_first() {
        assert_eq!(natural_cmp("alpha", "Beta"), Ordering::Less);
        assert_eq!(natural_cmp("Alpha", "alpha").is_ne(), true);
    }

    #[test]
    fn test_numbers_compare_numerically() {
        let a = SortValue::from(9);
        let b = SortValue::from(10.5);
        assert_eq!(a.compare(&b), Ordering::Less);
    }

    #[test]
    fn test_dates_compare_by_timestamp() {
        let early = SortValue::from(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap());
        let late = SortValue::from(Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap());
        assert_eq!(early.compare(&late), Ordering::Less);
    }

    #[test]
    fn test_bools_compare_as_numbers() {
        assert_eq!(
            SortValue::from(false).compare(&SortValue::from(true)),
            Ordering::Less
        );
    }

    #[test]
    fn test_option_maps_to_null() {
        assert!(SortValue::from(None::<i32>).is_null());
        assert_eq!(SortValue::from(Some("x")), SortValue::Text("x".into()));
    }
}
