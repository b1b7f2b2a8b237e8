//! The stored layout record and its defensive decoding.

use std::collections::BTreeMap;

use log::{debug, warn};
use serde_json::{Map, Value};

use crate::error::StoreError;
use crate::table::{SortDirection, SortSpec};

/// Version written into every record.
pub const RECORD_VERSION: u64 = 1;

/// A stored table layout. Absent fields fall back to column defaults.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LayoutRecord {
    pub order: Option<Vec<String>>,
    pub hidden: Option<Vec<String>>,
    pub widths: Option<BTreeMap<String, u32>>,
    /// `Some(None)` records an explicit "unsorted" choice.
    pub sort: Option<Option<SortSpec>>,
}

impl LayoutRecord {
    /// Encodes the full record, version included.
    pub fn to_json(&self) -> Value {
        let mut map = Map::new();
        map.insert("v".into(), Value::from(RECORD_VERSION));
        if let Some(order) = &self.order {
            map.insert("order".into(), Value::from(order.clone()));
        }
        if let Some(hidden) = &self.hidden {
            map.insert("hidden".into(), Value::from(hidden.clone()));
        }
        if let Some(widths) = &self.widths {
            let widths: Map<String, Value> = widths
                .iter()
                .map(|(id, width)| (id.clone(), Value::from(*width)))
                .collect();
            map.insert("widths".into(), Value::Object(widths));
        }
        if let Some(sort) = &self.sort {
            let sort = match sort {
                Some(spec) => serde_json::json!({
                    "columnId": spec.column_id,
                    "direction": spec.direction.as_param(),
                }),
                None => Value::Null,
            };
            map.insert("sort".into(), sort);
        }
        Value::Object(map)
    }

    /// Decodes a record, dropping every field that fails validation.
    ///
    /// Never fails: anything that is not a JSON object yields an empty
    /// record.
    pub fn from_json(value: &Value) -> Self {
        let Some(map) = value.as_object() else {
            warn!("ignoring stored layout: not an object");
            return Self::default();
        };

        match map.get("v") {
            None => {}
            Some(v) if v.as_u64() == Some(RECORD_VERSION) => {}
            Some(v) => debug!("stored layout has version {}, reading known fields", v),
        }

        Self {
            order: field(map, "order", string_list),
            hidden: field(map, "hidden", string_list),
            widths: field(map, "widths", width_map),
            sort: field(map, "sort", sort_value),
        }
    }

    /// Decodes a record from raw bytes. Invalid JSON yields an empty record.
    pub fn from_slice(bytes: &[u8]) -> Self {
        match serde_json::from_slice::<Value>(bytes) {
            Ok(value) => Self::from_json(&value),
            Err(e) => {
                warn!("ignoring stored layout: {}", e);
                Self::default()
            }
        }
    }

    pub fn to_vec(&self) -> Result<Vec<u8>, StoreError> {
        Ok(serde_json::to_vec(&self.to_json())?)
    }

    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

fn field<T>(map: &Map<String, Value>, name: &str, parse: fn(&Value) -> Option<T>) -> Option<T> {
    let value = map.get(name)?;
    let parsed = parse(value);
    if parsed.is_none() {
        warn!("dropping stored layout field {:?}: unexpected shape", name);
    }
    parsed
}

fn string_list(value: &Value) -> Option<Vec<String>> {
    value
        .as_array()?
        .iter()
        .map(|item| item.as_str().map(str::to_string))
        .collect()
}

fn width_map(value: &Value) -> Option<BTreeMap<String, u32>> {
    let widths = value
        .as_object()?
        .iter()
        .filter_map(|(id, width)| {
            let width = width.as_f64().filter(|w| w.is_finite() && *w >= 0.0)?;
            Some((id.clone(), width.round().min(u32::MAX as f64) as u32))
        })
        .collect();
    Some(widths)
}

fn sort_value(value: &Value) -> Option<Option<SortSpec>> {
    if value.is_null() {
        return Some(None);
    }
    let map = value.as_object()?;
    let column_id = map.get("columnId")?.as_str()?;
    let direction = SortDirection::parse(map.get("direction")?.as_str()?)?;
    if column_id.is_empty() {
        return None;
    }
    Some(Some(SortSpec::new(column_id, direction)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_full_record_encoding() {
        let record = LayoutRecord {
            order: Some(vec!["name".into(), "status".into()]),
            hidden: Some(vec!["status".into()]),
            widths: Some(BTreeMap::from([("name".to_string(), 200)])),
            sort: Some(Some(SortSpec::desc("name"))),
        };
        assert_eq!(
            record.to_json(),
            json!({
                "v": 1,
                "order": ["name", "status"],
                "hidden": ["status"],
                "widths": {"name": 200},
                "sort": {"columnId": "name", "direction": "desc"},
            })
        );
        assert_eq!(LayoutRecord::from_json(&record.to_json()), record);
    }

    #[test]
    fn test_explicit_unsorted_survives() {
        let record = LayoutRecord::from_json(&json!({"v": 1, "sort": null}));
        assert_eq!(record.sort, Some(None));
    }

    #[test]
    fn test_bad_fields_are_dropped_individually() {
        let record = LayoutRecord::from_json(&json!({
            "v": 1,
            "order": ["name", 3],
            "hidden": "status",
            "widths": {"name": 180, "status": "wide", "region": -4},
            "sort": {"columnId": "name", "direction": "sideways"},
        }));
        assert_eq!(record.order, None);
        assert_eq!(record.hidden, None);
        assert_eq!(
            record.widths,
            Some(BTreeMap::from([("name".to_string(), 180)]))
        );
        assert_eq!(record.sort, None);
    }

    #[test]
    fn test_foreign_shapes_yield_empty_record() {
        assert!(LayoutRecord::from_json(&json!([1, 2, 3])).is_empty());
        assert!(LayoutRecord::from_slice(b"not json").is_empty());
    }
}
