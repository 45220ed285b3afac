//! Normalization of heterogeneous upload payloads into song records.
//!
//! The pipeline has three steps: detect the payload shape, extract an ordered
//! sequence of raw records, then coerce each record field by field. Shape
//! detection and coercion live in their own modules; this module ties them
//! together.

mod coerce;
mod shape;

pub use coerce::{coerce_record, CoercionWarning};
pub use shape::{detect_shape, UploadShape};

use serde_json::{Map, Value};
use std::collections::BTreeMap;
use tracing::warn;

/// Extract the ordered raw records from an upload payload.
///
/// Returns `None` when the payload has no recognizable shape. Row-oriented
/// payloads keep their order; column-oriented payloads are ordered by
/// ascending numeric row index.
pub fn extract_records(data: &Value) -> Option<Vec<Value>> {
    match (detect_shape(data), data) {
        (UploadShape::Invalid, _) => None,
        (UploadShape::ColumnOriented, Value::Object(map)) => Some(columns_to_records(map)),
        (UploadShape::RowOriented, Value::Array(items)) => Some(items.clone()),
        (UploadShape::RowOriented, Value::Object(map)) => match map.get("songs") {
            Some(Value::Array(items)) => Some(items.clone()),
            _ => Some(vec![data.clone()]),
        },
        _ => None,
    }
}

/// Pivot a column-oriented payload into row records.
///
/// The row set is the union of every column's indices, so a record missing
/// from one column still comes through with that field absent. Indices that
/// do not parse as integers are skipped.
fn columns_to_records(columns: &Map<String, Value>) -> Vec<Value> {
    let mut rows: BTreeMap<i64, Map<String, Value>> = BTreeMap::new();

    for (field, column) in columns {
        let Some(cells) = column.as_object() else {
            continue;
        };
        for (index_key, cell) in cells {
            match index_key.trim().parse::<i64>() {
                Ok(index) => {
                    rows.entry(index)
                        .or_default()
                        .insert(field.clone(), cell.clone());
                }
                Err(_) => {
                    warn!(
                        "Skipping non-numeric row index {:?} in column {:?}",
                        index_key, field
                    );
                }
            }
        }
    }

    rows.into_values().map(Value::Object).collect()
}
