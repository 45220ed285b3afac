//! Shape detection for uploaded catalog payloads.
//!
//! Uploads arrive in two layouts. Column-oriented payloads map field names to
//! `{row index -> value}` objects, the way tabular tools serialize frames.
//! Row-oriented payloads are arrays of record objects, possibly nested under
//! a `songs` key, or a single bare record object.

use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadShape {
    ColumnOriented,
    RowOriented,
    Invalid,
}

/// Classify a parsed upload payload.
///
/// Column orientation is checked first: a non-empty object whose values are
/// all objects. Everything it does not claim is tried as row-oriented, and a
/// lone flat object counts as a single-record batch. Empty objects and empty
/// arrays carry no records and are invalid.
pub fn detect_shape(data: &Value) -> UploadShape {
    match data {
        Value::Object(map) => {
            if map.is_empty() {
                return UploadShape::Invalid;
            }
            if map.values().all(|v| v.is_object()) {
                return UploadShape::ColumnOriented;
            }
            if let Some(songs) = map.get("songs") {
                return match songs {
                    Value::Array(items) if !items.is_empty() => UploadShape::RowOriented,
                    _ => UploadShape::Invalid,
                };
            }
            // A flat object is a single record.
            UploadShape::RowOriented
        }
        Value::Array(items) => {
            if items.is_empty() {
                UploadShape::Invalid
            } else {
                UploadShape::RowOriented
            }
        }
        _ => UploadShape::Invalid,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn column_oriented_when_all_values_are_objects() {
        let data = json!({
            "id": {"0": "a", "1": "b"},
            "title": {"0": "First", "1": "Second"},
        });
        assert_eq!(detect_shape(&data), UploadShape::ColumnOriented);
    }

    #[test]
    fn array_of_records_is_row_oriented() {
        let data = json!([{"id": "a"}, {"id": "b"}]);
        assert_eq!(detect_shape(&data), UploadShape::RowOriented);
    }

    #[test]
    fn songs_wrapper_is_row_oriented() {
        let data = json!({"songs": [{"id": "a"}]});
        assert_eq!(detect_shape(&data), UploadShape::RowOriented);
    }

    #[test]
    fn flat_object_is_a_single_record_batch() {
        let data = json!({"id": "a", "title": "Solo"});
        assert_eq!(detect_shape(&data), UploadShape::RowOriented);
    }

    #[test]
    fn empty_containers_are_invalid() {
        assert_eq!(detect_shape(&json!({})), UploadShape::Invalid);
        assert_eq!(detect_shape(&json!([])), UploadShape::Invalid);
        assert_eq!(detect_shape(&json!({"songs": []})), UploadShape::Invalid);
    }

    #[test]
    fn scalars_are_invalid() {
        assert_eq!(detect_shape(&json!(42)), UploadShape::Invalid);
        assert_eq!(detect_shape(&json!("songs")), UploadShape::Invalid);
        assert_eq!(detect_shape(&Value::Null), UploadShape::Invalid);
    }

    #[test]
    fn songs_key_with_non_array_value_is_invalid() {
        let data = json!({"songs": "not a list"});
        assert_eq!(detect_shape(&data), UploadShape::Invalid);
    }
}
