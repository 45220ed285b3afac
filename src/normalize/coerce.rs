//! Per-field coercion of raw upload records into fully populated songs.

use crate::song_store::Song;
use serde_json::{Map, Value};

/// A field that was present in the input but could not be used as-is. The
/// record still goes through with the field defaulted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoercionWarning {
    /// Zero-based position of the record within the batch.
    pub position: usize,
    pub field: &'static str,
    pub reason: String,
}

const RATING_MIN: i64 = 0;
const RATING_MAX: i64 = 5;

fn lookup<'a>(map: &'a Map<String, Value>, aliases: &[&str]) -> Option<&'a Value> {
    aliases
        .iter()
        .find_map(|name| map.get(*name))
        .filter(|v| !v.is_null())
}

fn as_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn as_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}

fn as_i64(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Value::String(s) => {
            let trimmed = s.trim();
            trimmed
                .parse::<i64>()
                .ok()
                .or_else(|| trimmed.parse::<f64>().ok().map(|f| f as i64))
        }
        _ => None,
    }
}

fn push_warning(
    warnings: &mut Vec<CoercionWarning>,
    position: usize,
    field: &'static str,
    value: &Value,
    expected: &str,
) {
    warnings.push(CoercionWarning {
        position,
        field,
        reason: format!("expected a {} value, got {}", expected, value_kind(value)),
    });
}

fn string_field(
    map: &Map<String, Value>,
    aliases: &[&str],
    field: &'static str,
    default: &str,
    position: usize,
    warnings: &mut Vec<CoercionWarning>,
) -> String {
    match lookup(map, aliases) {
        None => default.to_string(),
        Some(v) => match as_string(v) {
            Some(s) => s,
            None => {
                push_warning(warnings, position, field, v, "string");
                default.to_string()
            }
        },
    }
}

fn float_field(
    map: &Map<String, Value>,
    field: &'static str,
    default: f64,
    position: usize,
    warnings: &mut Vec<CoercionWarning>,
) -> f64 {
    match lookup(map, &[field]) {
        None => default,
        Some(v) => match as_f64(v) {
            Some(f) => f,
            None => {
                push_warning(warnings, position, field, v, "numeric");
                default
            }
        },
    }
}

fn int_field(
    map: &Map<String, Value>,
    aliases: &[&str],
    field: &'static str,
    default: i64,
    position: usize,
    warnings: &mut Vec<CoercionWarning>,
) -> i64 {
    match lookup(map, aliases) {
        None => default,
        Some(v) => match as_i64(v) {
            Some(i) => i,
            None => {
                push_warning(warnings, position, field, v, "integer");
                default
            }
        },
    }
}

fn rating_field(
    map: &Map<String, Value>,
    position: usize,
    warnings: &mut Vec<CoercionWarning>,
) -> i64 {
    let Some(v) = lookup(map, &["rating"]) else {
        return 0;
    };
    match as_i64(v) {
        Some(r) if (RATING_MIN..=RATING_MAX).contains(&r) => r,
        Some(r) => {
            warnings.push(CoercionWarning {
                position,
                field: "rating",
                reason: format!("rating {} is outside {}..={}", r, RATING_MIN, RATING_MAX),
            });
            0
        }
        None => {
            push_warning(warnings, position, "rating", v, "integer");
            0
        }
    }
}

/// Coerce one raw record into a [`Song`].
///
/// Missing fields silently take their defaults. Fields that are present but
/// unusable take their defaults too, and produce a warning. Only a missing,
/// empty or unusable id rejects the whole record; the returned error is the
/// rejection reason.
pub fn coerce_record(
    raw: &Value,
    position: usize,
) -> Result<(Song, Vec<CoercionWarning>), String> {
    let map = raw
        .as_object()
        .ok_or_else(|| format!("record is not an object: {}", value_kind(raw)))?;

    let id = match lookup(map, &["id"]) {
        Some(v) => as_string(v).ok_or_else(|| format!("id is not usable: {}", value_kind(v)))?,
        None => return Err("missing id".to_string()),
    };
    if id.is_empty() {
        return Err("empty id".to_string());
    }

    let mut warnings = Vec::new();
    let w = &mut warnings;

    let song = Song {
        id,
        title: string_field(map, &["title"], "title", "Unknown Title", position, w),
        song_class: string_field(map, &["song_class", "class"], "song_class", "", position, w),
        rating: rating_field(map, position, w),
        danceability: float_field(map, "danceability", 0.0, position, w),
        energy: float_field(map, "energy", 0.0, position, w),
        key: int_field(map, &["key"], "key", 0, position, w),
        loudness: float_field(map, "loudness", 0.0, position, w),
        mode: int_field(map, &["mode"], "mode", 0, position, w),
        acousticness: float_field(map, "acousticness", 0.0, position, w),
        instrumentalness: float_field(map, "instrumentalness", 0.0, position, w),
        liveness: float_field(map, "liveness", 0.0, position, w),
        valence: float_field(map, "valence", 0.0, position, w),
        tempo: float_field(map, "tempo", 0.0, position, w),
        duration_ms: int_field(map, &["duration_ms", "duration"], "duration_ms", 0, position, w),
        time_signature: int_field(map, &["time_signature"], "time_signature", 4, position, w),
        num_bars: int_field(map, &["num_bars"], "num_bars", 0, position, w),
        num_sections: int_field(map, &["num_sections"], "num_sections", 0, position, w),
        num_segments: int_field(map, &["num_segments"], "num_segments", 0, position, w),
    };

    Ok((song, warnings))
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
