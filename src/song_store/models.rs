//! Data models for the song catalog.

use serde::{Deserialize, Serialize};

/// A fully populated song record. Every field has a concrete value; the
/// normalization layer fills in defaults before a record ever reaches storage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Song {
    /// Business identifier, unique across the catalog. Upsert key.
    pub id: String,
    pub title: String,
    pub song_class: String,
    /// User rating, always within 0..=5.
    pub rating: i64,
    pub danceability: f64,
    pub energy: f64,
    pub key: i64,
    pub loudness: f64,
    pub mode: i64,
    pub acousticness: f64,
    pub instrumentalness: f64,
    pub liveness: f64,
    pub valence: f64,
    pub tempo: f64,
    pub duration_ms: i64,
    pub time_signature: i64,
    pub num_bars: i64,
    pub num_sections: i64,
    pub num_segments: i64,
}

impl Default for Song {
    fn default() -> Self {
        Song {
            id: String::new(),
            title: String::new(),
            song_class: String::new(),
            rating: 0,
            danceability: 0.0,
            energy: 0.0,
            key: 0,
            loudness: 0.0,
            mode: 0,
            acousticness: 0.0,
            instrumentalness: 0.0,
            liveness: 0.0,
            valence: 0.0,
            tempo: 0.0,
            duration_ms: 0,
            time_signature: 4,
            num_bars: 0,
            num_sections: 0,
            num_segments: 0,
        }
    }
}

/// Outcome of a single-record upsert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Created,
    Updated,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortOrder {
    pub fn from_param(s: &str) -> Option<SortOrder> {
        match s {
            "asc" => Some(SortOrder::Asc),
            "desc" => Some(SortOrder::Desc),
            _ => None,
        }
    }

    pub fn to_sql(self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }
}

/// Columns accepted for `sort_by`. Anything else falls back to insertion
/// order rather than being interpolated into SQL.
pub const SORTABLE_COLUMNS: &[&str] = &[
    "id",
    "title",
    "song_class",
    "rating",
    "danceability",
    "energy",
    "key",
    "loudness",
    "mode",
    "acousticness",
    "instrumentalness",
    "liveness",
    "valence",
    "tempo",
    "duration_ms",
    "time_signature",
    "num_bars",
    "num_sections",
    "num_segments",
];

/// Parameters for a paginated listing. `page` is 1-based.
#[derive(Debug, Clone)]
pub struct ListQuery {
    pub page: usize,
    pub limit: usize,
    pub sort_by: Option<String>,
    pub order: SortOrder,
}

impl Default for ListQuery {
    fn default() -> Self {
        ListQuery {
            page: 1,
            limit: 10,
            sort_by: None,
            order: SortOrder::Asc,
        }
    }
}

/// One page of results plus the total count over the whole (filtered) set.
#[derive(Debug, Clone, Serialize)]
pub struct SongPage {
    pub items: Vec<Song>,
    pub total: usize,
    pub page: usize,
    pub size: usize,
}
