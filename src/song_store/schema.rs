//! SQLite schema for the song catalog database.
//!
//! A single `songs` table keyed by integer rowid, with the unique business
//! id used for upsert lookups and an index on title for substring search.

use crate::sqlite_column;
use crate::sqlite_persistence::{Column, SqlType, Table, VersionedSchema};

const SONGS_TABLE: Table = Table {
    name: "songs",
    columns: &[
        sqlite_column!("rowid", &SqlType::Integer, is_primary_key = true),
        sqlite_column!("id", &SqlType::Text, non_null = true),
        sqlite_column!("title", &SqlType::Text, non_null = true),
        sqlite_column!(
            "song_class",
            &SqlType::Text,
            non_null = true,
            default_value = Some("''")
        ),
        sqlite_column!(
            "rating",
            &SqlType::Integer,
            non_null = true,
            default_value = Some("0")
        ),
        sqlite_column!(
            "danceability",
            &SqlType::Real,
            non_null = true,
            default_value = Some("0.0")
        ),
        sqlite_column!(
            "energy",
            &SqlType::Real,
            non_null = true,
            default_value = Some("0.0")
        ),
        sqlite_column!(
            "key",
            &SqlType::Integer,
            non_null = true,
            default_value = Some("0")
        ),
        sqlite_column!(
            "loudness",
            &SqlType::Real,
            non_null = true,
            default_value = Some("0.0")
        ),
        sqlite_column!(
            "mode",
            &SqlType::Integer,
            non_null = true,
            default_value = Some("0")
        ),
        sqlite_column!(
            "acousticness",
            &SqlType::Real,
            non_null = true,
            default_value = Some("0.0")
        ),
        sqlite_column!(
            "instrumentalness",
            &SqlType::Real,
            non_null = true,
            default_value = Some("0.0")
        ),
        sqlite_column!(
            "liveness",
            &SqlType::Real,
            non_null = true,
            default_value = Some("0.0")
        ),
        sqlite_column!(
            "valence",
            &SqlType::Real,
            non_null = true,
            default_value = Some("0.0")
        ),
        sqlite_column!(
            "tempo",
            &SqlType::Real,
            non_null = true,
            default_value = Some("0.0")
        ),
        sqlite_column!(
            "duration_ms",
            &SqlType::Integer,
            non_null = true,
            default_value = Some("0")
        ),
        sqlite_column!(
            "time_signature",
            &SqlType::Integer,
            non_null = true,
            default_value = Some("4")
        ),
        sqlite_column!(
            "num_bars",
            &SqlType::Integer,
            non_null = true,
            default_value = Some("0")
        ),
        sqlite_column!(
            "num_sections",
            &SqlType::Integer,
            non_null = true,
            default_value = Some("0")
        ),
        sqlite_column!(
            "num_segments",
            &SqlType::Integer,
            non_null = true,
            default_value = Some("0")
        ),
    ],
    indices: &[("idx_songs_id", "id"), ("idx_songs_title", "title")],
    unique_constraints: &[&["id"]],
};

pub const SONGS_VERSIONED_SCHEMAS: &[VersionedSchema] = &[VersionedSchema {
    version: 0,
    tables: &[SONGS_TABLE],
    migration: None,
}];
