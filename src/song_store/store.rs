//! SQLite-backed song store implementation.

use super::models::{ListQuery, Song, SongPage, SortOrder, UpsertOutcome, SORTABLE_COLUMNS};
use super::schema::SONGS_VERSIONED_SCHEMAS;
use super::trait_def::SongStore;
use crate::sqlite_persistence::BASE_DB_VERSION;
use anyhow::{bail, Context, Result};
use rusqlite::{params, Connection};
use std::path::Path;
use std::sync::{Arc, Mutex};
use tracing::info;

/// SQLite-backed song store.
///
/// One mutex-guarded write connection serializes mutations; reads go through
/// a separate read-only connection. Both run in WAL mode so queries see
/// committed writes immediately.
#[derive(Clone)]
pub struct SqliteSongStore {
    read_conn: Arc<Mutex<Connection>>,
    write_conn: Arc<Mutex<Connection>>,
}

const SONG_COLUMNS: &str = "id, title, song_class, rating, danceability, energy, key, loudness, \
     mode, acousticness, instrumentalness, liveness, valence, tempo, duration_ms, \
     time_signature, num_bars, num_sections, num_segments";

fn prepare_schema(conn: &Connection) -> Result<()> {
    let latest_version = SONGS_VERSIONED_SCHEMAS.len() - 1;
    let latest_schema = &SONGS_VERSIONED_SCHEMAS[latest_version];

    let table_count: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name NOT LIKE 'sqlite_%'",
            [],
            |r| r.get(0),
        )
        .unwrap_or(0);

    if table_count == 0 {
        info!("Creating songs db schema at version {}", latest_version);
        latest_schema.create(conn)?;
        return Ok(());
    }

    let db_version: i64 = conn.query_row("PRAGMA user_version", [], |r| r.get(0))?;
    let current_version = db_version as usize;
    if current_version != BASE_DB_VERSION + latest_version {
        bail!("Unknown songs database version {}", db_version);
    }

    latest_schema
        .validate(conn)
        .context("Songs database failed schema validation")?;
    Ok(())
}

impl SqliteSongStore {
    pub fn new<P: AsRef<Path>>(db_path: P) -> Result<Self> {
        let db_path_ref = db_path.as_ref();

        let write_conn = Connection::open_with_flags(
            db_path_ref,
            rusqlite::OpenFlags::SQLITE_OPEN_READ_WRITE
                | rusqlite::OpenFlags::SQLITE_OPEN_CREATE
                | rusqlite::OpenFlags::SQLITE_OPEN_URI
                | rusqlite::OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .context("Failed to open songs database")?;

        prepare_schema(&write_conn)?;

        write_conn
            .pragma_update(None, "journal_mode", "WAL")
            .context("Failed to set WAL mode on songs write connection")?;

        let read_conn = Connection::open_with_flags(
            db_path_ref,
            rusqlite::OpenFlags::SQLITE_OPEN_READ_ONLY
                | rusqlite::OpenFlags::SQLITE_OPEN_URI
                | rusqlite::OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .context("Failed to open songs database for reading")?;

        read_conn
            .pragma_update(None, "journal_mode", "WAL")
            .context("Failed to set WAL mode on songs read connection")?;

        let count: i64 = read_conn.query_row("SELECT COUNT(*) FROM songs", [], |r| r.get(0))?;
        info!("Songs store ready: {} songs", count);

        Ok(SqliteSongStore {
            read_conn: Arc::new(Mutex::new(read_conn)),
            write_conn: Arc::new(Mutex::new(write_conn)),
        })
    }

    fn parse_song_row(row: &rusqlite::Row) -> rusqlite::Result<Song> {
        Ok(Song {
            id: row.get(0)?,
            title: row.get(1)?,
            song_class: row.get(2)?,
            rating: row.get(3)?,
            danceability: row.get(4)?,
            energy: row.get(5)?,
            key: row.get(6)?,
            loudness: row.get(7)?,
            mode: row.get(8)?,
            acousticness: row.get(9)?,
            instrumentalness: row.get(10)?,
            liveness: row.get(11)?,
            valence: row.get(12)?,
            tempo: row.get(13)?,
            duration_ms: row.get(14)?,
            time_signature: row.get(15)?,
            num_bars: row.get(16)?,
            num_sections: row.get(17)?,
            num_segments: row.get(18)?,
        })
    }

    /// Build an ORDER BY clause from a validated sort column. Unknown columns
    /// fall back to insertion order. Rowid tiebreak keeps equal keys stable.
    fn order_clause(sort_by: Option<&str>, order: SortOrder) -> String {
        match sort_by {
            Some(column) if SORTABLE_COLUMNS.contains(&column) => {
                format!("ORDER BY {} {}, rowid ASC", column, order.to_sql())
            }
            _ => "ORDER BY rowid ASC".to_string(),
        }
    }
}

/// Escape LIKE wildcards in user input so they match literally.
fn escape_like(s: &str) -> String {
    s.replace('\\', "\\\\").replace('%', "\\%").replace('_', "\\_")
}

impl SongStore for SqliteSongStore {
    fn upsert_song(&self, song: &Song) -> Result<UpsertOutcome> {
        let conn = self.write_conn.lock().unwrap();
        conn.execute("BEGIN IMMEDIATE", [])?;

        let result = (|| -> Result<UpsertOutcome> {
            let exists: bool = conn.query_row(
                "SELECT EXISTS(SELECT 1 FROM songs WHERE id = ?1)",
                params![&song.id],
                |r| r.get(0),
            )?;

            if exists {
                conn.execute(
                    "UPDATE songs SET title = ?2, song_class = ?3, rating = ?4, \
                     danceability = ?5, energy = ?6, key = ?7, loudness = ?8, mode = ?9, \
                     acousticness = ?10, instrumentalness = ?11, liveness = ?12, valence = ?13, \
                     tempo = ?14, duration_ms = ?15, time_signature = ?16, num_bars = ?17, \
                     num_sections = ?18, num_segments = ?19 WHERE id = ?1",
                    params![
                        &song.id,
                        &song.title,
                        &song.song_class,
                        song.rating,
                        song.danceability,
                        song.energy,
                        song.key,
                        song.loudness,
                        song.mode,
                        song.acousticness,
                        song.instrumentalness,
                        song.liveness,
                        song.valence,
                        song.tempo,
                        song.duration_ms,
                        song.time_signature,
                        song.num_bars,
                        song.num_sections,
                        song.num_segments,
                    ],
                )?;
                Ok(UpsertOutcome::Updated)
            } else {
                conn.execute(
                    &format!(
                        "INSERT INTO songs ({}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, \
                         ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18, ?19)",
                        SONG_COLUMNS
                    ),
                    params![
                        &song.id,
                        &song.title,
                        &song.song_class,
                        song.rating,
                        song.danceability,
                        song.energy,
                        song.key,
                        song.loudness,
                        song.mode,
                        song.acousticness,
                        song.instrumentalness,
                        song.liveness,
                        song.valence,
                        song.tempo,
                        song.duration_ms,
                        song.time_signature,
                        song.num_bars,
                        song.num_sections,
                        song.num_segments,
                    ],
                )?;
                Ok(UpsertOutcome::Created)
            }
        })();

        match result {
            Ok(outcome) => {
                conn.execute("COMMIT", [])?;
                Ok(outcome)
            }
            Err(e) => {
                let _ = conn.execute("ROLLBACK", []);
                Err(e)
            }
        }
    }

    fn get_song(&self, id: &str) -> Result<Option<Song>> {
        let conn = self.read_conn.lock().unwrap();
        let mut stmt = conn.prepare_cached(&format!(
            "SELECT {} FROM songs WHERE id = ?1",
            SONG_COLUMNS
        ))?;

        match stmt.query_row(params![id], Self::parse_song_row) {
            Ok(song) => Ok(Some(song)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn list_songs(&self, query: &ListQuery) -> Result<SongPage> {
        let conn = self.read_conn.lock().unwrap();

        let total: usize =
            conn.query_row("SELECT COUNT(*) FROM songs", [], |r| r.get::<_, i64>(0))? as usize;

        let order = Self::order_clause(query.sort_by.as_deref(), query.order);
        let offset = (query.page - 1) * query.limit;
        let mut stmt = conn.prepare_cached(&format!(
            "SELECT {} FROM songs {} LIMIT ?1 OFFSET ?2",
            SONG_COLUMNS, order
        ))?;

        let items: Vec<Song> = stmt
            .query_map(
                params![query.limit as i64, offset as i64],
                Self::parse_song_row,
            )?
            .collect::<Result<_, _>>()?;

        let size = items.len();
        Ok(SongPage {
            items,
            total,
            page: query.page,
            size,
        })
    }

    fn search_songs(&self, title: &str, page: usize, limit: usize) -> Result<SongPage> {
        let conn = self.read_conn.lock().unwrap();
        let pattern = format!("%{}%", escape_like(title));

        let total: usize = conn.query_row(
            "SELECT COUNT(*) FROM songs WHERE title LIKE ?1 ESCAPE '\\'",
            params![&pattern],
            |r| r.get::<_, i64>(0),
        )? as usize;

        let offset = (page - 1) * limit;
        let mut stmt = conn.prepare_cached(&format!(
            "SELECT {} FROM songs WHERE title LIKE ?1 ESCAPE '\\' \
             ORDER BY rowid ASC LIMIT ?2 OFFSET ?3",
            SONG_COLUMNS
        ))?;

        let items: Vec<Song> = stmt
            .query_map(
                params![&pattern, limit as i64, offset as i64],
                Self::parse_song_row,
            )?
            .collect::<Result<_, _>>()?;

        let size = items.len();
        Ok(SongPage {
            items,
            total,
            page,
            size,
        })
    }

    fn set_rating(&self, id: &str, rating: i64) -> Result<Option<i64>> {
        let conn = self.write_conn.lock().unwrap();
        let changed = conn.execute(
            "UPDATE songs SET rating = ?2 WHERE id = ?1",
            params![id, rating],
        )?;

        if changed == 0 {
            Ok(None)
        } else {
            Ok(Some(rating))
        }
    }

    fn get_all_songs(&self) -> Result<Vec<Song>> {
        let conn = self.read_conn.lock().unwrap();
        let mut stmt = conn.prepare_cached(&format!(
            "SELECT {} FROM songs ORDER BY rowid ASC",
            SONG_COLUMNS
        ))?;
        let songs = stmt
            .query_map([], Self::parse_song_row)?
            .collect::<Result<Vec<Song>, _>>()?;
        Ok(songs)
    }

    fn delete_all_songs(&self) -> Result<usize> {
        let conn = self.write_conn.lock().unwrap();
        let deleted = conn.execute("DELETE FROM songs", [])?;
        Ok(deleted)
    }

    fn count_songs(&self) -> Result<usize> {
        let conn = self.read_conn.lock().unwrap();
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM songs", [], |r| r.get(0))?;
        Ok(count as usize)
    }
}
