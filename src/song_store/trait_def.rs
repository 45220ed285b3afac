//! Trait definition for song storage backends.

use super::models::{ListQuery, Song, SongPage, UpsertOutcome};
use anyhow::Result;

/// Storage abstraction for the song catalog.
///
/// Implementations must make each individual mutation atomic: an upsert, a
/// rating update or a bulk clear either fully applies or leaves the previous
/// state intact. Batches are sequenced by the caller and are not transactional
/// as a whole.
pub trait SongStore: Send + Sync {
    /// Insert the record, or fully replace the stored record with the same id.
    fn upsert_song(&self, song: &Song) -> Result<UpsertOutcome>;

    /// Look up one record by business id.
    fn get_song(&self, id: &str) -> Result<Option<Song>>;

    /// Paginated, optionally sorted listing over all records.
    fn list_songs(&self, query: &ListQuery) -> Result<SongPage>;

    /// Paginated case-insensitive title substring search.
    fn search_songs(&self, title: &str, page: usize, limit: usize) -> Result<SongPage>;

    /// Update only the rating column. Returns `None` when the id is unknown.
    /// Range validation happens at the call site; the store trusts its input.
    fn set_rating(&self, id: &str, rating: i64) -> Result<Option<i64>>;

    /// Full unpaginated dump, in insertion order.
    fn get_all_songs(&self) -> Result<Vec<Song>>;

    /// Remove every record. Returns the number of deleted rows.
    fn delete_all_songs(&self) -> Result<usize>;

    /// Number of stored records.
    fn count_songs(&self) -> Result<usize>;
}
