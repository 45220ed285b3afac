mod models;
mod schema;
mod store;
mod trait_def;

pub use models::{ListQuery, Song, SongPage, SortOrder, UpsertOutcome};
pub use store::SqliteSongStore;
pub use trait_def::SongStore;
