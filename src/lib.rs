//! Playlist Server Library
//!
//! This library exposes the internal modules for testing and potential reuse.

pub mod ingestion;
pub mod normalize;
pub mod server;
pub mod song_store;
pub mod sqlite_persistence;

// Re-export commonly used types for convenience
pub use server::{make_app, run_server, RequestsLoggingLevel, ServerConfig};
pub use song_store::{Song, SongStore, SqliteSongStore};
