use axum::extract::FromRef;

use crate::song_store::SongStore;
use std::sync::Arc;

use super::ServerConfig;

pub type GuardedSongStore = Arc<dyn SongStore>;

#[derive(Clone)]
pub struct ServerState {
    pub config: ServerConfig,
    pub song_store: GuardedSongStore,
}

impl FromRef<ServerState> for GuardedSongStore {
    fn from_ref(input: &ServerState) -> Self {
        input.song_store.clone()
    }
}

impl FromRef<ServerState> for ServerConfig {
    fn from_ref(input: &ServerState) -> Self {
        input.config.clone()
    }
}
