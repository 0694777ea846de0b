use std::sync::Arc;

use starboard_server::client::{Character, Client, License, SharedClient};
use starboard_server::config::LobbyConfig;
use starboard_server::events::RecordingEventSink;
use starboard_server::lobby::SharedLobby;
use starboard_server::state::ServerState;
use starboard_server::version::{Version, ALL_VERSIONS_MASK};

/// Create a server state wired to a recording event sink.
#[allow(dead_code)]
pub fn create_test_state() -> (Arc<ServerState>, Arc<RecordingEventSink>) {
    let sink = Arc::new(RecordingEventSink::default());
    let state = ServerState::new(LobbyConfig::default(), sink.clone());
    (state, sink)
}

/// Create a lobby open to every version.
#[allow(dead_code)]
pub fn create_open_lobby(state: &Arc<ServerState>, is_game: bool) -> SharedLobby {
    let lobby = state.create_lobby(is_game);
    lobby.write().allowed_versions = ALL_VERSIONS_MASK;
    lobby
}

/// Create a client with a licensed serial number and the given level.
#[allow(dead_code)]
pub fn create_test_client(version: Version, level: u32, serial: u32) -> SharedClient {
    let character = Character {
        name: format!("Hunter{serial}"),
        level,
        ..Character::default()
    };
    Client::new(version, 1, Some(Arc::new(License::new(serial))), character)
}
