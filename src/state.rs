//! Server-wide state: the lobby registry and the shared data tables lobbies
//! borrow from.

use dashmap::DashMap;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use crate::config::LobbyConfig;
use crate::events::{EventSink, NullEventSink};
use crate::items::{
    ArmorRandomSet, CommonItemSet, ItemParameterTable, ItemStackLimits, RareItemSet,
    TekkerAdjustmentSet, ToolRandomSet, WeaponRandomSet,
};
use crate::lobby::{listing_order, Lobby, LobbyFlag, SharedLobby};
use crate::version::Version;

/// Generated world state for a game. Entity parsing and generation happen in
/// the map subsystem; the lobby only holds the result.
#[derive(Debug, Default)]
pub struct Map;

/// Episode 3 card-battle engine handle. Opaque to the lobby core.
#[derive(Debug, Default)]
pub struct Ep3Server;

pub struct ServerState {
    lobby_config: LobbyConfig,
    lobbies: DashMap<u32, SharedLobby>,
    next_lobby_id: AtomicU32,
    event_sink: Arc<dyn EventSink>,

    // Item tables, loaded at startup and shared read-only with every lobby's
    // item creator.
    pub common_item_set_v2: Arc<CommonItemSet>,
    pub common_item_set_v3_v4: Arc<CommonItemSet>,
    pub rare_item_sets: HashMap<String, Arc<RareItemSet>>,
    pub armor_random_set: Arc<ArmorRandomSet>,
    pub tool_random_set: Arc<ToolRandomSet>,
    /// One weapon set per difficulty.
    pub weapon_random_sets: [Arc<WeaponRandomSet>; 4],
    pub tekker_adjustment_set: Arc<TekkerAdjustmentSet>,
    item_parameter_tables: HashMap<Version, Arc<ItemParameterTable>>,
    item_stack_limits: HashMap<Version, Arc<ItemStackLimits>>,
}

impl ServerState {
    pub fn new(lobby_config: LobbyConfig, event_sink: Arc<dyn EventSink>) -> Arc<Self> {
        let rare_item_sets = ["rare-table-v1", "rare-table-v2", "rare-table-v3", "rare-table-v4"]
            .into_iter()
            .map(|name| (name.to_string(), Arc::new(RareItemSet)))
            .collect();
        let versions = [
            Version::DcNte,
            Version::DcV1Prototype,
            Version::DcV1,
            Version::DcV2,
            Version::PcNte,
            Version::PcV2,
            Version::GcNte,
            Version::GcV3,
            Version::GcEp3Nte,
            Version::GcEp3,
            Version::XbV3,
            Version::BbV4,
        ];
        Arc::new(Self {
            lobby_config,
            lobbies: DashMap::new(),
            next_lobby_id: AtomicU32::new(1),
            event_sink,
            common_item_set_v2: Arc::new(CommonItemSet),
            common_item_set_v3_v4: Arc::new(CommonItemSet),
            rare_item_sets,
            armor_random_set: Arc::new(ArmorRandomSet),
            tool_random_set: Arc::new(ToolRandomSet),
            weapon_random_sets: std::array::from_fn(|_| Arc::new(WeaponRandomSet)),
            tekker_adjustment_set: Arc::new(TekkerAdjustmentSet),
            item_parameter_tables: versions
                .into_iter()
                .map(|v| (v, Arc::new(ItemParameterTable)))
                .collect(),
            item_stack_limits: versions
                .into_iter()
                .map(|v| (v, Arc::new(ItemStackLimits)))
                .collect(),
        })
    }

    /// Test-friendly constructor with defaults and no notifications.
    pub fn new_for_tests() -> Arc<Self> {
        Self::new(LobbyConfig::default(), Arc::new(NullEventSink))
    }

    pub fn lobby_config(&self) -> &LobbyConfig {
        &self.lobby_config
    }

    pub fn event_sink(&self) -> &Arc<dyn EventSink> {
        &self.event_sink
    }

    pub fn item_parameter_table(&self, version: Version) -> Arc<ItemParameterTable> {
        self.item_parameter_tables
            .get(&version)
            .cloned()
            .unwrap_or_default()
    }

    pub fn item_stack_limits(&self, version: Version) -> Arc<ItemStackLimits> {
        self.item_stack_limits
            .get(&version)
            .cloned()
            .unwrap_or_default()
    }

    /// Create and register a lobby with a fresh id.
    pub fn create_lobby(self: &Arc<Self>, is_game: bool) -> SharedLobby {
        let lobby_id = self.next_lobby_id.fetch_add(1, Ordering::Relaxed);
        let lobby = Lobby::create(self, lobby_id, is_game);
        self.lobbies.insert(lobby_id, lobby.clone());
        lobby
    }

    pub fn find_lobby(&self, lobby_id: u32) -> Option<SharedLobby> {
        self.lobbies.get(&lobby_id).map(|entry| entry.clone())
    }

    pub fn remove_lobby(&self, lobby_id: u32) {
        if self.lobbies.remove(&lobby_id).is_some() {
            tracing::info!(lobby_id, "lobby removed from registry");
        }
    }

    pub fn lobby_count(&self) -> usize {
        self.lobbies.len()
    }

    /// Game lobbies in browse-listing order.
    pub fn sorted_game_list(&self) -> Vec<SharedLobby> {
        let mut games: Vec<SharedLobby> = self
            .lobbies
            .iter()
            .filter(|entry| {
                let lobby = entry.value().read();
                lobby.is_game() && !lobby.check_flag(LobbyFlag::IsSpectatorTeam)
            })
            .map(|entry| entry.value().clone())
            .collect();
        games.sort_by(|a, b| listing_order(&a.read(), &b.read()));
        games
    }
}

impl std::fmt::Debug for ServerState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerState")
            .field("lobbies", &self.lobbies.len())
            .finish_non_exhaustive()
    }
}
