//! Lobby and game-session core.
//!
//! A lobby holds up to twelve client slots, one floor-item manager per floor,
//! an item-id allocator, and the game parameters that browse listings and the
//! join gate read. All operations on a lobby run to completion under its
//! lock; the idle timer is the only asynchronous entry point and re-acquires
//! the lock when it fires.

use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::{Arc, Weak};
use std::time::Duration;
use thiserror::Error;

use crate::battle_record::BattleRecord;
use crate::client::SharedClient;
use crate::events::EventSink;
use crate::item_creator::ItemCreator;
use crate::quest::{Quest, QuestIncludeState};
use crate::state::{Ep3Server, Map, ServerState};
use crate::version::{DropMode, Episode, GameMode, Version};

mod floor_items;
#[cfg(test)]
mod floor_items_tests;
mod idle_timer;
mod item_ids;
mod join_gate;
#[cfg(test)]
mod join_gate_tests;
mod membership;
mod ordering;

pub use floor_items::{
    FloorItem, FloorItemManager, NO_REQUESTING_CLIENT, PER_CLIENT_QUEUE_LIMIT,
};
pub use idle_timer::IdleTimer;
pub use item_ids::{
    ItemIdAllocator, CLIENT_ITEM_ID_STRIDE, GAME_BASE_ITEM_ID, LOBBY_BASE_ITEM_ID,
    SERVER_DROP_BASE_ITEM_ID,
};
pub use join_gate::JoinError;
pub use membership::move_client_to_lobby;
pub use ordering::{listing_order, ListingKey};

/// Slots in a lobby's client array. Lobbies may cap `max_clients` lower.
pub const MAX_LOBBY_SLOTS: usize = 12;

/// Floors per lobby (Pioneer 2 through the final boss arenas).
pub const FLOOR_COUNT: usize = 0x12;

/// Base id for bank items, offset per slot.
pub const BANK_BASE_ITEM_ID: u32 = 0x9900_0000;

pub type SharedLobby = Arc<RwLock<Lobby>>;
pub type WeakLobby = Weak<RwLock<Lobby>>;

/// Recoverable lobby failures, plus `Invariant` for programmer errors that
/// must not be retried.
#[derive(Debug, Error)]
pub enum LobbyError {
    #[error("floor item {item_id:08X} not present")]
    ItemNotFound { item_id: u32 },
    #[error("floor item {item_id:08X} already exists")]
    DuplicateItem { item_id: u32 },
    #[error("client {client_id} does not have access to item {item_id:08X}")]
    NoItemAccess { item_id: u32, client_id: u8 },
    #[error("floor {floor:02X} does not exist")]
    InvalidFloor { floor: u8 },
    #[error("required slot {slot} is in use")]
    SlotInUse { slot: u8 },
    #[error("no space left in lobby")]
    Full,
    #[error("client not found")]
    ClientNotFound,
    #[error("lobby invariant violated: {0}")]
    Invariant(String),
}

/// Lobby behavior flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum LobbyFlag {
    /// This lobby is a game session rather than a social lobby.
    Game = 1 << 0,
    /// Survives being empty (subject to the idle timeout).
    Persistent = 1 << 1,
    /// One of the server's built-in block lobbies; never expires.
    Default = 1 << 2,
    QuestInProgress = 1 << 3,
    BattleInProgress = 1 << 4,
    /// Episode 3 spectator team; player slots start at 4.
    IsSpectatorTeam = 1 << 5,
    CheatsEnabled = 1 << 6,
}

/// Challenge-mode parameter block. Populated by the challenge subsystem when
/// a challenge game starts.
#[derive(Debug, Default)]
pub struct ChallengeParameters {
    pub stage_number: u8,
    pub rank_color: u32,
}

pub struct Lobby {
    server_state: Weak<ServerState>,
    self_weak: WeakLobby,
    event_sink: Arc<dyn EventSink>,

    pub lobby_id: u32,
    pub name: String,
    pub password: String,
    pub base_version: Version,
    pub allowed_versions: u16,
    pub section_id: u8,
    pub episode: Episode,
    pub mode: GameMode,
    pub difficulty: u8,
    pub event: u8,
    pub block: u8,
    pub min_level: u32,
    pub max_level: u32,
    pub random_seed: u32,
    pub leader_id: u8,
    pub max_clients: u8,
    pub idle_timeout: Duration,
    flags: u32,
    drop_mode: DropMode,

    clients: [Option<SharedClient>; MAX_LOBBY_SLOTS],
    floor_item_managers: [FloorItemManager; FLOOR_COUNT],
    item_ids: ItemIdAllocator,
    idle_timer: IdleTimer,

    pub quest: Option<Arc<Quest>>,
    pub map: Option<Arc<Map>>,
    pub challenge_params: Option<Arc<ChallengeParameters>>,
    pub ep3_server: Option<Arc<Ep3Server>>,
    pub battle_record: Option<Arc<BattleRecord>>,
    item_creator: Option<ItemCreator>,
    watched_lobby: WeakLobby,
}

impl Lobby {
    /// Build a lobby owned by `server_state`. The lobby holds a weak
    /// reference to itself so it can hand back-references to clients and arm
    /// its idle timer.
    pub fn create(server_state: &Arc<ServerState>, lobby_id: u32, is_game: bool) -> SharedLobby {
        let lobby = Arc::new_cyclic(|self_weak: &WeakLobby| {
            let mut lobby = Lobby {
                server_state: Arc::downgrade(server_state),
                self_weak: self_weak.clone(),
                event_sink: server_state.event_sink().clone(),
                lobby_id,
                name: String::new(),
                password: String::new(),
                base_version: Version::GcV3,
                allowed_versions: 0,
                section_id: 0,
                episode: Episode::None,
                mode: GameMode::Normal,
                difficulty: 0,
                event: 0,
                block: 0,
                min_level: 0,
                max_level: u32::MAX,
                random_seed: rand::random(),
                leader_id: 0,
                max_clients: MAX_LOBBY_SLOTS as u8,
                idle_timeout: Duration::ZERO,
                flags: 0,
                drop_mode: DropMode::Client,
                clients: std::array::from_fn(|_| None),
                floor_item_managers: std::array::from_fn(|floor| {
                    FloorItemManager::new(lobby_id, floor as u8)
                }),
                item_ids: ItemIdAllocator::new(is_game),
                idle_timer: IdleTimer::default(),
                quest: None,
                map: None,
                challenge_params: None,
                ep3_server: None,
                battle_record: None,
                item_creator: None,
                watched_lobby: Weak::new(),
            };
            if is_game {
                lobby.set_flag(LobbyFlag::Game);
            }
            RwLock::new(lobby)
        });
        tracing::info!(lobby_id, is_game, "lobby created");
        lobby
    }

    pub fn check_flag(&self, flag: LobbyFlag) -> bool {
        (self.flags & flag as u32) != 0
    }

    pub fn set_flag(&mut self, flag: LobbyFlag) {
        self.flags |= flag as u32;
    }

    pub fn clear_flag(&mut self, flag: LobbyFlag) {
        self.flags &= !(flag as u32);
    }

    pub fn is_game(&self) -> bool {
        self.check_flag(LobbyFlag::Game)
    }

    pub fn is_ep3(&self) -> bool {
        self.base_version.is_ep3()
    }

    pub fn version_is_allowed(&self, version: Version) -> bool {
        (self.allowed_versions & version.bit()) != 0
    }

    pub fn drop_mode(&self) -> DropMode {
        self.drop_mode
    }

    pub(crate) fn server_state_weak(&self) -> Weak<ServerState> {
        self.server_state.clone()
    }

    pub(crate) fn self_weak(&self) -> WeakLobby {
        self.self_weak.clone()
    }

    pub fn require_server_state(&self) -> Result<Arc<ServerState>, LobbyError> {
        self.server_state
            .upgrade()
            .ok_or_else(|| LobbyError::Invariant("server state is gone".to_string()))
    }

    pub fn require_challenge_params(&self) -> Result<Arc<ChallengeParameters>, LobbyError> {
        self.challenge_params
            .clone()
            .ok_or_else(|| LobbyError::Invariant("challenge parameters are missing".to_string()))
    }

    /// Point a spectator team at the lobby it watches.
    pub fn set_watched_lobby(&mut self, watched: &SharedLobby) {
        self.watched_lobby = Arc::downgrade(watched);
    }

    pub fn watched_lobby(&self) -> Option<SharedLobby> {
        self.watched_lobby.upgrade()
    }

    pub fn client_at(&self, slot: u8) -> Option<&SharedClient> {
        self.clients.get(usize::from(slot)).and_then(Option::as_ref)
    }

    pub fn count_clients(&self) -> usize {
        self.clients[..usize::from(self.max_clients)]
            .iter()
            .filter(|slot| slot.is_some())
            .count()
    }

    pub fn any_client_loading(&self) -> bool {
        use crate::client::ClientFlag;
        self.clients[..usize::from(self.max_clients)]
            .iter()
            .flatten()
            .any(|client| {
                client.config.check_flag(ClientFlag::Loading)
                    || client.config.check_flag(ClientFlag::LoadingQuest)
                    || client.config.check_flag(ClientFlag::LoadingRunningJoinableQuest)
            })
    }

    pub fn any_v1_clients_present(&self) -> bool {
        self.clients[..usize::from(self.max_clients)]
            .iter()
            .flatten()
            .any(|client| client.version().is_v1())
    }

    /// Find a client by serial number (preferred) or by character name.
    pub fn find_client(
        &self,
        identifier: Option<&str>,
        serial_number: Option<u32>,
    ) -> Result<SharedClient, LobbyError> {
        for client in self.clients[..usize::from(self.max_clients)].iter().flatten() {
            if let (Some(serial), Some(license)) = (serial_number, client.license.as_ref()) {
                if license.serial_number == serial {
                    return Ok(client.clone());
                }
            }
            if let Some(name) = identifier {
                if client.character().name == name {
                    return Ok(client.clone());
                }
            }
        }
        Err(LobbyError::ClientNotFound)
    }

    pub fn clients_by_serial_number(&self) -> HashMap<u32, SharedClient> {
        let mut ret = HashMap::new();
        for client in self.clients.iter().flatten() {
            if let Some(license) = &client.license {
                ret.insert(license.serial_number, client.clone());
            }
        }
        ret
    }

    /// Closure deciding, per quest, whether this lobby's quest menu should
    /// list it. Snapshots the current membership, so the closure stays valid
    /// after the lobby lock is released.
    pub fn quest_include_condition(
        &self,
    ) -> impl Fn(&Quest) -> QuestIncludeState + Send + Sync + 'static {
        let clients: Vec<SharedClient> = self.clients.iter().flatten().cloned().collect();
        let num_players = self.count_clients();
        let v1_present = self.any_v1_clients_present();
        let event = self.event;
        let difficulty = self.difficulty;
        move |quest| {
            let mut enabled = true;
            for client in &clients {
                if !client.can_see_quest(quest, event, difficulty, num_players, v1_present) {
                    return QuestIncludeState::Hidden;
                }
                if !client.can_play_quest(quest, event, difficulty, num_players, v1_present) {
                    enabled = false;
                }
            }
            if enabled {
                QuestIncludeState::Available
            } else {
                QuestIncludeState::Disabled
            }
        }
    }

    pub fn floor_item_manager(&self, floor: u8) -> Option<&FloorItemManager> {
        self.floor_item_managers.get(usize::from(floor))
    }

    pub(crate) fn floor_item_manager_mut(
        &mut self,
        floor: u8,
    ) -> Result<&mut FloorItemManager, LobbyError> {
        self.floor_item_managers
            .get_mut(usize::from(floor))
            .ok_or(LobbyError::InvalidFloor { floor })
    }

    pub(crate) fn item_id_allocator(&self) -> &ItemIdAllocator {
        &self.item_ids
    }

    pub fn item_creator(&self) -> Option<&ItemCreator> {
        self.item_creator.as_ref()
    }

    /// Change the drop mode, creating or discarding the item creator as the
    /// new mode requires. BB games always need an item creator because the
    /// server arbitrates drops there even in client mode.
    pub fn set_drop_mode(&mut self, new_mode: DropMode) -> Result<(), LobbyError> {
        self.drop_mode = new_mode;
        let should_have_item_creator = self.base_version == Version::BbV4
            || !matches!(new_mode, DropMode::Disabled | DropMode::Client);
        if should_have_item_creator && self.item_creator.is_none() {
            self.create_item_creator()?;
        } else if !should_have_item_creator && self.item_creator.is_some() {
            self.item_creator = None;
        }
        Ok(())
    }

    fn create_item_creator(&mut self) -> Result<(), LobbyError> {
        let server_state = self.require_server_state()?;

        let (common_item_set, rare_table_name) = match self.base_version {
            Version::PcPatch | Version::BbPatch | Version::GcEp3Nte | Version::GcEp3 => {
                return Err(LobbyError::Invariant(format!(
                    "cannot create item creator for base version {:?}",
                    self.base_version
                )));
            }
            Version::DcNte | Version::DcV1Prototype | Version::DcV1 => {
                // TODO: use a dedicated v1 common item set once one is built
                (server_state.common_item_set_v2.clone(), "rare-table-v1")
            }
            Version::DcV2 | Version::PcNte | Version::PcV2 => {
                (server_state.common_item_set_v2.clone(), "rare-table-v2")
            }
            Version::GcNte | Version::GcV3 | Version::XbV3 => {
                (server_state.common_item_set_v3_v4.clone(), "rare-table-v3")
            }
            Version::BbV4 => (server_state.common_item_set_v3_v4.clone(), "rare-table-v4"),
        };
        let rare_item_set = server_state
            .rare_item_sets
            .get(rare_table_name)
            .cloned()
            .ok_or_else(|| {
                LobbyError::Invariant(format!("rare item set {rare_table_name} is missing"))
            })?;

        self.item_creator = Some(ItemCreator::new(
            common_item_set,
            rare_item_set,
            server_state.armor_random_set.clone(),
            server_state.tool_random_set.clone(),
            server_state.weapon_random_sets[usize::from(self.difficulty)].clone(),
            server_state.tekker_adjustment_set.clone(),
            server_state.item_parameter_table(self.base_version),
            server_state.item_stack_limits(self.base_version),
            self.episode,
            if self.mode == GameMode::Solo {
                GameMode::Normal
            } else {
                self.mode
            },
            self.difficulty,
            self.section_id,
            self.quest.as_ref().and_then(|q| q.battle_rules.clone()),
        ));
        Ok(())
    }
}

impl std::fmt::Debug for Lobby {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Lobby")
            .field("lobby_id", &self.lobby_id)
            .field("name", &self.name)
            .field("is_game", &self.is_game())
            .field("mode", &self.mode)
            .field("episode", &self.episode)
            .field("difficulty", &self.difficulty)
            .field("clients", &self.count_clients())
            .finish_non_exhaustive()
    }
}
