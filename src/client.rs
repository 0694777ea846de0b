//! Client session handles as seen by the lobby core.
//!
//! A `Client` is shared between the connection layer and the lobby slot that
//! holds it, so every field the lobby mutates lives behind an atomic or a
//! lock. The lobby back-reference is weak; the slot array is the owning side.

use arrayvec::ArrayVec;
use chrono::{DateTime, Utc};
use parking_lot::{Mutex, MutexGuard};
use std::sync::atomic::{AtomicU8, AtomicU32, Ordering};
use std::sync::{Arc, Weak};
use uuid::Uuid;

use crate::items::ItemData;
use crate::lobby::WeakLobby;
use crate::quest::Quest;
use crate::version::Version;

pub type SharedClient = Arc<Client>;

pub const INVENTORY_CAPACITY: usize = 30;
pub const BANK_CAPACITY: usize = 200;

/// Account-level flags checked by the join gate.
#[derive(Debug, Clone, Copy)]
#[repr(u32)]
pub enum LicenseFlag {
    FreeJoinGames = 1 << 0,
    Administrator = 1 << 1,
}

/// The slice of an account license the lobby core consults.
#[derive(Debug)]
pub struct License {
    pub serial_number: u32,
    flags: u32,
}

impl License {
    pub fn new(serial_number: u32) -> Self {
        Self { serial_number, flags: 0 }
    }

    pub fn with_flag(mut self, flag: LicenseFlag) -> Self {
        self.flags |= flag as u32;
        self
    }

    pub fn check_flag(&self, flag: LicenseFlag) -> bool {
        (self.flags & flag as u32) != 0
    }
}

/// Per-session behavior flags.
#[derive(Debug, Clone, Copy)]
#[repr(u32)]
pub enum ClientFlag {
    /// Session has debug commands enabled; affects slot selection and version
    /// gating.
    DebugEnabled = 1 << 0,
    Loading = 1 << 1,
    LoadingQuest = 1 << 2,
    LoadingRunningJoinableQuest = 1 << 3,
    /// BB games need artificial door-flag state sent after join.
    ShouldSendArtificialFlagState = 1 << 4,
}

/// Mutable session flag word. Shared with the connection layer, hence atomic.
#[derive(Debug, Default)]
pub struct ClientConfig {
    flags: AtomicU32,
}

impl ClientConfig {
    pub fn check_flag(&self, flag: ClientFlag) -> bool {
        (self.flags.load(Ordering::Relaxed) & flag as u32) != 0
    }

    pub fn set_flag(&self, flag: ClientFlag) {
        self.flags.fetch_or(flag as u32, Ordering::Relaxed);
    }

    pub fn clear_flag(&self, flag: ClientFlag) {
        self.flags.fetch_and(!(flag as u32), Ordering::Relaxed);
    }
}

/// The character data the lobby core reads and writes: identity, progression,
/// and the item containers whose ids the lobby assigns.
#[derive(Debug, Default, Clone)]
pub struct Character {
    pub name: String,
    pub level: u32,
    pub inventory: ArrayVec<ItemData, INVENTORY_CAPACITY>,
    pub bank: ArrayVec<ItemData, BANK_CAPACITY>,
}

impl Character {
    /// Assign strictly ascending ids to every bank item, starting at `base`.
    pub fn assign_bank_item_ids(&mut self, base: u32) {
        for (index, item) in self.bank.iter_mut().enumerate() {
            item.set_id(base + index as u32);
        }
    }
}

pub struct Client {
    pub session_id: Uuid,
    version: Version,
    language: u8,
    pub license: Option<Arc<License>>,
    pub config: ClientConfig,
    pub connected_at: DateTime<Utc>,

    lobby_client_id: AtomicU8,
    lobby_arrow_color: AtomicU8,
    lobby: Mutex<WeakLobby>,
    character: Mutex<Character>,
}

impl Client {
    pub fn new(
        version: Version,
        language: u8,
        license: Option<Arc<License>>,
        character: Character,
    ) -> SharedClient {
        Arc::new(Self {
            session_id: Uuid::new_v4(),
            version,
            language,
            license,
            config: ClientConfig::default(),
            connected_at: Utc::now(),
            lobby_client_id: AtomicU8::new(0),
            lobby_arrow_color: AtomicU8::new(0),
            lobby: Mutex::new(Weak::new()),
            character: Mutex::new(character),
        })
    }

    pub fn version(&self) -> Version {
        self.version
    }

    pub fn language(&self) -> u8 {
        self.language
    }

    pub fn lobby_client_id(&self) -> u8 {
        self.lobby_client_id.load(Ordering::Relaxed)
    }

    pub fn set_lobby_client_id(&self, slot: u8) {
        self.lobby_client_id.store(slot, Ordering::Relaxed);
    }

    pub fn lobby_arrow_color(&self) -> u8 {
        self.lobby_arrow_color.load(Ordering::Relaxed)
    }

    pub fn set_lobby_arrow_color(&self, color: u8) {
        self.lobby_arrow_color.store(color, Ordering::Relaxed);
    }

    pub fn lobby(&self) -> WeakLobby {
        self.lobby.lock().clone()
    }

    pub fn set_lobby(&self, lobby: WeakLobby) {
        *self.lobby.lock() = lobby;
    }

    /// Clear the back-reference, but only if it still points at `expected`.
    /// The client may already have been added to another lobby mid-move.
    pub fn clear_lobby_if(&self, expected: &WeakLobby) {
        let mut guard = self.lobby.lock();
        if guard.ptr_eq(expected) {
            *guard = Weak::new();
        }
    }

    pub fn character(&self) -> MutexGuard<'_, Character> {
        self.character.lock()
    }

    /// Whether this client's menu should list the quest at all.
    pub fn can_see_quest(
        &self,
        quest: &Quest,
        event: u8,
        difficulty: u8,
        _num_players: usize,
        _v1_present: bool,
    ) -> bool {
        if (quest.allowed_versions & self.version.bit()) == 0 {
            return false;
        }
        if (quest.available_difficulties & (1 << difficulty)) == 0 {
            return false;
        }
        quest.required_event.is_none_or(|e| e == event)
    }

    /// Whether this client may actually start the quest under the given party
    /// composition.
    pub fn can_play_quest(
        &self,
        quest: &Quest,
        event: u8,
        difficulty: u8,
        num_players: usize,
        v1_present: bool,
    ) -> bool {
        if !self.can_see_quest(quest, event, difficulty, num_players, v1_present) {
            return false;
        }
        if num_players > quest.max_players {
            return false;
        }
        quest.v1_compatible || !v1_present
    }
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("session_id", &self.session_id)
            .field("version", &self.version)
            .field("lobby_client_id", &self.lobby_client_id())
            .finish_non_exhaustive()
    }
}
