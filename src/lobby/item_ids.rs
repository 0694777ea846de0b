//! Item-id space partitioning.
//!
//! Each of the twelve client slots owns a 2 MiB id range; server-generated
//! drops come from a separate high pool. Clients sometimes mint ids
//! themselves, so the allocator also consumes externally-observed ids to keep
//! its counters ahead of anything already on the wire.

/// First client-range id in a game lobby.
pub const GAME_BASE_ITEM_ID: u32 = 0x0001_0000;
/// First client-range id in a non-game lobby.
pub const LOBBY_BASE_ITEM_ID: u32 = 0x1001_0000;
/// Id stride between consecutive client slots.
pub const CLIENT_ITEM_ID_STRIDE: u32 = 0x0020_0000;
/// First id of the server-side drop pool.
pub const SERVER_DROP_BASE_ITEM_ID: u32 = 0xCC00_0000;

use super::MAX_LOBBY_SLOTS;

#[derive(Debug, Clone)]
pub struct ItemIdAllocator {
    base_item_id: u32,
    next_item_id_for_client: [u32; MAX_LOBBY_SLOTS],
    next_game_item_id: u32,
}

impl ItemIdAllocator {
    pub fn new(is_game: bool) -> Self {
        let mut allocator = Self {
            base_item_id: if is_game {
                GAME_BASE_ITEM_ID
            } else {
                LOBBY_BASE_ITEM_ID
            },
            next_item_id_for_client: [0; MAX_LOBBY_SLOTS],
            next_game_item_id: 0,
        };
        allocator.reset();
        allocator
    }

    /// Restore every counter to its slot base.
    pub fn reset(&mut self) {
        for (slot, next) in self.next_item_id_for_client.iter_mut().enumerate() {
            *next = self.base_item_id + CLIENT_ITEM_ID_STRIDE * slot as u32;
        }
        self.next_game_item_id = SERVER_DROP_BASE_ITEM_ID;
    }

    /// Mint the next id for a client slot, or a server-drop id when
    /// `client_id` is not a live slot.
    pub fn generate(&mut self, client_id: u8, max_clients: u8) -> u32 {
        if client_id < max_clients {
            let next = &mut self.next_item_id_for_client[usize::from(client_id)];
            let id = *next;
            *next += 1;
            id
        } else {
            let id = self.next_game_item_id;
            self.next_game_item_id += 1;
            id
        }
    }

    /// Account for an id the client minted on its own. The client's legal
    /// range is wider than `(0x00010000, 0x00810000)`, but server-side drops
    /// start at 0x00810000, so the acceptance window is deliberately narrower
    /// to keep the two disjoint. Ids outside the window are ignored.
    pub fn observe_external(&mut self, item_id: u32) {
        if item_id > 0x0001_0000 && item_id < 0x0081_0000 {
            let slot = ((item_id >> 21) & 0x7FF) as usize;
            let next = &mut self.next_item_id_for_client[slot];
            *next = (*next).max(item_id + 1);
        }
    }

    pub fn next_for_client(&self, client_id: u8) -> u32 {
        self.next_item_id_for_client[usize::from(client_id)]
    }

    pub(crate) fn set_next_for_client(&mut self, client_id: u8, next: u32) {
        self.next_item_id_for_client[usize::from(client_id)] = next;
    }

    pub fn next_game_item_id(&self) -> u32 {
        self.next_game_item_id
    }

    pub(crate) fn set_next_game_item_id(&mut self, next: u32) {
        self.next_game_item_id = next;
    }
}
