//! Per-floor floor-item bookkeeping.
//!
//! Each floor keeps the authoritative by-id item map plus one drop-ordered
//! queue per client slot. An item appears in queue `i` exactly when its
//! visibility bit `i` is set; the queues are what bound per-client state (48
//! items each) and drive FIFO eviction.

use smallvec::SmallVec;
use std::collections::BTreeMap;
use std::sync::Arc;

use super::{LobbyError, MAX_LOBBY_SLOTS};
use crate::items::ItemData;

/// Per-client floor-item cap. Bounds both memory and the state-sync traffic a
/// single client can accumulate; eviction in drop order means the oldest
/// drops vanish first.
pub const PER_CLIENT_QUEUE_LIMIT: usize = 48;

/// Pseudo client id for removals not performed on behalf of any client
/// (eviction, cleanup). Skips the visibility check.
pub const NO_REQUESTING_CLIENT: u8 = 0xFF;

/// An item on the ground, shared between the by-id map and the per-client
/// queues. The embedded item id is atomic because reassignment happens while
/// these handles are shared.
#[derive(Debug)]
pub struct FloorItem {
    pub data: ItemData,
    pub x: f32,
    pub z: f32,
    /// Absolute drop order within one manager. Never reused until `clear`.
    pub drop_number: u64,
    /// Bit `i` set means client slot `i` can see (and pick up) this item.
    /// Bits 12..16 are always clear.
    pub visibility_flags: u16,
}

impl FloorItem {
    pub fn visible_to_client(&self, client_id: u8) -> bool {
        usize::from(client_id) < MAX_LOBBY_SLOTS && (self.visibility_flags >> client_id) & 1 != 0
    }
}

pub struct FloorItemManager {
    lobby_id: u32,
    floor: u8,
    items: BTreeMap<u32, Arc<FloorItem>>,
    queue_for_client: [BTreeMap<u64, Arc<FloorItem>>; MAX_LOBBY_SLOTS],
    next_drop_number: u64,
}

impl FloorItemManager {
    pub fn new(lobby_id: u32, floor: u8) -> Self {
        Self {
            lobby_id,
            floor,
            items: BTreeMap::new(),
            queue_for_client: std::array::from_fn(|_| BTreeMap::new()),
            next_drop_number: 0,
        }
    }

    pub fn exists(&self, item_id: u32) -> bool {
        self.items.contains_key(&item_id)
    }

    pub fn find(&self, item_id: u32) -> Result<Arc<FloorItem>, LobbyError> {
        self.items
            .get(&item_id)
            .cloned()
            .ok_or(LobbyError::ItemNotFound { item_id })
    }

    pub fn item_count(&self) -> usize {
        self.items.len()
    }

    pub fn queue_len(&self, client_id: u8) -> usize {
        self.queue_for_client[usize::from(client_id)].len()
    }

    /// Drop a new item at the given position. Visibility bits outside the
    /// twelve client slots are masked off.
    pub fn add_new(
        &mut self,
        data: ItemData,
        x: f32,
        z: f32,
        visibility_flags: u16,
    ) -> Result<Arc<FloorItem>, LobbyError> {
        let fi = Arc::new(FloorItem {
            data,
            x,
            z,
            drop_number: self.next_drop_number,
            visibility_flags: visibility_flags & 0x0FFF,
        });
        self.next_drop_number += 1;
        self.add(fi.clone())?;
        Ok(fi)
    }

    /// Insert an already-built item, preserving its drop number and
    /// visibility. Used by id reassignment and by cross-floor moves.
    pub fn add(&mut self, fi: Arc<FloorItem>) -> Result<(), LobbyError> {
        if fi.visibility_flags == 0 {
            return Err(LobbyError::Invariant(
                "floor item is not visible to any player".to_string(),
            ));
        }

        let item_id = fi.data.id();
        match self.items.entry(item_id) {
            std::collections::btree_map::Entry::Occupied(_) => {
                return Err(LobbyError::DuplicateItem { item_id });
            }
            std::collections::btree_map::Entry::Vacant(entry) => {
                entry.insert(fi.clone());
            }
        }
        for z in 0..MAX_LOBBY_SLOTS {
            if fi.visible_to_client(z as u8) {
                self.queue_for_client[z].insert(fi.drop_number, fi.clone());
            }
        }
        tracing::debug!(
            lobby_id = self.lobby_id,
            floor = self.floor,
            item_id = format_args!("{item_id:08X}"),
            x = fi.x,
            z = fi.z,
            drop_number = fi.drop_number,
            visibility = format_args!("{:03X}", fi.visibility_flags),
            "added floor item"
        );
        Ok(())
    }

    /// Remove an item, on behalf of `client_id` (which must be able to see
    /// it) or of the server (`NO_REQUESTING_CLIENT`).
    pub fn remove(&mut self, item_id: u32, client_id: u8) -> Result<Arc<FloorItem>, LobbyError> {
        let fi = self
            .items
            .get(&item_id)
            .cloned()
            .ok_or(LobbyError::ItemNotFound { item_id })?;
        if client_id != NO_REQUESTING_CLIENT && !fi.visible_to_client(client_id) {
            return Err(LobbyError::NoItemAccess { item_id, client_id });
        }
        for z in 0..MAX_LOBBY_SLOTS {
            if fi.visible_to_client(z as u8)
                && self.queue_for_client[z].remove(&fi.drop_number).is_none()
            {
                return Err(LobbyError::Invariant(format!(
                    "item queue for client {z} is inconsistent"
                )));
            }
        }
        self.items.remove(&item_id);
        tracing::debug!(
            lobby_id = self.lobby_id,
            floor = self.floor,
            item_id = format_args!("{item_id:08X}"),
            drop_number = fi.drop_number,
            visibility = format_args!("{:03X}", fi.visibility_flags),
            "removed floor item"
        );
        Ok(fi)
    }

    /// Enforce the per-client queue bound, oldest drops first. An item
    /// evicted for one client disappears for every client that could see it,
    /// so later queues may already be under the limit when scanned.
    pub fn evict(&mut self) -> Result<SmallVec<[Arc<FloorItem>; 8]>, LobbyError> {
        let mut evicted = SmallVec::new();
        for z in 0..MAX_LOBBY_SLOTS {
            while self.queue_for_client[z].len() > PER_CLIENT_QUEUE_LIMIT {
                let oldest_id = self.queue_for_client[z]
                    .values()
                    .next()
                    .map(|fi| fi.data.id())
                    .ok_or_else(|| {
                        LobbyError::Invariant("over-limit queue has no entries".to_string())
                    })?;
                evicted.push(self.remove(oldest_id, NO_REQUESTING_CLIENT)?);
            }
        }
        if !evicted.is_empty() {
            tracing::debug!(
                lobby_id = self.lobby_id,
                floor = self.floor,
                count = evicted.len(),
                "evicted floor items"
            );
        }
        Ok(evicted)
    }

    /// Remove every item no remaining client can see.
    pub fn clear_inaccessible(&mut self, remaining_clients_mask: u16) -> Result<(), LobbyError> {
        let ids: Vec<u32> = self
            .items
            .values()
            .filter(|fi| (fi.visibility_flags & remaining_clients_mask) == 0)
            .map(|fi| fi.data.id())
            .collect();
        for item_id in &ids {
            self.remove(*item_id, NO_REQUESTING_CLIENT)?;
        }
        tracing::debug!(
            lobby_id = self.lobby_id,
            floor = self.floor,
            count = ids.len(),
            "deleted inaccessible floor items"
        );
        Ok(())
    }

    /// Remove every item that is not public. "Public" means visible to all
    /// four low slots; anything narrower is a player-private drop and does not
    /// survive the lobby emptying.
    pub fn clear_private(&mut self) -> Result<(), LobbyError> {
        let ids: Vec<u32> = self
            .items
            .values()
            .filter(|fi| (fi.visibility_flags & 0x00F) != 0x00F)
            .map(|fi| fi.data.id())
            .collect();
        for item_id in &ids {
            self.remove(*item_id, NO_REQUESTING_CLIENT)?;
        }
        tracing::debug!(
            lobby_id = self.lobby_id,
            floor = self.floor,
            count = ids.len(),
            "deleted private floor items"
        );
        Ok(())
    }

    /// Drop everything and restart drop numbering.
    pub fn clear(&mut self) {
        let count = self.items.len();
        self.items.clear();
        for queue in &mut self.queue_for_client {
            queue.clear();
        }
        self.next_drop_number = 0;
        tracing::debug!(
            lobby_id = self.lobby_id,
            floor = self.floor,
            count,
            "cleared floor items"
        );
    }

    /// Re-key every item with fresh ids starting at `next_item_id`, in
    /// ascending order of the old ids. Drop numbers are untouched, so each
    /// per-client queue keeps its order. Returns the next unused id.
    pub fn reassign_all_item_ids(&mut self, mut next_item_id: u32) -> Result<u32, LobbyError> {
        let old_items = std::mem::take(&mut self.items);
        for queue in &mut self.queue_for_client {
            queue.clear();
        }
        for (_, fi) in old_items {
            fi.data.set_id(next_item_id);
            next_item_id += 1;
            self.add(fi)?;
        }
        Ok(next_item_id)
    }

    /// Items of every queue for `client_id`, in drop order. Test and
    /// state-sync helper.
    pub fn queue_snapshot(&self, client_id: u8) -> Vec<Arc<FloorItem>> {
        self.queue_for_client[usize::from(client_id)]
            .values()
            .cloned()
            .collect()
    }

    /// All item ids currently present, ascending.
    pub fn item_ids(&self) -> Vec<u32> {
        self.items.keys().copied().collect()
    }
}
