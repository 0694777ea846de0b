//! Membership lifecycle and the lobby-level item API.
//!
//! Joins and departures are where the floor-item subsystem, the id allocator,
//! and leader election interact; the ordering of steps here is load-bearing
//! and mirrors what the clients expect on the wire.

use std::sync::Arc;

use super::floor_items::FloorItem;
use super::{Lobby, LobbyError, LobbyFlag, SharedLobby, BANK_BASE_ITEM_ID, MAX_LOBBY_SLOTS};
use crate::battle_record::BattleRecordPlayer;
use crate::client::{ClientFlag, SharedClient};
use crate::items::ItemData;
use crate::version::{GameMode, Version};

impl Lobby {
    /// Seat `client` in this lobby and run the full join sequence: slot
    /// selection, back-references, leader election, item-id reassignment,
    /// inventory/bank id assignment, notifications, and idle-timer
    /// cancellation. Returns the assigned slot.
    pub fn add_client(
        &mut self,
        client: &SharedClient,
        required_slot: Option<u8>,
    ) -> Result<u8, LobbyError> {
        let min_slot = if self.check_flag(LobbyFlag::IsSpectatorTeam) {
            4
        } else {
            0
        };
        let max = usize::from(self.max_clients);

        let slot = match required_slot {
            Some(required) => {
                let index = usize::from(required);
                if index >= MAX_LOBBY_SLOTS || self.clients[index].is_some() {
                    return Err(LobbyError::SlotInUse { slot: required });
                }
                index
            }
            // Debug sessions fill from the high end so they stay out of the
            // way of normal joins; solo games have nowhere to hide.
            None if client.config.check_flag(ClientFlag::DebugEnabled)
                && self.mode != GameMode::Solo =>
            {
                (min_slot..max)
                    .rev()
                    .find(|&index| self.clients[index].is_none())
                    .ok_or(LobbyError::Full)?
            }
            None => (min_slot..max)
                .find(|&index| self.clients[index].is_none())
                .ok_or(LobbyError::Full)?,
        };
        self.clients[slot] = Some(client.clone());

        client.set_lobby_client_id(slot as u8);
        client.set_lobby(self.self_weak());
        client.set_lobby_arrow_color(0);

        let any_other_client = self.clients[..max]
            .iter()
            .enumerate()
            .any(|(index, occupant)| index != slot && occupant.is_some());
        if !any_other_client {
            self.leader_id = slot as u8;
        }

        // A social lobby reassigns floor-item ids on every join; a game only
        // when it was empty, because established clients already hold the old
        // ids.
        if !self.is_game() || !any_other_client {
            self.item_ids.reset();
            let mut next_game_item_id = self.item_ids.next_game_item_id();
            for manager in &mut self.floor_item_managers {
                next_game_item_id = manager.reassign_all_item_ids(next_game_item_id)?;
            }
            self.item_ids.set_next_game_item_id(next_game_item_id);
        }

        // In a game, a non-leader does not commit its item ids until the
        // leader confirms the join, so the ids issued here are tentative and
        // the slot counter is rolled back.
        let consume_ids = !self.is_game() || slot as u8 == self.leader_id;
        self.assign_inventory_and_bank_item_ids(client, consume_ids);

        // BB quests clobber the Episode 2 CCA door state; mark the client so
        // the artificial flag state is sent during load.
        if self.is_game() && client.version() == Version::BbV4 {
            client
                .config
                .set_flag(ClientFlag::ShouldSendArtificialFlagState);
        }

        if let Some(record) = &self.battle_record {
            let character = client.character();
            record.add_player(
                slot as u8,
                BattleRecordPlayer {
                    serial_number: client
                        .license
                        .as_ref()
                        .map_or(0, |license| license.serial_number),
                    name: character.name.clone(),
                    language: client.language(),
                    level: character.level,
                },
            );
        }

        self.notify_spectator_counts();

        if self.idle_timer.disarm() {
            tracing::info!(lobby_id = self.lobby_id, "idle timeout cancelled");
        }

        tracing::info!(
            lobby_id = self.lobby_id,
            client_id = slot,
            session_id = %client.session_id,
            "client joined lobby"
        );
        Ok(slot as u8)
    }

    /// Remove `client`, re-electing the leader, pruning floor items nobody
    /// left can see, and arming the idle timer when a persistent lobby goes
    /// empty.
    pub fn remove_client(&mut self, client: &SharedClient) -> Result<(), LobbyError> {
        let slot = usize::from(client.lobby_client_id());
        let slot_matches = self
            .clients
            .get(slot)
            .is_some_and(|occupant| occupant.as_ref().is_some_and(|c| Arc::ptr_eq(c, client)));
        if !slot_matches {
            return Err(LobbyError::Invariant(format!(
                "client's lobby client id ({slot}) does not match the slot contents"
            )));
        }
        self.clients[slot] = None;

        // The back-reference may already point at another lobby if this
        // removal is part of a move; only clear it if it is still ours.
        client.clear_lobby_if(&self.self_weak);

        self.reassign_leader_on_client_departure(slot);

        if let Some(record) = &self.battle_record {
            record.delete_player(slot as u8);
        }

        self.notify_spectator_counts();

        let mut remaining_clients_mask = 0u16;
        for (index, occupant) in self.clients.iter().enumerate() {
            if occupant.is_some() {
                remaining_clients_mask |= 1 << index;
            }
        }
        // With players remaining, drop whatever only the leaver could see.
        // With nobody left, keep public items so they persist in empty
        // persistent lobbies, and drop the player-private ones.
        if remaining_clients_mask != 0 {
            for manager in &mut self.floor_item_managers {
                manager.clear_inaccessible(remaining_clients_mask)?;
            }
        } else {
            for manager in &mut self.floor_item_managers {
                manager.clear_private()?;
            }
        }

        if remaining_clients_mask == 0
            && self.check_flag(LobbyFlag::Persistent)
            && !self.check_flag(LobbyFlag::Default)
            && !self.idle_timeout.is_zero()
        {
            self.idle_timer.arm(self.self_weak(), self.idle_timeout);
            tracing::info!(
                lobby_id = self.lobby_id,
                timeout = ?self.idle_timeout,
                "idle timeout scheduled"
            );
        }

        tracing::info!(
            lobby_id = self.lobby_id,
            client_id = slot,
            session_id = %client.session_id,
            "client left lobby"
        );
        Ok(())
    }

    fn reassign_leader_on_client_departure(&mut self, leaving_slot: usize) {
        for index in 0..usize::from(self.max_clients) {
            if index != leaving_slot && self.clients[index].is_some() {
                self.leader_id = index as u8;
                return;
            }
        }
        self.leader_id = 0;
    }

    /// Episode 3 games carry a live spectator count in their metadata; a
    /// spectator team refreshes the lobby it watches, a normal game itself.
    fn notify_spectator_counts(&self) {
        if !self.is_game() || !self.is_ep3() {
            return;
        }
        if self.check_flag(LobbyFlag::IsSpectatorTeam) {
            if let Some(watched) = self.watched_lobby() {
                let watched_id = watched.read().lobby_id;
                self.event_sink.update_game_metadata(watched_id);
            }
        } else {
            self.event_sink.update_game_metadata(self.lobby_id);
        }
    }

    /// Issue ids for every inventory item, and for the bank if it has any
    /// contents. When `consume_ids` is false the inventory ids are tentative:
    /// the slot counter is restored so the same ids can be issued again on
    /// the real assignment.
    pub(crate) fn assign_inventory_and_bank_item_ids(
        &mut self,
        client: &SharedClient,
        consume_ids: bool,
    ) {
        let slot = client.lobby_client_id();
        let original_next_id = self.item_ids.next_for_client(slot);
        let mut character = client.character();
        for item in &character.inventory {
            item.set_id(self.item_ids.generate(slot, self.max_clients));
        }
        if !consume_ids {
            self.item_ids.set_next_for_client(slot, original_next_id);
        }
        if !character.bank.is_empty() {
            character.assign_bank_item_ids(BANK_BASE_ITEM_ID + (u32::from(slot) << 20));
        }
        tracing::debug!(
            lobby_id = self.lobby_id,
            client_id = slot,
            consume_ids,
            "assigned inventory and bank item ids"
        );
    }

    // Lobby-level floor-item API. Adds trigger eviction so the per-client
    // bound holds after every mutation, and evictions notify every client
    // that could see the item.

    pub fn item_exists(&self, floor: u8, item_id: u32) -> bool {
        self.floor_item_managers
            .get(usize::from(floor))
            .is_some_and(|manager| manager.exists(item_id))
    }

    pub fn find_item(&self, floor: u8, item_id: u32) -> Result<Arc<FloorItem>, LobbyError> {
        self.floor_item_managers
            .get(usize::from(floor))
            .ok_or(LobbyError::InvalidFloor { floor })?
            .find(item_id)
    }

    pub fn add_item(
        &mut self,
        floor: u8,
        data: ItemData,
        x: f32,
        z: f32,
        visibility_flags: u16,
    ) -> Result<Arc<FloorItem>, LobbyError> {
        let item = self
            .floor_item_manager_mut(floor)?
            .add_new(data, x, z, visibility_flags)?;
        self.evict_items_from_floor(floor)?;
        Ok(item)
    }

    pub fn add_existing_item(
        &mut self,
        floor: u8,
        item: Arc<FloorItem>,
    ) -> Result<(), LobbyError> {
        self.floor_item_manager_mut(floor)?.add(item)?;
        self.evict_items_from_floor(floor)
    }

    pub fn remove_item(
        &mut self,
        floor: u8,
        item_id: u32,
        requesting_client_id: u8,
    ) -> Result<Arc<FloorItem>, LobbyError> {
        self.floor_item_manager_mut(floor)?
            .remove(item_id, requesting_client_id)
    }

    pub fn evict_items_from_floor(&mut self, floor: u8) -> Result<(), LobbyError> {
        let evicted = self.floor_item_manager_mut(floor)?.evict()?;
        for item in &evicted {
            for (slot, occupant) in self.clients.iter().enumerate() {
                if let Some(client) = occupant {
                    if item.visible_to_client(slot as u8) {
                        self.event_sink
                            .destroy_floor_item(client, item.data.id(), floor);
                    }
                }
            }
        }
        Ok(())
    }

    pub fn generate_item_id(&mut self, client_id: u8) -> u32 {
        self.item_ids.generate(client_id, self.max_clients)
    }

    pub fn on_item_id_generated_externally(&mut self, item_id: u32) {
        self.item_ids.observe_external(item_id);
    }

    pub fn reset_next_item_ids(&mut self) {
        self.item_ids.reset();
    }
}

/// Move a client between lobbies. Capacity on the destination is checked
/// before either lobby is mutated, so a failed move leaves the client where
/// it was. Moving a client to the lobby it is already in is a no-op.
pub fn move_client_to_lobby(
    source: &SharedLobby,
    dest: &SharedLobby,
    client: &SharedClient,
    required_slot: Option<u8>,
) -> Result<(), LobbyError> {
    if Arc::ptr_eq(source, dest) {
        return Ok(());
    }

    {
        let dest_lobby = dest.read();
        match required_slot {
            Some(required) => {
                let index = usize::from(required);
                if index >= MAX_LOBBY_SLOTS || dest_lobby.clients[index].is_some() {
                    return Err(LobbyError::SlotInUse { slot: required });
                }
            }
            None => {
                let min_slot = if dest_lobby.check_flag(LobbyFlag::IsSpectatorTeam) {
                    4
                } else {
                    0
                };
                let available_slots = usize::from(dest_lobby.max_clients).saturating_sub(min_slot);
                if dest_lobby.count_clients() >= available_slots {
                    return Err(LobbyError::Full);
                }
            }
        }
    }

    source.write().remove_client(client)?;
    dest.write().add_client(client, required_slot)?;
    Ok(())
}
