//! Outbound notification seam.
//!
//! The lobby core emits a small number of notifications synchronously from
//! inside its operations; the protocol layer implements this trait to turn
//! them into wire commands. Tests install a recording sink instead.

use parking_lot::Mutex;
use uuid::Uuid;

use crate::client::Client;

pub trait EventSink: Send + Sync {
    /// One per (evicted or destroyed item, client that could see it).
    fn destroy_floor_item(&self, client: &Client, item_id: u32, floor: u8);

    /// Spectator-count refresh for an Episode 3 game.
    fn update_game_metadata(&self, lobby_id: u32);
}

/// Sink that drops everything. Used by the binary until the protocol layer is
/// attached, and by tests that don't care about notifications.
#[derive(Debug, Default)]
pub struct NullEventSink;

impl EventSink for NullEventSink {
    fn destroy_floor_item(&self, _client: &Client, _item_id: u32, _floor: u8) {}

    fn update_game_metadata(&self, _lobby_id: u32) {}
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutboundEvent {
    DestroyFloorItem {
        session_id: Uuid,
        item_id: u32,
        floor: u8,
    },
    GameMetadataUpdated {
        lobby_id: u32,
    },
}

/// Sink that records every notification, for assertions in tests.
#[derive(Debug, Default)]
pub struct RecordingEventSink {
    events: Mutex<Vec<OutboundEvent>>,
}

impl RecordingEventSink {
    pub fn take_events(&self) -> Vec<OutboundEvent> {
        std::mem::take(&mut *self.events.lock())
    }

    pub fn events(&self) -> Vec<OutboundEvent> {
        self.events.lock().clone()
    }
}

impl EventSink for RecordingEventSink {
    fn destroy_floor_item(&self, client: &Client, item_id: u32, floor: u8) {
        self.events.lock().push(OutboundEvent::DestroyFloorItem {
            session_id: client.session_id,
            item_id,
            floor,
        });
    }

    fn update_game_metadata(&self, lobby_id: u32) {
        self.events
            .lock()
            .push(OutboundEvent::GameMetadataUpdated { lobby_id });
    }
}
