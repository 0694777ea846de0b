//! Battle recording boundary.
//!
//! When a game records a battle, membership changes are captured so playback
//! can reconstruct who was present. Event payload interpretation lives in the
//! playback subsystem.

use chrono::{DateTime, Utc};
use parking_lot::Mutex;

/// Snapshot of a player at the moment they joined a recorded battle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BattleRecordPlayer {
    pub serial_number: u32,
    pub name: String,
    pub language: u8,
    pub level: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BattleRecordEvent {
    PlayerJoined {
        client_id: u8,
        player: BattleRecordPlayer,
    },
    PlayerLeft {
        client_id: u8,
    },
}

#[derive(Debug, Default)]
pub struct BattleRecord {
    events: Mutex<Vec<(DateTime<Utc>, BattleRecordEvent)>>,
}

impl BattleRecord {
    pub fn add_player(&self, client_id: u8, player: BattleRecordPlayer) {
        self.events
            .lock()
            .push((Utc::now(), BattleRecordEvent::PlayerJoined { client_id, player }));
    }

    pub fn delete_player(&self, client_id: u8) {
        self.events
            .lock()
            .push((Utc::now(), BattleRecordEvent::PlayerLeft { client_id }));
    }

    pub fn events(&self) -> Vec<BattleRecordEvent> {
        self.events.lock().iter().map(|(_, e)| e.clone()).collect()
    }
}
