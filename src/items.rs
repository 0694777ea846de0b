//! Item payloads and the opaque drop-table surfaces consumed from
//! `ServerState`.

use std::sync::atomic::{AtomicU32, Ordering};

/// A single item as it exists in an inventory, a bank, or on the floor.
///
/// The id is atomic because floor items are shared between the by-id map and
/// the per-client drop queues, and id reassignment happens while those shared
/// handles are live.
#[derive(Debug, Default)]
pub struct ItemData {
    id: AtomicU32,
    /// Opaque item identity bytes (kind, grind, flags, ...).
    pub data1: [u8; 12],
    /// Opaque secondary bytes (mag stats, stack count, ...).
    pub data2: [u8; 4],
}

impl ItemData {
    pub fn new(id: u32) -> Self {
        Self {
            id: AtomicU32::new(id),
            data1: [0; 12],
            data2: [0; 4],
        }
    }

    pub fn id(&self) -> u32 {
        self.id.load(Ordering::Relaxed)
    }

    pub fn set_id(&self, id: u32) {
        self.id.store(id, Ordering::Relaxed);
    }
}

impl Clone for ItemData {
    fn clone(&self) -> Self {
        Self {
            id: AtomicU32::new(self.id()),
            data1: self.data1,
            data2: self.data2,
        }
    }
}

impl PartialEq for ItemData {
    fn eq(&self, other: &Self) -> bool {
        self.id() == other.id() && self.data1 == other.data1 && self.data2 == other.data2
    }
}

impl Eq for ItemData {}

// Drop-table collaborators. Their contents (probability tables, random sets,
// stack limits) are loaded and interpreted outside this core; the lobby only
// selects which table feeds the item creator.

#[derive(Debug, Default)]
pub struct CommonItemSet;

#[derive(Debug, Default)]
pub struct RareItemSet;

#[derive(Debug, Default)]
pub struct ArmorRandomSet;

#[derive(Debug, Default)]
pub struct ToolRandomSet;

#[derive(Debug, Default)]
pub struct WeaponRandomSet;

#[derive(Debug, Default)]
pub struct TekkerAdjustmentSet;

#[derive(Debug, Default)]
pub struct ItemParameterTable;

#[derive(Debug, Default)]
pub struct ItemStackLimits;
