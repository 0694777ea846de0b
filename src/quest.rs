//! Quest boundary contract.
//!
//! Quest files, their scripts, and their DAT payloads are managed outside the
//! lobby core; the lobby only needs enough of a quest's shape to gate joins
//! and to filter browse lists.

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::version::Episode;

/// Battle-mode rule block attached to some quests. Interpreted by the item
/// creator and the battle subsystem, not by the lobby itself.
#[derive(Debug, Clone, Default)]
pub struct BattleRules {
    pub tech_disk_mode: u8,
    pub weapon_and_armor_mode: u8,
    pub forbid_scape_dolls: bool,
}

/// Whether a quest should appear in a client-facing quest menu, and how.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum QuestIncludeState {
    /// Listed and selectable.
    Available,
    /// Listed but greyed out.
    Disabled,
    /// Not listed at all.
    Hidden,
}

/// A loaded quest, as the lobby core sees it.
#[derive(Debug)]
pub struct Quest {
    pub name: String,
    pub episode: Episode,
    /// Versions whose clients can run this quest.
    pub allowed_versions: u16,
    /// Bit per difficulty (0..3).
    pub available_difficulties: u8,
    /// Party-size ceiling, counting the candidate client.
    pub max_players: usize,
    /// Whether the quest script still works when a v1 client is present.
    pub v1_compatible: bool,
    /// Seasonal-event gate, if any.
    pub required_event: Option<u8>,
    pub battle_rules: Option<Arc<BattleRules>>,
    /// Decompressed DAT contents for map generation (boundary payload).
    pub dat_contents_decompressed: Option<Arc<Vec<u8>>>,
}

impl Quest {
    /// A quest with no gates beyond the given version mask. Convenient base
    /// for tests and defaults.
    pub fn open(name: impl Into<String>, episode: Episode, allowed_versions: u16) -> Self {
        Self {
            name: name.into(),
            episode,
            allowed_versions,
            available_difficulties: 0x0F,
            max_players: 4,
            v1_compatible: true,
            required_event: None,
            battle_rules: None,
            dat_contents_decompressed: None,
        }
    }
}
