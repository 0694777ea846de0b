//! Item-drop generator adapter.
//!
//! The actual drop algorithms (probability rolls, rare tables, tekker
//! adjustments) live outside this core. The lobby is responsible only for
//! building the creator with the right tables for its base version and game
//! parameters, and for tearing it down when the drop mode no longer needs it.

use std::sync::Arc;

use crate::items::{
    ArmorRandomSet, CommonItemSet, ItemParameterTable, ItemStackLimits, RareItemSet,
    TekkerAdjustmentSet, ToolRandomSet, WeaponRandomSet,
};
use crate::quest::BattleRules;
use crate::version::{Episode, GameMode};

#[allow(dead_code)]
pub struct ItemCreator {
    common_item_set: Arc<CommonItemSet>,
    rare_item_set: Arc<RareItemSet>,
    armor_random_set: Arc<ArmorRandomSet>,
    tool_random_set: Arc<ToolRandomSet>,
    weapon_random_set: Arc<WeaponRandomSet>,
    tekker_adjustment_set: Arc<TekkerAdjustmentSet>,
    item_parameter_table: Arc<ItemParameterTable>,
    stack_limits: Arc<ItemStackLimits>,
    episode: Episode,
    mode: GameMode,
    difficulty: u8,
    section_id: u8,
    battle_rules: Option<Arc<BattleRules>>,
}

impl ItemCreator {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        common_item_set: Arc<CommonItemSet>,
        rare_item_set: Arc<RareItemSet>,
        armor_random_set: Arc<ArmorRandomSet>,
        tool_random_set: Arc<ToolRandomSet>,
        weapon_random_set: Arc<WeaponRandomSet>,
        tekker_adjustment_set: Arc<TekkerAdjustmentSet>,
        item_parameter_table: Arc<ItemParameterTable>,
        stack_limits: Arc<ItemStackLimits>,
        episode: Episode,
        mode: GameMode,
        difficulty: u8,
        section_id: u8,
        battle_rules: Option<Arc<BattleRules>>,
    ) -> Self {
        Self {
            common_item_set,
            rare_item_set,
            armor_random_set,
            tool_random_set,
            weapon_random_set,
            tekker_adjustment_set,
            item_parameter_table,
            stack_limits,
            episode,
            mode,
            difficulty,
            section_id,
            battle_rules,
        }
    }

    pub fn episode(&self) -> Episode {
        self.episode
    }

    pub fn mode(&self) -> GameMode {
        self.mode
    }
}

impl std::fmt::Debug for ItemCreator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ItemCreator")
            .field("episode", &self.episode)
            .field("mode", &self.mode)
            .field("difficulty", &self.difficulty)
            .field("section_id", &self.section_id)
            .finish_non_exhaustive()
    }
}
