//! Join gating.
//!
//! `join_error_for_client` is a pure predicate over the lobby state and a
//! candidate client. It returns a typed refusal rather than failing, so each
//! protocol version can render its own refusal message. `Allowed` means no
//! refusal applies.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::{Lobby, LobbyFlag};
use crate::client::{Client, ClientFlag, LicenseFlag};
use crate::version::GameMode;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JoinError {
    Allowed,
    Full,
    VersionConflict,
    QuestInProgress,
    BattleInProgress,
    Solo,
    IncorrectPassword,
    LevelTooLow,
    LevelTooHigh,
    NoAccessToQuest,
    Loading,
}

impl JoinError {
    pub fn description(&self) -> &'static str {
        match self {
            Self::Allowed => "The game can be joined.",
            Self::Full => "The game is full.",
            Self::VersionConflict => "The game is for a different game version.",
            Self::QuestInProgress => "A quest is already in progress in this game.",
            Self::BattleInProgress => "A battle is already in progress in this game.",
            Self::Solo => "This game is for a single player only.",
            Self::IncorrectPassword => "The game password is incorrect.",
            Self::LevelTooLow => "Your character's level is too low to join this game.",
            Self::LevelTooHigh => "Your character's level is too high to join this game.",
            Self::NoAccessToQuest => "You do not have access to the quest in this game.",
            Self::Loading => "A player in the game is currently loading.",
        }
    }
}

impl fmt::Display for JoinError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.description())
    }
}

impl Lobby {
    /// Compute the refusal (if any) for `client` joining this lobby.
    ///
    /// A `None` password means the caller is probing for a browse list, not
    /// actually joining; password and loading checks are skipped in that
    /// case. Checks are ordered; the first applicable refusal wins.
    pub fn join_error_for_client(&self, client: &Client, password: Option<&str>) -> JoinError {
        if self.count_clients() >= usize::from(self.max_clients) {
            return JoinError::Full;
        }
        if !self.version_is_allowed(client.version())
            && !client.config.check_flag(ClientFlag::DebugEnabled)
        {
            return JoinError::VersionConflict;
        }
        if self.is_game() {
            if self.check_flag(LobbyFlag::QuestInProgress) {
                return JoinError::QuestInProgress;
            }
            if self.check_flag(LobbyFlag::BattleInProgress) {
                return JoinError::BattleInProgress;
            }
            if self.mode == GameMode::Solo {
                return JoinError::Solo;
            }
            let free_join = client
                .license
                .as_ref()
                .is_some_and(|license| license.check_flag(LicenseFlag::FreeJoinGames));
            if !free_join {
                if let Some(password) = password {
                    if !self.password.is_empty() && password != self.password {
                        return JoinError::IncorrectPassword;
                    }
                }
                let level = client.character().level;
                if level < self.min_level {
                    return JoinError::LevelTooLow;
                }
                if level > self.max_level {
                    return JoinError::LevelTooHigh;
                }
                if let Some(quest) = &self.quest {
                    let num_clients = self.count_clients() + 1;
                    let v1_present =
                        client.version().is_v1() || self.any_v1_clients_present();
                    if !client.can_see_quest(
                        quest,
                        self.event,
                        self.difficulty,
                        num_clients,
                        v1_present,
                    ) || !client.can_play_quest(
                        quest,
                        self.event,
                        self.difficulty,
                        num_clients,
                        v1_present,
                    ) {
                        return JoinError::NoAccessToQuest;
                    }
                }
            }
            // A list-view probe must not be refused just because someone is
            // mid-load; only a real join attempt is.
            if password.is_some() && self.any_client_loading() {
                return JoinError::Loading;
            }
        }
        JoinError::Allowed
    }
}
