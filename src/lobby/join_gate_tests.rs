use std::sync::Arc;

use super::{JoinError, LobbyFlag, SharedLobby};
use crate::client::{Character, Client, ClientFlag, License, LicenseFlag, SharedClient};
use crate::quest::Quest;
use crate::state::ServerState;
use crate::version::{Episode, GameMode, Version, ALL_VERSIONS_MASK};

fn make_client(version: Version, level: u32, serial: u32) -> SharedClient {
    let character = Character {
        name: format!("Hunter{serial}"),
        level,
        ..Character::default()
    };
    Client::new(version, 1, Some(Arc::new(License::new(serial))), character)
}

fn free_join_client(version: Version, level: u32, serial: u32) -> SharedClient {
    let character = Character {
        name: format!("Hunter{serial}"),
        level,
        ..Character::default()
    };
    let license = License::new(serial).with_flag(LicenseFlag::FreeJoinGames);
    Client::new(version, 1, Some(Arc::new(license)), character)
}

fn open_game(state: &Arc<ServerState>) -> SharedLobby {
    let lobby = state.create_lobby(true);
    lobby.write().allowed_versions = ALL_VERSIONS_MASK;
    lobby
}

fn seat(lobby: &SharedLobby, client: &SharedClient) {
    lobby.write().add_client(client, None).expect("join succeeds");
}

#[test]
fn full_lobbies_refuse_before_any_other_check() {
    let state = ServerState::new_for_tests();
    let lobby = open_game(&state);
    {
        let mut guard = lobby.write();
        guard.max_clients = 1;
        // Even a version conflict loses to FULL.
        guard.allowed_versions = Version::GcV3.bit();
    }
    seat(&lobby, &make_client(Version::GcV3, 10, 1));

    let candidate = make_client(Version::DcV2, 10, 2);
    assert_eq!(
        lobby.read().join_error_for_client(&candidate, None),
        JoinError::Full
    );
}

#[test]
fn version_conflicts_refuse_unless_the_client_is_debugging() {
    let state = ServerState::new_for_tests();
    let lobby = open_game(&state);
    lobby.write().allowed_versions = Version::GcV3.bit();

    let candidate = make_client(Version::DcV2, 10, 1);
    assert_eq!(
        lobby.read().join_error_for_client(&candidate, None),
        JoinError::VersionConflict
    );

    candidate.config.set_flag(ClientFlag::DebugEnabled);
    assert_eq!(
        lobby.read().join_error_for_client(&candidate, None),
        JoinError::Allowed
    );
}

#[test]
fn quest_in_progress_refuses_every_candidate() {
    let state = ServerState::new_for_tests();
    let lobby = open_game(&state);
    {
        let mut guard = lobby.write();
        guard.set_flag(LobbyFlag::QuestInProgress);
        guard.min_level = 200;
        guard.password = "secret".to_string();
    }

    // Level and password would refuse too, but the quest flag wins.
    let candidate = free_join_client(Version::GcV3, 1, 1);
    assert_eq!(
        lobby.read().join_error_for_client(&candidate, Some("wrong")),
        JoinError::QuestInProgress
    );
}

#[test]
fn battle_in_progress_and_solo_refuse_in_order() {
    let state = ServerState::new_for_tests();
    let lobby = open_game(&state);
    lobby.write().set_flag(LobbyFlag::BattleInProgress);
    let candidate = make_client(Version::GcV3, 10, 1);
    assert_eq!(
        lobby.read().join_error_for_client(&candidate, None),
        JoinError::BattleInProgress
    );

    lobby.write().clear_flag(LobbyFlag::BattleInProgress);
    lobby.write().mode = GameMode::Solo;
    assert_eq!(
        lobby.read().join_error_for_client(&candidate, None),
        JoinError::Solo
    );
}

#[test]
fn wrong_passwords_refuse_but_list_probes_skip_the_check() {
    let state = ServerState::new_for_tests();
    let lobby = open_game(&state);
    lobby.write().password = "swordfish".to_string();

    let candidate = make_client(Version::GcV3, 10, 1);
    assert_eq!(
        lobby.read().join_error_for_client(&candidate, Some("marlin")),
        JoinError::IncorrectPassword
    );
    assert_eq!(
        lobby.read().join_error_for_client(&candidate, Some("swordfish")),
        JoinError::Allowed
    );
    assert_eq!(
        lobby.read().join_error_for_client(&candidate, None),
        JoinError::Allowed,
        "a list probe never fails the password check"
    );
}

#[test]
fn level_range_is_inclusive_and_free_join_bypasses_it() {
    let state = ServerState::new_for_tests();
    let lobby = open_game(&state);
    {
        let mut guard = lobby.write();
        guard.min_level = 20;
        guard.max_level = 40;
    }

    let low = make_client(Version::GcV3, 5, 1);
    assert_eq!(
        lobby.read().join_error_for_client(&low, None),
        JoinError::LevelTooLow
    );

    let high = make_client(Version::GcV3, 41, 2);
    assert_eq!(
        lobby.read().join_error_for_client(&high, None),
        JoinError::LevelTooHigh
    );

    let at_min = make_client(Version::GcV3, 20, 3);
    assert_eq!(
        lobby.read().join_error_for_client(&at_min, None),
        JoinError::Allowed
    );

    let free = free_join_client(Version::GcV3, 5, 4);
    assert_eq!(
        lobby.read().join_error_for_client(&free, None),
        JoinError::Allowed
    );
}

#[test]
fn loaded_quests_gate_candidates_that_cannot_play_them() {
    let state = ServerState::new_for_tests();
    let lobby = open_game(&state);
    seat(&lobby, &make_client(Version::GcV3, 10, 1));

    // Party-size gate: the candidate would make two players.
    let mut quest = Quest::open("Tight Quarters", Episode::Ep1, ALL_VERSIONS_MASK);
    quest.max_players = 1;
    lobby.write().quest = Some(Arc::new(quest));

    let candidate = make_client(Version::GcV3, 10, 2);
    assert_eq!(
        lobby.read().join_error_for_client(&candidate, None),
        JoinError::NoAccessToQuest
    );

    // v1 gate: a v1 candidate poisons a v1-incompatible quest.
    let mut quest = Quest::open("New Engine Only", Episode::Ep1, ALL_VERSIONS_MASK);
    quest.v1_compatible = false;
    lobby.write().quest = Some(Arc::new(quest));

    let v1_candidate = make_client(Version::DcV1, 10, 3);
    assert_eq!(
        lobby.read().join_error_for_client(&v1_candidate, None),
        JoinError::NoAccessToQuest
    );

    let free = free_join_client(Version::DcV1, 10, 4);
    assert_eq!(
        lobby.read().join_error_for_client(&free, None),
        JoinError::Allowed,
        "free-join licenses skip the quest gate"
    );
}

#[test]
fn loading_players_block_joins_but_not_list_probes() {
    let state = ServerState::new_for_tests();
    let lobby = open_game(&state);
    let loading = make_client(Version::GcV3, 10, 1);
    seat(&lobby, &loading);
    loading.config.set_flag(ClientFlag::LoadingQuest);

    let candidate = make_client(Version::GcV3, 10, 2);
    assert_eq!(
        lobby.read().join_error_for_client(&candidate, Some("")),
        JoinError::Loading
    );
    assert_eq!(
        lobby.read().join_error_for_client(&candidate, None),
        JoinError::Allowed
    );
}

#[test]
fn non_game_lobbies_only_check_capacity_and_version() {
    let state = ServerState::new_for_tests();
    let lobby = state.create_lobby(false);
    {
        let mut guard = lobby.write();
        guard.allowed_versions = ALL_VERSIONS_MASK;
        guard.min_level = 200;
        guard.password = "secret".to_string();
        guard.set_flag(LobbyFlag::QuestInProgress);
    }

    let candidate = make_client(Version::GcV3, 1, 1);
    assert_eq!(
        lobby.read().join_error_for_client(&candidate, Some("wrong")),
        JoinError::Allowed,
        "game-only checks do not apply to social lobbies"
    );
}
