use super::floor_items::{FloorItemManager, NO_REQUESTING_CLIENT, PER_CLIENT_QUEUE_LIMIT};
use super::{LobbyError, MAX_LOBBY_SLOTS};
use crate::items::ItemData;
use proptest::prelude::*;

fn manager() -> FloorItemManager {
    FloorItemManager::new(1, 0)
}

fn add(manager: &mut FloorItemManager, item_id: u32, visibility: u16) {
    manager
        .add_new(ItemData::new(item_id), 0.0, 0.0, visibility)
        .expect("add succeeds");
}

/// Queue-consistency invariant: for every client, the queue holds exactly the
/// items whose visibility bit is set, in ascending drop order.
fn assert_queues_consistent(manager: &FloorItemManager) {
    for client_id in 0..MAX_LOBBY_SLOTS as u8 {
        let queued: Vec<u32> = manager
            .queue_snapshot(client_id)
            .iter()
            .map(|fi| fi.data.id())
            .collect();
        let mut expected: Vec<(u64, u32)> = manager
            .item_ids()
            .into_iter()
            .map(|id| manager.find(id).unwrap())
            .filter(|fi| fi.visible_to_client(client_id))
            .map(|fi| (fi.drop_number, fi.data.id()))
            .collect();
        expected.sort_unstable();
        let expected: Vec<u32> = expected.into_iter().map(|(_, id)| id).collect();
        assert_eq!(queued, expected, "queue {client_id} diverged from items");

        let drop_numbers: Vec<u64> = manager
            .queue_snapshot(client_id)
            .iter()
            .map(|fi| fi.drop_number)
            .collect();
        let mut sorted = drop_numbers.clone();
        sorted.sort_unstable();
        assert_eq!(drop_numbers, sorted, "queue {client_id} not in drop order");
    }
}

#[test]
fn added_items_land_in_every_visible_queue() {
    let mut manager = manager();
    add(&mut manager, 0x10, 0b0000_0000_0101);
    assert!(manager.exists(0x10));
    assert_eq!(manager.queue_len(0), 1);
    assert_eq!(manager.queue_len(1), 0);
    assert_eq!(manager.queue_len(2), 1);
    assert_queues_consistent(&manager);
}

#[test]
fn visibility_bits_above_the_client_slots_are_masked_off() {
    let mut manager = manager();
    add(&mut manager, 0x10, 0xF001);
    let item = manager.find(0x10).unwrap();
    assert_eq!(item.visibility_flags, 0x001);
}

#[test]
fn adding_an_invisible_item_is_an_invariant_violation() {
    let mut manager = manager();
    let err = manager
        .add_new(ItemData::new(0x10), 0.0, 0.0, 0x0000)
        .unwrap_err();
    assert!(matches!(err, LobbyError::Invariant(_)));
}

#[test]
fn duplicate_item_ids_are_rejected() {
    let mut manager = manager();
    add(&mut manager, 0x10, 0x001);
    let err = manager
        .add_new(ItemData::new(0x10), 1.0, 1.0, 0x002)
        .unwrap_err();
    assert!(matches!(err, LobbyError::DuplicateItem { item_id: 0x10 }));
    // The failed add must not leave queue residue.
    assert_queues_consistent(&manager);
}

#[test]
fn removal_requires_visibility_unless_server_initiated() {
    let mut manager = manager();
    add(&mut manager, 0x10, 0x001);

    let err = manager.remove(0x10, 1).unwrap_err();
    assert!(matches!(
        err,
        LobbyError::NoItemAccess {
            item_id: 0x10,
            client_id: 1
        }
    ));
    assert!(manager.exists(0x10));

    let removed = manager.remove(0x10, NO_REQUESTING_CLIENT).unwrap();
    assert_eq!(removed.data.id(), 0x10);
    assert!(!manager.exists(0x10));
    assert_queues_consistent(&manager);
}

#[test]
fn removing_a_missing_item_is_not_found() {
    let mut manager = manager();
    let err = manager.remove(0xDEAD, 0).unwrap_err();
    assert!(matches!(err, LobbyError::ItemNotFound { item_id: 0xDEAD }));
}

#[test]
fn eviction_keeps_the_oldest_forty_eight_out() {
    let mut manager = manager();
    let mut evicted_ids = Vec::new();
    for n in 0..60u32 {
        add(&mut manager, 0x100 + n, 0x001);
        for item in manager.evict().expect("evict succeeds") {
            evicted_ids.push(item.drop_number);
        }
    }
    assert_eq!(manager.queue_len(0), PER_CLIENT_QUEUE_LIMIT);
    assert_eq!(manager.item_count(), PER_CLIENT_QUEUE_LIMIT);
    assert_eq!(evicted_ids, (0..12).collect::<Vec<u64>>());
    assert_queues_consistent(&manager);
}

#[test]
fn eviction_for_one_client_removes_the_item_for_all() {
    let mut manager = manager();
    // Fill client 0's queue past the limit with items also visible to
    // client 1; client 1 stays under its own limit the whole time.
    for n in 0..(PER_CLIENT_QUEUE_LIMIT as u32 + 1) {
        add(&mut manager, 0x100 + n, 0x003);
    }
    let evicted = manager.evict().expect("evict succeeds");
    assert_eq!(evicted.len(), 1);
    assert_eq!(evicted[0].drop_number, 0);
    assert_eq!(manager.queue_len(0), PER_CLIENT_QUEUE_LIMIT);
    assert_eq!(manager.queue_len(1), PER_CLIENT_QUEUE_LIMIT);
    assert_queues_consistent(&manager);
}

#[test]
fn clear_inaccessible_drops_items_nobody_left_can_see() {
    let mut manager = manager();
    add(&mut manager, 0x10, 0x001);
    add(&mut manager, 0x11, 0x002);
    add(&mut manager, 0x12, 0x003);
    manager.clear_inaccessible(0x002).expect("clear succeeds");
    assert!(!manager.exists(0x10));
    assert!(manager.exists(0x11));
    assert!(manager.exists(0x12));
    assert_queues_consistent(&manager);
}

#[test]
fn clear_private_keeps_only_items_public_to_the_low_four_slots() {
    let mut manager = manager();
    add(&mut manager, 0x10, 0x00F);
    add(&mut manager, 0x11, 0x007);
    add(&mut manager, 0x12, 0xFFF);
    add(&mut manager, 0x13, 0x010);
    manager.clear_private().expect("clear succeeds");
    assert!(manager.exists(0x10));
    assert!(!manager.exists(0x11));
    assert!(manager.exists(0x12), "wider-than-public masks still contain 0x00F");
    assert!(!manager.exists(0x13));
    assert_queues_consistent(&manager);
}

#[test]
fn clear_resets_drop_numbering() {
    let mut manager = manager();
    add(&mut manager, 0x10, 0x001);
    add(&mut manager, 0x11, 0x001);
    manager.clear();
    assert_eq!(manager.item_count(), 0);
    add(&mut manager, 0x12, 0x001);
    assert_eq!(manager.find(0x12).unwrap().drop_number, 0);
}

#[test]
fn reassign_renumbers_in_ascending_old_id_order() {
    let mut manager = manager();
    add(&mut manager, 0xA, 0x007);
    add(&mut manager, 0xB, 0x007);
    add(&mut manager, 0xC, 0x007);

    let next = manager.reassign_all_item_ids(0x100).expect("reassign succeeds");
    assert_eq!(next, 0x103);
    assert_eq!(manager.item_ids(), vec![0x100, 0x101, 0x102]);

    // Queues keep their drop order and map old positions onto the new ids.
    for client_id in 0..3u8 {
        let queued: Vec<(u64, u32)> = manager
            .queue_snapshot(client_id)
            .iter()
            .map(|fi| (fi.drop_number, fi.data.id()))
            .collect();
        assert_eq!(queued, vec![(0, 0x100), (1, 0x101), (2, 0x102)]);
    }
    assert_queues_consistent(&manager);
}

#[test]
fn reassign_does_not_reset_drop_numbering() {
    let mut manager = manager();
    add(&mut manager, 0xA, 0x001);
    manager.reassign_all_item_ids(0x100).expect("reassign succeeds");
    add(&mut manager, 0xB, 0x001);
    assert_eq!(manager.find(0xB).unwrap().drop_number, 1);
}

proptest! {
    #[test]
    fn random_mutations_preserve_queue_consistency(
        ops in proptest::collection::vec((1u16..0x0FFF, any::<u8>()), 1..80)
    ) {
        let mut manager = manager();
        let mut next_id = 0x1000u32;
        let mut live: Vec<u32> = Vec::new();
        for (visibility, action) in ops {
            match action % 4 {
                0 | 1 => {
                    manager
                        .add_new(ItemData::new(next_id), 0.0, 0.0, visibility)
                        .expect("add succeeds");
                    live.push(next_id);
                    next_id += 1;
                }
                2 if !live.is_empty() => {
                    let index = usize::from(action) % live.len();
                    let id = live.swap_remove(index);
                    manager.remove(id, NO_REQUESTING_CLIENT).expect("remove succeeds");
                }
                _ => {
                    let evicted = manager.evict().expect("evict succeeds");
                    for item in evicted {
                        live.retain(|&id| id != item.data.id());
                    }
                }
            }
            assert_queues_consistent(&manager);
        }
        manager.evict().expect("evict succeeds");
        for client_id in 0..MAX_LOBBY_SLOTS as u8 {
            prop_assert!(manager.queue_len(client_id) <= PER_CLIENT_QUEUE_LIMIT);
        }
    }
}
