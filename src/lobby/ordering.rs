//! Browse-listing order.
//!
//! Game lists are rendered in a strict total order so that joinable games
//! come first and the rest are grouped predictably. The comparator is a
//! lexicographic key; ties on every key compare equal, which keeps the order
//! a strict weak order suitable for sorting.

use std::cmp::Ordering;

use super::{Lobby, LobbyFlag};

/// Sort key for one lobby. Smaller sorts earlier.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct ListingKey {
    /// 1 = joinable with players, 2 = empty (persistent), 3 = full,
    /// 4 = quest or battle in progress.
    pub priority: u8,
    /// Public games before password-locked ones.
    pub locked: bool,
    pub mode: u8,
    pub episode: u8,
    pub difficulty: u8,
    pub name: String,
}

impl Lobby {
    pub fn listing_key(&self) -> ListingKey {
        let priority = if self.check_flag(LobbyFlag::QuestInProgress)
            || self.check_flag(LobbyFlag::BattleInProgress)
        {
            4
        } else {
            let num_clients = self.count_clients();
            if num_clients == usize::from(self.max_clients) {
                3
            } else if num_clients == 0 {
                2
            } else {
                1
            }
        };
        ListingKey {
            priority,
            locked: !self.password.is_empty(),
            mode: self.mode as u8,
            episode: self.episode as u8,
            difficulty: self.difficulty,
            name: self.name.clone(),
        }
    }
}

/// Listing order between two lobbies.
pub fn listing_order(a: &Lobby, b: &Lobby) -> Ordering {
    a.listing_key().cmp(&b.listing_key())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::version::{Episode, GameMode};
    use proptest::prelude::*;

    fn key(
        priority: u8,
        locked: bool,
        mode: GameMode,
        episode: Episode,
        difficulty: u8,
        name: &str,
    ) -> ListingKey {
        ListingKey {
            priority,
            locked,
            mode: mode as u8,
            episode: episode as u8,
            difficulty,
            name: name.to_string(),
        }
    }

    #[test]
    fn joinable_games_sort_before_empty_full_and_busy() {
        let joinable = key(1, false, GameMode::Normal, Episode::Ep1, 0, "a");
        let empty = key(2, false, GameMode::Normal, Episode::Ep1, 0, "a");
        let full = key(3, false, GameMode::Normal, Episode::Ep1, 0, "a");
        let busy = key(4, false, GameMode::Normal, Episode::Ep1, 0, "a");
        let mut keys = vec![busy.clone(), full.clone(), empty.clone(), joinable.clone()];
        keys.sort();
        assert_eq!(keys, vec![joinable, empty, full, busy]);
    }

    #[test]
    fn public_games_sort_before_locked_games() {
        let public = key(1, false, GameMode::Normal, Episode::Ep1, 0, "z");
        let locked = key(1, true, GameMode::Normal, Episode::Ep1, 0, "a");
        assert!(public < locked);
    }

    #[test]
    fn secondary_keys_break_ties_in_order() {
        let normal = key(1, false, GameMode::Normal, Episode::Ep4, 3, "z");
        let battle = key(1, false, GameMode::Battle, Episode::Ep1, 0, "a");
        assert!(normal < battle, "mode outranks episode/difficulty/name");

        let ep1 = key(1, false, GameMode::Normal, Episode::Ep1, 3, "z");
        let ep2 = key(1, false, GameMode::Normal, Episode::Ep2, 0, "a");
        assert!(ep1 < ep2, "episode outranks difficulty/name");

        let hard = key(1, false, GameMode::Normal, Episode::Ep1, 1, "z");
        let ultimate = key(1, false, GameMode::Normal, Episode::Ep1, 3, "a");
        assert!(hard < ultimate, "difficulty outranks name");

        let alpha = key(1, false, GameMode::Normal, Episode::Ep1, 1, "alpha");
        let beta = key(1, false, GameMode::Normal, Episode::Ep1, 1, "beta");
        assert!(alpha < beta);
    }

    fn arbitrary_key() -> impl Strategy<Value = ListingKey> {
        (
            1u8..=4,
            any::<bool>(),
            0u8..4,
            0u8..5,
            0u8..4,
            "[a-d]{0,3}",
        )
            .prop_map(|(priority, locked, mode, episode, difficulty, name)| ListingKey {
                priority,
                locked,
                mode,
                episode,
                difficulty,
                name,
            })
    }

    proptest! {
        #[test]
        fn listing_order_is_a_strict_weak_order(
            a in arbitrary_key(),
            b in arbitrary_key(),
            c in arbitrary_key(),
        ) {
            use Ordering::{Equal, Greater, Less};

            // Irreflexive / asymmetric.
            prop_assert_eq!(a.cmp(&a), Equal);
            prop_assert_eq!(a.cmp(&b), b.cmp(&a).reverse());

            // Transitive.
            if a.cmp(&b) != Greater && b.cmp(&c) != Greater {
                prop_assert_ne!(a.cmp(&c), Greater);
            }
            if a.cmp(&b) == Less && b.cmp(&c) == Less {
                prop_assert_eq!(a.cmp(&c), Less);
            }
        }
    }
}
