//! Game version, episode, mode, and drop-mode enumerations shared across the
//! lobby core.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Every client build the server can speak to. The numeric value is the bit
/// index used in lobby `allowed_versions` masks.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[repr(u8)]
pub enum Version {
    DcNte = 0,
    DcV1Prototype = 1,
    DcV1 = 2,
    DcV2 = 3,
    PcNte = 4,
    PcV2 = 5,
    PcPatch = 6,
    BbPatch = 7,
    GcNte = 8,
    GcV3 = 9,
    GcEp3Nte = 10,
    GcEp3 = 11,
    XbV3 = 12,
    BbV4 = 13,
}

/// Mask covering every version bit.
pub const ALL_VERSIONS_MASK: u16 = 0x3FFF;

impl Version {
    /// Bit for this version in an `allowed_versions` mask.
    pub fn bit(self) -> u16 {
        1 << (self as u8)
    }

    /// Dreamcast v1 family (including the NTE and the 11/2000 prototype).
    pub fn is_v1(self) -> bool {
        matches!(self, Self::DcNte | Self::DcV1Prototype | Self::DcV1)
    }

    /// Episode 3 client family.
    pub fn is_ep3(self) -> bool {
        matches!(self, Self::GcEp3Nte | Self::GcEp3)
    }

    /// Patch-server clients never hold game sessions.
    pub fn is_patch(self) -> bool {
        matches!(self, Self::PcPatch | Self::BbPatch)
    }
}

/// Episode selection for a game. The values match the wire encoding, which is
/// why Episode 4 is not contiguous with the others.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[repr(u8)]
pub enum Episode {
    None = 0,
    Ep1 = 1,
    Ep2 = 2,
    Ep4 = 4,
}

/// Game mode. Declaration order is the browse-listing sort order.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[repr(u8)]
pub enum GameMode {
    Normal = 0,
    Battle = 1,
    Challenge = 2,
    Solo = 3,
}

/// How item drops are produced in a game.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DropMode {
    /// No items drop at all.
    Disabled,
    /// The game leader's client decides drops and tells the server.
    #[default]
    Client,
    /// The server decides drops; everyone sees the same item.
    ServerShared,
    /// The server decides drops; each player sees their own item.
    ServerPrivate,
    /// The server decides drops; each player gets a copy of the same item.
    ServerDuplicate,
}

/// Failure to parse an enum from its configured name.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("invalid drop mode name: {0:?}")]
pub struct InvalidDropModeName(pub String);

impl DropMode {
    pub fn name(self) -> &'static str {
        match self {
            Self::Disabled => "DISABLED",
            Self::Client => "CLIENT",
            Self::ServerShared => "SERVER_SHARED",
            Self::ServerPrivate => "SERVER_PRIVATE",
            Self::ServerDuplicate => "SERVER_DUPLICATE",
        }
    }
}

impl fmt::Display for DropMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for DropMode {
    type Err = InvalidDropModeName;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "DISABLED" => Ok(Self::Disabled),
            "CLIENT" => Ok(Self::Client),
            "SERVER_SHARED" => Ok(Self::ServerShared),
            "SERVER_PRIVATE" => Ok(Self::ServerPrivate),
            "SERVER_DUPLICATE" => Ok(Self::ServerDuplicate),
            other => Err(InvalidDropModeName(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_bits_are_distinct_and_fit_the_mask() {
        let versions = [
            Version::DcNte,
            Version::DcV1Prototype,
            Version::DcV1,
            Version::DcV2,
            Version::PcNte,
            Version::PcV2,
            Version::PcPatch,
            Version::BbPatch,
            Version::GcNte,
            Version::GcV3,
            Version::GcEp3Nte,
            Version::GcEp3,
            Version::XbV3,
            Version::BbV4,
        ];
        let mut mask = 0u16;
        for v in versions {
            assert_eq!(mask & v.bit(), 0, "{v:?} shares a bit");
            mask |= v.bit();
        }
        assert_eq!(mask, ALL_VERSIONS_MASK);
    }

    #[test]
    fn v1_family_is_exactly_the_dreamcast_v1_builds() {
        assert!(Version::DcNte.is_v1());
        assert!(Version::DcV1Prototype.is_v1());
        assert!(Version::DcV1.is_v1());
        assert!(!Version::DcV2.is_v1());
        assert!(!Version::BbV4.is_v1());
    }

    #[test]
    fn drop_mode_names_round_trip() {
        for mode in [
            DropMode::Disabled,
            DropMode::Client,
            DropMode::ServerShared,
            DropMode::ServerPrivate,
            DropMode::ServerDuplicate,
        ] {
            assert_eq!(mode.name().parse::<DropMode>(), Ok(mode));
        }
        assert_eq!(
            "SERVER_BOGUS".parse::<DropMode>(),
            Err(InvalidDropModeName("SERVER_BOGUS".to_string()))
        );
    }

    #[test]
    fn episode_ordering_matches_listing_order() {
        assert!(Episode::Ep1 < Episode::Ep2);
        assert!(Episode::Ep2 < Episode::Ep4);
        assert!(Episode::None < Episode::Ep1);
    }
}
