#![cfg_attr(not(test), deny(clippy::panic))]
#![allow(
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::module_name_repetitions,
    clippy::struct_excessive_bools,
    clippy::too_many_arguments,
    clippy::too_many_lines,
    clippy::similar_names
)]

//! # Starboard Server
//!
//! Lobby and game-session core for a cross-console classic ARPG server
//! emulator: lobby membership, floor items, item-id allocation, join gating,
//! idle timeouts, and browse-list ordering.
//!
//! The protocol layer, map generation, and item-drop algorithms are separate
//! subsystems; this crate exposes the seams they plug into.

/// Battle recording boundary
pub mod battle_record;

/// Client session handles
pub mod client;

/// Server configuration and file loading
pub mod config;

/// Outbound notification seam
pub mod events;

/// Item-drop generator adapter
pub mod item_creator;

/// Item payloads and drop-table surfaces
pub mod items;

/// Lobby and game-session core
pub mod lobby;

/// Structured logging configuration
pub mod logging;

/// Quest boundary contract
pub mod quest;

/// Server-wide state and the lobby registry
pub mod state;

/// Game version, episode, mode, and drop-mode enums
pub mod version;
