//! Wire protocol shared by the gateway and its clients.
//!
//! All traffic is JSON text frames over a persistent WebSocket:
//! requests (optionally acknowledged), acknowledgements, and
//! server-initiated event pushes scoped to a group (the hosts group or
//! one player's channel).

pub mod error;
pub mod frames;

pub use {
    error::{ErrorShape, error_codes},
    frames::{EventFrame, RequestFrame, ResponseFrame},
};

/// Protocol revision, reported by `health` and the startup banner.
pub const PROTOCOL_VERSION: u32 = 1;

/// Resources granted to every player on join.
pub const STARTING_MONEY: i64 = 1500;
pub const STARTING_TRUST: i64 = 50;

/// Maximum history entries retained per player (oldest dropped first).
pub const HISTORY_CAP: usize = 100;

/// History entries included per player in the hosts summary view.
pub const SUMMARY_HISTORY_LEN: usize = 10;

/// Player names are trimmed, then silently clamped to this length.
pub const NAME_MAX_LEN: usize = 50;

/// Default gateway listen port.
pub const DEFAULT_PORT: u16 = 3000;

/// Event names pushed by the gateway.
pub mod events {
    /// Summary of all players, sent to the hosts group.
    pub const PLAYERS_LIST: &str = "players:list";
    /// Full state of one player, sent to that player's channel.
    pub const PLAYER_STATE: &str = "player:state";
}
