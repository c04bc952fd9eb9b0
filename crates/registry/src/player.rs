use serde::{Deserialize, Serialize};

/// One audit record. Immutable once appended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// ISO-8601 UTC timestamp.
    pub timestamp: String,
    pub note: String,
}

/// Authoritative record of one participant.
///
/// `id`, `name`, and `channel` are immutable after creation; `money` and
/// `trust` never go below zero; `history` is append-only and capped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Player {
    pub id: String,
    pub name: String,
    pub money: i64,
    pub trust: i64,
    pub history: Vec<HistoryEntry>,
    /// Exclusive broadcast group for this player's viewers. Allocated
    /// with the player, never reused.
    pub channel: String,
}
