//! Authoritative in-memory player store.
//!
//! One `PlayerRegistry` owns every player at the table: balances, trust,
//! and the append-only audit history. It is the only place player state
//! is mutated; the gateway holds it behind a single lock and broadcasts
//! after each change. Nothing here is persisted — players are long-lived
//! relative to connections, not to the process.

pub mod player;
pub mod store;

pub use {
    player::{HistoryEntry, Player},
    store::{PlayerRegistry, RegistryError},
};
