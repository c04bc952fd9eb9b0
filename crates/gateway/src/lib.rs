//! Gateway: WebSocket server, protocol dispatch, player/group registries.
//!
//! Lifecycle:
//! 1. Load config, resolve bind address
//! 2. Start HTTP server (health endpoint)
//! 3. Attach WebSocket upgrade handler
//!
//! Request flow: validate → apply to the player registry → acknowledge the
//! caller → push fresh views to the affected groups. Only the method
//! handlers in `methods.rs` write to the registries; broadcast and the ws
//! loops are read-only over them.

pub mod broadcast;
pub mod groups;
pub mod methods;
pub mod server;
pub mod state;
pub mod ws;
