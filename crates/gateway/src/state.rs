use std::{
    collections::HashMap,
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
    time::Instant,
};

use tokio::sync::{RwLock, mpsc};

use tably_registry::PlayerRegistry;

use crate::groups::GroupRegistry;

// ── Connected client ─────────────────────────────────────────────────────────

/// A WebSocket client currently connected to the gateway.
#[derive(Debug)]
pub struct ConnectedClient {
    pub conn_id: String,
    /// Channel for sending serialized frames to this client's write loop.
    pub sender: mpsc::UnboundedSender<String>,
    pub remote_ip: Option<String>,
    pub connected_at: Instant,
}

impl ConnectedClient {
    /// Send a serialized JSON frame to this client. Fire-and-forget: a
    /// false return means the write loop is gone, which disconnect
    /// cleanup will observe shortly.
    pub fn send(&self, frame: &str) -> bool {
        self.sender.send(frame.to_string()).is_ok()
    }
}

// ── Gateway state ────────────────────────────────────────────────────────────

/// Shared gateway runtime state, wrapped in Arc for use across async tasks.
///
/// Lock order where more than one is needed: `players` → `groups` →
/// `clients`. Mutating handlers hold the `players` write lock for the
/// whole validate→mutate→render-views section so no partial mutation is
/// ever observable and concurrent adjusts cannot lose updates.
pub struct GatewayState {
    /// All connected WebSocket clients, keyed by conn_id.
    pub clients: RwLock<HashMap<String, ConnectedClient>>,
    /// Authoritative player store.
    pub players: RwLock<PlayerRegistry>,
    /// Hosts group + player channel membership.
    pub groups: RwLock<GroupRegistry>,
    /// Monotonically increasing sequence counter for event pushes.
    pub seq: AtomicU64,
    /// Server version string.
    pub version: String,
    /// Hostname for status reporting.
    pub hostname: String,
}

impl GatewayState {
    pub fn new() -> Arc<Self> {
        let hostname = hostname::get()
            .ok()
            .and_then(|h| h.into_string().ok())
            .unwrap_or_else(|| "unknown".into());

        Arc::new(Self {
            clients: RwLock::new(HashMap::new()),
            players: RwLock::new(PlayerRegistry::new()),
            groups: RwLock::new(GroupRegistry::new()),
            seq: AtomicU64::new(0),
            version: env!("CARGO_PKG_VERSION").to_string(),
            hostname,
        })
    }

    pub fn next_seq(&self) -> u64 {
        self.seq.fetch_add(1, Ordering::Relaxed) + 1
    }

    /// Register a new client connection.
    pub async fn register_client(&self, client: ConnectedClient) {
        let conn_id = client.conn_id.clone();
        self.clients.write().await.insert(conn_id, client);
    }

    /// Remove a client by conn_id. Returns the removed client if found.
    pub async fn remove_client(&self, conn_id: &str) -> Option<ConnectedClient> {
        self.clients.write().await.remove(conn_id)
    }

    /// Number of connected clients.
    pub async fn client_count(&self) -> usize {
        self.clients.read().await.len()
    }
}
