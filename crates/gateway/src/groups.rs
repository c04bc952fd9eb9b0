use std::collections::{HashMap, HashSet};

/// Broadcast group membership: the hosts group plus one exclusive channel
/// per live player. Pure bookkeeping — validation lives with the method
/// handlers, entity state lives in the player registry.
#[derive(Debug, Default)]
pub struct GroupRegistry {
    /// Connections that joined the hosts group.
    hosts: HashSet<String>,
    /// channel → member conn_ids. Several connections may share one
    /// channel (two tabs viewing the same player).
    channels: HashMap<String, HashSet<String>>,
    /// conn_id → channels (reverse lookup for disconnect cleanup).
    by_conn: HashMap<String, HashSet<String>>,
}

impl GroupRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn join_hosts(&mut self, conn_id: &str) {
        self.hosts.insert(conn_id.to_string());
    }

    pub fn leave_hosts(&mut self, conn_id: &str) -> bool {
        self.hosts.remove(conn_id)
    }

    pub fn is_host(&self, conn_id: &str) -> bool {
        self.hosts.contains(conn_id)
    }

    /// Conn ids of all hosts.
    pub fn hosts(&self) -> Vec<String> {
        self.hosts.iter().cloned().collect()
    }

    pub fn host_count(&self) -> usize {
        self.hosts.len()
    }

    pub fn join_channel(&mut self, conn_id: &str, channel: &str) {
        self.channels
            .entry(channel.to_string())
            .or_default()
            .insert(conn_id.to_string());
        self.by_conn
            .entry(conn_id.to_string())
            .or_default()
            .insert(channel.to_string());
    }

    /// Evict every member of a channel (a removed player's viewers stay
    /// connected to the transport, they just stop receiving that feed).
    /// Returns the number of connections evicted.
    pub fn evict_channel(&mut self, channel: &str) -> usize {
        let Some(members) = self.channels.remove(channel) else {
            return 0;
        };
        for conn_id in &members {
            if let Some(chans) = self.by_conn.get_mut(conn_id) {
                chans.remove(channel);
                if chans.is_empty() {
                    self.by_conn.remove(conn_id);
                }
            }
        }
        members.len()
    }

    /// Conn ids of a channel's members.
    pub fn channel_members(&self, channel: &str) -> Vec<String> {
        self.channels
            .get(channel)
            .map(|m| m.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Remove a connection from the hosts group and every channel.
    /// Called on disconnect; entity state is untouched.
    pub fn drop_conn(&mut self, conn_id: &str) {
        self.leave_hosts(conn_id);
        if let Some(chans) = self.by_conn.remove(conn_id) {
            for channel in chans {
                if let Some(members) = self.channels.get_mut(&channel) {
                    members.remove(conn_id);
                    if members.is_empty() {
                        self.channels.remove(&channel);
                    }
                }
            }
        }
    }
}
