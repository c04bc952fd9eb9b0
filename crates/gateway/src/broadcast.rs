use {serde_json::Value, tracing::warn};

use {
    tably_protocol::{EventFrame, SUMMARY_HISTORY_LEN, events},
    tably_registry::{HistoryEntry, Player, PlayerRegistry},
};

use crate::state::GatewayState;

// ── View builders ────────────────────────────────────────────────────────────
//
// Handlers build both views while still holding the registry lock, so the
// pushes triggered by one mutation always reflect the same snapshot.

fn history_json(entries: &[HistoryEntry]) -> Value {
    let items: Vec<_> = entries
        .iter()
        .map(|e| {
            serde_json::json!({
                "timestamp": e.timestamp,
                "note": e.note,
            })
        })
        .collect();
    Value::Array(items)
}

/// Summary of all players for the hosts group: per player, only the 10
/// most recent history entries.
pub fn host_summary(players: &PlayerRegistry) -> Value {
    let list: Vec<_> = players
        .list()
        .iter()
        .map(|p| {
            let tail_start = p.history.len().saturating_sub(SUMMARY_HISTORY_LEN);
            serde_json::json!({
                "id": p.id,
                "name": p.name,
                "money": p.money,
                "trust": p.trust,
                "history": history_json(&p.history[tail_start..]),
            })
        })
        .collect();
    Value::Array(list)
}

/// Full detail view for one player's channel (complete history).
pub fn player_detail(player: &Player) -> Value {
    serde_json::json!({
        "id": player.id,
        "name": player.name,
        "money": player.money,
        "trust": player.trust,
        "history": history_json(&player.history),
    })
}

// ── Push plumbing ────────────────────────────────────────────────────────────
//
// All sends are fire-and-forget over each client's write channel: no
// delivery confirmation, no backpressure. Payload sizes stay bounded by
// the history caps.

fn serialize_event(state: &GatewayState, event: &str, payload: Value) -> Option<String> {
    let frame = EventFrame::new(event, payload, state.next_seq());
    match serde_json::to_string(&frame) {
        Ok(text) => Some(text),
        Err(e) => {
            warn!(event, error = %e, "failed to serialize event frame");
            None
        },
    }
}

async fn send_to_conns(state: &GatewayState, conn_ids: &[String], frame: &str) {
    let clients = state.clients.read().await;
    for conn_id in conn_ids {
        if let Some(client) = clients.get(conn_id) {
            client.send(frame);
        }
    }
}

/// Push a `players:list` event to every host connection.
pub async fn push_to_hosts(state: &GatewayState, payload: Value) {
    let Some(frame) = serialize_event(state, events::PLAYERS_LIST, payload) else {
        return;
    };
    let hosts = state.groups.read().await.hosts();
    send_to_conns(state, &hosts, &frame).await;
}

/// Push a `player:state` event to every member of one player channel.
pub async fn push_to_channel(state: &GatewayState, channel: &str, payload: Value) {
    let Some(frame) = serialize_event(state, events::PLAYER_STATE, payload) else {
        return;
    };
    let members = state.groups.read().await.channel_members(channel);
    send_to_conns(state, &members, &frame).await;
}

/// Push an event to a single connection (e.g. the initial summary for a
/// freshly joined host).
pub async fn push_to_conn(state: &GatewayState, conn_id: &str, event: &str, payload: Value) {
    let Some(frame) = serialize_event(state, event, payload) else {
        return;
    };
    let target = [conn_id.to_string()];
    send_to_conns(state, &target, &frame).await;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry_with(name: &str, mutations: usize) -> (PlayerRegistry, String) {
        let mut players = PlayerRegistry::new();
        let id = players.create(name).unwrap().id.clone();
        for i in 0..mutations {
            players.mutate(&id, 1, 0, Some(&format!("m{i}"))).unwrap();
        }
        (players, id)
    }

    #[test]
    fn summary_truncates_history_to_ten() {
        let (players, _) = registry_with("Alice", 30);
        let summary = host_summary(&players);
        let history = summary[0]["history"].as_array().unwrap();
        assert_eq!(history.len(), 10);
        assert_eq!(history[9]["note"], "money +1 (m29)");
        assert_eq!(history[0]["note"], "money +1 (m20)");
    }

    #[test]
    fn summary_keeps_short_history_whole() {
        let (players, _) = registry_with("Alice", 2);
        let summary = host_summary(&players);
        assert_eq!(summary[0]["history"].as_array().unwrap().len(), 3);
    }

    #[test]
    fn detail_carries_full_history() {
        let (players, id) = registry_with("Alice", 30);
        let detail = player_detail(players.get(&id).unwrap());
        assert_eq!(detail["history"].as_array().unwrap().len(), 31);
        assert_eq!(detail["money"], 1530);
        assert_eq!(detail["id"], id.as_str());
    }
}
