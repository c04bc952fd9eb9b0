use std::collections::HashMap;

use {
    chrono::{SecondsFormat, Utc},
    tracing::debug,
};

use tably_protocol::{HISTORY_CAP, NAME_MAX_LEN, STARTING_MONEY, STARTING_TRUST};

use crate::player::{HistoryEntry, Player};

// ── Errors ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    #[error("player name must not be empty")]
    EmptyName,
    #[error("player not found: {0}")]
    NotFound(String),
}

// ── Registry ─────────────────────────────────────────────────────────────────

/// In-memory player store. Explicitly owned by the gateway; there is no
/// global instance.
#[derive(Debug, Default)]
pub struct PlayerRegistry {
    /// id → Player
    players: HashMap<String, Player>,
    /// Ids in creation order, for a stable summary listing.
    order: Vec<String>,
}

fn now_iso() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn mutation_note(money_delta: i64, trust_delta: i64, note: Option<&str>) -> String {
    let mut parts = Vec::new();
    if money_delta != 0 {
        parts.push(format!("money {money_delta:+}"));
    }
    if trust_delta != 0 {
        parts.push(format!("trust {trust_delta:+}"));
    }
    let mut summary = if parts.is_empty() {
        "no change".to_string()
    } else {
        parts.join(", ")
    };
    if let Some(n) = note {
        let n = n.trim();
        if !n.is_empty() {
            summary.push_str(&format!(" ({n})"));
        }
    }
    summary
}

impl PlayerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a player with the starting resources and a genesis history
    /// entry. The name is trimmed, then silently clamped to
    /// [`NAME_MAX_LEN`] characters; an empty trimmed name is rejected.
    pub fn create(&mut self, name: &str) -> Result<&Player, RegistryError> {
        let trimmed = name.trim();
        if trimmed.is_empty() {
            return Err(RegistryError::EmptyName);
        }
        let name: String = trimmed.chars().take(NAME_MAX_LEN).collect();

        let id = format!("p_{}", uuid::Uuid::new_v4().simple());
        let channel = format!("player:{id}");
        let history = vec![HistoryEntry {
            timestamp: now_iso(),
            note: format!("joined with {STARTING_MONEY} money and {STARTING_TRUST} trust"),
        }];

        debug!(id, name, "player created");
        self.order.push(id.clone());
        let player = self.players.entry(id.clone()).or_insert(Player {
            id,
            name,
            money: STARTING_MONEY,
            trust: STARTING_TRUST,
            history,
            channel,
        });
        Ok(player)
    }

    pub fn get(&self, id: &str) -> Option<&Player> {
        self.players.get(id)
    }

    /// Apply money/trust deltas (each clamped at zero independently) and
    /// append one history entry summarizing them plus the optional note.
    /// Callers serialize access, so no partial application is observable.
    pub fn mutate(
        &mut self,
        id: &str,
        money_delta: i64,
        trust_delta: i64,
        note: Option<&str>,
    ) -> Result<&Player, RegistryError> {
        let player = self
            .players
            .get_mut(id)
            .ok_or_else(|| RegistryError::NotFound(id.to_string()))?;

        player.money = player.money.saturating_add(money_delta).max(0);
        player.trust = player.trust.saturating_add(trust_delta).max(0);
        player.history.push(HistoryEntry {
            timestamp: now_iso(),
            note: mutation_note(money_delta, trust_delta, note),
        });
        if player.history.len() > HISTORY_CAP {
            let excess = player.history.len() - HISTORY_CAP;
            player.history.drain(..excess);
        }

        debug!(id, money = player.money, trust = player.trust, "player mutated");
        Ok(player)
    }

    /// Delete a player. Returns the removed player so the caller can
    /// evict its channel.
    pub fn remove(&mut self, id: &str) -> Option<Player> {
        let removed = self.players.remove(id);
        if removed.is_some() {
            self.order.retain(|p| p != id);
            debug!(id, "player removed");
        }
        removed
    }

    /// All players in creation order.
    pub fn list(&self) -> Vec<&Player> {
        self.order
            .iter()
            .filter_map(|id| self.players.get(id))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_grants_starting_resources() {
        let mut reg = PlayerRegistry::new();
        let player = reg.create("Alice").unwrap();
        assert_eq!(player.money, 1500);
        assert_eq!(player.trust, 50);
        assert_eq!(player.history.len(), 1);
        assert!(player.history[0].note.contains("1500"));
        assert_eq!(player.channel, format!("player:{}", player.id));
    }

    #[test]
    fn create_trims_name() {
        let mut reg = PlayerRegistry::new();
        let player = reg.create("  Bob  ").unwrap();
        assert_eq!(player.name, "Bob");
    }

    #[test]
    fn create_rejects_blank_name() {
        let mut reg = PlayerRegistry::new();
        assert_eq!(reg.create("   "), Err(RegistryError::EmptyName));
        assert_eq!(reg.create(""), Err(RegistryError::EmptyName));
        assert!(reg.is_empty());
    }

    #[test]
    fn create_clamps_long_name() {
        let mut reg = PlayerRegistry::new();
        let long = "x".repeat(80);
        let player = reg.create(&long).unwrap();
        assert_eq!(player.name.chars().count(), 50);
    }

    #[test]
    fn ids_are_distinct() {
        let mut reg = PlayerRegistry::new();
        let mut ids = std::collections::HashSet::new();
        for _ in 0..100 {
            let id = reg.create("Alice").unwrap().id.clone();
            assert!(ids.insert(id));
        }
    }

    #[test]
    fn mutate_applies_deltas() {
        let mut reg = PlayerRegistry::new();
        let id = reg.create("Alice").unwrap().id.clone();
        let player = reg.mutate(&id, -200, 0, Some("rent")).unwrap();
        assert_eq!(player.money, 1300);
        assert_eq!(player.trust, 50);
        assert_eq!(player.history.len(), 2);
        assert_eq!(player.history[1].note, "money -200 (rent)");
    }

    #[test]
    fn mutate_clamps_at_zero_independently() {
        let mut reg = PlayerRegistry::new();
        let id = reg.create("Alice").unwrap().id.clone();
        let player = reg.mutate(&id, -2000, -60, None).unwrap();
        assert_eq!(player.money, 0);
        assert_eq!(player.trust, 0);

        let player = reg.mutate(&id, 100, 0, None).unwrap();
        assert_eq!(player.money, 100);
        assert_eq!(player.trust, 0);
    }

    #[test]
    fn mutate_unknown_id_fails() {
        let mut reg = PlayerRegistry::new();
        assert!(matches!(
            reg.mutate("p_missing", 1, 0, None),
            Err(RegistryError::NotFound(_))
        ));
    }

    #[test]
    fn mutation_note_formats() {
        assert_eq!(mutation_note(-200, 0, Some("rent")), "money -200 (rent)");
        assert_eq!(mutation_note(50, -10, None), "money +50, trust -10");
        assert_eq!(mutation_note(0, 0, None), "no change");
        assert_eq!(mutation_note(0, 0, Some("  ")), "no change");
        assert_eq!(mutation_note(0, 5, Some("bonus")), "trust +5 (bonus)");
    }

    #[test]
    fn history_is_capped() {
        let mut reg = PlayerRegistry::new();
        let id = reg.create("Alice").unwrap().id.clone();
        for i in 0..150 {
            reg.mutate(&id, 1, 0, Some(&format!("tick {i}"))).unwrap();
        }
        let player = reg.get(&id).unwrap();
        assert_eq!(player.history.len(), 100);
        // Oldest entries (genesis included) were dropped.
        assert_eq!(player.history[99].note, "money +1 (tick 149)");
        assert_eq!(player.history[0].note, "money +1 (tick 50)");
    }

    #[test]
    fn remove_deletes_player() {
        let mut reg = PlayerRegistry::new();
        let id = reg.create("Alice").unwrap().id.clone();
        assert!(reg.remove(&id).is_some());
        assert!(reg.get(&id).is_none());
        assert!(reg.remove(&id).is_none());
        assert!(reg.list().is_empty());
    }

    #[test]
    fn list_preserves_creation_order() {
        let mut reg = PlayerRegistry::new();
        let a = reg.create("Alice").unwrap().id.clone();
        let b = reg.create("Bob").unwrap().id.clone();
        let c = reg.create("Cora").unwrap().id.clone();
        reg.mutate(&a, -5, 0, None).unwrap();
        reg.remove(&b);
        let ids: Vec<_> = reg.list().iter().map(|p| p.id.clone()).collect();
        assert_eq!(ids, vec![a, c]);
    }
}
