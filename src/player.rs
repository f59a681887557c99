use crate::army::Army;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PlayerId(pub usize);

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum PlayerKind {
    #[default]
    Human,
    Ai,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
    pub kind: PlayerKind,
    /// Every unit the player has on the board, kept apart from country armies.
    pub army: Army,
    pub countries_ruled: usize,
    pub continents_ruled: usize,
    /// Reinforcement strength waiting to be placed.
    pub distributable: u32,
    pub lost: bool,
    pub completed_challenges: BTreeSet<usize>,
}

impl Player {
    pub fn new(id: PlayerId, name: &str, kind: PlayerKind) -> Self {
        Self {
            id,
            name: name.to_string(),
            kind,
            army: Army::new(),
            countries_ruled: 0,
            continents_ruled: 0,
            distributable: 0,
            lost: false,
            completed_challenges: BTreeSet::new(),
        }
    }

    pub fn is_ai(&self) -> bool {
        self.kind == PlayerKind::Ai
    }

    pub fn is_alive(&self) -> bool {
        !self.lost
    }

    pub fn grant(&mut self, strength: u32) {
        self.distributable += strength;
    }
}

/// Moves one country's worth of rulership between players' counters.
pub fn transfer_rulership(players: &mut [Player], from: Option<PlayerId>, to: Option<PlayerId>) {
    if from == to {
        return;
    }
    if let Some(player) = from.and_then(|id| players.get_mut(id.0)) {
        player.countries_ruled = player.countries_ruled.saturating_sub(1);
    }
    if let Some(player) = to.and_then(|id| players.get_mut(id.0)) {
        player.countries_ruled += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transfer_moves_count_between_players() {
        let mut players = vec![
            Player::new(PlayerId(0), "Red", PlayerKind::Human),
            Player::new(PlayerId(1), "Blue", PlayerKind::Ai),
        ];
        players[1].countries_ruled = 2;
        transfer_rulership(&mut players, Some(PlayerId(1)), Some(PlayerId(0)));
        assert_eq!(players[0].countries_ruled, 1);
        assert_eq!(players[1].countries_ruled, 1);

        transfer_rulership(&mut players, None, Some(PlayerId(1)));
        assert_eq!(players[1].countries_ruled, 2);

        transfer_rulership(&mut players, Some(PlayerId(0)), Some(PlayerId(0)));
        assert_eq!(players[0].countries_ruled, 1);
    }
}
