use crate::board::Board;
use crate::player::Player;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum ChallengeKind {
    ArmySize,
    Countries,
    Continents,
}

/// An objective that pays `reward` reinforcement strength once a player
/// reaches `goal`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Challenge {
    pub kind: ChallengeKind,
    pub goal: u32,
    pub reward: u32,
}

impl Challenge {
    pub fn new(kind: ChallengeKind, goal: u32, reward: u32) -> Self {
        Self { kind, goal, reward }
    }

    /// Army size counts the units standing in the player's countries. The
    /// pool only tracks strength, so its unit count says nothing here.
    pub fn progress(&self, player: &Player, board: &Board) -> u32 {
        let value = match self.kind {
            ChallengeKind::ArmySize => board.units_ruled_by(player.id),
            ChallengeKind::Countries => player.countries_ruled,
            ChallengeKind::Continents => player.continents_ruled,
        };
        value as u32
    }

    pub fn is_met_by(&self, player: &Player, board: &Board) -> bool {
        self.progress(player, board) >= self.goal
    }
}
