use crate::hazard::HazardKind;
use crate::player::PlayerId;
use crate::turn_phase::TurnPhase;
use serde::{Deserialize, Serialize};

/// Notifications for the presentation layer, queued by each mutating call
/// and drained by whoever is listening. Nothing in the engine reads them.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum GameEvent {
    PhaseChanged {
        from: TurnPhase,
        to: TurnPhase,
    },
    TurnStarted {
        player: PlayerId,
        round: usize,
    },
    RulerChanged {
        country: String,
        old: Option<PlayerId>,
        new: Option<PlayerId>,
    },
    ArmyChanged {
        country: String,
        old_size: usize,
        new_size: usize,
    },
    SquadChanged {
        country: String,
        old_alive: usize,
        new_alive: usize,
    },
    HazardStruck {
        country: String,
        hazard: HazardKind,
        occurred: bool,
        casualties: usize,
    },
    LinkReopened {
        a: String,
        b: String,
    },
    ContinentRulerChanged {
        continent: String,
        old: Option<PlayerId>,
        new: Option<PlayerId>,
    },
    Reinforced {
        player: PlayerId,
        strength: u32,
    },
    ChallengeCompleted {
        player: PlayerId,
        challenge: usize,
        reward: u32,
    },
    PlayerEliminated {
        player: PlayerId,
    },
    GameWon {
        player: PlayerId,
    },
}
