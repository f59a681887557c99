use crate::country::CountryId;
use crate::error::{GameError, Result};
use crate::event::GameEvent;
use crate::game::Game;
use crate::player::PlayerId;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

#[derive(Debug, PartialEq, Eq, Clone, Copy, Serialize, Deserialize)]
pub enum TurnPhase {
    Setup,
    Reinforce,
    Attack,
    Fortify,
    EndGame,
}

/// The two country slots a phase works on.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selection {
    pub primary: Option<CountryId>,
    pub secondary: Option<CountryId>,
}

impl Selection {
    pub fn clear(&mut self) {
        self.primary = None;
        self.secondary = None;
    }

    pub fn both(&self) -> Option<(CountryId, CountryId)> {
        Some((self.primary?, self.secondary?))
    }

    pub fn is_empty(&self) -> bool {
        self.primary.is_none() && self.secondary.is_none()
    }
}

impl Game {
    pub fn select_country(&mut self, name: &str) -> Result<bool> {
        let id = self.board.country_id(name)?;
        self.select(id)
    }

    /// Two-slot selection. A candidate that is a valid target for the current
    /// primary fills the secondary slot; otherwise a country of the current
    /// player becomes the new primary, keeping the secondary only if it still
    /// fits. Anything else clears both slots.
    pub fn select(&mut self, id: CountryId) -> Result<bool> {
        if self.turn_phase == TurnPhase::EndGame {
            return Err(GameError::illegal("the game is over"));
        }
        self.require_round_closed()?;
        self.board.country(id)?;

        if let Some(primary) = self.selection.primary {
            if self.is_valid_target(primary, id) {
                self.selection.secondary = Some(id);
                debug!("{:?} target {}", self.turn_phase, self.board.countries()[id.0].name);
                return Ok(true);
            }
        }

        if self.is_valid_primary(id) {
            self.selection.primary = Some(id);
            if let Some(secondary) = self.selection.secondary {
                if !self.is_valid_target(id, secondary) {
                    self.selection.secondary = None;
                }
            }
            debug!("{:?} source {}", self.turn_phase, self.board.countries()[id.0].name);
            return Ok(true);
        }

        self.selection.clear();
        Ok(false)
    }

    pub(crate) fn is_valid_primary(&self, id: CountryId) -> bool {
        self.board
            .country(id)
            .map(|c| c.is_ruled_by(self.current_player_id()))
            .unwrap_or(false)
    }

    /// Phase-specific check for the secondary slot.
    pub(crate) fn is_valid_target(&self, primary: CountryId, candidate: CountryId) -> bool {
        if primary == candidate || !self.is_valid_primary(primary) {
            return false;
        }
        let (Ok(source), Ok(target)) = (self.board.country(primary), self.board.country(candidate))
        else {
            return false;
        };
        let player = self.current_player_id();

        match self.turn_phase {
            TurnPhase::Attack => {
                self.board.is_traversable(primary, candidate)
                    && !target.is_ruled_by(player)
                    && source.army.size() > 1
            }
            TurnPhase::Fortify => source.is_adjacent(candidate) && target.is_ruled_by(player),
            TurnPhase::Setup | TurnPhase::Reinforce | TurnPhase::EndGame => false,
        }
    }

    /// Drops a secondary that stopped being a valid target, and the primary
    /// if the current player no longer rules it.
    pub(crate) fn revalidate_selection(&mut self) {
        if let Some(primary) = self.selection.primary {
            if !self.is_valid_primary(primary) {
                self.selection.clear();
                return;
            }
            if let Some(secondary) = self.selection.secondary {
                if !self.is_valid_target(primary, secondary) {
                    self.selection.secondary = None;
                }
            }
        }
    }

    /// Nothing but [`Game::end_round`] may run while a round boundary is open.
    pub(crate) fn require_round_closed(&self) -> Result<()> {
        if self.round_boundary_pending {
            return Err(GameError::illegal(format!(
                "round {} has to be closed with end_round first",
                self.round - 1
            )));
        }
        Ok(())
    }

    pub(crate) fn require_phase(&self, phase: TurnPhase) -> Result<()> {
        self.require_round_closed()?;
        if self.turn_phase != phase {
            return Err(GameError::illegal(format!(
                "expected the {:?} phase, game is in {:?}",
                phase, self.turn_phase
            )));
        }
        Ok(())
    }

    pub(crate) fn require_both(&self) -> Result<(CountryId, CountryId)> {
        self.selection.both().ok_or_else(|| {
            GameError::illegal(format!(
                "{:?} needs a source and a target country selected",
                self.turn_phase
            ))
        })
    }

    pub(crate) fn set_phase(&mut self, to: TurnPhase) {
        let from = self.turn_phase;
        self.selection.clear();
        if from == to {
            return;
        }
        self.turn_phase = to;
        info!("{:?} -> {:?}", from, to);
        self.events.push(GameEvent::PhaseChanged { from, to });
    }

    /// Next player after `from` who has not lost, wrapping around.
    pub(crate) fn next_alive_player(&self, from: PlayerId) -> PlayerId {
        let count = self.players.len();
        (1..=count)
            .map(|step| PlayerId((from.0 + step) % count))
            .find(|id| self.players[id.0].is_alive())
            .unwrap_or(from)
    }

    fn hand_over(&mut self, to: PlayerId) {
        self.current_turn = to;
        self.events.push(GameEvent::TurnStarted {
            player: to,
            round: self.round,
        });
    }

    /// Passes setup to the next player; once every player has placed its
    /// starting pool the first Reinforce turn begins.
    pub fn confirm_setup(&mut self) -> Result<()> {
        self.require_phase(TurnPhase::Setup)?;
        let current = self.current_player_id();
        if self.players[current.0].distributable > 0 {
            return Err(GameError::illegal(format!(
                "{} still has {} strength to place",
                self.players[current.0].name, self.players[current.0].distributable
            )));
        }

        let next = self.next_alive_player(current);
        if next.0 > current.0 {
            self.selection.clear();
            self.hand_over(next);
            return Ok(());
        }

        self.check_continent_rulership();
        self.set_phase(TurnPhase::Reinforce);
        self.hand_over(next);
        self.start_turn(next);
        Ok(())
    }

    pub fn confirm_reinforcement(&mut self) -> Result<()> {
        self.require_phase(TurnPhase::Reinforce)?;
        let player = &self.players[self.current_turn.0];
        if player.distributable > 0 {
            return Err(GameError::illegal(format!(
                "{} still has {} strength to place",
                player.name, player.distributable
            )));
        }
        self.set_phase(TurnPhase::Attack);
        Ok(())
    }

    pub fn confirm_combat(&mut self) -> Result<()> {
        self.require_phase(TurnPhase::Attack)?;
        self.combat.clear();
        self.set_phase(TurnPhase::Fortify);
        Ok(())
    }

    /// Ends the current player's turn. Wrapping past the last player closes
    /// the round; the caller then runs [`Game::end_round`].
    pub fn confirm_movement(&mut self) -> Result<()> {
        self.require_phase(TurnPhase::Fortify)?;
        self.selection.clear();
        self.check_continent_rulership();

        let current = self.current_player_id();
        let next = self.next_alive_player(current);
        if next.0 <= current.0 {
            self.round += 1;
            self.round_boundary_pending = true;
        }

        self.set_phase(TurnPhase::Reinforce);
        self.hand_over(next);
        self.start_turn(next);
        Ok(())
    }

    fn start_turn(&mut self, player: PlayerId) {
        let grant = self.calculate_reinforcements(player);
        self.players[player.0].grant(grant);
        self.events.push(GameEvent::Reinforced {
            player,
            strength: grant,
        });
        debug!("{} receives {} reinforcement", self.players[player.0].name, grant);
    }
}
