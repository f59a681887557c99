use crate::error::Result;
use crate::game::{Action, Game, GameState};
use crate::player::PlayerId;
use crate::random::{RandomSource, SeededRandom};
use tracing::debug;

/// Plays any seat by picking among the legal actions of a snapshot.
/// Attacks with the bigger army are preferred so games come to an end.
#[derive(Debug, Clone)]
pub struct RandomDriver {
    random: SeededRandom,
    /// Percent chance to keep attacking while a favourable attack exists.
    pub aggression: u32,
    /// Percent chance to fortify before ending the turn.
    pub fortify_chance: u32,
}

impl RandomDriver {
    pub fn new(seed: u64) -> Self {
        Self {
            random: SeededRandom::new(seed),
            aggression: 85,
            fortify_chance: 30,
        }
    }

    fn pick<'a>(&mut self, actions: &[&'a Action]) -> Option<&'a Action> {
        if actions.is_empty() {
            return None;
        }
        Some(actions[self.random.below(actions.len())])
    }

    fn army_size(state: &GameState, name: &str) -> usize {
        state
            .countries
            .iter()
            .find(|c| c.name == name)
            .map(|c| c.army_size)
            .unwrap_or(0)
    }

    pub fn next_action(&mut self, state: &GameState) -> Option<Action> {
        let actions = &state.possible_actions;
        if actions.is_empty() {
            return None;
        }
        if actions.iter().any(|a| *a == Action::EndRound) {
            return Some(Action::EndRound);
        }

        let reinforcements: Vec<&Action> = actions
            .iter()
            .filter(|a| matches!(a, Action::Reinforce { .. }))
            .collect();
        if let Some(Action::Reinforce { country, strength }) = self.pick(&reinforcements) {
            let strength = self.random.below(*strength as usize) as u32 + 1;
            return Some(Action::Reinforce {
                country: country.clone(),
                strength,
            });
        }

        let favourable: Vec<&Action> = actions
            .iter()
            .filter(|a| match a {
                Action::Attack { from, to } => {
                    Self::army_size(state, from) > Self::army_size(state, to)
                }
                _ => false,
            })
            .collect();
        if !favourable.is_empty() && self.random.percent() < self.aggression {
            return self.pick(&favourable).cloned();
        }

        let fortifications: Vec<&Action> = actions
            .iter()
            .filter(|a| matches!(a, Action::Fortify { .. }))
            .collect();
        if !fortifications.is_empty() && self.random.percent() < self.fortify_chance {
            if let Some(Action::Fortify { from, to, count }) = self.pick(&fortifications) {
                return Some(Action::Fortify {
                    from: from.clone(),
                    to: to.clone(),
                    count: self.random.below(*count) + 1,
                });
            }
        }

        actions.iter().find(|a| **a == Action::EndPhase).cloned()
    }
}

/// Drives `game` until it ends or `max_actions` have been taken, checking
/// the pool invariants after every action.
pub fn play_to_end(
    game: &mut Game,
    driver: &mut RandomDriver,
    max_actions: usize,
) -> Result<Option<PlayerId>> {
    for _ in 0..max_actions {
        let state = game.get_game_state();
        let Some(action) = driver.next_action(&state) else {
            break;
        };
        game.perform(action)?;
        game.verify_invariants()?;
        for event in game.drain_events() {
            debug!("{:?}", event);
        }
    }
    Ok(game.winner())
}
