//! Dice combat between an attacking and a defending squad.
//!
//! One call to [`CombatEngine::fight`] resolves a single round: both sides
//! roll one die per living squad member, each side sorts its own dice high to
//! low, and the dice are compared pairwise. The attacker needs a strictly
//! higher die; ties go to the defender. The winning die's unit deals its
//! strength as damage to the other side, which is absorbed by a squad member
//! of equal strength if there is one, and by the army otherwise.
//!
//! The round stops early once either side is depleted: the defender when its
//! country army is gone (the country changes hands), the attacker when its
//! source army is down to a single unit.

use crate::army::Army;
use crate::board::Board;
use crate::country::CountryId;
use crate::error::{GameError, Result};
use crate::event::GameEvent;
use crate::player::{transfer_rulership, Player, PlayerId};
use crate::random::RandomSource;
use crate::squad::Squad;
use crate::unit::UnitCatalog;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

pub const MAX_ATTACK_SQUAD_SIZE: usize = 3;
pub const MAX_DEFEND_SQUAD_SIZE: usize = 2;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct CombatConfig {
    pub max_attack_squad: usize,
    pub max_defend_squad: usize,
}

impl Default for CombatConfig {
    fn default() -> Self {
        Self {
            max_attack_squad: MAX_ATTACK_SQUAD_SIZE,
            max_defend_squad: MAX_DEFEND_SQUAD_SIZE,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum CombatOutcome {
    Continuing,
    Conquered,
    AttackerDepleted,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CombatReport {
    pub attacker: String,
    pub defender: String,
    pub attacker_rolls: Vec<u8>,
    pub defender_rolls: Vec<u8>,
    pub pairs_compared: usize,
    pub outcome: CombatOutcome,
    pub attacker_lost: u32,
    pub defender_lost: u32,
}

impl CombatReport {
    pub fn is_finished(&self) -> bool {
        self.outcome != CombatOutcome::Continuing
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CombatRound {
    pub attacker: CountryId,
    pub defender: CountryId,
    pub attacker_squad: Squad,
    pub defender_squad: Squad,
}

impl CombatRound {
    pub fn new(attacker: CountryId, defender: CountryId, config: &CombatConfig) -> Self {
        Self {
            attacker,
            defender,
            attacker_squad: Squad::new(config.max_attack_squad),
            defender_squad: Squad::new(config.max_defend_squad),
        }
    }

    /// Fills both squads. The attacker always keeps one unit at home.
    pub fn muster(&mut self, board: &mut Board) -> Result<()> {
        let (attacking, defending) = board.pair_mut(self.attacker, self.defender)?;
        self.attacker_squad.auto_populate(&mut attacking.army, 1)?;
        self.defender_squad.auto_populate(&mut defending.army, 0)?;
        Ok(())
    }

    /// Sends surviving squad members home. After a conquest the attacker's
    /// survivors move into the conquered country instead.
    pub fn settle(&mut self, board: &mut Board, outcome: CombatOutcome) -> Result<()> {
        let (attacking, defending) = board.pair_mut(self.attacker, self.defender)?;
        if outcome == CombatOutcome::Conquered {
            self.attacker_squad.return_squad_to_army(&mut defending.army);
        } else {
            self.attacker_squad.return_squad_to_army(&mut attacking.army);
        }
        self.defender_squad.return_squad_to_army(&mut defending.army);
        self.attacker_squad.clear();
        self.defender_squad.clear();
        Ok(())
    }
}

struct Strike {
    lost: u32,
    depleted: bool,
}

/// Applies `damage` to one side. `depleted_at` is the army size at which
/// that side is finished: 0 for a defender, 1 for an attacker.
fn strike(
    squad: &mut Squad,
    army: &mut Army,
    damage: u32,
    depleted_at: usize,
    catalog: &UnitCatalog,
) -> Result<Strike> {
    let combined = squad.strength() + army.strength();

    if damage >= combined {
        army.set_to_weakest(catalog);
        squad.clear();
        return Ok(Strike {
            lost: combined.saturating_sub(army.strength()),
            depleted: true,
        });
    }

    if squad.kill_unit(damage) {
        return Ok(Strike {
            lost: damage,
            depleted: false,
        });
    }

    // No member to absorb it: the squad goes home and the army takes the hit.
    squad.return_squad_to_army(army);
    army.remove_strength(damage, catalog)?;
    if army.size() <= depleted_at {
        if army.is_empty() {
            army.set_to_weakest(catalog);
        }
        return Ok(Strike {
            lost: combined.saturating_sub(army.strength()),
            depleted: true,
        });
    }

    Ok(Strike {
        lost: damage,
        depleted: false,
    })
}

fn record_changes(
    events: &mut Vec<GameEvent>,
    country: &str,
    (old_size, new_size): (usize, usize),
    (old_alive, new_alive): (usize, usize),
) {
    if old_alive != new_alive {
        events.push(GameEvent::SquadChanged {
            country: country.to_string(),
            old_alive,
            new_alive,
        });
    }
    if old_size != new_size {
        events.push(GameEvent::ArmyChanged {
            country: country.to_string(),
            old_size,
            new_size,
        });
    }
}

#[derive(Debug)]
pub struct CombatEngine {
    config: CombatConfig,
    dice: Box<dyn RandomSource>,
    last: Option<CombatReport>,
}

impl CombatEngine {
    pub fn new(config: CombatConfig, dice: Box<dyn RandomSource>) -> Self {
        Self {
            config,
            dice,
            last: None,
        }
    }

    pub fn config(&self) -> &CombatConfig {
        &self.config
    }

    pub fn last_report(&self) -> Option<&CombatReport> {
        self.last.as_ref()
    }

    pub fn clear(&mut self) {
        self.last = None;
    }

    fn roll(&mut self, count: usize) -> Vec<u8> {
        let mut rolls: Vec<u8> = (0..count).map(|_| self.dice.roll_die()).collect();
        rolls.sort_unstable_by(|a, b| b.cmp(a));
        rolls
    }

    fn check_pool(players: &[Player], ruler: Option<PlayerId>, at_stake: u32) -> Result<()> {
        let Some(id) = ruler else {
            return Ok(());
        };
        let player = players.get(id.0).ok_or(GameError::UnknownPlayer(id.0))?;
        if player.army.strength() < at_stake {
            return Err(GameError::illegal(format!(
                "{} holds {} strength in total but has {} in combat",
                player.name,
                player.army.strength(),
                at_stake
            )));
        }
        Ok(())
    }

    /// Resolves one round. Squads must already be populated.
    pub fn fight(
        &mut self,
        round: &mut CombatRound,
        board: &mut Board,
        players: &mut [Player],
        catalog: &UnitCatalog,
        events: &mut Vec<GameEvent>,
    ) -> Result<CombatReport> {
        let attackers = round.attacker_squad.alive_units();
        let defenders = round.defender_squad.alive_units();
        if attackers == 0 || attackers > self.config.max_attack_squad {
            return Err(GameError::invalid(format!(
                "attacking squad has {} units, expected 1..={}",
                attackers, self.config.max_attack_squad
            )));
        }
        if defenders == 0 || defenders > self.config.max_defend_squad {
            return Err(GameError::invalid(format!(
                "defending squad has {} units, expected 1..={}",
                defenders, self.config.max_defend_squad
            )));
        }

        let (attacker_ruler, attacker_name, attacker_stake) = {
            let country = board.country(round.attacker)?;
            (
                country.ruler,
                country.name.clone(),
                country.army.strength() + round.attacker_squad.strength(),
            )
        };
        let (defender_ruler, defender_name, defender_stake) = {
            let country = board.country(round.defender)?;
            (
                country.ruler,
                country.name.clone(),
                country.army.strength() + round.defender_squad.strength(),
            )
        };
        Self::check_pool(players, attacker_ruler, attacker_stake)?;
        Self::check_pool(players, defender_ruler, defender_stake)?;

        // The i-th highest die belongs to the i-th squad member.
        let attacker_units: Vec<u32> = round.attacker_squad.alive().map(|u| u.strength).collect();
        let defender_units: Vec<u32> = round.defender_squad.alive().map(|u| u.strength).collect();
        let attacker_rolls = self.roll(attackers);
        let defender_rolls = self.roll(defenders);

        let mut outcome = CombatOutcome::Continuing;
        let mut pairs_compared = 0;
        let mut attacker_lost = 0;
        let mut defender_lost = 0;

        {
            let (attacking, defending) = board.pair_mut(round.attacker, round.defender)?;

            for i in 0..attackers.min(defenders) {
                pairs_compared += 1;
                let (attack, defend) = (attacker_rolls[i], defender_rolls[i]);

                if attack > defend {
                    let damage = attacker_units[i];
                    let before = (defending.army.size(), round.defender_squad.alive_units());
                    let hit = strike(
                        &mut round.defender_squad,
                        &mut defending.army,
                        damage,
                        0,
                        catalog,
                    )?;
                    defender_lost += hit.lost;
                    record_changes(
                        events,
                        &defender_name,
                        (before.0, defending.army.size()),
                        (before.1, round.defender_squad.alive_units()),
                    );
                    debug!(
                        "{} rolls {} over {}: {} loses {}",
                        attacker_name, attack, defend, defender_name, hit.lost
                    );
                    if hit.depleted {
                        outcome = CombatOutcome::Conquered;
                        break;
                    }
                } else {
                    let damage = defender_units[i];
                    let before = (attacking.army.size(), round.attacker_squad.alive_units());
                    let hit = strike(
                        &mut round.attacker_squad,
                        &mut attacking.army,
                        damage,
                        1,
                        catalog,
                    )?;
                    attacker_lost += hit.lost;
                    record_changes(
                        events,
                        &attacker_name,
                        (before.0, attacking.army.size()),
                        (before.1, round.attacker_squad.alive_units()),
                    );
                    debug!(
                        "{} holds with {} against {}: {} loses {}",
                        defender_name, defend, attack, attacker_name, hit.lost
                    );
                    if hit.depleted {
                        outcome = CombatOutcome::AttackerDepleted;
                        break;
                    }
                }
            }
        }

        // Pools were checked against the full stake above, so these cannot fail.
        if let Some(id) = attacker_ruler {
            players[id.0].army.remove_strength(attacker_lost, catalog)?;
        }
        if let Some(id) = defender_ruler {
            players[id.0].army.remove_strength(defender_lost, catalog)?;
        }

        if outcome == CombatOutcome::Conquered {
            // What is left in the country now belongs to the conqueror.
            let remaining: Vec<_> = board.country(round.defender)?.army.units().to_vec();
            let remaining_strength: u32 = remaining.iter().map(|u| u.strength).sum();
            if let Some(id) = defender_ruler {
                players[id.0].army.remove_strength(remaining_strength, catalog)?;
            }
            if let Some(id) = attacker_ruler {
                for unit in remaining {
                    players[id.0].army.add(unit);
                }
            }

            let previous = board.set_ruler(round.defender, attacker_ruler)?;
            transfer_rulership(players, previous, attacker_ruler);
            round.defender_squad.clear();
            events.push(GameEvent::RulerChanged {
                country: defender_name.clone(),
                old: previous,
                new: attacker_ruler,
            });
            info!("{} conquered {}", attacker_name, defender_name);
        }

        let report = CombatReport {
            attacker: attacker_name,
            defender: defender_name,
            attacker_rolls,
            defender_rolls,
            pairs_compared,
            outcome,
            attacker_lost,
            defender_lost,
        };
        self.last = Some(report.clone());
        Ok(report)
    }
}
