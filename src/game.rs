use crate::board::{Board, RoundReport};
use crate::challenge::Challenge;
use crate::combat::{CombatConfig, CombatEngine, CombatOutcome, CombatReport, CombatRound};
use crate::country::CountryId;
use crate::error::{GameError, Result};
use crate::event::GameEvent;
use crate::game_config::Rules;
use crate::hazard::HazardKind;
use crate::link::LinkState;
use crate::player::{Player, PlayerId};
use crate::random::{RandomSource, SeededRandom};
use crate::turn_phase::{Selection, TurnPhase};
use crate::unit::UnitCatalog;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct GameState {
    pub current_player: String,
    pub current_turn: PlayerId,
    pub round: usize,
    pub turn_phase: TurnPhase,
    pub round_boundary_pending: bool,
    pub primary: Option<String>,
    pub secondary: Option<String>,
    pub countries: Vec<CountryState>,
    pub continents: Vec<ContinentState>,
    pub players: Vec<PlayerState>,
    pub last_combat: Option<CombatReport>,
    pub winner: Option<PlayerId>,
    pub possible_actions: Vec<Action>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct CountryState {
    pub name: String,
    pub ruler: Option<PlayerId>,
    pub army_size: usize,
    pub strength: u32,
    pub neighbours: Vec<NeighbourState>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct NeighbourState {
    pub name: String,
    pub traversable: bool,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ContinentState {
    pub name: String,
    pub ruler: Option<PlayerId>,
    pub bonus: u32,
    pub hazard: HazardKind,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct PlayerState {
    pub id: PlayerId,
    pub name: String,
    pub ai: bool,
    pub strength: u32,
    pub units: usize,
    pub countries_ruled: usize,
    pub continents_ruled: usize,
    pub distributable: u32,
    pub lost: bool,
    pub completed_challenges: usize,
}

/// One request from a player or an AI. Actions naming countries replace the
/// current selection before acting.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub enum Action {
    Select { country: String },
    Reinforce { country: String, strength: u32 },
    Attack { from: String, to: String },
    Fortify { from: String, to: String, count: usize },
    EndPhase,
    EndRound,
}

#[derive(Clone, Debug, PartialEq)]
pub enum ActionOutcome {
    Selected(bool),
    Combat(CombatReport),
    RoundEnded,
    Done,
}

/// Everything a game is built from.
#[derive(Debug, Clone)]
pub struct GameSetup {
    pub board: Board,
    pub players: Vec<Player>,
    pub catalog: UnitCatalog,
    pub challenges: Vec<Challenge>,
    pub rules: Rules,
    pub combat: CombatConfig,
}

#[derive(Debug)]
pub struct Game {
    pub(crate) board: Board,
    pub(crate) players: Vec<Player>,
    catalog: UnitCatalog,
    challenges: Vec<Challenge>,
    rules: Rules,
    pub(crate) current_turn: PlayerId,
    pub(crate) round: usize,
    pub(crate) turn_phase: TurnPhase,
    pub(crate) round_boundary_pending: bool,
    pub(crate) selection: Selection,
    pub(crate) combat: CombatEngine,
    hazards: Box<dyn RandomSource>,
    continent_rulers: Vec<Option<PlayerId>>,
    pub(crate) events: Vec<GameEvent>,
}

impl Game {
    /// Builds a game in the Setup phase. Player pools are rebuilt from the
    /// armies on the board; players without a country start out as losers.
    pub fn new(
        setup: GameSetup,
        dice: Box<dyn RandomSource>,
        hazards: Box<dyn RandomSource>,
    ) -> Result<Self> {
        let GameSetup {
            board,
            mut players,
            catalog,
            challenges,
            rules,
            combat,
        } = setup;

        if players.len() < 2 {
            return Err(GameError::Config(format!(
                "a game needs at least 2 players, got {}",
                players.len()
            )));
        }
        if rules.countries_per_reinforcement == 0 {
            return Err(GameError::Config(
                "countries_per_reinforcement must be positive".to_string(),
            ));
        }
        if combat.max_attack_squad == 0 || combat.max_defend_squad == 0 {
            return Err(GameError::Config(format!(
                "squads need room for a unit, got attack {} and defend {}",
                combat.max_attack_squad, combat.max_defend_squad
            )));
        }
        for country in board.countries() {
            if let Some(ruler) = country.ruler {
                if ruler.0 >= players.len() {
                    return Err(GameError::UnknownPlayer(ruler.0));
                }
                if country.army.is_empty() {
                    return Err(GameError::Config(format!(
                        "{} is ruled but has no army",
                        country.name
                    )));
                }
            }
        }

        for (index, player) in players.iter_mut().enumerate() {
            player.id = PlayerId(index);
            player.army = Default::default();
            player.countries_ruled = 0;
            for country in board.countries_ruled_by(player.id) {
                for unit in country.army.units() {
                    player.army.add(unit.clone());
                }
                player.countries_ruled += 1;
            }
            player.lost = player.countries_ruled == 0;
            player.distributable = if player.lost { 0 } else { rules.initial_strength };
        }

        let Some(first) = players.iter().find(|p| p.is_alive()).map(|p| p.id) else {
            return Err(GameError::Config("no player rules a country".to_string()));
        };

        info!(
            "new game: {} countries, {} players",
            board.countries().len(),
            players.len()
        );

        Ok(Self {
            continent_rulers: vec![None; board.continents().len()],
            board,
            players,
            catalog,
            challenges,
            rules,
            current_turn: first,
            round: 1,
            turn_phase: TurnPhase::Setup,
            round_boundary_pending: false,
            selection: Selection::default(),
            combat: CombatEngine::new(combat, dice),
            hazards,
            events: Vec::new(),
        })
    }

    /// Dice and hazards each get their own stream derived from `seed`.
    pub fn seeded(setup: GameSetup, seed: u64) -> Result<Self> {
        Self::new(
            setup,
            Box::new(SeededRandom::new(seed)),
            Box::new(SeededRandom::new(seed.wrapping_add(0x9e37_79b9))),
        )
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn players(&self) -> &[Player] {
        &self.players
    }

    pub fn player(&self, id: PlayerId) -> Result<&Player> {
        self.players.get(id.0).ok_or(GameError::UnknownPlayer(id.0))
    }

    pub fn current_player_id(&self) -> PlayerId {
        self.current_turn
    }

    pub fn current_player(&self) -> &Player {
        &self.players[self.current_turn.0]
    }

    pub fn turn_phase(&self) -> TurnPhase {
        self.turn_phase
    }

    pub fn round(&self) -> usize {
        self.round
    }

    pub fn selection(&self) -> Selection {
        self.selection
    }

    pub fn catalog(&self) -> &UnitCatalog {
        &self.catalog
    }

    pub fn challenges(&self) -> &[Challenge] {
        &self.challenges
    }

    pub fn rules(&self) -> &Rules {
        &self.rules
    }

    pub fn last_combat(&self) -> Option<&CombatReport> {
        self.combat.last_report()
    }

    pub fn is_round_boundary_pending(&self) -> bool {
        self.round_boundary_pending
    }

    pub fn winner(&self) -> Option<PlayerId> {
        if self.turn_phase != TurnPhase::EndGame {
            return None;
        }
        self.players.iter().find(|p| p.is_alive()).map(|p| p.id)
    }

    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    fn push_size_change(&mut self, id: CountryId, old_size: usize) {
        let country = &self.board.countries()[id.0];
        if country.army.size() != old_size {
            self.events.push(GameEvent::ArmyChanged {
                country: country.name.clone(),
                old_size,
                new_size: country.army.size(),
            });
        }
    }

    fn push_squad_change(&mut self, id: CountryId, old_alive: usize, new_alive: usize) {
        if old_alive != new_alive {
            self.events.push(GameEvent::SquadChanged {
                country: self.board.countries()[id.0].name.clone(),
                old_alive,
                new_alive,
            });
        }
    }

    fn army_size(&self, id: CountryId) -> usize {
        self.board.countries()[id.0].army.size()
    }

    /// Places `strength` from the current player's distributable pool on the
    /// primary country.
    pub fn reinforce(&mut self, strength: u32) -> Result<()> {
        self.require_round_closed()?;
        if !matches!(self.turn_phase, TurnPhase::Setup | TurnPhase::Reinforce) {
            return Err(GameError::illegal(format!(
                "cannot reinforce during {:?}",
                self.turn_phase
            )));
        }
        let target = self
            .selection
            .primary
            .filter(|&id| self.is_valid_primary(id))
            .ok_or_else(|| GameError::illegal("reinforce needs one of your countries selected"))?;

        let player = self.current_turn;
        let available = self.players[player.0].distributable;
        if strength == 0 || strength > available {
            return Err(GameError::invalid(format!(
                "cannot place {} strength, {} available",
                strength, available
            )));
        }

        let old_size = self.army_size(target);
        self.board
            .country_mut(target)?
            .army
            .add_strength(strength, &self.catalog);
        let player = &mut self.players[player.0];
        player.army.add_strength(strength, &self.catalog);
        player.distributable -= strength;
        self.push_size_change(target, old_size);
        Ok(())
    }

    /// One combat round from the primary into the secondary country.
    pub fn attack_round(&mut self) -> Result<CombatReport> {
        self.require_phase(TurnPhase::Attack)?;
        let (source, target) = self.require_both()?;
        if !self.is_valid_target(source, target) {
            return Err(GameError::illegal(format!(
                "{} can no longer be attacked from {}",
                self.board.countries()[target.0].name,
                self.board.countries()[source.0].name
            )));
        }
        let defender_ruler = self.board.country(target)?.ruler;

        let before = (self.army_size(source), self.army_size(target));
        let mut round = CombatRound::new(source, target, self.combat.config());
        round.muster(&mut self.board)?;
        self.push_size_change(source, before.0);
        self.push_size_change(target, before.1);
        self.push_squad_change(source, 0, round.attacker_squad.alive_units());
        self.push_squad_change(target, 0, round.defender_squad.alive_units());

        let fought = self.combat.fight(
            &mut round,
            &mut self.board,
            &mut self.players,
            &self.catalog,
            &mut self.events,
        );
        // A failed fight still sends the squads home, with matching events.
        let outcome = fought
            .as_ref()
            .map(|report| report.outcome)
            .unwrap_or(CombatOutcome::Continuing);
        let alive = (
            round.attacker_squad.alive_units(),
            round.defender_squad.alive_units(),
        );
        let fought_sizes = (self.army_size(source), self.army_size(target));
        round.settle(&mut self.board, outcome)?;
        self.push_squad_change(source, alive.0, 0);
        self.push_squad_change(target, alive.1, 0);
        self.push_size_change(source, fought_sizes.0);
        self.push_size_change(target, fought_sizes.1);
        let report = fought?;

        if report.outcome == CombatOutcome::Conquered {
            self.selection.secondary = None;
            if let Some(defender) = defender_ruler {
                self.check_loser(defender);
            }
            self.check_winner();
        }
        self.revalidate_selection();
        Ok(report)
    }

    /// Moves the `count` strongest units from the primary to the secondary
    /// country. At least one unit always stays behind.
    pub fn fortify(&mut self, count: usize) -> Result<()> {
        self.require_phase(TurnPhase::Fortify)?;
        let (source, target) = self.require_both()?;
        if !self.is_valid_target(source, target) {
            return Err(GameError::illegal("fortify needs two adjacent countries you rule"));
        }

        let before = (self.army_size(source), self.army_size(target));
        if count == 0 || count >= before.0 {
            return Err(GameError::invalid(format!(
                "cannot move {} of {} units",
                count, before.0
            )));
        }

        let (from, to) = self.board.pair_mut(source, target)?;
        for unit in from.army.take_strongest(count) {
            to.army.add(unit);
        }
        debug!("moved {} units from {} to {}", count, from.name, to.name);
        self.push_size_change(source, before.0);
        self.push_size_change(target, before.1);
        Ok(())
    }

    /// Temporarily changes the state of the link between two countries.
    pub fn set_link_state(
        &mut self,
        a: &str,
        b: &str,
        state: LinkState,
        rounds: u32,
    ) -> Result<()> {
        let (a, b) = (self.board.country_id(a)?, self.board.country_id(b)?);
        let link = self
            .board
            .country(a)?
            .link_to(b)
            .ok_or_else(|| GameError::invalid("countries are not neighbours"))?;
        self.board.link_mut(link)?.set_temporary(state, rounds)?;
        self.revalidate_selection();
        Ok(())
    }

    /// Round boundary: hazards, link ageing, then the per-round checks.
    pub fn end_round(&mut self) -> Result<RoundReport> {
        if !self.round_boundary_pending {
            return Err(GameError::illegal("no round boundary is pending"));
        }

        let report = self.board.end_round(&self.catalog, self.hazards.as_mut())?;
        for hazard in &report.hazards {
            let country = &self.board.countries()[hazard.country.0];
            if hazard.hazard != HazardKind::Calm {
                self.events.push(GameEvent::HazardStruck {
                    country: country.name.clone(),
                    hazard: hazard.hazard,
                    occurred: hazard.outcome.occurred,
                    casualties: hazard.outcome.casualties,
                });
            }
            if hazard.old_size != hazard.new_size {
                self.events.push(GameEvent::ArmyChanged {
                    country: country.name.clone(),
                    old_size: hazard.old_size,
                    new_size: hazard.new_size,
                });
            }
            if let Some(ruler) = country.ruler {
                self.players[ruler.0]
                    .army
                    .remove_strength(hazard.outcome.strength_lost, &self.catalog)?;
            }
        }
        for &id in &report.reopened {
            let link = self.board.link(id)?;
            self.events.push(GameEvent::LinkReopened {
                a: self.board.countries()[link.ends.0 .0].name.clone(),
                b: self.board.countries()[link.ends.1 .0].name.clone(),
            });
        }

        self.round_boundary_pending = false;
        self.check_continent_rulership();
        self.check_challenges();
        self.check_winner();
        self.revalidate_selection();
        Ok(report)
    }

    /// Re-derives who rules each continent and refreshes the players'
    /// continent counters.
    pub fn check_continent_rulership(&mut self) {
        let rulers: Vec<Option<PlayerId>> = self
            .board
            .continents()
            .iter()
            .map(|continent| self.board.continent_ruler(continent.id))
            .collect();

        for (index, (&old, &new)) in self.continent_rulers.iter().zip(&rulers).enumerate() {
            if old != new {
                let continent = self.board.continents()[index].name.clone();
                info!("{} now ruled by {:?}", continent, new);
                self.events
                    .push(GameEvent::ContinentRulerChanged { continent, old, new });
            }
        }
        self.continent_rulers = rulers;

        for player in &mut self.players {
            player.continents_ruled = self
                .continent_rulers
                .iter()
                .filter(|&&ruler| ruler == Some(player.id))
                .count();
        }
    }

    /// Completes every challenge a living player newly meets. Each challenge
    /// pays out at most once per player.
    pub fn check_challenges(&mut self) -> Vec<(PlayerId, usize)> {
        let mut completed = Vec::new();
        for player in self.players.iter_mut().filter(|p| p.is_alive()) {
            for (index, challenge) in self.challenges.iter().enumerate() {
                if player.completed_challenges.contains(&index)
                    || !challenge.is_met_by(player, &self.board)
                {
                    continue;
                }
                player.completed_challenges.insert(index);
                player.grant(challenge.reward);
                info!("{} completed {:?} challenge", player.name, challenge.kind);
                self.events.push(GameEvent::ChallengeCompleted {
                    player: player.id,
                    challenge: index,
                    reward: challenge.reward,
                });
                completed.push((player.id, index));
            }
        }
        completed
    }

    fn check_loser(&mut self, id: PlayerId) {
        let player = &mut self.players[id.0];
        if player.is_alive() && player.countries_ruled == 0 {
            player.lost = true;
            player.distributable = 0;
            info!("{} has been eliminated", player.name);
            self.events.push(GameEvent::PlayerEliminated { player: id });
        }
    }

    /// Marks players without countries as losers and ends the game once a
    /// single player is left.
    pub fn check_winner(&mut self) -> Option<PlayerId> {
        for index in 0..self.players.len() {
            self.check_loser(PlayerId(index));
        }

        let mut alive = self.players.iter().filter(|p| p.is_alive());
        let (Some(winner), None) = (alive.next(), alive.next()) else {
            return None;
        };
        let (id, name) = (winner.id, winner.name.clone());

        if self.turn_phase != TurnPhase::EndGame {
            self.set_phase(TurnPhase::EndGame);
            self.round_boundary_pending = false;
            info!("{} wins in round {}", name, self.round);
            self.events.push(GameEvent::GameWon { player: id });
        }
        Some(id)
    }

    pub fn calculate_reinforcements(&self, id: PlayerId) -> u32 {
        let Some(player) = self.players.get(id.0) else {
            return 0;
        };
        let base = (player.countries_ruled as u32 / self.rules.countries_per_reinforcement.max(1))
            .max(self.rules.min_reinforcement);
        let bonus: u32 = self
            .continent_rulers
            .iter()
            .zip(self.board.continents())
            .filter(|(ruler, _)| **ruler == Some(id))
            .map(|(_, continent)| continent.get_bonus())
            .sum();
        base + bonus
    }

    /// Checks that every pool matches the armies of the countries its player
    /// rules, and that no ruled country is empty.
    pub fn verify_invariants(&self) -> Result<()> {
        for player in &self.players {
            let on_board = self.board.strength_ruled_by(player.id);
            if player.army.strength() != on_board {
                return Err(GameError::illegal(format!(
                    "{} holds {} strength but rules {}",
                    player.name,
                    player.army.strength(),
                    on_board
                )));
            }
            let ruled = self.board.countries_ruled_by(player.id).count();
            if ruled != player.countries_ruled {
                return Err(GameError::illegal(format!(
                    "{} is counted with {} countries but rules {}",
                    player.name, player.countries_ruled, ruled
                )));
            }
        }
        if let Some(country) = self
            .board
            .countries()
            .iter()
            .find(|c| c.ruler.is_some() && c.army.is_empty())
        {
            return Err(GameError::illegal(format!("{} is ruled but empty", country.name)));
        }
        Ok(())
    }

    pub fn get_game_state(&self) -> GameState {
        let name_of =
            |id: Option<CountryId>| id.map(|id| self.board.countries()[id.0].name.clone());

        let countries = self
            .board
            .countries()
            .iter()
            .map(|country| CountryState {
                name: country.name.clone(),
                ruler: country.ruler,
                army_size: country.army.size(),
                strength: country.army.strength(),
                neighbours: country
                    .neighbours
                    .keys()
                    .map(|&other| NeighbourState {
                        name: self.board.countries()[other.0].name.clone(),
                        traversable: self.board.is_traversable(country.id, other),
                    })
                    .collect(),
            })
            .collect();

        let continents = self
            .board
            .continents()
            .iter()
            .zip(&self.continent_rulers)
            .map(|(continent, &ruler)| ContinentState {
                name: continent.name.clone(),
                ruler,
                bonus: continent.get_bonus(),
                hazard: continent.hazard,
            })
            .collect();

        let players = self
            .players
            .iter()
            .map(|player| PlayerState {
                id: player.id,
                name: player.name.clone(),
                ai: player.is_ai(),
                strength: player.army.strength(),
                units: self.board.units_ruled_by(player.id),
                countries_ruled: player.countries_ruled,
                continents_ruled: player.continents_ruled,
                distributable: player.distributable,
                lost: player.lost,
                completed_challenges: player.completed_challenges.len(),
            })
            .collect();

        GameState {
            current_player: self.current_player().name.clone(),
            current_turn: self.current_turn,
            round: self.round,
            turn_phase: self.turn_phase,
            round_boundary_pending: self.round_boundary_pending,
            primary: name_of(self.selection.primary),
            secondary: name_of(self.selection.secondary),
            countries,
            continents,
            players,
            last_combat: self.combat.last_report().cloned(),
            winner: self.winner(),
            possible_actions: self.get_possible_actions(),
        }
    }

    /// Legal actions for the current player. A pending round boundary has to
    /// be closed before anything else.
    pub fn get_possible_actions(&self) -> Vec<Action> {
        if self.round_boundary_pending {
            return vec![Action::EndRound];
        }
        match self.turn_phase {
            TurnPhase::Setup | TurnPhase::Reinforce => {
                let available = self.current_player().distributable;
                if available == 0 {
                    return vec![Action::EndPhase];
                }
                self.board
                    .countries_ruled_by(self.current_turn)
                    .map(|country| Action::Reinforce {
                        country: country.name.clone(),
                        strength: available,
                    })
                    .collect()
            }
            TurnPhase::Attack => {
                let mut actions = self.get_possible_attacks();
                actions.push(Action::EndPhase);
                actions
            }
            TurnPhase::Fortify => {
                let mut actions = self.get_possible_fortifications();
                actions.push(Action::EndPhase);
                actions
            }
            TurnPhase::EndGame => Vec::new(),
        }
    }

    fn get_possible_attacks(&self) -> Vec<Action> {
        let mut actions = Vec::new();
        for country in self.board.countries_ruled_by(self.current_turn) {
            if country.army.size() < 2 {
                continue;
            }
            for &other in country.neighbours.keys() {
                let target = &self.board.countries()[other.0];
                if !target.is_ruled_by(self.current_turn)
                    && self.board.is_traversable(country.id, other)
                {
                    actions.push(Action::Attack {
                        from: country.name.clone(),
                        to: target.name.clone(),
                    });
                }
            }
        }
        actions
    }

    fn get_possible_fortifications(&self) -> Vec<Action> {
        let mut actions = Vec::new();
        for country in self.board.countries_ruled_by(self.current_turn) {
            if country.army.size() < 2 {
                continue;
            }
            for &other in country.neighbours.keys() {
                let target = &self.board.countries()[other.0];
                if target.is_ruled_by(self.current_turn) {
                    actions.push(Action::Fortify {
                        from: country.name.clone(),
                        to: target.name.clone(),
                        count: country.army.size() - 1,
                    });
                }
            }
        }
        actions
    }

    /// Replaces the selection with `primary` and optionally `secondary`,
    /// failing unless both land in their slots.
    fn select_pair(&mut self, primary: &str, secondary: Option<&str>) -> Result<()> {
        self.selection.clear();
        let source = self.board.country_id(primary)?;
        if !self.select(source)? {
            return Err(GameError::illegal(format!("{} is not yours to act from", primary)));
        }
        if let Some(secondary) = secondary {
            let target = self.board.country_id(secondary)?;
            self.select(target)?;
            if self.selection.both() != Some((source, target)) {
                self.selection.clear();
                return Err(GameError::illegal(format!(
                    "{} is not a valid target from {} during {:?}",
                    secondary, primary, self.turn_phase
                )));
            }
        }
        Ok(())
    }

    pub fn perform(&mut self, action: Action) -> Result<ActionOutcome> {
        debug!("{} performs {:?}", self.current_player().name, action);
        match action {
            Action::Select { country } => {
                Ok(ActionOutcome::Selected(self.select_country(&country)?))
            }
            Action::Reinforce { country, strength } => {
                self.select_pair(&country, None)?;
                self.reinforce(strength)?;
                Ok(ActionOutcome::Done)
            }
            Action::Attack { from, to } => {
                self.select_pair(&from, Some(&to))?;
                Ok(ActionOutcome::Combat(self.attack_round()?))
            }
            Action::Fortify { from, to, count } => {
                self.select_pair(&from, Some(&to))?;
                self.fortify(count)?;
                Ok(ActionOutcome::Done)
            }
            Action::EndPhase => {
                match self.turn_phase {
                    TurnPhase::Setup => self.confirm_setup()?,
                    TurnPhase::Reinforce => self.confirm_reinforcement()?,
                    TurnPhase::Attack => self.confirm_combat()?,
                    TurnPhase::Fortify => self.confirm_movement()?,
                    TurnPhase::EndGame => return Err(GameError::illegal("the game is over")),
                }
                Ok(ActionOutcome::Done)
            }
            Action::EndRound => {
                self.end_round()?;
                Ok(ActionOutcome::RoundEnded)
            }
        }
    }
}
