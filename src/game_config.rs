use crate::army::Army;
use crate::board::Board;
use crate::challenge::Challenge;
use crate::combat::CombatConfig;
use crate::error::{GameError, Result};
use crate::game::{Game, GameSetup};
use crate::hazard::HazardKind;
use crate::link::LinkState;
use crate::player::{Player, PlayerId, PlayerKind};
use crate::random::SeededRandom;
use crate::unit::{Unit, UnitCatalog};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

/// Map, players and rules for one game, as read from JSON.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameConfig {
    #[serde(default = "standard_units")]
    pub units: Vec<UnitConfig>,
    pub countries: Vec<CountryConfig>,
    #[serde(default)]
    pub links: Vec<LinkConfig>,
    #[serde(default)]
    pub continents: Vec<ContinentConfig>,
    pub players: Vec<PlayerConfig>,
    #[serde(default)]
    pub challenges: Vec<Challenge>,
    #[serde(default)]
    pub combat: CombatConfig,
    #[serde(default)]
    pub rules: Rules,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnitConfig {
    pub name: String,
    pub strength: u32,
    pub id: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CountryConfig {
    pub name: String,
    /// Index into `players`.
    #[serde(default)]
    pub ruler: Option<usize>,
    #[serde(default = "one")]
    pub strength: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinkConfig {
    pub a: String,
    pub b: String,
    #[serde(default)]
    pub blockade: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContinentConfig {
    pub name: String,
    #[serde(default)]
    pub hazard: HazardKind,
    #[serde(default)]
    pub bonus: u32,
    pub countries: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerConfig {
    pub name: String,
    #[serde(default)]
    pub ai: bool,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Rules {
    /// Strength each player places during setup.
    pub initial_strength: u32,
    pub min_reinforcement: u32,
    pub countries_per_reinforcement: u32,
}

impl Default for Rules {
    fn default() -> Self {
        Self {
            initial_strength: 10,
            min_reinforcement: 3,
            countries_per_reinforcement: 3,
        }
    }
}

fn one() -> u32 {
    1
}

fn standard_units() -> Vec<UnitConfig> {
    UnitCatalog::standard()
        .units()
        .iter()
        .map(|unit| UnitConfig {
            name: unit.name.clone(),
            strength: unit.strength,
            id: unit.id,
        })
        .collect()
}

fn config_error(err: GameError) -> GameError {
    match err {
        GameError::Config(_) => err,
        other => GameError::Config(other.to_string()),
    }
}

impl GameConfig {
    pub fn from_json(data: &str) -> Result<Self> {
        Ok(serde_json::from_str(data)?)
    }

    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self> {
        let data = std::fs::read_to_string(path)?;
        Self::from_json(&data)
    }

    /// The built-in twelve-country map for four players.
    pub fn default_map() -> Result<Self> {
        Self::from_json(include_str!("config.json"))
    }

    pub fn catalog(&self) -> Result<UnitCatalog> {
        let units = self
            .units
            .iter()
            .map(|unit| Unit::new(&unit.name, unit.strength, unit.id))
            .collect();
        UnitCatalog::new(units).map_err(config_error)
    }

    /// Validates the config and lays out board and players. When no country
    /// names a ruler, countries are dealt out at random from `seed`.
    pub fn to_setup(&self, seed: u64) -> Result<GameSetup> {
        if self.players.len() < 2 {
            return Err(GameError::Config(format!(
                "a game needs at least 2 players, got {}",
                self.players.len()
            )));
        }
        let catalog = self.catalog()?;
        let mut board = Board::new();

        for country in &self.countries {
            let id = board.add_country(&country.name).map_err(config_error)?;
            if let Some(ruler) = country.ruler {
                if ruler >= self.players.len() {
                    return Err(GameError::Config(format!(
                        "{} is ruled by unknown player {}",
                        country.name, ruler
                    )));
                }
            }
            let country_mut = board.country_mut(id)?;
            country_mut.army = Army::with_strength(country.strength.max(1), &catalog);
            country_mut.ruler = country.ruler.map(PlayerId);
        }

        for link in &self.links {
            let a = board.country_id(&link.a).map_err(config_error)?;
            let b = board.country_id(&link.b).map_err(config_error)?;
            let state = if link.blockade {
                LinkState::Blockade
            } else {
                LinkState::Open
            };
            board.add_neighbour(a, b, state).map_err(config_error)?;
        }

        let mut placed = HashSet::new();
        for continent in &self.continents {
            let id = board.add_continent(&continent.name, continent.bonus, continent.hazard);
            for name in &continent.countries {
                if !placed.insert(name.as_str()) {
                    return Err(GameError::Config(format!(
                        "{} belongs to more than one continent",
                        name
                    )));
                }
                let country = board.country_id(name).map_err(config_error)?;
                board.add_to_continent(id, country)?;
            }
        }

        let players: Vec<Player> = self
            .players
            .iter()
            .enumerate()
            .map(|(index, player)| {
                let kind = if player.ai {
                    PlayerKind::Ai
                } else {
                    PlayerKind::Human
                };
                Player::new(PlayerId(index), &player.name, kind)
            })
            .collect();

        if self.countries.iter().all(|c| c.ruler.is_none()) {
            let ids: Vec<PlayerId> = players.iter().map(|p| p.id).collect();
            board.distribute_countries(&ids, &mut SeededRandom::new(seed.rotate_left(17)))?;
        }

        if self.combat.max_attack_squad == 0 || self.combat.max_defend_squad == 0 {
            return Err(GameError::Config(
                "combat squads need room for at least one unit".to_string(),
            ));
        }

        for challenge in &self.challenges {
            if challenge.goal == 0 {
                return Err(GameError::Config("challenge goals must be positive".to_string()));
            }
        }

        Ok(GameSetup {
            board,
            players,
            catalog,
            challenges: self.challenges.clone(),
            rules: self.rules,
            combat: self.combat,
        })
    }

    pub fn into_game(self, seed: u64) -> Result<Game> {
        Game::seeded(self.to_setup(seed)?, seed).map_err(config_error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::turn_phase::TurnPhase;

    const SMALL: &str = r#"{
        "countries": [
            {"name": "Alpha", "ruler": 0, "strength": 3},
            {"name": "Beta", "ruler": 1},
            {"name": "Gamma"}
        ],
        "links": [
            {"a": "Alpha", "b": "Beta"},
            {"a": "Beta", "b": "Gamma", "blockade": true}
        ],
        "continents": [
            {"name": "Only", "hazard": "Storm", "bonus": 2, "countries": ["Alpha", "Beta", "Gamma"]}
        ],
        "players": [{"name": "Red"}, {"name": "Blue", "ai": true}],
        "rules": {"initial_strength": 4}
    }"#;

    #[test]
    fn small_map_builds_with_defaults_filled_in() {
        let config = GameConfig::from_json(SMALL).unwrap();
        assert_eq!(config.rules.min_reinforcement, 3);
        assert_eq!(config.combat, CombatConfig::default());

        let game = config.into_game(5).unwrap();
        assert_eq!(game.turn_phase(), TurnPhase::Setup);
        assert_eq!(game.board().countries().len(), 3);
        assert_eq!(game.players()[0].army.strength(), 3);
        assert_eq!(game.players()[0].distributable, 4);
        assert!(game.players()[1].is_ai());

        let gamma = game.board().get_country("Gamma").unwrap();
        assert_eq!(gamma.ruler, None);
        assert_eq!(gamma.army.size(), 1);
        let beta = game.board().country_id("Beta").unwrap();
        assert!(!game.board().is_traversable(beta, gamma.id));
        game.verify_invariants().unwrap();
    }

    #[test]
    fn default_map_deals_every_country() {
        let game = GameConfig::default_map().unwrap().into_game(11).unwrap();
        assert!(game.board().countries().iter().all(|c| c.ruler.is_some()));
        let counts: Vec<usize> = game.players().iter().map(|p| p.countries_ruled).collect();
        assert_eq!(counts.iter().sum::<usize>(), game.board().countries().len());
        assert!(counts.iter().all(|&c| c > 0));
        game.verify_invariants().unwrap();
    }

    #[test]
    fn same_seed_deals_the_same_map() {
        let rulers = |seed| {
            let game = GameConfig::default_map().unwrap().into_game(seed).unwrap();
            game.board()
                .countries()
                .iter()
                .map(|c| c.ruler)
                .collect::<Vec<_>>()
        };
        assert_eq!(rulers(3), rulers(3));
    }

    #[test]
    fn inconsistent_configs_are_rejected() {
        let mut config = GameConfig::from_json(SMALL).unwrap();
        config.countries.push(config.countries[0].clone());
        assert!(matches!(config.into_game(0), Err(GameError::Config(_))));

        let mut config = GameConfig::from_json(SMALL).unwrap();
        config.links.push(LinkConfig {
            a: "Alpha".to_string(),
            b: "Nowhere".to_string(),
            blockade: false,
        });
        assert!(matches!(config.into_game(0), Err(GameError::Config(_))));

        let mut config = GameConfig::from_json(SMALL).unwrap();
        config.players.truncate(1);
        assert!(matches!(config.into_game(0), Err(GameError::Config(_))));

        let mut config = GameConfig::from_json(SMALL).unwrap();
        config.units.retain(|u| u.strength != 1);
        assert!(matches!(config.into_game(0), Err(GameError::Config(_))));

        let mut config = GameConfig::from_json(SMALL).unwrap();
        config.countries[1].ruler = Some(7);
        assert!(matches!(config.into_game(0), Err(GameError::Config(_))));
    }

    #[test]
    fn empty_squads_are_rejected() {
        let json = SMALL.replace(
            r#""rules""#,
            r#""combat": {"max_attack_squad": 3, "max_defend_squad": 0}, "rules""#,
        );
        let config = GameConfig::from_json(&json).unwrap();
        assert_eq!(config.combat.max_defend_squad, 0);
        assert!(matches!(config.into_game(0), Err(GameError::Config(_))));

        let mut setup = GameConfig::from_json(SMALL).unwrap().to_setup(0).unwrap();
        setup.combat.max_attack_squad = 0;
        assert!(matches!(Game::seeded(setup, 0), Err(GameError::Config(_))));
    }

    #[test]
    fn malformed_json_is_a_json_error() {
        assert!(matches!(
            GameConfig::from_json("{ not json"),
            Err(GameError::Json(_))
        ));
    }
}
