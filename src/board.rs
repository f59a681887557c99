use crate::continent::{Continent, ContinentId};
use crate::country::{Country, CountryId};
use crate::error::{GameError, Result};
use crate::hazard::{self, HazardKind, HazardOutcome};
use crate::link::{Link, LinkId, LinkState};
use crate::player::PlayerId;
use crate::random::{shuffle, RandomSource};
use crate::unit::UnitCatalog;
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::info;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Board {
    countries: Vec<Country>,
    continents: Vec<Continent>,
    links: Vec<Link>,
    index: HashMap<String, CountryId>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct HazardReport {
    pub country: CountryId,
    pub hazard: HazardKind,
    pub outcome: HazardOutcome,
    pub old_size: usize,
    pub new_size: usize,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RoundReport {
    pub hazards: Vec<HazardReport>,
    pub reopened: Vec<LinkId>,
}

impl Board {
    pub fn new() -> Self {
        Self {
            countries: Vec::new(),
            continents: Vec::new(),
            links: Vec::new(),
            index: HashMap::new(),
        }
    }

    pub fn add_country(&mut self, name: &str) -> Result<CountryId> {
        if self.index.contains_key(name) {
            return Err(GameError::invalid(format!("duplicate country '{}'", name)));
        }
        let id = CountryId(self.countries.len());
        self.countries.push(Country::new(id, name));
        self.index.insert(name.to_string(), id);
        Ok(id)
    }

    pub fn add_continent(
        &mut self,
        name: &str,
        bonus_armies: u32,
        hazard: HazardKind,
    ) -> ContinentId {
        let id = ContinentId(self.continents.len());
        self.continents
            .push(Continent::new(id, name, bonus_armies, hazard));
        id
    }

    pub fn add_to_continent(&mut self, continent: ContinentId, country: CountryId) -> Result<()> {
        self.country(country)?;
        let continent = self
            .continents
            .get_mut(continent.0)
            .ok_or_else(|| GameError::invalid(format!("no continent {}", continent.0)))?;
        continent.add_country(country);
        Ok(())
    }

    /// Links `a` and `b` both ways through one shared link.
    pub fn add_neighbour(
        &mut self,
        a: CountryId,
        b: CountryId,
        state: LinkState,
    ) -> Result<LinkId> {
        if a == b {
            return Err(GameError::invalid("a country cannot neighbour itself"));
        }
        self.country(a)?;
        self.country(b)?;
        if self.countries[a.0].is_adjacent(b) {
            return Err(GameError::invalid(format!(
                "'{}' and '{}' are already linked",
                self.countries[a.0].name, self.countries[b.0].name
            )));
        }

        let id = LinkId(self.links.len());
        self.links.push(Link::new(a, b, state));
        self.countries[a.0].neighbours.insert(b, id);
        self.countries[b.0].neighbours.insert(a, id);
        Ok(id)
    }

    pub fn countries(&self) -> &[Country] {
        &self.countries
    }

    pub fn continents(&self) -> &[Continent] {
        &self.continents
    }

    pub fn links(&self) -> &[Link] {
        &self.links
    }

    pub fn country_id(&self, name: &str) -> Result<CountryId> {
        self.index
            .get(name)
            .copied()
            .ok_or_else(|| GameError::UnknownCountry(name.to_string()))
    }

    pub fn country(&self, id: CountryId) -> Result<&Country> {
        self.countries
            .get(id.0)
            .ok_or_else(|| GameError::UnknownCountry(format!("#{}", id.0)))
    }

    pub fn country_mut(&mut self, id: CountryId) -> Result<&mut Country> {
        self.countries
            .get_mut(id.0)
            .ok_or_else(|| GameError::UnknownCountry(format!("#{}", id.0)))
    }

    pub fn get_country(&self, name: &str) -> Option<&Country> {
        self.index.get(name).map(|id| &self.countries[id.0])
    }

    /// Two distinct countries borrowed mutably at once.
    pub fn pair_mut(&mut self, a: CountryId, b: CountryId) -> Result<(&mut Country, &mut Country)> {
        if a == b {
            return Err(GameError::invalid("expected two different countries"));
        }
        self.country(a)?;
        self.country(b)?;
        if a.0 < b.0 {
            let (left, right) = self.countries.split_at_mut(b.0);
            Ok((&mut left[a.0], &mut right[0]))
        } else {
            let (left, right) = self.countries.split_at_mut(a.0);
            Ok((&mut right[0], &mut left[b.0]))
        }
    }

    pub fn link(&self, id: LinkId) -> Result<&Link> {
        self.links
            .get(id.0)
            .ok_or_else(|| GameError::invalid(format!("no link {}", id.0)))
    }

    pub fn link_mut(&mut self, id: LinkId) -> Result<&mut Link> {
        self.links
            .get_mut(id.0)
            .ok_or_else(|| GameError::invalid(format!("no link {}", id.0)))
    }

    pub fn link_between(&self, a: CountryId, b: CountryId) -> Option<&Link> {
        let id = self.countries.get(a.0)?.link_to(b)?;
        self.links.get(id.0)
    }

    /// Adjacent through a link that is not blockaded.
    pub fn is_traversable(&self, a: CountryId, b: CountryId) -> bool {
        self.link_between(a, b)
            .map(|link| link.state().is_traversable())
            .unwrap_or(false)
    }

    /// Returns the previous ruler.
    pub fn set_ruler(
        &mut self,
        id: CountryId,
        ruler: Option<PlayerId>,
    ) -> Result<Option<PlayerId>> {
        let country = self.country_mut(id)?;
        Ok(std::mem::replace(&mut country.ruler, ruler))
    }

    /// The common ruler of every member country, or none as soon as two
    /// members differ or any member is unruled. Computed fresh on each call.
    pub fn continent_ruler(&self, id: ContinentId) -> Option<PlayerId> {
        let continent = self.continents.get(id.0)?;
        let rulers: Vec<Option<PlayerId>> = continent
            .countries
            .iter()
            .map(|c| self.countries[c.0].ruler)
            .collect();
        if rulers.is_empty() || !rulers.iter().all_equal() {
            return None;
        }
        rulers[0]
    }

    pub fn is_ruled(&self, id: ContinentId) -> bool {
        self.continent_ruler(id).is_some()
    }

    pub fn countries_ruled_by(&self, player: PlayerId) -> impl Iterator<Item = &Country> {
        self.countries
            .iter()
            .filter(move |c| c.is_ruled_by(player))
    }

    pub fn strength_ruled_by(&self, player: PlayerId) -> u32 {
        self.countries_ruled_by(player).map(|c| c.army.strength()).sum()
    }

    pub fn units_ruled_by(&self, player: PlayerId) -> usize {
        self.countries_ruled_by(player).map(|c| c.army.size()).sum()
    }

    /// Round boundary on the board: every continent's hazard hits each member
    /// army once, then every link's temporary state ages by a round.
    pub fn end_round(
        &mut self,
        catalog: &UnitCatalog,
        random: &mut dyn RandomSource,
    ) -> Result<RoundReport> {
        let mut report = RoundReport::default();

        for continent in &self.continents {
            let profile = continent.hazard.profile();
            for &id in &continent.countries {
                let army = &mut self.countries[id.0].army;
                let old_size = army.size();
                let outcome = hazard::apply(profile, army, catalog, random)?;
                if outcome.occurred {
                    info!(
                        "{:?} struck {} ({} casualties)",
                        continent.hazard, self.countries[id.0].name, outcome.casualties
                    );
                }
                report.hazards.push(HazardReport {
                    country: id,
                    hazard: continent.hazard,
                    outcome,
                    old_size,
                    new_size: self.countries[id.0].army.size(),
                });
            }
        }

        for (index, link) in self.links.iter_mut().enumerate() {
            if link.elapse() {
                report.reopened.push(LinkId(index));
            }
        }

        Ok(report)
    }

    /// Shuffles the countries and deals them round-robin, continent by
    /// continent, so no player starts with a whole continent handed to it.
    pub fn distribute_countries(
        &mut self,
        players: &[PlayerId],
        random: &mut dyn RandomSource,
    ) -> Result<Vec<(CountryId, PlayerId)>> {
        if players.is_empty() {
            return Err(GameError::invalid("no players to distribute countries to"));
        }

        let mut groups: Vec<Vec<CountryId>> = self
            .continents
            .iter()
            .map(|continent| continent.countries.clone())
            .collect();
        let grouped: Vec<CountryId> = groups.iter().flatten().copied().collect();
        let loose: Vec<CountryId> = self
            .countries
            .iter()
            .map(|c| c.id)
            .filter(|id| !grouped.contains(id))
            .collect();
        if !loose.is_empty() {
            groups.push(loose);
        }
        shuffle(&mut groups, random);

        let mut assignments = Vec::new();
        let mut player_index = 0;
        for group in &mut groups {
            shuffle(group, random);
            for &country in group.iter() {
                if self.countries[country.0].ruler.is_some() {
                    continue;
                }
                let player = players[player_index];
                self.countries[country.0].ruler = Some(player);
                assignments.push((country, player));
                player_index = (player_index + 1) % players.len();
            }
        }

        Ok(assignments)
    }
}

impl Default for Board {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::random::{ScriptedRandom, SeededRandom};

    fn triangle() -> (Board, [CountryId; 3], ContinentId) {
        let mut board = Board::new();
        let a = board.add_country("Alba").unwrap();
        let b = board.add_country("Brisk").unwrap();
        let c = board.add_country("Corran").unwrap();
        board.add_neighbour(a, b, LinkState::Open).unwrap();
        board.add_neighbour(b, c, LinkState::Open).unwrap();
        let north = board.add_continent("North", 2, HazardKind::Calm);
        for id in [a, b, c] {
            board.add_to_continent(north, id).unwrap();
        }
        (board, [a, b, c], north)
    }

    #[test]
    fn neighbours_are_symmetric_and_share_a_link() {
        let (board, [a, b, c], _) = triangle();
        assert!(board.country(a).unwrap().is_adjacent(b));
        assert!(board.country(b).unwrap().is_adjacent(a));
        assert!(!board.country(a).unwrap().is_adjacent(c));
        assert_eq!(
            board.country(a).unwrap().link_to(b),
            board.country(b).unwrap().link_to(a)
        );
    }

    #[test]
    fn duplicate_and_self_links_are_rejected() {
        let (mut board, [a, b, _], _) = triangle();
        assert!(board.add_neighbour(a, a, LinkState::Open).is_err());
        assert!(board.add_neighbour(b, a, LinkState::Open).is_err());
        assert!(board.add_country("Alba").is_err());
    }

    #[test]
    fn continent_with_an_unruled_member_is_unruled() {
        let (mut board, [a, b, c], north) = triangle();
        board.set_ruler(a, Some(PlayerId(0))).unwrap();
        board.set_ruler(b, Some(PlayerId(0))).unwrap();
        assert_eq!(board.continent_ruler(north), None);
        assert!(!board.is_ruled(north));

        board.set_ruler(c, Some(PlayerId(1))).unwrap();
        assert_eq!(board.continent_ruler(north), None);

        board.set_ruler(c, Some(PlayerId(0))).unwrap();
        assert_eq!(board.continent_ruler(north), Some(PlayerId(0)));
    }

    #[test]
    fn set_ruler_reports_previous_ruler() {
        let (mut board, [a, _, _], _) = triangle();
        assert_eq!(board.set_ruler(a, Some(PlayerId(1))).unwrap(), None);
        assert_eq!(
            board.set_ruler(a, Some(PlayerId(0))).unwrap(),
            Some(PlayerId(1))
        );
    }

    #[test]
    fn end_round_ages_blockades() {
        let (mut board, [a, b, _], _) = triangle();
        let catalog = UnitCatalog::standard();
        let mut random = ScriptedRandom::new();
        let link = board.country(a).unwrap().link_to(b).unwrap();
        board.link_mut(link).unwrap().block(2).unwrap();
        assert!(!board.is_traversable(a, b));

        let first = board.end_round(&catalog, &mut random).unwrap();
        assert!(first.reopened.is_empty());
        assert!(board.link(link).unwrap().is_blocked());

        let second = board.end_round(&catalog, &mut random).unwrap();
        assert_eq!(second.reopened, vec![link]);
        assert!(!board.link(link).unwrap().is_blocked());
        assert_eq!(board.link(link).unwrap().duration(), 0);
        assert!(board.is_traversable(a, b));
    }

    #[test]
    fn end_round_reports_every_country_of_every_continent() {
        let (mut board, ids, _) = triangle();
        let catalog = UnitCatalog::standard();
        for id in ids {
            board.country_mut(id).unwrap().army.add_strength(4, &catalog);
        }
        let report = board.end_round(&catalog, &mut SeededRandom::new(5)).unwrap();
        assert_eq!(report.hazards.len(), 3);
        assert!(report.hazards.iter().all(|h| !h.outcome.occurred));
    }

    #[test]
    fn distribution_deals_every_country_once() {
        let (mut board, _, _) = triangle();
        board.add_country("Drift").unwrap();
        let players = [PlayerId(0), PlayerId(1)];
        let dealt = board
            .distribute_countries(&players, &mut SeededRandom::new(11))
            .unwrap();
        assert_eq!(dealt.len(), 4);
        assert!(board.countries().iter().all(|c| c.ruler.is_some()));
        assert_eq!(board.countries_ruled_by(PlayerId(0)).count(), 2);
        assert_eq!(board.countries_ruled_by(PlayerId(1)).count(), 2);
    }

    #[test]
    fn pair_mut_hands_out_both_orders() {
        let (mut board, [a, b, _], _) = triangle();
        let (first, second) = board.pair_mut(b, a).unwrap();
        assert_eq!(first.name, "Brisk");
        assert_eq!(second.name, "Alba");
        assert!(board.pair_mut(a, a).is_err());
    }
}
