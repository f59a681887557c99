use crate::army::Army;
use crate::link::LinkId;
use crate::player::PlayerId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CountryId(pub usize);

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Country {
    pub id: CountryId,
    pub name: String,
    pub ruler: Option<PlayerId>,
    pub army: Army,
    pub neighbours: BTreeMap<CountryId, LinkId>,
}

impl Country {
    pub fn new(id: CountryId, name: &str) -> Self {
        Self {
            id,
            name: name.to_string(),
            ruler: None,
            army: Army::new(),
            neighbours: BTreeMap::new(),
        }
    }

    pub fn is_adjacent(&self, other: CountryId) -> bool {
        self.neighbours.contains_key(&other)
    }

    pub fn link_to(&self, other: CountryId) -> Option<LinkId> {
        self.neighbours.get(&other).copied()
    }

    pub fn is_ruled_by(&self, player: PlayerId) -> bool {
        self.ruler == Some(player)
    }
}
