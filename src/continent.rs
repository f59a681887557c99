use crate::country::CountryId;
use crate::hazard::HazardKind;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct ContinentId(pub usize);

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Continent {
    pub id: ContinentId,
    pub name: String,
    pub bonus_armies: u32,
    pub hazard: HazardKind,
    pub countries: Vec<CountryId>,
}

impl Continent {
    pub fn new(id: ContinentId, name: &str, bonus_armies: u32, hazard: HazardKind) -> Self {
        Self {
            id,
            name: name.to_string(),
            bonus_armies,
            hazard,
            countries: Vec::new(),
        }
    }

    pub fn add_country(&mut self, country: CountryId) {
        if !self.countries.contains(&country) {
            self.countries.push(country);
        }
    }

    pub fn get_bonus(&self) -> u32 {
        self.bonus_armies
    }
}
