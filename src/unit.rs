use crate::error::{GameError, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct Unit {
    pub name: String,
    pub strength: u32,
    pub id: u32,
}

impl Unit {
    pub fn new(name: &str, strength: u32, id: u32) -> Self {
        Self {
            name: name.to_string(),
            strength,
            id,
        }
    }
}

/// Every unit type known to one game session. Passed explicitly to armies,
/// squads and combat rather than living in a global.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(try_from = "Vec<Unit>", into = "Vec<Unit>")]
pub struct UnitCatalog {
    // Sorted strongest first.
    units: Vec<Unit>,
}

impl UnitCatalog {
    pub fn new(mut units: Vec<Unit>) -> Result<Self> {
        if units.iter().any(|u| u.strength == 0) {
            return Err(GameError::invalid("unit strength must be positive"));
        }
        if !units.iter().any(|u| u.strength == 1) {
            return Err(GameError::invalid(
                "unit catalog needs a unit of strength 1",
            ));
        }
        // Stable, so equal strengths keep their declared order.
        units.sort_by(|a, b| b.strength.cmp(&a.strength));
        Ok(Self { units })
    }

    /// Infantry (1), cavalry (5), artillery (10).
    pub fn standard() -> Self {
        Self {
            units: vec![
                Unit::new("Artillery", 10, 2),
                Unit::new("Cavalry", 5, 1),
                Unit::new("Infantry", 1, 0),
            ],
        }
    }

    pub fn units(&self) -> &[Unit] {
        &self.units
    }

    /// Weakest of all defined types, whether or not any army holds one.
    pub fn weakest(&self) -> &Unit {
        let min = self.units.iter().map(|u| u.strength).min().unwrap_or(1);
        self.units
            .iter()
            .find(|u| u.strength == min)
            .unwrap_or(&self.units[self.units.len() - 1])
    }

    pub fn strongest(&self) -> &Unit {
        &self.units[0]
    }

    pub fn by_name(&self, name: &str) -> Option<&Unit> {
        self.units.iter().find(|u| u.name == name)
    }

    /// Greedy strongest-first split of `strength` into catalog units.
    pub fn decompose(&self, strength: u32) -> Vec<Unit> {
        let mut remaining = strength;
        let mut parts = Vec::new();
        for unit in &self.units {
            while remaining >= unit.strength {
                parts.push(unit.clone());
                remaining -= unit.strength;
            }
        }
        parts
    }
}

impl TryFrom<Vec<Unit>> for UnitCatalog {
    type Error = GameError;

    fn try_from(units: Vec<Unit>) -> Result<Self> {
        Self::new(units)
    }
}

impl From<UnitCatalog> for Vec<Unit> {
    fn from(catalog: UnitCatalog) -> Self {
        catalog.units
    }
}

impl Default for UnitCatalog {
    fn default() -> Self {
        Self::standard()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decompose_prefers_strongest_units() {
        let catalog = UnitCatalog::standard();
        let parts: Vec<u32> = catalog.decompose(17).iter().map(|u| u.strength).collect();
        assert_eq!(parts, vec![10, 5, 1, 1]);
        assert!(catalog.decompose(0).is_empty());
    }

    #[test]
    fn weakest_is_global_not_per_army() {
        let catalog = UnitCatalog::new(vec![
            Unit::new("Knight", 4, 1),
            Unit::new("Peasant", 1, 0),
            Unit::new("Militia", 1, 2),
        ])
        .unwrap();
        assert_eq!(catalog.weakest().name, "Peasant");
        assert_eq!(catalog.strongest().name, "Knight");
    }

    #[test]
    fn catalog_without_single_strength_unit_is_rejected() {
        let result = UnitCatalog::new(vec![Unit::new("Knight", 4, 1)]);
        assert!(matches!(result, Err(GameError::InvalidArgument(_))));
    }

    #[test]
    fn deserialising_goes_through_the_same_checks() {
        assert!(serde_json::from_str::<UnitCatalog>("[]").is_err());

        let json = r#"[{"name": "Peasant", "strength": 1, "id": 0},
                       {"name": "Knight", "strength": 4, "id": 1}]"#;
        let catalog: UnitCatalog = serde_json::from_str(json).unwrap();
        assert_eq!(catalog.strongest().name, "Knight");
        assert_eq!(catalog.weakest().name, "Peasant");

        let back = serde_json::to_string(&catalog).unwrap();
        assert_eq!(serde_json::from_str::<UnitCatalog>(&back).unwrap(), catalog);
    }
}
