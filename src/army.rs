use crate::error::{GameError, Result};
use crate::unit::{Unit, UnitCatalog};
use serde::{Deserialize, Serialize};

/// Units held by one country, or a player's total pool.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Army {
    units: Vec<Unit>,
}

impl Army {
    pub fn new() -> Self {
        Self { units: Vec::new() }
    }

    pub fn with_strength(strength: u32, catalog: &UnitCatalog) -> Self {
        let mut army = Self::new();
        army.add_strength(strength, catalog);
        army
    }

    pub fn units(&self) -> &[Unit] {
        &self.units
    }

    pub fn size(&self) -> usize {
        self.units.len()
    }

    pub fn strength(&self) -> u32 {
        self.units.iter().map(|u| u.strength).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    pub fn add(&mut self, unit: Unit) {
        self.units.push(unit);
    }

    pub fn add_strength(&mut self, strength: u32, catalog: &UnitCatalog) {
        self.units.extend(catalog.decompose(strength));
    }

    /// Removes one unit equal to `unit`.
    pub fn remove(&mut self, unit: &Unit) -> Result<()> {
        let index = self
            .units
            .iter()
            .position(|u| u == unit)
            .ok_or_else(|| GameError::invalid(format!("army holds no {}", unit.name)))?;
        self.units.remove(index);
        Ok(())
    }

    pub fn remove_at(&mut self, index: usize) -> Result<Unit> {
        if index >= self.units.len() {
            return Err(GameError::invalid(format!(
                "unit index {} out of range for army of {}",
                index,
                self.units.len()
            )));
        }
        Ok(self.units.remove(index))
    }

    /// Takes away exactly `amount` strength: weakest units go first and any
    /// overshoot comes back as change.
    pub fn remove_strength(&mut self, amount: u32, catalog: &UnitCatalog) -> Result<()> {
        let current = self.strength();
        if amount > current {
            return Err(GameError::invalid(format!(
                "cannot remove {} strength from army of strength {}",
                amount, current
            )));
        }

        let mut removed = 0;
        while removed < amount {
            let Some(index) = self.weakest_index() else {
                break;
            };
            removed += self.units.remove(index).strength;
        }
        self.add_strength(removed - amount, catalog);
        Ok(())
    }

    fn weakest_index(&self) -> Option<usize> {
        let min = self.units.iter().map(|u| u.strength).min()?;
        self.units.iter().position(|u| u.strength == min)
    }

    fn strongest_index(&self) -> Option<usize> {
        let max = self.units.iter().map(|u| u.strength).max()?;
        self.units.iter().position(|u| u.strength == max)
    }

    /// First unit with the minimal strength.
    pub fn weakest_unit(&self) -> Option<&Unit> {
        self.weakest_index().map(|i| &self.units[i])
    }

    /// First unit with the maximal strength.
    pub fn strongest_unit(&self) -> Option<&Unit> {
        self.strongest_index().map(|i| &self.units[i])
    }

    /// Collapses to a single unit of the catalog's weakest type.
    pub fn set_to_weakest(&mut self, catalog: &UnitCatalog) {
        self.units.clear();
        self.units.push(catalog.weakest().clone());
    }

    /// Removes and returns up to `count` of the strongest units.
    pub fn take_strongest(&mut self, count: usize) -> Vec<Unit> {
        let mut taken = Vec::with_capacity(count);
        for _ in 0..count {
            match self.strongest_index() {
                Some(index) => taken.push(self.units.remove(index)),
                None => break,
            }
        }
        taken
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn catalog() -> UnitCatalog {
        UnitCatalog::standard()
    }

    #[test]
    fn remove_strength_makes_change() {
        let catalog = catalog();
        let mut army = Army::new();
        army.add(catalog.by_name("Cavalry").unwrap().clone());
        army.remove_strength(2, &catalog).unwrap();
        assert_eq!(army.strength(), 3);
        assert_eq!(army.size(), 3);
    }

    #[test]
    fn remove_strength_beyond_total_fails_and_leaves_army_alone() {
        let catalog = catalog();
        let mut army = Army::with_strength(6, &catalog);
        let before = army.clone();
        assert!(matches!(
            army.remove_strength(7, &catalog),
            Err(GameError::InvalidArgument(_))
        ));
        assert_eq!(army, before);
    }

    #[test]
    fn remove_missing_unit_fails() {
        let catalog = catalog();
        let mut army = Army::with_strength(3, &catalog);
        let artillery = catalog.by_name("Artillery").unwrap().clone();
        assert!(army.remove(&artillery).is_err());
        assert_eq!(army.strength(), 3);
    }

    #[test]
    fn weakest_and_strongest_take_first_match() {
        let mut army = Army::new();
        army.add(Unit::new("A", 2, 10));
        army.add(Unit::new("B", 1, 11));
        army.add(Unit::new("C", 2, 12));
        army.add(Unit::new("D", 1, 13));
        assert_eq!(army.strongest_unit().unwrap().id, 10);
        assert_eq!(army.weakest_unit().unwrap().id, 11);
    }

    #[test]
    fn set_to_weakest_uses_catalog_not_army() {
        let catalog = catalog();
        let mut army = Army::new();
        army.add(catalog.by_name("Artillery").unwrap().clone());
        army.set_to_weakest(&catalog);
        assert_eq!(army.size(), 1);
        assert_eq!(army.units()[0].name, "Infantry");
    }

    #[test]
    fn take_strongest_orders_by_strength() {
        let catalog = catalog();
        let mut army = Army::with_strength(16, &catalog);
        let taken: Vec<u32> = army.take_strongest(2).iter().map(|u| u.strength).collect();
        assert_eq!(taken, vec![10, 5]);
        assert_eq!(army.strength(), 1);
    }

    proptest! {
        #[test]
        fn prop_strength_and_size_track_units(
            start in 0u32..60,
            removals in proptest::collection::vec(0u32..30, 1..10)
        ) {
            let catalog = catalog();
            let mut army = Army::with_strength(start, &catalog);
            for amount in removals {
                let before = army.strength();
                match army.remove_strength(amount, &catalog) {
                    Ok(()) => prop_assert_eq!(army.strength(), before - amount),
                    Err(_) => {
                        prop_assert!(amount > before);
                        prop_assert_eq!(army.strength(), before);
                    }
                }
                let summed: u32 = army.units().iter().map(|u| u.strength).sum();
                prop_assert_eq!(army.strength(), summed);
                prop_assert_eq!(army.size(), army.units().len());
            }
        }
    }
}
