//! Environmental hazards applied per continent at every round boundary.
//!
//! A hazard kind is only a key into a profile table; [`apply`] is the one
//! piece of behaviour shared by all kinds.

use crate::army::Army;
use crate::error::Result;
use crate::random::RandomSource;
use crate::unit::UnitCatalog;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
pub enum HazardKind {
    #[default]
    Calm,
    Storm,
    Flood,
    Famine,
    Plague,
    Earthquake,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HazardProfile {
    pub percent_chance: u32,
    pub max_casualty_percent: u32,
}

impl HazardKind {
    pub fn profile(self) -> HazardProfile {
        let (percent_chance, max_casualty_percent) = match self {
            HazardKind::Calm => (0, 0),
            HazardKind::Storm => (10, 12),
            HazardKind::Flood => (6, 20),
            HazardKind::Famine => (5, 25),
            HazardKind::Plague => (3, 40),
            HazardKind::Earthquake => (2, 50),
        };
        HazardProfile {
            percent_chance,
            max_casualty_percent,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct HazardOutcome {
    pub occurred: bool,
    pub casualties: usize,
    pub strength_lost: u32,
}

/// Rolls for occurrence, then for magnitude. Casualties are a share in
/// `[max/4, max)` percent of the army's size, at least one unit; units are
/// picked uniformly. An army is never left with fewer than one unit: if the
/// casualties would reach its size it collapses to the weakest state.
pub fn apply(
    profile: HazardProfile,
    army: &mut Army,
    catalog: &UnitCatalog,
    random: &mut dyn RandomSource,
) -> Result<HazardOutcome> {
    if army.is_empty() || random.percent() >= profile.percent_chance {
        return Ok(HazardOutcome::default());
    }

    let low = profile.max_casualty_percent / 4;
    let spread = profile.max_casualty_percent - low;
    let share = if spread == 0 {
        low
    } else {
        low + random.below(spread as usize) as u32
    };

    let size = army.size();
    let casualties = (size * share as usize / 100).max(1);
    let before = army.strength();

    if casualties >= size {
        army.set_to_weakest(catalog);
    } else {
        for _ in 0..casualties {
            let index = random.below(army.size());
            army.remove_at(index)?;
        }
    }

    Ok(HazardOutcome {
        occurred: true,
        casualties,
        strength_lost: before.saturating_sub(army.strength()),
    })
}
