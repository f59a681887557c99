//! Units withdrawn from an army for a single combat round.

use crate::army::Army;
use crate::error::Result;
use crate::unit::Unit;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum MemberState {
    Alive,
    Dead,
    Returned,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SquadMember {
    pub unit: Unit,
    pub state: MemberState,
}

impl SquadMember {
    pub fn is_alive(&self) -> bool {
        self.state == MemberState::Alive
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Squad {
    members: Vec<SquadMember>,
    max_size: usize,
}

impl Squad {
    pub fn new(max_size: usize) -> Self {
        Self {
            members: Vec::with_capacity(max_size),
            max_size,
        }
    }

    pub fn max_size(&self) -> usize {
        self.max_size
    }

    pub fn members(&self) -> &[SquadMember] {
        &self.members
    }

    pub fn alive(&self) -> impl Iterator<Item = &Unit> {
        self.members.iter().filter(|m| m.is_alive()).map(|m| &m.unit)
    }

    pub fn alive_units(&self) -> usize {
        self.members.iter().filter(|m| m.is_alive()).count()
    }

    pub fn strength(&self) -> u32 {
        self.alive().map(|u| u.strength).sum()
    }

    /// Resets the squad into the army, then pulls the army's strongest units
    /// in until the squad is full or only `min_army_size` units remain.
    pub fn auto_populate(&mut self, army: &mut Army, min_army_size: usize) -> Result<()> {
        self.return_squad_to_army(army);
        self.clear();

        while self.members.len() < self.max_size && army.size() > min_army_size {
            let Some(unit) = army.strongest_unit().cloned() else {
                break;
            };
            if !self.move_to_squad(&unit, army)? {
                break;
            }
        }
        Ok(())
    }

    /// Returns false when the squad has no room left.
    pub fn move_to_squad(&mut self, unit: &Unit, army: &mut Army) -> Result<bool> {
        self.remove_non_active_units();
        if self.members.len() >= self.max_size {
            return Ok(false);
        }
        army.remove(unit)?;
        self.members.push(SquadMember {
            unit: unit.clone(),
            state: MemberState::Alive,
        });
        Ok(true)
    }

    /// Marks the first living member of the given strength dead.
    pub fn kill_unit(&mut self, strength: u32) -> bool {
        match self
            .members
            .iter_mut()
            .find(|m| m.is_alive() && m.unit.strength == strength)
        {
            Some(member) => {
                member.state = MemberState::Dead;
                true
            }
            None => false,
        }
    }

    /// Gives every living member back to the army. Members stay listed as
    /// returned until the squad is cleared or purged.
    pub fn return_squad_to_army(&mut self, army: &mut Army) {
        for member in self.members.iter_mut().filter(|m| m.state == MemberState::Alive) {
            army.add(member.unit.clone());
            member.state = MemberState::Returned;
        }
    }

    pub fn remove_non_active_units(&mut self) {
        self.members.retain(|m| m.is_alive());
    }

    /// Drops every member. Dead units are not given back.
    pub fn clear(&mut self) {
        self.members.clear();
    }

    /// Drains the living units out of the squad.
    pub fn take_alive(&mut self) -> Vec<Unit> {
        let units = self.alive().cloned().collect();
        self.clear();
        units
    }
}
