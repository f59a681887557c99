use crate::error::{GameError, Result};
use crate::country::CountryId;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
pub enum LinkState {
    #[default]
    Open,
    Blockade,
}

impl LinkState {
    pub fn is_traversable(self) -> bool {
        matches!(self, LinkState::Open)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct LinkId(pub usize);

/// Connection between two countries. A temporary state holds for
/// `duration` rounds, then the link falls back to its default.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Link {
    pub ends: (CountryId, CountryId),
    default_state: LinkState,
    state: LinkState,
    duration: u32,
}

impl Link {
    pub fn new(a: CountryId, b: CountryId, default_state: LinkState) -> Self {
        Self {
            ends: (a, b),
            default_state,
            state: default_state,
            duration: 0,
        }
    }

    pub fn open(a: CountryId, b: CountryId) -> Self {
        Self::new(a, b, LinkState::Open)
    }

    pub fn state(&self) -> LinkState {
        self.state
    }

    pub fn default_state(&self) -> LinkState {
        self.default_state
    }

    pub fn duration(&self) -> u32 {
        self.duration
    }

    pub fn is_blocked(&self) -> bool {
        self.state == LinkState::Blockade
    }

    pub fn other_end(&self, from: CountryId) -> Option<CountryId> {
        match self.ends {
            (a, b) if a == from => Some(b),
            (a, b) if b == from => Some(a),
            _ => None,
        }
    }

    /// Holds `state` for `rounds` rounds.
    pub fn set_temporary(&mut self, state: LinkState, rounds: u32) -> Result<()> {
        if rounds == 0 {
            return Err(GameError::invalid("temporary link state needs a duration"));
        }
        if state == self.default_state {
            return Err(GameError::invalid(format!(
                "link is already {:?} by default",
                state
            )));
        }
        self.state = state;
        self.duration = rounds;
        Ok(())
    }

    pub fn block(&mut self, rounds: u32) -> Result<()> {
        self.set_temporary(LinkState::Blockade, rounds)
    }

    /// One round passes. Returns true when the link reverted.
    pub fn elapse(&mut self) -> bool {
        if self.duration == 0 {
            return false;
        }
        self.duration -= 1;
        if self.duration == 0 {
            self.state = self.default_state;
            return true;
        }
        false
    }
}
