// Mon Jul 20 2026 - Alex

use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Alignment {
    value: u64,
}

impl Alignment {
    pub fn new(value: u64) -> Self {
        assert!(value > 0 && value.is_power_of_two());
        Self { value }
    }

    pub fn one() -> Self {
        Self { value: 1 }
    }

    pub fn as_u64(&self) -> u64 {
        self.value
    }

    pub fn as_usize(&self) -> usize {
        self.value as usize
    }

    pub fn align(&self, offset: u64) -> u64 {
        (offset + self.value - 1) & !(self.value - 1)
    }

    pub fn max(self, other: Alignment) -> Alignment {
        if other.value > self.value {
            other
        } else {
            self
        }
    }
}

impl Default for Alignment {
    fn default() -> Self {
        Self::one()
    }
}

impl fmt::Display for Alignment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.value)
    }
}
