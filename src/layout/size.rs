// Mon Jul 20 2026 - Alex

use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Size {
    value: u64,
}

impl Size {
    pub fn new(value: u64) -> Self {
        Self { value }
    }

    pub fn zero() -> Self {
        Self { value: 0 }
    }

    pub fn as_u64(&self) -> u64 {
        self.value
    }

    pub fn as_usize(&self) -> usize {
        self.value as usize
    }

    pub fn is_zero(&self) -> bool {
        self.value == 0
    }

    pub fn checked_add(&self, other: Size) -> Option<Size> {
        self.value.checked_add(other.value).map(Size::new)
    }

    pub fn checked_mul(&self, count: u64) -> Option<Size> {
        self.value.checked_mul(count).map(Size::new)
    }
}

impl fmt::Display for Size {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.value)
    }
}

impl From<u64> for Size {
    fn from(value: u64) -> Self {
        Self::new(value)
    }
}
