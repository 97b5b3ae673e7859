// Sat Jul 25 2026 - Alex

use std::fmt;

use thiserror::Error;

use crate::layout::LayoutError;

/// Which comparison operand a message refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Left,
    Right,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Left => write!(f, "left"),
            Side::Right => write!(f, "right"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompareError {
    #[error("No type named '{name}' on the {side} side")]
    RootNotFound { side: Side, name: String },

    #[error(transparent)]
    Layout(#[from] LayoutError),
}
