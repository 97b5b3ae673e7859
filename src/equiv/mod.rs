// Sat Jul 25 2026 - Alex

pub mod engine;
pub mod error;
pub mod flags;
pub mod path;
pub mod report;

pub use engine::EquivalenceEngine;
pub use error::{CompareError, Side};
pub use flags::CompareFlags;
pub use path::{DivergePath, PathStep};
pub use report::{Divergence, EquivalenceResult, MismatchKind};
