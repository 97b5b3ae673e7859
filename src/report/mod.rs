// Sun Jul 26 2026 - Alex

pub mod comparison;
pub mod listing;

pub use comparison::{ComparisonReport, ReportTally, RootOutcome, RootVerdict};
pub use listing::{LayoutEntry, LayoutListing};
