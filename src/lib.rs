// Mon Jul 27 2026 - Alex

pub mod cli;
pub mod config;
pub mod decl;
pub mod equiv;
pub mod graph;
pub mod layout;
pub mod report;
pub mod utils;

pub use config::Config;
pub use decl::DeclFeed;
pub use equiv::{CompareFlags, EquivalenceEngine, EquivalenceResult};
pub use graph::{GraphBuilder, TypeGraph, TypeIdx};
pub use layout::{LayoutEngine, LayoutInfo, TargetModel};
pub use report::{ComparisonReport, LayoutListing};
