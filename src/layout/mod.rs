// Wed Jul 22 2026 - Alex

pub mod alignment;
pub mod descent;
pub mod engine;
pub mod error;
pub mod info;
pub mod offset;
pub mod size;
pub mod target;

pub use alignment::Alignment;
pub use descent::{path_string, DescentRecord, DescentStep};
pub use engine::LayoutEngine;
pub use error::LayoutError;
pub use info::{FieldLayout, LayoutInfo};
pub use offset::Offset;
pub use size::Size;
pub use target::{StructPacking, TargetModel};
