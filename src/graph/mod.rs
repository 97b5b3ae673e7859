// Tue Jul 21 2026 - Alex

pub mod arena;
pub mod builder;
pub mod error;
pub mod node;
pub mod typedefs;

pub use arena::TypeGraph;
pub use builder::{BuildOutcome, GraphBuilder};
pub use error::{BuildError, GraphLoadError};
pub use node::{
    EnumMember, FieldNode, PrimitiveClass, PrimitiveKind, TypeIdx, TypeKind, TypeNode,
};
pub use typedefs::TypedefEntry;
