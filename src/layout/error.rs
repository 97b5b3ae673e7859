// Thu Jul 23 2026 - Alex

use thiserror::Error;

use crate::graph::node::TypeIdx;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LayoutError {
    #[error("Value recursion without a pointer: {}", cycle.join(" -> "))]
    InvalidRecursiveValueType { cycle: Vec<String> },
    #[error("Recursion depth {depth} exceeded the arena size")]
    UnboundedRecursion { depth: usize },
    #[error("Array '{name}' has an unresolved element count")]
    UnresolvedArrayLength { name: String },
    #[error("Size overflow while laying out '{name}'")]
    SizeOverflow { name: String },
    #[error("Index {index} is not in this graph")]
    UnknownIndex { index: TypeIdx },
}
