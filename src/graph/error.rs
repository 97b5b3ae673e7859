// Tue Jul 21 2026 - Alex

use thiserror::Error;

use crate::graph::node::TypeIdx;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BuildError {
    #[error("Malformed declaration '{decl}': {detail}")]
    MalformedDeclaration { decl: String, detail: String },
    #[error("Typedef cycle: {}", chain.join(" -> "))]
    TypedefCycle { chain: Vec<String> },
    #[error("Conflicting definition of '{name}': {detail}")]
    ConflictingDefinition { name: String, detail: String },
    #[error("Unknown type '{name}'")]
    UnknownType { name: String },
    #[error("Invalid index {index} in {context}")]
    InvalidIndex { index: TypeIdx, context: String },
}

#[derive(Error, Debug)]
pub enum GraphLoadError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Invalid(#[from] BuildError),
}
