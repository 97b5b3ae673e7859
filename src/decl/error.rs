// Mon Jul 20 2026 - Alex

use thiserror::Error;

#[derive(Error, Debug)]
pub enum FeedError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Bad type reference '{input}': {detail}")]
    BadTypeRef { input: String, detail: String },
    #[error("Feed '{path}' is empty")]
    EmptyFeed { path: String },
}
