//! Error types for vecplane

use thiserror::Error;

/// Result type alias for vecplane operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in vecplane operations
///
/// Only input validation surfaces here. Numeric degeneracy is repaired
/// locally and unknown item ids are no-ops, so neither has a variant.
#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Vector parse error: {0}")]
    VectorParse(String),

    #[error("Bad pack: {0}")]
    InvalidPack(String),

    #[error("Dimension {0} out of range (2..=256)")]
    DimensionOutOfRange(usize),

    #[error("Item not found: {0}")]
    NotFound(String),

    #[error("Config error: {0}")]
    Config(String),
}
