//! Error types for the retrieval engine

use thiserror::Error;

pub type Result<T> = std::result::Result<T, RetrievalError>;

#[derive(Error, Debug)]
pub enum RetrievalError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("vector dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("id already exists: {0}")]
    DuplicateId(String),

    #[error("id not found: {0}")]
    NotFound(String),

    #[error("namespace capacity exhausted (max_elements = {max_elements})")]
    CapacityExhausted { max_elements: usize },

    #[error(
        "hybrid weights must sum to 1.0, got vector_weight={vector_weight}, text_weight={text_weight}"
    )]
    BadWeights { vector_weight: f32, text_weight: f32 },

    #[error("persisted snapshot is corrupt: {0}")]
    LoadCorrupt(String),
}

impl From<bincode::Error> for RetrievalError {
    fn from(err: bincode::Error) -> Self {
        RetrievalError::Serialization(err.to_string())
    }
}

impl From<serde_json::Error> for RetrievalError {
    fn from(err: serde_json::Error) -> Self {
        RetrievalError::Serialization(err.to_string())
    }
}
