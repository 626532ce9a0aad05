//! Error types shared across the hcr crates.

use std::fmt;

/// Errors that can occur during corpus construction, tree building, or retrieval.
#[derive(Debug)]
pub enum HcrError {
    /// Chunk failed validation (empty content, non-positive token count).
    InvalidChunk(String),
    /// Query failed validation (empty gold chunk list).
    InvalidQuery(String),
    /// Tree failed validation (missing root, dangling edge, bad node invariant).
    InvalidTree(String),
    /// Invalid parameter value.
    InvalidParameter(String),
    /// Dimension mismatch between embeddings and identifiers, or between vectors.
    DimensionMismatch { expected: usize, actual: usize },
    /// Empty index (no documents indexed).
    EmptyIndex,
    /// A required artifact (corpus file, query file) is absent.
    MissingArtifact(String),
    /// An external provider (embedder, cross-encoder, LLM) failed.
    Provider(String),
    /// I/O failure while reading or writing a persisted artifact.
    Io(std::io::Error),
    /// JSON (de)serialization failure.
    Json(serde_json::Error),
}

impl fmt::Display for HcrError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HcrError::InvalidChunk(msg) => write!(f, "Invalid chunk: {}", msg),
            HcrError::InvalidQuery(msg) => write!(f, "Invalid query: {}", msg),
            HcrError::InvalidTree(msg) => write!(f, "Invalid tree: {}", msg),
            HcrError::InvalidParameter(msg) => write!(f, "Invalid parameter: {}", msg),
            HcrError::DimensionMismatch { expected, actual } => {
                write!(
                    f,
                    "Dimension mismatch: expected {}, got {}",
                    expected, actual
                )
            }
            HcrError::EmptyIndex => write!(f, "Index is empty"),
            HcrError::MissingArtifact(path) => {
                write!(f, "Missing required artifact: {}", path)
            }
            HcrError::Provider(msg) => write!(f, "Provider failure: {}", msg),
            HcrError::Io(err) => write!(f, "I/O error: {}", err),
            HcrError::Json(err) => write!(f, "JSON error: {}", err),
        }
    }
}

impl std::error::Error for HcrError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            HcrError::Io(err) => Some(err),
            HcrError::Json(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for HcrError {
    fn from(err: std::io::Error) -> Self {
        HcrError::Io(err)
    }
}

impl From<serde_json::Error> for HcrError {
    fn from(err: serde_json::Error) -> Self {
        HcrError::Json(err)
    }
}
