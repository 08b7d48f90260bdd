//! Error types for ingestion and graph construction.
//!
//! Ingestion errors are recovered locally (the offending source is skipped
//! and logged); [`GraphError`] aborts a rebuild and leaves the previous graph
//! in place.

use thiserror::Error;

/// Text extraction failed for a binary document.
#[derive(Debug, Error)]
pub enum ExtractError {
    /// Neither extraction strategy could parse the document.
    #[error("PDF extraction failed: {0}")]
    Pdf(String),

    /// The document parsed but carried too little text to be useful.
    #[error("PDF yielded {found} non-whitespace characters (minimum {min})")]
    NoText { found: usize, min: usize },
}

/// A links payload could not be read as JSON or CSV records.
#[derive(Debug, Error)]
pub enum LinksError {
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid CSV: {0}")]
    Csv(#[from] csv::Error),

    /// Valid JSON, but neither an array nor an object.
    #[error("expected a JSON array or object, found {0}")]
    UnexpectedShape(&'static str),
}

/// Errors that abort a graph rebuild.
#[derive(Debug, Error)]
pub enum GraphError {
    /// The embedding backend failed or returned an error.
    #[error("embedding backend failed: {0:#}")]
    Embedding(anyhow::Error),

    /// The backend returned a different number of vectors than requested.
    #[error("embedding backend returned {got} vectors for {expected} inputs")]
    VectorCount { expected: usize, got: usize },

    /// A returned vector does not have the backend's declared dimension.
    #[error("embedding for node {node_id} has {got} dimensions, expected {expected}")]
    Dimension {
        node_id: String,
        expected: usize,
        got: usize,
    },
}

/// Result type alias for graph operations.
pub type Result<T> = std::result::Result<T, GraphError>;
