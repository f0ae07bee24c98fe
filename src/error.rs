use thiserror::Error;

/// Error taxonomy for the core pipeline.
///
/// External-service failures stay distinguishable from each other
/// ([`Error::Embedding`] vs [`Error::Generation`]) and from storage and
/// lookup failures. Empty outcomes (zero chunks, zero retrieved entries,
/// zero sessions) are not errors anywhere in this crate.
#[derive(Debug, Error)]
pub enum Error {
    /// Malformed input, e.g. an unsupported content type.
    #[error("invalid input: {0}")]
    Validation(String),

    /// Document text extraction failed.
    #[error("text extraction failed: {0}")]
    Extraction(String),

    /// Embedding service transport, auth, or response failure.
    #[error("embedding service error: {0}")]
    Embedding(String),

    /// Answer-generation service transport, auth, or response failure.
    #[error("generation service error: {0}")]
    Generation(String),

    /// Relational store or vector index failure.
    #[error("storage error: {0}")]
    Db(#[from] sqlx::Error),

    /// The session or document does not exist for this caller.
    #[error("not found: {0}")]
    NotFound(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
