use thiserror::Error;

/// Core error type shared across dbtseed crates.
#[derive(Debug, Error)]
pub enum Error {
    /// The schema violates internal invariants.
    #[error("invalid schema: {0}")]
    InvalidSchema(String),
    /// The schema document could not be decoded.
    #[error("failed to parse schema: {0}")]
    Parse(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience alias for results returned by dbtseed crates.
pub type Result<T> = std::result::Result<T, Error>;
