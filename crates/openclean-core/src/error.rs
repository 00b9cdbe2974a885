use thiserror::Error;

/// Canonical result for core.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// Unknown column names, ids, or out-of-range positions.
    #[error("Schema error: {0}")]
    Schema(String),

    #[error("Internal invariant failed: {0}")]
    Invariant(String),
}
