//! Common error types for katha

use thiserror::Error;

/// Common result type for katha operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types shared across katha crates
#[derive(Error, Debug)]
pub enum Error {
    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Document definition could not be parsed
    #[error("Document parse error: {0}")]
    Parse(String),

    /// Document definition violates a structural rule
    #[error("Invalid document: {0}")]
    InvalidDocument(String),

    /// Requested resource not found
    #[error("Not found: {0}")]
    NotFound(String),
}
