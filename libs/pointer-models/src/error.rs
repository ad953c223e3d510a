//! Error types for the pointer model

use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// Model errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("malformed document pointer id: {0:?}")]
    MalformedIdentifier(String),
}
