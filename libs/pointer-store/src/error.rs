//! Error types for the storage engine

use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// Storage engine errors
///
/// Absence of a record is never an error: lookups return `Ok(None)`. Every
/// other failure mode is typed here, and backing-store exception types never
/// escape this crate.
#[derive(Error, Debug)]
pub enum Error {
    /// Creation collided with an existing primary key. Never retried here.
    #[error("duplicate document pointer: {0}")]
    Duplicate(String),

    /// A supersede batch exceeds the store's transaction ceiling. The caller
    /// must split the work; the engine never truncates silently.
    #[error("too many items for one transaction: {count} exceeds the limit of {limit}")]
    TooManyItems { count: usize, limit: usize },

    /// Stored data is missing or mistypes an attribute the engine requires.
    /// Always fatal, never coerced to a default.
    #[error("corrupt document pointer record: {0}")]
    CorruptRecord(String),

    /// More than one item was found for a single primary key. Structurally
    /// impossible unless the backing data is corrupt.
    #[error("multiple items found for key: {0}")]
    MultipleItems(String),

    #[error(transparent)]
    MalformedIdentifier(#[from] signpost_models::Error),

    /// A continuation token could not be decoded.
    #[error("unable to decode the next page token")]
    InvalidContinuationToken,

    /// A conditional write was rejected in a context where that is an
    /// internal error rather than an expected conflict.
    #[error("precondition failed: {0}")]
    PreconditionFailed(String),

    /// Transport, throttling or timeout failure from the backing store.
    /// Propagated as-is; retry policy is the caller's concern.
    #[error("backing store error: {message}")]
    BackingStore {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
    },
}

impl Error {
    /// Wrap a backing-store failure, preserving it as the error source.
    pub fn backing_store<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Error::BackingStore {
            message: err.to_string(),
            source: Some(Box::new(err)),
        }
    }
}
