use vfs_types::ObjectId;

use crate::object::ObjectKind;

/// Errors from content-store operations.
///
/// `Clone` because a single failed fetch may be reported in several
/// attribute slots at once.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// The requested object is not in the store.
    #[error("object not found: {0}")]
    NotFound(ObjectId),

    /// The id names an object of a different kind.
    #[error("object {id} is a {actual}, expected a {expected}")]
    KindMismatch {
        id: ObjectId,
        expected: ObjectKind,
        actual: ObjectKind,
    },

    /// Aux data was requested with BLAKE3 forced but the store has none.
    #[error("no blake3 available for blob {0}")]
    MissingBlake3(ObjectId),

    /// The backing transport could not serve the fetch.
    #[error("fetch of {id} failed: {reason}")]
    Unavailable { id: ObjectId, reason: String },

    /// The store configuration could not be parsed.
    #[error("configuration error: {0}")]
    Config(String),
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
