//! Error types for the resolution layer.

use thiserror::Error;
use vfs_store::StoreError;

const ENOENT: i32 = 2;
const ENOTDIR: i32 = 20;
const EISDIR: i32 = 21;
const EINVAL: i32 = 22;

/// Errors produced while resolving an entry.
///
/// Wrong-kind and not-a-directory errors are decided locally and never
/// retried. Store and live-node failures are carried through untouched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InodeError {
    /// A file-only operation hit a directory.
    #[error("{path}: Is a directory")]
    IsADirectory { path: String },

    /// A file-only operation hit a symlink.
    #[error("{path}: file is a symlink")]
    IsASymlink { path: String },

    /// The entry is a socket, fifo, device or other kind source control
    /// cannot represent. `dtype` is the raw `d_type`.
    #[error("{path}: file is a non-source-control type: {dtype}")]
    UnsupportedType { path: String, dtype: u8 },

    /// Tried to descend into something that is not a directory.
    #[error("{path}: Not a directory")]
    NotADirectory { path: String },

    /// The directory has no child with this name.
    #[error("{path}: no such entry: {name}")]
    NotFound { path: String, name: String },

    /// A live directory has no content-addressed digest (it was created or
    /// modified locally).
    #[error("digest hash missing for directory: {path}")]
    DigestHashMissing { path: String },

    /// A live directory has no content-addressed aux data.
    #[error("tree aux data missing for directory: {path}")]
    TreeAuxDataMissing { path: String },

    /// The blob aux data came back without a BLAKE3.
    #[error("{path}: no blake3 available")]
    NoBlake3 { path: String },

    /// The content store failed.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// A live node failed.
    #[error("live node error: {0}")]
    Live(String),
}

impl InodeError {
    pub fn is_a_directory(path: &str) -> Self {
        Self::IsADirectory { path: path.to_string() }
    }

    pub fn is_a_symlink(path: &str) -> Self {
        Self::IsASymlink { path: path.to_string() }
    }

    pub fn unsupported_type(path: &str, dtype: u8) -> Self {
        Self::UnsupportedType {
            path: path.to_string(),
            dtype,
        }
    }

    pub fn not_a_directory(path: &str) -> Self {
        Self::NotADirectory { path: path.to_string() }
    }

    pub fn not_found(path: &str, name: &str) -> Self {
        Self::NotFound {
            path: path.to_string(),
            name: name.to_string(),
        }
    }

    /// The POSIX error number a filesystem or RPC surface reports for this
    /// error, or `None` for upstream failures that carry their own meaning.
    pub fn errno(&self) -> Option<i32> {
        match self {
            Self::IsADirectory { .. } => Some(EISDIR),
            Self::IsASymlink { .. }
            | Self::UnsupportedType { .. }
            | Self::DigestHashMissing { .. }
            | Self::TreeAuxDataMissing { .. } => Some(EINVAL),
            Self::NotADirectory { .. } => Some(ENOTDIR),
            Self::NotFound { .. } => Some(ENOENT),
            Self::NoBlake3 { .. } | Self::Store(_) | Self::Live(_) => None,
        }
    }
}

/// Result alias for resolution operations.
pub type InodeResult<T> = Result<T, InodeError>;
