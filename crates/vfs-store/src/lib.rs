//! Content-store collaborator for the checkout filesystem.
//!
//! The resolution layer never owns blob or tree content; it asks an
//! [`ObjectStore`] for it by [`ObjectId`](vfs_types::ObjectId). This crate
//! defines that interface together with the immutable object model the
//! store hands back.
//!
//! # Object Types
//!
//! - [`Blob`]: file contents
//! - [`Tree`]: immutable directory snapshot, an ordered map of name to [`TreeEntry`]
//! - [`BlobAuxData`] / [`TreeAuxData`]: derived size/hash data, computed by the store
//!
//! # Backends
//!
//! - [`InMemoryObjectStore`]: `HashMap`-backed store for tests and embedding.
//!   Counts fetches and can be told to fail specific ids.
//!
//! # Rules
//!
//! 1. Objects are immutable once inserted.
//! 2. Fetches never mutate the store's visible content.
//! 3. Retry, caching and eviction are the store's business; callers never retry.

pub mod config;
pub mod context;
pub mod error;
pub mod memory;
pub mod object;
pub mod traits;

pub use config::StoreConfig;
pub use context::{FetchCause, FetchContext};
pub use error::{StoreError, StoreResult};
pub use memory::{FetchCounts, InMemoryObjectStore};
pub use object::{Blob, BlobAuxData, EntryMode, ObjectKind, Tree, TreeAuxData, TreeEntry};
pub use traits::ObjectStore;
