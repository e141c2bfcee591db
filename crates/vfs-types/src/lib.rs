//! Foundation types for the checkout filesystem.
//!
//! Every other crate in the workspace depends on `vfs-types`. Nothing here
//! performs I/O.
//!
//! # Key Types
//!
//! - [`ObjectId`]: content-addressed identifier for a blob or tree in the store
//! - [`Hash20`] / [`Hash32`]: SHA1 and BLAKE3 digests of file content
//! - [`ContentHasher`]: domain-separated hashing used to derive object ids
//! - [`Dtype`]: dirent-style kind of a filesystem entry
//! - [`Platform`]: which platform semantics stat and entry typing follow

pub mod dtype;
pub mod error;
pub mod hash;
pub mod object;

pub use dtype::{
    Dtype, Platform, S_IFBLK, S_IFCHR, S_IFDIR, S_IFIFO, S_IFLNK, S_IFMT, S_IFREG, S_IFSOCK,
};
pub use error::TypeError;
pub use hash::{ContentHasher, Hash20, Hash32};
pub use object::ObjectId;
