//! Resolution layer for the checkout filesystem.
//!
//! A path in a mounted checkout can be backed by four structurally different
//! things: a live node attached to the mount, an entry known only from its
//! parent's listing, a directory snapshot fetched from the content store, or
//! one row of such a snapshot. [`VirtualInode`] wraps exactly one of them
//! and answers stat, hash, listing and read queries identically no matter
//! which one is behind it, fetching from the [`ObjectStore`] only when the
//! answer is not already at hand.
//!
//! # Operations
//!
//! - Classification: [`VirtualInode::dtype`], [`VirtualInode::object_id`],
//!   [`filtered_dtype`]
//! - Hashes: [`VirtualInode::sha1`], [`VirtualInode::blake3`],
//!   [`VirtualInode::digest_hash`]
//! - Attributes: [`VirtualInode::entry_type`],
//!   [`VirtualInode::get_entry_attributes`]
//! - Stat: [`VirtualInode::stat`]
//! - Navigation: [`VirtualInode::children`],
//!   [`VirtualInode::get_or_find_child`], [`VirtualInode::children_attributes`]
//! - Content: [`VirtualInode::read_content`]
//!
//! Nothing here mutates the mount or the store, and nothing is retried.
//! Multi-attribute queries report failures per attribute.
//!
//! [`ObjectStore`]: vfs_store::ObjectStore

pub mod attributes;
pub mod classify;
pub mod content;
pub mod error;
pub mod hashes;
pub mod live;
pub mod memory;
pub mod navigate;
pub mod stat;
pub mod virtual_inode;

#[cfg(test)]
mod test_util;

pub use attributes::{AttributeResult, EntryAttributeFlags, EntryAttributes};
pub use classify::{filtered_dtype, filtered_entry_type};
pub use error::{InodeError, InodeResult};
pub use live::{ChildFuture, InodePtr, LiveFile, LiveTree};
pub use memory::{InMemoryFile, InMemoryTree, InMemoryTreeBuilder};
pub use navigate::{join_path, ChildAttributes};
pub use stat::Stat;
pub use virtual_inode::{ContainedType, UnloadedDirEntry, VirtualInode};

pub use vfs_store::{FetchCause, FetchContext};
