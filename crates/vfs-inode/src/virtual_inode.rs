//! The four-way entry value and its classification queries.

use std::sync::Arc;

use vfs_store::{Tree, TreeEntry};
use vfs_types::{Dtype, ObjectId};

use crate::classify::filtered_dtype;
use crate::live::InodePtr;

/// A directory entry known only from its parent's listing: it has not been
/// loaded into the mount.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct UnloadedDirEntry {
    object_id: ObjectId,
    initial_mode: u32,
}

impl UnloadedDirEntry {
    /// Record an entry from its parent's listing.
    pub fn new(object_id: ObjectId, initial_mode: u32) -> Self {
        Self {
            object_id,
            initial_mode,
        }
    }

    /// Content id of the entry.
    pub fn object_id(&self) -> ObjectId {
        self.object_id
    }

    /// The `st_mode` recorded when the parent listed this entry.
    pub fn initial_mode(&self) -> u32 {
        self.initial_mode
    }

    pub fn dtype(&self) -> Dtype {
        Dtype::from_mode(self.initial_mode)
    }
}

/// Which representation a [`VirtualInode`] holds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ContainedType {
    Inode,
    DirEntry,
    Tree,
    TreeEntry,
}

/// One entry of the checkout, whichever way it happens to be known.
///
/// Exactly one representation is held at a time and the value never
/// changes after construction. Cloning is cheap: live nodes and trees are
/// shared.
#[derive(Clone, Debug)]
pub enum VirtualInode {
    /// A node loaded into the live mounted tree.
    Inode(InodePtr),
    /// An entry not loaded into the mount.
    DirEntry(UnloadedDirEntry),
    /// A directory snapshot from the store, with the mode it is presented
    /// under.
    Tree { tree: Arc<Tree>, mode: u32 },
    /// One row of a store directory snapshot.
    TreeEntry(TreeEntry),
}

impl VirtualInode {
    /// The entry's kind, without symlink filtering.
    pub fn dtype(&self) -> Dtype {
        match self {
            Self::Inode(inode) => inode.dtype(),
            Self::DirEntry(entry) => entry.dtype(),
            Self::Tree { .. } => Dtype::Dir,
            Self::TreeEntry(entry) => entry.dtype(),
        }
    }

    /// The entry's kind as the mount presents it.
    pub fn filtered_dtype(&self, symlinks_enabled: bool) -> Dtype {
        filtered_dtype(self.dtype(), symlinks_enabled)
    }

    /// Whether the entry is a directory. Symlink filtering never changes this.
    pub fn is_directory(&self) -> bool {
        self.dtype() == Dtype::Dir
    }

    /// Content id, or `None` for live nodes modified since checkout.
    pub fn object_id(&self) -> Option<ObjectId> {
        match self {
            Self::Inode(inode) => inode.object_id(),
            Self::DirEntry(entry) => Some(entry.object_id()),
            Self::Tree { tree, .. } => Some(tree.id()),
            Self::TreeEntry(entry) => Some(entry.object_id),
        }
    }

    pub fn contained_type(&self) -> ContainedType {
        match self {
            Self::Inode(_) => ContainedType::Inode,
            Self::DirEntry(_) => ContainedType::DirEntry,
            Self::Tree { .. } => ContainedType::Tree,
            Self::TreeEntry(_) => ContainedType::TreeEntry,
        }
    }

    /// The live node, if one is held.
    pub fn as_inode(&self) -> Option<&InodePtr> {
        match self {
            Self::Inode(inode) => Some(inode),
            Self::DirEntry(_) | Self::Tree { .. } | Self::TreeEntry(_) => None,
        }
    }
}

impl From<InodePtr> for VirtualInode {
    fn from(inode: InodePtr) -> Self {
        Self::Inode(inode)
    }
}

impl From<UnloadedDirEntry> for VirtualInode {
    fn from(entry: UnloadedDirEntry) -> Self {
        Self::DirEntry(entry)
    }
}

impl From<TreeEntry> for VirtualInode {
    fn from(entry: TreeEntry) -> Self {
        Self::TreeEntry(entry)
    }
}
