//! Interface to nodes of the live mounted tree.
//!
//! The mount owns these nodes and their load, unload and materialization
//! state. The resolution layer only holds reference-counted handles and
//! calls the operations below.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use futures::future::BoxFuture;
use vfs_store::{BlobAuxData, FetchContext, TreeAuxData};
use vfs_types::{Dtype, Hash20, Hash32, ObjectId};

use crate::error::InodeResult;
use crate::stat::Stat;
use crate::virtual_inode::VirtualInode;

/// A child that may still need a fetch before it can be inspected.
pub type ChildFuture = BoxFuture<'static, InodeResult<VirtualInode>>;

/// A live file, symlink or other non-directory node.
#[async_trait]
pub trait LiveFile: Send + Sync {
    /// The node's own kind. Never [`Dtype::Dir`].
    fn dtype(&self) -> Dtype;

    /// Content id of the file, if it has not been modified locally.
    fn object_id(&self) -> Option<ObjectId>;

    async fn stat(&self, ctx: &FetchContext) -> InodeResult<Stat>;

    async fn sha1(&self, ctx: &FetchContext) -> InodeResult<Hash20>;

    async fn blake3(&self, ctx: &FetchContext) -> InodeResult<Hash32>;

    async fn blob_aux_data(
        &self,
        ctx: &FetchContext,
        blake3_required: bool,
    ) -> InodeResult<BlobAuxData>;

    /// Full content of the file.
    async fn read_all(&self, ctx: &FetchContext) -> InodeResult<Vec<u8>>;
}

/// A live directory node.
#[async_trait]
pub trait LiveTree: Send + Sync {
    /// Content id of the directory, if it still matches a store tree.
    fn object_id(&self) -> Option<ObjectId>;

    async fn stat(&self, ctx: &FetchContext) -> InodeResult<Stat>;

    /// Recursive digest, or `None` if the directory has no
    /// content-addressed identity.
    async fn digest_hash(&self, ctx: &FetchContext) -> InodeResult<Option<Hash32>>;

    async fn tree_aux_data(&self, ctx: &FetchContext) -> InodeResult<Option<TreeAuxData>>;

    /// Enumerate children without loading them into the mount.
    fn children(&self, ctx: &FetchContext) -> InodeResult<Vec<(String, ChildFuture)>>;

    /// Resolve one child. `path` is this directory's path, for errors.
    async fn get_or_find_child(
        &self,
        name: &str,
        path: &str,
        ctx: &FetchContext,
    ) -> InodeResult<VirtualInode>;
}

/// Shared handle to a live node.
#[derive(Clone)]
pub enum InodePtr {
    File(Arc<dyn LiveFile>),
    Tree(Arc<dyn LiveTree>),
}

impl InodePtr {
    /// Kind of the node. Directories are always [`Dtype::Dir`].
    pub fn dtype(&self) -> Dtype {
        match self {
            Self::File(file) => file.dtype(),
            Self::Tree(_) => Dtype::Dir,
        }
    }

    /// Content id, if the node is unmodified since checkout.
    pub fn object_id(&self) -> Option<ObjectId> {
        match self {
            Self::File(file) => file.object_id(),
            Self::Tree(tree) => tree.object_id(),
        }
    }

    pub async fn stat(&self, ctx: &FetchContext) -> InodeResult<Stat> {
        match self {
            Self::File(file) => file.stat(ctx).await,
            Self::Tree(tree) => tree.stat(ctx).await,
        }
    }
}

impl fmt::Debug for InodePtr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self {
            Self::File(_) => "file",
            Self::Tree(_) => "tree",
        };
        f.debug_struct("InodePtr")
            .field("kind", &kind)
            .field("dtype", &self.dtype())
            .field("object_id", &self.object_id())
            .finish()
    }
}

impl From<Arc<dyn LiveFile>> for InodePtr {
    fn from(file: Arc<dyn LiveFile>) -> Self {
        Self::File(file)
    }
}

impl From<Arc<dyn LiveTree>> for InodePtr {
    fn from(tree: Arc<dyn LiveTree>) -> Self {
        Self::Tree(tree)
    }
}
