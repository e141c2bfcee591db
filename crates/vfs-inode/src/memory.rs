//! In-memory live nodes.
//!
//! A minimal live tree for embedding the resolution layer without a real
//! mount, and for tests. Nodes are immutable once built. Children can be
//! attached either loaded (as live nodes) or unloaded (as listing entries),
//! mirroring a mount where only part of a directory has been visited.
//! Unloaded subdirectories are fetched from a store on demand.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use futures::future::{self, FutureExt};
use tracing::debug;
use vfs_store::{BlobAuxData, EntryMode, FetchContext, ObjectStore, TreeAuxData};
use vfs_types::{Dtype, Hash20, Hash32, ObjectId, S_IFDIR};

use crate::error::{InodeError, InodeResult};
use crate::live::{ChildFuture, InodePtr, LiveFile, LiveTree};
use crate::stat::Stat;
use crate::virtual_inode::{UnloadedDirEntry, VirtualInode};

// ---------------------------------------------------------------------------
// Files
// ---------------------------------------------------------------------------

/// A live non-directory node holding its content in memory.
#[derive(Clone, Debug)]
pub struct InMemoryFile {
    content: Vec<u8>,
    st_mode: u32,
    object_id: Option<ObjectId>,
    mtime: SystemTime,
}

impl InMemoryFile {
    /// A file, executable or symlink. `mode` must not be
    /// [`EntryMode::Directory`]; use [`InMemoryTree`] for directories.
    pub fn new(content: Vec<u8>, mode: EntryMode) -> Self {
        Self::with_st_mode(content, mode.stat_mode())
    }

    /// A node with an arbitrary `st_mode`, such as a socket or fifo.
    pub fn with_st_mode(content: Vec<u8>, st_mode: u32) -> Self {
        Self {
            content,
            st_mode,
            object_id: None,
            mtime: UNIX_EPOCH,
        }
    }

    /// Mark the file as unmodified since checkout.
    pub fn with_object_id(mut self, id: ObjectId) -> Self {
        self.object_id = Some(id);
        self
    }

    /// Modification time reported by `stat`.
    pub fn with_mtime(mut self, mtime: SystemTime) -> Self {
        self.mtime = mtime;
        self
    }

    pub fn into_inode(self) -> InodePtr {
        InodePtr::File(Arc::new(self))
    }
}

#[async_trait]
impl LiveFile for InMemoryFile {
    fn dtype(&self) -> Dtype {
        Dtype::from_mode(self.st_mode)
    }

    fn object_id(&self) -> Option<ObjectId> {
        self.object_id
    }

    async fn stat(&self, _ctx: &FetchContext) -> InodeResult<Stat> {
        Ok(Stat {
            mode: self.st_mode,
            size: self.content.len() as u64,
            mtime: self.mtime,
        })
    }

    async fn sha1(&self, _ctx: &FetchContext) -> InodeResult<Hash20> {
        Ok(Hash20::sha1_of(&self.content))
    }

    async fn blake3(&self, _ctx: &FetchContext) -> InodeResult<Hash32> {
        Ok(Hash32::blake3_of(&self.content))
    }

    async fn blob_aux_data(
        &self,
        _ctx: &FetchContext,
        _blake3_required: bool,
    ) -> InodeResult<BlobAuxData> {
        Ok(BlobAuxData::compute(&self.content, true))
    }

    async fn read_all(&self, _ctx: &FetchContext) -> InodeResult<Vec<u8>> {
        Ok(self.content.clone())
    }
}

// ---------------------------------------------------------------------------
// Directories
// ---------------------------------------------------------------------------

#[derive(Clone, Debug)]
enum LiveChild {
    Loaded(InodePtr),
    Unloaded(UnloadedDirEntry),
    /// A subdirectory not yet loaded. Resolves to its store tree.
    UnloadedTree { id: ObjectId, mode: u32 },
}

/// A live directory node with a fixed set of children.
///
/// Unloaded subdirectories are fetched from the attached store when they
/// are resolved, so they surface as store trees rather than listing rows.
#[derive(Clone)]
pub struct InMemoryTree {
    object_id: Option<ObjectId>,
    aux: Option<TreeAuxData>,
    st_mode: u32,
    mtime: SystemTime,
    store: Option<Arc<dyn ObjectStore>>,
    children: BTreeMap<String, LiveChild>,
}

impl InMemoryTree {
    /// Start an empty directory with mode `0755` and no content id.
    pub fn builder() -> InMemoryTreeBuilder {
        InMemoryTreeBuilder {
            tree: Self {
                object_id: None,
                aux: None,
                st_mode: S_IFDIR | 0o755,
                mtime: UNIX_EPOCH,
                store: None,
                children: BTreeMap::new(),
            },
        }
    }

    pub fn len(&self) -> usize {
        self.children.len()
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    pub fn into_inode(self) -> InodePtr {
        InodePtr::Tree(Arc::new(self))
    }

    fn resolve(&self, name: &str, child: &LiveChild, ctx: &FetchContext) -> ChildFuture {
        match child {
            LiveChild::Loaded(inode) => {
                future::ready(Ok(VirtualInode::Inode(inode.clone()))).boxed()
            }
            LiveChild::Unloaded(entry) => {
                future::ready(Ok(VirtualInode::DirEntry(*entry))).boxed()
            }
            LiveChild::UnloadedTree { id, mode } => {
                let Some(store) = self.store.clone() else {
                    let err = InodeError::Live(format!("{name}: no store to load directory from"));
                    return future::ready(Err(err)).boxed();
                };
                let ctx = ctx.clone();
                let (id, mode) = (*id, *mode);
                let name = name.to_string();
                async move {
                    debug!(name = %name, id = %id.short_hex(), "loading unloaded directory");
                    let tree = store.get_tree(&id, &ctx).await?;
                    Ok::<_, InodeError>(VirtualInode::Tree { tree, mode })
                }
                .boxed()
            }
        }
    }
}

impl fmt::Debug for InMemoryTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InMemoryTree")
            .field("object_id", &self.object_id)
            .field("st_mode", &format_args!("{:o}", self.st_mode))
            .field("has_store", &self.store.is_some())
            .field("children", &self.children)
            .finish()
    }
}

/// Builder for [`InMemoryTree`].
#[derive(Debug)]
pub struct InMemoryTreeBuilder {
    tree: InMemoryTree,
}

impl InMemoryTreeBuilder {
    /// Mark the directory as matching a store tree.
    pub fn object_id(mut self, id: ObjectId) -> Self {
        self.tree.object_id = Some(id);
        self
    }

    /// Recursive digest of the directory, if it is content-addressed.
    pub fn tree_aux_data(mut self, aux: TreeAuxData) -> Self {
        self.tree.aux = Some(aux);
        self
    }

    /// Modification time reported by `stat`.
    pub fn mtime(mut self, mtime: SystemTime) -> Self {
        self.tree.mtime = mtime;
        self
    }

    /// Store that unloaded subdirectories are fetched from.
    pub fn store(mut self, store: Arc<dyn ObjectStore>) -> Self {
        self.tree.store = Some(store);
        self
    }

    /// Attach a child already loaded into the mount.
    pub fn loaded(mut self, name: impl Into<String>, inode: InodePtr) -> Self {
        self.tree.children.insert(name.into(), LiveChild::Loaded(inode));
        self
    }

    /// Attach a child known only from this directory's listing.
    ///
    /// Directory entries resolve through the store attached with
    /// [`store`](Self::store); everything else surfaces as-is.
    pub fn unloaded(mut self, name: impl Into<String>, entry: UnloadedDirEntry) -> Self {
        let child = match entry.dtype() {
            Dtype::Dir => LiveChild::UnloadedTree {
                id: entry.object_id(),
                mode: entry.initial_mode(),
            },
            _ => LiveChild::Unloaded(entry),
        };
        self.tree.children.insert(name.into(), child);
        self
    }

    pub fn build(self) -> InMemoryTree {
        self.tree
    }
}

#[async_trait]
impl LiveTree for InMemoryTree {
    fn object_id(&self) -> Option<ObjectId> {
        self.object_id
    }

    async fn stat(&self, _ctx: &FetchContext) -> InodeResult<Stat> {
        Ok(Stat {
            mode: self.st_mode,
            size: 0,
            mtime: self.mtime,
        })
    }

    async fn digest_hash(&self, _ctx: &FetchContext) -> InodeResult<Option<Hash32>> {
        Ok(self.aux.map(|aux| aux.digest_hash))
    }

    async fn tree_aux_data(&self, _ctx: &FetchContext) -> InodeResult<Option<TreeAuxData>> {
        Ok(self.aux)
    }

    fn children(&self, ctx: &FetchContext) -> InodeResult<Vec<(String, ChildFuture)>> {
        Ok(self
            .children
            .iter()
            .map(|(name, child)| (name.clone(), self.resolve(name, child, ctx)))
            .collect())
    }

    async fn get_or_find_child(
        &self,
        name: &str,
        path: &str,
        ctx: &FetchContext,
    ) -> InodeResult<VirtualInode> {
        match self.children.get(name) {
            Some(child) => self.resolve(name, child, ctx).await,
            None => {
                debug!(path, name, "live child not found");
                Err(InodeError::not_found(path, name))
            }
        }
    }
}
