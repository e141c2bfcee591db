//! Directory navigation over every representation.

use std::sync::Arc;

use futures::future::{self, join_all, FutureExt};
use tracing::debug;
use vfs_store::{FetchContext, ObjectStore, TreeEntry};

use crate::attributes::{EntryAttributeFlags, EntryAttributes};
use crate::error::{InodeError, InodeResult};
use crate::live::{ChildFuture, InodePtr};
use crate::virtual_inode::VirtualInode;

/// One child's name and its attributes, or the error that kept the child
/// from resolving.
pub type ChildAttributes = (String, InodeResult<EntryAttributes>);

/// Path of `name` inside `parent`. The root is the empty path.
pub fn join_path(parent: &str, name: &str) -> String {
    if parent.is_empty() {
        name.to_string()
    } else {
        format!("{parent}/{name}")
    }
}

/// Resolve a row of a store tree. Subdirectories become a deferred tree
/// fetch; files resolve immediately.
fn store_child(
    entry: &TreeEntry,
    path: String,
    store: &Arc<dyn ObjectStore>,
    ctx: &FetchContext,
) -> ChildFuture {
    if !entry.is_tree() {
        return future::ready(Ok(VirtualInode::TreeEntry(entry.clone()))).boxed();
    }

    let store = Arc::clone(store);
    let ctx = ctx.clone();
    let id = entry.object_id;
    let mode = entry.mode.stat_mode();
    async move {
        debug!(path = %path, id = %id.short_hex(), "fetching child tree");
        let tree = store.get_tree(&id, &ctx).await?;
        Ok::<_, InodeError>(VirtualInode::Tree { tree, mode })
    }
    .boxed()
}

impl VirtualInode {
    /// Enumerate a directory's children in name order.
    ///
    /// Children that need a fetch come back as deferred computations; no
    /// fetch happens until the caller drives them. Only live directories
    /// and directory snapshots can be enumerated.
    pub fn children(
        &self,
        path: &str,
        store: &Arc<dyn ObjectStore>,
        ctx: &FetchContext,
    ) -> InodeResult<Vec<(String, ChildFuture)>> {
        if !self.is_directory() {
            return Err(InodeError::not_a_directory(path));
        }

        match self {
            Self::Inode(InodePtr::Tree(tree)) => tree.children(ctx),
            Self::Tree { tree, .. } => Ok(tree
                .iter()
                .map(|(name, entry)| {
                    let child = store_child(entry, join_path(path, name), store, ctx);
                    (name.to_string(), child)
                })
                .collect()),
            Self::Inode(InodePtr::File(_)) | Self::DirEntry(_) | Self::TreeEntry(_) => {
                Err(InodeError::not_a_directory(path))
            }
        }
    }

    /// Resolve a single child by name.
    pub async fn get_or_find_child(
        &self,
        name: &str,
        path: &str,
        store: &dyn ObjectStore,
        ctx: &FetchContext,
    ) -> InodeResult<VirtualInode> {
        if !self.is_directory() {
            return Err(InodeError::not_a_directory(path));
        }

        match self {
            Self::Inode(InodePtr::Tree(tree)) => tree.get_or_find_child(name, path, ctx).await,
            Self::Tree { tree, .. } => match tree.get(name) {
                None => {
                    debug!(path, name, "child not found in tree");
                    Err(InodeError::not_found(path, name))
                }
                Some(entry) if entry.is_tree() => {
                    let subtree = store.get_tree(&entry.object_id, ctx).await?;
                    Ok(Self::Tree {
                        tree: subtree,
                        mode: entry.mode.stat_mode(),
                    })
                }
                Some(entry) => Ok(Self::TreeEntry(entry.clone())),
            },
            Self::Inode(InodePtr::File(_)) | Self::DirEntry(_) | Self::TreeEntry(_) => {
                Err(InodeError::not_a_directory(path))
            }
        }
    }

    /// Attributes of every child, resolved concurrently.
    ///
    /// Results keep the listing's name order. A child whose own resolution
    /// fails gets an error entry; the other children are unaffected.
    pub async fn children_attributes(
        &self,
        requested: EntryAttributeFlags,
        path: &str,
        store: &Arc<dyn ObjectStore>,
        ctx: &FetchContext,
    ) -> InodeResult<Vec<ChildAttributes>> {
        let children = self.children(path, store, ctx)?;

        let (names, lookups): (Vec<_>, Vec<_>) = children
            .into_iter()
            .map(|(name, child)| {
                let child_path = join_path(path, &name);
                let lookup = async move {
                    let child = child.await?;
                    Ok::<_, InodeError>(
                        child
                            .get_entry_attributes(requested, &child_path, store.as_ref(), ctx)
                            .await,
                    )
                };
                (name, lookup)
            })
            .unzip();

        let results = join_all(lookups).await;
        Ok(names.into_iter().zip(results).collect())
    }
}
