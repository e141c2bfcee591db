//! Content hash resolution.
//!
//! Each resolver first checks the filtered kind, so a wrong-kind request
//! fails without touching the store. Answers already at hand (a live
//! node, hashes cached on a tree row) are preferred over a fetch.

use vfs_store::{BlobAuxData, FetchContext, ObjectStore, TreeAuxData};
use vfs_types::{Dtype, Hash20, Hash32};

use crate::error::{InodeError, InodeResult};
use crate::live::InodePtr;
use crate::virtual_inode::VirtualInode;

impl VirtualInode {
    /// Fail unless the entry presents as a regular file.
    fn ensure_regular_file(&self, path: &str, symlinks_enabled: bool) -> InodeResult<()> {
        match self.filtered_dtype(symlinks_enabled) {
            Dtype::Regular => Ok(()),
            Dtype::Dir => Err(InodeError::is_a_directory(path)),
            Dtype::Symlink => Err(InodeError::is_a_symlink(path)),
            other => Err(InodeError::unsupported_type(path, other.as_raw())),
        }
    }

    /// SHA1 of a regular file's content. Symlinks are refused even though
    /// their target text has a hash.
    pub async fn sha1(
        &self,
        path: &str,
        store: &dyn ObjectStore,
        ctx: &FetchContext,
    ) -> InodeResult<Hash20> {
        self.ensure_regular_file(path, store.symlinks_enabled())?;

        match self {
            Self::Inode(InodePtr::File(file)) => file.sha1(ctx).await,
            Self::Inode(InodePtr::Tree(_)) | Self::Tree { .. } => {
                Err(InodeError::is_a_directory(path))
            }
            Self::DirEntry(entry) => Ok(store.get_blob_sha1(&entry.object_id(), ctx).await?),
            Self::TreeEntry(entry) => match entry.sha1 {
                Some(sha1) => Ok(sha1),
                None => Ok(store.get_blob_sha1(&entry.object_id, ctx).await?),
            },
        }
    }

    /// BLAKE3 of a regular file's content.
    pub async fn blake3(
        &self,
        path: &str,
        store: &dyn ObjectStore,
        ctx: &FetchContext,
    ) -> InodeResult<Hash32> {
        self.ensure_regular_file(path, store.symlinks_enabled())?;

        match self {
            Self::Inode(InodePtr::File(file)) => file.blake3(ctx).await,
            Self::Inode(InodePtr::Tree(_)) | Self::Tree { .. } => {
                Err(InodeError::is_a_directory(path))
            }
            Self::DirEntry(entry) => Ok(store.get_blob_blake3(&entry.object_id(), ctx).await?),
            Self::TreeEntry(entry) => match entry.blake3 {
                Some(blake3) => Ok(blake3),
                None => Ok(store.get_blob_blake3(&entry.object_id, ctx).await?),
            },
        }
    }

    /// Digest hash: BLAKE3 for a regular file, the recursive tree digest
    /// for a directory.
    pub async fn digest_hash(
        &self,
        path: &str,
        store: &dyn ObjectStore,
        ctx: &FetchContext,
    ) -> InodeResult<Hash32> {
        match self.filtered_dtype(store.symlinks_enabled()) {
            Dtype::Dir => {}
            Dtype::Regular => return self.blake3(path, store, ctx).await,
            Dtype::Symlink => return Err(InodeError::is_a_symlink(path)),
            other => return Err(InodeError::unsupported_type(path, other.as_raw())),
        }

        match self {
            Self::Inode(InodePtr::Tree(tree)) => {
                tree.digest_hash(ctx)
                    .await?
                    .ok_or_else(|| InodeError::DigestHashMissing {
                        path: path.to_string(),
                    })
            }
            Self::Inode(InodePtr::File(_)) => Err(InodeError::not_a_directory(path)),
            Self::DirEntry(entry) => Ok(store.get_tree_digest_hash(&entry.object_id(), ctx).await?),
            Self::Tree { tree, .. } => Ok(store.get_tree_digest_hash(&tree.id(), ctx).await?),
            Self::TreeEntry(entry) => Ok(store.get_tree_digest_hash(&entry.object_id, ctx).await?),
        }
    }

    /// Size and hashes of a file in one request. No kind filtering beyond
    /// refusing directory snapshots.
    pub async fn blob_aux_data(
        &self,
        path: &str,
        store: &dyn ObjectStore,
        ctx: &FetchContext,
        blake3_required: bool,
    ) -> InodeResult<BlobAuxData> {
        match self {
            Self::Inode(InodePtr::File(file)) => file.blob_aux_data(ctx, blake3_required).await,
            Self::Inode(InodePtr::Tree(_)) | Self::Tree { .. } => {
                Err(InodeError::is_a_directory(path))
            }
            Self::DirEntry(entry) => Ok(store
                .get_blob_aux_data(&entry.object_id(), ctx, blake3_required)
                .await?),
            Self::TreeEntry(entry) => Ok(store
                .get_blob_aux_data(&entry.object_id, ctx, blake3_required)
                .await?),
        }
    }

    /// Recursive digest and size of a directory in one request.
    pub async fn tree_aux_data(
        &self,
        path: &str,
        store: &dyn ObjectStore,
        ctx: &FetchContext,
    ) -> InodeResult<TreeAuxData> {
        match self {
            Self::Inode(InodePtr::Tree(tree)) => {
                tree.tree_aux_data(ctx)
                    .await?
                    .ok_or_else(|| InodeError::TreeAuxDataMissing {
                        path: path.to_string(),
                    })
            }
            Self::Inode(InodePtr::File(_)) => Err(InodeError::not_a_directory(path)),
            Self::Tree { tree, .. } => Ok(store.get_tree_aux_data(&tree.id(), ctx).await?),
            Self::DirEntry(entry) => Ok(store.get_tree_aux_data(&entry.object_id(), ctx).await?),
            Self::TreeEntry(entry) => Ok(store.get_tree_aux_data(&entry.object_id, ctx).await?),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::memory::{InMemoryFile, InMemoryTree};
    use crate::test_util::posix_store;
    use crate::virtual_inode::UnloadedDirEntry;
    use vfs_store::{EntryMode, StoreError, Tree, TreeEntry};
    use vfs_types::{S_IFDIR, S_IFIFO, S_IFLNK, S_IFREG};

    #[tokio::test]
    async fn cached_sha1_skips_the_store() {
        let store = posix_store(true);
        let id = store.put_blob("cached");
        let entry = TreeEntry::file_with_hashes(id, EntryMode::Regular, b"cached");
        let inode = VirtualInode::TreeEntry(entry);
        let ctx = FetchContext::null();

        assert_eq!(
            inode.sha1("f", store.as_ref(), &ctx).await.unwrap(),
            Hash20::sha1_of(b"cached")
        );
        assert_eq!(
            inode.blake3("f", store.as_ref(), &ctx).await.unwrap(),
            Hash32::blake3_of(b"cached")
        );
        assert_eq!(store.fetch_counts().total(), 0);
    }

    #[tokio::test]
    async fn uncached_sha1_fetches() {
        let store = posix_store(true);
        let id = store.put_blob("abc");
        let ctx = FetchContext::null();

        let row = VirtualInode::TreeEntry(TreeEntry::new(id, EntryMode::Regular));
        assert_eq!(
            row.sha1("f", store.as_ref(), &ctx).await.unwrap(),
            Hash20::sha1_of(b"abc")
        );
        let unloaded = VirtualInode::DirEntry(UnloadedDirEntry::new(id, S_IFREG | 0o644));
        assert_eq!(
            unloaded.blake3("f", store.as_ref(), &ctx).await.unwrap(),
            Hash32::blake3_of(b"abc")
        );
        assert_eq!(store.fetch_counts().blob_aux, 2);
    }

    #[tokio::test]
    async fn live_file_answers_itself() {
        let store = posix_store(true);
        let ctx = FetchContext::null();
        let inode = VirtualInode::Inode(
            InMemoryFile::new(b"local edit".to_vec(), EntryMode::Regular).into_inode(),
        );

        assert_eq!(
            inode.sha1("f", store.as_ref(), &ctx).await.unwrap(),
            Hash20::sha1_of(b"local edit")
        );
        assert_eq!(
            inode.digest_hash("f", store.as_ref(), &ctx).await.unwrap(),
            Hash32::blake3_of(b"local edit")
        );
        assert_eq!(store.fetch_counts().total(), 0);
    }

    #[tokio::test]
    async fn wrong_kinds_fail_without_fetching() {
        let store = posix_store(true);
        let ctx = FetchContext::null();
        let id = store.put_blob("x");

        let dir = VirtualInode::Tree {
            tree: Arc::new(Tree::empty()),
            mode: S_IFDIR | 0o755,
        };
        assert_eq!(
            dir.sha1("d", store.as_ref(), &ctx).await.unwrap_err(),
            InodeError::is_a_directory("d")
        );
        assert_eq!(
            dir.blob_aux_data("d", store.as_ref(), &ctx, false).await.unwrap_err(),
            InodeError::is_a_directory("d")
        );

        let link = VirtualInode::DirEntry(UnloadedDirEntry::new(id, S_IFLNK | 0o777));
        assert_eq!(
            link.blake3("l", store.as_ref(), &ctx).await.unwrap_err(),
            InodeError::is_a_symlink("l")
        );
        assert_eq!(
            link.digest_hash("l", store.as_ref(), &ctx).await.unwrap_err(),
            InodeError::is_a_symlink("l")
        );

        let fifo = VirtualInode::DirEntry(UnloadedDirEntry::new(id, S_IFIFO | 0o600));
        assert_eq!(
            fifo.sha1("p", store.as_ref(), &ctx).await.unwrap_err(),
            InodeError::unsupported_type("p", Dtype::Fifo.as_raw())
        );

        assert_eq!(store.fetch_counts().total(), 0);
    }

    #[tokio::test]
    async fn symlink_hashes_as_file_when_disabled() {
        let store = posix_store(false);
        let id = store.put_blob("target");
        let link = VirtualInode::TreeEntry(TreeEntry::new(id, EntryMode::Symlink));

        assert_eq!(
            link.sha1("l", store.as_ref(), &FetchContext::null())
                .await
                .unwrap(),
            Hash20::sha1_of(b"target")
        );
    }

    #[tokio::test]
    async fn tree_digest_comes_from_store() {
        let store = posix_store(true);
        let blob = store.put_blob("hello");
        let tree = Tree::new([("a", TreeEntry::new(blob, EntryMode::Regular))]);
        let id = store.put_tree(tree.clone());
        let ctx = FetchContext::null();

        let expected = store.get_tree_aux_data(&id, &ctx).await.unwrap();
        store.reset_fetch_counts();

        let inode = VirtualInode::Tree {
            tree: Arc::new(tree),
            mode: S_IFDIR | 0o755,
        };
        assert_eq!(
            inode.digest_hash("d", store.as_ref(), &ctx).await.unwrap(),
            expected.digest_hash
        );
        assert_eq!(
            inode.tree_aux_data("d", store.as_ref(), &ctx).await.unwrap(),
            expected
        );
        assert_eq!(store.fetch_counts().tree_aux, 2);
    }

    #[tokio::test]
    async fn live_tree_without_digest() {
        let store = posix_store(true);
        let ctx = FetchContext::null();
        let inode = VirtualInode::Inode(InMemoryTree::builder().build().into_inode());

        assert_eq!(
            inode.digest_hash("new", store.as_ref(), &ctx).await.unwrap_err(),
            InodeError::DigestHashMissing { path: "new".into() }
        );
        assert_eq!(
            inode.tree_aux_data("new", store.as_ref(), &ctx).await.unwrap_err(),
            InodeError::TreeAuxDataMissing { path: "new".into() }
        );
    }

    #[tokio::test]
    async fn store_errors_pass_through() {
        let store = posix_store(true);
        let id = store.put_blob("abc");
        store.fail_fetches_of(id, "offline");
        let inode = VirtualInode::TreeEntry(TreeEntry::new(id, EntryMode::Regular));

        let err = inode
            .sha1("f", store.as_ref(), &FetchContext::null())
            .await
            .unwrap_err();
        assert_eq!(
            err,
            InodeError::Store(StoreError::Unavailable {
                id,
                reason: "offline".into()
            })
        );
    }
}
