//! Stat emulation for entries that are not loaded into the mount.

use std::time::{SystemTime, UNIX_EPOCH};

use vfs_store::{FetchContext, ObjectStore};
use vfs_types::{Dtype, Platform};

use crate::classify::filtered_entry_type;
use crate::error::InodeResult;
use crate::virtual_inode::VirtualInode;

/// The subset of `struct stat` the resolution layer answers.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Stat {
    /// POSIX `st_mode`, type bits included.
    pub mode: u32,
    pub size: u64,
    pub mtime: SystemTime,
}

impl Stat {
    /// Drop what the platform cannot present. Windows mounts report no
    /// POSIX mode and no modification time for emulated entries.
    pub fn for_platform(self, platform: Platform) -> Self {
        if !platform.is_windows() {
            return self;
        }
        Self {
            mode: 0,
            size: self.size,
            mtime: UNIX_EPOCH,
        }
    }
}

impl VirtualInode {
    /// Stat this entry.
    ///
    /// Live nodes answer for themselves. Everything else is emulated:
    /// directories report size 0 without a fetch, files fetch their size,
    /// and the modification time is `last_checkout_time`, the moment the
    /// mount last switched revisions.
    pub async fn stat(
        &self,
        last_checkout_time: SystemTime,
        store: &dyn ObjectStore,
        ctx: &FetchContext,
    ) -> InodeResult<Stat> {
        let (mode, object_id) = match self {
            Self::Inode(inode) => return inode.stat(ctx).await,
            Self::Tree { mode, .. } => {
                let stat = Stat {
                    mode: *mode,
                    size: 0,
                    mtime: last_checkout_time,
                };
                return Ok(stat.for_platform(store.platform()));
            }
            Self::DirEntry(entry) => (entry.initial_mode(), entry.object_id()),
            Self::TreeEntry(entry) => (
                filtered_entry_type(entry.mode, store.symlinks_enabled()).stat_mode(),
                entry.object_id,
            ),
        };

        let size = if Dtype::from_mode(mode) == Dtype::Dir {
            0
        } else {
            store.get_blob_aux_data(&object_id, ctx, false).await?.size
        };
        let stat = Stat {
            mode,
            size,
            mtime: last_checkout_time,
        };
        Ok(stat.for_platform(store.platform()))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use super::*;
    use crate::test_util::{posix_store, windows_store};
    use crate::virtual_inode::UnloadedDirEntry;
    use vfs_store::{EntryMode, Tree, TreeEntry};
    use vfs_types::{S_IFDIR, S_IFLNK, S_IFREG};

    fn checkout_time() -> SystemTime {
        UNIX_EPOCH + Duration::from_secs(1_700_000_000)
    }

    #[tokio::test]
    async fn tree_entry_stat_fetches_size() {
        let store = posix_store(true);
        let id = store.put_blob("hello world");
        let inode = VirtualInode::TreeEntry(TreeEntry::new(id, EntryMode::Executable));

        let stat = inode
            .stat(checkout_time(), store.as_ref(), &FetchContext::null())
            .await
            .unwrap();
        assert_eq!(stat.mode, S_IFREG | 0o755);
        assert_eq!(stat.size, 11);
        assert_eq!(stat.mtime, checkout_time());
        assert_eq!(store.fetch_counts().blob_aux, 1);
    }

    #[tokio::test]
    async fn dir_entry_keeps_initial_mode() {
        let store = posix_store(true);
        let id = store.put_blob("abc");
        let inode = VirtualInode::DirEntry(UnloadedDirEntry::new(id, S_IFREG | 0o600));

        let stat = inode
            .stat(checkout_time(), store.as_ref(), &FetchContext::null())
            .await
            .unwrap();
        assert_eq!(stat.mode, S_IFREG | 0o600);
        assert_eq!(stat.size, 3);
    }

    #[tokio::test]
    async fn symlink_entry_reads_as_file_when_disabled() {
        let store = posix_store(false);
        let id = store.put_blob("target");
        let inode = VirtualInode::TreeEntry(TreeEntry::new(id, EntryMode::Symlink));

        let stat = inode
            .stat(checkout_time(), store.as_ref(), &FetchContext::null())
            .await
            .unwrap();
        assert_eq!(stat.mode, S_IFREG | 0o644);

        let store = posix_store(true);
        let id = store.put_blob("target");
        let inode = VirtualInode::TreeEntry(TreeEntry::new(id, EntryMode::Symlink));
        let stat = inode
            .stat(checkout_time(), store.as_ref(), &FetchContext::null())
            .await
            .unwrap();
        assert_eq!(stat.mode & S_IFLNK, S_IFLNK);
    }

    #[tokio::test]
    async fn tree_stat_never_fetches() {
        let store = posix_store(true);
        let inode = VirtualInode::Tree {
            tree: Arc::new(Tree::empty()),
            mode: S_IFDIR | 0o755,
        };

        let stat = inode
            .stat(checkout_time(), store.as_ref(), &FetchContext::null())
            .await
            .unwrap();
        assert_eq!(stat.mode, S_IFDIR | 0o755);
        assert_eq!(stat.size, 0);
        assert_eq!(stat.mtime, checkout_time());
        assert_eq!(store.fetch_counts().total(), 0);
    }

    #[tokio::test]
    async fn unloaded_directory_stat_never_fetches() {
        let store = posix_store(true);
        let sub = store.put_tree(Tree::empty());
        let ctx = FetchContext::null();

        let entry = VirtualInode::DirEntry(UnloadedDirEntry::new(sub, S_IFDIR | 0o700));
        let stat = entry.stat(checkout_time(), store.as_ref(), &ctx).await.unwrap();
        assert_eq!(stat, Stat { mode: S_IFDIR | 0o700, size: 0, mtime: checkout_time() });

        let row = VirtualInode::TreeEntry(TreeEntry::new(sub, EntryMode::Directory));
        let stat = row.stat(checkout_time(), store.as_ref(), &ctx).await.unwrap();
        assert_eq!(stat.mode & S_IFDIR, S_IFDIR);
        assert_eq!(stat.size, 0);
        assert_eq!(store.fetch_counts().total(), 0);
    }

    #[test]
    fn posix_keeps_everything() {
        let stat = Stat { mode: S_IFREG | 0o644, size: 9, mtime: checkout_time() };
        assert_eq!(stat.for_platform(Platform::Posix), stat);
        assert!(!Platform::Posix.is_windows());
        assert!(Platform::Windows.is_windows());
    }

    #[tokio::test]
    async fn windows_drops_mode_and_mtime() {
        let store = windows_store();
        let id = store.put_blob("12345");
        let file = VirtualInode::TreeEntry(TreeEntry::new(id, EntryMode::Regular));
        let dir = VirtualInode::Tree {
            tree: Arc::new(Tree::empty()),
            mode: S_IFDIR | 0o755,
        };
        let ctx = FetchContext::null();

        let stat = file.stat(checkout_time(), store.as_ref(), &ctx).await.unwrap();
        assert_eq!(stat, Stat { mode: 0, size: 5, mtime: UNIX_EPOCH });

        let stat = dir.stat(checkout_time(), store.as_ref(), &ctx).await.unwrap();
        assert_eq!(stat, Stat { mode: 0, size: 0, mtime: UNIX_EPOCH });
    }

    #[tokio::test]
    async fn store_failure_propagates() {
        let store = posix_store(true);
        let id = store.put_blob("abc");
        store.fail_fetches_of(id, "backend down");
        let inode = VirtualInode::TreeEntry(TreeEntry::new(id, EntryMode::Regular));

        let err = inode
            .stat(checkout_time(), store.as_ref(), &FetchContext::null())
            .await
            .unwrap_err();
        assert!(matches!(err, crate::InodeError::Store(_)));
    }
}
