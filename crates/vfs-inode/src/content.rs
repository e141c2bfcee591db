//! Reading file content.

use vfs_store::{FetchContext, ObjectStore};

use crate::error::{InodeError, InodeResult};
use crate::live::InodePtr;
use crate::virtual_inode::VirtualInode;

impl VirtualInode {
    /// Full content of a file or symlink target. Directories fail without
    /// a fetch.
    pub async fn read_content(
        &self,
        path: &str,
        store: &dyn ObjectStore,
        ctx: &FetchContext,
    ) -> InodeResult<Vec<u8>> {
        if self.is_directory() {
            return Err(InodeError::is_a_directory(path));
        }

        match self {
            Self::Inode(InodePtr::File(file)) => file.read_all(ctx).await,
            Self::Inode(InodePtr::Tree(_)) | Self::Tree { .. } => {
                Err(InodeError::is_a_directory(path))
            }
            Self::DirEntry(entry) => {
                let blob = store.get_blob(&entry.object_id(), ctx).await?;
                Ok(blob.data.clone())
            }
            Self::TreeEntry(entry) => {
                let blob = store.get_blob(&entry.object_id, ctx).await?;
                Ok(blob.data.clone())
            }
        }
    }
}
