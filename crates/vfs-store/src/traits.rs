use std::sync::Arc;

use async_trait::async_trait;
use vfs_types::{Hash20, Hash32, ObjectId, Platform};

use crate::context::FetchContext;
use crate::error::{StoreError, StoreResult};
use crate::object::{Blob, BlobAuxData, Tree, TreeAuxData};

/// Content store consumed by the resolution layer.
///
/// Implementations own fetching, caching and retrying. Every call may
/// suspend and may complete on a different thread than the caller's.
/// Callers never retry a failed fetch.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Fetch the full content of a blob.
    async fn get_blob(&self, id: &ObjectId, ctx: &FetchContext) -> StoreResult<Arc<Blob>>;

    /// Fetch size and content hashes of a blob.
    ///
    /// With `blake3_required` the result always carries a BLAKE3; otherwise
    /// the store may leave it out.
    async fn get_blob_aux_data(
        &self,
        id: &ObjectId,
        ctx: &FetchContext,
        blake3_required: bool,
    ) -> StoreResult<BlobAuxData>;

    /// Fetch a directory snapshot.
    async fn get_tree(&self, id: &ObjectId, ctx: &FetchContext) -> StoreResult<Arc<Tree>>;

    /// Fetch the recursive digest of a directory snapshot.
    async fn get_tree_aux_data(
        &self,
        id: &ObjectId,
        ctx: &FetchContext,
    ) -> StoreResult<TreeAuxData>;

    /// Whether the mount presents symlinks as symlinks.
    fn symlinks_enabled(&self) -> bool;

    /// The platform semantics of the mount this store backs.
    fn platform(&self) -> Platform {
        Platform::current()
    }

    async fn get_blob_sha1(&self, id: &ObjectId, ctx: &FetchContext) -> StoreResult<Hash20> {
        Ok(self.get_blob_aux_data(id, ctx, false).await?.sha1)
    }

    async fn get_blob_blake3(&self, id: &ObjectId, ctx: &FetchContext) -> StoreResult<Hash32> {
        self.get_blob_aux_data(id, ctx, true)
            .await?
            .blake3
            .ok_or(StoreError::MissingBlake3(*id))
    }

    async fn get_tree_digest_hash(
        &self,
        id: &ObjectId,
        ctx: &FetchContext,
    ) -> StoreResult<Hash32> {
        Ok(self.get_tree_aux_data(id, ctx).await?.digest_hash)
    }
}
