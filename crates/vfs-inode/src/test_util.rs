use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Barrier;
use vfs_store::{BlobAuxData, FetchContext, InMemoryObjectStore, ObjectStore, StoreConfig};
use vfs_types::{Dtype, Hash20, Hash32, ObjectId, Platform};

use crate::error::InodeResult;
use crate::live::LiveFile;
use crate::memory::InMemoryFile;
use crate::stat::Stat;

pub(crate) fn posix_store(symlinks_enabled: bool) -> Arc<InMemoryObjectStore> {
    Arc::new(InMemoryObjectStore::with_config(StoreConfig {
        platform: Platform::Posix,
        symlinks_enabled,
        compute_blake3: true,
    }))
}

pub(crate) fn windows_store() -> Arc<InMemoryObjectStore> {
    Arc::new(InMemoryObjectStore::with_config(StoreConfig {
        platform: Platform::Windows,
        symlinks_enabled: false,
        compute_blake3: true,
    }))
}

pub(crate) fn dyn_store(store: &Arc<InMemoryObjectStore>) -> Arc<dyn ObjectStore> {
    store.clone()
}

/// A live file that counts `stat` calls and can hold `stat` or
/// `blob_aux_data` at a barrier until its partner call arrives.
pub(crate) struct InstrumentedFile {
    inner: InMemoryFile,
    stat_gate: Option<Arc<Barrier>>,
    aux_gate: Option<Arc<Barrier>>,
    stat_calls: AtomicUsize,
}

impl InstrumentedFile {
    pub(crate) fn new(inner: InMemoryFile) -> Self {
        Self {
            inner,
            stat_gate: None,
            aux_gate: None,
            stat_calls: AtomicUsize::new(0),
        }
    }

    pub(crate) fn gate_stat(mut self, gate: Arc<Barrier>) -> Self {
        self.stat_gate = Some(gate);
        self
    }

    pub(crate) fn gate_aux(mut self, gate: Arc<Barrier>) -> Self {
        self.aux_gate = Some(gate);
        self
    }

    pub(crate) fn stat_calls(&self) -> usize {
        self.stat_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LiveFile for InstrumentedFile {
    fn dtype(&self) -> Dtype {
        self.inner.dtype()
    }

    fn object_id(&self) -> Option<ObjectId> {
        self.inner.object_id()
    }

    async fn stat(&self, ctx: &FetchContext) -> InodeResult<Stat> {
        self.stat_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(gate) = &self.stat_gate {
            gate.wait().await;
        }
        self.inner.stat(ctx).await
    }

    async fn sha1(&self, ctx: &FetchContext) -> InodeResult<Hash20> {
        self.inner.sha1(ctx).await
    }

    async fn blake3(&self, ctx: &FetchContext) -> InodeResult<Hash32> {
        self.inner.blake3(ctx).await
    }

    async fn blob_aux_data(
        &self,
        ctx: &FetchContext,
        blake3_required: bool,
    ) -> InodeResult<BlobAuxData> {
        if let Some(gate) = &self.aux_gate {
            gate.wait().await;
        }
        self.inner.blob_aux_data(ctx, blake3_required).await
    }

    async fn read_all(&self, ctx: &FetchContext) -> InodeResult<Vec<u8>> {
        self.inner.read_all(ctx).await
    }
}
