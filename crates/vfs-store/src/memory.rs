use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use async_trait::async_trait;
use tracing::trace;
use vfs_types::{Hash32, ObjectId, Platform};

use crate::config::StoreConfig;
use crate::context::FetchContext;
use crate::error::{StoreError, StoreResult};
use crate::object::{Blob, BlobAuxData, ObjectKind, Tree, TreeAuxData};
use crate::traits::ObjectStore;

#[derive(Clone, Debug)]
enum StoredObject {
    Blob(Arc<Blob>),
    Tree(Arc<Tree>),
}

impl StoredObject {
    fn kind(&self) -> ObjectKind {
        match self {
            Self::Blob(_) => ObjectKind::Blob,
            Self::Tree(_) => ObjectKind::Tree,
        }
    }
}

/// Number of fetches served, per store operation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FetchCounts {
    pub blob: u64,
    pub blob_aux: u64,
    pub tree: u64,
    pub tree_aux: u64,
}

impl FetchCounts {
    /// Fetches across all operations.
    pub fn total(&self) -> u64 {
        self.blob + self.blob_aux + self.tree + self.tree_aux
    }
}

#[derive(Default)]
struct Counters {
    blob: AtomicU64,
    blob_aux: AtomicU64,
    tree: AtomicU64,
    tree_aux: AtomicU64,
}

/// In-memory, `HashMap`-backed store.
///
/// Intended for tests and embedding. Every fetch is counted, including
/// failed ones, and ids registered with [`fail_fetches_of`] fail every
/// fetch until cleared.
///
/// [`fail_fetches_of`]: InMemoryObjectStore::fail_fetches_of
pub struct InMemoryObjectStore {
    config: StoreConfig,
    objects: RwLock<HashMap<ObjectId, StoredObject>>,
    aux_overrides: RwLock<HashMap<ObjectId, BlobAuxData>>,
    failures: RwLock<HashMap<ObjectId, String>>,
    counters: Counters,
}

impl InMemoryObjectStore {
    /// Create an empty store with the default configuration.
    pub fn new() -> Self {
        Self::with_config(StoreConfig::default())
    }

    /// Create an empty store with the given configuration.
    pub fn with_config(config: StoreConfig) -> Self {
        Self {
            config,
            objects: RwLock::new(HashMap::new()),
            aux_overrides: RwLock::new(HashMap::new()),
            failures: RwLock::new(HashMap::new()),
            counters: Counters::default(),
        }
    }

    /// The configuration this store answers capability queries from.
    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Insert file content and return its id. Idempotent.
    pub fn put_blob(&self, data: impl Into<Vec<u8>>) -> ObjectId {
        let blob = Blob::new(data);
        let id = blob.id();
        self.objects
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(id)
            .or_insert_with(|| StoredObject::Blob(Arc::new(blob)));
        id
    }

    /// Insert a directory snapshot and return its id. Idempotent.
    pub fn put_tree(&self, tree: Tree) -> ObjectId {
        let id = tree.id();
        self.objects
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(id)
            .or_insert_with(|| StoredObject::Tree(Arc::new(tree)));
        id
    }

    /// Serve `aux` verbatim for `id` instead of computing it from content.
    pub fn set_blob_aux_data(&self, id: ObjectId, aux: BlobAuxData) {
        self.aux_overrides
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id, aux);
    }

    /// Make every subsequent fetch of `id` fail with `reason`.
    pub fn fail_fetches_of(&self, id: ObjectId, reason: impl Into<String>) {
        self.failures
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id, reason.into());
    }

    /// Forget every failure registered with [`fail_fetches_of`](Self::fail_fetches_of).
    pub fn clear_failures(&self) {
        self.failures
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    /// Snapshot of the fetch counters.
    pub fn fetch_counts(&self) -> FetchCounts {
        FetchCounts {
            blob: self.counters.blob.load(Ordering::Relaxed),
            blob_aux: self.counters.blob_aux.load(Ordering::Relaxed),
            tree: self.counters.tree.load(Ordering::Relaxed),
            tree_aux: self.counters.tree_aux.load(Ordering::Relaxed),
        }
    }

    /// Zero all fetch counters.
    pub fn reset_fetch_counts(&self) {
        for c in [
            &self.counters.blob,
            &self.counters.blob_aux,
            &self.counters.tree,
            &self.counters.tree_aux,
        ] {
            c.store(0, Ordering::Relaxed);
        }
    }

    /// Number of objects currently stored.
    pub fn len(&self) -> usize {
        self.objects
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Whether the store holds no objects.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn check_failure(&self, id: &ObjectId) -> StoreResult<()> {
        let failures = self.failures.read().unwrap_or_else(PoisonError::into_inner);
        match failures.get(id) {
            Some(reason) => Err(StoreError::Unavailable {
                id: *id,
                reason: reason.clone(),
            }),
            None => Ok(()),
        }
    }

    fn lookup(&self, id: &ObjectId) -> StoreResult<StoredObject> {
        self.check_failure(id)?;
        self.objects
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(id)
            .cloned()
            .ok_or(StoreError::NotFound(*id))
    }

    fn lookup_blob(&self, id: &ObjectId) -> StoreResult<Arc<Blob>> {
        match self.lookup(id)? {
            StoredObject::Blob(blob) => Ok(blob),
            other => Err(StoreError::KindMismatch {
                id: *id,
                expected: ObjectKind::Blob,
                actual: other.kind(),
            }),
        }
    }

    fn lookup_tree(&self, id: &ObjectId) -> StoreResult<Arc<Tree>> {
        match self.lookup(id)? {
            StoredObject::Tree(tree) => Ok(tree),
            other => Err(StoreError::KindMismatch {
                id: *id,
                expected: ObjectKind::Tree,
                actual: other.kind(),
            }),
        }
    }

    // Digest of a tree: size is the sum of all reachable blob sizes; the
    // hash covers every entry's name, mode and content digest in name order.
    fn compute_tree_aux(&self, tree: &Tree) -> StoreResult<TreeAuxData> {
        let mut hasher = blake3::Hasher::new();
        let mut digest_size = 0u64;
        for (name, entry) in tree.iter() {
            let (child_hash, child_size) = if entry.is_tree() {
                let subtree = self.lookup_tree(&entry.object_id)?;
                let aux = self.compute_tree_aux(&subtree)?;
                (aux.digest_hash, aux.digest_size)
            } else {
                let blob = self.lookup_blob(&entry.object_id)?;
                (Hash32::blake3_of(&blob.data), blob.len() as u64)
            };
            hasher.update(name.as_bytes());
            hasher.update(&[0]);
            hasher.update(&entry.mode.stat_mode().to_le_bytes());
            hasher.update(child_hash.as_bytes());
            digest_size += child_size;
        }
        Ok(TreeAuxData {
            digest_hash: Hash32::new(*hasher.finalize().as_bytes()),
            digest_size,
        })
    }
}

impl Default for InMemoryObjectStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ObjectStore for InMemoryObjectStore {
    async fn get_blob(&self, id: &ObjectId, ctx: &FetchContext) -> StoreResult<Arc<Blob>> {
        self.counters.blob.fetch_add(1, Ordering::Relaxed);
        trace!(id = %id.short_hex(), cause = %ctx.cause(), "fetch blob");
        self.lookup_blob(id)
    }

    async fn get_blob_aux_data(
        &self,
        id: &ObjectId,
        ctx: &FetchContext,
        blake3_required: bool,
    ) -> StoreResult<BlobAuxData> {
        self.counters.blob_aux.fetch_add(1, Ordering::Relaxed);
        trace!(id = %id.short_hex(), cause = %ctx.cause(), blake3_required, "fetch blob aux");
        let overridden = self
            .aux_overrides
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(id)
            .copied();
        if let Some(aux) = overridden {
            self.check_failure(id)?;
            return Ok(aux);
        }
        let blob = self.lookup_blob(id)?;
        Ok(BlobAuxData::compute(
            &blob.data,
            blake3_required || self.config.compute_blake3,
        ))
    }

    async fn get_tree(&self, id: &ObjectId, ctx: &FetchContext) -> StoreResult<Arc<Tree>> {
        self.counters.tree.fetch_add(1, Ordering::Relaxed);
        trace!(id = %id.short_hex(), cause = %ctx.cause(), "fetch tree");
        self.lookup_tree(id)
    }

    async fn get_tree_aux_data(
        &self,
        id: &ObjectId,
        ctx: &FetchContext,
    ) -> StoreResult<TreeAuxData> {
        self.counters.tree_aux.fetch_add(1, Ordering::Relaxed);
        trace!(id = %id.short_hex(), cause = %ctx.cause(), "fetch tree aux");
        let tree = self.lookup_tree(id)?;
        self.compute_tree_aux(&tree)
    }

    fn symlinks_enabled(&self) -> bool {
        self.config.symlinks_enabled
    }

    fn platform(&self) -> Platform {
        self.config.platform
    }
}

impl std::fmt::Debug for InMemoryObjectStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryObjectStore")
            .field("object_count", &self.len())
            .field("config", &self.config)
            .finish()
    }
}
