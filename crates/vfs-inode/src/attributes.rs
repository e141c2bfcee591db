//! Entry-type resolution and the multi-attribute aggregator.

use std::fmt;
use std::ops::{BitOr, BitOrAssign};

use tracing::debug;
use vfs_store::{BlobAuxData, EntryMode, FetchContext, ObjectStore};
use vfs_types::{Dtype, Hash20, Hash32, ObjectId, Platform};

use crate::classify::filtered_entry_type;
use crate::error::{InodeError, InodeResult};
use crate::virtual_inode::VirtualInode;

// ---------------------------------------------------------------------------
// Flags
// ---------------------------------------------------------------------------

/// Set of attributes a caller asks for.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct EntryAttributeFlags(u32);

impl EntryAttributeFlags {
    pub const SHA1: Self = Self(1 << 0);
    pub const SIZE: Self = Self(1 << 1);
    pub const SOURCE_CONTROL_TYPE: Self = Self(1 << 2);
    pub const OBJECT_ID: Self = Self(1 << 3);
    pub const BLAKE3: Self = Self(1 << 4);
    pub const DIGEST_SIZE: Self = Self(1 << 5);
    pub const DIGEST_HASH: Self = Self(1 << 6);

    const NAMES: [(Self, &'static str); 7] = [
        (Self::SHA1, "SHA1"),
        (Self::SIZE, "SIZE"),
        (Self::SOURCE_CONTROL_TYPE, "SOURCE_CONTROL_TYPE"),
        (Self::OBJECT_ID, "OBJECT_ID"),
        (Self::BLAKE3, "BLAKE3"),
        (Self::DIGEST_SIZE, "DIGEST_SIZE"),
        (Self::DIGEST_HASH, "DIGEST_HASH"),
    ];

    /// No attributes.
    pub const fn empty() -> Self {
        Self(0)
    }

    /// Every attribute.
    pub const fn all() -> Self {
        Self(0x7f)
    }

    /// The raw bit pattern.
    pub const fn bits(self) -> u32 {
        self.0
    }

    /// Keep only known attribute bits.
    pub const fn from_bits_truncate(bits: u32) -> Self {
        Self(bits & Self::all().0)
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Whether every attribute in `other` is requested.
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// Whether any attribute in `other` is requested.
    pub const fn intersects(self, other: Self) -> bool {
        self.0 & other.0 != 0
    }
}

impl BitOr for EntryAttributeFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for EntryAttributeFlags {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl fmt::Debug for EntryAttributeFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = Self::NAMES
            .iter()
            .filter(|(flag, _)| self.contains(*flag))
            .map(|(_, name)| *name)
            .collect();
        write!(f, "EntryAttributeFlags({})", names.join(" | "))
    }
}

/// Attributes answered from blob aux data.
const BLOB_AUX_ATTRIBUTES: EntryAttributeFlags = EntryAttributeFlags(
    EntryAttributeFlags::SIZE.0
        | EntryAttributeFlags::SHA1.0
        | EntryAttributeFlags::BLAKE3.0
        | EntryAttributeFlags::DIGEST_SIZE.0
        | EntryAttributeFlags::DIGEST_HASH.0,
);

/// Attributes that need a BLAKE3 in the blob aux data.
const BLAKE3_ATTRIBUTES: EntryAttributeFlags =
    EntryAttributeFlags(EntryAttributeFlags::BLAKE3.0 | EntryAttributeFlags::DIGEST_HASH.0);

// ---------------------------------------------------------------------------
// Result
// ---------------------------------------------------------------------------

/// Outcome of one attribute.
pub type AttributeResult<T> = Result<T, InodeError>;

/// Answer to a multi-attribute query.
///
/// A slot is `Some` exactly when its attribute was requested and
/// applies. Each populated slot succeeds or fails on its own, so one
/// failed fetch never hides the attributes that did resolve.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EntryAttributes {
    pub sha1: Option<AttributeResult<Hash20>>,
    pub blake3: Option<AttributeResult<Hash32>>,
    pub size: Option<AttributeResult<u64>>,
    /// `Ok(None)` for kinds source control cannot represent.
    pub entry_type: Option<AttributeResult<Option<EntryMode>>>,
    /// `Ok(None)` for live nodes modified since checkout.
    pub object_id: Option<AttributeResult<Option<ObjectId>>>,
    pub digest_size: Option<AttributeResult<u64>>,
    pub digest_hash: Option<AttributeResult<Hash32>>,
}

impl EntryAttributes {
    /// Number of populated slots holding an error.
    pub fn error_count(&self) -> usize {
        [
            self.sha1.as_ref().is_some_and(Result::is_err),
            self.blake3.as_ref().is_some_and(Result::is_err),
            self.size.as_ref().is_some_and(Result::is_err),
            self.entry_type.as_ref().is_some_and(Result::is_err),
            self.object_id.as_ref().is_some_and(Result::is_err),
            self.digest_size.as_ref().is_some_and(Result::is_err),
            self.digest_hash.as_ref().is_some_and(Result::is_err),
        ]
        .into_iter()
        .filter(|failed| *failed)
        .count()
    }
}

/// Project one attribute out of the shared blob aux fetch.
fn project<T>(
    requested: EntryAttributeFlags,
    flag: EntryAttributeFlags,
    aux: Option<&InodeResult<BlobAuxData>>,
    f: impl FnOnce(&BlobAuxData) -> AttributeResult<T>,
) -> Option<AttributeResult<T>> {
    if !requested.contains(flag) {
        return None;
    }
    aux.map(|aux| match aux {
        Ok(aux) => f(aux),
        Err(err) => Err(err.clone()),
    })
}

// ---------------------------------------------------------------------------
// Resolution
// ---------------------------------------------------------------------------

impl VirtualInode {
    /// Source-control type of the entry, or `None` for kinds source
    /// control cannot represent.
    ///
    /// Windows live nodes are classified from their kind alone, with
    /// symlinks read as files when disabled. POSIX live nodes are stat'ed
    /// so the executable bit is seen.
    pub async fn entry_type(
        &self,
        ctx: &FetchContext,
        symlinks_enabled: bool,
        platform: Platform,
    ) -> InodeResult<Option<EntryMode>> {
        match self {
            Self::Inode(inode) => match platform {
                Platform::Windows => Ok(match inode.dtype() {
                    Dtype::Dir => Some(EntryMode::Directory),
                    Dtype::Regular => Some(EntryMode::Regular),
                    Dtype::Symlink if symlinks_enabled => Some(EntryMode::Symlink),
                    Dtype::Symlink => Some(EntryMode::Regular),
                    _ => None,
                }),
                Platform::Posix => {
                    let stat = inode.stat(ctx).await?;
                    Ok(EntryMode::from_stat_mode(stat.mode))
                }
            },
            Self::DirEntry(entry) => Ok(EntryMode::from_stat_mode(entry.initial_mode())),
            Self::Tree { .. } => Ok(Some(EntryMode::Directory)),
            Self::TreeEntry(entry) => Ok(Some(filtered_entry_type(entry.mode, symlinks_enabled))),
        }
    }

    /// Resolve the requested attributes.
    ///
    /// Never fails as a whole: every requested slot carries its own
    /// outcome. For regular files the type lookup and a single blob aux
    /// fetch run concurrently; for directories one tree aux fetch answers
    /// both digest attributes.
    pub async fn get_entry_attributes(
        &self,
        requested: EntryAttributeFlags,
        path: &str,
        store: &dyn ObjectStore,
        ctx: &FetchContext,
    ) -> EntryAttributes {
        let symlinks_enabled = store.symlinks_enabled();
        match self.filtered_dtype(symlinks_enabled) {
            Dtype::Regular => {}
            Dtype::Dir => {
                return self
                    .attributes_for_non_file(
                        requested,
                        path,
                        store,
                        ctx,
                        Some(EntryMode::Directory),
                        InodeError::is_a_directory(path),
                    )
                    .await;
            }
            Dtype::Symlink => {
                return self
                    .attributes_for_non_file(
                        requested,
                        path,
                        store,
                        ctx,
                        Some(EntryMode::Symlink),
                        InodeError::is_a_symlink(path),
                    )
                    .await;
            }
            other => {
                return self
                    .attributes_for_non_file(
                        requested,
                        path,
                        store,
                        ctx,
                        None,
                        InodeError::unsupported_type(path, other.as_raw()),
                    )
                    .await;
            }
        }

        let entry_type = async {
            if requested.contains(EntryAttributeFlags::SOURCE_CONTROL_TYPE) {
                Some(self.entry_type(ctx, symlinks_enabled, store.platform()).await)
            } else {
                None
            }
        };
        let aux = async {
            if requested.intersects(BLOB_AUX_ATTRIBUTES) {
                let blake3_required = requested.intersects(BLAKE3_ATTRIBUTES);
                Some(self.blob_aux_data(path, store, ctx, blake3_required).await)
            } else {
                None
            }
        };
        let (entry_type, aux) = futures::join!(entry_type, aux);
        let aux = aux.as_ref();

        let no_blake3 = || InodeError::NoBlake3 {
            path: path.to_string(),
        };
        EntryAttributes {
            sha1: project(requested, EntryAttributeFlags::SHA1, aux, |a| Ok(a.sha1)),
            blake3: project(requested, EntryAttributeFlags::BLAKE3, aux, |a| {
                a.blake3.ok_or_else(no_blake3)
            }),
            size: project(requested, EntryAttributeFlags::SIZE, aux, |a| Ok(a.size)),
            entry_type,
            object_id: requested
                .contains(EntryAttributeFlags::OBJECT_ID)
                .then(|| Ok(self.object_id())),
            digest_size: project(requested, EntryAttributeFlags::DIGEST_SIZE, aux, |a| {
                Ok(a.size)
            }),
            digest_hash: project(requested, EntryAttributeFlags::DIGEST_HASH, aux, |a| {
                a.blake3.ok_or_else(no_blake3)
            }),
        }
    }

    /// Attributes of a directory, symlink or special file. Content
    /// attributes carry `error`; a directory with a content id answers its
    /// digest attributes from one tree aux fetch.
    async fn attributes_for_non_file(
        &self,
        requested: EntryAttributeFlags,
        path: &str,
        store: &dyn ObjectStore,
        ctx: &FetchContext,
        entry_type: Option<EntryMode>,
        error: InodeError,
    ) -> EntryAttributes {
        let object_id = self.object_id();
        let mut attrs = EntryAttributes {
            sha1: requested
                .contains(EntryAttributeFlags::SHA1)
                .then(|| Err(error.clone())),
            blake3: requested
                .contains(EntryAttributeFlags::BLAKE3)
                .then(|| Err(error.clone())),
            size: requested
                .contains(EntryAttributeFlags::SIZE)
                .then(|| Err(error.clone())),
            entry_type: requested
                .contains(EntryAttributeFlags::SOURCE_CONTROL_TYPE)
                .then_some(Ok(entry_type)),
            object_id: requested
                .contains(EntryAttributeFlags::OBJECT_ID)
                .then_some(Ok(object_id)),
            digest_size: None,
            digest_hash: None,
        };

        if entry_type != Some(EntryMode::Directory) {
            attrs.digest_size = requested
                .contains(EntryAttributeFlags::DIGEST_SIZE)
                .then(|| Err(error.clone()));
            attrs.digest_hash = requested
                .contains(EntryAttributeFlags::DIGEST_HASH)
                .then(|| Err(error.clone()));
            return attrs;
        }

        let wants_digest = requested
            .intersects(EntryAttributeFlags::DIGEST_SIZE | EntryAttributeFlags::DIGEST_HASH);
        // A directory without a content id has no digest; the slots stay
        // empty rather than failing.
        let Some(object_id) = object_id.filter(|_| wants_digest) else {
            return attrs;
        };

        let aux = store
            .get_tree_aux_data(&object_id, ctx)
            .await
            .map_err(InodeError::from);
        if let Err(err) = &aux {
            debug!(path, error = %err, "tree aux data unavailable");
        }
        if requested.contains(EntryAttributeFlags::DIGEST_SIZE) {
            attrs.digest_size = Some(aux.as_ref().map(|a| a.digest_size).map_err(Clone::clone));
        }
        if requested.contains(EntryAttributeFlags::DIGEST_HASH) {
            attrs.digest_hash = Some(aux.as_ref().map(|a| a.digest_hash).map_err(Clone::clone));
        }
        attrs
    }
}
