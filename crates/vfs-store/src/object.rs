use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use vfs_types::dtype::{S_IFDIR, S_IFLNK, S_IFMT, S_IFREG};
use vfs_types::{ContentHasher, Dtype, Hash20, Hash32, ObjectId};

/// The kind of object held by a store.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ObjectKind {
    Blob,
    Tree,
}

impl std::fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Blob => write!(f, "blob"),
            Self::Tree => write!(f, "tree"),
        }
    }
}

// ---------------------------------------------------------------------------
// Blob
// ---------------------------------------------------------------------------

/// File contents as stored.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Blob {
    pub data: Vec<u8>,
}

impl Blob {
    /// Wrap raw content.
    pub fn new(data: impl Into<Vec<u8>>) -> Self {
        Self { data: data.into() }
    }

    /// The content-addressed id this blob is stored under.
    pub fn id(&self) -> ObjectId {
        ContentHasher::BLOB.hash(&self.data)
    }

    /// Content length in bytes.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether the content is empty.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Lossy UTF-8 view of the content.
    pub fn as_string(&self) -> String {
        String::from_utf8_lossy(&self.data).into_owned()
    }
}

/// Size and content hashes of one blob.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlobAuxData {
    pub size: u64,
    pub sha1: Hash20,
    /// Absent when the store had no reason to compute it.
    pub blake3: Option<Hash32>,
}

impl BlobAuxData {
    /// Derive aux data from raw content.
    pub fn compute(data: &[u8], with_blake3: bool) -> Self {
        Self {
            size: data.len() as u64,
            sha1: Hash20::sha1_of(data),
            blake3: with_blake3.then(|| Hash32::blake3_of(data)),
        }
    }
}

/// Aggregate digest over a directory's full recursive content.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeAuxData {
    pub digest_hash: Hash32,
    pub digest_size: u64,
}

// ---------------------------------------------------------------------------
// Tree
// ---------------------------------------------------------------------------

/// Source-control type of a tree entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntryMode {
    /// Normal file.
    Regular,
    /// Executable file.
    Executable,
    /// Symbolic link.
    Symlink,
    /// Subtree.
    Directory,
}

impl EntryMode {
    /// The `st_mode` a checkout presents for an entry of this type.
    pub fn stat_mode(self) -> u32 {
        match self {
            Self::Regular => S_IFREG | 0o644,
            Self::Executable => S_IFREG | 0o755,
            Self::Symlink => S_IFLNK | 0o755,
            Self::Directory => S_IFDIR | 0o755,
        }
    }

    /// Recover the entry type from a `st_mode`.
    ///
    /// Returns `None` for sockets, fifos, devices and anything else source
    /// control cannot represent.
    pub fn from_stat_mode(mode: u32) -> Option<Self> {
        match mode & S_IFMT {
            S_IFREG if mode & 0o100 != 0 => Some(Self::Executable),
            S_IFREG => Some(Self::Regular),
            S_IFLNK => Some(Self::Symlink),
            S_IFDIR => Some(Self::Directory),
            _ => None,
        }
    }

    /// Dirent kind this mode presents as.
    pub fn dtype(self) -> Dtype {
        match self {
            Self::Regular | Self::Executable => Dtype::Regular,
            Self::Symlink => Dtype::Symlink,
            Self::Directory => Dtype::Dir,
        }
    }

    /// Whether this is a subtree.
    pub fn is_tree(self) -> bool {
        matches!(self, Self::Directory)
    }
}

impl std::fmt::Display for EntryMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:06o}", self.stat_mode())
    }
}

/// One row of a [`Tree`]. The name lives in the tree's map key.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeEntry {
    pub object_id: ObjectId,
    pub mode: EntryMode,
    /// SHA1 of the blob content, when the source tree carried it.
    pub sha1: Option<Hash20>,
    /// BLAKE3 of the blob content, when the source tree carried it.
    pub blake3: Option<Hash32>,
}

impl TreeEntry {
    /// An entry with no cached hashes.
    pub fn new(object_id: ObjectId, mode: EntryMode) -> Self {
        Self {
            object_id,
            mode,
            sha1: None,
            blake3: None,
        }
    }

    /// A file entry with its content hashes filled in.
    pub fn file_with_hashes(object_id: ObjectId, mode: EntryMode, content: &[u8]) -> Self {
        Self {
            object_id,
            mode,
            sha1: Some(Hash20::sha1_of(content)),
            blake3: Some(Hash32::blake3_of(content)),
        }
    }

    /// Cache the content SHA1 on the entry.
    pub fn with_sha1(mut self, sha1: Hash20) -> Self {
        self.sha1 = Some(sha1);
        self
    }

    /// Cache the content BLAKE3 on the entry.
    pub fn with_blake3(mut self, blake3: Hash32) -> Self {
        self.blake3 = Some(blake3);
        self
    }

    /// Dirent kind of the entry.
    pub fn dtype(&self) -> Dtype {
        self.mode.dtype()
    }

    /// Whether the entry names a subtree.
    pub fn is_tree(&self) -> bool {
        self.mode.is_tree()
    }
}

/// Immutable, content-addressed directory snapshot.
///
/// Entries are kept sorted by name, so iteration order is deterministic and
/// the id is stable for identical listings.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Tree {
    id: ObjectId,
    entries: BTreeMap<String, TreeEntry>,
}

impl Tree {
    /// Build a tree from named entries. Later duplicates replace earlier ones.
    pub fn new<N: Into<String>>(entries: impl IntoIterator<Item = (N, TreeEntry)>) -> Self {
        let entries: BTreeMap<String, TreeEntry> =
            entries.into_iter().map(|(n, e)| (n.into(), e)).collect();
        let id = ContentHasher::TREE.hash(&Self::encode(&entries));
        Self { id, entries }
    }

    /// A tree with no entries.
    pub fn empty() -> Self {
        Self::new(Vec::<(String, TreeEntry)>::new())
    }

    /// Content id derived from the sorted entries.
    pub fn id(&self) -> ObjectId {
        self.id
    }

    /// Look up an entry by name.
    pub fn get(&self, name: &str) -> Option<&TreeEntry> {
        self.entries.get(name)
    }

    /// Entries in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &TreeEntry)> {
        self.entries.iter().map(|(n, e)| (n.as_str(), e))
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the tree has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    // Only the name, mode and target id participate in the id; cached
    // hashes are derived data.
    fn encode(entries: &BTreeMap<String, TreeEntry>) -> Vec<u8> {
        let mut out = Vec::new();
        for (name, entry) in entries {
            out.extend_from_slice(name.as_bytes());
            out.push(0);
            out.extend_from_slice(&entry.mode.stat_mode().to_le_bytes());
            out.extend_from_slice(entry.object_id.as_bytes());
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tree_entries_sorted_by_name() {
        let tree = Tree::new([
            ("zebra.txt", TreeEntry::new(ObjectId::from_bytes(b"z"), EntryMode::Regular)),
            ("alpha.txt", TreeEntry::new(ObjectId::from_bytes(b"a"), EntryMode::Regular)),
            ("middle", TreeEntry::new(ObjectId::from_bytes(b"m"), EntryMode::Directory)),
        ]);
        let names: Vec<&str> = tree.iter().map(|(n, _)| n).collect();
        assert_eq!(names, ["alpha.txt", "middle", "zebra.txt"]);
        assert!(tree.get("middle").unwrap().is_tree());
        assert!(tree.get("missing").is_none());
    }

    #[test]
    fn tree_id_ignores_cached_hashes() {
        let id = ObjectId::from_bytes(b"content");
        let plain = Tree::new([("f", TreeEntry::new(id, EntryMode::Regular))]);
        let hashed = TreeEntry::file_with_hashes(id, EntryMode::Regular, b"content");
        let hashed = Tree::new([("f", hashed)]);
        assert_eq!(plain.id(), hashed.id());
    }

    #[test]
    fn tree_id_depends_on_mode() {
        let id = ObjectId::from_bytes(b"content");
        let a = Tree::new([("f", TreeEntry::new(id, EntryMode::Regular))]);
        let b = Tree::new([("f", TreeEntry::new(id, EntryMode::Executable))]);
        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn empty_tree() {
        let tree = Tree::empty();
        assert!(tree.is_empty());
        assert_eq!(tree.len(), 0);
    }

    #[test]
    fn stat_mode_roundtrip() {
        for mode in [
            EntryMode::Regular,
            EntryMode::Executable,
            EntryMode::Symlink,
            EntryMode::Directory,
        ] {
            assert_eq!(EntryMode::from_stat_mode(mode.stat_mode()), Some(mode));
        }
    }

    #[test]
    fn from_stat_mode_rejects_sockets_and_fifos() {
        assert_eq!(EntryMode::from_stat_mode(0o140755), None);
        assert_eq!(EntryMode::from_stat_mode(0o010644), None);
    }

    #[test]
    fn blob_aux_data_compute() {
        let aux = BlobAuxData::compute(b"hello", false);
        assert_eq!(aux.size, 5);
        assert_eq!(aux.sha1, Hash20::sha1_of(b"hello"));
        assert!(aux.blake3.is_none());
        assert_eq!(
            BlobAuxData::compute(b"hello", true).blake3,
            Some(Hash32::blake3_of(b"hello"))
        );
    }

    #[test]
    fn blob_id_is_domain_separated() {
        let blob = Blob::new(b"data".to_vec());
        assert_eq!(blob.id(), ContentHasher::BLOB.hash(b"data"));
        assert_eq!(blob.as_string(), "data");
    }

    #[test]
    fn entry_mode_display_is_octal() {
        assert_eq!(EntryMode::Regular.to_string(), "100644");
        assert_eq!(EntryMode::Directory.to_string(), "040755");
    }
}
