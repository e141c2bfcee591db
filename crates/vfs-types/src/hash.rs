use std::fmt;

use serde::{Deserialize, Serialize};
use sha1::{Digest, Sha1};

use crate::error::TypeError;
use crate::object::ObjectId;

macro_rules! fixed_hash {
    ($(#[$meta:meta])* $name:ident, $len:expr) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub struct $name([u8; $len]);

        impl $name {
            /// Length of the digest in bytes.
            pub const LEN: usize = $len;

            /// Wrap raw digest bytes.
            pub const fn new(bytes: [u8; $len]) -> Self {
                Self(bytes)
            }

            /// The raw digest bytes.
            pub fn as_bytes(&self) -> &[u8; $len] {
                &self.0
            }

            /// Lowercase hex.
            pub fn to_hex(&self) -> String {
                hex::encode(self.0)
            }

            /// Parse lowercase or uppercase hex of exactly `LEN` bytes.
            pub fn from_hex(s: &str) -> Result<Self, TypeError> {
                let bytes = hex::decode(s).map_err(|e| TypeError::InvalidHex(e.to_string()))?;
                let arr: [u8; $len] =
                    bytes
                        .as_slice()
                        .try_into()
                        .map_err(|_| TypeError::InvalidLength {
                            expected: $len,
                            actual: bytes.len(),
                        })?;
                Ok(Self(arr))
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self.to_hex())
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.to_hex())
            }
        }

        impl From<[u8; $len]> for $name {
            fn from(bytes: [u8; $len]) -> Self {
                Self(bytes)
            }
        }
    };
}

fixed_hash!(
    /// SHA1 of a file's content.
    Hash20,
    20
);

fixed_hash!(
    /// BLAKE3 of a file's content, or the aggregate digest of a directory.
    Hash32,
    32
);

impl Hash20 {
    /// SHA1 of `data`.
    pub fn sha1_of(data: &[u8]) -> Self {
        let mut hasher = Sha1::new();
        hasher.update(data);
        Self(hasher.finalize().into())
    }
}

impl Hash32 {
    /// Plain (undomained) BLAKE3 of `data`.
    pub fn blake3_of(data: &[u8]) -> Self {
        Self(*blake3::hash(data).as_bytes())
    }
}

/// Domain-separated BLAKE3 hasher used to derive [`ObjectId`]s.
///
/// The domain tag keeps a blob and a tree with identical serialized bytes
/// from colliding. Content hashes reported to callers ([`Hash32::blake3_of`])
/// are never domain-separated.
pub struct ContentHasher {
    domain: &'static str,
}

impl ContentHasher {
    /// Domain for file content ids.
    pub const BLOB: Self = Self::new("vfs-blob-v1");
    /// Domain for directory snapshot ids.
    pub const TREE: Self = Self::new("vfs-tree-v1");

    /// A hasher for a custom domain tag.
    pub const fn new(domain: &'static str) -> Self {
        Self { domain }
    }

    /// Hash `data` under this domain.
    pub fn hash(&self, data: &[u8]) -> ObjectId {
        let mut hasher = blake3::Hasher::new();
        hasher.update(self.domain.as_bytes());
        hasher.update(b":");
        hasher.update(data);
        ObjectId::from_hash(*hasher.finalize().as_bytes())
    }

    /// The domain tag mixed into every hash.
    pub fn domain(&self) -> &str {
        self.domain
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sha1_known_vector() {
        assert_eq!(
            Hash20::sha1_of(b"abc").to_hex(),
            "a9993e364706816aba3e25717850c26c9cd0d89d"
        );
    }

    #[test]
    fn blake3_matches_crate() {
        let h = Hash32::blake3_of(b"hello");
        assert_eq!(h.as_bytes(), blake3::hash(b"hello").as_bytes());
    }

    #[test]
    fn domains_separate_ids() {
        let data = b"same bytes";
        assert_ne!(ContentHasher::BLOB.hash(data), ContentHasher::TREE.hash(data));
        assert_ne!(
            ContentHasher::BLOB.hash(data).as_bytes(),
            Hash32::blake3_of(data).as_bytes()
        );
    }

    #[test]
    fn custom_domain_is_separate() {
        let custom = ContentHasher::new("vfs-custom-v1");
        assert_eq!(custom.domain(), "vfs-custom-v1");
        assert_eq!(ContentHasher::BLOB.domain(), "vfs-blob-v1");
        assert_ne!(custom.hash(b"x"), ContentHasher::BLOB.hash(b"x"));
        assert_eq!(custom.hash(b"x"), ContentHasher::new("vfs-custom-v1").hash(b"x"));
    }

    #[test]
    fn hash_hex_roundtrip() {
        let h = Hash20::sha1_of(b"x");
        assert_eq!(Hash20::from_hex(&h.to_hex()).unwrap(), h);
        assert!(Hash32::from_hex(&h.to_hex()).is_err());
    }
}
