use serde::{Deserialize, Serialize};
use vfs_types::Platform;

use crate::error::{StoreError, StoreResult};

/// Settings of a store backend and the mount it serves.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Platform semantics presented by the mount.
    pub platform: Platform,
    /// Whether symlinks are presented as symlinks. When off, symlink
    /// entries are treated as regular files everywhere.
    pub symlinks_enabled: bool,
    /// Compute BLAKE3 for aux data even when the caller did not ask for it.
    pub compute_blake3: bool,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            platform: Platform::current(),
            symlinks_enabled: true,
            compute_blake3: true,
        }
    }
}

impl StoreConfig {
    /// Parse a TOML document. Missing keys take their defaults.
    pub fn from_toml_str(s: &str) -> StoreResult<Self> {
        toml::from_str(s).map_err(|e| StoreError::Config(e.to_string()))
    }

    /// Render as a TOML document.
    pub fn to_toml_string(&self) -> StoreResult<String> {
        toml::to_string(self).map_err(|e| StoreError::Config(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let c = StoreConfig::default();
        assert_eq!(c.platform, Platform::current());
        assert!(c.symlinks_enabled);
        assert!(c.compute_blake3);
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let c = StoreConfig::from_toml_str(
            r#"
            platform = "windows"
            symlinks_enabled = false
            "#,
        )
        .unwrap();
        assert_eq!(c.platform, Platform::Windows);
        assert!(!c.symlinks_enabled);
        assert!(c.compute_blake3);
    }

    #[test]
    fn toml_roundtrip() {
        let c = StoreConfig {
            platform: Platform::Posix,
            symlinks_enabled: true,
            compute_blake3: false,
        };
        let s = c.to_toml_string().unwrap();
        assert_eq!(StoreConfig::from_toml_str(&s).unwrap(), c);
    }

    #[test]
    fn bad_toml_is_config_error() {
        let err = StoreConfig::from_toml_str("platform = \"beos\"").unwrap_err();
        assert!(matches!(err, StoreError::Config(_)));
    }
}
