//! Kind filtering under the mount's symlink setting.

use vfs_store::EntryMode;
use vfs_types::Dtype;

/// Entry kind as presented by the mount: symlinks read as regular files
/// when symlinks are disabled.
pub fn filtered_dtype(dtype: Dtype, symlinks_enabled: bool) -> Dtype {
    if !symlinks_enabled && dtype == Dtype::Symlink {
        Dtype::Regular
    } else {
        dtype
    }
}

/// Source-control type as presented by the mount.
pub fn filtered_entry_type(mode: EntryMode, symlinks_enabled: bool) -> EntryMode {
    if !symlinks_enabled && mode == EntryMode::Symlink {
        EntryMode::Regular
    } else {
        mode
    }
}
