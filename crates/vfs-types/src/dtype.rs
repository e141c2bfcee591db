use std::fmt;

use serde::{Deserialize, Serialize};

/// File-type mask of a POSIX `st_mode`.
pub const S_IFMT: u32 = 0o170000;
pub const S_IFSOCK: u32 = 0o140000;
pub const S_IFLNK: u32 = 0o120000;
pub const S_IFREG: u32 = 0o100000;
pub const S_IFBLK: u32 = 0o060000;
pub const S_IFDIR: u32 = 0o040000;
pub const S_IFCHR: u32 = 0o020000;
pub const S_IFIFO: u32 = 0o010000;

/// Kind of a directory entry, numbered like `d_type` in `struct dirent`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Dtype {
    Unknown = 0,
    Fifo = 1,
    Char = 2,
    Dir = 4,
    Block = 6,
    Regular = 8,
    Symlink = 10,
    Socket = 12,
    Whiteout = 14,
}

impl Dtype {
    /// Decode the file-type bits of a `st_mode`.
    pub fn from_mode(mode: u32) -> Self {
        match mode & S_IFMT {
            S_IFSOCK => Self::Socket,
            S_IFLNK => Self::Symlink,
            S_IFREG => Self::Regular,
            S_IFBLK => Self::Block,
            S_IFDIR => Self::Dir,
            S_IFCHR => Self::Char,
            S_IFIFO => Self::Fifo,
            _ => Self::Unknown,
        }
    }

    /// The raw `d_type` value.
    pub fn as_raw(self) -> u8 {
        self as u8
    }
}

impl fmt::Display for Dtype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Unknown => "unknown",
            Self::Fifo => "fifo",
            Self::Char => "char",
            Self::Dir => "dir",
            Self::Block => "block",
            Self::Regular => "regular",
            Self::Symlink => "symlink",
            Self::Socket => "socket",
            Self::Whiteout => "whiteout",
        };
        f.write_str(name)
    }
}

/// Which platform's filesystem semantics the mount presents.
///
/// On `Windows` live nodes carry no trustworthy permission bits and stat
/// results report a zero mode and mtime.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Posix,
    Windows,
}

impl Platform {
    /// The platform this binary was compiled for.
    pub const fn current() -> Self {
        if cfg!(windows) {
            Self::Windows
        } else {
            Self::Posix
        }
    }

    /// Whether stat and entry typing follow Windows rules.
    pub fn is_windows(self) -> bool {
        matches!(self, Self::Windows)
    }
}

impl Default for Platform {
    fn default() -> Self {
        Self::current()
    }
}
