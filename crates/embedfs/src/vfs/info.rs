//! File metadata: the name/size/mode/mtime set every handle can report.

use std::fmt;
use std::fs::Metadata;
use std::time::SystemTime;

use serde::{Deserialize, Serialize};

/// Mode bits: permissions in the low bits plus a directory flag.
///
/// The directory flag sits in the top bit so it never collides with
/// permission, setuid/setgid, or sticky bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FileMode(u32);

impl FileMode {
    /// Directory flag.
    pub const DIR: u32 = 1 << 31;
    /// Permission bits.
    pub const PERM: u32 = 0o777;

    /// Mode for directories created implicitly by `add`.
    pub const IMPLICIT_DIR: FileMode = FileMode(Self::DIR | 0o755);

    pub const fn new(bits: u32) -> Self {
        Self(bits)
    }

    /// Plain file with the given permissions.
    pub const fn file(perm: u32) -> Self {
        Self(perm & Self::PERM)
    }

    /// Directory with the given permissions.
    pub const fn dir(perm: u32) -> Self {
        Self(Self::DIR | (perm & Self::PERM))
    }

    pub const fn bits(self) -> u32 {
        self.0
    }

    pub const fn is_dir(self) -> bool {
        self.0 & Self::DIR != 0
    }

    pub const fn perm(self) -> u32 {
        self.0 & Self::PERM
    }

    /// Mode bits for real file metadata.
    ///
    /// Unix permission bits come from the metadata; elsewhere files are
    /// `0o644` (or `0o444` when read-only) and directories `0o755`.
    pub fn from_metadata(meta: &Metadata) -> Self {
        let perm = Self::perm_of(meta);
        if meta.is_dir() {
            Self::dir(perm)
        } else {
            Self::file(perm)
        }
    }

    #[cfg(unix)]
    fn perm_of(meta: &Metadata) -> u32 {
        use std::os::unix::fs::PermissionsExt;
        meta.permissions().mode()
    }

    #[cfg(not(unix))]
    fn perm_of(meta: &Metadata) -> u32 {
        match (meta.is_dir(), meta.permissions().readonly()) {
            (true, _) => 0o755,
            (false, true) => 0o444,
            (false, false) => 0o644,
        }
    }
}

impl From<u32> for FileMode {
    fn from(bits: u32) -> Self {
        Self(bits)
    }
}

/// `ls -l` style: `drwxr-xr-x`, `-rw-r--r--`.
impl fmt::Display for FileMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut out = String::with_capacity(10);
        out.push(if self.is_dir() { 'd' } else { '-' });
        for shift in [6u32, 3, 0] {
            let triple = (self.perm() >> shift) & 0o7;
            out.push(if triple & 0o4 != 0 { 'r' } else { '-' });
            out.push(if triple & 0o2 != 0 { 'w' } else { '-' });
            out.push(if triple & 0o1 != 0 { 'x' } else { '-' });
        }
        f.write_str(&out)
    }
}

/// Metadata for one node: what `stat` and `readdir` hand out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileInfo {
    /// Name of the entry (not full path). Empty for the root.
    pub name: String,
    /// Size in bytes, as supplied at insertion.
    pub size: u64,
    /// Mode bits, including the directory flag.
    pub mode: FileMode,
    /// Last modification time.
    pub modified: SystemTime,
}

impl FileInfo {
    pub fn new(name: impl Into<String>, size: u64, mode: FileMode, modified: SystemTime) -> Self {
        Self {
            name: name.into(),
            size,
            mode,
            modified,
        }
    }

    /// Metadata for a directory the tree made up on its own.
    pub(crate) fn implicit_dir(name: impl Into<String>) -> Self {
        Self::new(name, 4096, FileMode::IMPLICIT_DIR, SystemTime::now())
    }

    /// Metadata for a real file, named `name`.
    pub fn from_metadata(name: impl Into<String>, meta: &Metadata) -> Self {
        Self {
            name: name.into(),
            size: meta.len(),
            mode: FileMode::from_metadata(meta),
            modified: meta.modified().unwrap_or(SystemTime::UNIX_EPOCH),
        }
    }

    pub fn is_dir(&self) -> bool {
        self.mode.is_dir()
    }
}
