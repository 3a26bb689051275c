//! The open-by-path contract, plus async helpers built on it.

use async_trait::async_trait;
use std::io::{self, Read};
use std::path::Path;
use std::sync::Arc;

use super::handle::Handle;
use super::info::FileInfo;
use crate::error::VfsResult;

/// Open a path, then stat, read or list through the returned handle.
///
/// This is the whole surface a static-file server needs.
pub trait FileSystem: Send + Sync {
    /// Open a file or directory.
    fn open(&self, path: &Path) -> VfsResult<Handle>;
}

impl<T: FileSystem + ?Sized> FileSystem for Arc<T> {
    fn open(&self, path: &Path) -> VfsResult<Handle> {
        (**self).open(path)
    }
}

impl<T: FileSystem + ?Sized> FileSystem for &T {
    fn open(&self, path: &Path) -> VfsResult<Handle> {
        (**self).open(path)
    }
}

/// Whole-file access for async callers.
///
/// Implemented for every `FileSystem`. Work happens inline: the tree is in
/// memory and the lock is held only for the walk. Read-only.
#[async_trait]
pub trait AsyncFileSystem: Send + Sync {
    /// Read the entire contents of a file.
    async fn read(&self, path: &Path) -> io::Result<Vec<u8>>;

    /// List entries in a directory, in name order.
    async fn list(&self, path: &Path) -> io::Result<Vec<FileInfo>>;

    /// Get metadata for a file or directory.
    async fn stat(&self, path: &Path) -> io::Result<FileInfo>;

    /// Check if a path exists.
    async fn exists(&self, path: &Path) -> bool {
        self.stat(path).await.is_ok()
    }

    /// Always true; nothing here writes.
    fn read_only(&self) -> bool {
        true
    }
}

#[async_trait]
impl<T: FileSystem> AsyncFileSystem for T {
    async fn read(&self, path: &Path) -> io::Result<Vec<u8>> {
        let mut handle = self.open(path)?;
        let mut data = Vec::new();
        handle.read_to_end(&mut data)?;
        Ok(data)
    }

    async fn list(&self, path: &Path) -> io::Result<Vec<FileInfo>> {
        let mut handle = self.open(path)?;
        Ok(handle.readdir(-1)?.entries)
    }

    async fn stat(&self, path: &Path) -> io::Result<FileInfo> {
        Ok(self.open(path)?.stat()?)
    }
}
