//! Real filesystem backend.
//!
//! Serves paths from disk through the same `open` contract as the tree. The
//! tree uses it for fallback; it also works on its own.

use std::fs::{self, File};
use std::io::{self, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use super::handle::{DirCursor, Handle, Listing};
use super::info::FileInfo;
use super::traits::FileSystem;
use crate::error::{VfsError, VfsResult};

/// Real filesystem backend.
///
/// Paths are joined onto `root`. The default root is empty, so relative
/// paths resolve against the process working directory and absolute paths
/// are used as-is. Directories are stat'ed, never opened as files, so they
/// open the same way on every platform.
#[derive(Debug, Clone, Default)]
pub struct OsFs {
    root: PathBuf,
}

impl OsFs {
    /// Create a backend rooted at the given path.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Get the root path.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        self.root.join(path)
    }

    fn open_os(&self, path: &Path) -> io::Result<OsFile> {
        let full = self.resolve(path);
        let meta = fs::metadata(&full)?;
        let (file, meta) = if meta.is_dir() {
            (None, meta)
        } else {
            let file = File::open(&full)?;
            let meta = file.metadata()?;
            (Some(file), meta)
        };
        let name = full
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| full.display().to_string());

        Ok(OsFile {
            path: path.to_path_buf(),
            full,
            file,
            info: FileInfo::from_metadata(name, &meta),
            listing: None,
        })
    }
}

impl FileSystem for OsFs {
    fn open(&self, path: &Path) -> VfsResult<Handle> {
        self.open_os(path)
            .map(Handle::Os)
            .map_err(|source| VfsError::Fallback {
                path: path.to_path_buf(),
                source,
            })
    }
}

/// A file or directory opened on disk.
#[derive(Debug)]
pub struct OsFile {
    path: PathBuf,
    full: PathBuf,
    /// `None` for directories.
    file: Option<File>,
    info: FileInfo,
    listing: Option<DirCursor>,
}

impl OsFile {
    /// Path as passed to `open`.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Metadata captured at open.
    pub fn stat(&self) -> &FileInfo {
        &self.info
    }

    /// Same paging rules as a tree directory.
    ///
    /// The listing is read from disk on the first call and kept, so later
    /// pages come from one consistent snapshot.
    pub fn readdir(&mut self, count: isize) -> VfsResult<Listing> {
        if !self.info.is_dir() {
            return Err(VfsError::not_a_directory("readdir", &self.path));
        }

        let cursor = match self.listing.take() {
            Some(cursor) => cursor,
            None => DirCursor::new(self.read_entries().map_err(|source| VfsError::Fallback {
                path: self.path.clone(),
                source,
            })?),
        };
        Ok(self.listing.insert(cursor).next_page(count))
    }

    fn read_entries(&self) -> io::Result<Vec<FileInfo>> {
        let mut entries = Vec::new();
        for entry in fs::read_dir(&self.full)? {
            let entry = entry?;
            let meta = entry.metadata()?;
            let name = entry.file_name();
            let info = FileInfo::from_metadata(name.to_string_lossy(), &meta);
            entries.push((name, info));
        }
        // raw names, matching the tree's ordering
        entries.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(entries.into_iter().map(|(_, info)| info).collect())
    }

    pub fn close(&mut self) -> VfsResult<()> {
        if let Some(cursor) = self.listing.as_mut() {
            cursor.rewind();
        }
        Ok(())
    }
}

impl Read for OsFile {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match &mut self.file {
            Some(file) => file.read(buf),
            None => Err(VfsError::is_a_directory("read", &self.path).into()),
        }
    }
}

impl Seek for OsFile {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        match &mut self.file {
            Some(file) => file.seek(pos),
            None => Err(VfsError::is_a_directory("seek", &self.path).into()),
        }
    }
}
