//! Handles returned by `open`.
//!
//! A handle is a private view: its read offset and listing cursor are never
//! shared with other handles, even ones opened on the same path.

use std::io::{self, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::info::FileInfo;
use super::os::OsFile;
use crate::error::{VfsError, VfsResult};

/// One page of a directory listing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Listing {
    /// Entries in name order.
    pub entries: Vec<FileInfo>,
    /// Set when a paged read found nothing left.
    pub eof: bool,
}

impl Listing {
    pub fn names(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.name.as_str()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Forward-only cursor over a listing snapshot.
#[derive(Debug, Clone, Default)]
pub(crate) struct DirCursor {
    entries: Vec<FileInfo>,
    pos: usize,
}

impl DirCursor {
    pub(crate) fn new(entries: Vec<FileInfo>) -> Self {
        Self { entries, pos: 0 }
    }

    /// Read up to `count` entries.
    ///
    /// `count <= 0` returns the whole snapshot no matter where the cursor is,
    /// and leaves the cursor alone. A positive count pages forward; a page
    /// that comes back empty is flagged `eof`.
    pub(crate) fn next_page(&mut self, count: isize) -> Listing {
        if count <= 0 {
            return Listing {
                entries: self.entries.clone(),
                eof: false,
            };
        }

        let end = self.pos.saturating_add(count.unsigned_abs()).min(self.entries.len());
        let entries = self.entries[self.pos..end].to_vec();
        self.pos = end;

        let eof = entries.is_empty();
        Listing { entries, eof }
    }

    pub(crate) fn rewind(&mut self) {
        self.pos = 0;
    }
}

/// Read access to a file's content.
#[derive(Debug, Clone)]
pub struct FileHandle {
    path: PathBuf,
    info: FileInfo,
    data: Arc<[u8]>,
    pos: u64,
}

impl FileHandle {
    pub(crate) fn new(path: impl Into<PathBuf>, info: FileInfo, data: Arc<[u8]>) -> Self {
        Self {
            path: path.into(),
            info,
            data,
            pos: 0,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn stat(&self) -> &FileInfo {
        &self.info
    }

    /// The whole payload, independent of the read offset.
    pub fn contents(&self) -> &[u8] {
        &self.data
    }

    pub fn position(&self) -> u64 {
        self.pos
    }
}

impl Read for FileHandle {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let len = self.data.len() as u64;
        if self.pos >= len {
            return Ok(0);
        }

        let start = self.pos as usize;
        let n = buf.len().min(self.data.len() - start);
        buf[..n].copy_from_slice(&self.data[start..start + n]);
        self.pos += n as u64;
        Ok(n)
    }
}

impl Seek for FileHandle {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        let target = match pos {
            SeekFrom::Start(offset) => Some(offset),
            SeekFrom::End(delta) => (self.data.len() as u64).checked_add_signed(delta),
            SeekFrom::Current(delta) => self.pos.checked_add_signed(delta),
        };

        match target {
            Some(offset) => {
                self.pos = offset;
                Ok(offset)
            }
            None => Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!(
                    "seek {}: invalid seek to a negative or overflowing position",
                    self.path.display()
                ),
            )),
        }
    }
}

/// A directory listing snapshot taken at `open`.
#[derive(Debug, Clone)]
pub struct DirHandle {
    path: PathBuf,
    info: FileInfo,
    cursor: DirCursor,
}

impl DirHandle {
    pub(crate) fn new(path: impl Into<PathBuf>, info: FileInfo, entries: Vec<FileInfo>) -> Self {
        Self {
            path: path.into(),
            info,
            cursor: DirCursor::new(entries),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn stat(&self) -> &FileInfo {
        &self.info
    }

    /// See [`Handle::readdir`].
    pub fn readdir(&mut self, count: isize) -> Listing {
        self.cursor.next_page(count)
    }

    /// Rewinds the listing cursor.
    pub fn close(&mut self) {
        self.cursor.rewind();
    }
}

/// What `open` hands back.
#[derive(Debug)]
pub enum Handle {
    /// A file from the tree.
    File(FileHandle),
    /// A directory from the tree.
    Dir(DirHandle),
    /// A file or directory opened on the real filesystem.
    Os(OsFile),
}

impl Handle {
    /// Path as passed to `open`.
    pub fn path(&self) -> &Path {
        match self {
            Handle::File(f) => f.path(),
            Handle::Dir(d) => d.path(),
            Handle::Os(o) => o.path(),
        }
    }

    pub fn stat(&self) -> VfsResult<FileInfo> {
        match self {
            Handle::File(f) => Ok(f.stat().clone()),
            Handle::Dir(d) => Ok(d.stat().clone()),
            Handle::Os(o) => Ok(o.stat().clone()),
        }
    }

    pub fn is_dir(&self) -> bool {
        match self {
            Handle::File(_) => false,
            Handle::Dir(_) => true,
            Handle::Os(o) => o.stat().is_dir(),
        }
    }

    /// List directory entries.
    ///
    /// With `count <= 0` every entry in the snapshot comes back, even after
    /// earlier paged reads. With `count > 0` at most `count` entries come
    /// back, continuing where the last paged read stopped; once nothing is
    /// left the listing is empty and `eof` is set, and stays that way.
    pub fn readdir(&mut self, count: isize) -> VfsResult<Listing> {
        match self {
            Handle::File(f) => Err(VfsError::not_a_directory("readdir", f.path())),
            Handle::Dir(d) => Ok(d.readdir(count)),
            Handle::Os(o) => o.readdir(count),
        }
    }

    /// Files: nothing to release. Directories: the listing cursor rewinds.
    pub fn close(&mut self) -> VfsResult<()> {
        match self {
            Handle::File(_) => Ok(()),
            Handle::Dir(d) => {
                d.close();
                Ok(())
            }
            Handle::Os(o) => o.close(),
        }
    }
}

impl Read for Handle {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            Handle::File(f) => f.read(buf),
            Handle::Dir(d) => Err(VfsError::is_a_directory("read", d.path()).into()),
            Handle::Os(o) => o.read(buf),
        }
    }
}

impl Seek for Handle {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        match self {
            Handle::File(f) => f.seek(pos),
            Handle::Dir(d) => Err(VfsError::is_a_directory("seek", d.path()).into()),
            Handle::Os(o) => o.seek(pos),
        }
    }
}
