//! In-memory node tree.
//!
//! Populated once with `add`, then served with `open`. All data lives for as
//! long as the `VirtualFs`; handles share file payloads and copy listings.

use std::collections::BTreeMap;
use std::collections::btree_map::Entry;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;

use parking_lot::RwLock;

use super::handle::{DirHandle, FileHandle, Handle};
use super::info::{FileInfo, FileMode};
use super::os::OsFs;
use super::path::{display_path, normalize};
use super::traits::FileSystem;
use crate::error::{VfsError, VfsResult};

/// Configuration for a `VirtualFs`.
#[derive(Debug, Clone, Default)]
pub struct VfsConfig {
    /// Open paths missing from the tree on the real filesystem instead of
    /// failing.
    pub fallback: bool,
    /// Directory that fallback paths resolve against. Empty means the
    /// process working directory.
    pub fallback_root: PathBuf,
}

impl VfsConfig {
    /// Fallback on, resolving against the working directory.
    pub fn fallback() -> Self {
        Self {
            fallback: true,
            ..Self::default()
        }
    }
}

/// Node in the tree.
#[derive(Debug)]
enum Node {
    Dir(DirNode),
    File(FileNode),
}

#[derive(Debug)]
struct DirNode {
    info: FileInfo,
    children: BTreeMap<OsString, Node>,
}

#[derive(Debug)]
struct FileNode {
    info: FileInfo,
    data: Arc<[u8]>,
}

impl Node {
    fn info(&self) -> &FileInfo {
        match self {
            Node::Dir(d) => &d.info,
            Node::File(f) => &f.info,
        }
    }
}

impl DirNode {
    fn new(info: FileInfo) -> Self {
        Self {
            info,
            children: BTreeMap::new(),
        }
    }

    /// Child metadata in name order.
    fn snapshot(&self) -> Vec<FileInfo> {
        self.children.values().map(|c| c.info().clone()).collect()
    }
}

/// In-memory virtual filesystem.
///
/// Thread-safe via one `RwLock` over the whole tree: `add` holds it
/// exclusively, `open` shares it. The workload is populate once, read many,
/// so a single lock is all the tree needs.
#[derive(Debug)]
pub struct VirtualFs {
    root: RwLock<DirNode>,
    fallback: Option<OsFs>,
}

impl Default for VirtualFs {
    fn default() -> Self {
        Self::new()
    }
}

impl VirtualFs {
    /// Create an empty filesystem without OS fallback.
    pub fn new() -> Self {
        Self::with_config(VfsConfig::default())
    }

    /// Create an empty filesystem that falls back to the OS for missing
    /// paths.
    pub fn with_fallback() -> Self {
        Self::with_config(VfsConfig::fallback())
    }

    pub fn with_config(config: VfsConfig) -> Self {
        Self {
            root: RwLock::new(DirNode::new(FileInfo::implicit_dir(""))),
            fallback: config.fallback.then(|| OsFs::new(config.fallback_root)),
        }
    }

    /// Whether missing paths fall back to the real filesystem.
    pub fn falls_back(&self) -> bool {
        self.fallback.is_some()
    }

    /// Insert a node.
    ///
    /// `path` may be relative or absolute; either way it is placed under the
    /// root, so `a/b`, `./a/b` and `/a/b` all name the same node. Missing
    /// parent directories are created. When `mode` carries the directory flag
    /// the node is an empty directory and `data` is ignored.
    ///
    /// Never overwrites: an existing node at `path` is `AlreadyExists`, and a
    /// file where a parent directory should be is `NotADirectory`. A failed
    /// call leaves parents it already created in place.
    pub fn add(
        &self,
        path: impl AsRef<Path>,
        size: u64,
        mode: FileMode,
        modified: SystemTime,
        data: impl AsRef<[u8]>,
    ) -> VfsResult<()> {
        let raw = path.as_ref();
        let segments = normalize(raw);
        let Some((name, parents)) = segments.split_last() else {
            return Err(VfsError::AlreadyExists {
                path: raw.to_path_buf(),
            });
        };

        let mut root = self.root.write();
        let mut dir: &mut DirNode = &mut root;

        for (depth, segment) in parents.iter().enumerate() {
            let child = dir.children.entry(segment.clone()).or_insert_with(|| {
                tracing::debug!(
                    path = %display_path(&segments[..=depth]),
                    "creating implicit directory"
                );
                Node::Dir(DirNode::new(FileInfo::implicit_dir(segment.to_string_lossy())))
            });
            dir = match child {
                Node::Dir(d) => d,
                Node::File(_) => {
                    return Err(VfsError::NotADirectory {
                        path: raw.to_path_buf(),
                    });
                }
            };
        }

        match dir.children.entry(name.clone()) {
            Entry::Occupied(_) => Err(VfsError::AlreadyExists {
                path: raw.to_path_buf(),
            }),
            Entry::Vacant(slot) => {
                let info = FileInfo::new(name.to_string_lossy(), size, mode, modified);
                let node = if mode.is_dir() {
                    Node::Dir(DirNode::new(info))
                } else {
                    Node::File(FileNode {
                        info,
                        data: Arc::from(data.as_ref()),
                    })
                };
                slot.insert(node);
                tracing::trace!(path = %display_path(&segments), "added");
                Ok(())
            }
        }
    }

    /// Walk the tree under the read lock.
    ///
    /// `None` means a segment was missing, or a file sat where a directory
    /// was needed.
    fn lookup(&self, raw: &Path) -> Option<Handle> {
        let segments = normalize(raw);
        let root = self.root.read();

        let mut found: Option<&Node> = None;
        for segment in &segments {
            let dir = match found {
                None => &*root,
                Some(Node::Dir(d)) => d,
                Some(Node::File(_)) => return None,
            };
            found = Some(dir.children.get(segment)?);
        }

        let handle = match found {
            None => Handle::Dir(DirHandle::new(raw, root.info.clone(), root.snapshot())),
            Some(Node::Dir(d)) => Handle::Dir(DirHandle::new(raw, d.info.clone(), d.snapshot())),
            Some(Node::File(f)) => {
                Handle::File(FileHandle::new(raw, f.info.clone(), Arc::clone(&f.data)))
            }
        };
        Some(handle)
    }
}

impl FileSystem for VirtualFs {
    /// Open a file or directory.
    ///
    /// Paths missing from the tree go to the OS, untouched, when fallback is
    /// on. The tree lock is released before the OS is asked.
    fn open(&self, path: &Path) -> VfsResult<Handle> {
        if let Some(handle) = self.lookup(path) {
            tracing::trace!(path = %path.display(), dir = handle.is_dir(), "opened");
            return Ok(handle);
        }

        match &self.fallback {
            Some(os) => {
                tracing::debug!(path = %path.display(), "not in tree, falling back to OS");
                os.open(path)
            }
            None => Err(VfsError::NotExist {
                path: path.to_path_buf(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;

    fn file_mode() -> FileMode {
        FileMode::file(0o644)
    }

    fn read_all(fs: &VirtualFs, path: &str) -> Vec<u8> {
        let mut handle = fs.open(Path::new(path)).unwrap();
        let mut out = Vec::new();
        handle.read_to_end(&mut out).unwrap();
        out
    }

    #[test]
    fn test_add_and_open() {
        let fs = VirtualFs::new();
        let now = SystemTime::now();
        fs.add("test.txt", 11, file_mode(), now, b"hello world").unwrap();

        let handle = fs.open(Path::new("test.txt")).unwrap();
        let info = handle.stat().unwrap();
        assert_eq!(info, FileInfo::new("test.txt", 11, file_mode(), now));
        assert_eq!(read_all(&fs, "test.txt"), b"hello world");
    }

    #[test]
    fn test_open_not_found() {
        let fs = VirtualFs::new();
        let err = fs.open(Path::new("nonexistent.txt")).unwrap_err();
        assert!(err.is_not_found());
        assert!(matches!(err, VfsError::NotExist { .. }));
    }

    #[test]
    fn test_implicit_directories() {
        let fs = VirtualFs::new();
        fs.add("x/y/z.txt", 1, file_mode(), SystemTime::now(), "z").unwrap();

        let mut root = fs.open(Path::new("/")).unwrap();
        assert_eq!(root.readdir(0).unwrap().names(), ["x"]);

        let mut x = fs.open(Path::new("x")).unwrap();
        assert!(x.is_dir());
        let listing = x.readdir(0).unwrap();
        assert_eq!(listing.names(), ["y"]);
        assert_eq!(listing.entries[0].mode, FileMode::IMPLICIT_DIR);

        let mut y = fs.open(Path::new("x/y")).unwrap();
        assert_eq!(y.readdir(0).unwrap().names(), ["z.txt"]);
    }

    #[test]
    fn test_add_twice_fails() {
        let fs = VirtualFs::new();
        let now = SystemTime::now();
        fs.add("a/b", 5, file_mode(), now, "first").unwrap();

        let err = fs.add("/a/b", 6, file_mode(), now, "second").unwrap_err();
        assert!(matches!(err, VfsError::AlreadyExists { .. }));
        assert_eq!(read_all(&fs, "a/b"), b"first");
    }

    #[test]
    fn test_add_over_implicit_directory_fails() {
        let fs = VirtualFs::new();
        let now = SystemTime::now();
        fs.add("d/alpha", 1, file_mode(), now, "a").unwrap();

        let err = fs.add("d", 1, file_mode(), now, "d").unwrap_err();
        assert!(matches!(err, VfsError::AlreadyExists { .. }));
        assert!(fs.open(Path::new("d")).unwrap().is_dir());
    }

    #[test]
    fn test_add_through_file_fails() {
        let fs = VirtualFs::new();
        let now = SystemTime::now();
        fs.add("foo", 4, file_mode(), now, "1234").unwrap();

        let err = fs.add("foo/bar", 1, file_mode(), now, "x").unwrap_err();
        assert!(matches!(err, VfsError::NotADirectory { .. }));
        assert!(err.is_conflict());
        assert_eq!(read_all(&fs, "foo"), b"1234");
    }

    #[test]
    fn test_add_root_fails() {
        let fs = VirtualFs::new();
        for path in ["", "/", ".", "a/.."] {
            let err = fs.add(path, 0, file_mode(), SystemTime::now(), "").unwrap_err();
            assert!(matches!(err, VfsError::AlreadyExists { .. }), "{path}");
        }
    }

    #[test]
    fn test_add_explicit_directory() {
        let fs = VirtualFs::new();
        let now = SystemTime::UNIX_EPOCH;
        fs.add("empty", 0, FileMode::dir(0o700), now, "ignored").unwrap();

        let mut handle = fs.open(Path::new("empty")).unwrap();
        let info = handle.stat().unwrap();
        assert!(info.is_dir());
        assert_eq!(info.mode.perm(), 0o700);
        assert_eq!(info.modified, now);
        assert!(handle.readdir(0).unwrap().is_empty());

        fs.add("empty/inner", 1, file_mode(), now, "i").unwrap();
        assert_eq!(read_all(&fs, "empty/inner"), b"i");
    }

    #[test]
    fn test_open_through_file_is_not_found() {
        let fs = VirtualFs::new();
        fs.add("foo", 4, file_mode(), SystemTime::now(), "1234").unwrap();
        let err = fs.open(Path::new("foo/bar")).unwrap_err();
        assert!(matches!(err, VfsError::NotExist { .. }));
    }

    #[test]
    fn test_path_normalization() {
        let fs = VirtualFs::new();
        fs.add("/a/b/c.txt", 4, file_mode(), SystemTime::now(), "data").unwrap();

        for path in [
            "a/b/c.txt",
            "/a/b/c.txt",
            "./a/b/c.txt",
            "a/./b/c.txt",
            "a/b/../b/c.txt",
            "a//b/c.txt",
        ] {
            assert_eq!(read_all(&fs, path), b"data", "{path}");
        }
    }

    #[cfg(unix)]
    #[test]
    fn test_non_utf8_names_are_distinct() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let fs = VirtualFs::new();
        let now = SystemTime::now();
        let ff = Path::new(OsStr::from_bytes(b"a\xff"));
        let fe = Path::new(OsStr::from_bytes(b"a\xfe"));
        fs.add(ff, 2, file_mode(), now, "ff").unwrap();

        let err = fs.open(fe).unwrap_err();
        assert!(matches!(err, VfsError::NotExist { .. }));

        fs.add(fe, 2, file_mode(), now, "fe").unwrap();
        let mut out = Vec::new();
        fs.open(ff).unwrap().read_to_end(&mut out).unwrap();
        assert_eq!(out, b"ff");
        out.clear();
        fs.open(fe).unwrap().read_to_end(&mut out).unwrap();
        assert_eq!(out, b"fe");

        let mut root = fs.open(Path::new("/")).unwrap();
        assert_eq!(root.readdir(0).unwrap().entries.len(), 2);
    }

    #[test]
    fn test_listing_is_sorted() {
        let fs = VirtualFs::new();
        for name in ["zeta", "alpha", "mid", "Beta"] {
            fs.add(name, 1, file_mode(), SystemTime::now(), "x").unwrap();
        }
        let mut root = fs.open(Path::new(".")).unwrap();
        assert_eq!(root.readdir(-1).unwrap().names(), ["Beta", "alpha", "mid", "zeta"]);
    }

    #[test]
    fn test_snapshot_is_not_live() {
        let fs = VirtualFs::new();
        fs.add("one", 1, file_mode(), SystemTime::now(), "1").unwrap();
        let mut before = fs.open(Path::new("/")).unwrap();

        fs.add("two", 1, file_mode(), SystemTime::now(), "2").unwrap();
        assert_eq!(before.readdir(0).unwrap().names(), ["one"]);
        let mut after = fs.open(Path::new("/")).unwrap();
        assert_eq!(after.readdir(0).unwrap().names(), ["one", "two"]);
    }

    #[test]
    fn test_root_info() {
        let fs = VirtualFs::new();
        let info = fs.open(Path::new("")).unwrap().stat().unwrap();
        assert_eq!(info.name, "");
        assert!(info.is_dir());
    }

    #[test]
    fn test_fallback_flag() {
        assert!(!VirtualFs::new().falls_back());
        assert!(VirtualFs::with_fallback().falls_back());
    }
}
