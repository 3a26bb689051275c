//! OS fallback: paths missing from the tree are opened on disk.

use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use embedfs::{FileMode, FileSystem, VfsConfig, VfsError, VirtualFs};
use tempfile::TempDir;

fn disk() -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("on_disk.txt"), b"from the OS").unwrap();
    fs::create_dir(dir.path().join("sub")).unwrap();
    fs::write(dir.path().join("sub").join("b"), b"b").unwrap();
    fs::write(dir.path().join("sub").join("a"), b"a").unwrap();
    dir
}

#[test]
fn fallback_opens_files_missing_from_tree() {
    let dir = disk();
    let vfs = VirtualFs::with_fallback();
    let path = dir.path().join("on_disk.txt");

    let mut handle = vfs.open(&path).unwrap();
    let info = handle.stat().unwrap();
    assert_eq!(info.name, "on_disk.txt");
    assert_eq!(info.size, 11);

    let mut out = String::new();
    handle.read_to_string(&mut out).unwrap();
    assert_eq!(out, "from the OS");
}

#[test]
fn without_fallback_the_same_path_does_not_exist() {
    let dir = disk();
    let vfs = VirtualFs::new();
    let err = vfs.open(&dir.path().join("on_disk.txt")).unwrap_err();
    assert!(matches!(err, VfsError::NotExist { .. }));
}

#[test]
fn tree_wins_over_disk() {
    let dir = disk();
    let vfs = VirtualFs::with_config(VfsConfig {
        fallback: true,
        fallback_root: dir.path().to_path_buf(),
    });
    vfs.add("on_disk.txt", 7, FileMode::file(0o644), SystemTime::now(), "from vfs")
        .unwrap();

    let mut out = String::new();
    vfs.open(Path::new("on_disk.txt"))
        .unwrap()
        .read_to_string(&mut out)
        .unwrap();
    assert_eq!(out, "from vfs");
}

#[test]
fn fallback_uses_the_original_path() {
    let dir = disk();
    let vfs = VirtualFs::with_config(VfsConfig {
        fallback: true,
        fallback_root: dir.path().to_path_buf(),
    });

    // `sub/../on_disk.txt` is not normalized before it reaches the OS
    let raw = PathBuf::from("sub").join("..").join("on_disk.txt");
    let handle = vfs.open(&raw).unwrap();
    assert_eq!(handle.path(), raw.as_path());
    assert_eq!(handle.stat().unwrap().name, "on_disk.txt");
}

#[test]
fn fallback_lists_real_directories() {
    let dir = disk();
    let vfs = VirtualFs::with_config(VfsConfig {
        fallback: true,
        fallback_root: dir.path().to_path_buf(),
    });

    let mut handle = vfs.open(Path::new("sub")).unwrap();
    assert!(handle.is_dir());
    assert_eq!(handle.readdir(1).unwrap().names(), ["a"]);
    assert_eq!(handle.readdir(0).unwrap().names(), ["a", "b"]);
}

#[test]
fn fallback_errors_wrap_the_os_error() {
    let dir = disk();
    let vfs = VirtualFs::with_fallback();
    let err = vfs.open(&dir.path().join("missing.stop")).unwrap_err();
    assert!(matches!(err, VfsError::Fallback { .. }));
    assert!(err.is_not_found());
    assert!(err.to_string().starts_with("falling back to OS"));
}
