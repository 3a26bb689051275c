//! embedfs: an in-memory virtual filesystem.
//!
//! This crate provides:
//!
//! - **VirtualFs**: a tree of files and directories, populated once through
//!   [`VirtualFs::add`] and then served through [`FileSystem::open`]
//! - **Handles**: per-open views with a private read or listing cursor
//! - **OsFs**: the real filesystem behind the same `open` contract, used as
//!   the fallback for paths missing from the tree
//! - **AsyncFileSystem**: whole-file helpers for async consumers

pub mod error;
pub mod vfs;

pub use error::{VfsError, VfsResult};
pub use vfs::{
    AsyncFileSystem, DirHandle, FileHandle, FileInfo, FileMode, FileSystem, Handle, Listing,
    OsFile, OsFs, VfsConfig, VirtualFs,
};
