//! Virtual filesystem for embedfs.
//!
//! The VFS keeps file data in memory and serves it through an open-by-path
//! contract:
//!
//! - **VirtualFs**: the node tree, populated with `add`, served with `open`
//! - **OsFs**: the real filesystem behind the same contract
//! - **Handle**: what `open` returns, a file, a directory, or an OS file
//!
//! # Design
//!
//! ```text
//! VirtualFs ── RwLock ── root (Dir "")
//!                        ├── bar        (File)
//!                        ├── d/         (Dir)
//!                        │   ├── alpha  (File)
//!                        │   └── beta   (File)
//!                        └── foo        (File)
//! ```
//!
//! `add` takes the lock exclusively, `open` shares it. Handles copy what they
//! need out of the tree, so they outlive the lock. Paths missing from the tree
//! can fall back to `OsFs`.

mod handle;
mod info;
mod os;
mod path;
mod traits;
mod tree;

pub use handle::{DirHandle, FileHandle, Handle, Listing};
pub use info::{FileInfo, FileMode};
pub use os::{OsFile, OsFs};
pub use path::normalize;
pub use traits::{AsyncFileSystem, FileSystem};
pub use tree::{VfsConfig, VirtualFs};
