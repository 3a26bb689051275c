//! Errors returned by the virtual filesystem.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Result type for VFS operations.
pub type VfsResult<T> = Result<T, VfsError>;

/// VFS operation errors.
///
/// Every variant names the path the caller passed in, so the error can be
/// reported without extra context.
#[derive(Debug, Error)]
pub enum VfsError {
    /// `add` hit an existing node at the final segment.
    #[error("already exists: {}", path.display())]
    AlreadyExists { path: PathBuf },

    /// `add` tried to descend through an existing file.
    #[error("not a directory: {} (a file already exists there)", path.display())]
    NotADirectory { path: PathBuf },

    /// `open` could not resolve the path and fallback is off.
    #[error("does not exist: {}", path.display())]
    NotExist { path: PathBuf },

    /// Operation doesn't apply to this kind of handle.
    #[error("invalid operation: {op} {}: {reason}", path.display())]
    InvalidOperation {
        op: &'static str,
        path: PathBuf,
        reason: &'static str,
    },

    /// The real filesystem rejected a fallback open.
    #[error("falling back to OS: {}: {source}", path.display())]
    Fallback {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl VfsError {
    pub(crate) fn is_a_directory(op: &'static str, path: impl Into<PathBuf>) -> Self {
        VfsError::InvalidOperation {
            op,
            path: path.into(),
            reason: "is a directory",
        }
    }

    pub(crate) fn not_a_directory(op: &'static str, path: impl Into<PathBuf>) -> Self {
        VfsError::InvalidOperation {
            op,
            path: path.into(),
            reason: "not a directory",
        }
    }

    /// True for `add` collisions: an existing node at the target, or a file
    /// in the way of an intermediate directory.
    pub fn is_conflict(&self) -> bool {
        matches!(
            self,
            VfsError::AlreadyExists { .. } | VfsError::NotADirectory { .. }
        )
    }

    /// True when the path could not be found, in the tree or on disk.
    pub fn is_not_found(&self) -> bool {
        match self {
            VfsError::NotExist { .. } => true,
            VfsError::Fallback { source, .. } => source.kind() == io::ErrorKind::NotFound,
            _ => false,
        }
    }

    /// The path this error is about.
    pub fn path(&self) -> &std::path::Path {
        match self {
            VfsError::AlreadyExists { path }
            | VfsError::NotADirectory { path }
            | VfsError::NotExist { path }
            | VfsError::InvalidOperation { path, .. }
            | VfsError::Fallback { path, .. } => path,
        }
    }

    /// The closest `std::io::ErrorKind`.
    pub fn kind(&self) -> io::ErrorKind {
        match self {
            VfsError::AlreadyExists { .. } => io::ErrorKind::AlreadyExists,
            VfsError::NotADirectory { .. } => io::ErrorKind::NotADirectory,
            VfsError::NotExist { .. } => io::ErrorKind::NotFound,
            VfsError::InvalidOperation { .. } => io::ErrorKind::InvalidInput,
            VfsError::Fallback { source, .. } => source.kind(),
        }
    }
}

impl From<VfsError> for io::Error {
    fn from(err: VfsError) -> Self {
        io::Error::new(err.kind(), err)
    }
}
