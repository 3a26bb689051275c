//! Path normalization shared by `add` and `open`.

use std::ffi::OsString;
use std::path::{Component, Path};

/// Split a path into the segments it names inside the tree.
///
/// The leading root is dropped, `.` is skipped, `..` pops the previous
/// segment, and repeated separators collapse. `..` at the root stays at the
/// root. Separators follow the host convention, so on Windows both `/` and
/// `\` split. An empty result names the root.
///
/// Segments keep their raw OS bytes; names that are not valid UTF-8 stay
/// distinct.
pub fn normalize(path: &Path) -> Vec<OsString> {
    let mut segments: Vec<OsString> = Vec::new();
    for component in path.components() {
        match component {
            Component::Prefix(_) | Component::RootDir | Component::CurDir => {}
            Component::ParentDir => {
                segments.pop();
            }
            Component::Normal(s) => segments.push(s.to_os_string()),
        }
    }
    segments
}

/// Join segments back into a display path, for error messages.
pub(crate) fn display_path(segments: &[OsString]) -> String {
    if segments.is_empty() {
        return "/".to_string();
    }
    segments
        .iter()
        .map(|s| s.to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}
