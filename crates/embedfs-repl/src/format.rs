//! Text rendering for listings and metadata.

use chrono::{DateTime, Local, Utc};

use embedfs::{FileInfo, Listing};

/// One `ls -l` line: mode, size, local mtime, name.
pub fn long_entry(info: &FileInfo) -> String {
    let modified: DateTime<Local> = info.modified.into();
    format!(
        "{} {:>8} {} {}",
        info.mode,
        info.size,
        modified.format("%Y-%m-%d %H:%M"),
        display_name(info)
    )
}

/// Entry name, with a trailing `/` for directories.
pub fn display_name(info: &FileInfo) -> String {
    match (info.name.as_str(), info.is_dir()) {
        ("", _) => "/".to_string(),
        (name, true) => format!("{}/", name),
        (name, false) => name.to_string(),
    }
}

/// Multi-line metadata block for `stat`.
pub fn stat_block(info: &FileInfo) -> String {
    let modified: DateTime<Utc> = info.modified.into();
    format!(
        "  name: {}\n  size: {}\n  mode: {} ({:#o})\n  modified: {}\n  dir: {}",
        display_name(info),
        info.size,
        info.mode,
        info.mode.perm(),
        modified.to_rfc3339(),
        info.is_dir()
    )
}

/// One `page` result: names in brackets, then `EOF` if the listing ended.
pub fn page_line(count: isize, listing: &Listing) -> String {
    let names = listing.names().join(", ");
    if listing.eof {
        format!("readdir({}) = [{}] EOF", count, names)
    } else {
        format!("readdir({}) = [{}]", count, names)
    }
}
