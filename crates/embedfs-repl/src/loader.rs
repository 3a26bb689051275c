//! Populate a `VirtualFs` from real files.
//!
//! A source is a file or a directory. Directories contribute the files
//! directly inside them; a `/...` suffix walks them recursively. Files keep
//! the path they were found under, so `./assets/app.css` lands at
//! `/assets/app.css`.

use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use anyhow::{bail, Context, Result};
use ignore::WalkBuilder;

use embedfs::{FileMode, VirtualFs};

/// Suffix that marks a directory for recursive loading.
const RECURSIVE_SUFFIX: &str = "/...";

/// One file or directory to load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Source {
    pub path: PathBuf,
    pub recursive: bool,
}

impl Source {
    /// Parse `dir/...` as recursive, anything else as-is.
    pub fn parse(arg: &str) -> Self {
        match arg.strip_suffix(RECURSIVE_SUFFIX) {
            Some(path) if !path.is_empty() => Self {
                path: PathBuf::from(path),
                recursive: true,
            },
            Some(_) => Self {
                path: PathBuf::from("."),
                recursive: true,
            },
            None => Self {
                path: PathBuf::from(arg),
                recursive: false,
            },
        }
    }
}

/// Knobs for `load`.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoadOptions {
    /// Abort on the first failure instead of logging and skipping it.
    pub fatal: bool,
}

/// What `load` did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadReport {
    pub added: usize,
    pub skipped: usize,
}

/// Parse a source list: one entry per line, `#` to end of line is a comment,
/// surrounding whitespace and blank lines are dropped.
pub fn read_manifest(reader: impl BufRead) -> io::Result<Vec<String>> {
    let mut specs = Vec::new();
    for line in reader.lines() {
        let line = line?;
        let line = match line.find('#') {
            Some(idx) => &line[..idx],
            None => line.as_str(),
        };
        let line = line.trim();
        if !line.is_empty() {
            specs.push(line.to_string());
        }
    }
    Ok(specs)
}

/// `read_manifest` on a file, or stdin for `-`.
pub fn read_manifest_from(input: &str) -> Result<Vec<String>> {
    if input == "-" {
        return read_manifest(io::stdin().lock()).context("Failed to read stdin");
    }
    let file = File::open(input).with_context(|| format!("Failed to open {}", input))?;
    read_manifest(BufReader::new(file)).with_context(|| format!("Failed to read {}", input))
}

/// Add every file named by `sources` to `fs`.
pub fn load(fs: &VirtualFs, sources: &[Source], options: LoadOptions) -> Result<LoadReport> {
    let mut report = LoadReport::default();

    for source in sources {
        if source.recursive {
            tracing::debug!(path = %source.path.display(), "walking directory recursively");
        } else {
            tracing::debug!(path = %source.path.display(), "loading");
        }

        let walker = WalkBuilder::new(&source.path)
            .standard_filters(false)
            .follow_links(false)
            .max_depth(if source.recursive { None } else { Some(1) })
            .sort_by_file_name(|a, b| a.cmp(b))
            .build();

        for entry in walker {
            let outcome = entry
                .map_err(anyhow::Error::from)
                .and_then(|entry| add_entry(fs, entry.path()));

            match outcome {
                Ok(true) => report.added += 1,
                Ok(false) => {}
                Err(e) if options.fatal => {
                    return Err(e.context(format!("Failed to load {}", source.path.display())));
                }
                Err(e) => {
                    tracing::warn!(
                        source = %source.path.display(),
                        error = %format!("{:#}", e),
                        "skipping"
                    );
                    report.skipped += 1;
                }
            }
        }
    }

    Ok(report)
}

/// Add one walked path. Directories are skipped, returning `false`.
fn add_entry(fs: &VirtualFs, path: &Path) -> Result<bool> {
    let meta = std::fs::metadata(path).with_context(|| format!("file info: {}", path.display()))?;
    if meta.is_dir() {
        return Ok(false);
    }
    if !meta.is_file() {
        bail!("not a regular file: {}", path.display());
    }

    tracing::debug!(path = %path.display(), size = meta.len(), "adding file");
    let data = std::fs::read(path).with_context(|| format!("reading file {}", path.display()))?;
    fs.add(
        path,
        meta.len(),
        FileMode::from_metadata(&meta),
        meta.modified().unwrap_or(SystemTime::UNIX_EPOCH),
        data,
    )
    .with_context(|| format!("packing file {}", path.display()))?;
    Ok(true)
}
