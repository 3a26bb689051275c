//! embedfs entry point.
//!
//! Load files into a virtual tree and browse it:
//! ```bash
//! cargo run -p embedfs-repl -- ./assets/... README.md
//! cargo run -p embedfs-repl -- --input files.txt -c "ls -l /"
//! ```

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use embedfs::{VfsConfig, VirtualFs};
use embedfs_repl::loader::{self, LoadOptions, Source};
use embedfs_repl::Repl;

/// Load files or directories into an in-memory filesystem and browse it.
#[derive(Debug, Parser)]
#[command(name = "embedfs", version)]
struct Args {
    /// Files or directories to load. A directory suffixed with `/...` is
    /// loaded recursively.
    sources: Vec<String>,

    /// Read sources from FILE, one per line, instead of the arguments.
    /// `-` reads stdin. `#` starts a comment.
    #[arg(long, value_name = "FILE")]
    input: Option<String>,

    /// Open paths missing from the tree on the real filesystem.
    #[arg(long)]
    fallback: bool,

    /// Stop at the first file that can't be loaded.
    #[arg(long)]
    fatal_errors: bool,

    /// Log each file as it is loaded.
    #[arg(short, long)]
    verbose: bool,

    /// Run one command and exit instead of starting the REPL.
    #[arg(short = 'c', long = "command", value_name = "LINE")]
    command: Option<String>,
}

/// Only this workspace's targets get raised; the walker's own logging
/// stays at `warn`.
fn default_filter(verbose: bool) -> &'static str {
    if verbose {
        "warn,embedfs=debug,embedfs_repl=debug"
    } else {
        "warn"
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    // RUST_LOG wins; otherwise --verbose turns on our own debug events
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter(args.verbose)));
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    if args.sources.is_empty() && args.input.is_none() && !args.fallback {
        Args::command().print_help()?;
        std::process::exit(2);
    }

    let specs = match &args.input {
        Some(input) => loader::read_manifest_from(input)
            .with_context(|| format!("Failed to read input {}", input))?,
        None => args.sources.clone(),
    };
    let sources: Vec<Source> = specs.iter().map(|s| Source::parse(s)).collect();

    let fs = Arc::new(VirtualFs::with_config(VfsConfig {
        fallback: args.fallback,
        ..VfsConfig::default()
    }));

    let report = loader::load(
        &fs,
        &sources,
        LoadOptions {
            fatal: args.fatal_errors,
        },
    )?;
    tracing::info!(added = report.added, skipped = report.skipped, "filesystem loaded");

    let mut repl = Repl::new(fs);
    match args.command {
        Some(line) => {
            if let Some(output) = repl.process_line(&line)? {
                println!("{}", output);
            }
            Ok(())
        }
        None => embedfs_repl::run(repl),
    }
}
