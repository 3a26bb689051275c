//! embedfs REPL: browse a loaded virtual filesystem.
//!
//! Every command goes through `FileSystem::open` and the returned handle, the
//! same path a file server would take:
//!
//! - `ls [-l] [path]`: list a directory, or name a file
//! - `cat <path>`: print a file
//! - `stat [--json] <path>`: show metadata
//! - `page <path> <n>...`: call `readdir(n)` repeatedly on one handle
//! - Meta-commands: `/help`, `/quit`

pub mod format;
pub mod loader;

use std::io::Read;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use rustyline::error::ReadlineError;
use rustyline::history::DefaultHistory;
use rustyline::Editor;

use embedfs::{FileSystem, Handle};

/// REPL state.
pub struct Repl {
    fs: Arc<dyn FileSystem>,
    quit: bool,
}

impl Repl {
    /// Create a new REPL over the given filesystem.
    pub fn new(fs: Arc<dyn FileSystem>) -> Self {
        Self { fs, quit: false }
    }

    /// Set once `/quit` has been processed.
    pub fn should_quit(&self) -> bool {
        self.quit
    }

    /// Process a single line of input.
    ///
    /// Filesystem errors come back as output text, prefixed with the command
    /// name; `Err` is reserved for failures of the REPL itself.
    pub fn process_line(&mut self, line: &str) -> Result<Option<String>> {
        let trimmed = line.trim();

        if is_meta(trimmed) {
            return self.handle_meta_command(trimmed);
        }

        let parts: Vec<&str> = trimmed.split_whitespace().collect();
        let Some((&command, args)) = parts.split_first() else {
            return Ok(None);
        };

        let output = match command {
            "ls" => self.ls(args),
            "cat" => self.cat(args),
            "stat" => self.stat(args),
            "page" => self.page(args),
            _ => Ok(format!(
                "Unknown command: {}\nType /help for available commands.",
                command
            )),
        }?;

        Ok(if output.is_empty() { None } else { Some(output) })
    }

    fn open(&self, path: &str) -> embedfs::VfsResult<Handle> {
        self.fs.open(Path::new(path))
    }

    fn ls(&self, args: &[&str]) -> Result<String> {
        let long = args.contains(&"-l");
        let path = args.iter().find(|a| **a != "-l").copied().unwrap_or("/");

        let mut handle = match self.open(path) {
            Ok(handle) => handle,
            Err(e) => return Ok(format!("ls: {}", e)),
        };

        let entries = if handle.is_dir() {
            match handle.readdir(0) {
                Ok(listing) => listing.entries,
                Err(e) => return Ok(format!("ls: {}", e)),
            }
        } else {
            vec![handle.stat()?]
        };

        let lines: Vec<String> = entries
            .iter()
            .map(|e| {
                if long {
                    format::long_entry(e)
                } else {
                    format::display_name(e)
                }
            })
            .collect();
        Ok(lines.join("\n"))
    }

    fn cat(&self, args: &[&str]) -> Result<String> {
        let Some(path) = args.first() else {
            return Ok("usage: cat <path>".to_string());
        };

        let mut handle = match self.open(path) {
            Ok(handle) => handle,
            Err(e) => return Ok(format!("cat: {}", e)),
        };

        let mut data = Vec::new();
        if let Err(e) = handle.read_to_end(&mut data) {
            return Ok(format!("cat: {}", e));
        }
        handle.close().context("closing file")?;
        Ok(String::from_utf8_lossy(&data).into_owned())
    }

    fn stat(&self, args: &[&str]) -> Result<String> {
        let json = args.contains(&"--json");
        let Some(path) = args.iter().find(|a| **a != "--json") else {
            return Ok("usage: stat [--json] <path>".to_string());
        };

        let info = match self.open(path).and_then(|h| h.stat()) {
            Ok(info) => info,
            Err(e) => return Ok(format!("stat: {}", e)),
        };

        if json {
            serde_json::to_string_pretty(&info).context("serializing metadata")
        } else {
            Ok(format::stat_block(&info))
        }
    }

    fn page(&self, args: &[&str]) -> Result<String> {
        let Some((path, counts)) = args.split_first() else {
            return Ok("usage: page <path> <n>...".to_string());
        };

        let counts = match counts
            .iter()
            .map(|c| c.parse::<isize>())
            .collect::<Result<Vec<_>, _>>()
        {
            Ok(counts) => counts,
            Err(e) => return Ok(format!("page: bad count: {}", e)),
        };
        if counts.is_empty() {
            return Ok("usage: page <path> <n>...".to_string());
        }

        let mut handle = match self.open(path) {
            Ok(handle) => handle,
            Err(e) => return Ok(format!("page: {}", e)),
        };

        let mut lines = Vec::with_capacity(counts.len());
        for count in counts {
            match handle.readdir(count) {
                Ok(listing) => lines.push(format::page_line(count, &listing)),
                Err(e) => {
                    lines.push(format!("page: {}", e));
                    break;
                }
            }
        }
        Ok(lines.join("\n"))
    }

    /// Handle a meta-command (starts with /).
    fn handle_meta_command(&mut self, cmd: &str) -> Result<Option<String>> {
        match cmd {
            "/quit" | "/q" | "/exit" => {
                self.quit = true;
                Ok(None)
            }
            "/help" | "/h" | "/?" => Ok(Some(HELP_TEXT.to_string())),
            _ => Ok(Some(format!(
                "Unknown command: {}\nType /help for available commands.",
                cmd
            ))),
        }
    }
}

/// Meta-commands share the leading `/` with paths; only these names are taken.
fn is_meta(cmd: &str) -> bool {
    matches!(cmd, "/quit" | "/q" | "/exit" | "/help" | "/h" | "/?")
}

const HELP_TEXT: &str = r#"embedfs: browse an in-memory filesystem

Commands:
  /help, /h, /?     Show this help
  /quit, /q, /exit  Exit the REPL

Filesystem:
  ls [-l] [path]          List a directory (default /)
  cat <path>              Print a file
  stat [--json] <path>    Show metadata
  page <path> <n>...      Call readdir(n) on one handle, once per n
                          (n <= 0 returns every entry)

Paths may be absolute or relative; both start at the root."#;

/// Run the REPL.
pub fn run(mut repl: Repl) -> Result<()> {
    println!("embedfs v{}", env!("CARGO_PKG_VERSION"));
    println!("Type /help for commands, /quit to exit.\n");

    let mut rl: Editor<(), DefaultHistory> = Editor::new()
        .context("Failed to create editor")?;

    // Load history if it exists
    let history_path = directories::ProjectDirs::from("", "", "embedfs")
        .map(|dirs| dirs.data_dir().join("history.txt"));
    if let Some(ref path) = history_path {
        let _ = rl.load_history(path);
    }

    while !repl.should_quit() {
        match rl.readline("embedfs> ") {
            Ok(line) => {
                let _ = rl.add_history_entry(line.as_str());

                match repl.process_line(&line) {
                    Ok(Some(output)) => println!("{}", output),
                    Ok(None) => {}
                    Err(e) => eprintln!("Error: {:#}", e),
                }
            }
            Err(ReadlineError::Interrupted) => {
                println!("^C");
                continue;
            }
            Err(ReadlineError::Eof) => {
                println!("^D");
                break;
            }
            Err(err) => {
                eprintln!("Error: {}", err);
                break;
            }
        }
    }

    // Save history
    if let Some(ref path) = history_path {
        if let Some(parent) = path.parent() {
            let _ = std::fs::create_dir_all(parent);
        }
        let _ = rl.save_history(path);
    }

    Ok(())
}
