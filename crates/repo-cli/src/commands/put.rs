//! The `put` command

use std::fs::File;
use std::io::Write;
use std::path::Path;

use colored::Colorize;
use repo_fs::FileSystem;

use crate::error::{CliError, Result};

/// Run the put command
///
/// Intermediate directories need not exist; the served file system decides
/// whether a file may be stored at `path`.
pub fn run_put(fs: &dyn FileSystem, path: &str, file: &Path, out: &mut dyn Write) -> Result<()> {
    let trimmed = path.trim_matches('/');
    let (directories, name) = trimmed.rsplit_once('/').unwrap_or(("", trimmed));
    if name.is_empty() {
        return Err(CliError::user("put needs a file name in the repository path"));
    }
    let parent = directories
        .split('/')
        .filter(|segment| !segment.is_empty())
        .fold(fs.root(), |dir, segment| dir.child(segment));

    let mut content = File::open(file)?;
    match fs.put(&parent, name, &mut content)? {
        Some(stored) => {
            tracing::info!(path = %stored.to_path(), source = %file.display(), "Stored file");
            writeln!(out, "{} /{}", "stored".green().bold(), stored.to_path())?;
            Ok(())
        }
        None => Err(CliError::user(format!("{path}: the repository does not accept a file here"))),
    }
}
