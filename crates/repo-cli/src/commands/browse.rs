//! Read-only commands: `ls`, `cat`, `stat` and `tree`

use std::io::{self, Write};

use chrono::SecondsFormat;
use colored::Colorize;
use repo_fs::{DirectoryEntry, Entry, FileSystem, Timestamp};

use crate::error::{CliError, Result};

fn entry_at(fs: &dyn FileSystem, path: &str) -> Result<Entry> {
    fs.get(path)
        .ok_or_else(|| CliError::user(format!("{path}: no such file or directory")))
}

fn format_time(timestamp: Timestamp) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Directories carry a trailing slash.
fn display_name(entry: &Entry) -> String {
    match entry {
        Entry::Directory(dir) => format!("{}/", dir.name()).blue().bold().to_string(),
        Entry::File(file) => file.name().to_owned(),
    }
}

fn write_entry(out: &mut dyn Write, entry: &Entry, long: bool) -> Result<()> {
    if !long {
        writeln!(out, "{}", display_name(entry))?;
        return Ok(());
    }
    let size = match entry {
        Entry::File(file) => match file.size() {
            Ok(size) => size.to_string(),
            Err(e) => {
                tracing::debug!(path = %file.to_path(), error = %e, "Size unavailable");
                "?".to_owned()
            }
        },
        Entry::Directory(_) => "-".to_owned(),
    };
    let modified = entry
        .last_modified()
        .map(format_time)
        .unwrap_or_else(|_| "?".to_owned());
    writeln!(out, "{size:>10}  {modified}  {}", display_name(entry))?;
    Ok(())
}

/// Run the ls command
///
/// Listing a file prints just that file.
pub fn run_ls(fs: &dyn FileSystem, path: &str, long: bool, out: &mut dyn Write) -> Result<()> {
    match entry_at(fs, path)? {
        Entry::Directory(dir) => {
            for entry in fs.list_entries(&dir) {
                write_entry(out, &entry, long)?;
            }
        }
        file => write_entry(out, &file, long)?,
    }
    Ok(())
}

/// Run the cat command
pub fn run_cat(fs: &dyn FileSystem, path: &str, out: &mut dyn Write) -> Result<()> {
    match entry_at(fs, path)? {
        Entry::File(file) => {
            let mut content = file.open()?;
            io::copy(&mut content, out)?;
            out.flush()?;
            Ok(())
        }
        Entry::Directory(_) => Err(CliError::user(format!("{path}: is a directory"))),
    }
}

/// Run the stat command
pub fn run_stat(fs: &dyn FileSystem, path: &str, out: &mut dyn Write) -> Result<()> {
    let entry = entry_at(fs, path)?;
    writeln!(out, "{:>9} /{}", "Path:".bold(), entry.to_path())?;
    match &entry {
        Entry::File(file) => {
            writeln!(out, "{:>9} file", "Type:".bold())?;
            writeln!(out, "{:>9} {}", "Size:".bold(), file.size()?)?;
        }
        Entry::Directory(_) => writeln!(out, "{:>9} directory", "Type:".bold())?,
    }
    writeln!(out, "{:>9} {}", "Modified:".bold(), format_time(entry.last_modified()?))?;
    Ok(())
}

#[derive(Default)]
struct Counts {
    directories: usize,
    files: usize,
}

fn walk(
    fs: &dyn FileSystem,
    dir: &DirectoryEntry,
    level: usize,
    depth: Option<usize>,
    counts: &mut Counts,
    out: &mut dyn Write,
) -> Result<()> {
    if depth.is_some_and(|max| level > max) {
        return Ok(());
    }
    for entry in fs.list_entries(dir) {
        writeln!(out, "{}{}", "  ".repeat(level), display_name(&entry))?;
        match &entry {
            Entry::Directory(child) => {
                counts.directories += 1;
                walk(fs, child, level + 1, depth, counts, out)?;
            }
            Entry::File(_) => counts.files += 1,
        }
    }
    Ok(())
}

/// Run the tree command
pub fn run_tree(fs: &dyn FileSystem, path: &str, depth: Option<usize>, out: &mut dyn Write) -> Result<()> {
    let dir = match entry_at(fs, path)? {
        Entry::Directory(dir) => dir,
        file => {
            writeln!(out, "{}", display_name(&file))?;
            return Ok(());
        }
    };
    let heading = if dir.is_root() {
        "/".to_owned()
    } else {
        display_name(&Entry::Directory(dir.clone()))
    };
    writeln!(out, "{heading}")?;

    let mut counts = Counts::default();
    walk(fs, &dir, 1, depth, &mut counts, out)?;
    writeln!(out)?;
    writeln!(
        out,
        "{} directories, {} files",
        counts.directories, counts.files
    )?;
    Ok(())
}
