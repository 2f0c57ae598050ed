//! Delegating file contents.

use std::io::Read;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::entry::{DirectoryEntry, FileContent, FileEntry, Timestamp};
use crate::Result;

/// Content that forwards every call to a file owned by another file system.
pub struct LinkContent {
    target: FileEntry,
}

impl LinkContent {
    pub fn new(target: FileEntry) -> Self {
        Self { target }
    }

    pub fn target(&self) -> &FileEntry {
        &self.target
    }
}

impl FileContent for LinkContent {
    fn last_modified(&self) -> Result<Timestamp> {
        self.target.last_modified()
    }

    fn size(&self) -> Result<u64> {
        self.target.size()
    }

    fn open(&self) -> Result<Box<dyn Read + Send>> {
        self.target.open()
    }
}

/// Expose `target` as a file named like it inside `parent`.
pub fn link(parent: DirectoryEntry, target: FileEntry) -> FileEntry {
    let name = target.name().to_owned();
    FileEntry::with_content(parent, name, LinkContent::new(target))
}

/// Content that serves `primary` until it fails once, then serves
/// `fallback` for the rest of its life. The primary is never retried.
pub struct GenerateOnErrorContent {
    primary: FileEntry,
    fallback: FileEntry,
    failed: AtomicBool,
}

impl GenerateOnErrorContent {
    pub fn new(primary: FileEntry, fallback: FileEntry) -> Self {
        Self {
            primary,
            fallback,
            failed: AtomicBool::new(false),
        }
    }

    pub fn has_failed_over(&self) -> bool {
        self.failed.load(Ordering::Acquire)
    }

    fn attempt<T>(&self, call: impl Fn(&FileEntry) -> Result<T>) -> Result<T> {
        if !self.has_failed_over() {
            match call(&self.primary) {
                Ok(value) => return Ok(value),
                Err(e) => {
                    tracing::debug!(primary = ?self.primary, error = %e, "Switching to fallback content");
                    self.failed.store(true, Ordering::Release);
                }
            }
        }
        call(&self.fallback)
    }
}

impl FileContent for GenerateOnErrorContent {
    fn last_modified(&self) -> Result<Timestamp> {
        self.attempt(FileEntry::last_modified)
    }

    fn size(&self) -> Result<u64> {
        self.attempt(FileEntry::size)
    }

    fn open(&self) -> Result<Box<dyn Read + Send>> {
        self.attempt(FileEntry::open)
    }
}
