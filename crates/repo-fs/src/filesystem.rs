//! The [`FileSystem`] capability and the path-walking helpers shared by
//! every implementation.

use std::io::Read;

use crate::entry::{DirectoryEntry, Entry, FileEntry, Timestamp};
use crate::{Error, Result};

/// A lookup structure from slash-separated paths to [`Entry`] values.
///
/// Listings may be partial: a name missing from [`list_entries`] does not
/// prove absence. Only `get(path) == None` or a failed content read does.
///
/// [`list_entries`]: FileSystem::list_entries
pub trait FileSystem: Send + Sync + 'static {
    /// The root directory of this file system.
    fn root(&self) -> DirectoryEntry;

    /// A fresh, caller-owned listing of `directory`.
    fn list_entries(&self, directory: &DirectoryEntry) -> Vec<Entry>;

    /// Age of `directory` under this file system's timestamp policy.
    fn last_modified(&self, directory: &DirectoryEntry) -> Result<Timestamp>;

    /// Resolve `name` inside `parent`. Defaults to scanning the listing.
    fn get_child(&self, parent: &DirectoryEntry, name: &str) -> Option<Entry> {
        self.list_entries(parent)
            .into_iter()
            .find(|entry| entry.name() == name)
    }

    /// Resolve a slash-separated path. A leading `/` is ignored and the
    /// empty path is the root.
    fn get(&self, path: &str) -> Option<Entry> {
        resolve(self, path)
    }

    fn mkdir(&self, _parent: &DirectoryEntry, _name: &str) -> Result<Option<DirectoryEntry>> {
        Err(Error::unsupported("mkdir"))
    }

    /// Store `content` as `name` inside `parent`.
    ///
    /// Returns `None` when the slot is occupied by something that cannot be
    /// replaced by a file.
    fn put(
        &self,
        _parent: &DirectoryEntry,
        _name: &str,
        _content: &mut dyn Read,
    ) -> Result<Option<FileEntry>> {
        Err(Error::unsupported("put"))
    }

    fn remove(&self, _entry: &Entry) -> Result<()> {
        Err(Error::unsupported("remove"))
    }
}

/// Walk `path` through default directory entries and hand the leaf to
/// [`FileSystem::get_child`].
pub fn resolve<F: FileSystem + ?Sized>(fs: &F, path: &str) -> Option<Entry> {
    let path = path.strip_prefix('/').unwrap_or(path).trim_end_matches('/');
    if path.is_empty() {
        return Some(Entry::Directory(fs.root()));
    }
    let (dirs, leaf) = match path.rsplit_once('/') {
        Some((dirs, leaf)) => (Some(dirs), leaf),
        None => (None, path),
    };
    let mut parent = fs.root();
    if let Some(dirs) = dirs {
        for segment in dirs.split('/') {
            parent = parent.child(segment);
        }
    }
    fs.get_child(&parent, leaf)
}

/// Rebuild the shape of `directory` inside `target`.
///
/// Wrapping file systems use this to address a backing file system's nodes
/// without sharing entry identity across layers.
pub fn equivalent<F: FileSystem + ?Sized>(target: &F, directory: &DirectoryEntry) -> DirectoryEntry {
    let root = target.root();
    if directory.handle().same(root.handle()) {
        return directory.clone();
    }
    match directory.parent() {
        None => root,
        Some(parent) => equivalent(target, parent).child(directory.name()),
    }
}

/// Resolve a path and require a file.
pub fn get_file<F: FileSystem + ?Sized>(fs: &F, path: &str) -> Option<FileEntry> {
    match fs.get(path)? {
        Entry::File(file) => Some(file),
        Entry::Directory(_) => None,
    }
}

/// Resolve a path and require a directory.
pub fn get_directory<F: FileSystem + ?Sized>(fs: &F, path: &str) -> Option<DirectoryEntry> {
    match fs.get(path)? {
        Entry::Directory(dir) => Some(dir),
        Entry::File(_) => None,
    }
}
