//! Entries: the named nodes of a virtual file system tree.
//!
//! An entry is identified by its owning file system, its parent directory and
//! its name. Entries are cheap values; file systems rebuild them on every call
//! rather than handing out cached handles. Each entry holds a weak reference
//! back to the file system that produced it, so a dropped file system leaves
//! its entries detached instead of kept alive.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::io::Read;
use std::sync::{Arc, Weak};

use chrono::{DateTime, Utc};

use crate::{Error, FileSystem, Result};

/// Point in time used for all last-modified values.
pub type Timestamp = DateTime<Utc>;

/// Non-owning reference from an entry to its file system.
#[derive(Clone)]
pub struct FsHandle(Weak<dyn FileSystem>);

impl FsHandle {
    pub fn new(fs: Weak<dyn FileSystem>) -> Self {
        Self(fs)
    }

    pub fn upgrade(&self) -> Option<Arc<dyn FileSystem>> {
        self.0.upgrade()
    }

    /// Identity comparison of the referenced file system instances.
    pub fn same(&self, other: &FsHandle) -> bool {
        Weak::ptr_eq(&self.0, &other.0)
    }

    fn addr(&self) -> usize {
        self.0.as_ptr() as *const () as usize
    }
}

impl fmt::Debug for FsHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FsHandle({:#x})", self.addr())
    }
}

/// Byte content behind a [`FileEntry`].
pub trait FileContent: Send + Sync {
    fn last_modified(&self) -> Result<Timestamp>;

    fn size(&self) -> Result<u64>;

    /// Open a fresh stream over the content. The caller owns the reader.
    fn open(&self) -> Result<Box<dyn Read + Send>>;
}

struct Node {
    fs: FsHandle,
    parent: Option<DirectoryEntry>,
    name: String,
}

/// A directory in a virtual file system.
#[derive(Clone)]
pub struct DirectoryEntry(Arc<Node>);

impl DirectoryEntry {
    /// The root directory of the file system behind `fs`.
    pub fn root(fs: FsHandle) -> Self {
        Self(Arc::new(Node {
            fs,
            parent: None,
            name: String::new(),
        }))
    }

    /// A child directory of this one, owned by the same file system.
    pub fn child(&self, name: impl Into<String>) -> DirectoryEntry {
        Self(Arc::new(Node {
            fs: self.0.fs.clone(),
            parent: Some(self.clone()),
            name: name.into(),
        }))
    }

    pub fn name(&self) -> &str {
        &self.0.name
    }

    pub fn parent(&self) -> Option<&DirectoryEntry> {
        self.0.parent.as_ref()
    }

    pub fn is_root(&self) -> bool {
        self.0.parent.is_none()
    }

    pub fn handle(&self) -> &FsHandle {
        &self.0.fs
    }

    pub fn file_system(&self) -> Result<Arc<dyn FileSystem>> {
        self.0.fs.upgrade().ok_or_else(|| Error::Detached {
            path: self.to_path(),
        })
    }

    /// Slash-separated path from the root (exclusive). The root's path is empty.
    pub fn to_path(&self) -> String {
        match self.parent() {
            None => String::new(),
            Some(parent) => join_path(parent, self.name()),
        }
    }

    /// Directory age is decided by the owning file system.
    pub fn last_modified(&self) -> Result<Timestamp> {
        self.file_system()?.last_modified(self)
    }
}

impl PartialEq for DirectoryEntry {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
            || (self.0.fs.same(&other.0.fs)
                && self.0.name == other.0.name
                && self.0.parent == other.0.parent)
    }
}

impl Eq for DirectoryEntry {}

impl Hash for DirectoryEntry {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.fs.addr().hash(state);
        self.0.name.hash(state);
        self.0.parent.hash(state);
    }
}

impl fmt::Debug for DirectoryEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DirectoryEntry({:?})", self.to_path())
    }
}

/// A file in a virtual file system.
#[derive(Clone)]
pub struct FileEntry {
    parent: DirectoryEntry,
    name: String,
    content: Arc<dyn FileContent>,
}

impl FileEntry {
    pub fn new(parent: DirectoryEntry, name: impl Into<String>, content: Arc<dyn FileContent>) -> Self {
        Self {
            parent,
            name: name.into(),
            content,
        }
    }

    pub fn with_content(
        parent: DirectoryEntry,
        name: impl Into<String>,
        content: impl FileContent + 'static,
    ) -> Self {
        Self::new(parent, name, Arc::new(content))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn parent(&self) -> &DirectoryEntry {
        &self.parent
    }

    pub fn handle(&self) -> &FsHandle {
        self.parent.handle()
    }

    pub fn file_system(&self) -> Result<Arc<dyn FileSystem>> {
        self.parent.file_system()
    }

    pub fn content(&self) -> &Arc<dyn FileContent> {
        &self.content
    }

    pub fn to_path(&self) -> String {
        join_path(&self.parent, &self.name)
    }

    pub fn last_modified(&self) -> Result<Timestamp> {
        self.content.last_modified()
    }

    pub fn size(&self) -> Result<u64> {
        self.content.size()
    }

    pub fn open(&self) -> Result<Box<dyn Read + Send>> {
        self.content.open()
    }

    /// Read the whole content into memory.
    pub fn read_all(&self) -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        self.open()?.read_to_end(&mut buf)?;
        Ok(buf)
    }
}

impl PartialEq for FileEntry {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.parent == other.parent
    }
}

impl Eq for FileEntry {}

impl Hash for FileEntry {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.parent.hash(state);
        self.name.hash(state);
    }
}

impl fmt::Debug for FileEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FileEntry({:?})", self.to_path())
    }
}

/// Either kind of node.
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub enum Entry {
    Directory(DirectoryEntry),
    File(FileEntry),
}

impl Entry {
    pub fn name(&self) -> &str {
        match self {
            Entry::Directory(dir) => dir.name(),
            Entry::File(file) => file.name(),
        }
    }

    pub fn parent(&self) -> Option<&DirectoryEntry> {
        match self {
            Entry::Directory(dir) => dir.parent(),
            Entry::File(file) => Some(file.parent()),
        }
    }

    pub fn handle(&self) -> &FsHandle {
        match self {
            Entry::Directory(dir) => dir.handle(),
            Entry::File(file) => file.handle(),
        }
    }

    pub fn to_path(&self) -> String {
        match self {
            Entry::Directory(dir) => dir.to_path(),
            Entry::File(file) => file.to_path(),
        }
    }

    pub fn last_modified(&self) -> Result<Timestamp> {
        match self {
            Entry::Directory(dir) => dir.last_modified(),
            Entry::File(file) => file.last_modified(),
        }
    }

    pub fn is_directory(&self) -> bool {
        matches!(self, Entry::Directory(_))
    }

    pub fn is_file(&self) -> bool {
        matches!(self, Entry::File(_))
    }

    pub fn as_directory(&self) -> Option<&DirectoryEntry> {
        match self {
            Entry::Directory(dir) => Some(dir),
            Entry::File(_) => None,
        }
    }

    pub fn as_file(&self) -> Option<&FileEntry> {
        match self {
            Entry::File(file) => Some(file),
            Entry::Directory(_) => None,
        }
    }
}

impl From<DirectoryEntry> for Entry {
    fn from(dir: DirectoryEntry) -> Self {
        Entry::Directory(dir)
    }
}

impl From<FileEntry> for Entry {
    fn from(file: FileEntry) -> Self {
        Entry::File(file)
    }
}

fn join_path(parent: &DirectoryEntry, name: &str) -> String {
    let mut names = vec![name];
    let mut current = Some(parent);
    while let Some(dir) = current {
        if dir.is_root() {
            break;
        }
        names.push(dir.name());
        current = dir.parent();
    }
    names.reverse();
    names.join("/")
}
