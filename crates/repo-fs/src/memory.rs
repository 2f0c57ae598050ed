//! Mutable in-process file system.

use std::collections::HashMap;
use std::io::{Cursor, Read};
use std::sync::{Arc, Weak};

use chrono::Utc;
use parking_lot::Mutex;

use crate::entry::{DirectoryEntry, Entry, FileContent, FileEntry, FsHandle, Timestamp};
use crate::filesystem::{FileSystem, equivalent};
use crate::Result;

/// Bytes held in memory together with the time they were stored.
#[derive(Debug, Clone)]
pub struct MemoryContent {
    bytes: Arc<[u8]>,
    last_modified: Timestamp,
}

impl MemoryContent {
    pub fn new(bytes: impl Into<Arc<[u8]>>, last_modified: Timestamp) -> Self {
        Self {
            bytes: bytes.into(),
            last_modified,
        }
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }
}

impl FileContent for MemoryContent {
    fn last_modified(&self) -> Result<Timestamp> {
        Ok(self.last_modified)
    }

    fn size(&self) -> Result<u64> {
        Ok(self.bytes.len() as u64)
    }

    fn open(&self) -> Result<Box<dyn Read + Send>> {
        Ok(Box::new(Cursor::new(Arc::clone(&self.bytes))))
    }
}

type Tree = HashMap<DirectoryEntry, Vec<Entry>>;

/// A file system whose tree lives in a single map guarded by one lock.
///
/// Every structural mutation and listing on an instance is serialized on
/// that lock.
pub struct MemoryFileSystem {
    root: DirectoryEntry,
    contents: Mutex<Tree>,
}

impl MemoryFileSystem {
    pub fn new() -> Arc<Self> {
        Arc::new_cyclic(|this: &Weak<Self>| {
            let handle: Weak<dyn FileSystem> = this.clone();
            let root = DirectoryEntry::root(FsHandle::new(handle));
            let mut contents = Tree::new();
            contents.insert(root.clone(), Vec::new());
            Self {
                root,
                contents: Mutex::new(contents),
            }
        })
    }

    /// Convenience for storing a byte slice.
    pub fn put_bytes(
        &self,
        parent: &DirectoryEntry,
        name: &str,
        bytes: &[u8],
    ) -> Result<Option<FileEntry>> {
        self.put(parent, name, &mut &bytes[..])
    }

    /// Create every missing directory along `path` and return the last one.
    pub fn mkdirs(&self, path: &str) -> Result<Option<DirectoryEntry>> {
        let mut current = self.root.clone();
        for segment in path.split('/').filter(|s| !s.is_empty()) {
            match self.mkdir(&current, segment)? {
                Some(dir) => current = dir,
                None => return Ok(None),
            }
        }
        Ok(Some(current))
    }

    fn normalize(&self, directory: &DirectoryEntry) -> DirectoryEntry {
        equivalent(self, directory)
    }

    fn mkdir_locked(tree: &mut Tree, parent: &DirectoryEntry, name: &str) -> Option<DirectoryEntry> {
        if !tree.contains_key(parent) {
            let grandparent = parent.parent()?;
            Self::mkdir_locked(tree, grandparent, parent.name())?;
        }
        let siblings = tree.entry(parent.clone()).or_default();
        if let Some(existing) = siblings.iter().find(|e| e.name() == name) {
            return match existing {
                Entry::Directory(dir) => Some(dir.clone()),
                Entry::File(_) => None,
            };
        }
        let dir = parent.child(name);
        siblings.push(Entry::Directory(dir.clone()));
        tree.insert(dir.clone(), Vec::new());
        Some(dir)
    }

    /// Unlink whatever is stored under the entry's name, subtree included.
    fn remove_locked(tree: &mut Tree, entry: &Entry) {
        let stored = entry
            .parent()
            .and_then(|parent| tree.get(parent))
            .and_then(|siblings| siblings.iter().find(|e| e.name() == entry.name()))
            .cloned();
        if let Some(Entry::Directory(dir)) = stored.as_ref().or(Some(entry)) {
            for child in tree.remove(dir).unwrap_or_default() {
                Self::remove_locked(tree, &child);
            }
        }
        if let Some(parent) = entry.parent()
            && let Some(siblings) = tree.get_mut(parent)
        {
            siblings.retain(|e| e.name() != entry.name());
        }
    }

    fn newest_locked(tree: &Tree, directory: &DirectoryEntry) -> Result<Timestamp> {
        let mut newest = Timestamp::UNIX_EPOCH;
        for entry in tree.get(directory).into_iter().flatten() {
            let modified = match entry {
                Entry::Directory(dir) => Self::newest_locked(tree, dir)?,
                Entry::File(file) => file.last_modified()?,
            };
            newest = newest.max(modified);
        }
        Ok(newest)
    }
}

impl FileSystem for MemoryFileSystem {
    fn root(&self) -> DirectoryEntry {
        self.root.clone()
    }

    fn list_entries(&self, directory: &DirectoryEntry) -> Vec<Entry> {
        let directory = self.normalize(directory);
        self.contents
            .lock()
            .get(&directory)
            .cloned()
            .unwrap_or_default()
    }

    fn last_modified(&self, directory: &DirectoryEntry) -> Result<Timestamp> {
        let directory = self.normalize(directory);
        Self::newest_locked(&self.contents.lock(), &directory)
    }

    fn get_child(&self, parent: &DirectoryEntry, name: &str) -> Option<Entry> {
        let parent = self.normalize(parent);
        self.contents
            .lock()
            .get(&parent)?
            .iter()
            .find(|e| e.name() == name)
            .cloned()
    }

    fn mkdir(&self, parent: &DirectoryEntry, name: &str) -> Result<Option<DirectoryEntry>> {
        let parent = self.normalize(parent);
        Ok(Self::mkdir_locked(&mut self.contents.lock(), &parent, name))
    }

    fn put(
        &self,
        parent: &DirectoryEntry,
        name: &str,
        content: &mut dyn Read,
    ) -> Result<Option<FileEntry>> {
        let mut bytes = Vec::new();
        content.read_to_end(&mut bytes)?;
        let parent = self.normalize(parent);

        let mut tree = self.contents.lock();
        if !tree.contains_key(&parent) {
            let created = match parent.parent() {
                Some(grandparent) => Self::mkdir_locked(&mut tree, grandparent, parent.name()),
                None => None,
            };
            if created.is_none() {
                return Ok(None);
            }
        }
        let siblings = tree.entry(parent.clone()).or_default();
        if siblings
            .iter()
            .any(|e| e.is_directory() && e.name() == name)
        {
            return Ok(None);
        }
        siblings.retain(|e| e.name() != name);
        let file = FileEntry::with_content(parent, name, MemoryContent::new(bytes, Utc::now()));
        siblings.push(Entry::File(file.clone()));
        Ok(Some(file))
    }

    fn remove(&self, entry: &Entry) -> Result<()> {
        let normalized = match entry {
            Entry::Directory(dir) => Entry::Directory(self.normalize(dir)),
            Entry::File(file) => {
                let parent = self.normalize(file.parent());
                Entry::File(FileEntry::new(parent, file.name(), Arc::clone(file.content())))
            }
        };
        Self::remove_locked(&mut self.contents.lock(), &normalized);
        Ok(())
    }
}
