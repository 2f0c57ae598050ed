//! Ordered overlay of several file systems.

use std::collections::BTreeMap;
use std::sync::{Arc, Weak};

use crate::entry::{DirectoryEntry, Entry, FsHandle, Timestamp};
use crate::filesystem::{FileSystem, equivalent};
use crate::link::link;
use crate::Result;

/// Read-only merge of delegate file systems. Earlier delegates take
/// precedence on lookups and on name collisions in listings.
pub struct CompositeFileSystem {
    root: DirectoryEntry,
    delegates: Vec<Arc<dyn FileSystem>>,
}

impl CompositeFileSystem {
    pub fn new(delegates: Vec<Arc<dyn FileSystem>>) -> Arc<Self> {
        Arc::new_cyclic(|this: &Weak<Self>| {
            let handle: Weak<dyn FileSystem> = this.clone();
            Self {
                root: DirectoryEntry::root(FsHandle::new(handle)),
                delegates,
            }
        })
    }

    pub fn delegates(&self) -> &[Arc<dyn FileSystem>] {
        &self.delegates
    }

    /// Re-home an entry from a delegate under this file system's identity.
    fn adopt(&self, entry: Entry) -> Entry {
        match entry {
            Entry::Directory(dir) => Entry::Directory(equivalent(self, &dir)),
            Entry::File(file) => {
                let parent = equivalent(self, file.parent());
                Entry::File(link(parent, file))
            }
        }
    }
}

impl FileSystem for CompositeFileSystem {
    fn root(&self) -> DirectoryEntry {
        self.root.clone()
    }

    fn list_entries(&self, directory: &DirectoryEntry) -> Vec<Entry> {
        let directory = equivalent(self, directory);
        let mut merged: BTreeMap<String, Entry> = BTreeMap::new();
        for delegate in &self.delegates {
            let target = equivalent(delegate.as_ref(), &directory);
            for entry in delegate.list_entries(&target) {
                if merged.contains_key(entry.name()) {
                    continue;
                }
                let adopted = match entry {
                    Entry::Directory(dir) => Entry::Directory(directory.child(dir.name())),
                    Entry::File(file) => Entry::File(link(directory.clone(), file)),
                };
                merged.insert(adopted.name().to_owned(), adopted);
            }
        }
        merged.into_values().collect()
    }

    fn last_modified(&self, directory: &DirectoryEntry) -> Result<Timestamp> {
        let newest = self
            .delegates
            .iter()
            .filter_map(|delegate| {
                let target = equivalent(delegate.as_ref(), directory);
                match delegate.last_modified(&target) {
                    Ok(modified) => Some(modified),
                    Err(e) => {
                        tracing::debug!(?directory, error = %e, "Ignoring delegate timestamp");
                        None
                    }
                }
            })
            .max();
        Ok(newest.unwrap_or(Timestamp::UNIX_EPOCH))
    }

    fn get(&self, path: &str) -> Option<Entry> {
        if path.trim_matches('/').is_empty() {
            return Some(Entry::Directory(self.root()));
        }
        self.delegates
            .iter()
            .find_map(|delegate| delegate.get(path))
            .map(|entry| self.adopt(entry))
    }

    fn get_child(&self, parent: &DirectoryEntry, name: &str) -> Option<Entry> {
        let parent = equivalent(self, parent);
        self.delegates
            .iter()
            .find_map(|delegate| delegate.get_child(&equivalent(delegate.as_ref(), &parent), name))
            .map(|entry| self.adopt(entry))
    }
}
