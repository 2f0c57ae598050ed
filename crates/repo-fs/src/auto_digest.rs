//! Serve `.md5`/`.sha1` siblings for every file of a backing file system.

use std::collections::HashSet;
use std::io::Read;
use std::sync::{Arc, Weak};

use crate::digest::{DigestAlgorithm, digest_entry, stored_digest_entry};
use crate::entry::{DirectoryEntry, Entry, FileEntry, FsHandle, Timestamp};
use crate::filesystem::{FileSystem, equivalent, get_file};
use crate::link::{GenerateOnErrorContent, link};
use crate::{Error, Result};

/// Wraps a backing file system and synthesizes digest files for every
/// regular file that has no stored digest of its own.
///
/// A digest the backing file system reports is only trusted while the file
/// it describes still exists; caching backends can report stale digests.
pub struct AutoDigestFileSystem {
    root: DirectoryEntry,
    backing: Arc<dyn FileSystem>,
}

impl AutoDigestFileSystem {
    pub fn new(backing: Arc<dyn FileSystem>) -> Arc<Self> {
        Arc::new_cyclic(|this: &Weak<Self>| {
            let handle: Weak<dyn FileSystem> = this.clone();
            Self {
                root: DirectoryEntry::root(FsHandle::new(handle)),
                backing,
            }
        })
    }

    pub fn backing(&self) -> &Arc<dyn FileSystem> {
        &self.backing
    }

    fn backing_file(&self, parent: &DirectoryEntry, name: &str) -> Option<FileEntry> {
        get_file(self.backing.as_ref(), &child_path(parent, name))
    }

    /// Digest entry for `name` computed from its undigested sibling, if any.
    fn synthesize(&self, parent: &DirectoryEntry, name: &str) -> Option<Entry> {
        let (algorithm, base) = DigestAlgorithm::strip(name)?;
        let target = self.backing_file(parent, base)?;
        Some(Entry::File(digest_entry(parent.clone(), target, algorithm)))
    }
}

fn child_path(parent: &DirectoryEntry, name: &str) -> String {
    let parent_path = parent.to_path();
    if parent_path.is_empty() {
        name.to_owned()
    } else {
        format!("{parent_path}/{name}")
    }
}

impl FileSystem for AutoDigestFileSystem {
    fn root(&self) -> DirectoryEntry {
        self.root.clone()
    }

    fn list_entries(&self, directory: &DirectoryEntry) -> Vec<Entry> {
        let directory = equivalent(self, directory);
        let backing_dir = equivalent(self.backing.as_ref(), &directory);
        let listing = self.backing.list_entries(&backing_dir);

        let names: HashSet<&str> = listing.iter().map(Entry::name).collect();
        let files: Vec<&FileEntry> = listing.iter().filter_map(Entry::as_file).collect();

        let mut result = Vec::with_capacity(listing.len() * 3);
        for entry in &listing {
            match entry {
                Entry::Directory(dir) => result.push(Entry::Directory(directory.child(dir.name()))),
                Entry::File(file) => {
                    let shadow = DigestAlgorithm::strip(file.name()).and_then(|(algorithm, base)| {
                        files
                            .iter()
                            .find(|candidate| candidate.name() == base)
                            .map(|target| (algorithm, (*target).clone()))
                    });
                    let served = match shadow {
                        Some((algorithm, target)) => {
                            stored_digest_entry(directory.clone(), target, file.clone(), algorithm)
                        }
                        None => link(directory.clone(), file.clone()),
                    };
                    result.push(Entry::File(served));
                }
            }
        }
        for file in files {
            if DigestAlgorithm::is_digest_name(file.name()) {
                continue;
            }
            for algorithm in DigestAlgorithm::ALL {
                let digest_name = format!("{}{}", file.name(), algorithm.suffix());
                if !names.contains(digest_name.as_str()) {
                    result.push(Entry::File(digest_entry(directory.clone(), file.clone(), algorithm)));
                }
            }
        }
        result.sort_by(|a, b| a.name().cmp(b.name()));
        result
    }

    fn last_modified(&self, directory: &DirectoryEntry) -> Result<Timestamp> {
        self.backing
            .last_modified(&equivalent(self.backing.as_ref(), directory))
    }

    fn get_child(&self, parent: &DirectoryEntry, name: &str) -> Option<Entry> {
        let parent = equivalent(self, parent);
        match self.backing.get(&child_path(&parent, name)) {
            None => self.synthesize(&parent, name),
            Some(Entry::File(file)) => match DigestAlgorithm::strip(name) {
                Some((algorithm, base)) => {
                    let Some(target) = self.backing_file(&parent, base) else {
                        tracing::debug!(name, "Ignoring digest whose file is gone");
                        return None;
                    };
                    let primary = link(parent.clone(), file);
                    let fallback = digest_entry(parent.clone(), target, algorithm);
                    Some(Entry::File(FileEntry::with_content(
                        parent,
                        name,
                        GenerateOnErrorContent::new(primary, fallback),
                    )))
                }
                None => Some(Entry::File(link(parent, file))),
            },
            Some(Entry::Directory(_)) => self
                .synthesize(&parent, name)
                .or_else(|| Some(Entry::Directory(parent.child(name)))),
        }
    }

    fn mkdir(&self, parent: &DirectoryEntry, name: &str) -> Result<Option<DirectoryEntry>> {
        let created = self
            .backing
            .mkdir(&equivalent(self.backing.as_ref(), parent), name)?;
        Ok(created.map(|dir| equivalent(self, &dir)))
    }

    fn put(
        &self,
        parent: &DirectoryEntry,
        name: &str,
        content: &mut dyn Read,
    ) -> Result<Option<FileEntry>> {
        let stored = self
            .backing
            .put(&equivalent(self.backing.as_ref(), parent), name, content)?;
        Ok(stored.map(|file| link(equivalent(self, parent), file)))
    }

    fn remove(&self, entry: &Entry) -> Result<()> {
        match entry {
            Entry::Directory(dir) => self
                .backing
                .remove(&Entry::Directory(equivalent(self.backing.as_ref(), dir))),
            Entry::File(file) => match self.backing.get(&file.to_path()) {
                Some(target) => self.backing.remove(&target),
                // Generated digests last as long as their file.
                None if self.synthesize(&equivalent(self, file.parent()), file.name()).is_some() => {
                    Err(Error::unsupported("remove generated digest"))
                }
                None => Ok(()),
            },
        }
    }
}
