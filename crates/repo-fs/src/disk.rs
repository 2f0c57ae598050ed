//! A file system mapped 1:1 onto a directory tree on disk.

use std::fs::{self, File};
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Weak};

use crate::entry::{DirectoryEntry, Entry, FileContent, FileEntry, FsHandle, Timestamp};
use crate::filesystem::{FileSystem, equivalent};
use crate::io::{self, RobustnessConfig};
use crate::{Error, Result};

/// Content of a real file, read lazily on every access.
#[derive(Debug, Clone)]
pub struct DiskContent {
    path: PathBuf,
}

impl DiskContent {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl FileContent for DiskContent {
    fn last_modified(&self) -> Result<Timestamp> {
        modified_time(&self.path)
    }

    fn size(&self) -> Result<u64> {
        fs::metadata(&self.path)
            .map(|m| m.len())
            .map_err(|e| Error::io(&self.path, e))
    }

    fn open(&self) -> Result<Box<dyn Read + Send>> {
        let file = File::open(&self.path).map_err(|e| Error::io(&self.path, e))?;
        Ok(Box::new(file))
    }
}

fn is_plain_name(name: &str) -> bool {
    !matches!(name, "" | "." | "..") && !name.contains(['/', '\\'])
}

pub(crate) fn modified_time(path: &Path) -> Result<Timestamp> {
    fs::metadata(path)
        .and_then(|m| m.modified())
        .map(Timestamp::from)
        .map_err(|e| Error::io(path, e))
}

/// File system over a root directory. Read-only unless built with
/// [`DiskFileSystem::writable`].
pub struct DiskFileSystem {
    root: DirectoryEntry,
    base: PathBuf,
    read_only: bool,
    robustness: RobustnessConfig,
}

impl DiskFileSystem {
    pub fn new(base: impl Into<PathBuf>) -> Arc<Self> {
        Self::build(base.into(), true)
    }

    pub fn writable(base: impl Into<PathBuf>) -> Arc<Self> {
        Self::build(base.into(), false)
    }

    fn build(base: PathBuf, read_only: bool) -> Arc<Self> {
        Arc::new_cyclic(|this: &Weak<Self>| {
            let handle: Weak<dyn FileSystem> = this.clone();
            Self {
                root: DirectoryEntry::root(FsHandle::new(handle)),
                base,
                read_only,
                robustness: RobustnessConfig::default(),
            }
        })
    }

    pub fn base(&self) -> &Path {
        &self.base
    }

    pub fn is_read_only(&self) -> bool {
        self.read_only
    }

    /// Map a directory onto its real location.
    ///
    /// Names are split on path separators, `.` segments are skipped and `..`
    /// pops the previous segment. A `..` at the root is dropped so the result
    /// never leaves the base directory.
    pub fn to_native(&self, directory: &DirectoryEntry) -> PathBuf {
        let mut names = Vec::new();
        let mut current = Some(directory);
        while let Some(dir) = current {
            if dir.is_root() {
                break;
            }
            names.push(dir.name());
            current = dir.parent();
        }

        let mut stack: Vec<&str> = Vec::new();
        let segments = names.into_iter().rev().flat_map(|name| name.split(['/', '\\']));
        for name in segments {
            match name {
                "" | "." => {}
                ".." => {
                    stack.pop();
                }
                other => stack.push(other),
            }
        }
        stack
            .into_iter()
            .fold(self.base.clone(), |path, segment| path.join(segment))
    }

    /// A name must denote a single entry directly below its parent.
    fn check_name(name: &str) -> Result<()> {
        if is_plain_name(name) {
            Ok(())
        } else {
            Err(Error::invalid_name(name))
        }
    }

    fn check_writable(&self, operation: &'static str) -> Result<()> {
        if self.read_only {
            Err(Error::unsupported(operation))
        } else {
            Ok(())
        }
    }

    fn entry_for(&self, parent: &DirectoryEntry, name: &str, path: PathBuf) -> Option<Entry> {
        let metadata = fs::metadata(&path).ok()?;
        if metadata.is_file() {
            Some(Entry::File(FileEntry::with_content(
                parent.clone(),
                name,
                DiskContent::new(path),
            )))
        } else if metadata.is_dir() {
            Some(Entry::Directory(parent.child(name)))
        } else {
            None
        }
    }
}

impl FileSystem for DiskFileSystem {
    fn root(&self) -> DirectoryEntry {
        self.root.clone()
    }

    fn list_entries(&self, directory: &DirectoryEntry) -> Vec<Entry> {
        let directory = equivalent(self, directory);
        let path = self.to_native(&directory);
        let reader = match fs::read_dir(&path) {
            Ok(reader) => reader,
            Err(e) => {
                tracing::debug!(?path, error = %e, "Cannot list directory");
                return Vec::new();
            }
        };
        let mut entries: Vec<Entry> = reader
            .filter_map(|item| item.ok())
            .filter_map(|item| {
                let name = item.file_name().to_string_lossy().into_owned();
                self.entry_for(&directory, &name, item.path())
            })
            .collect();
        entries.sort_by(|a, b| a.name().cmp(b.name()));
        entries
    }

    fn last_modified(&self, directory: &DirectoryEntry) -> Result<Timestamp> {
        modified_time(&self.to_native(directory))
    }

    fn get_child(&self, parent: &DirectoryEntry, name: &str) -> Option<Entry> {
        if !is_plain_name(name) {
            return None;
        }
        let parent = equivalent(self, parent);
        let path = self.to_native(&parent.child(name));
        self.entry_for(&parent, name, path)
    }

    fn mkdir(&self, parent: &DirectoryEntry, name: &str) -> Result<Option<DirectoryEntry>> {
        self.check_writable("mkdir")?;
        Self::check_name(name)?;
        let parent = equivalent(self, parent);
        let path = self.to_native(&parent.child(name));
        if path.is_file() {
            return Ok(None);
        }
        fs::create_dir_all(&path).map_err(|e| Error::io(&path, e))?;
        Ok(Some(parent.child(name)))
    }

    fn put(
        &self,
        parent: &DirectoryEntry,
        name: &str,
        content: &mut dyn Read,
    ) -> Result<Option<FileEntry>> {
        self.check_writable("put")?;
        Self::check_name(name)?;
        let parent = equivalent(self, parent);
        let path = self.to_native(&parent.child(name));
        if path.is_dir() {
            return Ok(None);
        }
        let mut bytes = Vec::new();
        content.read_to_end(&mut bytes)?;
        io::write_atomic(&path, &bytes, self.robustness)?;
        tracing::debug!(?path, size = bytes.len(), "Stored file");
        Ok(Some(FileEntry::with_content(parent, name, DiskContent::new(path))))
    }

    fn remove(&self, entry: &Entry) -> Result<()> {
        self.check_writable("remove")?;
        let path = match entry {
            Entry::Directory(dir) => self.to_native(dir),
            Entry::File(file) => self.to_native(&file.parent().child(file.name())),
        };
        if path == self.base {
            return Err(Error::unsupported("remove root"));
        }
        let removed = if path.is_dir() {
            fs::remove_dir_all(&path)
        } else {
            fs::remove_file(&path)
        };
        match removed {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(Error::io(&path, e)),
        }
    }
}
