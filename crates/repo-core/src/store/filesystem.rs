//! Read-only artifact store over an arbitrary file system.

use std::collections::BTreeSet;
use std::io::Read;
use std::sync::Arc;

use repo_fs::{DirectoryEntry, Entry, FileEntry, FileSystem, Timestamp, get_directory, get_file};
use repo_meta::{ARCHETYPE_CATALOG_FILE_NAME, ArchetypeCatalog, METADATA_FILE_NAME, Metadata};

use super::{ArtifactStore, document_path};
use crate::artifact::Artifact;
use crate::layout::{FileMatch, artifact_file};
use crate::{Error, Result};

/// Artifacts laid out in the standard repository layout inside a [`FileSystem`].
///
/// Metadata and the archetype catalog are whatever documents the file system
/// already holds; nothing is synthesized.
pub struct FileSystemArtifactStore {
    backing: Arc<dyn FileSystem>,
}

impl FileSystemArtifactStore {
    pub fn new(backing: Arc<dyn FileSystem>) -> Self {
        Self { backing }
    }

    fn directory(&self, segments: &[&str]) -> Option<DirectoryEntry> {
        get_directory(self.backing.as_ref(), &segments.join("/"))
    }

    fn group_directory(&self, group_id: &str) -> Option<DirectoryEntry> {
        if group_id.is_empty() {
            return Some(self.backing.root());
        }
        self.directory(&[&group_id.replace('.', "/")])
    }

    fn subdirectories(&self, directory: Option<DirectoryEntry>) -> BTreeSet<String> {
        let Some(directory) = directory else {
            return BTreeSet::new();
        };
        self.backing
            .list_entries(&directory)
            .into_iter()
            .filter(Entry::is_directory)
            .map(|entry| entry.name().to_owned())
            .collect()
    }

    fn files(&self, group_id: &str, artifact_id: &str, version: &str) -> Vec<(Artifact, FileEntry)> {
        let group_path = group_id.replace('.', "/");
        let Some(directory) = self.directory(&[&group_path, artifact_id, version]) else {
            return Vec::new();
        };
        self.backing
            .list_entries(&directory)
            .into_iter()
            .filter_map(|entry| match entry {
                Entry::File(file) => match artifact_file(group_id, artifact_id, version, file.name()) {
                    FileMatch::Artifact(artifact) => Some((artifact, file)),
                    FileMatch::BadTimestamp | FileMatch::NoMatch => None,
                },
                Entry::Directory(_) => None,
            })
            .collect()
    }

    /// The file holding `artifact`; an unresolved snapshot reads its newest build.
    fn file(&self, artifact: &Artifact) -> Result<FileEntry> {
        if let Some(file) = get_file(self.backing.as_ref(), &artifact.path()) {
            return Ok(file);
        }
        if artifact.is_snapshot() && artifact.timestamp().is_none() {
            let newest = self
                .files(artifact.group_id(), artifact.artifact_id(), artifact.version())
                .into_iter()
                .filter(|(candidate, _)| artifact.equal_snapshots(candidate))
                .max_by(|(a, _), (b, _)| a.cmp(b));
            if let Some((_, file)) = newest {
                return Ok(file);
            }
        }
        Err(Error::artifact_not_found(artifact))
    }

    fn document(&self, path: &str) -> Option<FileEntry> {
        get_file(self.backing.as_ref(), path)
    }
}

impl ArtifactStore for FileSystemArtifactStore {
    fn group_ids(&self, parent_group_id: &str) -> BTreeSet<String> {
        self.subdirectories(self.group_directory(parent_group_id))
    }

    fn artifact_ids(&self, group_id: &str) -> BTreeSet<String> {
        if group_id.is_empty() {
            return BTreeSet::new();
        }
        self.subdirectories(self.group_directory(group_id))
    }

    fn versions(&self, group_id: &str, artifact_id: &str) -> BTreeSet<String> {
        self.subdirectories(self.directory(&[&group_id.replace('.', "/"), artifact_id]))
    }

    fn artifacts(&self, group_id: &str, artifact_id: &str, version: &str) -> BTreeSet<Artifact> {
        self.files(group_id, artifact_id, version)
            .into_iter()
            .map(|(artifact, _)| artifact)
            .collect()
    }

    fn last_modified(&self, artifact: &Artifact) -> Result<Timestamp> {
        Ok(self.file(artifact)?.last_modified()?)
    }

    fn size(&self, artifact: &Artifact) -> Result<u64> {
        Ok(self.file(artifact)?.size()?)
    }

    fn get(&self, artifact: &Artifact) -> Result<Box<dyn Read + Send>> {
        Ok(self.file(artifact)?.open()?)
    }

    fn metadata(&self, path: &str) -> Result<Metadata> {
        let location = document_path(path, METADATA_FILE_NAME);
        let file = self
            .document(&location)
            .ok_or_else(|| Error::metadata_not_found(path))?;
        let mut reader = file.open()?;
        Ok(Metadata::read(&mut reader)?)
    }

    fn metadata_last_modified(&self, path: &str) -> Result<Timestamp> {
        let location = document_path(path, METADATA_FILE_NAME);
        let file = self
            .document(&location)
            .ok_or_else(|| Error::metadata_not_found(path))?;
        Ok(file.last_modified()?)
    }

    fn archetype_catalog(&self) -> Result<ArchetypeCatalog> {
        let file = self
            .document(ARCHETYPE_CATALOG_FILE_NAME)
            .ok_or(Error::ArchetypeCatalogNotFound)?;
        let mut reader = file.open()?;
        Ok(ArchetypeCatalog::read(&mut reader)?)
    }

    fn archetype_catalog_last_modified(&self) -> Result<Timestamp> {
        let file = self
            .document(ARCHETYPE_CATALOG_FILE_NAME)
            .ok_or(Error::ArchetypeCatalogNotFound)?;
        Ok(file.last_modified()?)
    }
}
