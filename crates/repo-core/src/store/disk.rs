//! Artifact store over a local repository directory.

use std::collections::BTreeSet;
use std::fs::{self, File};
use std::io::Read;
use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use repo_fs::io::write_atomic;
use repo_fs::{RobustnessConfig, Timestamp};
use repo_meta::{ARCHETYPE_CATALOG_FILE_NAME, ArchetypeCatalog, METADATA_FILE_NAME, Metadata};

use super::ArtifactStore;
use crate::artifact::Artifact;
use crate::layout::{FileMatch, artifact_file};
use crate::{Error, Result};

/// A store laid out exactly like a remote repository on disk.
///
/// Index documents found on disk are parsed and served as they are; nothing
/// is synthesized. Read-only unless built with [`DiskArtifactStore::writable`].
pub struct DiskArtifactStore {
    root: PathBuf,
    writable: bool,
    robustness: RobustnessConfig,
    lock: Mutex<()>,
}

impl DiskArtifactStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            writable: false,
            robustness: RobustnessConfig::default(),
            lock: Mutex::new(()),
        }
    }

    pub fn writable(root: impl Into<PathBuf>) -> Self {
        Self {
            writable: true,
            ..Self::new(root)
        }
    }

    pub fn with_robustness(mut self, robustness: RobustnessConfig) -> Self {
        self.robustness = robustness;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn is_writable(&self) -> bool {
        self.writable
    }

    /// Map slash or dot separated segments under the root.
    ///
    /// `.` is skipped and `..` climbs back out, never above the root.
    fn native<'a>(&self, segments: impl IntoIterator<Item = &'a str>) -> PathBuf {
        let mut stack: Vec<&str> = Vec::new();
        for segment in segments {
            match segment {
                "" | "." => {}
                ".." => {
                    stack.pop();
                }
                name => stack.push(name),
            }
        }
        stack.iter().fold(self.root.clone(), |path, name| path.join(name))
    }

    fn group_dir(&self, group_id: &str) -> PathBuf {
        self.native(group_id.split('.'))
    }

    fn artifact_file(&self, artifact: &Artifact) -> PathBuf {
        let name = artifact.name();
        self.native(
            artifact
                .group_id()
                .split('.')
                .chain([artifact.artifact_id(), artifact.version(), name.as_str()]),
        )
    }

    fn document_file(&self, directory: &str, file_name: &str) -> PathBuf {
        self.native(directory.split('/').chain([file_name]))
    }

    pub(super) fn existing_artifact(&self, artifact: &Artifact) -> Result<PathBuf> {
        let path = self.artifact_file(artifact);
        if path.is_file() {
            Ok(path)
        } else {
            Err(Error::artifact_not_found(artifact))
        }
    }

    fn ensure_writable(&self, operation: &'static str) -> Result<()> {
        if self.writable {
            Ok(())
        } else {
            Err(Error::unsupported(operation))
        }
    }

    fn write(&self, path: &Path, bytes: &[u8]) -> Result<()> {
        let _guard = self.lock.lock();
        write_atomic(path, bytes, self.robustness)?;
        tracing::debug!(path = %path.display(), bytes = bytes.len(), "Stored file");
        Ok(())
    }
}

fn subdirectories(dir: &Path) -> BTreeSet<String> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            tracing::debug!(path = %dir.display(), error = %e, "Directory not readable");
            return BTreeSet::new();
        }
    };
    entries
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_ok_and(|kind| kind.is_dir()))
        .filter_map(|entry| entry.file_name().into_string().ok())
        .collect()
}

fn modified_time(path: &Path) -> Result<Timestamp> {
    fs::metadata(path)
        .and_then(|m| m.modified())
        .map(Timestamp::from)
        .map_err(|e| Error::io(path, e))
}

fn read_file(path: &Path) -> Result<File> {
    File::open(path).map_err(|e| Error::io(path, e))
}

impl ArtifactStore for DiskArtifactStore {
    fn group_ids(&self, parent_group_id: &str) -> BTreeSet<String> {
        let _guard = self.lock.lock();
        subdirectories(&self.group_dir(parent_group_id))
    }

    fn artifact_ids(&self, group_id: &str) -> BTreeSet<String> {
        let _guard = self.lock.lock();
        subdirectories(&self.group_dir(group_id))
    }

    fn versions(&self, group_id: &str, artifact_id: &str) -> BTreeSet<String> {
        let _guard = self.lock.lock();
        subdirectories(&self.native(group_id.split('.').chain([artifact_id])))
    }

    fn artifacts(&self, group_id: &str, artifact_id: &str, version: &str) -> BTreeSet<Artifact> {
        let _guard = self.lock.lock();
        let dir = self.native(group_id.split('.').chain([artifact_id, version]));
        let Ok(entries) = fs::read_dir(&dir) else {
            return BTreeSet::new();
        };
        entries
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_type().is_ok_and(|kind| kind.is_file()))
            .filter_map(|entry| entry.file_name().into_string().ok())
            .filter_map(
                |name| match artifact_file(group_id, artifact_id, version, &name) {
                    FileMatch::Artifact(artifact) => Some(artifact),
                    FileMatch::BadTimestamp | FileMatch::NoMatch => None,
                },
            )
            .collect()
    }

    fn last_modified(&self, artifact: &Artifact) -> Result<Timestamp> {
        modified_time(&self.existing_artifact(artifact)?)
    }

    fn size(&self, artifact: &Artifact) -> Result<u64> {
        let path = self.existing_artifact(artifact)?;
        fs::metadata(&path)
            .map(|m| m.len())
            .map_err(|e| Error::io(&path, e))
    }

    fn get(&self, artifact: &Artifact) -> Result<Box<dyn Read + Send>> {
        let path = self.existing_artifact(artifact)?;
        Ok(Box::new(read_file(&path)?))
    }

    fn set(&self, artifact: &Artifact, content: &mut dyn Read) -> Result<()> {
        self.ensure_writable("set")?;
        let mut bytes = Vec::new();
        content.read_to_end(&mut bytes)?;
        self.write(&self.artifact_file(artifact), &bytes)
    }

    fn metadata(&self, path: &str) -> Result<Metadata> {
        let file = self.document_file(path, METADATA_FILE_NAME);
        if !file.is_file() {
            return Err(Error::metadata_not_found(path));
        }
        Metadata::read(&mut read_file(&file)?).map_err(|e| {
            tracing::warn!(path = %file.display(), error = %e, "Unreadable metadata on disk");
            Error::from(e)
        })
    }

    fn set_metadata(&self, path: &str, metadata: &Metadata) -> Result<()> {
        self.ensure_writable("set_metadata")?;
        let xml = metadata.to_xml()?;
        self.write(&self.document_file(path, METADATA_FILE_NAME), xml.as_bytes())
    }

    fn metadata_last_modified(&self, path: &str) -> Result<Timestamp> {
        let file = self.document_file(path, METADATA_FILE_NAME);
        if !file.is_file() {
            return Err(Error::metadata_not_found(path));
        }
        modified_time(&file)
    }

    fn archetype_catalog(&self) -> Result<ArchetypeCatalog> {
        let file = self.root.join(ARCHETYPE_CATALOG_FILE_NAME);
        if !file.is_file() {
            return Err(Error::ArchetypeCatalogNotFound);
        }
        ArchetypeCatalog::read(&mut read_file(&file)?).map_err(|e| {
            tracing::warn!(path = %file.display(), error = %e, "Unreadable archetype catalog on disk");
            Error::from(e)
        })
    }

    fn archetype_catalog_last_modified(&self) -> Result<Timestamp> {
        let file = self.root.join(ARCHETYPE_CATALOG_FILE_NAME);
        if !file.is_file() {
            return Err(Error::ArchetypeCatalogNotFound);
        }
        modified_time(&file)
    }

    fn set_archetype_catalog(&self, content: &mut dyn Read) -> Result<()> {
        self.ensure_writable("set_archetype_catalog")?;
        let catalog = ArchetypeCatalog::read(content)?;
        let xml = catalog.to_xml()?;
        self.write(&self.root.join(ARCHETYPE_CATALOG_FILE_NAME), xml.as_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn touch(root: &Path, relative: &str, content: &str) {
        let path = root.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn layout() -> TempDir {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "org/acme/foo/1.0/foo-1.0.jar", "jar");
        touch(dir.path(), "org/acme/foo/1.0/foo-1.0-sources.jar", "src");
        touch(dir.path(), "org/acme/foo/1.0/foo-1.0.jar.sha1", "abc");
        touch(dir.path(), "org/acme/foo/1.0/notes.txt", "ignored");
        touch(
            dir.path(),
            "org/acme/foo/2.0-SNAPSHOT/foo-2.0-20240101.120000-3.pom",
            "<project/>",
        );
        touch(dir.path(), "org/acme/foo/2.0-SNAPSHOT/foo-2.0-SNAPSHOT.jar", "jar");
        dir
    }

    #[test]
    fn test_enumeration_follows_directories() {
        let dir = layout();
        let store = DiskArtifactStore::new(dir.path());

        assert_eq!(store.group_ids(""), BTreeSet::from(["org".to_string()]));
        assert_eq!(store.group_ids("org"), BTreeSet::from(["acme".to_string()]));
        assert_eq!(store.artifact_ids("org.acme"), BTreeSet::from(["foo".to_string()]));
        assert_eq!(
            store.versions("org.acme", "foo"),
            BTreeSet::from(["1.0".to_string(), "2.0-SNAPSHOT".to_string()])
        );
    }

    #[test]
    fn test_artifacts_decode_file_names() {
        let dir = layout();
        let store = DiskArtifactStore::new(dir.path());

        let names: Vec<String> = store
            .artifacts("org.acme", "foo", "1.0")
            .iter()
            .map(Artifact::name)
            .collect();
        assert_eq!(
            names,
            vec!["foo-1.0-sources.jar", "foo-1.0.jar", "foo-1.0.jar.sha1"]
        );

        let snapshots = store.artifacts("org.acme", "foo", "2.0-SNAPSHOT");
        assert_eq!(snapshots.len(), 2);
        assert!(snapshots.iter().any(|a| a.build_number() == Some(3)));
    }

    #[test]
    fn test_read_only_by_default() {
        let dir = layout();
        let store = DiskArtifactStore::new(dir.path());
        let artifact = Artifact::new("org.acme", "bar", "1.0", "jar");

        let err = store.set(&artifact, &mut &b"x"[..]).unwrap_err();
        assert!(matches!(err, Error::Unsupported { operation: "set" }));
        assert!(store.get(&artifact).err().unwrap().is_not_found());
    }

    #[test]
    fn test_writable_store_round_trip() {
        let dir = TempDir::new().unwrap();
        let store = DiskArtifactStore::writable(dir.path());
        let artifact = Artifact::new("org.acme", "bar", "1.0", "jar");

        store.set(&artifact, &mut &b"payload"[..]).unwrap();

        assert!(dir.path().join("org/acme/bar/1.0/bar-1.0.jar").is_file());
        assert_eq!(store.size(&artifact).unwrap(), 7);
        let mut text = String::new();
        store.get(&artifact).unwrap().read_to_string(&mut text).unwrap();
        assert_eq!(text, "payload");
    }

    #[test]
    fn test_metadata_is_read_from_disk() {
        let dir = layout();
        touch(
            dir.path(),
            "org/acme/foo/maven-metadata.xml",
            "<metadata><groupId>org.acme</groupId><artifactId>foo</artifactId>\
             <versioning><versions><version>1.0</version></versions></versioning></metadata>",
        );
        let store = DiskArtifactStore::new(dir.path());

        let metadata = store.metadata("/org/acme/foo/").unwrap();
        assert_eq!(metadata.artifact_id.as_deref(), Some("foo"));
        assert!(store.metadata_last_modified("org/acme/foo").is_ok());
        assert!(store.metadata("org/acme").unwrap_err().is_not_found());
    }

    #[test]
    fn test_set_metadata_writes_document() {
        let dir = TempDir::new().unwrap();
        let store = DiskArtifactStore::writable(dir.path());
        let metadata = Metadata {
            group_id: Some("org.acme".into()),
            ..Metadata::default()
        };

        store.set_metadata("org/acme", &metadata).unwrap();

        assert_eq!(store.metadata("org/acme").unwrap(), metadata);
    }

    #[test]
    fn test_dot_dot_cannot_escape_root() {
        let dir = TempDir::new().unwrap();
        let root = dir.path().join("repo");
        fs::create_dir_all(&root).unwrap();
        touch(dir.path(), "maven-metadata.xml", "<metadata/>");
        let store = DiskArtifactStore::new(&root);

        assert!(store.metadata("../..").unwrap_err().is_not_found());
    }

    #[test]
    fn test_archetype_catalog_file() {
        let dir = TempDir::new().unwrap();
        let store = DiskArtifactStore::writable(dir.path());
        assert!(store.archetype_catalog().unwrap_err().is_not_found());

        let xml = "<archetype-catalog><archetypes><archetype>\
                   <groupId>g</groupId><artifactId>a</artifactId><version>1</version>\
                   </archetype></archetypes></archetype-catalog>";
        store.set_archetype_catalog(&mut xml.as_bytes()).unwrap();

        assert_eq!(store.archetype_catalog().unwrap().archetypes[0].artifact_id, "a");
        assert!(store.archetype_catalog_last_modified().is_ok());
    }
}
