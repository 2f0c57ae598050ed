//! Artifact store mocked up from a tree of project models.
//!
//! Every `*.pom` below the root becomes a POM artifact. Its packaging decides
//! which main artifact is generated next to it, and files beside it named
//! `<pom base name>-<classifier>.<type>` become classified artifacts.

use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};

use chrono::Utc;
use repo_fs::Timestamp;
use repo_meta::{ARCHETYPE_CATALOG_FILE_NAME, ArchetypeCatalog, Metadata, Pom};
use walkdir::WalkDir;

use super::{ArtifactStore, MemoryArtifactStore};
use crate::artifact::Artifact;
use crate::{Error, Result, jar};

const POM_EXTENSION: &str = "pom";
const JAR_EXTENSION: &str = "jar";

fn modified(path: &Path) -> Result<Timestamp> {
    fs::metadata(path)
        .and_then(|m| m.modified())
        .map(Timestamp::from)
        .map_err(|e| Error::io(path, e))
}

/// Jar content for `path`: the archived directory, or the file itself.
fn archive_or_file(path: &Path) -> Result<(Vec<u8>, Timestamp)> {
    if path.is_dir() {
        let bytes = jar::directory_jar(path).map_err(|e| Error::io(path, e))?;
        Ok((bytes, Utc::now()))
    } else {
        let bytes = fs::read(path).map_err(|e| Error::io(path, e))?;
        Ok((bytes, modified(path)?))
    }
}

/// Read-write store seeded once from the project models under a directory.
///
/// Scanning happens at construction; later changes to the directory are not
/// seen. Generated and uploaded content lives in memory, and metadata is
/// synthesized exactly as for a [`MemoryArtifactStore`].
pub struct MockArtifactStore {
    root: PathBuf,
    artifacts: MemoryArtifactStore,
}

impl MockArtifactStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let store = Self {
            root: root.into(),
            artifacts: MemoryArtifactStore::new(),
        };
        store.scan();
        store
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn scan(&self) {
        if !self.root.is_dir() {
            tracing::warn!(root = %self.root.display(), "Nothing to mock, directory does not exist");
            return;
        }
        let walker = WalkDir::new(&self.root).sort_by_file_name();
        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    tracing::warn!(error = %e, "Skipping unreadable directory entry");
                    continue;
                }
            };
            let is_pom = entry.path().extension().is_some_and(|ext| ext == POM_EXTENSION);
            if !entry.file_type().is_file() || !is_pom {
                continue;
            }
            if let Err(e) = self.register(entry.path()) {
                tracing::warn!(path = %entry.path().display(), error = %e, "Skipping project model");
            }
        }
        self.load_catalog();
    }

    fn register(&self, pom_path: &Path) -> Result<()> {
        let bytes = fs::read(pom_path).map_err(|e| Error::io(pom_path, e))?;
        let pom = Pom::read(&mut bytes.as_slice())?;
        let (Some(group_id), Some(artifact_id), Some(version)) = (
            pom.effective_group_id(),
            pom.artifact_id.as_deref(),
            pom.effective_version(),
        ) else {
            tracing::warn!(path = %pom_path.display(), "Project model has no complete coordinates");
            return Ok(());
        };
        let coordinates = |kind: &str| Artifact::new(group_id, artifact_id, version, kind);

        self.artifacts
            .put_bytes(&coordinates(POM_EXTENSION), &bytes, modified(pom_path)?);

        let Some(directory) = pom_path.parent() else {
            return Ok(());
        };
        let base_name = pom_path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_default();

        let main = match pom.packaging.as_deref() {
            None | Some("") | Some(JAR_EXTENSION) => {
                let exploded = directory.join(format!("{base_name}.{JAR_EXTENSION}"));
                if exploded.is_dir() {
                    Some(jar::directory_jar(&exploded).map_err(|e| Error::io(&exploded, e))?)
                } else {
                    Some(jar::empty_jar().map_err(|e| Error::io(pom_path, e))?)
                }
            }
            _ if pom.is_plugin() => Some(
                jar::plugin_jar(group_id, artifact_id, version).map_err(|e| Error::io(pom_path, e))?,
            ),
            _ => None,
        };
        if let Some(main) = main {
            self.artifacts
                .put_bytes(&coordinates(JAR_EXTENSION), &main, Utc::now());
        }

        self.register_classified(directory, &base_name, &coordinates(POM_EXTENSION))
    }

    /// Register `<base_name>-<classifier>.<type>` siblings of a project model.
    fn register_classified(&self, directory: &Path, base_name: &str, pom: &Artifact) -> Result<()> {
        let prefix = format!("{base_name}-");
        let mut siblings: Vec<PathBuf> = fs::read_dir(directory)
            .map_err(|e| Error::io(directory, e))?
            .filter_map(|entry| entry.ok().map(|entry| entry.path()))
            .collect();
        siblings.sort();

        for sibling in siblings {
            let (Some(stem), Some(kind)) = (
                sibling.file_stem().and_then(|stem| stem.to_str()),
                sibling.extension().and_then(|ext| ext.to_str()),
            ) else {
                continue;
            };
            let Some(classifier) = stem.strip_prefix(&prefix) else {
                continue;
            };
            let artifact = Artifact::new(pom.group_id(), pom.artifact_id(), pom.version(), kind)
                .with_classifier(Some(classifier));
            let (bytes, last_modified) = archive_or_file(&sibling)?;
            tracing::debug!(%artifact, path = %sibling.display(), "Registered classified artifact");
            self.artifacts.put_bytes(&artifact, &bytes, last_modified);
        }
        Ok(())
    }

    fn load_catalog(&self) {
        let path = self.root.join(ARCHETYPE_CATALOG_FILE_NAME);
        if !path.is_file() {
            return;
        }
        let loaded = fs::File::open(&path)
            .map_err(|e| Error::io(&path, e))
            .and_then(|mut file| Ok(ArchetypeCatalog::read(&mut file)?))
            .and_then(|catalog| Ok((catalog, modified(&path)?)));
        match loaded {
            Ok((catalog, last_modified)) => self.artifacts.put_archetype_catalog(catalog, last_modified),
            Err(e) => tracing::warn!(path = %path.display(), error = %e, "Ignoring archetype catalog"),
        }
    }
}

impl ArtifactStore for MockArtifactStore {
    fn group_ids(&self, parent_group_id: &str) -> std::collections::BTreeSet<String> {
        self.artifacts.group_ids(parent_group_id)
    }

    fn artifact_ids(&self, group_id: &str) -> std::collections::BTreeSet<String> {
        self.artifacts.artifact_ids(group_id)
    }

    fn versions(&self, group_id: &str, artifact_id: &str) -> std::collections::BTreeSet<String> {
        self.artifacts.versions(group_id, artifact_id)
    }

    fn artifacts(
        &self,
        group_id: &str,
        artifact_id: &str,
        version: &str,
    ) -> std::collections::BTreeSet<Artifact> {
        self.artifacts.artifacts(group_id, artifact_id, version)
    }

    fn last_modified(&self, artifact: &Artifact) -> Result<Timestamp> {
        self.artifacts.last_modified(artifact)
    }

    fn size(&self, artifact: &Artifact) -> Result<u64> {
        self.artifacts.size(artifact)
    }

    fn get(&self, artifact: &Artifact) -> Result<Box<dyn Read + Send>> {
        self.artifacts.get(artifact)
    }

    fn set(&self, artifact: &Artifact, content: &mut dyn Read) -> Result<()> {
        self.artifacts.set(artifact, content)
    }

    fn metadata(&self, path: &str) -> Result<Metadata> {
        self.artifacts.metadata(path)
    }

    fn set_metadata(&self, path: &str, metadata: &Metadata) -> Result<()> {
        self.artifacts.set_metadata(path, metadata)
    }

    fn metadata_last_modified(&self, path: &str) -> Result<Timestamp> {
        self.artifacts.metadata_last_modified(path)
    }

    fn archetype_catalog(&self) -> Result<ArchetypeCatalog> {
        self.artifacts.archetype_catalog()
    }

    fn archetype_catalog_last_modified(&self) -> Result<Timestamp> {
        self.artifacts.archetype_catalog_last_modified()
    }

    fn set_archetype_catalog(&self, content: &mut dyn Read) -> Result<()> {
        self.artifacts.set_archetype_catalog(content)
    }
}
