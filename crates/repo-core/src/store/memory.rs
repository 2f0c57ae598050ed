//! In-process artifact store with synthesized metadata.

use std::collections::{BTreeMap, BTreeSet};
use std::io::Read;

use chrono::Utc;
use parking_lot::Mutex;
use repo_fs::{FileContent, MemoryContent, Timestamp};
use repo_meta::{
    ArchetypeCatalog, Metadata, Plugin, Pom, Snapshot, SnapshotVersion, Versioning,
    format_last_updated, sort_versions,
};

use super::{ArtifactStore, MetadataPath, child_segments};
use crate::artifact::Artifact;
use crate::{Error, Result};

type Files = BTreeMap<Artifact, MemoryContent>;
type Versions = BTreeMap<String, Files>;
type ArtifactIds = BTreeMap<String, Versions>;

#[derive(Default)]
struct Contents {
    groups: BTreeMap<String, ArtifactIds>,
    catalog: Option<(ArchetypeCatalog, Timestamp)>,
}

/// Artifacts held in memory, keyed group → artifact → version → file.
///
/// `maven-metadata.xml` is never stored; it is computed from the artifacts on
/// every request. All reads and writes on one instance are serialized on a
/// single lock so a metadata document always reflects one consistent state.
#[derive(Default)]
pub struct MemoryArtifactStore {
    contents: Mutex<Contents>,
}

impl MemoryArtifactStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `bytes` as `artifact` with an explicit modification time.
    pub fn put_bytes(&self, artifact: &Artifact, bytes: &[u8], last_modified: Timestamp) {
        self.contents
            .lock()
            .insert(artifact, MemoryContent::new(bytes, last_modified));
    }

    /// Replace the archetype catalog with an explicit modification time.
    pub fn put_archetype_catalog(&self, catalog: ArchetypeCatalog, last_modified: Timestamp) {
        self.contents.lock().catalog = Some((catalog, last_modified));
    }
}

impl Contents {
    fn files(&self, group_id: &str, artifact_id: &str, version: &str) -> Option<&Files> {
        self.groups.get(group_id)?.get(artifact_id)?.get(version)
    }

    fn insert(&mut self, artifact: &Artifact, content: MemoryContent) {
        self.groups
            .entry(artifact.group_id().to_owned())
            .or_default()
            .entry(artifact.artifact_id().to_owned())
            .or_default()
            .entry(artifact.version().to_owned())
            .or_default()
            .insert(artifact.clone(), content);
    }

    /// Exact match, or for an unresolved snapshot the newest stored build.
    fn find(&self, artifact: &Artifact) -> Option<&MemoryContent> {
        let files = self.files(artifact.group_id(), artifact.artifact_id(), artifact.version())?;
        if let Some(content) = files.get(artifact) {
            return Some(content);
        }
        if !artifact.is_snapshot() || artifact.timestamp().is_some() {
            return None;
        }
        files
            .iter()
            .filter(|(candidate, _)| artifact.equal_snapshots(candidate))
            .max_by(|(a, _), (b, _)| a.cmp(b))
            .map(|(_, content)| content)
    }

    fn content(&self, artifact: &Artifact) -> Result<&MemoryContent> {
        self.find(artifact)
            .ok_or_else(|| Error::artifact_not_found(artifact))
    }

    fn metadata(&self, path: &str) -> Result<Metadata> {
        let readings = MetadataPath::parse(path);
        let mut metadata = Metadata::default();
        let mut found = false;

        let plugins = self.plugins(&readings.group_id);
        if !plugins.is_empty() {
            metadata.plugins = plugins;
            found = true;
        }

        if let Some((group_id, artifact_id)) = &readings.artifact
            && let Some(versioning) = self.artifact_versioning(group_id, artifact_id)
        {
            metadata.group_id = Some(group_id.clone());
            metadata.artifact_id = Some(artifact_id.clone());
            metadata.versioning = Some(versioning);
            found = true;
        }

        if let Some((group_id, artifact_id, version)) = &readings.snapshot {
            let existing = metadata.versioning.take();
            let base = existing.clone().unwrap_or_default();
            match self.snapshot_versioning(group_id, artifact_id, version, base) {
                Some(versioning) => {
                    metadata.group_id = Some(group_id.clone());
                    metadata.artifact_id = Some(artifact_id.clone());
                    metadata.version = Some(version.clone());
                    metadata.versioning = Some(versioning);
                    found = true;
                }
                None => metadata.versioning = existing,
            }
        }

        if found {
            Ok(metadata)
        } else {
            Err(Error::metadata_not_found(path))
        }
    }

    /// Plugins published directly under `group_id`.
    fn plugins(&self, group_id: &str) -> Vec<Plugin> {
        let Some(artifact_ids) = self.groups.get(group_id) else {
            return Vec::new();
        };
        let mut plugins = Vec::new();
        for (artifact_id, versions) in artifact_ids {
            let mut candidates: Vec<String> = versions.keys().cloned().collect();
            sort_versions(&mut candidates);
            for version in candidates.iter().rev() {
                let Some(pom) = self.pom(group_id, artifact_id, version) else {
                    continue;
                };
                if !pom.is_plugin() {
                    continue;
                }
                plugins.push(Plugin {
                    name: pom.name.clone(),
                    prefix: pom.plugin_prefix(artifact_id),
                    artifact_id: artifact_id.clone(),
                });
                break;
            }
        }
        plugins
    }

    fn pom(&self, group_id: &str, artifact_id: &str, version: &str) -> Option<Pom> {
        let pom = Artifact::new(group_id, artifact_id, version, "pom");
        let content = self.find(&pom)?;
        match Pom::read(&mut content.bytes()) {
            Ok(pom) => Some(pom),
            Err(e) => {
                tracing::warn!(artifact = %pom, error = %e, "Skipping unreadable project model");
                None
            }
        }
    }

    fn artifact_versioning(&self, group_id: &str, artifact_id: &str) -> Option<Versioning> {
        let versions = self.groups.get(group_id)?.get(artifact_id)?;
        if versions.is_empty() {
            return None;
        }
        let mut ordered: Vec<String> = versions.keys().cloned().collect();
        sort_versions(&mut ordered);

        let mut versioning = Versioning::default();
        let mut last_updated: Option<Timestamp> = None;
        for version in ordered {
            let pom = Artifact::new(group_id, artifact_id, version.as_str(), "pom");
            let Some(content) = self.find(&pom) else {
                continue;
            };
            let Ok(modified) = content.last_modified() else {
                continue;
            };
            versioning.add_version(version.as_str());
            if last_updated.is_none_or(|newest| modified >= newest) {
                last_updated = Some(modified);
                versioning.set_last_updated(modified);
                if !pom.is_snapshot() {
                    versioning.release = Some(version.clone());
                }
                versioning.latest = Some(version);
            }
        }
        Some(versioning)
    }

    /// Fold the snapshot reading into `versioning`, or `None` when nothing is stored there.
    fn snapshot_versioning(
        &self,
        group_id: &str,
        artifact_id: &str,
        version: &str,
        mut versioning: Versioning,
    ) -> Option<Versioning> {
        let files = self.files(group_id, artifact_id, version)?;

        let mut snapshot_versions: Vec<SnapshotVersion> = Vec::new();
        let mut max_build = 0;
        let mut build_timestamp = None;
        let mut newest_pom: Option<Timestamp> = None;

        for (artifact, content) in files {
            let Ok(modified) = content.last_modified() else {
                continue;
            };
            let candidate = SnapshotVersion {
                classifier: artifact.classifier().unwrap_or_default().to_owned(),
                extension: artifact.kind().to_owned(),
                value: artifact.timestamp_version(),
                updated: Some(format_last_updated(modified)),
            };
            match snapshot_versions
                .iter_mut()
                .find(|known| known.key() == candidate.key())
            {
                Some(known) if known.updated < candidate.updated => *known = candidate,
                Some(_) => {}
                None => snapshot_versions.push(candidate),
            }

            if artifact.kind() == "pom" {
                match artifact.build_number() {
                    Some(build) if build > max_build => {
                        max_build = build;
                        build_timestamp = artifact.timestamp_string();
                    }
                    _ => max_build = max_build.max(1),
                }
                newest_pom = newest_pom.max(Some(modified));
            }
        }

        if snapshot_versions.is_empty() && newest_pom.is_none() {
            return None;
        }
        for snapshot_version in snapshot_versions {
            versioning.put_snapshot_version(snapshot_version);
        }
        if max_build > 0 {
            versioning.snapshot = Some(Snapshot {
                timestamp: build_timestamp,
                build_number: max_build,
                local_copy: false,
            });
        }
        if let Some(newest) = newest_pom {
            versioning.set_last_updated(newest);
        }
        Some(versioning)
    }

    fn metadata_last_modified(&self, path: &str) -> Result<Timestamp> {
        let readings = MetadataPath::parse(path);
        let mut newest: Option<Timestamp> = None;
        let mut observe = |files: &Files| {
            for content in files.values() {
                if let Ok(modified) = content.last_modified() {
                    newest = newest.max(Some(modified));
                }
            }
        };

        if let Some(artifact_ids) = self.groups.get(&readings.group_id) {
            artifact_ids.values().flat_map(BTreeMap::values).for_each(&mut observe);
        }
        if let Some((group_id, artifact_id)) = &readings.artifact
            && let Some(versions) = self.groups.get(group_id).and_then(|ids| ids.get(artifact_id))
        {
            versions.values().for_each(&mut observe);
        }
        if let Some((group_id, artifact_id, version)) = &readings.snapshot
            && let Some(files) = self.files(group_id, artifact_id, version)
        {
            observe(files);
        }

        newest.ok_or_else(|| Error::metadata_not_found(path))
    }
}

impl ArtifactStore for MemoryArtifactStore {
    fn group_ids(&self, parent_group_id: &str) -> BTreeSet<String> {
        let contents = self.contents.lock();
        child_segments(contents.groups.keys(), parent_group_id)
    }

    fn artifact_ids(&self, group_id: &str) -> BTreeSet<String> {
        let contents = self.contents.lock();
        contents
            .groups
            .get(group_id)
            .map(|ids| ids.keys().cloned().collect())
            .unwrap_or_default()
    }

    fn versions(&self, group_id: &str, artifact_id: &str) -> BTreeSet<String> {
        let contents = self.contents.lock();
        contents
            .groups
            .get(group_id)
            .and_then(|ids| ids.get(artifact_id))
            .map(|versions| versions.keys().cloned().collect())
            .unwrap_or_default()
    }

    fn artifacts(&self, group_id: &str, artifact_id: &str, version: &str) -> BTreeSet<Artifact> {
        let contents = self.contents.lock();
        contents
            .files(group_id, artifact_id, version)
            .map(|files| files.keys().cloned().collect())
            .unwrap_or_default()
    }

    fn last_modified(&self, artifact: &Artifact) -> Result<Timestamp> {
        Ok(self.contents.lock().content(artifact)?.last_modified()?)
    }

    fn size(&self, artifact: &Artifact) -> Result<u64> {
        Ok(self.contents.lock().content(artifact)?.size()?)
    }

    fn get(&self, artifact: &Artifact) -> Result<Box<dyn Read + Send>> {
        Ok(self.contents.lock().content(artifact)?.open()?)
    }

    fn set(&self, artifact: &Artifact, content: &mut dyn Read) -> Result<()> {
        let mut bytes = Vec::new();
        content.read_to_end(&mut bytes)?;
        self.put_bytes(artifact, &bytes, Utc::now());
        Ok(())
    }

    fn metadata(&self, path: &str) -> Result<Metadata> {
        self.contents.lock().metadata(path)
    }

    fn metadata_last_modified(&self, path: &str) -> Result<Timestamp> {
        self.contents.lock().metadata_last_modified(path)
    }

    fn archetype_catalog(&self) -> Result<ArchetypeCatalog> {
        self.contents
            .lock()
            .catalog
            .as_ref()
            .map(|(catalog, _)| catalog.clone())
            .ok_or(Error::ArchetypeCatalogNotFound)
    }

    fn archetype_catalog_last_modified(&self) -> Result<Timestamp> {
        self.contents
            .lock()
            .catalog
            .as_ref()
            .map(|(_, modified)| *modified)
            .ok_or(Error::ArchetypeCatalogNotFound)
    }

    fn set_archetype_catalog(&self, content: &mut dyn Read) -> Result<()> {
        let catalog = ArchetypeCatalog::read(content)?;
        self.contents.lock().catalog = Some((catalog, Utc::now()));
        Ok(())
    }
}
