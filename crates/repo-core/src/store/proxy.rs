//! Artifact store that fetches on demand through a resolver.

use std::collections::{BTreeMap, BTreeSet};
use std::fs::{self, File};
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::Utc;
use parking_lot::Mutex;
use repo_fs::Timestamp;
use repo_meta::Metadata;

use super::{ArtifactStore, DiskArtifactStore, MetadataPath, child_segments};
use crate::artifact::Artifact;
use crate::{Error, Result};

/// Source of artifacts and metadata for a [`ProxyArtifactStore`].
///
/// Absence is `ArtifactNotFound` for artifacts and `Ok(None)` for metadata;
/// any other error means the upstream could not be asked.
pub trait ArtifactResolver: Send + Sync {
    /// Local file holding the content of `artifact`.
    fn resolve_artifact(&self, artifact: &Artifact) -> Result<PathBuf>;

    fn resolve_snapshot_metadata(
        &self,
        group_id: &str,
        artifact_id: &str,
        version: &str,
    ) -> Result<Option<Metadata>>;

    fn resolve_artifact_metadata(&self, group_id: &str, artifact_id: &str) -> Result<Option<Metadata>>;

    fn resolve_group_metadata(&self, group_id: &str) -> Result<Option<Metadata>>;
}

/// Resolves against a directory already laid out as a repository, such as a
/// local cache populated by a build tool.
pub struct DirectoryResolver {
    upstream: DiskArtifactStore,
}

impl DirectoryResolver {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            upstream: DiskArtifactStore::new(root),
        }
    }

    pub fn root(&self) -> &Path {
        self.upstream.root()
    }

    fn document(&self, directory: &str) -> Result<Option<Metadata>> {
        match self.upstream.metadata(directory) {
            Ok(metadata) => Ok(Some(metadata)),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e),
        }
    }
}

impl ArtifactResolver for DirectoryResolver {
    fn resolve_artifact(&self, artifact: &Artifact) -> Result<PathBuf> {
        match self.upstream.existing_artifact(artifact) {
            Err(e) if e.is_not_found() && artifact.is_snapshot() && artifact.timestamp().is_none() => {
                let newest = self
                    .upstream
                    .artifacts(artifact.group_id(), artifact.artifact_id(), artifact.version())
                    .into_iter()
                    .filter(|candidate| artifact.equal_snapshots(candidate))
                    .max()
                    .ok_or(e)?;
                self.upstream.existing_artifact(&newest)
            }
            resolved => resolved,
        }
    }

    fn resolve_snapshot_metadata(
        &self,
        group_id: &str,
        artifact_id: &str,
        version: &str,
    ) -> Result<Option<Metadata>> {
        self.document(&format!("{}/{artifact_id}/{version}", group_id.replace('.', "/")))
    }

    fn resolve_artifact_metadata(&self, group_id: &str, artifact_id: &str) -> Result<Option<Metadata>> {
        self.document(&format!("{}/{artifact_id}", group_id.replace('.', "/")))
    }

    fn resolve_group_metadata(&self, group_id: &str) -> Result<Option<Metadata>> {
        self.document(&group_id.replace('.', "/"))
    }
}

type Resolved = BTreeMap<String, BTreeMap<String, BTreeMap<String, BTreeSet<Artifact>>>>;

/// Read-only store that asks an [`ArtifactResolver`] for everything.
///
/// Nothing can be enumerated up front. Every coordinate the resolver has
/// produced is remembered so later listings include it.
pub struct ProxyArtifactStore {
    resolver: Arc<dyn ArtifactResolver>,
    resolved: Mutex<Resolved>,
}

impl ProxyArtifactStore {
    pub fn new(resolver: Arc<dyn ArtifactResolver>) -> Self {
        Self {
            resolver,
            resolved: Mutex::new(Resolved::new()),
        }
    }

    fn versions_of<'a>(
        resolved: &'a mut Resolved,
        group_id: &str,
        artifact_id: &str,
    ) -> &'a mut BTreeMap<String, BTreeSet<Artifact>> {
        resolved
            .entry(group_id.to_owned())
            .or_default()
            .entry(artifact_id.to_owned())
            .or_default()
    }

    fn record_artifact(&self, artifact: &Artifact) {
        let mut resolved = self.resolved.lock();
        Self::versions_of(&mut resolved, artifact.group_id(), artifact.artifact_id())
            .entry(artifact.version().to_owned())
            .or_default()
            .insert(artifact.clone());
    }

    fn record_metadata(&self, metadata: &Metadata, group_id: &str) {
        let mut resolved = self.resolved.lock();
        for plugin in &metadata.plugins {
            Self::versions_of(&mut resolved, group_id, &plugin.artifact_id);
        }
        let (Some(group_id), Some(artifact_id)) = (&metadata.group_id, &metadata.artifact_id) else {
            return;
        };
        let versions = Self::versions_of(&mut resolved, group_id, artifact_id);
        let listed = metadata.versioning.iter().flat_map(|v| v.versions.iter());
        for version in listed.chain(metadata.version.iter()) {
            versions.entry(version.clone()).or_default();
        }
    }

    fn resolve(&self, artifact: &Artifact) -> Result<PathBuf> {
        let path = self.resolver.resolve_artifact(artifact)?;
        self.record_artifact(artifact);
        Ok(path)
    }

    /// One reading of a metadata path; resolver failures count as absence.
    fn reading(&self, what: &str, path: &str, result: Result<Option<Metadata>>) -> Option<Metadata> {
        match result {
            Ok(found) => found,
            Err(e) => {
                tracing::debug!(path, reading = what, error = %e, "Resolver could not provide metadata");
                None
            }
        }
    }
}

impl ArtifactStore for ProxyArtifactStore {
    fn group_ids(&self, parent_group_id: &str) -> BTreeSet<String> {
        child_segments(self.resolved.lock().keys(), parent_group_id)
    }

    fn artifact_ids(&self, group_id: &str) -> BTreeSet<String> {
        self.resolved
            .lock()
            .get(group_id)
            .map(|ids| ids.keys().cloned().collect())
            .unwrap_or_default()
    }

    fn versions(&self, group_id: &str, artifact_id: &str) -> BTreeSet<String> {
        self.resolved
            .lock()
            .get(group_id)
            .and_then(|ids| ids.get(artifact_id))
            .map(|versions| versions.keys().cloned().collect())
            .unwrap_or_default()
    }

    fn artifacts(&self, group_id: &str, artifact_id: &str, version: &str) -> BTreeSet<Artifact> {
        self.resolved
            .lock()
            .get(group_id)
            .and_then(|ids| ids.get(artifact_id))
            .and_then(|versions| versions.get(version))
            .cloned()
            .unwrap_or_default()
    }

    fn last_modified(&self, artifact: &Artifact) -> Result<Timestamp> {
        let path = self.resolve(artifact)?;
        fs::metadata(&path)
            .and_then(|m| m.modified())
            .map(Timestamp::from)
            .map_err(|e| Error::io(&path, e))
    }

    fn size(&self, artifact: &Artifact) -> Result<u64> {
        let path = self.resolve(artifact)?;
        fs::metadata(&path)
            .map(|m| m.len())
            .map_err(|e| Error::io(&path, e))
    }

    fn get(&self, artifact: &Artifact) -> Result<Box<dyn Read + Send>> {
        let path = self.resolve(artifact)?;
        let file = File::open(&path).map_err(|e| Error::io(&path, e))?;
        Ok(Box::new(file))
    }

    fn metadata(&self, path: &str) -> Result<Metadata> {
        let readings = MetadataPath::parse(path);
        let mut found: Vec<Metadata> = Vec::new();

        if let Some((group_id, artifact_id, version)) = &readings.snapshot {
            let result = self.resolver.resolve_snapshot_metadata(group_id, artifact_id, version);
            found.extend(self.reading("snapshot", path, result));
        }
        if let Some((group_id, artifact_id)) = &readings.artifact {
            let result = self.resolver.resolve_artifact_metadata(group_id, artifact_id);
            found.extend(self.reading("artifact", path, result));
        }
        let result = self.resolver.resolve_group_metadata(&readings.group_id);
        found.extend(self.reading("group", path, result));

        let mut documents = found.into_iter();
        let mut merged = documents
            .next()
            .ok_or_else(|| Error::metadata_not_found(path))?;
        for document in documents {
            merged.merge(&document);
        }
        if merged.is_empty() {
            return Err(Error::metadata_not_found(path));
        }
        self.record_metadata(&merged, &readings.group_id);
        Ok(merged)
    }

    /// Upstream metadata carries no reliable age, so any answer is fresh.
    fn metadata_last_modified(&self, path: &str) -> Result<Timestamp> {
        self.metadata(path)?;
        Ok(Utc::now())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use repo_meta::{Plugin, Versioning};
    use tempfile::TempDir;

    fn touch(root: &Path, relative: &str, content: &str) {
        let path = root.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn upstream() -> TempDir {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "org/acme/foo/1.0/foo-1.0.jar", "jar bytes");
        touch(
            dir.path(),
            "org/acme/foo/2.0-SNAPSHOT/foo-2.0-20240101.101010-3.jar",
            "snapshot bytes",
        );
        touch(
            dir.path(),
            "org/acme/foo/maven-metadata.xml",
            "<metadata><groupId>org.acme</groupId><artifactId>foo</artifactId>\
             <versioning><latest>1.0</latest><versions><version>1.0</version>\
             <version>2.0-SNAPSHOT</version></versions></versioning></metadata>",
        );
        dir
    }

    fn proxy(root: &Path) -> ProxyArtifactStore {
        ProxyArtifactStore::new(Arc::new(DirectoryResolver::new(root)))
    }

    /// Upstream that fails every request.
    struct Offline;

    impl ArtifactResolver for Offline {
        fn resolve_artifact(&self, _: &Artifact) -> Result<PathBuf> {
            Err(Error::resolver("offline"))
        }
        fn resolve_snapshot_metadata(&self, _: &str, _: &str, _: &str) -> Result<Option<Metadata>> {
            Err(Error::resolver("offline"))
        }
        fn resolve_artifact_metadata(&self, _: &str, _: &str) -> Result<Option<Metadata>> {
            Err(Error::resolver("offline"))
        }
        fn resolve_group_metadata(&self, _: &str) -> Result<Option<Metadata>> {
            Err(Error::resolver("offline"))
        }
    }

    /// Upstream answering only group metadata with one plugin.
    struct PluginGroup;

    impl ArtifactResolver for PluginGroup {
        fn resolve_artifact(&self, artifact: &Artifact) -> Result<PathBuf> {
            Err(Error::artifact_not_found(artifact))
        }
        fn resolve_snapshot_metadata(&self, _: &str, _: &str, _: &str) -> Result<Option<Metadata>> {
            Ok(None)
        }
        fn resolve_artifact_metadata(&self, _: &str, _: &str) -> Result<Option<Metadata>> {
            Ok(None)
        }
        fn resolve_group_metadata(&self, _: &str) -> Result<Option<Metadata>> {
            Ok(Some(Metadata {
                plugins: vec![Plugin {
                    name: None,
                    prefix: "demo".into(),
                    artifact_id: "demo-maven-plugin".into(),
                }],
                ..Metadata::default()
            }))
        }
    }

    #[test]
    fn test_nothing_listed_before_resolution() {
        let dir = upstream();
        let store = proxy(dir.path());
        assert!(store.group_ids("").is_empty());
        assert!(store.versions("org.acme", "foo").is_empty());
    }

    #[test]
    fn test_resolved_artifact_is_remembered() {
        let dir = upstream();
        let store = proxy(dir.path());
        let artifact = Artifact::new("org.acme", "foo", "1.0", "jar");

        let mut text = String::new();
        store.get(&artifact).unwrap().read_to_string(&mut text).unwrap();
        assert_eq!(text, "jar bytes");
        assert_eq!(store.size(&artifact).unwrap(), 9);

        assert_eq!(store.group_ids(""), BTreeSet::from(["org".to_string()]));
        assert_eq!(store.artifact_ids("org.acme"), BTreeSet::from(["foo".to_string()]));
        assert_eq!(store.artifacts("org.acme", "foo", "1.0"), BTreeSet::from([artifact]));
    }

    #[test]
    fn test_unresolved_snapshot_resolves_newest_build() {
        let dir = upstream();
        let store = proxy(dir.path());
        let unresolved = Artifact::new("org.acme", "foo", "2.0-SNAPSHOT", "jar");

        let mut text = String::new();
        store.get(&unresolved).unwrap().read_to_string(&mut text).unwrap();
        assert_eq!(text, "snapshot bytes");
    }

    #[test]
    fn test_missing_artifact_is_not_found() {
        let dir = upstream();
        let store = proxy(dir.path());
        let missing = Artifact::new("org.acme", "foo", "9.9", "jar");
        assert!(store.get(&missing).err().unwrap().is_not_found());
        assert!(store.versions("org.acme", "foo").is_empty());
    }

    #[test]
    fn test_metadata_records_versions() {
        let dir = upstream();
        let store = proxy(dir.path());

        let metadata = store.metadata("org/acme/foo").unwrap();
        let versioning: Versioning = metadata.versioning.unwrap();
        assert_eq!(versioning.versions, vec!["1.0", "2.0-SNAPSHOT"]);
        assert_eq!(
            store.versions("org.acme", "foo"),
            BTreeSet::from(["1.0".to_string(), "2.0-SNAPSHOT".to_string()])
        );
        assert!(store.metadata_last_modified("org/acme/foo").is_ok());
    }

    #[test]
    fn test_metadata_absent_upstream() {
        let dir = upstream();
        let store = proxy(dir.path());
        assert!(matches!(
            store.metadata("org/other"),
            Err(Error::MetadataNotFound { .. })
        ));
        assert!(store.metadata_last_modified("org/other").unwrap_err().is_not_found());
    }

    #[test]
    fn test_resolver_failures_read_as_absent_metadata() {
        let store = ProxyArtifactStore::new(Arc::new(Offline));
        assert!(store.metadata("org/acme/foo").unwrap_err().is_not_found());

        let artifact = Artifact::new("org.acme", "foo", "1.0", "jar");
        assert!(matches!(store.get(&artifact), Err(Error::Resolver { .. })));
    }

    #[test]
    fn test_group_metadata_records_plugins() {
        let store = ProxyArtifactStore::new(Arc::new(PluginGroup));
        let metadata = store.metadata("org/acme/plugins").unwrap();
        assert_eq!(metadata.plugins.len(), 1);
        assert_eq!(
            store.artifact_ids("org.acme.plugins"),
            BTreeSet::from(["demo-maven-plugin".to_string()])
        );
    }

    #[test]
    fn test_catalog_and_writes_unavailable() {
        let dir = upstream();
        let store = proxy(dir.path());
        assert!(store.archetype_catalog().unwrap_err().is_not_found());
        assert!(matches!(
            store.set_metadata("org/acme", &Metadata::default()),
            Err(Error::Unsupported { .. })
        ));
    }
}
