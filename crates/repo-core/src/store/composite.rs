//! Several stores presented as one.

use std::collections::BTreeSet;
use std::io::Read;
use std::sync::Arc;

use repo_fs::Timestamp;
use repo_meta::{ArchetypeCatalog, Metadata};

use super::ArtifactStore;
use crate::artifact::Artifact;
use crate::{Error, Result};

/// Read-only union of member stores, consulted in order.
///
/// Enumerations are unioned. Content comes from the first member that has
/// the artifact. Metadata documents from every member are merged with
/// [`Metadata::merge`].
pub struct CompositeArtifactStore {
    stores: Vec<Arc<dyn ArtifactStore>>,
}

impl CompositeArtifactStore {
    pub fn new(stores: Vec<Arc<dyn ArtifactStore>>) -> Self {
        Self { stores }
    }

    pub fn stores(&self) -> &[Arc<dyn ArtifactStore>] {
        &self.stores
    }

    /// First member answering `read` with anything other than absence.
    fn first<T>(
        &self,
        artifact: &Artifact,
        read: impl Fn(&dyn ArtifactStore) -> Result<T>,
    ) -> Result<T> {
        for store in &self.stores {
            match read(store.as_ref()) {
                Err(e) if e.is_not_found() => continue,
                other => return other,
            }
        }
        Err(Error::artifact_not_found(artifact))
    }

    /// Newest time reported by any member. Members that fail contribute nothing.
    fn newest(&self, read: impl Fn(&dyn ArtifactStore) -> Result<Timestamp>) -> Option<Timestamp> {
        self.stores
            .iter()
            .filter_map(|store| match read(store.as_ref()) {
                Ok(time) => Some(time),
                Err(e) => {
                    if !e.is_not_found() {
                        tracing::debug!(error = %e, "Ignoring member store failure");
                    }
                    None
                }
            })
            .max()
    }
}

impl ArtifactStore for CompositeArtifactStore {
    fn group_ids(&self, parent_group_id: &str) -> BTreeSet<String> {
        self.stores
            .iter()
            .flat_map(|store| store.group_ids(parent_group_id))
            .collect()
    }

    fn artifact_ids(&self, group_id: &str) -> BTreeSet<String> {
        self.stores
            .iter()
            .flat_map(|store| store.artifact_ids(group_id))
            .collect()
    }

    fn versions(&self, group_id: &str, artifact_id: &str) -> BTreeSet<String> {
        self.stores
            .iter()
            .flat_map(|store| store.versions(group_id, artifact_id))
            .collect()
    }

    fn artifacts(&self, group_id: &str, artifact_id: &str, version: &str) -> BTreeSet<Artifact> {
        self.stores
            .iter()
            .flat_map(|store| store.artifacts(group_id, artifact_id, version))
            .collect()
    }

    fn last_modified(&self, artifact: &Artifact) -> Result<Timestamp> {
        self.first(artifact, |store| store.last_modified(artifact))
    }

    fn size(&self, artifact: &Artifact) -> Result<u64> {
        self.first(artifact, |store| store.size(artifact))
    }

    fn get(&self, artifact: &Artifact) -> Result<Box<dyn Read + Send>> {
        self.first(artifact, |store| store.get(artifact))
    }

    fn metadata(&self, path: &str) -> Result<Metadata> {
        let mut merged: Option<Metadata> = None;
        for store in &self.stores {
            let partial = match store.metadata(path) {
                Ok(partial) => partial,
                Err(e) if e.is_not_found() => continue,
                Err(e) => return Err(e),
            };
            match &mut merged {
                Some(result) => result.merge(&partial),
                None => merged = Some(partial),
            }
        }
        merged
            .filter(|metadata| !metadata.is_empty())
            .ok_or_else(|| Error::metadata_not_found(path))
    }

    fn metadata_last_modified(&self, path: &str) -> Result<Timestamp> {
        self.newest(|store| store.metadata_last_modified(path))
            .ok_or_else(|| Error::metadata_not_found(path))
    }

    fn archetype_catalog(&self) -> Result<ArchetypeCatalog> {
        let mut merged: Option<ArchetypeCatalog> = None;
        for store in &self.stores {
            let partial = match store.archetype_catalog() {
                Ok(partial) => partial,
                Err(e) if e.is_not_found() => continue,
                Err(e) => return Err(e),
            };
            merged
                .get_or_insert_with(ArchetypeCatalog::default)
                .extend_from(&partial);
        }
        merged.ok_or(Error::ArchetypeCatalogNotFound)
    }

    fn archetype_catalog_last_modified(&self) -> Result<Timestamp> {
        self.newest(|store| store.archetype_catalog_last_modified())
            .ok_or(Error::ArchetypeCatalogNotFound)
    }
}
