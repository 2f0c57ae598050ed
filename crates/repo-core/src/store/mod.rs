//! Artifact stores.
//!
//! An [`ArtifactStore`] answers questions in terms of coordinates (group id,
//! artifact id, version) rather than paths. Metadata is addressed by the
//! slash-separated directory it would live in, e.g. `org/acme/foo`.

mod composite;
mod disk;
mod filesystem;
mod memory;
mod mock;
mod proxy;

use std::collections::BTreeSet;
use std::io::Read;

use repo_fs::Timestamp;
use repo_meta::{ArchetypeCatalog, Metadata};

use crate::artifact::{Artifact, is_snapshot_version};
use crate::{Error, Result};

pub use composite::CompositeArtifactStore;
pub use disk::DiskArtifactStore;
pub use filesystem::FileSystemArtifactStore;
pub use memory::MemoryArtifactStore;
pub use mock::MockArtifactStore;
pub use proxy::{ArtifactResolver, DirectoryResolver, ProxyArtifactStore};

/// Coordinate-addressed access to artifacts and their index documents.
///
/// Absence is reported with the `*NotFound` errors; other errors mean the
/// store could not answer.
pub trait ArtifactStore: Send + Sync {
    /// Immediate child segments of `parent_group_id`; the top-level segments when empty.
    fn group_ids(&self, parent_group_id: &str) -> BTreeSet<String>;

    fn artifact_ids(&self, group_id: &str) -> BTreeSet<String>;

    fn versions(&self, group_id: &str, artifact_id: &str) -> BTreeSet<String>;

    fn artifacts(&self, group_id: &str, artifact_id: &str, version: &str) -> BTreeSet<Artifact>;

    fn last_modified(&self, artifact: &Artifact) -> Result<Timestamp>;

    fn size(&self, artifact: &Artifact) -> Result<u64>;

    fn get(&self, artifact: &Artifact) -> Result<Box<dyn Read + Send>>;

    fn set(&self, _artifact: &Artifact, _content: &mut dyn Read) -> Result<()> {
        Err(Error::unsupported("set"))
    }

    fn metadata(&self, path: &str) -> Result<Metadata>;

    fn set_metadata(&self, _path: &str, _metadata: &Metadata) -> Result<()> {
        Err(Error::unsupported("set_metadata"))
    }

    fn metadata_last_modified(&self, path: &str) -> Result<Timestamp>;

    fn archetype_catalog(&self) -> Result<ArchetypeCatalog> {
        Err(Error::ArchetypeCatalogNotFound)
    }

    fn archetype_catalog_last_modified(&self) -> Result<Timestamp> {
        Err(Error::ArchetypeCatalogNotFound)
    }

    fn set_archetype_catalog(&self, _content: &mut dyn Read) -> Result<()> {
        Err(Error::unsupported("set_archetype_catalog"))
    }
}

/// The three readings of a metadata directory.
///
/// `org/acme/foo/1.0-SNAPSHOT` is at once a group (`org.acme.foo.1.0-SNAPSHOT`),
/// an artifact (`org.acme.foo` / `1.0-SNAPSHOT`) and a snapshot version
/// (`org.acme` / `foo` / `1.0-SNAPSHOT`). Stores consult whichever readings
/// they hold data for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct MetadataPath {
    /// The directory without leading or trailing slashes.
    pub directory: String,
    pub group_id: String,
    pub artifact: Option<(String, String)>,
    pub snapshot: Option<(String, String, String)>,
}

impl MetadataPath {
    pub fn parse(path: &str) -> Self {
        let directory = path.trim_matches('/').to_owned();
        let group_id = directory.replace('/', ".");

        let artifact = directory
            .rsplit_once('/')
            .map(|(group, artifact_id)| (group.replace('/', "."), artifact_id.to_owned()));

        let snapshot = directory.rsplit_once('/').and_then(|(rest, version)| {
            let (group, artifact_id) = rest.rsplit_once('/')?;
            is_snapshot_version(version).then(|| {
                (
                    group.replace('/', "."),
                    artifact_id.to_owned(),
                    version.to_owned(),
                )
            })
        });

        Self {
            directory,
            group_id,
            artifact,
            snapshot,
        }
    }
}

/// Relative path of a document kept in `directory`.
pub(crate) fn document_path(directory: &str, file_name: &str) -> String {
    let directory = directory.trim_matches('/');
    if directory.is_empty() {
        file_name.to_owned()
    } else {
        format!("{directory}/{file_name}")
    }
}

/// Child segments of `parent` among dotted `group_ids`.
pub(crate) fn child_segments<'a>(
    group_ids: impl IntoIterator<Item = &'a String>,
    parent: &str,
) -> BTreeSet<String> {
    let prefix = if parent.is_empty() {
        String::new()
    } else {
        format!("{parent}.")
    };
    group_ids
        .into_iter()
        .filter_map(|group_id| group_id.strip_prefix(prefix.as_str()))
        .filter(|rest| !rest.is_empty())
        .map(|rest| rest.split('.').next().unwrap_or(rest).to_owned())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_metadata_path_readings() {
        let path = MetadataPath::parse("/org/acme/foo/1.0-SNAPSHOT/");
        assert_eq!(path.directory, "org/acme/foo/1.0-SNAPSHOT");
        assert_eq!(path.group_id, "org.acme.foo.1.0-SNAPSHOT");
        assert_eq!(
            path.artifact,
            Some(("org.acme.foo".into(), "1.0-SNAPSHOT".into()))
        );
        assert_eq!(
            path.snapshot,
            Some(("org.acme".into(), "foo".into(), "1.0-SNAPSHOT".into()))
        );
    }

    #[test]
    fn test_metadata_path_single_segment() {
        let path = MetadataPath::parse("org");
        assert_eq!(path.group_id, "org");
        assert_eq!(path.artifact, None);
        assert_eq!(path.snapshot, None);
    }

    #[test]
    fn test_release_version_has_no_snapshot_reading() {
        let path = MetadataPath::parse("org/acme/foo/1.0");
        assert_eq!(path.snapshot, None);
    }

    #[test]
    fn test_child_segments() {
        let groups: Vec<String> = ["org.acme", "org.acme.tools", "org.other", "com.example"]
            .iter()
            .map(|g| g.to_string())
            .collect();
        assert_eq!(
            child_segments(&groups, ""),
            BTreeSet::from(["com".to_string(), "org".to_string()])
        );
        assert_eq!(
            child_segments(&groups, "org"),
            BTreeSet::from(["acme".to_string(), "other".to_string()])
        );
        assert_eq!(
            child_segments(&groups, "org.acme"),
            BTreeSet::from(["tools".to_string()])
        );
        assert!(child_segments(&groups, "org.acme.tools").is_empty());
    }
}
