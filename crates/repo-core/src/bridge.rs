//! A [`FileSystem`] view of an [`ArtifactStore`] in the repository layout.

use std::collections::BTreeMap;
use std::io::{Cursor, Read};
use std::sync::{Arc, Weak};

use chrono::Utc;
use repo_fs::{
    DirectoryEntry, Entry, FileContent, FileEntry, FileSystem, FsHandle, Timestamp, equivalent,
};
use repo_meta::{ARCHETYPE_CATALOG_FILE_NAME, METADATA_FILE_NAME, Metadata};

use crate::Error;
use crate::artifact::Artifact;
use crate::layout::{self, RepositoryPath};
use crate::store::ArtifactStore;

/// Serves a store's artifacts, metadata and archetype catalog as files.
///
/// Directories are never stored: any path that does not name a file is an
/// (empty until proven otherwise) directory.
pub struct ArtifactStoreFileSystem {
    root: DirectoryEntry,
    store: Arc<dyn ArtifactStore>,
}

impl ArtifactStoreFileSystem {
    pub fn new(store: Arc<dyn ArtifactStore>) -> Arc<Self> {
        Arc::new_cyclic(|this: &Weak<Self>| {
            let handle: Weak<dyn FileSystem> = this.clone();
            Self {
                root: DirectoryEntry::root(FsHandle::new(handle)),
                store,
            }
        })
    }

    pub fn store(&self) -> &Arc<dyn ArtifactStore> {
        &self.store
    }

    fn metadata_entry(&self, directory: &DirectoryEntry) -> FileEntry {
        FileEntry::with_content(
            directory.clone(),
            METADATA_FILE_NAME,
            MetadataContent {
                store: Arc::clone(&self.store),
                directory: directory.to_path(),
            },
        )
    }

    fn catalog_entry(&self) -> FileEntry {
        FileEntry::with_content(
            self.root(),
            ARCHETYPE_CATALOG_FILE_NAME,
            CatalogContent {
                store: Arc::clone(&self.store),
            },
        )
    }

    fn artifact_entry(&self, directory: &DirectoryEntry, artifact: Artifact) -> FileEntry {
        FileEntry::with_content(
            directory.clone(),
            artifact.name(),
            ArtifactContent {
                store: Arc::clone(&self.store),
                artifact,
            },
        )
    }
}

fn absolute(parent: &DirectoryEntry, name: &str) -> String {
    let parent = parent.to_path();
    if parent.is_empty() {
        format!("/{name}")
    } else {
        format!("/{parent}/{name}")
    }
}

fn group_id_of(directory: &DirectoryEntry) -> String {
    directory.to_path().replace('/', ".")
}

impl FileSystem for ArtifactStoreFileSystem {
    fn root(&self) -> DirectoryEntry {
        self.root.clone()
    }

    fn list_entries(&self, directory: &DirectoryEntry) -> Vec<Entry> {
        let directory = equivalent(self, directory);
        if directory.is_root() {
            return self
                .store
                .group_ids("")
                .into_iter()
                .map(|name| Entry::Directory(directory.child(name)))
                .collect();
        }

        let mut entries: BTreeMap<String, Entry> = BTreeMap::new();
        let mut add = |entry: Entry| {
            entries.entry(entry.name().to_owned()).or_insert(entry);
        };

        let path = directory.to_path();
        if self.store.metadata_last_modified(&path).is_ok() {
            add(Entry::File(self.metadata_entry(&directory)));
        }

        let group_id = group_id_of(&directory);
        let children = self
            .store
            .group_ids(&group_id)
            .into_iter()
            .chain(self.store.artifact_ids(&group_id));
        for name in children {
            add(Entry::Directory(directory.child(name)));
        }

        if let Some(parent) = directory.parent().filter(|parent| !parent.is_root()) {
            for version in self.store.versions(&group_id_of(parent), directory.name()) {
                add(Entry::Directory(directory.child(version)));
            }
            if let Some(grandparent) = parent.parent().filter(|grandparent| !grandparent.is_root()) {
                let artifacts =
                    self.store
                        .artifacts(&group_id_of(grandparent), parent.name(), directory.name());
                for artifact in artifacts {
                    add(Entry::File(self.artifact_entry(&directory, artifact)));
                }
            }
        }

        entries.into_values().collect()
    }

    fn last_modified(&self, _directory: &DirectoryEntry) -> repo_fs::Result<Timestamp> {
        Ok(Utc::now())
    }

    fn get_child(&self, parent: &DirectoryEntry, name: &str) -> Option<Entry> {
        let parent = equivalent(self, parent);
        match layout::parse(&absolute(&parent, name)) {
            RepositoryPath::Ignored => None,
            RepositoryPath::Metadata { directory } => {
                self.store.metadata_last_modified(&directory).ok()?;
                Some(Entry::File(self.metadata_entry(&parent)))
            }
            RepositoryPath::ArchetypeCatalog => {
                self.store.archetype_catalog_last_modified().ok()?;
                Some(Entry::File(self.catalog_entry()))
            }
            RepositoryPath::Artifact(artifact) => match self.store.size(&artifact) {
                Ok(_) => Some(Entry::File(self.artifact_entry(&parent, artifact))),
                Err(e) => {
                    if !e.is_not_found() {
                        tracing::debug!(%artifact, error = %e, "Store could not confirm artifact");
                    }
                    None
                }
            },
            RepositoryPath::Directory => Some(Entry::Directory(parent.child(name))),
        }
    }

    fn put(
        &self,
        parent: &DirectoryEntry,
        name: &str,
        content: &mut dyn Read,
    ) -> repo_fs::Result<Option<FileEntry>> {
        let parent = equivalent(self, parent);
        let path = absolute(&parent, name);
        match layout::parse(&path) {
            RepositoryPath::Metadata { directory } => {
                let metadata = Metadata::read(content).map_err(|e| Error::from(e).into_fs(&path))?;
                self.store
                    .set_metadata(&directory, &metadata)
                    .map_err(|e| e.into_fs(&path))?;
                Ok(Some(self.metadata_entry(&parent)))
            }
            RepositoryPath::ArchetypeCatalog => {
                self.store
                    .set_archetype_catalog(content)
                    .map_err(|e| e.into_fs(&path))?;
                Ok(Some(self.catalog_entry()))
            }
            RepositoryPath::Artifact(artifact) => {
                self.store
                    .set(&artifact, content)
                    .map_err(|e| e.into_fs(&path))?;
                Ok(Some(self.artifact_entry(&parent, artifact)))
            }
            RepositoryPath::Ignored | RepositoryPath::Directory => Ok(None),
        }
    }
}

/// `maven-metadata.xml`, rendered from the store on every read.
struct MetadataContent {
    store: Arc<dyn ArtifactStore>,
    directory: String,
}

impl MetadataContent {
    fn location(&self) -> String {
        format!("{}/{METADATA_FILE_NAME}", self.directory)
    }

    fn render(&self) -> repo_fs::Result<Vec<u8>> {
        let metadata = self
            .store
            .metadata(&self.directory)
            .map_err(|e| e.into_fs(self.location()))?;
        let xml = metadata
            .to_xml()
            .map_err(|e| Error::from(e).into_fs(self.location()))?;
        Ok(xml.into_bytes())
    }
}

impl FileContent for MetadataContent {
    fn last_modified(&self) -> repo_fs::Result<Timestamp> {
        self.store
            .metadata_last_modified(&self.directory)
            .map_err(|e| e.into_fs(self.location()))
    }

    fn size(&self) -> repo_fs::Result<u64> {
        Ok(self.render()?.len() as u64)
    }

    fn open(&self) -> repo_fs::Result<Box<dyn Read + Send>> {
        Ok(Box::new(Cursor::new(self.render()?)))
    }
}

struct CatalogContent {
    store: Arc<dyn ArtifactStore>,
}

impl CatalogContent {
    fn render(&self) -> repo_fs::Result<Vec<u8>> {
        let catalog = self
            .store
            .archetype_catalog()
            .map_err(|e| e.into_fs(ARCHETYPE_CATALOG_FILE_NAME))?;
        let xml = catalog
            .to_xml()
            .map_err(|e| Error::from(e).into_fs(ARCHETYPE_CATALOG_FILE_NAME))?;
        Ok(xml.into_bytes())
    }
}

impl FileContent for CatalogContent {
    fn last_modified(&self) -> repo_fs::Result<Timestamp> {
        self.store
            .archetype_catalog_last_modified()
            .map_err(|e| e.into_fs(ARCHETYPE_CATALOG_FILE_NAME))
    }

    fn size(&self) -> repo_fs::Result<u64> {
        Ok(self.render()?.len() as u64)
    }

    fn open(&self) -> repo_fs::Result<Box<dyn Read + Send>> {
        Ok(Box::new(Cursor::new(self.render()?)))
    }
}

struct ArtifactContent {
    store: Arc<dyn ArtifactStore>,
    artifact: Artifact,
}

impl FileContent for ArtifactContent {
    fn last_modified(&self) -> repo_fs::Result<Timestamp> {
        self.store
            .last_modified(&self.artifact)
            .map_err(|e| e.into_fs(self.artifact.path()))
    }

    fn size(&self) -> repo_fs::Result<u64> {
        self.store
            .size(&self.artifact)
            .map_err(|e| e.into_fs(self.artifact.path()))
    }

    fn open(&self) -> repo_fs::Result<Box<dyn Read + Send>> {
        self.store
            .get(&self.artifact)
            .map_err(|e| e.into_fs(self.artifact.path()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryArtifactStore;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;
    use repo_fs::get_file;

    fn at(day: u32) -> Timestamp {
        Utc.with_ymd_and_hms(2024, 3, day, 0, 0, 0).unwrap()
    }

    fn bridge() -> (Arc<MemoryArtifactStore>, Arc<ArtifactStoreFileSystem>) {
        let store = Arc::new(MemoryArtifactStore::new());
        store.put_bytes(&Artifact::new("org.acme", "foo", "1.0", "pom"), b"<project/>", at(1));
        store.put_bytes(&Artifact::new("org.acme", "foo", "1.0", "jar"), b"jar bytes", at(2));
        let fs = ArtifactStoreFileSystem::new(store.clone());
        (store, fs)
    }

    fn names(entries: &[Entry]) -> Vec<&str> {
        entries.iter().map(Entry::name).collect()
    }

    #[test]
    fn test_listing_walks_the_layout() {
        let (_, fs) = bridge();

        assert_eq!(names(&fs.list_entries(&fs.root())), vec!["org"]);

        let acme = fs.root().child("org").child("acme");
        assert_eq!(names(&fs.list_entries(&acme)), vec!["foo", "maven-metadata.xml"]);

        let foo = acme.child("foo");
        assert_eq!(names(&fs.list_entries(&foo)), vec!["1.0", "maven-metadata.xml"]);

        let version = foo.child("1.0");
        let listing = fs.list_entries(&version);
        assert_eq!(names(&listing), vec!["foo-1.0.jar", "foo-1.0.pom"]);
        assert!(listing.iter().all(Entry::is_file));
    }

    #[test]
    fn test_get_artifact_reads_store() {
        let (_, fs) = bridge();
        let file = get_file(fs.as_ref(), "/org/acme/foo/1.0/foo-1.0.jar").unwrap();
        assert_eq!(file.read_all().unwrap(), b"jar bytes");
        assert_eq!(file.size().unwrap(), 9);
        assert_eq!(file.last_modified().unwrap(), at(2));
        assert_eq!(file.to_path(), "org/acme/foo/1.0/foo-1.0.jar");
    }

    #[test]
    fn test_missing_artifact_is_absent() {
        let (_, fs) = bridge();
        assert!(fs.get("/org/acme/foo/1.0/foo-1.0-sources.jar").is_none());
        assert!(fs.get("/org/acme/foo/1.0/favicon.ico").is_none());
    }

    #[test]
    fn test_unmatched_names_are_directories() {
        let (_, fs) = bridge();
        let entry = fs.get("/org/acme/foo/1.0/readme").unwrap();
        assert!(entry.is_directory());
        assert!(fs.get("/org/acme/foo/1.0-SNAPSHOT/foo-1.0-20241399.000000-1.jar").unwrap().is_directory());
    }

    #[test]
    fn test_metadata_entry_renders_document() {
        let (_, fs) = bridge();
        let file = get_file(fs.as_ref(), "/org/acme/foo/maven-metadata.xml").unwrap();
        let text = String::from_utf8(file.read_all().unwrap()).unwrap();
        assert!(text.contains("<artifactId>foo</artifactId>"));
        assert!(text.contains("<version>1.0</version>"));
        assert_eq!(file.size().unwrap(), text.len() as u64);
        assert_eq!(file.last_modified().unwrap(), at(2));

        assert!(fs.get("/com/example/maven-metadata.xml").is_none());
    }

    #[test]
    fn test_archetype_catalog_only_when_present() {
        let (store, fs) = bridge();
        assert!(fs.get("/archetype-catalog.xml").is_none());

        let xml = "<archetype-catalog><archetypes><archetype><groupId>g</groupId>\
                   <artifactId>a</artifactId><version>1</version></archetype>\
                   </archetypes></archetype-catalog>";
        store.set_archetype_catalog(&mut xml.as_bytes()).unwrap();
        let file = get_file(fs.as_ref(), "archetype-catalog.xml").unwrap();
        let text = String::from_utf8(file.read_all().unwrap()).unwrap();
        assert!(text.contains("<artifactId>a</artifactId>"));
    }

    #[test]
    fn test_put_routes_by_name() {
        let (store, fs) = bridge();
        let version = fs.root().child("org").child("acme").child("bar").child("2.0");

        let put = fs.put(&version, "bar-2.0.jar", &mut &b"new jar"[..]).unwrap();
        assert_eq!(put.unwrap().name(), "bar-2.0.jar");
        assert_eq!(store.size(&Artifact::new("org.acme", "bar", "2.0", "jar")).unwrap(), 7);

        assert!(fs.put(&version, "notes.txt", &mut &b"x"[..]).unwrap().is_none());

        let catalog = "<archetype-catalog><archetypes><archetype><groupId>g</groupId>\
                       <artifactId>a</artifactId><version>1</version></archetype>\
                       </archetypes></archetype-catalog>";
        let put = fs.put(&fs.root(), "archetype-catalog.xml", &mut catalog.as_bytes()).unwrap();
        assert!(put.is_some());
    }

    #[test]
    fn test_put_metadata_needs_a_writable_store() {
        let (_, fs) = bridge();
        let foo = fs.root().child("org").child("acme").child("foo");
        let xml = "<metadata><groupId>org.acme</groupId></metadata>";
        let error = fs.put(&foo, "maven-metadata.xml", &mut xml.as_bytes()).unwrap_err();
        assert!(matches!(error, repo_fs::Error::Unsupported { .. }));
    }

    #[test]
    fn test_directories_are_always_fresh() {
        let (_, fs) = bridge();
        let before = Utc::now();
        assert!(fs.last_modified(&fs.root()).unwrap() >= before);
    }
}
