//! Serving configured repositories end to end
//!
//! Configurations are written to disk, loaded, and the resulting file system
//! is read exactly as a repository client would read it.

use std::sync::Arc;

use chrono::{Duration, Utc};
use pretty_assertions::assert_eq;
use repo_core::{
    Artifact, ArtifactStoreFileSystem, CompositeArtifactStore, MemoryArtifactStore, RepositoryConfig,
};
use repo_fs::{Entry, FileSystem, get_file};
use repo_meta::Metadata;
use repo_test_utils::pom::PomBuilder;
use repo_test_utils::repo::TestRepo;

fn read_text(fs: &dyn FileSystem, path: &str) -> String {
    let file = get_file(fs, path).unwrap_or_else(|| panic!("{path} should be a file"));
    String::from_utf8(file.read_all().unwrap()).unwrap()
}

fn names(fs: &dyn FileSystem, path: &str) -> Vec<String> {
    let Some(Entry::Directory(dir)) = fs.get(path) else {
        panic!("{path} should be a directory");
    };
    fs.list_entries(&dir).iter().map(|e| e.name().to_owned()).collect()
}

/// Write `mrm.toml` beside the repository and load it back.
fn configure(repo: &TestRepo, toml: &str) -> RepositoryConfig {
    let path = repo.write("mrm.toml", toml.as_bytes());
    RepositoryConfig::load(&path).unwrap()
}

#[test]
fn test_files_kind_reads_newest_snapshot_build() {
    let repo = TestRepo::sample();
    let config = configure(
        &repo,
        "auto_digest = false\n[[repositories]]\nkind = \"files\"\npath = \".\"\n",
    );
    let fs = config.serve().unwrap();

    assert_eq!(
        read_text(fs.as_ref(), "/org/acme/foo/2.0-SNAPSHOT/foo-2.0-SNAPSHOT.jar"),
        "build 20240102.120000-2"
    );
    assert_eq!(
        read_text(fs.as_ref(), "/org/acme/foo/2.0-SNAPSHOT/foo-2.0-20240101.120000-1.jar"),
        "build 20240101.120000-1"
    );
}

#[test]
fn test_proxy_kind_lists_what_it_resolved() {
    let upstream = TestRepo::sample();
    let site = TestRepo::new();
    let config = configure(
        &site,
        &format!(
            "[[repositories]]\nkind = \"proxy\"\npath = {:?}\n",
            upstream.root().display().to_string()
        ),
    );
    let fs = config.serve().unwrap();

    assert!(names(fs.as_ref(), "/").is_empty());

    assert_eq!(read_text(fs.as_ref(), "/org/acme/foo/1.1/foo-1.1.jar"), "foo 1.1");
    assert_eq!(names(fs.as_ref(), "/org/acme/foo"), vec!["1.1"]);
    assert_eq!(
        names(fs.as_ref(), "/org/acme/foo/1.1"),
        vec!["foo-1.1.jar", "foo-1.1.jar.md5", "foo-1.1.jar.sha1"]
    );
}

#[test]
fn test_hosted_then_local_overlay() {
    let hosted = TestRepo::new();
    let local = TestRepo::sample();
    let config = configure(
        &hosted,
        &format!(
            "auto_digest = false\n\n\
             [[repositories]]\nkind = \"hosted\"\npath = \"store\"\n\n\
             [[repositories]]\nkind = \"local\"\npath = {:?}\n",
            local.root().display().to_string()
        ),
    );
    hosted.write("store/org/acme/foo/1.0/foo-1.0.jar", b"hosted copy");
    let fs = config.serve().unwrap();

    // first repository wins for content, listings are unioned
    assert_eq!(read_text(fs.as_ref(), "/org/acme/foo/1.0/foo-1.0.jar"), "hosted copy");
    assert!(read_text(fs.as_ref(), "/org/acme/foo/1.0/foo-1.0.pom").contains("<version>1.0</version>"));
    assert_eq!(names(fs.as_ref(), "/org/acme/foo"), vec!["1.0", "1.1", "2.0-SNAPSHOT"]);
}

#[test]
fn test_latest_follows_most_recent_repository() {
    let yesterday = Utc::now() - Duration::days(1);
    let today = Utc::now();

    let older = Arc::new(MemoryArtifactStore::new());
    for version in ["1.0", "1.1"] {
        let pom = PomBuilder::new("org.acme", "foo", version).build();
        older.put_bytes(&Artifact::new("org.acme", "foo", version, "pom"), pom.as_bytes(), yesterday);
    }
    let newer = Arc::new(MemoryArtifactStore::new());
    let pom = PomBuilder::new("org.acme", "foo", "1.2").build();
    newer.put_bytes(&Artifact::new("org.acme", "foo", "1.2", "pom"), pom.as_bytes(), today);

    for members in [
        vec![older.clone() as Arc<dyn repo_core::ArtifactStore>, newer.clone()],
        vec![newer.clone() as Arc<dyn repo_core::ArtifactStore>, older.clone()],
    ] {
        let fs = ArtifactStoreFileSystem::new(Arc::new(CompositeArtifactStore::new(members)));
        let metadata =
            Metadata::from_xml(&read_text(fs.as_ref(), "/org/acme/foo/maven-metadata.xml")).unwrap();
        let mut versioning = metadata.versioning.unwrap();
        versioning.versions.sort();

        assert_eq!(versioning.versions, vec!["1.0", "1.1", "1.2"]);
        assert_eq!(versioning.latest.as_deref(), Some("1.2"));
        assert_eq!(versioning.release.as_deref(), Some("1.2"));
    }
}

#[test]
fn test_snapshot_metadata_from_memory_store() {
    let store = Arc::new(MemoryArtifactStore::new());
    let fs = ArtifactStoreFileSystem::new(store.clone());
    let builds = [("20240101.120000", 1), ("20240102.120000", 2)];
    for (stamp, build) in builds {
        let path = format!("/org/acme/foo/2.0-SNAPSHOT/foo-2.0-{stamp}-{build}.pom");
        let artifact = repo_core::layout::artifact_at(&path).unwrap();
        store.put_bytes(&artifact, b"<project/>", Utc::now());
    }

    let metadata = Metadata::from_xml(&read_text(
        fs.as_ref(),
        "/org/acme/foo/2.0-SNAPSHOT/maven-metadata.xml",
    ))
    .unwrap();
    assert_eq!(metadata.version.as_deref(), Some("2.0-SNAPSHOT"));
    let snapshot = metadata.versioning.unwrap().snapshot.unwrap();
    assert_eq!(snapshot.build_number, 2);
    assert_eq!(snapshot.timestamp.as_deref(), Some("20240102.120000"));
}
