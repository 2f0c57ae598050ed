//! Cross-crate file system behaviour
//!
//! Every layer a configuration can stack is checked against the same
//! contracts: paths resolve back to their entries, overlays de-duplicate by
//! name, and digests have a fixed width.

use std::sync::Arc;

use pretty_assertions::assert_eq;
use repo_core::{ArtifactStoreFileSystem, DiskArtifactStore, FileSystemArtifactStore};
use repo_fs::{
    AutoDigestFileSystem, CompositeFileSystem, DirectoryEntry, DiskFileSystem, Entry, FileSystem,
    MemoryFileSystem, get_file,
};
use repo_test_utils::repo::TestRepo;
use rstest::rstest;

fn walk(fs: &dyn FileSystem, dir: &DirectoryEntry, found: &mut Vec<Entry>) {
    for entry in fs.list_entries(dir) {
        if let Entry::Directory(child) = &entry {
            walk(fs, child, found);
        }
        found.push(entry);
    }
}

fn layers(repo: &TestRepo) -> Vec<(&'static str, Arc<dyn FileSystem>)> {
    let disk: Arc<dyn FileSystem> = DiskFileSystem::new(repo.root());
    let bridge: Arc<dyn FileSystem> =
        ArtifactStoreFileSystem::new(Arc::new(DiskArtifactStore::new(repo.root())));
    let raw_bridge: Arc<dyn FileSystem> =
        ArtifactStoreFileSystem::new(Arc::new(FileSystemArtifactStore::new(disk.clone())));

    let populated = MemoryFileSystem::new();
    let dir = populated.mkdirs("org/acme/foo/1.0").unwrap().unwrap();
    populated.put_bytes(&dir, "foo-1.0.jar", b"jar").unwrap();
    let memory: Arc<dyn FileSystem> = populated;

    let digest: Arc<dyn FileSystem> = AutoDigestFileSystem::new(bridge.clone());
    let overlay: Arc<dyn FileSystem> = CompositeFileSystem::new(vec![memory.clone(), bridge.clone()]);

    vec![
        ("disk", disk),
        ("memory", memory),
        ("bridge", bridge),
        ("raw bridge", raw_bridge),
        ("digest", digest),
        ("overlay", overlay),
    ]
}

#[test]
fn test_every_listed_entry_resolves_to_itself() {
    let repo = TestRepo::sample();
    for (name, fs) in layers(&repo) {
        assert_eq!(fs.get(""), Some(Entry::Directory(fs.root())), "{name}");
        assert_eq!(fs.root().to_path(), "", "{name}");

        let mut entries = Vec::new();
        walk(fs.as_ref(), &fs.root(), &mut entries);
        assert!(!entries.is_empty(), "{name} lists nothing");

        for entry in entries {
            let path = entry.to_path();
            assert_eq!(fs.get(&path), Some(entry), "{name}: {path}");
        }
    }
}

#[test]
fn test_overlay_keeps_first_kind_for_a_name() {
    let files = MemoryFileSystem::new();
    files.put_bytes(&files.root(), "x", b"file").unwrap();
    let dirs = MemoryFileSystem::new();
    dirs.mkdirs("x/inner").unwrap();

    let delegates: Vec<Arc<dyn FileSystem>> = vec![files, dirs];
    let overlay = CompositeFileSystem::new(delegates);
    let listing = overlay.list_entries(&overlay.root());

    assert_eq!(listing.len(), 1);
    assert_eq!(listing[0].name(), "x");
    assert!(listing[0].is_file());
    assert!(overlay.get("x").unwrap().is_file());
}

#[rstest]
#[case("", 32, 40)]
#[case("hello", 32, 40)]
fn test_digest_size_is_fixed(#[case] content: &str, #[case] md5: u64, #[case] sha1: u64) {
    let backing = MemoryFileSystem::new();
    backing.put_bytes(&backing.root(), "file", content.as_bytes()).unwrap();
    let fs = AutoDigestFileSystem::new(backing);

    assert_eq!(get_file(fs.as_ref(), "file.md5").unwrap().size().unwrap(), md5);
    assert_eq!(get_file(fs.as_ref(), "file.sha1").unwrap().size().unwrap(), sha1);
}

#[test]
fn test_md5_of_hello() {
    let backing = MemoryFileSystem::new();
    backing.put_bytes(&backing.root(), "hello.txt", b"hello").unwrap();
    let fs = AutoDigestFileSystem::new(backing);

    let digest = get_file(fs.as_ref(), "/hello.txt.md5").unwrap().read_all().unwrap();
    assert_eq!(digest, b"5d41402abc4b2a76b9719d911017c592");
}

#[test]
fn test_removed_directory_is_unreachable() {
    let fs = MemoryFileSystem::new();
    let version = fs.mkdirs("org/acme/foo/1.0").unwrap().unwrap();
    fs.put_bytes(&version, "foo-1.0.jar", b"jar").unwrap();
    let acme = fs.get("org/acme").unwrap();

    fs.remove(&acme).unwrap();

    for path in ["org/acme", "org/acme/foo", "org/acme/foo/1.0", "org/acme/foo/1.0/foo-1.0.jar"] {
        assert_eq!(fs.get(path), None, "{path}");
    }
    assert!(fs.list_entries(&fs.root().child("org")).is_empty());
    assert!(fs.list_entries(&version).is_empty());
}
