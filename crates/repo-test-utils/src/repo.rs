//! [`TestRepo`] builder for on-disk repository layouts.

use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

use crate::pom::PomBuilder;

/// A temporary directory laid out like a Maven repository, with helpers for
/// test setup and assertion.
///
/// # Example
///
/// ```rust
/// use repo_test_utils::repo::TestRepo;
///
/// let repo = TestRepo::new();
/// repo.write_artifact("org.acme", "foo", "1.0", "foo-1.0.jar", b"jar");
/// repo.assert_file_exists("org/acme/foo/1.0/foo-1.0.jar");
/// ```
pub struct TestRepo {
    temp_dir: TempDir,
}

impl Default for TestRepo {
    fn default() -> Self {
        Self::new()
    }
}

impl TestRepo {
    /// Create an empty temporary directory.
    pub fn new() -> Self {
        Self {
            temp_dir: TempDir::new().unwrap(),
        }
    }

    /// A repository holding a small, fixed set of artifacts:
    ///
    /// - `org.acme:foo` 1.0 and 1.1 (pom + jar), plus 1.0 sources
    /// - `org.acme:foo:2.0-SNAPSHOT`, two timestamped builds (pom + jar)
    /// - `org.acme.plugins:maven-demo-plugin:1.0`, a plugin named "Demo"
    pub fn sample() -> Self {
        let repo = Self::new();
        for version in ["1.0", "1.1"] {
            repo.write_pom(&PomBuilder::new("org.acme", "foo", version).packaging("jar"));
            repo.write_artifact(
                "org.acme",
                "foo",
                version,
                &format!("foo-{version}.jar"),
                format!("foo {version}").as_bytes(),
            );
        }
        repo.write_artifact("org.acme", "foo", "1.0", "foo-1.0-sources.jar", b"sources");

        for build in ["20240101.120000-1", "20240102.120000-2"] {
            let pom = PomBuilder::new("org.acme", "foo", "2.0-SNAPSHOT").build();
            repo.write_artifact("org.acme", "foo", "2.0-SNAPSHOT", &format!("foo-2.0-{build}.pom"), pom.as_bytes());
            repo.write_artifact(
                "org.acme",
                "foo",
                "2.0-SNAPSHOT",
                &format!("foo-2.0-{build}.jar"),
                format!("build {build}").as_bytes(),
            );
        }

        repo.write_pom(
            &PomBuilder::new("org.acme.plugins", "maven-demo-plugin", "1.0")
                .plugin()
                .name("Demo"),
        );
        repo
    }

    /// Return the root path of the temporary directory.
    pub fn root(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Absolute path of `relative` inside the repository.
    pub fn path(&self, relative: &str) -> PathBuf {
        self.root().join(relative)
    }

    /// Write `content` at `relative`, creating parent directories.
    pub fn write(&self, relative: &str, content: &[u8]) -> PathBuf {
        let full_path = self.path(relative);
        if let Some(parent) = full_path.parent() {
            fs::create_dir_all(parent)
                .unwrap_or_else(|e| panic!("TestRepo::write: failed to create {}: {e}", parent.display()));
        }
        fs::write(&full_path, content)
            .unwrap_or_else(|e| panic!("TestRepo::write: failed to write {}: {e}", full_path.display()));
        full_path
    }

    /// Write `file_name` under the directory of `group_id:artifact_id:version`.
    pub fn write_artifact(
        &self,
        group_id: &str,
        artifact_id: &str,
        version: &str,
        file_name: &str,
        content: &[u8],
    ) -> PathBuf {
        let relative = format!(
            "{}/{artifact_id}/{version}/{file_name}",
            group_id.replace('.', "/")
        );
        self.write(&relative, content)
    }

    /// Write the release POM for the coordinates the builder describes.
    pub fn write_pom(&self, pom: &PomBuilder) -> PathBuf {
        let (group_id, artifact_id, version) = pom.coordinates();
        let file_name = format!("{artifact_id}-{version}.pom");
        self.write_artifact(group_id, artifact_id, version, &file_name, pom.build().as_bytes())
    }

    /// Assert that `path` (relative to the repo root) exists.
    ///
    /// # Panics
    /// Panics with a descriptive message if the path does not exist.
    pub fn assert_file_exists(&self, path: &str) {
        let full_path = self.path(path);
        assert!(
            full_path.exists(),
            "Expected file to exist: {}",
            full_path.display()
        );
    }

    /// Assert that `path` (relative to the repo root) does **not** exist.
    ///
    /// # Panics
    /// Panics with a descriptive message if the path exists.
    pub fn assert_file_not_exists(&self, path: &str) {
        let full_path = self.path(path);
        assert!(
            !full_path.exists(),
            "Expected file NOT to exist: {}",
            full_path.display()
        );
    }

    /// Assert that the file at `path` (relative to root) contains `content`.
    ///
    /// # Panics
    /// Panics if the file cannot be read or does not contain `content`.
    pub fn assert_file_contains(&self, path: &str, content: &str) {
        let full_path = self.path(path);
        let file_content = fs::read_to_string(&full_path)
            .unwrap_or_else(|_| panic!("Could not read file: {}", full_path.display()));
        assert!(
            file_content.contains(content),
            "File {} does not contain expected content.\nExpected: {}\nActual: {}",
            full_path.display(),
            content,
            file_content
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sample_layout_is_populated() {
        let repo = TestRepo::sample();
        repo.assert_file_exists("org/acme/foo/1.1/foo-1.1.pom");
        repo.assert_file_exists("org/acme/foo/2.0-SNAPSHOT/foo-2.0-20240102.120000-2.jar");
        repo.assert_file_contains(
            "org/acme/plugins/maven-demo-plugin/1.0/maven-demo-plugin-1.0.pom",
            "<packaging>maven-plugin</packaging>",
        );
        repo.assert_file_not_exists("org/acme/foo/maven-metadata.xml");
    }
}
