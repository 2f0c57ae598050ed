//! The Maven repository layout.
//!
//! Paths look like `/<group path>/<artifactId>/<version>/<file>` where the
//! group path is the group id with dots turned into slashes. Artifact file
//! names repeat the artifact id and version, so they are recognised in two
//! steps: the path is split into its coordinates first, then the file name is
//! matched against a rule built from the escaped artifact id and version.
//!
//! A snapshot version directory (`1.0-SNAPSHOT`) may hold both the literal
//! `foo-1.0-SNAPSHOT.jar` and timestamped builds such as
//! `foo-1.0-20110101.123456-56.jar`.

use std::sync::LazyLock;

use chrono::{TimeZone, Utc};
use regex::{Captures, Regex};

use crate::artifact::{Artifact, SNAPSHOT_SUFFIX};

/// Browsers ask every server for this; it is never part of a repository.
pub const FAVICON: &str = "favicon.ico";

static METADATA: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^/((?:[^/]+/)+)(maven-metadata\.xml)$").expect("metadata pattern is valid")
});

static ARCHETYPE_CATALOG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^/archetype-catalog\.xml$").expect("archetype catalog pattern is valid")
});

static ARTIFACT_PATH: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^/((?:[^/]+/)+)([^/]+)/([^/]+)/([^/]+)$").expect("artifact path pattern is valid")
});

/// What a repository path refers to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RepositoryPath {
    /// Never served.
    Ignored,
    /// `maven-metadata.xml` inside `directory` (slash-separated, no slashes at either end).
    Metadata { directory: String },
    ArchetypeCatalog,
    Artifact(Artifact),
    /// Anything else, including names that look like artifacts but do not decode.
    Directory,
}

/// Classify an absolute repository path (`/org/acme/foo/1.0/foo-1.0.jar`).
pub fn parse(path: &str) -> RepositoryPath {
    let name = path.rsplit('/').next().unwrap_or(path);
    if name == FAVICON {
        return RepositoryPath::Ignored;
    }
    if let Some(captures) = METADATA.captures(path) {
        return RepositoryPath::Metadata {
            directory: captures[1].trim_end_matches('/').to_owned(),
        };
    }
    if ARCHETYPE_CATALOG.is_match(path) {
        return RepositoryPath::ArchetypeCatalog;
    }
    match artifact_path(path) {
        Some(coordinates) => match coordinates.decode() {
            FileMatch::Artifact(artifact) => RepositoryPath::Artifact(artifact),
            FileMatch::BadTimestamp | FileMatch::NoMatch => RepositoryPath::Directory,
        },
        None => RepositoryPath::Directory,
    }
}

/// Decode a path into an artifact, if it names one.
pub fn artifact_at(path: &str) -> Option<Artifact> {
    match artifact_path(path)?.decode() {
        FileMatch::Artifact(artifact) => Some(artifact),
        FileMatch::BadTimestamp | FileMatch::NoMatch => None,
    }
}

/// The four coordinates of an artifact-shaped path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArtifactPath<'a> {
    /// Group path including its trailing slash, e.g. `org/acme/`.
    pub group_path: &'a str,
    pub artifact_id: &'a str,
    pub version: &'a str,
    pub file_name: &'a str,
}

impl ArtifactPath<'_> {
    pub fn group_id(&self) -> String {
        self.group_path.trim_end_matches('/').replace('/', ".")
    }

    pub fn decode(&self) -> FileMatch {
        artifact_file(&self.group_id(), self.artifact_id, self.version, self.file_name)
    }
}

/// Split `/<group path>/<artifactId>/<version>/<file>`; at least one group segment is required.
pub fn artifact_path(path: &str) -> Option<ArtifactPath<'_>> {
    let captures = ARTIFACT_PATH.captures(path)?;
    let group = |index: usize| captures.get(index).map_or("", |m| m.as_str());
    Some(ArtifactPath {
        group_path: group(1),
        artifact_id: group(2),
        version: group(3),
        file_name: group(4),
    })
}

/// Outcome of matching a file name against its directory's coordinates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileMatch {
    Artifact(Artifact),
    /// Shaped like a timestamped snapshot but the date or build number is impossible.
    BadTimestamp,
    NoMatch,
}

/// Decode the name of a file stored under `group_id/artifact_id/version/`.
pub fn artifact_file(group_id: &str, artifact_id: &str, version: &str, file_name: &str) -> FileMatch {
    if let Some(base) = version.strip_suffix(SNAPSHOT_SUFFIX).filter(|base| !base.is_empty()) {
        match snapshot_file(group_id, artifact_id, version, base, file_name) {
            FileMatch::NoMatch => {}
            decoded => return decoded,
        }
    }
    release_file(group_id, artifact_id, version, file_name)
}

fn release_file(group_id: &str, artifact_id: &str, version: &str, file_name: &str) -> FileMatch {
    let rule = format!(
        r"^{}-{}(?:-([^.]+))?\.(.+)$",
        regex::escape(artifact_id),
        regex::escape(version)
    );
    let Ok(rule) = Regex::new(&rule) else {
        return FileMatch::NoMatch;
    };
    let Some(captures) = rule.captures(file_name) else {
        return FileMatch::NoMatch;
    };
    let artifact = Artifact::new(group_id, artifact_id, version, &captures[2])
        .with_classifier(captures.get(1).map(|m| m.as_str()));
    FileMatch::Artifact(artifact)
}

fn snapshot_file(group_id: &str, artifact_id: &str, version: &str, base: &str, file_name: &str) -> FileMatch {
    let rule = format!(
        r"^{}-{}-(?:SNAPSHOT|(\d{{4}})(\d{{2}})(\d{{2}})\.(\d{{2}})(\d{{2}})(\d{{2}})-(\d+))(?:-([^.]+))?\.(.+)$",
        regex::escape(artifact_id),
        regex::escape(base)
    );
    let Ok(rule) = Regex::new(&rule) else {
        return FileMatch::NoMatch;
    };
    let Some(captures) = rule.captures(file_name) else {
        return FileMatch::NoMatch;
    };
    let artifact = Artifact::new(group_id, artifact_id, version, &captures[9])
        .with_classifier(captures.get(8).map(|m| m.as_str()));
    if captures.get(1).is_none() {
        return FileMatch::Artifact(artifact);
    }
    match build_of(&captures) {
        Some((timestamp, build_number)) => FileMatch::Artifact(artifact.with_build(timestamp, build_number)),
        None => FileMatch::BadTimestamp,
    }
}

fn build_of(captures: &Captures<'_>) -> Option<(chrono::DateTime<Utc>, u32)> {
    let field = |index: usize| captures.get(index)?.as_str().parse::<u32>().ok();
    let year = i32::try_from(field(1)?).ok()?;
    let timestamp = Utc
        .with_ymd_and_hms(year, field(2)?, field(3)?, field(4)?, field(5)?, field(6)?)
        .single()?;
    Some((timestamp, field(7)?))
}
