//! Artifact coordinates.

use std::cmp::Ordering;
use std::fmt;

use chrono::{DateTime, Utc};

/// Suffix marking a version as a snapshot.
pub const SNAPSHOT_SUFFIX: &str = "-SNAPSHOT";

/// Format of the timestamp embedded in a resolved snapshot version.
pub const SNAPSHOT_TIMESTAMP_FORMAT: &str = "%Y%m%d.%H%M%S";

pub fn is_snapshot_version(version: &str) -> bool {
    version.ends_with(SNAPSHOT_SUFFIX)
}

/// A single file in a repository, identified by its coordinates.
///
/// Snapshot versions may additionally carry the timestamp and build number of
/// one published instance; these are discarded for release versions.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Artifact {
    group_id: String,
    artifact_id: String,
    version: String,
    classifier: Option<String>,
    kind: String,
    build: Option<(DateTime<Utc>, u32)>,
}

impl Artifact {
    pub fn new(
        group_id: impl Into<String>,
        artifact_id: impl Into<String>,
        version: impl Into<String>,
        kind: impl Into<String>,
    ) -> Self {
        Self {
            group_id: group_id.into(),
            artifact_id: artifact_id.into(),
            version: version.into(),
            classifier: None,
            kind: kind.into(),
            build: None,
        }
    }

    /// Set the classifier; an empty classifier means none.
    pub fn with_classifier(mut self, classifier: Option<&str>) -> Self {
        self.classifier = classifier.filter(|c| !c.is_empty()).map(str::to_owned);
        self
    }

    /// Pin a snapshot to one published build. Ignored for release versions.
    pub fn with_build(mut self, timestamp: DateTime<Utc>, build_number: u32) -> Self {
        if self.is_snapshot() {
            self.build = Some((timestamp, build_number));
        }
        self
    }

    pub fn group_id(&self) -> &str {
        &self.group_id
    }

    pub fn artifact_id(&self) -> &str {
        &self.artifact_id
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn classifier(&self) -> Option<&str> {
        self.classifier.as_deref()
    }

    /// The packaging extension, e.g. `jar` or `pom`.
    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn timestamp(&self) -> Option<DateTime<Utc>> {
        self.build.map(|(timestamp, _)| timestamp)
    }

    pub fn build_number(&self) -> Option<u32> {
        self.build.map(|(_, build_number)| build_number)
    }

    pub fn is_snapshot(&self) -> bool {
        is_snapshot_version(&self.version)
    }

    pub fn timestamp_string(&self) -> Option<String> {
        self.timestamp()
            .map(|timestamp| timestamp.format(SNAPSHOT_TIMESTAMP_FORMAT).to_string())
    }

    /// The version as it appears in file names.
    ///
    /// For a resolved snapshot this is `<base>-<yyyyMMdd.HHmmss>-<build>`.
    pub fn timestamp_version(&self) -> String {
        match self.build {
            Some((timestamp, build_number)) => {
                let base = self
                    .version
                    .strip_suffix(SNAPSHOT_SUFFIX)
                    .unwrap_or(&self.version);
                format!(
                    "{base}-{}-{build_number}",
                    timestamp.format(SNAPSHOT_TIMESTAMP_FORMAT)
                )
            }
            None => self.version.clone(),
        }
    }

    /// File name: `<artifactId>-<timestampVersion>[-<classifier>].<type>`.
    pub fn name(&self) -> String {
        match &self.classifier {
            Some(classifier) => format!(
                "{}-{}-{classifier}.{}",
                self.artifact_id,
                self.timestamp_version(),
                self.kind
            ),
            None => format!("{}-{}.{}", self.artifact_id, self.timestamp_version(), self.kind),
        }
    }

    /// Repository path of the file, `/`-separated and without a leading slash.
    pub fn path(&self) -> String {
        format!(
            "{}/{}/{}/{}",
            self.group_id.replace('.', "/"),
            self.artifact_id,
            self.version,
            self.name()
        )
    }

    /// Equal in every coordinate, ignoring which build a snapshot refers to.
    pub fn equal_snapshots(&self, other: &Artifact) -> bool {
        self.group_id == other.group_id
            && self.artifact_id == other.artifact_id
            && self.version == other.version
            && self.kind == other.kind
            && self.classifier == other.classifier
    }
}

impl fmt::Display for Artifact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}:{}",
            self.group_id,
            self.artifact_id,
            self.timestamp_version()
        )?;
        if let Some(classifier) = &self.classifier {
            write!(f, ":{classifier}")?;
        }
        write!(f, ":{}", self.kind)
    }
}

impl PartialOrd for Artifact {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Group id first, then file name; remaining fields only break ties.
impl Ord for Artifact {
    fn cmp(&self, other: &Self) -> Ordering {
        self.group_id
            .cmp(&other.group_id)
            .then_with(|| self.name().cmp(&other.name()))
            .then_with(|| self.artifact_id.cmp(&other.artifact_id))
            .then_with(|| self.version.cmp(&other.version))
            .then_with(|| self.classifier.cmp(&other.classifier))
            .then_with(|| self.kind.cmp(&other.kind))
            .then_with(|| self.build.cmp(&other.build))
    }
}
