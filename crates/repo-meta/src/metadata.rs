//! Repository metadata documents (`maven-metadata.xml`).
//!
//! One document type covers the three places metadata lives in a
//! repository: group directories (plugin prefixes), artifact directories
//! (version lists) and snapshot version directories (timestamped builds).

use std::io::Read;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::xml;

/// File name of a metadata document inside a repository directory.
pub const METADATA_FILE_NAME: &str = "maven-metadata.xml";

/// Format of `lastUpdated` and `updated` values.
pub const LAST_UPDATED_FORMAT: &str = "%Y%m%d%H%M%S";

const DOCUMENT: &str = "repository metadata";

xml::wrapped_list!(version_list, "version", String);
xml::wrapped_list!(snapshot_version_list, "snapshotVersion", SnapshotVersion);
xml::wrapped_list!(plugin_list, "plugin", Plugin);

/// Format a timestamp the way `lastUpdated` stores it.
pub fn format_last_updated(timestamp: DateTime<Utc>) -> String {
    timestamp.format(LAST_UPDATED_FORMAT).to_string()
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename = "metadata", rename_all = "camelCase")]
pub struct Metadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub artifact_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub versioning: Option<Versioning>,
    #[serde(default, with = "plugin_list", skip_serializing_if = "Vec::is_empty")]
    pub plugins: Vec<Plugin>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Versioning {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latest: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub release: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snapshot: Option<Snapshot>,
    #[serde(default, with = "version_list", skip_serializing_if = "Vec::is_empty")]
    pub versions: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<String>,
    #[serde(default, with = "snapshot_version_list", skip_serializing_if = "Vec::is_empty")]
    pub snapshot_versions: Vec<SnapshotVersion>,
}

/// The newest build of a snapshot version.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
    #[serde(default)]
    pub build_number: u32,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub local_copy: bool,
}

/// One concrete file of a snapshot build.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotVersion {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub classifier: String,
    #[serde(default)]
    pub extension: String,
    #[serde(default)]
    pub value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated: Option<String>,
}

impl SnapshotVersion {
    /// Identity used when merging lists of snapshot versions.
    pub fn key(&self) -> (&str, &str, &str) {
        (&self.value, &self.classifier, &self.extension)
    }
}

/// A build plugin published under a group, with its invocation prefix.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Plugin {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default)]
    pub prefix: String,
    #[serde(default)]
    pub artifact_id: String,
}

fn is_blank(value: &Option<String>) -> bool {
    value.as_deref().is_none_or(str::is_empty)
}

impl Metadata {
    pub fn from_xml(text: &str) -> Result<Self> {
        let mut metadata: Metadata = xml::from_str(DOCUMENT, text)?;
        metadata.normalize();
        Ok(metadata)
    }

    pub fn read(reader: &mut dyn Read) -> Result<Self> {
        let mut metadata: Metadata = xml::from_reader(DOCUMENT, reader)?;
        metadata.normalize();
        Ok(metadata)
    }

    pub fn to_xml(&self) -> Result<String> {
        xml::to_document(DOCUMENT, self)
    }

    /// True when the document carries no information at all.
    pub fn is_empty(&self) -> bool {
        is_blank(&self.group_id)
            && is_blank(&self.artifact_id)
            && is_blank(&self.version)
            && self.versioning.is_none()
            && self.plugins.is_empty()
    }

    /// Fold another repository's view of the same path into this one.
    ///
    /// Coordinates keep the first non-empty value and plugins are unioned by
    /// artifact id. `latest`, `release` and `lastUpdated` come from whichever
    /// side was updated most recently, while versions and snapshot versions
    /// are unioned. The newest `latest` therefore need not be the highest
    /// version in the merged list.
    pub fn merge(&mut self, other: &Metadata) {
        for (ours, theirs) in [
            (&mut self.group_id, &other.group_id),
            (&mut self.artifact_id, &other.artifact_id),
            (&mut self.version, &other.version),
        ] {
            if is_blank(ours) && !is_blank(theirs) {
                ours.clone_from(theirs);
            }
        }

        for plugin in &other.plugins {
            if !self
                .plugins
                .iter()
                .any(|known| known.artifact_id == plugin.artifact_id)
            {
                self.plugins.push(plugin.clone());
            }
        }

        if let Some(theirs) = &other.versioning {
            self.versioning
                .get_or_insert_with(Versioning::default)
                .merge(theirs);
        }
    }

    fn normalize(&mut self) {
        if let Some(versioning) = &mut self.versioning {
            for snapshot_version in &mut versioning.snapshot_versions {
                snapshot_version.classifier = snapshot_version.classifier.trim().to_owned();
            }
        }
    }
}

impl Versioning {
    /// Append `version` unless it is already listed.
    pub fn add_version(&mut self, version: impl Into<String>) {
        let version = version.into();
        if !self.versions.contains(&version) {
            self.versions.push(version);
        }
    }

    pub fn set_last_updated(&mut self, timestamp: DateTime<Utc>) {
        self.last_updated = Some(format_last_updated(timestamp));
    }

    /// Add `snapshot_version`, replacing an entry with the same key.
    pub fn put_snapshot_version(&mut self, snapshot_version: SnapshotVersion) {
        match self
            .snapshot_versions
            .iter_mut()
            .find(|known| known.key() == snapshot_version.key())
        {
            Some(known) => *known = snapshot_version,
            None => self.snapshot_versions.push(snapshot_version),
        }
    }

    fn merge(&mut self, other: &Versioning) {
        let newer = match (&self.last_updated, &other.last_updated) {
            (_, None) => false,
            (None, Some(_)) => true,
            (Some(ours), Some(theirs)) => ours < theirs,
        };
        if newer {
            if !is_blank(&other.latest) {
                self.latest.clone_from(&other.latest);
            }
            if !is_blank(&other.release) {
                self.release.clone_from(&other.release);
            }
            self.last_updated.clone_from(&other.last_updated);
        }

        for version in &other.versions {
            self.add_version(version.as_str());
        }

        if let Some(snapshot) = &other.snapshot {
            let replace = self
                .snapshot
                .as_ref()
                .is_none_or(|ours| snapshot.build_number > ours.build_number);
            if replace {
                self.snapshot = Some(snapshot.clone());
            }
        }

        for snapshot_version in &other.snapshot_versions {
            if !self
                .snapshot_versions
                .iter()
                .any(|known| known.key() == snapshot_version.key())
            {
                self.snapshot_versions.push(snapshot_version.clone());
            }
        }
    }
}
