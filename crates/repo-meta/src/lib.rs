//! Repository documents for Maven Mock Repository.
//!
//! XML models for the files a Maven client reads beside the artifacts
//! themselves (`maven-metadata.xml`, `archetype-catalog.xml`), the part of a
//! project model needed to describe plugins, and Maven version ordering.

pub mod catalog;
pub mod error;
pub mod metadata;
pub mod pom;
pub mod version;

mod xml;

pub use catalog::{ARCHETYPE_CATALOG_FILE_NAME, Archetype, ArchetypeCatalog};
pub use error::{Error, Result};
pub use metadata::{
    LAST_UPDATED_FORMAT, METADATA_FILE_NAME, Metadata, Plugin, Snapshot, SnapshotVersion, Versioning,
    format_last_updated,
};
pub use pom::{Parent, Pom};
pub use version::{MavenVersion, compare_versions, sort_versions};
