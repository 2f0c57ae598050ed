//! Artifact stores and the repository layout for the mock repository
//!
//! This crate turns coordinate-addressed [`ArtifactStore`]s into a
//! path-addressed [`repo_fs::FileSystem`] that looks like a Maven repository:
//!
//! - **Artifacts**: [`Artifact`] coordinates and their file names
//! - **Layout**: decoding repository paths back into coordinates ([`layout`])
//! - **Stores**: memory, disk, composite, proxy and file-system backed
//! - **Bridge**: [`ArtifactStoreFileSystem`], which serves a store as files
//! - **Configuration**: [`RepositoryConfig`], which assembles all of the above
//!
//! # Architecture
//!
//! ```text
//!                      mrm (CLI)
//!                          |
//!                      repo-core
//!                          |
//!              +-----------+-----------+
//!              |                       |
//!           repo-fs                repo-meta
//! ```
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use repo_core::{Artifact, ArtifactStoreFileSystem, MemoryArtifactStore};
//! use repo_fs::FileSystem;
//!
//! let store = Arc::new(MemoryArtifactStore::new());
//! store.put_bytes(
//!     &Artifact::new("org.acme", "foo", "1.0", "jar"),
//!     b"jar",
//!     chrono::Utc::now(),
//! );
//!
//! let fs = ArtifactStoreFileSystem::new(store);
//! assert!(fs.get("/org/acme/foo/1.0/foo-1.0.jar").is_some());
//! assert!(fs.get("/archetype-catalog.xml").is_none());
//! ```

pub mod artifact;
pub mod bridge;
pub mod config;
pub mod error;
mod jar;
pub mod layout;
pub mod store;

pub use artifact::{Artifact, SNAPSHOT_SUFFIX, is_snapshot_version};
pub use bridge::ArtifactStoreFileSystem;
pub use config::{RepositoryConfig, RepositoryKind, RepositorySpec};
pub use error::{Error, Result};
pub use layout::RepositoryPath;
pub use store::{
    ArtifactResolver, ArtifactStore, CompositeArtifactStore, DirectoryResolver, DiskArtifactStore,
    FileSystemArtifactStore, MemoryArtifactStore, MockArtifactStore, ProxyArtifactStore,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_invalid_config_displays_message() {
        let error = Error::invalid_config("no repositories configured");
        let display = format!("{}", error);
        assert!(
            display.contains("no repositories configured"),
            "Error display should contain the message, got: {}",
            display
        );
    }
}
