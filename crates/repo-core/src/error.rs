//! Error types for repo-core

use std::path::PathBuf;

/// Result type for repo-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in repo-core operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The store holds no such artifact
    #[error("Artifact not found: {artifact}")]
    ArtifactNotFound { artifact: String },

    /// No metadata can be served for the path
    #[error("Metadata not found: {path}")]
    MetadataNotFound { path: String },

    #[error("Archetype catalog not found")]
    ArchetypeCatalogNotFound,

    /// Mutation attempted on a read-only store
    #[error("Operation '{operation}' is not supported by this artifact store")]
    Unsupported { operation: &'static str },

    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Stream error: {0}")]
    Stream(#[from] std::io::Error),

    #[error("Invalid repository configuration: {message}")]
    InvalidConfig { message: String },

    /// A remote resolver failed for a reason other than absence
    #[error("Resolver error: {message}")]
    Resolver { message: String },

    // Transparent wrappers for underlying crate errors
    /// Filesystem error from repo-fs
    #[error(transparent)]
    Fs(#[from] repo_fs::Error),

    /// Document error from repo-meta
    #[error(transparent)]
    Meta(#[from] repo_meta::Error),
}

impl Error {
    pub fn artifact_not_found(artifact: &crate::Artifact) -> Self {
        Self::ArtifactNotFound {
            artifact: artifact.to_string(),
        }
    }

    pub fn metadata_not_found(path: impl Into<String>) -> Self {
        Self::MetadataNotFound { path: path.into() }
    }

    pub fn unsupported(operation: &'static str) -> Self {
        Self::Unsupported { operation }
    }

    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }

    pub fn resolver(message: impl Into<String>) -> Self {
        Self::Resolver {
            message: message.into(),
        }
    }

    /// Whether this error only reports that the thing asked for is absent.
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::ArtifactNotFound { .. }
            | Self::MetadataNotFound { .. }
            | Self::ArchetypeCatalogNotFound => true,
            Self::Fs(e) => e.is_not_found(),
            _ => false,
        }
    }

    /// Convert into the error type file systems report.
    ///
    /// Absence stays recognisable as [`repo_fs::Error::NotFound`]; everything
    /// else is carried as a boxed backend error.
    pub fn into_fs(self, path: impl Into<String>) -> repo_fs::Error {
        match self {
            Self::Fs(e) => e,
            Self::Unsupported { operation } => repo_fs::Error::unsupported(operation),
            e if e.is_not_found() => repo_fs::Error::not_found(path),
            e => repo_fs::Error::backend(path, e),
        }
    }
}
