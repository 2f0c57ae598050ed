//! Repository configuration types and their assembly into stores

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use repo_fs::{AutoDigestFileSystem, ConfigStore, DiskFileSystem, FileSystem};
use serde::{Deserialize, Serialize};

use crate::bridge::ArtifactStoreFileSystem;
use crate::store::{
    ArtifactStore, CompositeArtifactStore, DirectoryResolver, DiskArtifactStore,
    FileSystemArtifactStore, MemoryArtifactStore, MockArtifactStore, ProxyArtifactStore,
};
use crate::{Error, Result};

fn default_auto_digest() -> bool {
    true
}

/// Which store backs a configured repository.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RepositoryKind {
    /// Read-only directory in the repository layout
    Local,
    /// Writable directory in the repository layout
    Hosted,
    /// In-process store, empty at start-up
    Memory,
    /// Raw files served through a read-only disk file system
    Files,
    /// On-demand resolution from an upstream directory
    Proxy,
    /// Artifacts generated from the project models found under a directory
    Mock,
}

impl RepositoryKind {
    pub fn needs_path(self) -> bool {
        !matches!(self, RepositoryKind::Memory)
    }
}

impl fmt::Display for RepositoryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RepositoryKind::Local => "local",
            RepositoryKind::Hosted => "hosted",
            RepositoryKind::Memory => "memory",
            RepositoryKind::Files => "files",
            RepositoryKind::Proxy => "proxy",
            RepositoryKind::Mock => "mock",
        };
        f.write_str(name)
    }
}

/// One entry of the `repositories` list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositorySpec {
    pub kind: RepositoryKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
}

impl RepositorySpec {
    pub fn new(kind: RepositoryKind, path: Option<PathBuf>) -> Self {
        Self { kind, path }
    }

    fn required_path(&self) -> Result<&Path> {
        self.path.as_deref().ok_or_else(|| {
            Error::invalid_config(format!("a {} repository needs a path", self.kind))
        })
    }

    /// The configured directory; it need not exist yet.
    fn directory(&self) -> Result<&Path> {
        let path = self.required_path()?;
        if !path.is_dir() {
            tracing::warn!(kind = %self.kind, path = %path.display(), "Repository directory does not exist yet");
        }
        Ok(path)
    }

    /// Instantiate the store this entry describes.
    pub fn store(&self) -> Result<Arc<dyn ArtifactStore>> {
        let store: Arc<dyn ArtifactStore> = match self.kind {
            RepositoryKind::Memory => Arc::new(MemoryArtifactStore::new()),
            RepositoryKind::Local => Arc::new(DiskArtifactStore::new(self.directory()?)),
            RepositoryKind::Hosted => Arc::new(DiskArtifactStore::writable(self.directory()?)),
            RepositoryKind::Files => {
                Arc::new(FileSystemArtifactStore::new(DiskFileSystem::new(self.directory()?)))
            }
            RepositoryKind::Proxy => {
                let resolver = DirectoryResolver::new(self.directory()?);
                Arc::new(ProxyArtifactStore::new(Arc::new(resolver)))
            }
            RepositoryKind::Mock => Arc::new(MockArtifactStore::new(self.directory()?)),
        };
        tracing::debug!(kind = %self.kind, path = ?self.path, "Configured repository");
        Ok(store)
    }
}

/// The full set of repositories served as one tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositoryConfig {
    /// Serve `.md5`/`.sha1` siblings for every file
    #[serde(default = "default_auto_digest")]
    pub auto_digest: bool,

    /// Stores in lookup order
    #[serde(default)]
    pub repositories: Vec<RepositorySpec>,
}

impl Default for RepositoryConfig {
    fn default() -> Self {
        Self {
            auto_digest: default_auto_digest(),
            repositories: Vec::new(),
        }
    }
}

impl RepositoryConfig {
    /// Load a configuration file, resolving relative paths against its directory.
    pub fn load(path: &Path) -> Result<Self> {
        let config: RepositoryConfig = ConfigStore::new().load(path)?;
        let base = path.parent().unwrap_or_else(|| Path::new(""));
        Ok(config.relative_to(base))
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        ConfigStore::new().save(path, self)?;
        Ok(())
    }

    /// Rebase every relative repository path onto `base`.
    pub fn relative_to(mut self, base: &Path) -> Self {
        for repository in &mut self.repositories {
            if let Some(path) = repository.path.as_mut().filter(|path| path.is_relative()) {
                *path = base.join(&*path);
            }
        }
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.repositories.is_empty() {
            return Err(Error::invalid_config("no repositories configured"));
        }
        for repository in &self.repositories {
            if repository.kind.needs_path() {
                repository.required_path()?;
            }
        }
        Ok(())
    }

    /// Assemble the configured stores.
    ///
    /// Several repositories are combined into a [`CompositeArtifactStore`];
    /// a single one is returned as is so that a hosted store stays writable.
    pub fn build(&self) -> Result<Arc<dyn ArtifactStore>> {
        self.validate()?;
        let mut stores = self
            .repositories
            .iter()
            .map(RepositorySpec::store)
            .collect::<Result<Vec<_>>>()?;
        if stores.len() == 1
            && let Some(store) = stores.pop()
        {
            return Ok(store);
        }
        Ok(Arc::new(CompositeArtifactStore::new(stores)))
    }

    /// The file system a server would expose for this configuration.
    pub fn serve(&self) -> Result<Arc<dyn FileSystem>> {
        let layout: Arc<dyn FileSystem> = ArtifactStoreFileSystem::new(self.build()?);
        if self.auto_digest {
            Ok(AutoDigestFileSystem::new(layout))
        } else {
            Ok(layout)
        }
    }
}
