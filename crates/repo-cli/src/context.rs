//! Repository configuration discovery
//!
//! Like git, `mrm` works from anywhere below the directory holding its
//! configuration: the current directory and each ancestor are searched for
//! the first `mrm.*` file.

use std::path::{Path, PathBuf};

use repo_core::{RepositoryConfig, RepositoryKind, RepositorySpec};

use crate::cli::SourceArgs;
use crate::error::{CliError, Result};

/// Configuration file names, in lookup order within one directory.
pub const CONFIG_FILE_NAMES: [&str; 4] = ["mrm.toml", "mrm.yaml", "mrm.yml", "mrm.json"];

/// Find the nearest configuration file at or above `cwd`.
pub fn find_config(cwd: &Path) -> Option<PathBuf> {
    cwd.ancestors()
        .flat_map(|dir| CONFIG_FILE_NAMES.iter().map(move |name| dir.join(name)))
        .find(|candidate| candidate.is_file())
}

/// Build the configuration the command line asks for.
pub fn resolve_config(source: &SourceArgs, cwd: &Path) -> Result<RepositoryConfig> {
    let mut config = if !source.repositories.is_empty() {
        RepositoryConfig {
            repositories: source
                .repositories
                .iter()
                .map(|dir| RepositorySpec::new(RepositoryKind::Local, Some(cwd.join(dir))))
                .collect(),
            ..RepositoryConfig::default()
        }
    } else {
        let path = match &source.config {
            Some(path) => cwd.join(path),
            None => find_config(cwd).ok_or_else(|| {
                CliError::user(format!(
                    "no {} found in {} or its parents; pass --config or --repository",
                    CONFIG_FILE_NAMES[0],
                    cwd.display()
                ))
            })?,
        };
        tracing::debug!(path = %path.display(), "Loading configuration");
        RepositoryConfig::load(&path)?
    };

    if source.no_digest {
        config.auto_digest = false;
    }
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_find_config_walks_up() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("mrm.yaml"), "repositories: []\n").unwrap();
        let nested = temp.path().join("a").join("b");
        fs::create_dir_all(&nested).unwrap();

        assert_eq!(find_config(&nested), Some(temp.path().join("mrm.yaml")));
    }

    #[test]
    fn test_nearest_config_wins() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("mrm.toml"), "").unwrap();
        let nested = temp.path().join("inner");
        fs::create_dir_all(&nested).unwrap();
        fs::write(nested.join("mrm.json"), "{}").unwrap();

        assert_eq!(find_config(&nested), Some(nested.join("mrm.json")));
    }

    #[test]
    fn test_repository_flags_make_local_repositories() {
        let source = SourceArgs {
            repositories: vec!["m2".into()],
            no_digest: true,
            ..SourceArgs::default()
        };
        let config = resolve_config(&source, Path::new("/work")).unwrap();

        assert!(!config.auto_digest);
        assert_eq!(
            config.repositories,
            vec![RepositorySpec::new(RepositoryKind::Local, Some("/work/m2".into()))]
        );
    }

    #[test]
    fn test_missing_config_is_a_user_error() {
        let temp = TempDir::new().unwrap();
        // an mrm.toml in an ancestor of the temp dir would be found instead
        if find_config(temp.path()).is_some() {
            return;
        }
        let error = resolve_config(&SourceArgs::default(), temp.path()).unwrap_err();
        assert!(matches!(error, CliError::User { .. }));
    }
}
