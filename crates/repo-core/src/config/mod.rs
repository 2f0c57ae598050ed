//! Declarative repository configuration
//!
//! A configuration file lists the stores that make up the served repository,
//! in lookup order. It can be written in TOML, JSON or YAML; the format is
//! picked from the file extension by [`repo_fs::ConfigStore`].
//!
//! ```toml
//! auto_digest = true
//!
//! [[repositories]]
//! kind = "hosted"
//! path = "target/hosted"
//!
//! [[repositories]]
//! kind = "local"
//! path = "/srv/m2"
//! ```
//!
//! Relative paths are resolved against the directory holding the file.

mod repository;

pub use repository::{RepositoryConfig, RepositoryKind, RepositorySpec};
