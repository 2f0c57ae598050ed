//! Shared test fixtures for the mock repository workspace.
//!
//! Dev-dependency only, never published.
//!
//! # Modules
//!
//! - [`pom`]: project model text builders
//! - [`repo`]: [`repo::TestRepo`], a temporary on-disk repository layout

pub mod pom;
pub mod repo;
