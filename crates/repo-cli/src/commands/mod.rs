//! Command implementations for repo-cli
//!
//! Commands write to the given sink rather than stdout so that tests can
//! capture their output.

pub mod browse;
pub mod put;

pub use browse::{run_cat, run_ls, run_stat, run_tree};
pub use put::run_put;
