//! Virtual file systems for serving a repository tree.
//!
//! Every file system implements the [`FileSystem`] capability and hands out
//! transient [`Entry`] values. Implementations compose by delegation:
//! [`CompositeFileSystem`] overlays several trees, [`AutoDigestFileSystem`]
//! adds checksum siblings, and the link contents in [`link`] let one file
//! system expose another's files under its own identity.

pub mod auto_digest;
pub mod composite;
pub mod config;
pub mod digest;
pub mod disk;
pub mod entry;
pub mod error;
pub mod filesystem;
pub mod io;
pub mod link;
pub mod memory;

pub use auto_digest::AutoDigestFileSystem;
pub use composite::CompositeFileSystem;
pub use config::{ConfigFormat, ConfigStore};
pub use digest::DigestAlgorithm;
pub use disk::DiskFileSystem;
pub use entry::{DirectoryEntry, Entry, FileContent, FileEntry, FsHandle, Timestamp};
pub use error::{Error, Result};
pub use filesystem::{FileSystem, equivalent, get_directory, get_file};
pub use io::RobustnessConfig;
pub use memory::{MemoryContent, MemoryFileSystem};
