//! Checksum files computed from the content of another file.

use std::io::{Cursor, ErrorKind, Read};

use md5::{Digest, Md5};
use sha1::Sha1;

use crate::entry::{DirectoryEntry, FileContent, FileEntry, Timestamp};
use crate::Result;

const BUFFER_SIZE: usize = 8192;

/// Digest algorithms served next to repository files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DigestAlgorithm {
    Md5,
    Sha1,
}

impl DigestAlgorithm {
    pub const ALL: [DigestAlgorithm; 2] = [DigestAlgorithm::Md5, DigestAlgorithm::Sha1];

    /// File name suffix, including the dot.
    pub fn suffix(self) -> &'static str {
        match self {
            DigestAlgorithm::Md5 => ".md5",
            DigestAlgorithm::Sha1 => ".sha1",
        }
    }

    /// Number of hex characters in a digest.
    pub fn hex_width(self) -> usize {
        match self {
            DigestAlgorithm::Md5 => 32,
            DigestAlgorithm::Sha1 => 40,
        }
    }

    /// Split a digest file name into its algorithm and the digested file name.
    pub fn strip(name: &str) -> Option<(DigestAlgorithm, &str)> {
        Self::ALL.into_iter().find_map(|algorithm| {
            name.strip_suffix(algorithm.suffix())
                .filter(|base| !base.is_empty())
                .map(|base| (algorithm, base))
        })
    }

    pub fn is_digest_name(name: &str) -> bool {
        Self::strip(name).is_some()
    }

    /// Lower-case hex digest of everything `reader` yields.
    pub fn compute(self, reader: &mut dyn Read) -> std::io::Result<String> {
        match self {
            DigestAlgorithm::Md5 => hex_digest::<Md5>(reader),
            DigestAlgorithm::Sha1 => hex_digest::<Sha1>(reader),
        }
    }
}

fn hex_digest<D: Digest>(reader: &mut dyn Read) -> std::io::Result<String> {
    let mut hasher = D::new();
    let mut buffer = [0u8; BUFFER_SIZE];
    loop {
        match reader.read(&mut buffer) {
            Ok(0) => break,
            Ok(read) => hasher.update(&buffer[..read]),
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(hasher
        .finalize()
        .iter()
        .map(|byte| format!("{byte:02x}"))
        .collect())
}

fn compute_for(algorithm: DigestAlgorithm, target: &FileEntry) -> Result<Vec<u8>> {
    let mut stream = target.open()?;
    Ok(algorithm.compute(&mut stream)?.into_bytes())
}

/// Digest of `target`, recomputed on every read.
pub struct DigestContent {
    algorithm: DigestAlgorithm,
    target: FileEntry,
}

impl DigestContent {
    pub fn new(algorithm: DigestAlgorithm, target: FileEntry) -> Self {
        Self { algorithm, target }
    }
}

impl FileContent for DigestContent {
    fn last_modified(&self) -> Result<Timestamp> {
        self.target.last_modified()
    }

    fn size(&self) -> Result<u64> {
        Ok(self.algorithm.hex_width() as u64)
    }

    fn open(&self) -> Result<Box<dyn Read + Send>> {
        Ok(Box::new(Cursor::new(compute_for(self.algorithm, &self.target)?)))
    }
}

/// A digest file stored next to `target`; when the stored file cannot be
/// read the digest is computed from `target` instead.
pub struct StoredDigestContent {
    algorithm: DigestAlgorithm,
    target: FileEntry,
    stored: FileEntry,
}

impl StoredDigestContent {
    pub fn new(algorithm: DigestAlgorithm, target: FileEntry, stored: FileEntry) -> Self {
        Self {
            algorithm,
            target,
            stored,
        }
    }
}

impl FileContent for StoredDigestContent {
    fn last_modified(&self) -> Result<Timestamp> {
        self.stored
            .last_modified()
            .or_else(|_| self.target.last_modified())
    }

    fn size(&self) -> Result<u64> {
        Ok(self.algorithm.hex_width() as u64)
    }

    fn open(&self) -> Result<Box<dyn Read + Send>> {
        match self.stored.open() {
            Ok(stream) => Ok(stream),
            Err(e) => {
                tracing::debug!(stored = ?self.stored, error = %e, "Computing digest instead");
                Ok(Box::new(Cursor::new(compute_for(self.algorithm, &self.target)?)))
            }
        }
    }
}

/// A computed digest file for `target`, placed in `parent`.
pub fn digest_entry(parent: DirectoryEntry, target: FileEntry, algorithm: DigestAlgorithm) -> FileEntry {
    let name = format!("{}{}", target.name(), algorithm.suffix());
    FileEntry::with_content(parent, name, DigestContent::new(algorithm, target))
}

/// A stored digest file for `target`, placed in `parent` under the stored
/// file's name.
pub fn stored_digest_entry(
    parent: DirectoryEntry,
    target: FileEntry,
    stored: FileEntry,
    algorithm: DigestAlgorithm,
) -> FileEntry {
    let name = stored.name().to_owned();
    FileEntry::with_content(parent, name, StoredDigestContent::new(algorithm, target, stored))
}
