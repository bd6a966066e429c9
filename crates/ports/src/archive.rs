//! Archive codec boundary contract.

use addon_forge_shared::Result;

/// One entry of an archive: a path and its raw bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveEntry {
    /// Forward-slash-delimited path inside the archive.
    pub path: Box<str>,
    /// Entry bytes.
    pub bytes: Vec<u8>,
}

impl ArchiveEntry {
    /// Create an archive entry.
    pub fn new(path: impl Into<Box<str>>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            path: path.into(),
            bytes: bytes.into(),
        }
    }
}

/// Boundary contract for compressing and decompressing archives in memory.
///
/// CPU-bound and synchronous; callers decide whether to move work off the
/// async runtime.
pub trait ArchiveCodecPort: Send + Sync {
    /// Serialize entries into one compressed archive.
    fn pack(&self, entries: &[ArchiveEntry]) -> Result<Vec<u8>>;

    /// Enumerate and extract all entries of a compressed archive.
    fn unpack(&self, bytes: &[u8]) -> Result<Vec<ArchiveEntry>>;
}
