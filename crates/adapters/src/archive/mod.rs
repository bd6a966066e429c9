//! In-memory zip codec.

use addon_forge_ports::{ArchiveCodecPort, ArchiveEntry};
use addon_forge_shared::{ErrorClass, ErrorCode, ErrorEnvelope, Result};
use std::io::{Cursor, Read, Write};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

/// Zip-backed implementation of `ArchiveCodecPort`.
///
/// All work happens in memory; the caller owns the resulting byte buffers.
#[derive(Debug, Clone, Copy, Default)]
pub struct ZipCodec;

impl ZipCodec {
    /// Create a zip codec.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl ArchiveCodecPort for ZipCodec {
    fn pack(&self, entries: &[ArchiveEntry]) -> Result<Vec<u8>> {
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        let options =
            SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

        for entry in entries {
            writer
                .start_file(entry.path.as_ref(), options)
                .map_err(|error| map_zip_error("encode", &error))?;
            writer.write_all(&entry.bytes).map_err(|error| {
                ErrorEnvelope::from(error).with_metadata("path", entry.path.to_string())
            })?;
        }

        let cursor = writer
            .finish()
            .map_err(|error| map_zip_error("encode", &error))?;
        Ok(cursor.into_inner())
    }

    fn unpack(&self, bytes: &[u8]) -> Result<Vec<ArchiveEntry>> {
        let mut archive = ZipArchive::new(Cursor::new(bytes))
            .map_err(|error| map_zip_error("decode", &error))?;

        let mut entries = Vec::with_capacity(archive.len());
        for index in 0..archive.len() {
            let mut file = archive
                .by_index(index)
                .map_err(|error| map_zip_error("decode", &error))?;
            if file.is_dir() {
                continue;
            }
            let mut content = Vec::new();
            file.read_to_end(&mut content).map_err(|error| {
                ErrorEnvelope::from(error).with_metadata("entry", file.name().to_owned())
            })?;
            entries.push(ArchiveEntry::new(file.name().to_owned(), content));
        }
        Ok(entries)
    }
}

fn map_zip_error(operation: &str, error: &zip::result::ZipError) -> ErrorEnvelope {
    ErrorEnvelope::unexpected(
        ErrorCode::new("archive", format!("{operation}_failed")),
        format!("zip {operation} failed: {error}"),
        ErrorClass::NonRetriable,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pack_then_unpack_preserves_entries() -> Result<()> {
        let codec = ZipCodec::new();
        let entries = vec![
            ArchiveEntry::new("behavior/entities/dragon.json", Vec::from(*b"{}")),
            ArchiveEntry::new("resource/textures/dragon.png", vec![0x89, 0x50, 0x4e, 0x47]),
        ];

        let packed = codec.pack(&entries)?;
        let unpacked = codec.unpack(&packed)?;

        assert_eq!(unpacked.len(), 2);
        assert_eq!(unpacked, entries);
        Ok(())
    }

    #[test]
    fn empty_archive_round_trips() -> Result<()> {
        let codec = ZipCodec::new();
        let packed = codec.pack(&[])?;
        let unpacked = codec.unpack(&packed)?;
        assert!(unpacked.is_empty());
        Ok(())
    }

    #[test]
    fn garbage_bytes_fail_to_decode() {
        let codec = ZipCodec::new();
        let error = codec.unpack(b"definitely not a zip").err();
        assert!(matches!(error, Some(e) if e.code.namespace() == "archive"));
    }
}
