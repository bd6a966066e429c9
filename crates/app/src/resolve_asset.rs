//! Asset resolution: locate source bytes for a relocation instruction.
//!
//! The generator echoes input names without guaranteed path fidelity (it may
//! return `texture.png` for an input uploaded as `assets/textures/texture.png`,
//! or vice versa), so matching falls back from exact to suffix. Ambiguity is
//! resolved permissively — first match wins — but surfaced as a structured
//! warning so callers can show it to users.

use addon_forge_domain::{AssetWarning, UploadedInput};
use addon_forge_ports::ArchiveCodecPort;
use std::sync::Arc;

/// Outcome of resolving one relocation source.
#[derive(Debug, Clone)]
pub enum AssetResolution {
    /// Source bytes were located.
    Found {
        /// The resolved bytes.
        bytes: Arc<[u8]>,
        /// Ambiguity warning, when several inputs matched.
        warning: Option<AssetWarning>,
    },
    /// No input matched by any strategy.
    NotFound,
}

/// Resolve the source bytes for `original_path`.
///
/// Strategy, in order: exact name match among loose inputs; suffix match
/// among loose inputs (first match, warning when ambiguous); scan inside
/// container-typed inputs via the archive codec; otherwise not-found.
pub fn resolve_asset(
    original_path: &str,
    inputs: &[UploadedInput],
    codec: &dyn ArchiveCodecPort,
) -> AssetResolution {
    let loose: Vec<&UploadedInput> = inputs.iter().filter(|input| !input.is_container()).collect();

    if let Some(exact) = loose
        .iter()
        .find(|input| input.name.as_ref() == original_path)
    {
        return AssetResolution::Found {
            bytes: Arc::clone(&exact.bytes),
            warning: None,
        };
    }

    let suffix_matches: Vec<&&UploadedInput> = loose
        .iter()
        .filter(|input| input.name.ends_with(original_path))
        .collect();
    if let Some(first) = suffix_matches.first() {
        let warning = (suffix_matches.len() > 1).then(|| AssetWarning::AmbiguousMatch {
            original_path: original_path.into(),
            chosen: first.name.clone(),
            candidates: suffix_matches.len(),
        });
        return AssetResolution::Found {
            bytes: Arc::clone(&first.bytes),
            warning,
        };
    }

    for container in inputs.iter().filter(|input| input.is_container()) {
        // An unreadable container cannot contribute matches; keep scanning.
        let Ok(entries) = codec.unpack(&container.bytes) else {
            continue;
        };
        if let Some(entry) = entries
            .into_iter()
            .find(|entry| entry.path.ends_with(original_path))
        {
            return AssetResolution::Found {
                bytes: Arc::from(entry.bytes),
                warning: None,
            };
        }
    }

    AssetResolution::NotFound
}

#[cfg(test)]
mod tests {
    use super::*;
    use addon_forge_domain::InputOrigin;
    use addon_forge_ports::{ArchiveCodecPort, ArchiveEntry};
    use addon_forge_shared::{ErrorCode, ErrorEnvelope, Result};

    /// Codec fake that "packs" entries as a JSON payload.
    struct JsonCodec;

    impl ArchiveCodecPort for JsonCodec {
        fn pack(&self, entries: &[ArchiveEntry]) -> Result<Vec<u8>> {
            let pairs: Vec<(String, Vec<u8>)> = entries
                .iter()
                .map(|entry| (entry.path.to_string(), entry.bytes.clone()))
                .collect();
            serde_json::to_vec(&pairs).map_err(|error| {
                ErrorEnvelope::expected(ErrorCode::invalid_input(), error.to_string())
            })
        }

        fn unpack(&self, bytes: &[u8]) -> Result<Vec<ArchiveEntry>> {
            let pairs: Vec<(String, Vec<u8>)> = serde_json::from_slice(bytes).map_err(|error| {
                ErrorEnvelope::expected(ErrorCode::invalid_input(), error.to_string())
            })?;
            Ok(pairs
                .into_iter()
                .map(|(path, bytes)| ArchiveEntry::new(path, bytes))
                .collect())
        }
    }

    fn asset(name: &str, bytes: &[u8]) -> UploadedInput {
        UploadedInput::new(name, bytes.to_vec(), InputOrigin::Asset)
    }

    #[test]
    fn exact_match_is_preferred_over_suffix() {
        let inputs = vec![
            asset("nested/sword.png", b"nested"),
            asset("sword.png", b"exact"),
        ];
        let resolution = resolve_asset("sword.png", &inputs, &JsonCodec);
        assert!(matches!(
            resolution,
            AssetResolution::Found { bytes, warning: None } if bytes.as_ref() == b"exact"
        ));
    }

    #[test]
    fn suffix_match_tolerates_fuller_input_paths() {
        let inputs = vec![asset("assets/icons/sword.png", b"icon")];
        let resolution = resolve_asset("sword.png", &inputs, &JsonCodec);
        assert!(matches!(
            resolution,
            AssetResolution::Found { bytes, warning: None } if bytes.as_ref() == b"icon"
        ));
    }

    #[test]
    fn ambiguous_suffix_match_picks_first_and_warns() {
        let inputs = vec![
            asset("pack_a/icon.png", b"first"),
            asset("pack_b/icon.png", b"second"),
        ];
        let resolution = resolve_asset("icon.png", &inputs, &JsonCodec);
        match resolution {
            AssetResolution::Found { bytes, warning } => {
                assert_eq!(bytes.as_ref(), b"first");
                assert!(matches!(
                    warning,
                    Some(AssetWarning::AmbiguousMatch { candidates: 2, .. })
                ));
            },
            AssetResolution::NotFound => panic!("expected a match"),
        }
    }

    #[test]
    fn container_fallback_scans_archive_entries() -> Result<()> {
        let codec = JsonCodec;
        let container_bytes = codec.pack(&[ArchiveEntry::new(
            "textures/blocks/ruby.png",
            Vec::from(*b"ruby"),
        )])?;
        let inputs = vec![UploadedInput::new(
            "old_pack.mcpack",
            container_bytes,
            InputOrigin::AddonFile,
        )];

        let resolution = resolve_asset("ruby.png", &inputs, &codec);
        assert!(matches!(
            resolution,
            AssetResolution::Found { bytes, warning: None } if bytes.as_ref() == b"ruby"
        ));
        Ok(())
    }

    #[test]
    fn unreadable_container_is_skipped() {
        let inputs = vec![UploadedInput::new(
            "broken.zip",
            Vec::from(*b"not json"),
            InputOrigin::AddonFile,
        )];
        let resolution = resolve_asset("ghost.png", &inputs, &JsonCodec);
        assert!(matches!(resolution, AssetResolution::NotFound));
    }

    #[test]
    fn nothing_matches_reports_not_found() {
        let inputs = vec![asset("sword.png", b"sword")];
        let resolution = resolve_asset("shield.png", &inputs, &JsonCodec);
        assert!(matches!(resolution, AssetResolution::NotFound));
    }
}
