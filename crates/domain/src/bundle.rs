//! Bundle data model: generated files, uploaded inputs, relocations.

use crate::primitives::VirtualPath;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// File extensions treated as pre-built archive containers.
const CONTAINER_EXTENSIONS: [&str; 3] = [".zip", ".mcaddon", ".mcpack"];

/// Where an uploaded input came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InputOrigin {
    /// A loose asset file (texture, sound, ...).
    Asset,
    /// A file that belongs to an addon, possibly extracted from a container.
    AddonFile,
}

impl InputOrigin {
    /// Stable string form used in fingerprints and logs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Asset => "asset",
            Self::AddonFile => "addon_file",
        }
    }
}

/// A file the user provided, either loose or extracted from a container.
///
/// Immutable once created; `name` may be a short filename or a full internal
/// path when the file came from inside a container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedInput {
    /// Original filename or internal container path.
    pub name: Box<str>,
    /// Raw file bytes.
    pub bytes: Arc<[u8]>,
    /// Origin classification.
    pub origin: InputOrigin,
}

impl UploadedInput {
    /// Create an uploaded input.
    pub fn new(name: impl Into<Box<str>>, bytes: impl Into<Arc<[u8]>>, origin: InputOrigin) -> Self {
        Self {
            name: name.into(),
            bytes: bytes.into(),
            origin,
        }
    }

    /// Returns true when the name looks like a pre-built archive container.
    #[must_use]
    pub fn is_container(&self) -> bool {
        let lower = self.name.to_ascii_lowercase();
        CONTAINER_EXTENSIONS
            .iter()
            .any(|extension| lower.ends_with(extension))
    }

    /// Borrow the bytes as UTF-8 text when they decode cleanly.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        std::str::from_utf8(&self.bytes).ok()
    }
}

/// One text artifact produced by generation.
///
/// `path` is unique within one generation result; later writes to the same
/// path overwrite earlier ones.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedFile {
    /// Archive path the file must appear at.
    pub path: VirtualPath,
    /// Verbatim text content.
    pub content: Box<str>,
}

/// Declarative instruction to place an input at a new archive path.
///
/// `original_path` is suffix-matched against input names; resolution is not
/// guaranteed. Ordering among instructions is irrelevant; colliding
/// `new_path` values are last-write-wins.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelocationInstruction {
    /// Name or partial path identifying the source input.
    pub original_path: Box<str>,
    /// Archive path the asset must appear at.
    pub new_path: VirtualPath,
}

/// The structured result of one generation round trip.
///
/// Serialized verbatim into the response cache and back.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BundleDraft {
    /// Generated text files.
    pub files: Vec<GeneratedFile>,
    /// Asset relocation instructions.
    #[serde(default)]
    pub relocations: Vec<RelocationInstruction>,
    /// Optional free-text report from the generator.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub report: Option<Box<str>>,
}

/// Non-fatal warning produced while resolving assets during assembly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AssetWarning {
    /// Several inputs matched; the first one was used.
    AmbiguousMatch {
        /// The instruction's original path.
        original_path: Box<str>,
        /// Name of the input that was chosen.
        chosen: Box<str>,
        /// Total number of matching candidates.
        candidates: usize,
    },
    /// No input matched by any strategy; the asset was skipped.
    NotFound {
        /// The instruction's original path.
        original_path: Box<str>,
    },
}

impl fmt::Display for AssetWarning {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AmbiguousMatch {
                original_path,
                chosen,
                candidates,
            } => write!(
                formatter,
                "ambiguous asset match for '{original_path}': picked '{chosen}' of {candidates} candidates"
            ),
            Self::NotFound { original_path } => {
                write!(formatter, "no uploaded input matches '{original_path}'")
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::primitives::{PrimitiveError, VirtualPath};

    #[test]
    fn container_detection_is_case_insensitive() {
        let container = UploadedInput::new(
            "Pack.McAddon",
            Vec::from(*b"PK\x03\x04"),
            InputOrigin::AddonFile,
        );
        assert!(container.is_container());

        let texture = UploadedInput::new("sword.png", Vec::from(*b"\x89PNG"), InputOrigin::Asset);
        assert!(!texture.is_container());
    }

    #[test]
    fn text_detection_requires_valid_utf8() {
        let text = UploadedInput::new("en_US.lang", Vec::from(*b"key=value"), InputOrigin::AddonFile);
        assert_eq!(text.as_text(), Some("key=value"));

        let binary = UploadedInput::new("noise.bin", vec![0xff, 0xfe, 0x00], InputOrigin::Asset);
        assert!(binary.as_text().is_none());
    }

    #[test]
    fn bundle_draft_round_trips_through_json() -> Result<(), PrimitiveError> {
        let draft = BundleDraft {
            files: vec![GeneratedFile {
                path: VirtualPath::parse("behavior/entities/dragon.json")?,
                content: "{\"format_version\":\"1.20.0\"}".into(),
            }],
            relocations: vec![RelocationInstruction {
                original_path: "dragon.png".into(),
                new_path: VirtualPath::parse("resource/textures/dragon.png")?,
            }],
            report: Some("Added a dragon entity with \"special\" characters: \n\t✓".into()),
        };

        let encoded = serde_json::to_string(&draft).unwrap();
        let decoded: BundleDraft = serde_json::from_str(&encoded).unwrap();

        assert_eq!(decoded, draft);
        Ok(())
    }

    #[test]
    fn relocations_default_to_empty_on_missing_field() {
        let decoded: Result<BundleDraft, _> =
            serde_json::from_str(r#"{"files":[{"path":"a.json","content":"{}"}]}"#);
        assert!(matches!(decoded, Ok(draft) if draft.relocations.is_empty()));
    }

    #[test]
    fn asset_warnings_render_human_readable_text() {
        let ambiguous = AssetWarning::AmbiguousMatch {
            original_path: "icon.png".into(),
            chosen: "assets/icons/icon.png".into(),
            candidates: 2,
        };
        assert!(ambiguous.to_string().contains("ambiguous"));

        let missing = AssetWarning::NotFound {
            original_path: "ghost.png".into(),
        };
        assert!(missing.to_string().contains("ghost.png"));
    }
}
