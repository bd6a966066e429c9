//! Domain primitives with validated constructors.

use addon_forge_shared::{ErrorCode, ErrorEnvelope};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Fallback file stem used when sanitization strips an addon name entirely.
pub const DEFAULT_FILE_STEM: &str = "addon";

/// Length of a request key in hex characters (SHA-256).
pub const REQUEST_KEY_LEN: usize = 64;

/// Validation failures for domain primitives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PrimitiveError {
    /// `AddonName` is empty after trimming.
    InvalidAddonName {
        /// Length of the raw input before trimming.
        input_length: usize,
    },
    /// `VirtualPath` is empty after trimming.
    EmptyVirtualPath {
        /// Length of the raw input before trimming.
        input_length: usize,
    },
    /// `VirtualPath` violates the archive path rules.
    InvalidVirtualPath {
        /// Trimmed path that failed validation.
        input: String,
    },
    /// `RequestKey` is not a 64-char lowercase hex string.
    InvalidRequestKey {
        /// Length of the raw input.
        input_length: usize,
    },
    /// Derived request key is invalid (invariant violation).
    DerivedRequestKeyInvalid {
        /// Candidate key that failed validation.
        candidate: String,
    },
}

impl PrimitiveError {
    fn error_code(&self) -> ErrorCode {
        match self {
            Self::InvalidAddonName { .. } => ErrorCode::new("domain", "invalid_addon_name"),
            Self::EmptyVirtualPath { .. } | Self::InvalidVirtualPath { .. } => {
                ErrorCode::new("domain", "invalid_virtual_path")
            },
            Self::InvalidRequestKey { .. } | Self::DerivedRequestKeyInvalid { .. } => {
                ErrorCode::new("domain", "invalid_request_key")
            },
        }
    }

    const fn is_invariant(&self) -> bool {
        matches!(self, Self::DerivedRequestKeyInvalid { .. })
    }
}

impl fmt::Display for PrimitiveError {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidAddonName { .. } => formatter.write_str("AddonName must be non-empty"),
            Self::EmptyVirtualPath { .. } => formatter.write_str("VirtualPath must be non-empty"),
            Self::InvalidVirtualPath { input } => {
                write!(formatter, "VirtualPath is not a valid archive path: {input}")
            },
            Self::InvalidRequestKey { .. } => {
                formatter.write_str("RequestKey must be a 64-char lowercase hex string")
            },
            Self::DerivedRequestKeyInvalid { candidate } => {
                write!(formatter, "derived request key is invalid: {candidate}")
            },
        }
    }
}

impl std::error::Error for PrimitiveError {}

impl From<PrimitiveError> for ErrorEnvelope {
    fn from(error: PrimitiveError) -> Self {
        let code = error.error_code();
        let message = error.to_string();
        if error.is_invariant() {
            Self::invariant(code, message)
        } else {
            Self::expected(code, message)
        }
    }
}

/// User-chosen addon name, also the source of the archive file stem.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AddonName(Box<str>);

impl AddonName {
    /// Parse an addon name from user input.
    ///
    /// The value is trimmed; empty values are rejected. Any character is
    /// permitted here — sanitization applies only when deriving a filename.
    pub fn parse(input: impl AsRef<str>) -> Result<Self, PrimitiveError> {
        let raw = input.as_ref();
        let Some(trimmed) = trimmed_non_empty(raw) else {
            return Err(PrimitiveError::InvalidAddonName {
                input_length: raw.len(),
            });
        };

        Ok(Self(trimmed.to_owned().into_boxed_str()))
    }

    /// Access the underlying string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Derive a filesystem-safe file stem.
    ///
    /// Characters outside `[A-Za-z0-9_ -]` are stripped; an empty result
    /// falls back to [`DEFAULT_FILE_STEM`].
    #[must_use]
    pub fn file_stem(&self) -> String {
        let sanitized: String = self
            .0
            .chars()
            .filter(|ch| ch.is_ascii_alphanumeric() || matches!(ch, '_' | ' ' | '-'))
            .collect();
        let sanitized = sanitized.trim();
        if sanitized.is_empty() {
            DEFAULT_FILE_STEM.to_owned()
        } else {
            sanitized.to_owned()
        }
    }
}

impl fmt::Display for AddonName {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Forward-slash-delimited path inside the output archive.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VirtualPath(Box<str>);

impl VirtualPath {
    /// Parse an archive path.
    ///
    /// Rules: non-empty after trimming, forward slashes only, no leading or
    /// trailing slash, no empty segments, and no `.`/`..` segments.
    pub fn parse(input: impl AsRef<str>) -> Result<Self, PrimitiveError> {
        let raw = input.as_ref();
        let Some(trimmed) = trimmed_non_empty(raw) else {
            return Err(PrimitiveError::EmptyVirtualPath {
                input_length: raw.len(),
            });
        };

        if !is_valid_virtual_path(trimmed) {
            return Err(PrimitiveError::InvalidVirtualPath {
                input: trimmed.to_owned(),
            });
        }

        Ok(Self(trimmed.to_owned().into_boxed_str()))
    }

    /// Access the underlying string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for VirtualPath {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

fn is_valid_virtual_path(path: &str) -> bool {
    if path.contains('\\') {
        return false;
    }
    path.split('/')
        .all(|segment| !segment.is_empty() && segment != "." && segment != "..")
}

/// Cache key derived from a generation request.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestKey(Box<str>);

impl RequestKey {
    /// Parse a request key (64 lowercase hex characters).
    pub fn parse(input: impl AsRef<str>) -> Result<Self, PrimitiveError> {
        let raw = input.as_ref();
        if raw.len() != REQUEST_KEY_LEN
            || !raw
                .bytes()
                .all(|byte| byte.is_ascii_digit() || (b'a'..=b'f').contains(&byte))
        {
            return Err(PrimitiveError::InvalidRequestKey {
                input_length: raw.len(),
            });
        }

        Ok(Self(raw.to_owned().into_boxed_str()))
    }

    /// Access the underlying string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RequestKey {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

fn trimmed_non_empty(raw: &str) -> Option<&str> {
    let trimmed = raw.trim();
    if trimmed.is_empty() { None } else { Some(trimmed) }
}
