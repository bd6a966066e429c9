//! Request key derivation and input fingerprinting.
//!
//! A request key names one logical generation request in the response cache:
//! identical `(instruction, prompt, fingerprint)` triples must derive the
//! identical key, and any differing byte must change it. Parts are hashed by
//! straight concatenation, so callers fix a stable part ordering.

use crate::bundle::UploadedInput;
use crate::primitives::{PrimitiveError, RequestKey};
use sha2::{Digest, Sha256};
use std::fmt::Write as _;

/// One ordered part of a request key.
#[derive(Debug, Clone, Copy)]
pub enum KeyPart<'a> {
    /// UTF-8 text part.
    Text(&'a str),
    /// Raw byte part.
    Bytes(&'a [u8]),
}

/// Derive a request key from ordered heterogeneous parts.
///
/// Pure function of its inputs; SHA-256 rendered as lowercase hex.
pub fn derive_request_key(parts: &[KeyPart<'_>]) -> Result<RequestKey, PrimitiveError> {
    let mut hasher = Sha256::new();
    for part in parts {
        match part {
            KeyPart::Text(text) => hasher.update(text.as_bytes()),
            KeyPart::Bytes(bytes) => hasher.update(bytes),
        }
    }
    let digest = hasher.finalize();
    let mut candidate = String::with_capacity(digest.len() * 2);
    for byte in digest {
        let _ = write!(candidate, "{byte:02x}");
    }

    RequestKey::parse(candidate.as_str())
        .map_err(|_| PrimitiveError::DerivedRequestKeyInvalid { candidate })
}

/// Compute a stable textual fingerprint of an input set.
///
/// Text-bearing inputs (valid UTF-8) contribute their content; opaque binary
/// inputs contribute a `name:kind` marker. The fingerprint is consistent for
/// identical input sets in identical order; it does not need to be
/// cryptographically strong on its own — it is hashed into the request key.
#[must_use]
pub fn input_fingerprint(inputs: &[UploadedInput]) -> Box<str> {
    let mut fingerprint = String::new();
    for input in inputs {
        match input.as_text() {
            Some(text) => {
                let _ = writeln!(fingerprint, "text\u{1f}{}\u{1f}{text}", input.name);
            },
            None => {
                let _ = writeln!(
                    fingerprint,
                    "binary\u{1f}{}\u{1f}{}",
                    input.name,
                    input.origin.as_str()
                );
            },
        }
    }
    fingerprint.into_boxed_str()
}
