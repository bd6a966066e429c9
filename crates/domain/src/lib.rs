//! # addon-forge-domain
//!
//! Domain entities, primitives, and value objects for addon generation and
//! packaging.
//!
//! This crate contains the core domain model with no infrastructure
//! dependencies:
//!
//! - **Primitives** - `AddonName`, `VirtualPath`, `RequestKey`
//! - **Keys** - request key derivation and input fingerprinting
//! - **Bundle** - `GeneratedFile`, `UploadedInput`, `RelocationInstruction`,
//!   `BundleDraft`, `AssetWarning`
//!
//! ## Dependency Rules
//!
//! - Depends only on `shared` crate
//! - No infrastructure or adapter dependencies
//! - Pure domain logic with no I/O

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

// Re-export shared types for convenience
pub use addon_forge_shared::shared_crate_version;

pub mod bundle;
pub mod keys;
pub mod primitives;

pub use bundle::{
    AssetWarning, BundleDraft, GeneratedFile, InputOrigin, RelocationInstruction, UploadedInput,
};
pub use keys::{KeyPart, derive_request_key, input_fingerprint};
pub use primitives::{
    AddonName, DEFAULT_FILE_STEM, PrimitiveError, REQUEST_KEY_LEN, RequestKey, VirtualPath,
};

/// Returns the domain crate version.
#[must_use]
pub const fn domain_crate_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
