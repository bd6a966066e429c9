//! # addon-forge-app
//!
//! Application use cases for addon generation and packaging.
//! This crate depends on `ports`, `domain`, and `shared`.

pub mod assemble_bundle;
pub mod generate_bundle;
pub mod resolve_asset;

pub use assemble_bundle::{
    AssembleBundleDeps, AssembleBundleInput, AssembleRawInput, AssembledBundle, RawContainer,
    assemble_bundle, assemble_raw_containers,
};
pub use generate_bundle::{GenerateBundleDeps, GenerateBundleInput, generate_bundle};
pub use resolve_asset::{AssetResolution, resolve_asset};

/// Returns the app crate version.
#[must_use]
pub const fn app_crate_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
