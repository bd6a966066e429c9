//! # addon-forge-ports
//!
//! Port traits for the addon-forge hexagonal architecture.
//!
//! This crate defines the interfaces between the domain and infrastructure
//! layers. It depends only on `domain` and `shared`.

use std::future::Future;
use std::pin::Pin;

/// Boxed future used by port traits.
///
/// We deliberately use boxed futures for boundary traits (I/O-bound work);
/// the archive codec stays synchronous because it is CPU-bound in-memory
/// work.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Returns the ports crate version.
#[must_use]
pub const fn ports_crate_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

pub mod archive;
pub mod cache;
pub mod generator;
pub mod logger;
pub mod telemetry;

pub use archive::*;
pub use cache::*;
pub use generator::*;
pub use logger::*;
pub use telemetry::*;

// Re-export selected domain types used in port signatures, so adapter crates
// can implement ports without directly depending on `addon-forge-domain`.
pub use addon_forge_domain::{BundleDraft, RequestKey, UploadedInput, VirtualPath};
