//! # addon-forge-core
//!
//! Build information for the addon-forge workspace.
//!
//! This crate has no dependencies on other workspace crates, making it safe
//! to import anywhere.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

/// Build-time information about the binary.
///
/// Captures metadata determined at compile time; constant for the lifetime of
/// the running binary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildInfo {
    /// Package name from Cargo.toml
    pub name: &'static str,

    /// Package version from Cargo.toml (semver)
    pub version: &'static str,

    /// Minimum supported Rust version declared for the build
    pub rustc_version: &'static str,

    /// Build profile ("debug" or "release")
    pub profile: &'static str,

    /// Git commit hash (short form, if available)
    pub git_hash: Option<&'static str>,
}

impl BuildInfo {
    /// Returns a human-readable version string.
    ///
    /// Format: `name version (git_hash)` or `name version` without git info.
    #[must_use]
    pub fn version_string(&self) -> String {
        match self.git_hash {
            Some(hash) => format!("{} {} ({hash})", self.name, self.version),
            None => format!("{} {}", self.name, self.version),
        }
    }

    /// Returns true if this is a debug build.
    #[must_use]
    pub const fn is_debug(&self) -> bool {
        matches!(self.profile.as_bytes(), b"debug")
    }
}

/// Returns build-time information about the binary.
///
/// The values are deterministic and will not change during the lifetime of
/// the running process.
#[must_use]
pub const fn build_info() -> BuildInfo {
    BuildInfo {
        name: env!("CARGO_PKG_NAME"),
        version: env!("CARGO_PKG_VERSION"),
        rustc_version: env!("CARGO_PKG_RUST_VERSION"),
        profile: if cfg!(debug_assertions) {
            "debug"
        } else {
            "release"
        },
        git_hash: option_env!("GIT_HASH"),
    }
}
