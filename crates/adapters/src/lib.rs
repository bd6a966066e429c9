//! # addon-forge-adapters
//!
//! Adapter implementations for ports (generator, cache, archive, logging).
//! This crate depends on `ports`, `config`, `domain`, and `shared`.

/// External generator adapters.
pub mod generator;

pub mod archive;
pub mod cache;
pub mod log_sink;
pub mod logger;
pub mod telemetry;

pub use archive::ZipCodec;
pub use cache::SessionCache;
#[cfg(feature = "gemini")]
pub use generator::{GeminiGenerator, GeminiGeneratorConfig};
pub use generator_test::FixedGenerator;
pub use log_sink::{LogSink, MemoryLogSink, StderrLogSink};
pub use logger::JsonLogger;
pub use telemetry::JsonTelemetry;

/// Returns the adapters crate version.
#[must_use]
pub const fn adapters_crate_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
