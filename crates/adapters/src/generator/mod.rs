//! Generator adapters.

#[cfg(feature = "gemini")]
mod gemini;

#[cfg(feature = "gemini")]
pub use gemini::{GeminiGenerator, GeminiGeneratorConfig};
