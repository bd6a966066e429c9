//! Generation boundary contract.
//!
//! The external generative service is treated as an opaque, fallible, slow
//! collaborator: a system instruction, a user-content payload, an optional
//! response schema, and a temperature go in; raw text comes out. Parsing and
//! verification live above this boundary.

use crate::BoxFuture;
use addon_forge_shared::{RequestContext, Result};
use std::sync::Arc;

/// Provider descriptor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratorProviderInfo {
    /// Stable provider identifier (e.g. `gemini`).
    pub id: Box<str>,
    /// Human-readable provider name.
    pub name: Box<str>,
}

/// One part of the user-content payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentPart {
    /// UTF-8 text part.
    Text(Box<str>),
    /// Inline binary part with a MIME type.
    InlineData {
        /// MIME type of the data (e.g. `image/png`).
        mime_type: Box<str>,
        /// Raw bytes.
        data: Arc<[u8]>,
    },
}

impl ContentPart {
    /// Convenience constructor for a text part.
    pub fn text(value: impl Into<Box<str>>) -> Self {
        Self::Text(value.into())
    }
}

/// Owned request for one generation call.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerateRequest {
    /// System instruction steering the model.
    pub system_instruction: Box<str>,
    /// Ordered user-content parts.
    pub parts: Vec<ContentPart>,
    /// Optional JSON schema the response must conform to.
    pub response_schema: Option<serde_json::Value>,
    /// Optional sampling temperature (provider default when absent).
    pub temperature: Option<f32>,
}

/// Boundary contract for text generation.
pub trait GeneratorPort: Send + Sync {
    /// Provider info for this implementation.
    fn provider(&self) -> &GeneratorProviderInfo;

    /// Run one generation call and return the raw response text.
    fn generate(
        &self,
        ctx: &RequestContext,
        request: GenerateRequest,
    ) -> BoxFuture<'_, Result<Box<str>>>;
}
