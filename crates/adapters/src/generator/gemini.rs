//! Gemini generation adapter.

use addon_forge_config::GeneratorConfig;
use addon_forge_ports::{ContentPart, GenerateRequest, GeneratorPort, GeneratorProviderInfo};
use addon_forge_shared::{ErrorClass, ErrorCode, ErrorEnvelope, RequestContext, Result};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use reqwest::StatusCode;
use reqwest::header::{HeaderMap, HeaderValue};
use serde::{Deserialize, Serialize};
use std::time::Duration;

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
const DEFAULT_MODEL: &str = "gemini-2.5-flash";
const HEADER_API_KEY: &str = "x-goog-api-key";
const JSON_MIME_TYPE: &str = "application/json";

/// Gemini generation adapter configuration.
#[derive(Debug, Clone)]
pub struct GeminiGeneratorConfig {
    /// API key used for authentication.
    pub api_key: Box<str>,
    /// Model name (defaults to `gemini-2.5-flash`).
    pub model: Option<Box<str>>,
    /// Base URL override (defaults to `https://generativelanguage.googleapis.com/v1beta`).
    pub base_url: Option<Box<str>>,
    /// Request timeout in milliseconds.
    pub timeout_ms: u64,
}

impl GeminiGeneratorConfig {
    /// Build from the shared generator config plus an API key.
    #[must_use]
    pub fn from_generator_config(api_key: Box<str>, config: &GeneratorConfig) -> Self {
        Self {
            api_key,
            model: config.model.clone(),
            base_url: config.base_url.clone(),
            timeout_ms: config.timeout_ms,
        }
    }
}

/// Gemini generation adapter implementation.
pub struct GeminiGenerator {
    provider: GeneratorProviderInfo,
    client: reqwest::Client,
    endpoint: Box<str>,
}

impl GeminiGenerator {
    /// Create a new Gemini generation adapter.
    pub fn new(config: &GeminiGeneratorConfig) -> Result<Self> {
        let api_key = normalize_required("api key", config.api_key.as_ref())?;
        let model = normalize_optional_required("model", config.model.as_deref())?
            .unwrap_or_else(|| DEFAULT_MODEL.to_owned().into_boxed_str());
        let model_resource = normalize_model_resource(model.as_ref())?;
        let base_url = normalize_optional_required("base url", config.base_url.as_deref())?
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_owned().into_boxed_str());
        let base_url = base_url.trim_end_matches('/').to_owned().into_boxed_str();
        if base_url.is_empty() {
            return Err(ErrorEnvelope::expected(
                ErrorCode::invalid_input(),
                "base url must be non-empty",
            ));
        }
        if config.timeout_ms == 0 {
            return Err(ErrorEnvelope::expected(
                ErrorCode::invalid_input(),
                "timeout must be greater than zero",
            ));
        }

        let mut headers = HeaderMap::new();
        let mut api_header = HeaderValue::from_str(api_key.as_ref()).map_err(|_| {
            ErrorEnvelope::expected(
                ErrorCode::invalid_input(),
                "api key contains invalid header characters",
            )
        })?;
        api_header.set_sensitive(true);
        headers.insert(HEADER_API_KEY, api_header);

        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .default_headers(headers)
            .build()
            .map_err(|error| {
                ErrorEnvelope::unexpected(
                    ErrorCode::new("generation", "gemini_client_init_failed"),
                    format!("failed to build Gemini client: {error}"),
                    ErrorClass::NonRetriable,
                )
            })?;

        let provider = GeneratorProviderInfo {
            id: "gemini".into(),
            name: "Gemini".into(),
        };
        let endpoint = format!("{base_url}/{model_resource}:generateContent").into_boxed_str();

        Ok(Self {
            provider,
            client,
            endpoint,
        })
    }

    async fn send_request(
        &self,
        ctx: &RequestContext,
        request: GeminiGenerateRequest,
        operation: &'static str,
    ) -> Result<GeminiGenerateResponse> {
        ctx.ensure_not_cancelled(operation)?;

        let response = tokio::select! {
            () = ctx.cancelled() => return Err(cancelled_error(operation)),
            result = self.client.post(self.endpoint.as_ref()).json(&request).send() => {
                result.map_err(|error| map_reqwest_error(&error))?
            }
        };

        let status = response.status();
        let payload = tokio::select! {
            () = ctx.cancelled() => return Err(cancelled_error(operation)),
            result = response.bytes() => result.map_err(|error| map_reqwest_error(&error))?,
        };

        if !status.is_success() {
            return Err(map_gemini_http_error(status, &payload));
        }

        serde_json::from_slice(&payload).map_err(|error| {
            ErrorEnvelope::unexpected(
                ErrorCode::new("generation", "gemini_invalid_response"),
                format!("failed to decode Gemini response: {error}"),
                ErrorClass::NonRetriable,
            )
        })
    }
}

impl GeneratorPort for GeminiGenerator {
    fn provider(&self) -> &GeneratorProviderInfo {
        &self.provider
    }

    fn generate(
        &self,
        ctx: &RequestContext,
        request: GenerateRequest,
    ) -> addon_forge_ports::BoxFuture<'_, Result<Box<str>>> {
        let ctx = ctx.clone();
        let payload = GeminiGenerateRequest::from_request(request);
        Box::pin(async move {
            let response = self
                .send_request(&ctx, payload, "gemini_generator.generate")
                .await?;
            extract_text(response)
        })
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiGenerateRequest {
    system_instruction: GeminiContent,
    contents: Vec<GeminiRoleContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GeminiGenerationConfig>,
}

impl GeminiGenerateRequest {
    fn from_request(request: GenerateRequest) -> Self {
        let generation_config = GeminiGenerationConfig::from_request(&request);
        let parts = request.parts.into_iter().map(GeminiPart::from_part).collect();
        Self {
            system_instruction: GeminiContent {
                parts: vec![GeminiPart::text(request.system_instruction)],
            },
            contents: vec![GeminiRoleContent {
                role: "user".into(),
                parts,
            }],
            generation_config,
        }
    }
}

#[derive(Debug, Serialize)]
struct GeminiContent {
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Serialize)]
struct GeminiRoleContent {
    role: Box<str>,
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
enum GeminiPart {
    #[serde(rename = "text")]
    Text(Box<str>),
    InlineData(GeminiInlineData),
}

impl GeminiPart {
    fn text(value: Box<str>) -> Self {
        Self::Text(value)
    }

    fn from_part(part: ContentPart) -> Self {
        match part {
            ContentPart::Text(text) => Self::Text(text),
            ContentPart::InlineData { mime_type, data } => Self::InlineData(GeminiInlineData {
                mime_type,
                data: BASE64.encode(data.as_ref()).into_boxed_str(),
            }),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiInlineData {
    mime_type: Box<str>,
    data: Box<str>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiGenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_mime_type: Option<Box<str>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_schema: Option<serde_json::Value>,
}

impl GeminiGenerationConfig {
    fn from_request(request: &GenerateRequest) -> Option<Self> {
        if request.temperature.is_none() && request.response_schema.is_none() {
            return None;
        }
        let response_mime_type = request
            .response_schema
            .as_ref()
            .map(|_| JSON_MIME_TYPE.to_owned().into_boxed_str());
        Some(Self {
            temperature: request.temperature,
            response_mime_type,
            response_schema: request.response_schema.clone(),
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiGenerateResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
    #[serde(default)]
    prompt_feedback: Option<GeminiPromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiCandidate {
    #[serde(default)]
    content: Option<GeminiCandidateContent>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GeminiCandidateContent {
    #[serde(default)]
    parts: Vec<GeminiCandidatePart>,
}

#[derive(Debug, Deserialize)]
struct GeminiCandidatePart {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiPromptFeedback {
    #[serde(default)]
    block_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GeminiErrorResponse {
    error: GeminiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct GeminiErrorDetail {
    message: String,
    status: Option<String>,
    code: Option<u32>,
}

fn extract_text(response: GeminiGenerateResponse) -> Result<Box<str>> {
    if let Some(feedback) = response.prompt_feedback
        && let Some(block_reason) = feedback.block_reason
    {
        return Err(ErrorEnvelope::expected(
            ErrorCode::new("generation", "safety_blocked"),
            "Gemini rejected the prompt",
        )
        .with_metadata("block_reason", block_reason));
    }

    let candidate = response.candidates.into_iter().next().ok_or_else(|| {
        ErrorEnvelope::unexpected(
            ErrorCode::new("generation", "gemini_empty_candidates"),
            "Gemini returned no candidates",
            ErrorClass::NonRetriable,
        )
    })?;

    if candidate.finish_reason.as_deref() == Some("SAFETY") {
        return Err(ErrorEnvelope::expected(
            ErrorCode::new("generation", "safety_blocked"),
            "Gemini stopped the response for safety reasons",
        ));
    }

    let text: String = candidate
        .content
        .map(|content| {
            content
                .parts
                .into_iter()
                .filter_map(|part| part.text)
                .collect()
        })
        .unwrap_or_default();

    if text.is_empty() {
        return Err(ErrorEnvelope::unexpected(
            ErrorCode::new("generation", "gemini_empty_response"),
            "Gemini returned an empty response",
            ErrorClass::NonRetriable,
        ));
    }

    Ok(text.into_boxed_str())
}

fn normalize_required(label: &str, value: &str) -> Result<Box<str>> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ErrorEnvelope::expected(
            ErrorCode::invalid_input(),
            format!("{label} must be set"),
        ));
    }
    Ok(trimmed.to_owned().into_boxed_str())
}

fn normalize_optional_required(label: &str, value: Option<&str>) -> Result<Option<Box<str>>> {
    let trimmed = match value {
        Some(value) => value.trim(),
        None => return Ok(None),
    };
    if trimmed.is_empty() {
        return Err(ErrorEnvelope::expected(
            ErrorCode::invalid_input(),
            format!("{label} must be non-empty"),
        ));
    }
    Ok(Some(trimmed.to_owned().into_boxed_str()))
}

fn normalize_model_resource(model: &str) -> Result<Box<str>> {
    let trimmed = model.trim().trim_start_matches('/');
    if trimmed.is_empty() {
        return Err(ErrorEnvelope::expected(
            ErrorCode::invalid_input(),
            "model must be non-empty",
        ));
    }
    if trimmed.starts_with("models/") {
        Ok(trimmed.to_owned().into_boxed_str())
    } else {
        Ok(format!("models/{trimmed}").into_boxed_str())
    }
}

fn cancelled_error(operation: &'static str) -> ErrorEnvelope {
    ErrorEnvelope::cancelled("operation cancelled").with_metadata("operation", operation)
}

fn map_reqwest_error(error: &reqwest::Error) -> ErrorEnvelope {
    if error.is_timeout() {
        return ErrorEnvelope::unexpected(
            ErrorCode::timeout(),
            "Gemini request timed out",
            ErrorClass::Retriable,
        );
    }
    if error.is_connect() {
        return ErrorEnvelope::unexpected(
            ErrorCode::io(),
            format!("Gemini connection failed: {error}"),
            ErrorClass::Retriable,
        );
    }
    ErrorEnvelope::unexpected(
        ErrorCode::new("generation", "gemini_request_failed"),
        format!("Gemini request failed: {error}"),
        ErrorClass::NonRetriable,
    )
}

fn map_gemini_http_error(status: StatusCode, payload: &[u8]) -> ErrorEnvelope {
    let mut envelope = if let Ok(parsed) = serde_json::from_slice::<GeminiErrorResponse>(payload) {
        let message = parsed.error.message;
        let mut envelope = match status.as_u16() {
            400 | 404 | 422 => ErrorEnvelope::expected(ErrorCode::invalid_input(), message),
            401 | 403 => ErrorEnvelope::expected(ErrorCode::permission_denied(), message),
            408 => ErrorEnvelope::unexpected(ErrorCode::timeout(), message, ErrorClass::Retriable),
            429 => ErrorEnvelope::unexpected(
                ErrorCode::rate_limited(),
                message,
                ErrorClass::Retriable,
            ),
            _ if status.is_server_error() => ErrorEnvelope::unexpected(
                ErrorCode::dependency_unavailable(),
                message,
                ErrorClass::Retriable,
            ),
            _ => ErrorEnvelope::unexpected(
                ErrorCode::new("generation", "gemini_http_error"),
                message,
                ErrorClass::NonRetriable,
            ),
        };

        if let Some(error_status) = parsed.error.status.as_deref() {
            envelope = envelope.with_metadata("error_status", error_status.to_string());
        }
        if let Some(error_code) = parsed.error.code {
            envelope = envelope.with_metadata("error_code", error_code.to_string());
        }
        envelope
    } else {
        ErrorEnvelope::unexpected(
            ErrorCode::new("generation", "gemini_http_error"),
            "Gemini request failed with non-JSON error",
            if status.is_server_error() {
                ErrorClass::Retriable
            } else {
                ErrorClass::NonRetriable
            },
        )
    };

    envelope = envelope.with_metadata("status", status.as_u16().to_string());
    envelope
}
