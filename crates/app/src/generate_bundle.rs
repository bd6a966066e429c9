//! Bundle generation use-case (cache + two-pass generate/verify).
//!
//! Single-pass generation from a probabilistic model is not reliable enough
//! to guarantee internally consistent output (stable identifiers, unbroken
//! cross-references). Every first pass that yields files is therefore
//! followed by a verification pass at temperature zero, and the final result
//! is cached under the pre-verification key so identical future requests
//! skip both network calls.

use addon_forge_domain::{
    BundleDraft, GeneratedFile, KeyPart, RelocationInstruction, RequestKey, UploadedInput,
    VirtualPath, derive_request_key, input_fingerprint,
};
use addon_forge_ports::{
    CacheStorePort, ContentPart, GenerateRequest, GeneratorPort, LogFields, LoggerPort,
    TelemetryPort,
};
use addon_forge_shared::{ErrorCode, ErrorEnvelope, RequestContext, Result};
use serde::Deserialize;
use serde_json::{Value, json};
use std::sync::Arc;
use std::time::Instant;

/// Fixed instruction for the verification pass.
const VERIFY_INSTRUCTION: &str = "You are a strict validator for game addon files. \
Check every provided file for schema correctness, matching identifiers, and unbroken \
cross-references between files. Return the full corrected set of files; copy files that \
are already correct unchanged. Do not add or remove files unless a reference requires it.";

/// Input payload for bundle generation.
#[derive(Debug, Clone)]
pub struct GenerateBundleInput {
    /// System instruction steering the generator.
    pub system_instruction: Box<str>,
    /// User prompt text.
    pub prompt: Box<str>,
    /// Uploaded files forwarded as context.
    pub inputs: Vec<UploadedInput>,
    /// First-pass sampling temperature (provider default when absent).
    pub temperature: Option<f32>,
}

/// Dependencies required by bundle generation.
#[derive(Clone)]
pub struct GenerateBundleDeps {
    /// Generator adapter.
    pub generator: Arc<dyn GeneratorPort>,
    /// Response cache adapter.
    pub cache: Arc<dyn CacheStorePort>,
    /// Optional logger.
    pub logger: Option<Arc<dyn LoggerPort>>,
    /// Optional telemetry sink.
    pub telemetry: Option<Arc<dyn TelemetryPort>>,
}

/// Execute bundle generation for the given input.
pub async fn generate_bundle(
    ctx: &RequestContext,
    deps: &GenerateBundleDeps,
    input: GenerateBundleInput,
) -> Result<BundleDraft> {
    let started_at = Instant::now();

    if let Some(logger) = deps.logger.as_ref() {
        logger.info(
            "generation.start",
            "Bundle generation started",
            Some(log_fields_start(&input)),
        );
    }

    let result = run_generation(ctx, deps, &input).await;

    match result {
        Ok(draft) => {
            if let Some(logger) = deps.logger.as_ref() {
                logger.info(
                    "generation.completed",
                    "Bundle generation completed",
                    Some(log_fields_completed(&draft, started_at)),
                );
            }
            Ok(draft)
        },
        Err(error) => {
            let duration_ms = duration_ms(started_at);
            if error.is_cancelled() {
                if let Some(logger) = deps.logger.as_ref() {
                    logger.info(
                        "generation.aborted",
                        "Bundle generation aborted",
                        Some(log_fields_error(duration_ms, &error)),
                    );
                }
            } else {
                if let Some(telemetry) = deps.telemetry.as_ref() {
                    telemetry.increment_counter("generation.failed", 1, None);
                }
                if let Some(logger) = deps.logger.as_ref() {
                    logger.error(
                        "generation.failed",
                        "Bundle generation failed",
                        Some(log_fields_error(duration_ms, &error)),
                    );
                }
            }
            Err(error)
        },
    }
}

async fn run_generation(
    ctx: &RequestContext,
    deps: &GenerateBundleDeps,
    input: &GenerateBundleInput,
) -> Result<BundleDraft> {
    ctx.ensure_not_cancelled("generate_bundle.start")?;

    let fingerprint = input_fingerprint(&input.inputs);
    let key = derive_request_key(&[
        KeyPart::Text(&input.system_instruction),
        KeyPart::Text(&input.prompt),
        KeyPart::Text(&fingerprint),
    ])
    .map_err(ErrorEnvelope::from)?;

    if let Some(cached) = lookup_cached(deps, &key).await {
        return Ok(cached);
    }

    ctx.ensure_not_cancelled("generate_bundle.first_pass")?;
    let raw = deps
        .generator
        .generate(ctx, first_pass_request(input))
        .await?;
    let first = parse_bundle_reply(&raw)?;
    if first.files.is_empty() {
        return Err(ErrorEnvelope::expected(
            ErrorCode::new("generation", "empty_result"),
            "the generator produced no files",
        ));
    }

    ctx.ensure_not_cancelled("generate_bundle.verify_pass")?;
    let verify_raw = deps
        .generator
        .generate(ctx, verify_pass_request(&first.files)?)
        .await?;
    let verified = parse_bundle_reply(&verify_raw)?;
    if verified.files.is_empty() {
        return Err(ErrorEnvelope::expected(
            ErrorCode::new("generation", "verification_empty"),
            "the verification pass produced no files",
        ));
    }

    // The verification pass only replaces files; relocations and the report
    // carry over from the first pass.
    let draft = BundleDraft {
        files: verified.files,
        relocations: first.relocations,
        report: first.report,
    };

    store_cached(deps, &key, &draft).await;
    Ok(draft)
}

async fn lookup_cached(deps: &GenerateBundleDeps, key: &RequestKey) -> Option<BundleDraft> {
    let Some(cached) = deps.cache.get(key).await else {
        record_cache_outcome(deps, "generation.cache.miss");
        return None;
    };

    match serde_json::from_str::<BundleDraft>(&cached) {
        Ok(draft) => {
            record_cache_outcome(deps, "generation.cache.hit");
            if let Some(logger) = deps.logger.as_ref() {
                let mut fields = LogFields::new();
                fields.insert("requestKey".into(), Value::String(key.to_string()));
                logger.debug("generation.cache_hit", "Returning cached result", Some(fields));
            }
            Some(draft)
        },
        Err(error) => {
            // A corrupt stored value degrades to a miss, never to an error.
            record_cache_outcome(deps, "generation.cache.corrupt");
            if let Some(logger) = deps.logger.as_ref() {
                let mut fields = LogFields::new();
                fields.insert("requestKey".into(), Value::String(key.to_string()));
                fields.insert("error".into(), Value::String(error.to_string()));
                logger.warn(
                    "generation.cache_corrupt",
                    "Discarding undeserializable cached value",
                    Some(fields),
                );
            }
            None
        },
    }
}

async fn store_cached(deps: &GenerateBundleDeps, key: &RequestKey, draft: &BundleDraft) {
    match serde_json::to_string(draft) {
        Ok(serialized) => {
            deps.cache.put(key, serialized.into_boxed_str()).await;
        },
        Err(error) => {
            // Caching is best-effort; a serialization failure is logged and
            // the caller proceeds as if the value were simply not cached.
            if let Some(logger) = deps.logger.as_ref() {
                let mut fields = LogFields::new();
                fields.insert("error".into(), Value::String(error.to_string()));
                logger.warn(
                    "generation.cache_store_failed",
                    "Failed to serialize result for caching",
                    Some(fields),
                );
            }
        },
    }
}

fn record_cache_outcome(deps: &GenerateBundleDeps, counter: &str) {
    if let Some(telemetry) = deps.telemetry.as_ref() {
        telemetry.increment_counter(counter, 1, None);
    }
}

fn first_pass_request(input: &GenerateBundleInput) -> GenerateRequest {
    let mut parts = Vec::with_capacity(input.inputs.len() + 1);
    parts.push(ContentPart::text(input.prompt.clone()));
    for uploaded in &input.inputs {
        parts.push(input_part(uploaded));
    }

    GenerateRequest {
        system_instruction: input.system_instruction.clone(),
        parts,
        response_schema: Some(bundle_reply_schema()),
        temperature: input.temperature,
    }
}

fn verify_pass_request(files: &[GeneratedFile]) -> Result<GenerateRequest> {
    let listing = serde_json::to_string_pretty(files).map_err(|error| {
        ErrorEnvelope::unexpected(
            ErrorCode::internal(),
            format!("failed to serialize files for verification: {error}"),
            addon_forge_shared::ErrorClass::NonRetriable,
        )
    })?;

    Ok(GenerateRequest {
        system_instruction: VERIFY_INSTRUCTION.into(),
        parts: vec![ContentPart::text(listing)],
        response_schema: Some(bundle_reply_schema()),
        temperature: Some(0.0),
    })
}

fn input_part(uploaded: &UploadedInput) -> ContentPart {
    match uploaded.as_text() {
        Some(text) => ContentPart::text(format!("File `{}`:\n{text}", uploaded.name)),
        None => ContentPart::InlineData {
            mime_type: mime_for_name(&uploaded.name).into(),
            data: Arc::clone(&uploaded.bytes),
        },
    }
}

fn mime_for_name(name: &str) -> &'static str {
    let lower = name.to_ascii_lowercase();
    match lower.rsplit('.').next() {
        Some("png") => "image/png",
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("ogg") => "audio/ogg",
        Some("wav") => "audio/wav",
        Some("mp3") => "audio/mpeg",
        _ => "application/octet-stream",
    }
}

fn bundle_reply_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "files": {
                "type": "array",
                "items": {
                    "type": "object",
                    "properties": {
                        "path": { "type": "string" },
                        "content": { "type": "string" }
                    },
                    "required": ["path", "content"]
                }
            },
            "relocations": {
                "type": "array",
                "items": {
                    "type": "object",
                    "properties": {
                        "original_path": { "type": "string" },
                        "new_path": { "type": "string" }
                    },
                    "required": ["original_path", "new_path"]
                }
            },
            "report": { "type": "string" }
        },
        "required": ["files"]
    })
}

#[derive(Debug, Deserialize)]
struct RawBundleReply {
    #[serde(default)]
    files: Vec<RawGeneratedFile>,
    #[serde(default)]
    relocations: Vec<RawRelocation>,
    #[serde(default)]
    report: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawGeneratedFile {
    path: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct RawRelocation {
    original_path: String,
    new_path: String,
}

fn parse_bundle_reply(raw: &str) -> Result<BundleDraft> {
    let reply: RawBundleReply = serde_json::from_str(raw).map_err(|error| {
        ErrorEnvelope::expected(
            ErrorCode::new("generation", "unparseable_response"),
            format!("the generator response is not valid JSON: {error}"),
        )
    })?;

    let mut files = Vec::with_capacity(reply.files.len());
    for file in reply.files {
        let path = VirtualPath::parse(&file.path).map_err(|_| invalid_path(&file.path))?;
        files.push(GeneratedFile {
            path,
            content: file.content.into_boxed_str(),
        });
    }

    let mut relocations = Vec::with_capacity(reply.relocations.len());
    for relocation in reply.relocations {
        let new_path =
            VirtualPath::parse(&relocation.new_path).map_err(|_| invalid_path(&relocation.new_path))?;
        relocations.push(RelocationInstruction {
            original_path: relocation.original_path.into_boxed_str(),
            new_path,
        });
    }

    Ok(BundleDraft {
        files,
        relocations,
        report: reply.report.map(String::into_boxed_str),
    })
}

fn invalid_path(path: &str) -> ErrorEnvelope {
    ErrorEnvelope::expected(
        ErrorCode::new("generation", "unparseable_response"),
        "the generator response contains an invalid archive path",
    )
    .with_metadata("path", path.to_owned())
}

fn log_fields_start(input: &GenerateBundleInput) -> LogFields {
    let mut fields = LogFields::new();
    fields.insert("promptLength".into(), Value::from(input.prompt.len()));
    fields.insert("inputs".into(), Value::from(input.inputs.len()));
    if let Some(temperature) = input.temperature {
        fields.insert("temperature".into(), Value::from(f64::from(temperature)));
    }
    fields
}

fn log_fields_completed(draft: &BundleDraft, started_at: Instant) -> LogFields {
    let mut fields = LogFields::new();
    fields.insert("durationMs".into(), Value::from(duration_ms(started_at)));
    fields.insert("files".into(), Value::from(draft.files.len()));
    fields.insert("relocations".into(), Value::from(draft.relocations.len()));
    fields
}

fn log_fields_error(duration_ms: u64, error: &ErrorEnvelope) -> LogFields {
    let mut fields = LogFields::new();
    fields.insert("durationMs".into(), Value::from(duration_ms));
    fields.insert("error".into(), Value::String(error.to_string()));
    fields
}

fn duration_ms(started_at: Instant) -> u64 {
    u64::try_from(started_at.elapsed().as_millis()).unwrap_or(u64::MAX)
}
