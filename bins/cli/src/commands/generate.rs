//! Generate command handler: full prompt-to-archive pipeline.

use crate::commands::{read_uploaded_inputs, write_archive};
use crate::error::{CliError, ExitCode};
use crate::format::OutputMode;
use crate::{CliOutput, build_logger, format_error_output};
use addon_forge_adapters::{GeminiGenerator, GeminiGeneratorConfig, SessionCache, ZipCodec};
use addon_forge_app::{
    AssembleBundleDeps, AssembleBundleInput, AssembledBundle, GenerateBundleDeps,
    GenerateBundleInput, assemble_bundle, generate_bundle,
};
use addon_forge_config::load_forge_config_std_env;
use addon_forge_domain::{AddonName, BundleDraft};
use addon_forge_shared::{ErrorCode, ErrorEnvelope, RequestContext, SecretString};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Default system instruction when none is supplied.
const DEFAULT_SYSTEM_INSTRUCTION: &str = "You are an expert Minecraft Bedrock addon \
developer. From the user's request, produce a complete, installable addon: behavior \
pack and resource pack JSON definitions, scripts, and language files, each at its \
correct pack-relative path. When an uploaded asset belongs in the addon, emit a \
relocation instruction for it instead of inlining its bytes.";

/// Inputs for generate command execution.
pub struct GenerateCommandInput<'a> {
    pub config_path: Option<&'a Path>,
    pub name: &'a str,
    pub prompt: &'a str,
    pub instruction_path: Option<&'a Path>,
    pub input_paths: &'a [PathBuf],
    pub out_dir: &'a Path,
    pub temperature: Option<f32>,
    pub save_draft: Option<&'a Path>,
}

/// Run the generate command.
pub async fn run_generate(
    mode: OutputMode,
    input: &GenerateCommandInput<'_>,
) -> Result<CliOutput, CliError> {
    let name = match AddonName::parse(input.name) {
        Ok(name) => name,
        Err(error) => return Ok(format_error_output(mode, &ErrorEnvelope::from(error))),
    };

    let (config, env) = match load_forge_config_std_env(input.config_path) {
        Ok(loaded) => loaded,
        Err(error) => return Ok(format_error_output(mode, &error)),
    };
    let config = config.into_config();

    if config.generator.provider.as_ref() != "gemini" {
        let error = ErrorEnvelope::expected(
            ErrorCode::new("config", "unknown_provider"),
            format!("unsupported generator provider: {}", config.generator.provider),
        );
        return Ok(format_error_output(mode, &error));
    }
    let Some(api_key) = env.api_key else {
        let error = ErrorEnvelope::expected(
            ErrorCode::new("config", "missing_api_key"),
            "set ADF_GENERATOR_API_KEY (or GEMINI_API_KEY) to call the generator",
        );
        return Ok(format_error_output(mode, &error));
    };

    let system_instruction = match read_instruction(input.instruction_path) {
        Ok(instruction) => instruction,
        Err(error) => return Ok(format_error_output(mode, &error)),
    };
    let uploaded = match read_uploaded_inputs(input.input_paths) {
        Ok(uploaded) => uploaded,
        Err(error) => return Ok(format_error_output(mode, &error)),
    };

    let generator = match build_generator(api_key, &config.generator) {
        Ok(generator) => generator,
        Err(error) => return Ok(format_error_output(mode, &error)),
    };
    let cache = match SessionCache::new(&config.cache) {
        Ok(cache) => Arc::new(cache),
        Err(error) => return Ok(format_error_output(mode, &error)),
    };
    let logger = build_logger(mode);

    let ctx = RequestContext::new_request();
    let generate_deps = GenerateBundleDeps {
        generator,
        cache,
        logger: logger.clone(),
        telemetry: None,
    };
    let draft = match generate_bundle(
        &ctx,
        &generate_deps,
        GenerateBundleInput {
            system_instruction,
            prompt: input.prompt.into(),
            inputs: uploaded.clone(),
            temperature: input.temperature.or(Some(config.generator.temperature)),
        },
    )
    .await
    {
        Ok(draft) => draft,
        Err(error) => return Ok(format_error_output(mode, &error)),
    };

    if let Some(path) = input.save_draft
        && let Err(error) = save_draft(path, &draft)
    {
        return Ok(format_error_output(mode, &error));
    }

    let assemble_deps = AssembleBundleDeps {
        codec: Arc::new(ZipCodec::new()),
        logger,
        telemetry: None,
    };
    let bundle = match assemble_bundle(
        &ctx,
        &assemble_deps,
        AssembleBundleInput {
            name,
            files: draft.files.clone(),
            inputs: uploaded,
            relocations: draft.relocations.clone(),
        },
    )
    .await
    {
        Ok(bundle) => bundle,
        Err(error) => return Ok(format_error_output(mode, &error)),
    };

    let target = match write_archive(input.out_dir, &bundle.file_name, &bundle.bytes) {
        Ok(target) => target,
        Err(error) => return Ok(format_error_output(mode, &error)),
    };

    format_bundle_output(mode, &target, &bundle, draft.report.as_deref())
}

fn build_generator(
    api_key: SecretString,
    config: &addon_forge_config::GeneratorConfig,
) -> Result<Arc<GeminiGenerator>, ErrorEnvelope> {
    let generator_config =
        GeminiGeneratorConfig::from_generator_config(api_key.into_inner(), config);
    Ok(Arc::new(GeminiGenerator::new(&generator_config)?))
}

fn read_instruction(path: Option<&Path>) -> Result<Box<str>, ErrorEnvelope> {
    match path {
        None => Ok(DEFAULT_SYSTEM_INSTRUCTION.into()),
        Some(path) => std::fs::read_to_string(path)
            .map(String::into_boxed_str)
            .map_err(|error| {
                ErrorEnvelope::from(error).with_metadata("path", path.display().to_string())
            }),
    }
}

fn save_draft(path: &Path, draft: &BundleDraft) -> Result<(), ErrorEnvelope> {
    let serialized = serde_json::to_string_pretty(draft).map_err(|error| {
        ErrorEnvelope::unexpected(
            ErrorCode::internal(),
            format!("failed to serialize draft: {error}"),
            addon_forge_shared::ErrorClass::NonRetriable,
        )
    })?;
    std::fs::write(path, serialized).map_err(|error| {
        ErrorEnvelope::from(error).with_metadata("path", path.display().to_string())
    })
}

pub(crate) fn format_bundle_output(
    mode: OutputMode,
    target: &Path,
    bundle: &AssembledBundle,
    report: Option<&str>,
) -> Result<CliOutput, CliError> {
    let stdout = if mode.is_json() {
        let payload = serde_json::json!({
            "status": "ok",
            "archive": target.display().to_string(),
            "fileName": bundle.file_name.as_ref(),
            "archiveBytes": bundle.bytes.len(),
            "warnings": bundle.warnings,
            "report": report,
        });
        let mut out = serde_json::to_string_pretty(&payload)?;
        out.push('\n');
        out
    } else {
        let mut out = String::new();
        out.push_str("status: ok\n");
        out.push_str(&format!("archive: {}\n", target.display()));
        for warning in &bundle.warnings {
            out.push_str(&format!("warning: {warning}\n"));
        }
        if let Some(report) = report {
            out.push_str(&format!("report:\n{report}\n"));
        }
        out
    };

    Ok(CliOutput {
        stdout,
        stderr: String::new(),
        exit_code: ExitCode::Ok,
    })
}
