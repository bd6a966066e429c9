//! Assemble command handler: package a saved draft without regeneration.

use crate::commands::generate::format_bundle_output;
use crate::commands::{read_uploaded_inputs, write_archive};
use crate::error::CliError;
use crate::format::OutputMode;
use crate::{CliOutput, build_logger, format_error_output};
use addon_forge_adapters::ZipCodec;
use addon_forge_app::{AssembleBundleDeps, AssembleBundleInput, assemble_bundle};
use addon_forge_domain::{AddonName, BundleDraft};
use addon_forge_shared::{ErrorCode, ErrorEnvelope, RequestContext};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Inputs for assemble command execution.
pub struct AssembleCommandInput<'a> {
    pub name: &'a str,
    pub draft_path: &'a Path,
    pub input_paths: &'a [PathBuf],
    pub out_dir: &'a Path,
}

/// Run the assemble command.
pub async fn run_assemble(
    mode: OutputMode,
    input: &AssembleCommandInput<'_>,
) -> Result<CliOutput, CliError> {
    let name = match AddonName::parse(input.name) {
        Ok(name) => name,
        Err(error) => return Ok(format_error_output(mode, &ErrorEnvelope::from(error))),
    };
    let draft = match read_draft(input.draft_path) {
        Ok(draft) => draft,
        Err(error) => return Ok(format_error_output(mode, &error)),
    };
    let uploaded = match read_uploaded_inputs(input.input_paths) {
        Ok(uploaded) => uploaded,
        Err(error) => return Ok(format_error_output(mode, &error)),
    };

    let ctx = RequestContext::new_request();
    let deps = AssembleBundleDeps {
        codec: Arc::new(ZipCodec::new()),
        logger: build_logger(mode),
        telemetry: None,
    };
    let report = draft.report.clone();
    let bundle = match assemble_bundle(
        &ctx,
        &deps,
        AssembleBundleInput {
            name,
            files: draft.files,
            inputs: uploaded,
            relocations: draft.relocations,
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

    format_bundle_output(mode, &target, &bundle, report.as_deref())
}

fn read_draft(path: &Path) -> Result<BundleDraft, ErrorEnvelope> {
    let text = std::fs::read_to_string(path).map_err(|error| {
        ErrorEnvelope::from(error).with_metadata("path", path.display().to_string())
    })?;
    serde_json::from_str(&text).map_err(|error| {
        ErrorEnvelope::expected(
            ErrorCode::new("cli", "invalid_draft"),
            format!("failed to parse draft file: {error}"),
        )
        .with_metadata("path", path.display().to_string())
    })
}
