//! Merge command handler: combine pre-built containers without regeneration.

use crate::commands::generate::format_bundle_output;
use crate::commands::write_archive;
use crate::error::CliError;
use crate::format::OutputMode;
use crate::{CliOutput, build_logger, format_error_output};
use addon_forge_adapters::ZipCodec;
use addon_forge_app::{AssembleBundleDeps, AssembleRawInput, RawContainer, assemble_raw_containers};
use addon_forge_domain::AddonName;
use addon_forge_shared::{ErrorCode, ErrorEnvelope, RequestContext};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Inputs for merge command execution.
pub struct MergeCommandInput<'a> {
    pub name: &'a str,
    pub containers: &'a [PathBuf],
    pub out_dir: &'a Path,
}

/// Run the merge command.
pub async fn run_merge(
    mode: OutputMode,
    input: &MergeCommandInput<'_>,
) -> Result<CliOutput, CliError> {
    let name = match AddonName::parse(input.name) {
        Ok(name) => name,
        Err(error) => return Ok(format_error_output(mode, &ErrorEnvelope::from(error))),
    };
    if input.containers.is_empty() || input.containers.len() > 2 {
        let error = ErrorEnvelope::expected(
            ErrorCode::invalid_input(),
            "merge takes one or two container files",
        );
        return Ok(format_error_output(mode, &error));
    }

    let mut containers = Vec::with_capacity(input.containers.len());
    for path in input.containers {
        match read_container(path) {
            Ok(container) => containers.push(container),
            Err(error) => return Ok(format_error_output(mode, &error)),
        }
    }
    let mut containers = containers.into_iter();

    let ctx = RequestContext::new_request();
    let deps = AssembleBundleDeps {
        codec: Arc::new(ZipCodec::new()),
        logger: build_logger(mode),
        telemetry: None,
    };
    let bundle = match assemble_raw_containers(
        &ctx,
        &deps,
        AssembleRawInput {
            name,
            first: containers.next(),
            second: containers.next(),
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

    format_bundle_output(mode, &target, &bundle, None)
}

fn read_container(path: &Path) -> Result<RawContainer, ErrorEnvelope> {
    let bytes = std::fs::read(path).map_err(|error| {
        ErrorEnvelope::from(error).with_metadata("path", path.display().to_string())
    })?;
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .ok_or_else(|| {
            ErrorEnvelope::expected(
                ErrorCode::invalid_input(),
                format!("not a file path: {}", path.display()),
            )
        })?;
    Ok(RawContainer {
        file_name: file_name.into_boxed_str(),
        bytes: bytes.into(),
    })
}
