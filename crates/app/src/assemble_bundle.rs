//! Archive assembly use-case.
//!
//! Reassembles generated text files plus relocated user assets into one
//! consistent archive. Unresolvable relocations degrade to warnings (the
//! generated files are the functionally critical part); colliding paths are
//! last-write-wins with the fixed application order: generated files first,
//! then relocations in declaration order.

use crate::resolve_asset::{AssetResolution, resolve_asset};
use addon_forge_domain::{
    AddonName, AssetWarning, GeneratedFile, RelocationInstruction, UploadedInput,
};
use addon_forge_ports::{
    ArchiveCodecPort, ArchiveEntry, LogFields, LoggerPort, TelemetryPort,
};
use addon_forge_shared::{ErrorCode, ErrorEnvelope, RequestContext, Result};
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;

/// Archive file extension for assembled bundles.
const BUNDLE_EXTENSION: &str = "mcaddon";

/// Input payload for bundle assembly.
#[derive(Debug, Clone)]
pub struct AssembleBundleInput {
    /// User-chosen addon name (drives the archive file name).
    pub name: AddonName,
    /// Generated text files, written verbatim at their declared paths.
    pub files: Vec<GeneratedFile>,
    /// Pool of uploaded inputs available for relocation.
    pub inputs: Vec<UploadedInput>,
    /// Relocation instructions from the generator.
    pub relocations: Vec<RelocationInstruction>,
}

/// A pre-built container inserted unmodified at the archive root.
#[derive(Debug, Clone)]
pub struct RawContainer {
    /// Original filename, used as the entry path.
    pub file_name: Box<str>,
    /// Container bytes.
    pub bytes: Arc<[u8]>,
}

/// Input payload for raw-container assembly (no regeneration).
#[derive(Debug, Clone)]
pub struct AssembleRawInput {
    /// User-chosen addon name (drives the archive file name).
    pub name: AddonName,
    /// First container (typically a behavior pack).
    pub first: Option<RawContainer>,
    /// Second container (typically a resource pack).
    pub second: Option<RawContainer>,
}

/// Dependencies required by bundle assembly.
#[derive(Clone)]
pub struct AssembleBundleDeps {
    /// Archive codec adapter.
    pub codec: Arc<dyn ArchiveCodecPort>,
    /// Optional logger.
    pub logger: Option<Arc<dyn LoggerPort>>,
    /// Optional telemetry sink.
    pub telemetry: Option<Arc<dyn TelemetryPort>>,
}

/// An assembled, downloadable archive.
#[derive(Debug, Clone)]
pub struct AssembledBundle {
    /// Sanitized archive file name (`<stem>.mcaddon`).
    pub file_name: Box<str>,
    /// Archive bytes.
    pub bytes: Vec<u8>,
    /// Non-fatal warnings recorded during assembly.
    pub warnings: Vec<AssetWarning>,
}

/// Assemble generated files and relocated assets into one archive.
pub async fn assemble_bundle(
    ctx: &RequestContext,
    deps: &AssembleBundleDeps,
    input: AssembleBundleInput,
) -> Result<AssembledBundle> {
    let started_at = Instant::now();
    ctx.ensure_not_cancelled("assemble_bundle.start")?;

    if let Some(logger) = deps.logger.as_ref() {
        logger.info(
            "assembly.start",
            "Bundle assembly started",
            Some(log_fields_start(&input)),
        );
    }

    let mut entries: BTreeMap<Box<str>, Vec<u8>> = BTreeMap::new();
    for file in &input.files {
        entries.insert(
            file.path.as_str().to_owned().into_boxed_str(),
            file.content.as_bytes().to_vec(),
        );
    }

    let mut warnings = Vec::new();
    for relocation in &input.relocations {
        match resolve_asset(&relocation.original_path, &input.inputs, deps.codec.as_ref()) {
            AssetResolution::Found { bytes, warning } => {
                entries.insert(
                    relocation.new_path.as_str().to_owned().into_boxed_str(),
                    bytes.to_vec(),
                );
                if let Some(warning) = warning {
                    record_warning(deps, &mut warnings, warning);
                }
            },
            AssetResolution::NotFound => {
                record_warning(
                    deps,
                    &mut warnings,
                    AssetWarning::NotFound {
                        original_path: relocation.original_path.clone(),
                    },
                );
            },
        }
    }

    let archive_entries: Vec<ArchiveEntry> = entries
        .into_iter()
        .map(|(path, bytes)| ArchiveEntry { path, bytes })
        .collect();

    let result = deps.codec.pack(&archive_entries);
    finish(deps, &input.name, started_at, warnings, result)
}

/// Combine up to two pre-built containers into one archive, unmodified.
pub async fn assemble_raw_containers(
    ctx: &RequestContext,
    deps: &AssembleBundleDeps,
    input: AssembleRawInput,
) -> Result<AssembledBundle> {
    let started_at = Instant::now();
    ctx.ensure_not_cancelled("assemble_raw.start")?;

    let containers: Vec<RawContainer> = input
        .first
        .into_iter()
        .chain(input.second)
        .collect();
    if containers.is_empty() {
        return Err(ErrorEnvelope::expected(
            ErrorCode::invalid_input(),
            "at least one container is required",
        ));
    }

    let archive_entries: Vec<ArchiveEntry> = containers
        .into_iter()
        .map(|container| ArchiveEntry {
            path: container.file_name,
            bytes: container.bytes.to_vec(),
        })
        .collect();

    let result = deps.codec.pack(&archive_entries);
    finish(deps, &input.name, started_at, Vec::new(), result)
}

fn finish(
    deps: &AssembleBundleDeps,
    name: &AddonName,
    started_at: Instant,
    warnings: Vec<AssetWarning>,
    result: Result<Vec<u8>>,
) -> Result<AssembledBundle> {
    let duration_ms = duration_ms(started_at);
    match result {
        Ok(bytes) => {
            if let Some(telemetry) = deps.telemetry.as_ref() {
                telemetry.increment_counter("assembly.completed", 1, None);
                telemetry.record_timer_ms("assembly.duration", duration_ms, None);
            }
            if let Some(logger) = deps.logger.as_ref() {
                let mut fields = LogFields::new();
                fields.insert("durationMs".into(), Value::from(duration_ms));
                fields.insert("archiveBytes".into(), Value::from(bytes.len()));
                fields.insert("warnings".into(), Value::from(warnings.len()));
                logger.info("assembly.completed", "Bundle assembly completed", Some(fields));
            }
            Ok(AssembledBundle {
                file_name: format!("{}.{BUNDLE_EXTENSION}", name.file_stem()).into_boxed_str(),
                bytes,
                warnings,
            })
        },
        Err(error) => {
            if let Some(telemetry) = deps.telemetry.as_ref() {
                telemetry.increment_counter("assembly.failed", 1, None);
            }
            if let Some(logger) = deps.logger.as_ref() {
                let mut fields = LogFields::new();
                fields.insert("durationMs".into(), Value::from(duration_ms));
                fields.insert("error".into(), Value::String(error.to_string()));
                logger.error("assembly.failed", "Bundle assembly failed", Some(fields));
            }
            Err(error)
        },
    }
}

fn record_warning(
    deps: &AssembleBundleDeps,
    warnings: &mut Vec<AssetWarning>,
    warning: AssetWarning,
) {
    if let Some(logger) = deps.logger.as_ref() {
        let mut fields = LogFields::new();
        fields.insert("warning".into(), Value::String(warning.to_string()));
        logger.warn("assembly.asset_warning", "Asset resolution warning", Some(fields));
    }
    if let Some(telemetry) = deps.telemetry.as_ref() {
        telemetry.increment_counter("assembly.asset_warning", 1, None);
    }
    warnings.push(warning);
}

fn log_fields_start(input: &AssembleBundleInput) -> LogFields {
    let mut fields = LogFields::new();
    fields.insert("addonName".into(), Value::String(input.name.to_string()));
    fields.insert("generatedFiles".into(), Value::from(input.files.len()));
    fields.insert("inputs".into(), Value::from(input.inputs.len()));
    fields.insert("relocations".into(), Value::from(input.relocations.len()));
    fields
}

fn duration_ms(started_at: Instant) -> u64 {
    u64::try_from(started_at.elapsed().as_millis()).unwrap_or(u64::MAX)
}
