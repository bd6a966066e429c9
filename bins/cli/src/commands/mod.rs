//! Command handlers.

mod assemble;
mod config;
mod generate;
mod info;
mod merge;

pub use assemble::{AssembleCommandInput, run_assemble};
pub use config::run_config_show;
pub use generate::{GenerateCommandInput, run_generate};
pub use info::run_info;
pub use merge::{MergeCommandInput, run_merge};

use addon_forge_domain::{InputOrigin, UploadedInput};
use addon_forge_shared::ErrorEnvelope;
use std::path::{Path, PathBuf};

/// Read uploaded input files from disk.
///
/// Container-looking files keep their addon origin so the resolver can fall
/// back to scanning them; everything else is a loose asset.
pub(crate) fn read_uploaded_inputs(paths: &[PathBuf]) -> Result<Vec<UploadedInput>, ErrorEnvelope> {
    let mut inputs = Vec::with_capacity(paths.len());
    for path in paths {
        let bytes = std::fs::read(path).map_err(|error| {
            ErrorEnvelope::from(error).with_metadata("path", path.display().to_string())
        })?;
        let name = path
            .file_name()
            .map_or_else(|| path.display().to_string(), |name| name.to_string_lossy().into_owned());
        let input = UploadedInput::new(name, bytes, InputOrigin::Asset);
        let input = if input.is_container() {
            UploadedInput {
                origin: InputOrigin::AddonFile,
                ..input
            }
        } else {
            input
        };
        inputs.push(input);
    }
    Ok(inputs)
}

/// Resolve the final archive path and write the bytes.
pub(crate) fn write_archive(
    out_dir: &Path,
    file_name: &str,
    bytes: &[u8],
) -> Result<PathBuf, ErrorEnvelope> {
    std::fs::create_dir_all(out_dir).map_err(|error| {
        ErrorEnvelope::from(error).with_metadata("path", out_dir.display().to_string())
    })?;
    let target = out_dir.join(file_name);
    std::fs::write(&target, bytes).map_err(|error| {
        ErrorEnvelope::from(error).with_metadata("path", target.display().to_string())
    })?;
    Ok(target)
}
