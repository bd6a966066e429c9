//! Info command handler.

use crate::error::{CliError, ExitCode};
use crate::format::OutputMode;
use crate::CliOutput;
use addon_forge_core::build_info;

/// Run the info command.
pub fn run_info(mode: OutputMode) -> Result<CliOutput, CliError> {
    let info = build_info();
    let stdout = if mode.is_json() {
        let payload = serde_json::json!({
            "name": info.name,
            "version": info.version,
            "rustVersion": info.rustc_version,
            "profile": info.profile,
            "gitHash": info.git_hash,
        });
        let mut out = serde_json::to_string_pretty(&payload)?;
        out.push('\n');
        out
    } else {
        format!("{}\n", info.version_string())
    };

    Ok(CliOutput {
        stdout,
        stderr: String::new(),
        exit_code: ExitCode::Ok,
    })
}
