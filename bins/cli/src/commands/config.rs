//! Config command handlers.

use crate::error::{CliError, ExitCode};
use crate::format::OutputMode;
use crate::{CliOutput, format_error_output};
use addon_forge_config::{load_forge_config_std_env, to_pretty_json, to_pretty_toml};
use std::path::Path;

/// Run `config show`: print the effective config after env overrides.
pub fn run_config_show(mode: OutputMode, config_path: Option<&Path>) -> Result<CliOutput, CliError> {
    let (config, _env) = match load_forge_config_std_env(config_path) {
        Ok(loaded) => loaded,
        Err(error) => return Ok(format_error_output(mode, &error)),
    };
    let config = config.into_config();

    let rendered = if mode.is_json() {
        to_pretty_json(&config)
    } else {
        to_pretty_toml(&config)
    };
    match rendered {
        Ok(stdout) => Ok(CliOutput {
            stdout,
            stderr: String::new(),
            exit_code: ExitCode::Ok,
        }),
        Err(error) => Ok(format_error_output(mode, &error)),
    }
}
