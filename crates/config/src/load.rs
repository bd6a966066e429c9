//! Config loading helpers (env + file + overrides).
//!
//! The loader is responsible for deterministic merge order and surfacing
//! user-facing errors as typed `ErrorEnvelope`s.

use crate::env::{ForgeEnv, apply_env_overrides};
use crate::schema::{ForgeConfig, ValidatedForgeConfig, parse_forge_config_json, parse_forge_config_toml};
use addon_forge_shared::{ErrorClass, ErrorCode, ErrorEnvelope};
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ConfigFormat {
    Json,
    Toml,
}

/// Load the config from an optional file path plus env overrides.
///
/// Precedence (highest wins): env overrides, file content, defaults.
pub fn load_forge_config_from_path(
    config_path: Option<&Path>,
    env: &ForgeEnv,
) -> Result<ValidatedForgeConfig, ErrorEnvelope> {
    let config = match config_path {
        None => ForgeConfig::default(),
        Some(path) => {
            let config_text = read_config_file(path)?;
            match detect_config_format(path)? {
                ConfigFormat::Json => parse_forge_config_json(&config_text)?,
                ConfigFormat::Toml => parse_forge_config_toml(&config_text)?,
            }
        },
    };

    // env is applied last and also validates the resulting config.
    apply_env_overrides(config, env)
}

/// Load the config from std env and an optional file path.
pub fn load_forge_config_std_env(
    config_path: Option<&Path>,
) -> Result<(ValidatedForgeConfig, ForgeEnv), ErrorEnvelope> {
    let env = ForgeEnv::from_std_env().map_err(ErrorEnvelope::from)?;
    let config = load_forge_config_from_path(config_path, &env)?;
    Ok((config, env))
}

/// Serialize the config as deterministic pretty JSON (with trailing newline).
pub fn to_pretty_json(config: &ForgeConfig) -> Result<String, ErrorEnvelope> {
    let mut output = serde_json::to_string_pretty(config).map_err(|error| {
        ErrorEnvelope::unexpected(
            ErrorCode::internal(),
            format!("failed to serialize config: {error}"),
            ErrorClass::NonRetriable,
        )
    })?;
    output.push('\n');
    Ok(output)
}

/// Serialize the config as deterministic pretty TOML (with trailing newline).
pub fn to_pretty_toml(config: &ForgeConfig) -> Result<String, ErrorEnvelope> {
    let output = toml::to_string_pretty(config).map_err(|error| {
        ErrorEnvelope::unexpected(
            ErrorCode::new("config", "serialize_toml"),
            format!("failed to serialize config TOML: {error}"),
            ErrorClass::NonRetriable,
        )
    })?;
    if output.ends_with('\n') {
        Ok(output)
    } else {
        Ok(format!("{output}\n"))
    }
}

fn read_config_file(path: &Path) -> Result<String, ErrorEnvelope> {
    std::fs::read_to_string(path).map_err(|error| {
        ErrorEnvelope::from(error).with_metadata("path", path.display().to_string())
    })
}

fn detect_config_format(path: &Path) -> Result<ConfigFormat, ErrorEnvelope> {
    match path.extension().and_then(|extension| extension.to_str()) {
        Some("json") => Ok(ConfigFormat::Json),
        Some("toml") => Ok(ConfigFormat::Toml),
        other => Err(ErrorEnvelope::expected(
            ErrorCode::new("config", "unknown_format"),
            format!(
                "unsupported config extension: {}",
                other.unwrap_or("<none>")
            ),
        )),
    }
}
