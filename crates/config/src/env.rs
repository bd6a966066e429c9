//! Environment variable parsing and env-to-config merging.
//!
//! Env parsing is:
//! - strict (invalid values fail fast)
//! - safe (secret values are redacted in error metadata)

use crate::schema::{ForgeConfig, ValidatedForgeConfig};
use addon_forge_shared::{ErrorCode, ErrorEnvelope, REDACTED_VALUE, SecretString, is_secret_key};
use std::fmt;

/// Env var: generator provider identifier.
pub const ENV_GENERATOR_PROVIDER: &str = "ADF_GENERATOR_PROVIDER";
/// Env var: generator model override.
pub const ENV_GENERATOR_MODEL: &str = "ADF_GENERATOR_MODEL";
/// Env var: generator base URL override.
pub const ENV_GENERATOR_BASE_URL: &str = "ADF_GENERATOR_BASE_URL";
/// Env var: generator timeout in milliseconds.
pub const ENV_GENERATOR_TIMEOUT_MS: &str = "ADF_GENERATOR_TIMEOUT_MS";
/// Env var: generator sampling temperature.
pub const ENV_GENERATOR_TEMPERATURE: &str = "ADF_GENERATOR_TEMPERATURE";
/// Env var: generator API key (secret).
pub const ENV_GENERATOR_API_KEY: &str = "ADF_GENERATOR_API_KEY";
/// Env var: generator API key (alias).
pub const ENV_GENERATOR_API_KEY_ALIAS: &str = "GEMINI_API_KEY";
/// Env var: response cache enabled.
pub const ENV_CACHE_ENABLED: &str = "ADF_CACHE_ENABLED";
/// Env var: response cache max entries.
pub const ENV_CACHE_MAX_ENTRIES: &str = "ADF_CACHE_MAX_ENTRIES";
/// Env var: response cache max bytes.
pub const ENV_CACHE_MAX_BYTES: &str = "ADF_CACHE_MAX_BYTES";

/// Typed parse failures for env values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvParseError {
    /// The env var name.
    pub variable: String,
    /// The offending value (redacted for secrets).
    pub value: String,
    /// What was expected.
    pub expected: &'static str,
}

impl fmt::Display for EnvParseError {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            formatter,
            "invalid value for {} (expected {}): {}",
            self.variable, self.expected, self.value
        )
    }
}

impl std::error::Error for EnvParseError {}

impl From<EnvParseError> for ErrorEnvelope {
    fn from(error: EnvParseError) -> Self {
        Self::expected(ErrorCode::new("config", "invalid_env"), error.to_string())
    }
}

fn parse_error(variable: &str, value: &str, expected: &'static str) -> EnvParseError {
    let value = if is_secret_key(variable) {
        REDACTED_VALUE.to_string()
    } else {
        value.to_string()
    };
    EnvParseError {
        variable: variable.to_string(),
        value,
        expected,
    }
}

/// Parsed environment overrides.
#[derive(Debug, Clone, Default)]
pub struct ForgeEnv {
    /// Generator provider override.
    pub provider: Option<Box<str>>,
    /// Generator model override.
    pub model: Option<Box<str>>,
    /// Generator base URL override.
    pub base_url: Option<Box<str>>,
    /// Generator timeout override.
    pub timeout_ms: Option<u64>,
    /// Generator temperature override.
    pub temperature: Option<f32>,
    /// Generator API key (never merged into the config file model).
    pub api_key: Option<SecretString>,
    /// Cache enabled override.
    pub cache_enabled: Option<bool>,
    /// Cache max entries override.
    pub cache_max_entries: Option<u32>,
    /// Cache max bytes override.
    pub cache_max_bytes: Option<u64>,
}

impl ForgeEnv {
    /// Parse overrides from the process environment.
    pub fn from_std_env() -> Result<Self, EnvParseError> {
        Self::from_pairs(std::env::vars())
    }

    /// Parse overrides from an iterator of `(name, value)` pairs.
    ///
    /// Empty values are treated as unset. The `GEMINI_API_KEY` alias is only
    /// consulted when the primary key variable is absent.
    pub fn from_pairs(
        pairs: impl IntoIterator<Item = (String, String)>,
    ) -> Result<Self, EnvParseError> {
        let mut env = Self::default();
        let mut alias_api_key = None;

        for (name, value) in pairs {
            let trimmed = value.trim();
            if trimmed.is_empty() {
                continue;
            }
            match name.as_str() {
                ENV_GENERATOR_PROVIDER => env.provider = Some(trimmed.into()),
                ENV_GENERATOR_MODEL => env.model = Some(trimmed.into()),
                ENV_GENERATOR_BASE_URL => env.base_url = Some(trimmed.into()),
                ENV_GENERATOR_TIMEOUT_MS => {
                    env.timeout_ms = Some(parse_u64(&name, trimmed)?);
                },
                ENV_GENERATOR_TEMPERATURE => {
                    env.temperature = Some(parse_f32(&name, trimmed)?);
                },
                ENV_GENERATOR_API_KEY => env.api_key = Some(SecretString::new(trimmed)),
                ENV_GENERATOR_API_KEY_ALIAS => alias_api_key = Some(SecretString::new(trimmed)),
                ENV_CACHE_ENABLED => {
                    env.cache_enabled = Some(parse_bool(&name, trimmed)?);
                },
                ENV_CACHE_MAX_ENTRIES => {
                    env.cache_max_entries = Some(parse_u32(&name, trimmed)?);
                },
                ENV_CACHE_MAX_BYTES => {
                    env.cache_max_bytes = Some(parse_u64(&name, trimmed)?);
                },
                _ => {},
            }
        }

        if env.api_key.is_none() {
            env.api_key = alias_api_key;
        }
        Ok(env)
    }
}

/// Apply env overrides to a config, then validate the result.
///
/// Env is applied last in the precedence order (defaults < file < env).
pub fn apply_env_overrides(
    mut config: ForgeConfig,
    env: &ForgeEnv,
) -> Result<ValidatedForgeConfig, ErrorEnvelope> {
    if let Some(provider) = env.provider.as_ref() {
        config.generator.provider = provider.clone();
    }
    if let Some(model) = env.model.as_ref() {
        config.generator.model = Some(model.clone());
    }
    if let Some(base_url) = env.base_url.as_ref() {
        config.generator.base_url = Some(base_url.clone());
    }
    if let Some(timeout_ms) = env.timeout_ms {
        config.generator.timeout_ms = timeout_ms;
    }
    if let Some(temperature) = env.temperature {
        config.generator.temperature = temperature;
    }
    if let Some(enabled) = env.cache_enabled {
        config.cache.enabled = enabled;
    }
    if let Some(max_entries) = env.cache_max_entries {
        config.cache.max_entries = max_entries;
    }
    if let Some(max_bytes) = env.cache_max_bytes {
        config.cache.max_bytes = max_bytes;
    }

    config.validate().map_err(ErrorEnvelope::from)
}

fn parse_u64(variable: &str, value: &str) -> Result<u64, EnvParseError> {
    value
        .parse()
        .map_err(|_| parse_error(variable, value, "unsigned integer"))
}

fn parse_u32(variable: &str, value: &str) -> Result<u32, EnvParseError> {
    value
        .parse()
        .map_err(|_| parse_error(variable, value, "unsigned integer"))
}

fn parse_f32(variable: &str, value: &str) -> Result<f32, EnvParseError> {
    value
        .parse()
        .map_err(|_| parse_error(variable, value, "number"))
}

fn parse_bool(variable: &str, value: &str) -> Result<bool, EnvParseError> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(parse_error(variable, value, "boolean")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pairs(entries: &[(&str, &str)]) -> Vec<(String, String)> {
        entries
            .iter()
            .map(|(name, value)| ((*name).to_string(), (*value).to_string()))
            .collect()
    }

    #[test]
    fn parses_typed_overrides() -> Result<(), EnvParseError> {
        let env = ForgeEnv::from_pairs(pairs(&[
            (ENV_GENERATOR_TIMEOUT_MS, "30000"),
            (ENV_GENERATOR_TEMPERATURE, "0.2"),
            (ENV_CACHE_ENABLED, "false"),
            (ENV_CACHE_MAX_ENTRIES, "16"),
        ]))?;

        assert_eq!(env.timeout_ms, Some(30_000));
        assert_eq!(env.temperature, Some(0.2));
        assert_eq!(env.cache_enabled, Some(false));
        assert_eq!(env.cache_max_entries, Some(16));
        Ok(())
    }

    #[test]
    fn rejects_invalid_numbers() {
        let error = ForgeEnv::from_pairs(pairs(&[(ENV_GENERATOR_TIMEOUT_MS, "soon")])).err();
        assert!(matches!(error, Some(e) if e.variable == ENV_GENERATOR_TIMEOUT_MS));
    }

    #[test]
    fn redacts_secret_values_in_errors() {
        // A non-numeric value for a secret-looking variable must not leak.
        let error = parse_error(ENV_GENERATOR_API_KEY, "sk-secret", "string");
        assert_eq!(error.value, REDACTED_VALUE);
    }

    #[test]
    fn api_key_alias_is_fallback_only() -> Result<(), EnvParseError> {
        let env = ForgeEnv::from_pairs(pairs(&[
            (ENV_GENERATOR_API_KEY_ALIAS, "alias-key"),
            (ENV_GENERATOR_API_KEY, "primary-key"),
        ]))?;
        assert_eq!(env.api_key.as_ref().map(SecretString::expose), Some("primary-key"));

        let env = ForgeEnv::from_pairs(pairs(&[(ENV_GENERATOR_API_KEY_ALIAS, "alias-key")]))?;
        assert_eq!(env.api_key.as_ref().map(SecretString::expose), Some("alias-key"));
        Ok(())
    }

    #[test]
    fn overrides_apply_after_file_values() -> Result<(), ErrorEnvelope> {
        let env = ForgeEnv {
            timeout_ms: Some(45_000),
            cache_enabled: Some(false),
            ..ForgeEnv::default()
        };
        let validated = apply_env_overrides(ForgeConfig::default(), &env)?;
        let config = validated.as_config();

        assert_eq!(config.generator.timeout_ms, 45_000);
        assert!(!config.cache.enabled);
        Ok(())
    }

    #[test]
    fn invalid_override_fails_validation() {
        let env = ForgeEnv {
            timeout_ms: Some(1),
            ..ForgeEnv::default()
        };
        let result = apply_env_overrides(ForgeConfig::default(), &env);
        assert!(result.is_err());
    }
}
