//! # addon-forge-config
//!
//! Configuration schema, validation, and normalization logic for the CLI.
//! This crate depends on `shared` only.

/// Environment variable parsing and merging.
pub mod env;
/// Config loading helpers (env + file + overrides).
pub mod load;
/// Configuration schema types and helpers.
pub mod schema;

pub use env::{
    ENV_CACHE_ENABLED, ENV_CACHE_MAX_BYTES, ENV_CACHE_MAX_ENTRIES, ENV_GENERATOR_API_KEY,
    ENV_GENERATOR_API_KEY_ALIAS, ENV_GENERATOR_BASE_URL, ENV_GENERATOR_MODEL,
    ENV_GENERATOR_PROVIDER, ENV_GENERATOR_TEMPERATURE, ENV_GENERATOR_TIMEOUT_MS, EnvParseError,
    ForgeEnv, apply_env_overrides,
};
pub use load::{
    load_forge_config_from_path, load_forge_config_std_env, to_pretty_json, to_pretty_toml,
};
pub use schema::{
    CURRENT_CONFIG_VERSION, CacheConfig, ConfigSchemaError, ForgeConfig, GeneratorConfig,
    ValidatedForgeConfig, parse_forge_config_json, parse_forge_config_toml,
};

/// Returns the config crate version.
#[must_use]
pub const fn config_crate_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
