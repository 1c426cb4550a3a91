//! Configuration for the MedRemind backend
//!
//! Configuration is assembled once at startup from, in increasing priority:
//!
//! 1. `config/default.{toml,json,yaml}` (optional)
//! 2. `config/{RUN_ENV}.{toml,json,yaml}` (optional, `RUN_ENV` defaults to `debug`)
//! 3. environment variables prefixed with `MEDREMIND`, e.g. `MEDREMIND__PUSH__DRY_RUN=true`
//!
//! Values written as `"secret_from_env"` are then replaced from the secret
//! environment variables described in [`env_vars`].
//!
//! The resulting [`AppConfig`] is passed explicitly to every component that
//! needs it; nothing reads the environment after startup.

use config::{Config, ConfigError, Environment, File};
use once_cell::sync::OnceCell;
use std::env;
use std::path::PathBuf;
use tracing::debug;

pub mod env_vars;
pub mod models;

pub use models::*;

/// Directory that holds the layered config files, relative to the working directory
pub const DEFAULT_CONFIG_DIR: &str = "config";

/// Loads the application configuration.
///
/// # Errors
///
/// Returns a `ConfigError` if a present config file cannot be parsed or the
/// merged result does not deserialize into [`AppConfig`].
pub fn load_config() -> Result<AppConfig, ConfigError> {
    ensure_dotenv_loaded();

    let run_env = env::var("RUN_ENV").unwrap_or_else(|_| "debug".to_string());
    let prefix = env_vars::get_config_prefix();
    let config_dir = PathBuf::from(
        env::var("MEDREMIND_CONFIG_DIR").unwrap_or_else(|_| DEFAULT_CONFIG_DIR.to_string()),
    );

    let default_path = config_dir.join("default");
    let env_path = config_dir.join(&run_env);
    debug!(
        "Loading config from {} and {} (prefix {})",
        default_path.display(),
        env_path.display(),
        prefix
    );

    let builder = Config::builder()
        .add_source(File::from(default_path).required(false))
        .add_source(File::from(env_path).required(false))
        .add_source(
            Environment::with_prefix(&prefix)
                .separator(env_vars::CONFIG_SEPARATOR)
                .try_parsing(true),
        );

    let raw_config: AppConfig = builder.build()?.try_deserialize()?;
    apply_env_overrides_from_marker(raw_config)
}

/// Replaces every `"secret_from_env"` marker in the config with its environment value.
pub fn apply_env_overrides_from_marker(config: AppConfig) -> Result<AppConfig, ConfigError> {
    let mut json = serde_json::to_value(&config)
        .map_err(|err| ConfigError::Message(format!("failed to serialize config: {err}")))?;
    let replaced = env_vars::inject_env_vars(&mut json);
    if replaced > 0 {
        debug!("Injected {} secrets from environment", replaced);
    }
    serde_json::from_value(json)
        .map_err(|err| ConfigError::Message(format!("failed to rebuild config: {err}")))
}

static INIT_DOTENV: OnceCell<()> = OnceCell::new();

/// Loads the dotenv file into the process environment, once.
///
/// `DOTENV_OVERRIDE` selects another file; otherwise a first CLI argument
/// starting with `.env` is used, falling back to `.env`. Returns the path
/// that was used.
pub fn ensure_dotenv_loaded() -> String {
    let dotenv_path_override = env::var("DOTENV_OVERRIDE").ok();
    let dotenv_path_arg = env::args().nth(1).filter(|s| s.starts_with(".env"));

    let dotenv_path = dotenv_path_override
        .or(dotenv_path_arg)
        .unwrap_or_else(|| ".env".to_string());

    INIT_DOTENV.get_or_init(|| {
        dotenv::from_filename(&dotenv_path).ok();
    });

    dotenv_path
}
