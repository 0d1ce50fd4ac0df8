use config::{Config, Environment, File};
use serde::de::DeserializeOwned;
use std::borrow::Cow;
use std::path::{Path, PathBuf};
use tracing::info;

/// Environment prefix for overrides (`SILO__STORAGE__DATA_DIR` -> `storage.data_dir`).
pub const ENV_PREFIX: &str = "SILO";
const DEFAULT_CONFIG_FILE: &str = "server";

#[silo_derive::silo_error]
pub enum ConfigError {
    #[error("Config error{}: {source}", format_context(.context))]
    Config { source: config::ConfigError, context: Option<Cow<'static, str>> },
}

/// Loads `T` from an optional config file overlaid with `SILO__*` environment variables.
///
/// The file is looked up by stem (`server.toml`, `server.yaml`, `server.json`, ...) and may
/// be absent: every field of the service configuration has a default, so a bare
/// environment is a valid setup. Nested keys use a double underscore, e.g.
/// `SILO__SERVER__PORT=8080`.
///
/// # Errors
/// Fails when the file exists but cannot be parsed, or when the merged values do not
/// deserialize into `T`.
///
/// # Example
/// ```rust
/// use silo_kernel::config::load_config;
/// use silo_kernel::domain::config::ApiConfig;
///
/// let cfg: ApiConfig = load_config(Some("does/not/exist")).unwrap();
/// assert_eq!(cfg.server.port, 4583);
/// ```
pub fn load_config<T>(path: Option<impl AsRef<Path>>) -> Result<T, ConfigError>
where
    T: DeserializeOwned,
{
    load_with_env(path, Environment::with_prefix(ENV_PREFIX))
}

pub(crate) fn load_with_env<T>(
    path: Option<impl AsRef<Path>>,
    env: Environment,
) -> Result<T, ConfigError>
where
    T: DeserializeOwned,
{
    let effective_path =
        path.map_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE), |p| p.as_ref().to_path_buf());

    info!(path = %effective_path.display(), "Loading configuration");

    Config::builder()
        .add_source(File::from(effective_path.as_path()).required(false))
        .add_source(env.prefix_separator("__").separator("__").try_parsing(true))
        .build()
        .context("Failed to build config")?
        .try_deserialize::<T>()
        .context("Failed to deserialize config")
}
