use config::{Config, Environment, File};
use serde::de::DeserializeOwned;
use std::borrow::Cow;
use std::path::{Path, PathBuf};
use tracing::info;

/// Prefix of environment overrides, e.g. `MODHUB__SERVER__PORT=9000`.
pub const ENV_PREFIX: &str = "MODHUB";

#[modhub_derive::modhub_error]
pub enum ConfigError {
    #[error("Config error{}: {source}", format_context(.context))]
    Config { source: config::ConfigError, context: Option<Cow<'static, str>> },
}

/// Loads layered configuration: a required file overlaid by `MODHUB__*` environment variables.
///
/// 1. **Base file**: `path` (extension optional, any format the `config` crate knows);
///    `"server"` when `None`.
/// 2. **Environment**: variables prefixed with `MODHUB__`; nesting uses double underscores
///    (`MODHUB__SECURITY__IDENTITY__JWT__SECRET` maps to `security.identity.jwt.secret`).
///
/// # Errors
/// * The file cannot be found or parsed.
/// * The merged values do not match `T`.
///
/// # Example
/// ```rust
/// use modhub_kernel::config::load_config;
///
/// #[derive(Default, serde::Deserialize)]
/// struct AppConfig {
///     port: u16,
/// }
///
/// let cfg: AppConfig = load_config(Some("config/local")).unwrap_or_default();
/// ```
pub fn load_config<T>(path: Option<impl AsRef<Path>>) -> Result<T, ConfigError>
where
    T: DeserializeOwned,
{
    let effective_path = path.map_or_else(|| PathBuf::from("server"), |p| p.as_ref().to_path_buf());

    let builder = Config::builder()
        .add_source(File::from(effective_path.as_path()).required(true))
        .add_source(
            Environment::with_prefix(ENV_PREFIX)
                .separator("__")
                .try_parsing(true),
        );

    info!(path = %effective_path.display(), "Loading configuration");

    let config = builder
        .build()
        .context("Failed to build config")?
        .try_deserialize::<T>()
        .context("Failed to deserialize config")?;

    Ok(config)
}
