use std::path::Path;

// Declare the modules that make up this crate.
pub mod error;
pub mod settings;

// Re-export the core types to provide a clean public API.
pub use error::ConfigError;
pub use settings::{
    BacktestSettings, CausalitySettings, ConditioningSettings, DerivativeSettings,
    LeadLagSettings, PositionSizes, RegimeSettings, ReviewSettings, Settings, StatisticsSettings,
};

/// Prefix for environment overrides, e.g. `SPREADLAB__LEAD_LAG__MAX_LAG=6`.
pub const ENV_PREFIX: &str = "SPREADLAB";

/// Loads the analysis configuration from `config.toml` in the working directory.
///
/// The file is optional; environment variables override it and defaults fill
/// in anything neither source sets. The result is validated before it is returned.
pub fn load_config() -> Result<Settings, ConfigError> {
    load_layered(config::File::with_name("config.toml").required(false))
}

/// Same as [`load_config`] but reads the given file, which must exist.
pub fn load_config_from(path: impl AsRef<Path>) -> Result<Settings, ConfigError> {
    load_layered(config::File::from(path.as_ref()).required(true))
}

fn load_layered<S>(file: S) -> Result<Settings, ConfigError>
where
    S: config::Source + Send + Sync + 'static,
{
    let builder = config::Config::builder()
        .add_source(file)
        .add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    // Attempt to deserialize the entire configuration into our `Settings` struct
    let settings = builder.try_deserialize::<Settings>()?;
    settings.validate()?;

    tracing::debug!(?settings, "Loaded analysis configuration");
    Ok(settings)
}
