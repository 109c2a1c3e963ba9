use crate::error::ConfigError;
use std::path::Path;

// Declare the modules that make up this crate.
#[cfg(feature = "clap")]
pub mod cli;
pub mod error;
pub mod settings;

// Re-export the core types to provide a clean public API.
#[cfg(feature = "clap")]
pub use cli::CliArgs;
pub use settings::{Analysis, Logging, Output, Provider, Settings};

/// Prefix for environment overrides, e.g. `RETURNS__ANALYSIS__TICKER`.
pub const ENV_PREFIX: &str = "RETURNS";

/// Loads the application configuration.
///
/// Sources are layered, later ones winning: built-in defaults, the TOML file,
/// then `RETURNS__SECTION__KEY` environment variables. With `path` set the
/// file must exist; otherwise `config.toml` in the working directory is
/// read if present.
pub fn load_config(path: Option<&Path>) -> Result<Settings, ConfigError> {
    let file = match path {
        Some(path) => config::File::from(path).required(true),
        None => config::File::with_name("config.toml").required(false),
    };

    let builder = config::Config::builder()
        .add_source(file)
        .add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    // Attempt to deserialize the entire configuration into our `Settings` struct
    let settings = builder.try_deserialize::<Settings>()?;
    settings.validate()?;
    Ok(settings)
}
