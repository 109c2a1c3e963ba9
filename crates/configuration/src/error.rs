use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    /// The file, an environment override, or a value's type was unreadable.
    #[error("Failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("Configuration validation error: {0}")]
    Validation(String),
}
