use miette::{Diagnostic, Result};
use thiserror::Error;

/// Main error type for the application
#[derive(Debug, Error, Diagnostic)]
pub enum Error {
    #[error("Environment error: {0}")]
    #[diagnostic(code(calendar_mirror::environment))]
    Environment(String),

    #[error("Configuration error: {0}")]
    #[diagnostic(code(calendar_mirror::config))]
    Config(String),

    #[error("Google Calendar API error: {0}")]
    #[diagnostic(code(calendar_mirror::remote_fetch))]
    RemoteFetch(String),

    #[error("Store connection error: {0}")]
    #[diagnostic(code(calendar_mirror::store_connection))]
    StoreConnection(String),

    #[error("Run lock {0} is held by another run")]
    #[diagnostic(
        code(calendar_mirror::run_in_progress),
        help("wait for the other run to finish or for its lock to expire")
    )]
    RunInProgress(String),

    #[error("Store write error: {0}")]
    #[diagnostic(code(calendar_mirror::store_write))]
    StoreWrite(String),

    #[error(transparent)]
    #[diagnostic(code(calendar_mirror::io))]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    #[diagnostic(code(calendar_mirror::serialization))]
    Serialization(String),
}

impl From<toml::de::Error> for Error {
    fn from(err: toml::de::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}

/// Type alias for Result with our Error type
pub type SyncResult<T> = Result<T, Error>;

/// Helper to create environment errors
pub fn env_error(var: &str) -> Error {
    Error::Environment(format!("Missing environment variable: {}", var))
}

/// Helper to create configuration errors
pub fn config_error(message: &str) -> Error {
    Error::Config(message.to_string())
}

/// Helper to create calendar listing errors
pub fn remote_fetch_error(message: &str) -> Error {
    Error::RemoteFetch(message.to_string())
}

/// Helper to create store connection errors
pub fn store_connection_error(message: &str) -> Error {
    Error::StoreConnection(message.to_string())
}

/// Helper to create store write errors
pub fn store_write_error(message: &str) -> Error {
    Error::StoreWrite(message.to_string())
}
