//! Error types for the runner.

use blebridge_host::HostError;
use blebridge_protocol::ProtocolError;
use thiserror::Error;

/// Errors that can occur while running the bridge.
#[derive(Debug, Error)]
pub enum RunnerError {
    /// File or socket failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The configuration file could not be parsed.
    #[error("config error: {0}")]
    Config(String),

    /// The host client failed.
    #[error(transparent)]
    Host(#[from] HostError),

    /// A payload could not be framed.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),
}

impl From<serde_yaml::Error> for RunnerError {
    fn from(e: serde_yaml::Error) -> Self {
        RunnerError::Config(e.to_string())
    }
}

/// Result type alias for runner operations.
pub type RunnerResult<T> = Result<T, RunnerError>;
