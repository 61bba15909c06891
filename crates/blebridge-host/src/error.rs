//! Error types for the host side.

use blebridge_protocol::ProtocolError;
use thiserror::Error;

/// Errors raised by the host client and its links.
#[derive(Debug, Error)]
pub enum HostError {
    /// The payload cannot be framed or encoded.
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// Reading or writing the serial link failed.
    #[error("link I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The other end of the link went away.
    #[error("link disconnected")]
    Disconnected,

    /// No complete reply arrived in time.
    #[error("no reply within {timeout_ms} ms ({} partial bytes)", partial.len())]
    Timeout {
        /// Timeout that expired.
        timeout_ms: u64,
        /// Bytes received without a terminator.
        partial: Vec<u8>,
    },

    /// The module answered `FAIL`.
    #[error("module refused: {0}")]
    Refused(String),
}

/// Result type alias for host operations.
pub type HostResult<T> = Result<T, HostError>;
