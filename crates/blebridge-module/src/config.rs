//! Interpreter configuration.

use blebridge_protocol::{SendAck, COMMAND_BUFFER_CAPACITY};
use serde::{Deserialize, Serialize};

/// Configuration for the command interpreter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InterpreterConfig {
    /// Text returned by `VERSION` and `GET VERSION`.
    pub version: String,
    /// Device name applied to the peripheral at startup.
    pub initial_name: String,
    /// Acknowledgement mode for `SEND`.
    pub send_ack: SendAck,
    /// Command buffer size in bytes.
    pub buffer_capacity: usize,
}

impl Default for InterpreterConfig {
    fn default() -> Self {
        InterpreterConfig {
            version: format!("blebridge v{}", env!("CARGO_PKG_VERSION")),
            initial_name: "Tympan".to_string(),
            send_ack: SendAck::Explicit,
            buffer_capacity: COMMAND_BUFFER_CAPACITY,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_fill_missing_fields() {
        let config: InterpreterConfig = serde_yaml::from_str("send_ack: implicit\n").unwrap();
        assert_eq!(config.send_ack, SendAck::Implicit);
        assert_eq!(config.buffer_capacity, 512);
        assert_eq!(config.initial_name, "Tympan");
        assert!(config.version.starts_with("blebridge v"));
    }
}
