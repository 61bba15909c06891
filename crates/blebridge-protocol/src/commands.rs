//! Commands the host sends to the BLE module.
//!
//! The grammar is line based and case sensitive:
//!
//! ```text
//! SEND <raw-bytes>\r
//! SET <PARAM>=<value>\r
//! GET <PARAM>\r
//! VERSION\r
//! ```

use serde::{Deserialize, Serialize};

use crate::constants::*;
use crate::error::{ProtocolError, ProtocolResult};

/// Module parameters addressable by `SET` and `GET`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Parameter {
    /// Advertised BLE device name (`NAME`)
    Name,
    /// Module firmware version, read-only (`VERSION`)
    Version,
    /// Status LED behaviour (`LEDMODE`)
    LedMode,
    /// Serial link baud rate (`BAUDRATE`)
    BaudRate,
    /// Radio on/off state (`RFSTATE`)
    RfState,
    /// Whether the module is advertising (`ADVERTISING`)
    Advertising,
    /// Whether a peer is connected, read-only (`CONNECTED`)
    Connected,
}

impl Parameter {
    /// Every parameter, in the order the interpreter tests them.
    pub const ALL: [Parameter; 7] = [
        Parameter::Name,
        Parameter::Version,
        Parameter::LedMode,
        Parameter::BaudRate,
        Parameter::RfState,
        Parameter::Advertising,
        Parameter::Connected,
    ];

    /// Get the parameter token used on the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            Parameter::Name => "NAME",
            Parameter::Version => "VERSION",
            Parameter::LedMode => "LEDMODE",
            Parameter::BaudRate => "BAUDRATE",
            Parameter::RfState => "RFSTATE",
            Parameter::Advertising => "ADVERTISING",
            Parameter::Connected => "CONNECTED",
        }
    }

    /// Whether `SET` accepts this parameter at all.
    pub fn is_settable(&self) -> bool {
        !matches!(self, Parameter::Version | Parameter::Connected)
    }
}

impl std::str::FromStr for Parameter {
    type Err = ProtocolError;

    /// Parse a parameter from its wire token (case sensitive).
    fn from_str(s: &str) -> ProtocolResult<Parameter> {
        Parameter::ALL
            .into_iter()
            .find(|p| p.as_str() == s)
            .ok_or_else(|| ProtocolError::UnknownParameter(s.to_string()))
    }
}

impl std::fmt::Display for Parameter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Leading token of a command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Verb {
    /// `SEND `
    Send,
    /// `SET `
    Set,
    /// `GET `
    Get,
    /// `VERSION`
    Version,
}

impl Verb {
    /// Verbs in dispatch priority order.
    pub const ALL: [Verb; 4] = [Verb::Send, Verb::Set, Verb::Get, Verb::Version];

    /// The literal that opens a line carrying this verb (including its space, if any).
    pub fn literal(&self) -> &'static [u8] {
        match self {
            Verb::Send => VERB_SEND,
            Verb::Set => VERB_SET,
            Verb::Get => VERB_GET,
            Verb::Version => VERB_VERSION,
        }
    }

    /// Short lowercase name, used for logging and metric labels.
    pub fn as_str(&self) -> &'static str {
        match self {
            Verb::Send => "send",
            Verb::Set => "set",
            Verb::Get => "get",
            Verb::Version => "version",
        }
    }
}

/// How the module acknowledges a successful `SEND`.
///
/// Both ends of the link must agree on this.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SendAck {
    /// Reply `OK <n>` with the number of bytes handed to the characteristic.
    #[default]
    Explicit,
    /// No reply on success; only failures are reported.
    Implicit,
}

/// A command the host can send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Relay raw bytes to the connected BLE peer.
    Send {
        /// Bytes forwarded unmodified. Must not contain the terminator.
        payload: Vec<u8>,
    },

    /// Write a parameter.
    Set {
        /// Parameter to write.
        param: Parameter,
        /// New value.
        value: Vec<u8>,
    },

    /// Read a parameter.
    Get {
        /// Parameter to read.
        param: Parameter,
    },

    /// Ask for the firmware version.
    Version,

    /// Send an arbitrary line verbatim, such as a malformed or vendor command.
    Raw {
        /// Line contents without the terminator.
        line: Vec<u8>,
    },
}

impl Command {
    /// Shorthand for `SET NAME=<name>`.
    pub fn set_name(name: impl Into<Vec<u8>>) -> Self {
        Command::Set {
            param: Parameter::Name,
            value: name.into(),
        }
    }

    /// Encode the command as a line to send to the module.
    /// Returns the bytes to send (including the `\r` terminator).
    pub fn encode(&self) -> Vec<u8> {
        let mut line = self.to_line();
        line.push(TERMINATOR);
        line
    }

    /// Get the command line without the terminator.
    pub fn to_line(&self) -> Vec<u8> {
        match self {
            Command::Send { payload } => [VERB_SEND, payload.as_slice()].concat(),
            Command::Set { param, value } => {
                let mut line = Vec::with_capacity(VERB_SET.len() + 12 + value.len());
                line.extend_from_slice(VERB_SET);
                line.extend_from_slice(param.as_str().as_bytes());
                line.push(SET_SEPARATOR);
                line.extend_from_slice(value);
                line
            }
            Command::Get { param } => [VERB_GET, param.as_str().as_bytes()].concat(),
            Command::Version => VERB_VERSION.to_vec(),
            Command::Raw { line } => line.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_send() {
        let cmd = Command::Send {
            payload: vec![0xF0, b'h', b'i'],
        };
        assert_eq!(cmd.encode(), b"SEND \xF0hi\r");
    }

    #[test]
    fn test_encode_set_name() {
        let cmd = Command::set_name("HearAid1");
        assert_eq!(cmd.encode(), b"SET NAME=HearAid1\r");
    }

    #[test]
    fn test_encode_get() {
        let cmd = Command::Get {
            param: Parameter::Connected,
        };
        assert_eq!(cmd.encode(), b"GET CONNECTED\r");
    }

    #[test]
    fn test_encode_version() {
        assert_eq!(Command::Version.encode(), b"VERSION\r");
    }

    #[test]
    fn test_encode_raw() {
        let cmd = Command::Raw {
            line: b"AT+RESET".to_vec(),
        };
        assert_eq!(cmd.encode(), b"AT+RESET\r");
    }

    #[test]
    fn test_parameter_tokens() {
        for param in Parameter::ALL {
            assert_eq!(param.as_str().parse::<Parameter>(), Ok(param));
        }
        assert_eq!(
            "name".parse::<Parameter>(),
            Err(ProtocolError::UnknownParameter("name".to_string()))
        );
        assert!(!Parameter::Connected.is_settable());
        assert!(Parameter::LedMode.is_settable());
    }
}
