//! Replies from the BLE module.
//!
//! Every command gets exactly one reply (a successful `SEND` in implicit-ack
//! mode is the only exception):
//!
//! - `OK` or `OK <text>`
//! - `FAIL <reason>`

use crate::constants::*;
use crate::error::{ProtocolError, ProtocolResult};

/// Why the module refused a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailReason {
    /// Line did not start with a known verb.
    VerbNotKnown,
    /// `SET`/`GET` named a parameter the module does not have.
    ParameterNotKnown,
    /// Tokens were present but malformed (trailing garbage, missing `=`).
    FormatProblem,
    /// The command was understood but could not be carried out.
    OperationFailed,
    /// Parameter exists but this firmware does not support it yet.
    NotImplementedYet,
    /// `SEND` with no connected BLE peer.
    NoBleConnection,
    /// Bytes were lost because the command buffer filled up.
    BufferOverrun,
}

impl FailReason {
    /// Every reason, for parsing.
    pub const ALL: [FailReason; 7] = [
        FailReason::VerbNotKnown,
        FailReason::ParameterNotKnown,
        FailReason::FormatProblem,
        FailReason::OperationFailed,
        FailReason::NotImplementedYet,
        FailReason::NoBleConnection,
        FailReason::BufferOverrun,
    ];

    /// Human text sent after `FAIL `.
    pub fn as_str(&self) -> &'static str {
        match self {
            FailReason::VerbNotKnown => "VERB not known",
            FailReason::ParameterNotKnown => "PARAMETER not known",
            FailReason::FormatProblem => "FORMAT problem",
            FailReason::OperationFailed => "OPERATION failed",
            FailReason::NotImplementedYet => "NOT implemented yet",
            FailReason::NoBleConnection => "NO BLE connection",
            FailReason::BufferOverrun => "BUFFER overrun",
        }
    }

    /// Upper snake case identifier, used for logging and metric labels.
    pub fn kind(&self) -> &'static str {
        match self {
            FailReason::VerbNotKnown => "VERB_NOT_KNOWN",
            FailReason::ParameterNotKnown => "PARAMETER_NOT_KNOWN",
            FailReason::FormatProblem => "FORMAT_PROBLEM",
            FailReason::OperationFailed => "OPERATION_FAILED",
            FailReason::NotImplementedYet => "NOT_IMPLEMENTED_YET",
            FailReason::NoBleConnection => "NO_BLE_CONNECTION",
            FailReason::BufferOverrun => "BUFFER_OVERRUN",
        }
    }

    /// Parse the reason text that follows `FAIL `.
    pub fn from_text(text: &str) -> Option<FailReason> {
        FailReason::ALL.iter().copied().find(|r| r.as_str() == text)
    }
}

impl std::fmt::Display for FailReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parsed reply line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// Success, with optional text (empty when there is none).
    Ok(Vec<u8>),

    /// Refusal with a known reason.
    Fail(FailReason),

    /// Refusal whose reason text this crate does not recognise.
    FailOther(String),
}

impl Reply {
    /// Bare `OK`.
    pub fn ok() -> Self {
        Reply::Ok(Vec::new())
    }

    /// `OK <text>`.
    pub fn ok_with(text: impl Into<Vec<u8>>) -> Self {
        Reply::Ok(text.into())
    }

    /// Encode the reply as it goes on the wire, terminator included.
    pub fn encode(&self) -> Vec<u8> {
        let mut line = Vec::with_capacity(24);
        match self {
            Reply::Ok(text) => {
                line.extend_from_slice(REPLY_OK);
                if !text.is_empty() {
                    line.push(b' ');
                    line.extend_from_slice(text);
                }
            }
            Reply::Fail(reason) => {
                line.extend_from_slice(REPLY_FAIL);
                line.push(b' ');
                line.extend_from_slice(reason.as_str().as_bytes());
            }
            Reply::FailOther(text) => {
                line.extend_from_slice(REPLY_FAIL);
                line.push(b' ');
                line.extend_from_slice(text.as_bytes());
            }
        }
        line.push(TERMINATOR);
        line
    }

    /// Parse a reply line (without its terminator).
    ///
    /// Leading spaces after `OK` are dropped, so the module's `"OK "` form
    /// parses the same as `"OK"`.
    pub fn parse(line: &[u8]) -> ProtocolResult<Reply> {
        if let Some(rest) = line.strip_prefix(REPLY_OK) {
            let text = match rest.iter().position(|&b| b != b' ') {
                Some(start) => rest[start..].to_vec(),
                None => Vec::new(),
            };
            return Ok(Reply::Ok(text));
        }

        if let Some(rest) = line.strip_prefix(REPLY_FAIL) {
            let text = String::from_utf8_lossy(rest).trim().to_string();
            return Ok(match FailReason::from_text(&text) {
                Some(reason) => Reply::Fail(reason),
                None => Reply::FailOther(text),
            });
        }

        Err(ProtocolError::InvalidReply(
            String::from_utf8_lossy(line).to_string(),
        ))
    }

    /// Check if this is an OK reply.
    pub fn is_ok(&self) -> bool {
        matches!(self, Reply::Ok(_))
    }

    /// Get the reason if this is a recognised FAIL.
    pub fn fail_reason(&self) -> Option<FailReason> {
        match self {
            Reply::Fail(reason) => Some(*reason),
            _ => None,
        }
    }

    /// Raw text of an OK reply.
    pub fn payload(&self) -> Option<&[u8]> {
        match self {
            Reply::Ok(text) => Some(text),
            _ => None,
        }
    }

    /// Reply text rendered as a string (lossy for non-UTF-8 names).
    pub fn text(&self) -> String {
        match self {
            Reply::Ok(text) => String::from_utf8_lossy(text).to_string(),
            Reply::Fail(reason) => reason.as_str().to_string(),
            Reply::FailOther(text) => text.clone(),
        }
    }

    /// Byte count acknowledged by an explicit `SEND` reply (`OK <n>`).
    pub fn ack_count(&self) -> Option<usize> {
        match self {
            Reply::Ok(text) => std::str::from_utf8(text).ok()?.trim().parse().ok(),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_ok() {
        assert_eq!(Reply::ok().encode(), b"OK\r");
        assert_eq!(Reply::ok_with("v1.2").encode(), b"OK v1.2\r");
    }

    #[test]
    fn test_encode_fail() {
        let reply = Reply::Fail(FailReason::VerbNotKnown);
        assert_eq!(reply.encode(), b"FAIL VERB not known\r");
    }

    #[test]
    fn test_parse_ok_with_text() {
        let reply = Reply::parse(b"OK HearAid1").unwrap();
        assert!(reply.is_ok());
        assert_eq!(reply.payload(), Some(&b"HearAid1"[..]));
    }

    #[test]
    fn test_parse_ok_trailing_space() {
        assert_eq!(Reply::parse(b"OK ").unwrap(), Reply::ok());
        assert_eq!(Reply::parse(b"OK").unwrap(), Reply::ok());
    }

    #[test]
    fn test_parse_fail() {
        for reason in FailReason::ALL {
            let encoded = Reply::Fail(reason).encode();
            let line = &encoded[..encoded.len() - 1];
            assert_eq!(Reply::parse(line).unwrap().fail_reason(), Some(reason));
        }
        assert_eq!(
            Reply::parse(b"FAIL something odd").unwrap(),
            Reply::FailOther("something odd".to_string())
        );
    }

    #[test]
    fn test_parse_invalid() {
        assert!(matches!(
            Reply::parse(b"HELLO"),
            Err(ProtocolError::InvalidReply(_))
        ));
    }

    #[test]
    fn test_ack_count() {
        assert_eq!(Reply::ok_with("7").ack_count(), Some(7));
        assert_eq!(Reply::ok().ack_count(), None);
        assert_eq!(Reply::Fail(FailReason::NoBleConnection).ack_count(), None);
    }
}
