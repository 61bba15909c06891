//! Error types for the bridge protocol.

use thiserror::Error;

/// Errors that can occur when building or decoding protocol data.
///
/// Wire-level refusals from the module are not errors here; they arrive as
/// [`Reply::Fail`](crate::Reply::Fail).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    /// The command buffer has no free slot.
    #[error("command buffer full: capacity {capacity} bytes")]
    BufferFull {
        /// Buffer capacity (one slot is never used).
        capacity: usize,
    },

    /// Payload cannot be represented in the envelope length field.
    #[error("message too long: maximum {max} bytes, got {actual}")]
    MessageTooLong {
        /// Maximum allowed payload length.
        max: usize,
        /// Actual payload length.
        actual: usize,
    },

    /// Payload needs more fragments than the marker can number.
    #[error("message needs {needed} fragments, at most {max} can be numbered")]
    TooManyFragments {
        /// Fragments needed for the payload.
        needed: usize,
        /// Fragments representable by the 4-bit index.
        max: usize,
    },

    /// Payload contains the end-of-command byte and would cut its `SEND` line.
    #[error("payload contains the terminator byte at offset {offset}")]
    TerminatorInPayload {
        /// Offset of the first terminator byte.
        offset: usize,
    },

    /// Fragment payload length of zero.
    #[error("fragment payload length must be at least 1")]
    ZeroFragmentLength,

    /// Envelope header failed to decode.
    #[error("invalid envelope header: {0}")]
    InvalidHeader(String),

    /// A fragment arrived with an unexpected index.
    #[error("fragment out of order: expected index {expected}, got {actual}")]
    FragmentOutOfOrder {
        /// Index the reassembler was waiting for.
        expected: u8,
        /// Index carried by the marker.
        actual: u8,
    },

    /// Token is not a known module parameter.
    #[error("unknown parameter: {0}")]
    UnknownParameter(String),

    /// A reply line did not start with `OK` or `FAIL`.
    #[error("invalid reply: {0}")]
    InvalidReply(String),

    /// A GUI sub-protocol message failed to parse.
    #[error("invalid GUI message: {0}")]
    InvalidGui(String),

    /// GUI layout could not be serialized.
    #[error("layout serialization failed: {0}")]
    Layout(String),
}

/// Result type alias for protocol operations.
pub type ProtocolResult<T> = Result<T, ProtocolError>;
