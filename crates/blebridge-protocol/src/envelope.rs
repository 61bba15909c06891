//! Envelope framing and fragmentation for remote-app notifications.
//!
//! The BLE characteristic carrying notifications has a small MTU and no
//! multi-packet reassembly, and everything crosses the serial link inside
//! `SEND` lines. An envelope therefore has to survive both: its header never
//! contains `\r` or NUL, and its payload is cut into numbered fragments.
//!
//! ```text
//! +----+----+----+----+------+--------+--------+
//! | AB | AD | C0 | DE | type | len_hi | len_lo |   header, one SEND
//! +----+----+----+----+------+--------+--------+
//! +------+------------------+
//! | F0|i | payload[18*i..]  |                      fragment i, one SEND each
//! +------+------------------+
//! ```
//!
//! The length field is `(len << 1) | 0x8001`, big-endian.

use log::warn;
use serde::{Deserialize, Serialize};

use crate::constants::*;
use crate::error::{ProtocolError, ProtocolResult};

/// What to do with payloads needing more fragments than the 4-bit index can number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FragmentPolicy {
    /// Refuse to frame the payload.
    #[default]
    Reject,
    /// Let the index wrap from 15 back to 0; the receiver relies on ordering.
    Wrap,
}

/// Pack a payload length into the 16-bit length field.
pub fn pack_length(len: usize) -> u16 {
    ((len as u16) << 1) | LENGTH_FIELD_FLAGS
}

/// Recover the payload length from a packed length field.
pub fn unpack_length(field: u16) -> usize {
    ((field & 0x7FFF) >> 1) as usize
}

fn is_forbidden_header_byte(byte: u8) -> bool {
    byte == TERMINATOR || byte == 0x00
}

/// Decoded envelope header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EnvelopeHeader {
    /// Message type tag.
    pub msg_type: u8,
    /// Payload length (after any padding).
    pub payload_len: usize,
}

impl EnvelopeHeader {
    /// Encode the 7-byte header.
    pub fn encode(&self) -> [u8; ENVELOPE_HEADER_LEN] {
        let [hi, lo] = pack_length(self.payload_len).to_be_bytes();
        let p = ENVELOPE_PREAMBLE;
        [p[0], p[1], p[2], p[3], self.msg_type, hi, lo]
    }

    /// Decode a header. The input must be exactly seven bytes and start with the preamble.
    pub fn parse(data: &[u8]) -> ProtocolResult<EnvelopeHeader> {
        if data.len() != ENVELOPE_HEADER_LEN {
            return Err(ProtocolError::InvalidHeader(format!(
                "expected {} bytes, got {}",
                ENVELOPE_HEADER_LEN,
                data.len()
            )));
        }
        if data[..4] != ENVELOPE_PREAMBLE {
            return Err(ProtocolError::InvalidHeader(format!(
                "bad preamble {:02X?}",
                &data[..4]
            )));
        }
        let field = u16::from_be_bytes([data[5], data[6]]);
        if field & LENGTH_FIELD_FLAGS != LENGTH_FIELD_FLAGS {
            return Err(ProtocolError::InvalidHeader(format!(
                "length field 0x{:04X} lacks flag bits",
                field
            )));
        }
        Ok(EnvelopeHeader {
            msg_type: data[4],
            payload_len: unpack_length(field),
        })
    }
}

/// One numbered slice of an envelope payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fragment {
    /// Position in the sequence (not masked).
    pub index: usize,
    /// Payload bytes carried by this fragment.
    pub data: Vec<u8>,
}

impl Fragment {
    /// Marker byte prefixed to the data.
    pub fn marker(&self) -> u8 {
        fragment_marker(self.index)
    }

    /// Marker followed by data, as handed to `SEND`.
    pub fn encode(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(1 + self.data.len());
        buf.push(self.marker());
        buf.extend_from_slice(&self.data);
        buf
    }
}

/// A text payload ready to be framed for the remote app.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope {
    msg_type: u8,
    payload: Vec<u8>,
    padded: bool,
}

impl Envelope {
    /// Wrap a text notification.
    pub fn text(payload: &[u8]) -> ProtocolResult<Envelope> {
        Envelope::new(MSG_TYPE_TEXT, payload)
    }

    /// Wrap a payload with an explicit message type.
    ///
    /// If either length byte would be `\r` or NUL, one space is appended and the
    /// length is recomputed once.
    pub fn new(msg_type: u8, payload: &[u8]) -> ProtocolResult<Envelope> {
        if payload.len() >= MAX_ENVELOPE_PAYLOAD {
            return Err(ProtocolError::MessageTooLong {
                max: MAX_ENVELOPE_PAYLOAD - 1,
                actual: payload.len(),
            });
        }
        if let Some(offset) = payload.iter().position(|&b| b == TERMINATOR) {
            return Err(ProtocolError::TerminatorInPayload { offset });
        }

        let mut envelope = Envelope {
            msg_type,
            payload: payload.to_vec(),
            padded: false,
        };

        if envelope.has_forbidden_length_byte() {
            warn!(
                "envelope length {} packs to a forbidden byte, padding with a space",
                envelope.payload.len()
            );
            envelope.payload.push(PAD_BYTE);
            envelope.padded = true;

            if envelope.has_forbidden_length_byte() {
                return Err(ProtocolError::InvalidHeader(format!(
                    "length {} still packs to a forbidden byte after padding",
                    envelope.payload.len()
                )));
            }
        }

        Ok(envelope)
    }

    fn has_forbidden_length_byte(&self) -> bool {
        pack_length(self.payload.len())
            .to_be_bytes()
            .iter()
            .any(|&b| is_forbidden_header_byte(b))
    }

    /// Message type tag.
    pub fn msg_type(&self) -> u8 {
        self.msg_type
    }

    /// Payload as transmitted (padding included).
    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    /// Transmitted payload length.
    pub fn len(&self) -> usize {
        self.payload.len()
    }

    /// True for an empty payload.
    pub fn is_empty(&self) -> bool {
        self.payload.is_empty()
    }

    /// Whether a pad byte was appended.
    pub fn is_padded(&self) -> bool {
        self.padded
    }

    /// Decoded form of the header.
    pub fn header_info(&self) -> EnvelopeHeader {
        EnvelopeHeader {
            msg_type: self.msg_type,
            payload_len: self.payload.len(),
        }
    }

    /// The 7-byte header sent ahead of the fragments.
    pub fn header(&self) -> [u8; ENVELOPE_HEADER_LEN] {
        self.header_info().encode()
    }

    /// Number of fragments the payload splits into.
    pub fn fragment_count(&self, fragment_len: usize) -> usize {
        if fragment_len == 0 {
            return 0;
        }
        self.payload.len().div_ceil(fragment_len)
    }

    /// Split the payload into fragments of at most `fragment_len` bytes.
    pub fn fragments(
        &self,
        fragment_len: usize,
        policy: FragmentPolicy,
    ) -> ProtocolResult<Vec<Fragment>> {
        if fragment_len == 0 {
            return Err(ProtocolError::ZeroFragmentLength);
        }

        let needed = self.fragment_count(fragment_len);
        if needed > MAX_FRAGMENTS && policy == FragmentPolicy::Reject {
            return Err(ProtocolError::TooManyFragments {
                needed,
                max: MAX_FRAGMENTS,
            });
        }

        Ok(self
            .payload
            .chunks(fragment_len)
            .enumerate()
            .map(|(index, chunk)| Fragment {
                index,
                data: chunk.to_vec(),
            })
            .collect())
    }
}
