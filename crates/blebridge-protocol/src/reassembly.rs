//! Reassembly of envelopes from BLE notifications, as the remote app does it.

use crate::constants::*;
use crate::envelope::EnvelopeHeader;
use crate::error::{ProtocolError, ProtocolResult};

/// Result of feeding one notification to the [`Reassembler`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reassembled {
    /// An envelope completed.
    Message {
        /// Message type tag from the header.
        msg_type: u8,
        /// Payload, padding included.
        payload: Vec<u8>,
    },
    /// Header or fragment accepted; more fragments are needed.
    Pending,
    /// Notification was not part of an envelope.
    Raw(Vec<u8>),
}

#[derive(Debug)]
struct OpenEnvelope {
    header: EnvelopeHeader,
    payload: Vec<u8>,
    next_index: usize,
}

/// Stateful envelope reassembler.
///
/// Fragment indices are checked modulo 16, so envelopes sent with
/// [`FragmentPolicy::Wrap`](crate::FragmentPolicy::Wrap) reassemble too.
#[derive(Debug, Default)]
pub struct Reassembler {
    open: Option<OpenEnvelope>,
}

impl Reassembler {
    /// Create an idle reassembler.
    pub fn new() -> Self {
        Reassembler { open: None }
    }

    /// Whether an envelope is waiting for more fragments.
    pub fn is_pending(&self) -> bool {
        self.open.is_some()
    }

    /// Feed one notification.
    ///
    /// A new header always restarts reassembly, discarding any partial envelope.
    pub fn push(&mut self, notification: &[u8]) -> ProtocolResult<Reassembled> {
        if notification.len() == ENVELOPE_HEADER_LEN && notification[..4] == ENVELOPE_PREAMBLE {
            let header = EnvelopeHeader::parse(notification)?;
            if header.payload_len == 0 {
                self.open = None;
                return Ok(Reassembled::Message {
                    msg_type: header.msg_type,
                    payload: Vec::new(),
                });
            }
            self.open = Some(OpenEnvelope {
                header,
                payload: Vec::with_capacity(header.payload_len),
                next_index: 0,
            });
            return Ok(Reassembled::Pending);
        }

        let Some(open) = self.open.as_mut() else {
            return Ok(Reassembled::Raw(notification.to_vec()));
        };

        let Some((&marker, data)) = notification.split_first() else {
            return Ok(Reassembled::Raw(Vec::new()));
        };
        if !is_fragment_marker(marker) {
            return Ok(Reassembled::Raw(notification.to_vec()));
        }

        let expected = fragment_marker(open.next_index) & FRAGMENT_INDEX_MASK;
        let actual = marker & FRAGMENT_INDEX_MASK;
        if expected != actual {
            self.open = None;
            return Err(ProtocolError::FragmentOutOfOrder { expected, actual });
        }

        open.payload.extend_from_slice(data);
        open.next_index += 1;

        if open.payload.len() >= open.header.payload_len {
            if let Some(OpenEnvelope {
                header,
                mut payload,
                ..
            }) = self.open.take()
            {
                payload.truncate(header.payload_len);
                return Ok(Reassembled::Message {
                    msg_type: header.msg_type,
                    payload,
                });
            }
        }

        Ok(Reassembled::Pending)
    }

    /// Drop any partially received envelope.
    pub fn reset(&mut self) {
        self.open = None;
    }
}
