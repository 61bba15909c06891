//! Host-side command client.
//!
//! [`BleHost`] turns high-level requests into command lines, writes them to
//! the link, and waits for the matching reply. Text for the remote app is
//! wrapped in an envelope and sent as a header `SEND` followed by one `SEND`
//! per fragment.

use std::thread;
use std::time::{Duration, Instant};

use blebridge_protocol::{
    Command, Envelope, GuiLayout, GuiMessage, Parameter, ProtocolError, Reply,
    ReplyCodec, SendAck, ENVELOPE_HEADER_LEN, TERMINATOR,
};
use tracing::{debug, trace, warn};

use crate::config::HostConfig;
use crate::error::{HostError, HostResult};
use crate::telemetry;
use crate::transport::{ByteSink, ByteSource};

// ============================================================================
// Outcomes
// ============================================================================

/// Result of waiting for one reply line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplyOutcome {
    /// A terminated line arrived and parsed.
    Complete(Reply),
    /// The timeout expired first; `partial` holds any unterminated bytes.
    TimedOut {
        /// Bytes received so far.
        partial: Vec<u8>,
    },
}

impl ReplyOutcome {
    /// The reply, if one completed.
    pub fn reply(&self) -> Option<&Reply> {
        match self {
            ReplyOutcome::Complete(reply) => Some(reply),
            ReplyOutcome::TimedOut { .. } => None,
        }
    }
}

/// Result of one `SEND`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SendOutcome {
    /// The module accepted this many bytes.
    ///
    /// In implicit-ack mode this is the local payload length, reported when
    /// no `FAIL` arrived within the configured window.
    Acked(usize),
    /// The module answered `FAIL` (or an `OK` without a byte count).
    Rejected(Reply),
    /// No reply arrived in time.
    TimedOut {
        /// Bytes received so far.
        partial: Vec<u8>,
    },
}

impl SendOutcome {
    /// Acknowledged byte count, if any.
    pub fn acked(&self) -> Option<usize> {
        match self {
            SendOutcome::Acked(n) => Some(*n),
            _ => None,
        }
    }
}

/// Summary of one `send_message` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageReport {
    /// Payload length after padding.
    pub padded_len: usize,
    /// Payload bytes the module acknowledged (markers excluded).
    pub bytes_acked: usize,
    /// Number of fragments sent.
    pub fragments: usize,
    /// Whether a pad byte was appended.
    pub padded: bool,
    /// Whether the header `SEND` was acknowledged with its full length.
    pub header_acked: bool,
}

impl MessageReport {
    /// Every payload byte was acknowledged.
    pub fn is_complete(&self) -> bool {
        self.bytes_acked == self.padded_len
    }
}

// ============================================================================
// Client
// ============================================================================

/// Command client driving a BLE module over a byte link.
pub struct BleHost<L> {
    link: L,
    config: HostConfig,
    codec: ReplyCodec,
}

impl<L: ByteSink + ByteSource> BleHost<L> {
    /// Create a client on `link`.
    pub fn new(link: L, config: HostConfig) -> Self {
        BleHost {
            link,
            config,
            codec: ReplyCodec::new(),
        }
    }

    /// Get the configuration.
    pub fn config(&self) -> &HostConfig {
        &self.config
    }

    /// Get the link.
    pub fn link(&self) -> &L {
        &self.link
    }

    /// Get the link mutably.
    pub fn link_mut(&mut self) -> &mut L {
        &mut self.link
    }

    /// Unwrap the link.
    pub fn into_inner(self) -> L {
        self.link
    }

    /// Write a command line.
    pub fn send_command(&mut self, command: &Command) -> HostResult<()> {
        let line = command.encode();
        trace!(
            "BleHost: -> '{}'",
            String::from_utf8_lossy(&line).escape_debug()
        );
        self.link.write_bytes(&line)
    }

    /// Wait up to `timeout` for the next reply line.
    pub fn recv_reply(&mut self, timeout: Duration) -> HostResult<ReplyOutcome> {
        if let Some(reply) = self.poll_reply(timeout)? {
            return Ok(ReplyOutcome::Complete(reply));
        }

        let partial = self.codec.take_partial();
        warn!(
            "BleHost: no reply within {} ms ({} partial bytes)",
            timeout.as_millis(),
            partial.len()
        );
        telemetry::record_timeout();
        Ok(ReplyOutcome::TimedOut { partial })
    }

    /// Wait up to `timeout` for a complete line, leaving partial bytes buffered.
    fn poll_reply(&mut self, timeout: Duration) -> HostResult<Option<Reply>> {
        let deadline = Instant::now() + timeout;
        loop {
            if let Some(line) = self.codec.decode_line() {
                trace!("BleHost: <- '{}'", String::from_utf8_lossy(&line).escape_debug());
                return Ok(Some(Reply::parse(&line)?));
            }

            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return Ok(None);
            }

            match self.link.read_bytes(remaining)? {
                Some(data) => self.codec.push(&data),
                // Links that never block report "nothing" at once
                None => thread::sleep(remaining.min(Duration::from_millis(1))),
            }
        }
    }

    /// Drop reply lines that already arrived but belong to no pending command.
    ///
    /// These are late answers to commands that timed out, or `FAIL`s for
    /// implicit-ack `SEND`s that came after their window. Returns how many
    /// lines were dropped.
    pub fn discard_stale(&mut self) -> HostResult<usize> {
        while let Some(data) = self.link.read_bytes(Duration::ZERO)? {
            self.codec.push(&data);
        }

        let mut dropped = 0;
        while let Some(line) = self.codec.decode_line() {
            warn!(
                "BleHost: discarding stale reply '{}'",
                String::from_utf8_lossy(&line).escape_debug()
            );
            dropped += 1;
        }
        Ok(dropped)
    }

    /// Send a command and wait for its reply with the configured timeout.
    ///
    /// Stale replies are discarded first so the answer matches the command.
    pub fn request(&mut self, command: &Command) -> HostResult<ReplyOutcome> {
        self.discard_stale()?;
        self.send_command(command)?;
        self.recv_reply(self.config.reply_timeout())
    }

    fn expect_reply(&mut self, command: &Command) -> HostResult<Reply> {
        match self.request(command)? {
            ReplyOutcome::Complete(reply) => Ok(reply),
            ReplyOutcome::TimedOut { partial } => Err(HostError::Timeout {
                timeout_ms: self.config.reply_timeout_ms,
                partial,
            }),
        }
    }

    /// Send raw bytes to the BLE characteristic.
    pub fn send(&mut self, payload: &[u8]) -> HostResult<SendOutcome> {
        if let Some(offset) = payload.iter().position(|&b| b == TERMINATOR) {
            return Err(ProtocolError::TerminatorInPayload { offset }.into());
        }

        let command = Command::Send {
            payload: payload.to_vec(),
        };

        if self.config.send_ack == SendAck::Implicit {
            self.discard_stale()?;
            self.send_command(&command)?;
            // Success is silent; only a FAIL can show up
            return Ok(match self.poll_reply(self.config.implicit_fail_window())? {
                None => SendOutcome::Acked(payload.len()),
                Some(reply) => match reply.ack_count() {
                    Some(n) => SendOutcome::Acked(n),
                    None => SendOutcome::Rejected(reply),
                },
            });
        }

        Ok(match self.request(&command)? {
            ReplyOutcome::Complete(reply) => match reply.ack_count() {
                Some(n) => SendOutcome::Acked(n),
                None => SendOutcome::Rejected(reply),
            },
            ReplyOutcome::TimedOut { partial } => SendOutcome::TimedOut { partial },
        })
    }

    /// Query a parameter, returning the raw reply.
    pub fn get(&mut self, param: Parameter) -> HostResult<Reply> {
        self.expect_reply(&Command::Get { param })
    }

    /// Read the advertised device name.
    pub fn get_name(&mut self) -> HostResult<String> {
        let reply = self.get(Parameter::Name)?;
        ok_text(reply)
    }

    /// Change the advertised device name (the module keeps at most 16 bytes).
    pub fn set_name(&mut self, name: &str) -> HostResult<()> {
        let reply = self.expect_reply(&Command::set_name(name))?;
        ok_text(reply).map(|_| ())
    }

    /// Read the module firmware version.
    pub fn version(&mut self) -> HostResult<String> {
        let reply = self.expect_reply(&Command::Version)?;
        ok_text(reply)
    }

    /// Whether a central is connected to the module.
    pub fn is_connected(&mut self) -> HostResult<bool> {
        let text = ok_text(self.get(Parameter::Connected)?)?;
        Ok(text == "TRUE")
    }

    /// Frame `text` in an envelope and send it, header first.
    ///
    /// A header that is not acknowledged in full is logged and sending
    /// continues; the report tells the caller how much got through.
    pub fn send_message(&mut self, text: &[u8]) -> HostResult<MessageReport> {
        let envelope = Envelope::text(text)?;
        let fragments =
            envelope.fragments(self.config.fragment_payload_len, self.config.fragment_policy)?;

        debug!(
            "BleHost: sending {} byte message in {} fragments",
            envelope.len(),
            fragments.len()
        );

        let header_outcome = self.send(&envelope.header())?;
        let header_acked = header_outcome.acked() == Some(ENVELOPE_HEADER_LEN);
        if !header_acked {
            warn!("BleHost: envelope header not acknowledged: {:?}", header_outcome);
        }

        let mut bytes_acked = 0usize;
        for fragment in &fragments {
            thread::sleep(self.config.fragment_delay());
            match self.send(&fragment.encode())? {
                SendOutcome::Acked(n) => {
                    bytes_acked = bytes_acked.saturating_add(n.saturating_sub(1));
                }
                other => warn!(
                    "BleHost: fragment {} not acknowledged: {:?}",
                    fragment.index, other
                ),
            }
        }

        telemetry::record_message(fragments.len());

        let report = MessageReport {
            padded_len: envelope.len(),
            bytes_acked,
            fragments: fragments.len(),
            padded: envelope.is_padded(),
            header_acked,
        };
        if !report.is_complete() {
            warn!(
                "BleHost: only {} of {} bytes acknowledged",
                report.bytes_acked, report.padded_len
            );
        }
        Ok(report)
    }

    /// Replace the text of a button in the remote app.
    pub fn set_button_text(&mut self, id: &str, text: &str) -> HostResult<MessageReport> {
        let message = GuiMessage::ButtonText {
            id: id.to_string(),
            text: text.to_string(),
        };
        self.send_message(message.encode().as_bytes())
    }

    /// Highlight or clear a button in the remote app.
    pub fn set_button_state(&mut self, id: &str, on: bool) -> HostResult<MessageReport> {
        let message = GuiMessage::ButtonState {
            id: id.to_string(),
            on,
        };
        self.send_message(message.encode().as_bytes())
    }

    /// Send a whole layout to the remote app.
    pub fn send_layout(&mut self, layout: &GuiLayout) -> HostResult<MessageReport> {
        let message = layout.to_message()?;
        self.send_message(message.encode().as_bytes())
    }
}

fn ok_text(reply: Reply) -> HostResult<String> {
    match reply {
        Reply::Ok(_) => Ok(reply.text()),
        Reply::Fail(reason) => Err(HostError::Refused(reason.as_str().to_string())),
        Reply::FailOther(text) => Err(HostError::Refused(text)),
    }
}
