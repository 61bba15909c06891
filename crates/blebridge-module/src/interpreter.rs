//! AT-style command interpreter.
//!
//! Bytes from the host UART are fed in one at a time with [`Interpreter::on_byte`].
//! Anything but the terminator goes into the circular [`CommandBuffer`]; the
//! terminator triggers dispatch:
//!
//! 1. The buffered line is tested against `SEND `, `SET `, `GET `, `VERSION`,
//!    in that order. The first match wins.
//! 2. The handler runs and builds the reply.
//! 3. Everything left of the line is discarded (`read := write`), whether or
//!    not the handler looked at it.
//!
//! The interpreter never blocks and never fails: every problem becomes a
//! `FAIL <reason>` reply.

use blebridge_protocol::{
    CommandBuffer, FailReason, Parameter, Reply, SendAck, Verb, MAX_NAME_LEN, SET_SEPARATOR,
    TERMINATOR,
};
use tracing::{debug, trace, warn};

use crate::config::InterpreterConfig;
use crate::error::ModuleError;
use crate::peripheral::BlePeripheral;
use crate::telemetry;

/// Counters kept by the interpreter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InterpreterStats {
    /// Terminated lines processed.
    pub commands: u64,
    /// `FAIL` replies produced.
    pub failures: u64,
    /// Bytes accepted by the BLE characteristic.
    pub notified_bytes: u64,
    /// Bytes dropped because the buffer was full.
    pub overrun_bytes: u64,
}

/// Command interpreter bound to a BLE peripheral.
pub struct Interpreter<P: BlePeripheral> {
    config: InterpreterConfig,
    buffer: CommandBuffer,
    peripheral: P,
    /// Set when a byte was rejected since the last terminator.
    overrun: bool,
    stats: InterpreterStats,
}

impl<P: BlePeripheral> Interpreter<P> {
    /// Create an interpreter and apply the configured device name.
    pub fn new(config: InterpreterConfig, mut peripheral: P) -> Self {
        if !config.initial_name.is_empty() {
            let name = config.initial_name.as_bytes();
            let name = &name[..name.len().min(MAX_NAME_LEN)];
            if let Err(e) = peripheral.set_name(name) {
                warn!("Interpreter: failed to apply initial name: {}", e);
            }
        }

        Interpreter {
            buffer: CommandBuffer::with_capacity(config.buffer_capacity),
            config,
            peripheral,
            overrun: false,
            stats: InterpreterStats::default(),
        }
    }

    /// Get the configuration.
    pub fn config(&self) -> &InterpreterConfig {
        &self.config
    }

    /// Get the command buffer (for inspection).
    pub fn buffer(&self) -> &CommandBuffer {
        &self.buffer
    }

    /// Get the peripheral.
    pub fn peripheral(&self) -> &P {
        &self.peripheral
    }

    /// Get the peripheral mutably (to simulate connects and disconnects).
    pub fn peripheral_mut(&mut self) -> &mut P {
        &mut self.peripheral
    }

    /// Get the counters.
    pub fn stats(&self) -> InterpreterStats {
        self.stats
    }

    /// Feed one byte from the serial link.
    ///
    /// Returns the reply when `byte` completes a command.
    pub fn on_byte(&mut self, byte: u8) -> Option<Reply> {
        if byte == TERMINATOR {
            return self.process_message();
        }

        if self.buffer.try_push(byte).is_err() {
            if !self.overrun {
                warn!(
                    "Interpreter: command buffer full ({} bytes), dropping input until next terminator",
                    self.buffer.capacity()
                );
            }
            self.overrun = true;
            self.stats.overrun_bytes += 1;
            telemetry::record_overrun();
        }
        None
    }

    /// Feed a chunk of bytes, collecting the replies in order.
    pub fn on_bytes(&mut self, data: &[u8]) -> Vec<Reply> {
        data.iter().filter_map(|&b| self.on_byte(b)).collect()
    }

    /// Drop any unterminated input and a pending overrun.
    ///
    /// Used when the serial link changes hands, so a new client does not
    /// inherit half a command.
    pub fn reset_input(&mut self) {
        if !self.buffer.is_empty() || self.overrun {
            debug!(
                "Interpreter: discarding {} unterminated bytes",
                self.buffer.pending_len()
            );
        }
        self.buffer.discard_all();
        self.overrun = false;
    }

    /// Dispatch the buffered line and clear the buffer.
    ///
    /// Returns `None` only for a successful `SEND` in implicit-ack mode.
    pub fn process_message(&mut self) -> Option<Reply> {
        self.stats.commands += 1;

        trace!(
            "Interpreter: received '{}'",
            String::from_utf8_lossy(&self.buffer.copy_pending()).escape_debug()
        );

        let reply = if self.overrun {
            self.overrun = false;
            Some(Reply::Fail(FailReason::BufferOverrun))
        } else {
            self.dispatch()
        };

        self.buffer.discard_all();

        if let Some(Reply::Fail(reason)) = &reply {
            self.stats.failures += 1;
            telemetry::record_failure(reason.kind());
            debug!("Interpreter: replying FAIL {}", reason.kind());
        }
        reply
    }

    fn dispatch(&mut self) -> Option<Reply> {
        let Some(verb) = Verb::ALL
            .into_iter()
            .find(|v| self.buffer.peek_matches(v.literal()))
        else {
            telemetry::record_command("unknown");
            return Some(Reply::Fail(FailReason::VerbNotKnown));
        };

        telemetry::record_command(verb.as_str());
        self.buffer.consume(verb.literal().len());

        match verb {
            Verb::Send => self.handle_send(),
            Verb::Set => Some(self.handle_set()),
            Verb::Get => Some(self.handle_get()),
            Verb::Version => Some(Reply::ok_with(self.config.version.as_bytes())),
        }
    }

    // ========================================================================
    // Verb Handlers
    // ========================================================================

    fn handle_send(&mut self) -> Option<Reply> {
        let payload = self.buffer.drain();

        if !self.peripheral.is_connected() {
            return Some(Reply::Fail(FailReason::NoBleConnection));
        }

        match self.peripheral.notify(&payload) {
            Ok(written) => {
                self.stats.notified_bytes += written as u64;
                telemetry::record_notify(written);
                trace!("Interpreter: notified {} bytes", written);
                match self.config.send_ack {
                    SendAck::Explicit => Some(Reply::ok_with(written.to_string())),
                    SendAck::Implicit => None,
                }
            }
            Err(ModuleError::NotConnected) => Some(Reply::Fail(FailReason::NoBleConnection)),
            Err(e) => {
                warn!("Interpreter: SEND failed: {}", e);
                Some(Reply::Fail(FailReason::OperationFailed))
            }
        }
    }

    fn handle_set(&mut self) -> Reply {
        let Some(param) = self.match_parameter() else {
            return Reply::Fail(FailReason::ParameterNotKnown);
        };
        if !param.is_settable() {
            return Reply::Fail(FailReason::ParameterNotKnown);
        }

        self.buffer.consume(param.as_str().len());
        if self.buffer.peek_at(0) != Some(SET_SEPARATOR) {
            return Reply::Fail(FailReason::FormatProblem);
        }
        self.buffer.consume(1);

        match param {
            Parameter::Name => self.set_name(),
            _ => Reply::Fail(FailReason::NotImplementedYet),
        }
    }

    fn set_name(&mut self) -> Reply {
        let value = self.buffer.drain();
        if value.is_empty() {
            return Reply::Fail(FailReason::OperationFailed);
        }
        if value.contains(&0) {
            return Reply::Fail(FailReason::FormatProblem);
        }

        let name = &value[..value.len().min(MAX_NAME_LEN)];
        if name.len() < value.len() {
            debug!(
                "Interpreter: truncating name from {} to {} bytes",
                value.len(),
                name.len()
            );
        }

        match self.peripheral.set_name(name) {
            Ok(()) => {
                debug!("Interpreter: name set to '{}'", String::from_utf8_lossy(name));
                Reply::ok()
            }
            Err(e) => {
                warn!("Interpreter: SET NAME failed: {}", e);
                Reply::Fail(FailReason::OperationFailed)
            }
        }
    }

    fn handle_get(&mut self) -> Reply {
        let Some(param) = self.match_parameter() else {
            return Reply::Fail(FailReason::ParameterNotKnown);
        };

        // The name must be the whole rest of the line
        if self.buffer.pending_len() != param.as_str().len() {
            return Reply::Fail(FailReason::FormatProblem);
        }

        match param {
            Parameter::Name => Reply::ok_with(self.peripheral.name()),
            Parameter::Version => Reply::ok_with(self.config.version.as_bytes()),
            Parameter::Connected => bool_reply(self.peripheral.is_connected()),
            Parameter::Advertising => bool_reply(self.peripheral.is_advertising()),
            Parameter::LedMode | Parameter::BaudRate | Parameter::RfState => {
                Reply::Fail(FailReason::NotImplementedYet)
            }
        }
    }

    fn match_parameter(&self) -> Option<Parameter> {
        Parameter::ALL
            .into_iter()
            .find(|p| self.buffer.peek_matches(p.as_str().as_bytes()))
    }
}

fn bool_reply(value: bool) -> Reply {
    Reply::ok_with(if value { "TRUE" } else { "FALSE" })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::peripheral::RecordingPeripheral;

    fn interpreter() -> Interpreter<RecordingPeripheral> {
        let config = InterpreterConfig {
            version: "test-1.0".to_string(),
            ..InterpreterConfig::default()
        };
        Interpreter::new(config, RecordingPeripheral::new("Tympan"))
    }

    fn run(interp: &mut Interpreter<RecordingPeripheral>, line: &[u8]) -> Option<Reply> {
        let replies = interp.on_bytes(line);
        assert!(replies.len() <= 1, "one line produced {} replies", replies.len());
        assert!(interp.buffer().is_empty(), "bytes left after {:?}", line);
        replies.into_iter().next()
    }

    fn encoded(interp: &mut Interpreter<RecordingPeripheral>, line: &[u8]) -> Vec<u8> {
        run(interp, line).map(|r| r.encode()).unwrap_or_default()
    }

    #[test]
    fn test_no_reply_until_terminator() {
        let mut interp = interpreter();
        assert!(interp.on_byte(b'V').is_none());
        assert_eq!(interp.buffer().pending_len(), 1);
    }

    #[test]
    fn test_version() {
        let mut interp = interpreter();
        assert_eq!(encoded(&mut interp, b"VERSION\r"), b"OK test-1.0\r");
        assert_eq!(encoded(&mut interp, b"GET VERSION\r"), b"OK test-1.0\r");
    }

    #[test]
    fn test_set_then_get_name() {
        let mut interp = interpreter();
        assert_eq!(encoded(&mut interp, b"SET NAME=HearAid1\r"), b"OK\r");
        assert_eq!(encoded(&mut interp, b"GET NAME\r"), b"OK HearAid1\r");
        assert_eq!(interp.peripheral().name(), b"HearAid1");
    }

    #[test]
    fn test_name_round_trip_up_to_limit() {
        let mut interp = interpreter();
        for len in 1..=MAX_NAME_LEN {
            let name: Vec<u8> = (0..len).map(|i| b'a' + (i % 26) as u8).collect();
            let mut line = b"SET NAME=".to_vec();
            line.extend_from_slice(&name);
            line.push(b'\r');
            assert!(run(&mut interp, &line).unwrap().is_ok());
            assert_eq!(run(&mut interp, b"GET NAME\r"), Some(Reply::Ok(name)));
        }
    }

    #[test]
    fn test_long_name_truncated() {
        let mut interp = interpreter();
        run(&mut interp, b"SET NAME=ABCDEFGHIJKLMNOPQRSTUVWXYZ\r");
        assert_eq!(
            run(&mut interp, b"GET NAME\r"),
            Some(Reply::ok_with("ABCDEFGHIJKLMNOP"))
        );
    }

    #[test]
    fn test_set_name_errors() {
        let mut interp = interpreter();
        assert_eq!(
            run(&mut interp, b"SET NAME=\r"),
            Some(Reply::Fail(FailReason::OperationFailed))
        );
        assert_eq!(
            run(&mut interp, b"SET NAME\r"),
            Some(Reply::Fail(FailReason::FormatProblem))
        );
        assert_eq!(
            run(&mut interp, b"SET NAME=a\0b\r"),
            Some(Reply::Fail(FailReason::FormatProblem))
        );
        assert_eq!(interp.peripheral().name(), b"Tympan");
    }

    #[test]
    fn test_set_unknown_and_stubbed_parameters() {
        let mut interp = interpreter();
        assert_eq!(
            run(&mut interp, b"SET COLOR=red\r"),
            Some(Reply::Fail(FailReason::ParameterNotKnown))
        );
        assert_eq!(
            run(&mut interp, b"SET CONNECTED=1\r"),
            Some(Reply::Fail(FailReason::ParameterNotKnown))
        );
        for line in [
            &b"SET LEDMODE=1\r"[..],
            b"SET BAUDRATE=115200\r",
            b"SET RFSTATE=0\r",
            b"SET ADVERTISING=1\r",
        ] {
            assert_eq!(
                run(&mut interp, line),
                Some(Reply::Fail(FailReason::NotImplementedYet))
            );
        }
    }

    #[test]
    fn test_get_trailing_garbage() {
        let mut interp = interpreter();
        assert_eq!(
            run(&mut interp, b"GET NAMEX\r"),
            Some(Reply::Fail(FailReason::FormatProblem))
        );
        assert_eq!(
            run(&mut interp, b"GET NAME \r"),
            Some(Reply::Fail(FailReason::FormatProblem))
        );
        assert_eq!(
            run(&mut interp, b"GET COLOR\r"),
            Some(Reply::Fail(FailReason::ParameterNotKnown))
        );
    }

    #[test]
    fn test_get_live_state() {
        let mut interp = interpreter();
        assert_eq!(run(&mut interp, b"GET CONNECTED\r"), Some(Reply::ok_with("TRUE")));
        interp.peripheral_mut().set_connected(false);
        assert_eq!(run(&mut interp, b"GET CONNECTED\r"), Some(Reply::ok_with("FALSE")));
        assert_eq!(run(&mut interp, b"GET ADVERTISING\r"), Some(Reply::ok_with("TRUE")));
        assert_eq!(
            run(&mut interp, b"GET LEDMODE\r"),
            Some(Reply::Fail(FailReason::NotImplementedYet))
        );
    }

    #[test]
    fn test_unknown_verb() {
        let mut interp = interpreter();
        assert_eq!(encoded(&mut interp, b"BOGUS\r"), b"FAIL VERB not known\r");
        assert_eq!(encoded(&mut interp, b"\r"), b"FAIL VERB not known\r");
        // Verbs are case sensitive and need their trailing space
        assert_eq!(encoded(&mut interp, b"send hi\r"), b"FAIL VERB not known\r");
        assert_eq!(encoded(&mut interp, b"SEND\r"), b"FAIL VERB not known\r");
        assert_eq!(interp.buffer().read_index(), interp.buffer().write_index());
    }

    #[test]
    fn test_send_forwards_payload() {
        let mut interp = interpreter();
        let reply = run(&mut interp, b"SEND \xAB\xAD\xC0\xDE\xFF\x80\x0B\r");
        assert_eq!(reply, Some(Reply::ok_with("7")));
        assert_eq!(
            interp.peripheral().notifications(),
            &[vec![0xAB, 0xAD, 0xC0, 0xDE, 0xFF, 0x80, 0x0B]]
        );
        assert_eq!(interp.stats().notified_bytes, 7);
    }

    #[test]
    fn test_send_without_connection() {
        let mut interp = interpreter();
        interp.peripheral_mut().set_connected(false);
        assert_eq!(encoded(&mut interp, b"SEND hello\r"), b"FAIL NO BLE connection\r");
        assert!(interp.peripheral().notifications().is_empty());
    }

    #[test]
    fn test_send_notify_fault() {
        let mut interp = interpreter();
        interp.peripheral_mut().set_fail_notify(true);
        assert_eq!(
            run(&mut interp, b"SEND hello\r"),
            Some(Reply::Fail(FailReason::OperationFailed))
        );
    }

    #[test]
    fn test_send_implicit_ack() {
        let config = InterpreterConfig {
            send_ack: SendAck::Implicit,
            ..InterpreterConfig::default()
        };
        let mut interp = Interpreter::new(config, RecordingPeripheral::new("Tympan"));
        assert!(interp.on_bytes(b"SEND hello\r").is_empty());
        assert_eq!(interp.peripheral().notifications().len(), 1);

        // Failures are still reported
        interp.peripheral_mut().set_connected(false);
        assert_eq!(
            interp.on_bytes(b"SEND hello\r"),
            vec![Reply::Fail(FailReason::NoBleConnection)]
        );
    }

    #[test]
    fn test_buffer_overrun_reported_once() {
        let config = InterpreterConfig {
            buffer_capacity: 8,
            ..InterpreterConfig::default()
        };
        let mut interp = Interpreter::new(config, RecordingPeripheral::new("Tympan"));

        let replies = interp.on_bytes(b"SEND 0123456789\r");
        assert_eq!(replies, vec![Reply::Fail(FailReason::BufferOverrun)]);
        assert!(interp.buffer().is_empty());
        assert!(interp.peripheral().notifications().is_empty());
        assert_eq!(interp.stats().overrun_bytes, 8);

        // Next line is processed normally
        assert_eq!(interp.on_bytes(b"VERSION\r").len(), 1);
        assert!(interp.on_bytes(b"VERSION\r")[0].is_ok());
    }

    #[test]
    fn test_reset_input() {
        let config = InterpreterConfig {
            buffer_capacity: 8,
            ..InterpreterConfig::default()
        };
        let mut interp = Interpreter::new(config, RecordingPeripheral::new("Tympan"));

        assert!(interp.on_bytes(b"GET NA").is_empty());
        interp.reset_input();
        assert!(interp.buffer().is_empty());
        assert_eq!(
            interp.on_bytes(b"ME\r"),
            vec![Reply::Fail(FailReason::VerbNotKnown)]
        );

        // A latched overrun does not leak into the next line either
        interp.on_bytes(b"SEND 0123456789");
        interp.reset_input();
        assert!(interp.on_bytes(b"VERSION\r")[0].is_ok());
    }

    #[test]
    fn test_commands_across_buffer_wrap() {
        let config = InterpreterConfig {
            buffer_capacity: 16,
            ..InterpreterConfig::default()
        };
        let mut interp = Interpreter::new(config, RecordingPeripheral::new("Tympan"));
        for i in 0..20 {
            let name = format!("dev{}", i);
            let line = format!("SET NAME={}\r", name);
            assert_eq!(interp.on_bytes(line.as_bytes()), vec![Reply::ok()]);
            assert_eq!(interp.on_bytes(b"GET NAME\r"), vec![Reply::ok_with(name)]);
        }
    }

    #[test]
    fn test_stats() {
        let mut interp = interpreter();
        interp.on_bytes(b"VERSION\rBOGUS\rGET NAME\r");
        let stats = interp.stats();
        assert_eq!(stats.commands, 3);
        assert_eq!(stats.failures, 1);
    }

    #[test]
    fn test_initial_name_applied() {
        let config = InterpreterConfig {
            initial_name: "AVeryLongDeviceNameIndeed".to_string(),
            ..InterpreterConfig::default()
        };
        let interp = Interpreter::new(config, RecordingPeripheral::new("x"));
        assert_eq!(interp.peripheral().name(), b"AVeryLongDeviceN");
    }
}
