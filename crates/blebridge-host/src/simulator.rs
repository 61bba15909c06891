//! In-process stand-ins for the serial link.
//!
//! [`LoopbackLink`] runs the module's interpreter synchronously inside the
//! link: every write is interpreted immediately and the replies are queued
//! for the next read. [`spawn_module`] runs it on its own thread behind a
//! [`ChannelLink`] instead, which behaves more like a real UART.

use std::thread::{self, JoinHandle};
use std::time::Duration;

use blebridge_module::{BlePeripheral, Interpreter};
use tracing::{debug, trace};

use crate::error::HostResult;
use crate::transport::{ByteSink, ByteSource, ChannelLink};

/// Link wired straight into an interpreter.
pub struct LoopbackLink<P: BlePeripheral> {
    interpreter: Interpreter<P>,
    pending: Vec<u8>,
}

impl<P: BlePeripheral> LoopbackLink<P> {
    /// Wrap an interpreter.
    pub fn new(interpreter: Interpreter<P>) -> Self {
        LoopbackLink {
            interpreter,
            pending: Vec::new(),
        }
    }

    /// Get the interpreter.
    pub fn interpreter(&self) -> &Interpreter<P> {
        &self.interpreter
    }

    /// Get the interpreter mutably.
    pub fn interpreter_mut(&mut self) -> &mut Interpreter<P> {
        &mut self.interpreter
    }

    /// Get the peripheral behind the interpreter.
    pub fn peripheral(&self) -> &P {
        self.interpreter.peripheral()
    }

    /// Get the peripheral mutably.
    pub fn peripheral_mut(&mut self) -> &mut P {
        self.interpreter.peripheral_mut()
    }

    /// Unwrap the interpreter.
    pub fn into_interpreter(self) -> Interpreter<P> {
        self.interpreter
    }
}

impl<P: BlePeripheral> ByteSink for LoopbackLink<P> {
    fn write_bytes(&mut self, data: &[u8]) -> HostResult<()> {
        for reply in self.interpreter.on_bytes(data) {
            self.pending.extend_from_slice(&reply.encode());
        }
        Ok(())
    }
}

impl<P: BlePeripheral> ByteSource for LoopbackLink<P> {
    /// Never waits: the interpreter has already answered everything written.
    fn read_bytes(&mut self, _timeout: Duration) -> HostResult<Option<Vec<u8>>> {
        if self.pending.is_empty() {
            return Ok(None);
        }
        Ok(Some(std::mem::take(&mut self.pending)))
    }
}

/// Run an interpreter on a background thread.
///
/// Returns the host's end of the link and a handle that yields the
/// interpreter back once the host end is dropped.
pub fn spawn_module<P>(
    interpreter: Interpreter<P>,
) -> HostResult<(ChannelLink, JoinHandle<Interpreter<P>>)>
where
    P: BlePeripheral + Send + 'static,
{
    let (host_end, mut module_end) = ChannelLink::pair();

    let handle = thread::Builder::new()
        .name("ble-module".to_string())
        .spawn(move || {
            let mut interpreter = interpreter;
            debug!("module thread started");
            while let Some(data) = module_end.recv() {
                trace!("module thread: {} bytes in", data.len());
                for reply in interpreter.on_bytes(&data) {
                    if module_end.write_bytes(&reply.encode()).is_err() {
                        debug!("module thread: host end closed");
                        return interpreter;
                    }
                }
            }
            debug!("module thread stopped");
            interpreter
        })?;

    Ok((host_end, handle))
}

#[cfg(test)]
mod tests {
    use super::*;
    use blebridge_module::{InterpreterConfig, RecordingPeripheral};

    fn interpreter() -> Interpreter<RecordingPeripheral> {
        Interpreter::new(InterpreterConfig::default(), RecordingPeripheral::new("Tympan"))
    }

    #[test]
    fn test_loopback_queues_replies() {
        let mut link = LoopbackLink::new(interpreter());
        link.write_bytes(b"GET CONNECTED\rBOGUS\r").unwrap();
        assert_eq!(
            link.read_bytes(Duration::ZERO).unwrap(),
            Some(b"OK TRUE\rFAIL VERB not known\r".to_vec())
        );
        assert_eq!(link.read_bytes(Duration::ZERO).unwrap(), None);
    }

    #[test]
    fn test_module_thread_round_trip() {
        let (mut link, handle) = spawn_module(interpreter()).unwrap();
        link.write_bytes(b"SEND hi\r").unwrap();
        let reply = link.read_bytes(Duration::from_secs(1)).unwrap();
        assert_eq!(reply, Some(b"OK 2\r".to_vec()));

        drop(link);
        let interpreter = handle.join().unwrap();
        assert_eq!(interpreter.peripheral().notifications(), &[b"hi".to_vec()]);
    }
}
