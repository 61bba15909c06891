//! TCP UART bridge.
//!
//! Exposes a simulated BLE module on a TCP port. Bytes from a client are fed
//! to the module's interpreter and the replies are written back, so a host
//! program (or `nc`) can talk to it like a serial port. Notifications the
//! module pushes to its characteristic are reassembled and logged the way the
//! remote app would see them.
//!
//! Like a physical UART, the port serves one client at a time. Later clients
//! wait in the accept queue until the current one disconnects, and any
//! unterminated bytes the previous client left behind are dropped before the
//! next one is served.

use std::net::SocketAddr;
use std::sync::Arc;

use blebridge_module::{BlePeripheral, Interpreter, ModuleError, ModuleResult};
use blebridge_protocol::{GuiMessage, Reassembled, Reassembler, MAX_NAME_LEN};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::config::RunnerConfig;
use crate::error::RunnerResult;

/// Interpreter shared between the bridge and its observers.
pub type SharedInterpreter = Arc<Mutex<Interpreter<LoggingPeripheral>>>;

// ============================================================================
// Simulated Peripheral
// ============================================================================

/// BLE peripheral whose "phone" reassembles and logs every message.
#[derive(Debug, Default)]
pub struct LoggingPeripheral {
    name: Vec<u8>,
    connected: bool,
    reassembler: Reassembler,
    messages: Vec<Vec<u8>>,
}

impl LoggingPeripheral {
    /// Create a peripheral, connected or not.
    pub fn new(connected: bool) -> Self {
        LoggingPeripheral {
            connected,
            ..LoggingPeripheral::default()
        }
    }

    /// Simulate the phone connecting or disconnecting.
    pub fn set_connected(&mut self, connected: bool) {
        if !connected {
            self.reassembler.reset();
        }
        self.connected = connected;
    }

    /// Payloads of every envelope reassembled so far.
    pub fn messages(&self) -> &[Vec<u8>] {
        &self.messages
    }

    fn deliver(&mut self, data: &[u8]) {
        match self.reassembler.push(data) {
            Ok(Reassembled::Message { msg_type, payload }) => {
                match GuiMessage::parse(&payload) {
                    Ok(gui) => info!("phone: {:?}", gui),
                    Err(_) => info!(
                        "phone: message type 0x{:02X}: {}",
                        msg_type,
                        String::from_utf8_lossy(&payload)
                    ),
                }
                self.messages.push(payload);
            }
            Ok(Reassembled::Pending) => {}
            Ok(Reassembled::Raw(raw)) => info!("phone: raw notification {}", hex::encode(raw)),
            Err(e) => warn!("phone: dropped envelope: {}", e),
        }
    }
}

impl BlePeripheral for LoggingPeripheral {
    fn is_connected(&self) -> bool {
        self.connected
    }

    fn is_advertising(&self) -> bool {
        !self.connected
    }

    fn name(&self) -> Vec<u8> {
        self.name.clone()
    }

    fn set_name(&mut self, name: &[u8]) -> ModuleResult<()> {
        if name.len() > MAX_NAME_LEN {
            return Err(ModuleError::NameRejected(format!(
                "{} bytes exceeds {}",
                name.len(),
                MAX_NAME_LEN
            )));
        }
        info!("advertising as '{}'", String::from_utf8_lossy(name));
        self.name = name.to_vec();
        Ok(())
    }

    fn notify(&mut self, data: &[u8]) -> ModuleResult<usize> {
        if !self.connected {
            return Err(ModuleError::NotConnected);
        }
        debug!("notify {}", hex::encode(data));
        self.deliver(data);
        Ok(data.len())
    }
}

// ============================================================================
// Server
// ============================================================================

/// TCP server exposing one simulated module.
pub struct BridgeServer {
    listener: TcpListener,
    interpreter: SharedInterpreter,
}

impl BridgeServer {
    /// Bind to `config.listen` and build the module.
    pub async fn bind(config: &RunnerConfig) -> RunnerResult<BridgeServer> {
        let listener = TcpListener::bind(&config.listen).await?;
        let peripheral = LoggingPeripheral::new(config.connected);
        let interpreter = Interpreter::new(config.module.clone(), peripheral);
        Ok(BridgeServer {
            listener,
            interpreter: Arc::new(Mutex::new(interpreter)),
        })
    }

    /// Address actually bound (useful with port 0).
    pub fn local_addr(&self) -> RunnerResult<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Handle on the shared interpreter.
    pub fn interpreter(&self) -> SharedInterpreter {
        self.interpreter.clone()
    }

    /// Serve clients one after another until the listener fails.
    pub async fn run(self) -> RunnerResult<()> {
        info!("UART bridge listening on {}", self.listener.local_addr()?);
        loop {
            let (stream, peer) = self.listener.accept().await?;
            info!("client {} connected", peer);

            match handle_connection(stream, &self.interpreter).await {
                Ok(()) => info!("client {} disconnected", peer),
                Err(e) => warn!("client {}: {}", peer, e),
            }

            self.interpreter.lock().await.reset_input();
        }
    }
}

/// Pump one client's bytes through the interpreter.
async fn handle_connection(mut stream: TcpStream, interpreter: &SharedInterpreter) -> RunnerResult<()> {
    stream.set_nodelay(true)?;
    let mut read_buf = [0u8; 1024];

    loop {
        let n = stream.read(&mut read_buf).await?;
        if n == 0 {
            return Ok(());
        }

        let out: Vec<u8> = {
            let mut interpreter = interpreter.lock().await;
            interpreter
                .on_bytes(&read_buf[..n])
                .iter()
                .flat_map(|reply| reply.encode())
                .collect()
        };

        if !out.is_empty() {
            stream.write_all(&out).await?;
            stream.flush().await?;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_peripheral_reassembles() {
        let mut p = LoggingPeripheral::new(true);
        let envelope = blebridge_protocol::Envelope::text(b"STATE=BTN:mute:1").unwrap();
        p.notify(&envelope.header()).unwrap();
        for fragment in envelope
            .fragments(18, blebridge_protocol::FragmentPolicy::Reject)
            .unwrap()
        {
            p.notify(&fragment.encode()).unwrap();
        }
        assert_eq!(p.messages(), &[b"STATE=BTN:mute:1".to_vec()]);
    }

    #[test]
    fn test_peripheral_disconnected() {
        let mut p = LoggingPeripheral::new(false);
        assert!(p.is_advertising());
        assert_eq!(p.notify(b"x"), Err(ModuleError::NotConnected));
        p.set_connected(true);
        assert_eq!(p.notify(b"x"), Ok(1));
        assert!(p.messages().is_empty());
    }
}
