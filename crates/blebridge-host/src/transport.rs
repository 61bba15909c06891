//! Byte-level links between the host and the module.
//!
//! The client only needs to push bytes out and pull bytes in with a timeout,
//! so any serial port, socket or in-process simulator can stand in for the
//! UART.

use std::io::{ErrorKind, Read, Write};
use std::net::{TcpStream, ToSocketAddrs};
use std::time::Duration;

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender};
use tracing::trace;

use crate::error::{HostError, HostResult};

/// Bytes headed for the other end of the link.
pub trait ByteSink {
    /// Write all of `data`.
    fn write_bytes(&mut self, data: &[u8]) -> HostResult<()>;
}

/// Bytes arriving from the other end of the link.
pub trait ByteSource {
    /// Wait up to `timeout` for data.
    ///
    /// Returns `Ok(None)` when nothing arrived in time.
    fn read_bytes(&mut self, timeout: Duration) -> HostResult<Option<Vec<u8>>>;
}

// ============================================================================
// Channel Link
// ============================================================================

/// One end of an in-memory duplex link.
#[derive(Debug, Clone)]
pub struct ChannelLink {
    tx: Sender<Vec<u8>>,
    rx: Receiver<Vec<u8>>,
}

impl ChannelLink {
    /// Create both ends of a link.
    pub fn pair() -> (ChannelLink, ChannelLink) {
        let (a_tx, b_rx) = crossbeam_channel::unbounded();
        let (b_tx, a_rx) = crossbeam_channel::unbounded();
        (
            ChannelLink { tx: a_tx, rx: a_rx },
            ChannelLink { tx: b_tx, rx: b_rx },
        )
    }

    /// Block until data arrives. Returns `None` once the other end is dropped.
    pub fn recv(&self) -> Option<Vec<u8>> {
        self.rx.recv().ok()
    }
}

impl ByteSink for ChannelLink {
    fn write_bytes(&mut self, data: &[u8]) -> HostResult<()> {
        self.tx
            .send(data.to_vec())
            .map_err(|_| HostError::Disconnected)
    }
}

impl ByteSource for ChannelLink {
    fn read_bytes(&mut self, timeout: Duration) -> HostResult<Option<Vec<u8>>> {
        match self.rx.recv_timeout(timeout) {
            Ok(data) => Ok(Some(data)),
            Err(RecvTimeoutError::Timeout) => Ok(None),
            Err(RecvTimeoutError::Disconnected) => Err(HostError::Disconnected),
        }
    }
}

// ============================================================================
// TCP Link
// ============================================================================

/// Serial link tunnelled over TCP, as exposed by `blebridge serve`.
#[derive(Debug)]
pub struct TcpLink {
    stream: TcpStream,
}

impl TcpLink {
    /// Connect to a bridge.
    pub fn connect(addr: impl ToSocketAddrs) -> HostResult<TcpLink> {
        let stream = TcpStream::connect(addr)?;
        stream.set_nodelay(true)?;
        Ok(TcpLink { stream })
    }

    /// Wrap an already connected stream.
    pub fn from_stream(stream: TcpStream) -> TcpLink {
        TcpLink { stream }
    }
}

impl ByteSink for TcpLink {
    fn write_bytes(&mut self, data: &[u8]) -> HostResult<()> {
        self.stream.write_all(data)?;
        self.stream.flush()?;
        Ok(())
    }
}

impl ByteSource for TcpLink {
    fn read_bytes(&mut self, timeout: Duration) -> HostResult<Option<Vec<u8>>> {
        // A zero timeout means "block forever" to the socket
        let timeout = timeout.max(Duration::from_millis(1));
        self.stream.set_read_timeout(Some(timeout))?;

        let mut buf = [0u8; 256];
        match self.stream.read(&mut buf) {
            Ok(0) => Err(HostError::Disconnected),
            Ok(n) => {
                trace!("TcpLink: read {} bytes", n);
                Ok(Some(buf[..n].to_vec()))
            }
            Err(e) if matches!(e.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut) => {
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_pair() {
        let (mut host, mut module) = ChannelLink::pair();
        host.write_bytes(b"VERSION\r").unwrap();
        assert_eq!(
            module.read_bytes(Duration::from_millis(10)).unwrap(),
            Some(b"VERSION\r".to_vec())
        );
        assert_eq!(host.read_bytes(Duration::from_millis(1)).unwrap(), None);
    }

    #[test]
    fn test_channel_disconnect() {
        let (mut host, module) = ChannelLink::pair();
        drop(module);
        assert!(matches!(
            host.read_bytes(Duration::from_millis(1)),
            Err(HostError::Disconnected)
        ));
        assert!(matches!(
            host.write_bytes(b"x"),
            Err(HostError::Disconnected)
        ));
    }
}
