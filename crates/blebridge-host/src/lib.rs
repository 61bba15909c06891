//! Host side of the bridge.
//!
//! The host microcontroller drives the BLE module over a UART: it sends
//! `SET`/`GET`/`VERSION` commands and pushes text for the remote app through
//! `SEND`, framed as an envelope and cut into fragments.
//!
//! - [`ByteSink`] / [`ByteSource`]: the link seam, implemented by
//!   [`ChannelLink`], [`TcpLink`] and the in-process [`LoopbackLink`]
//! - [`BleHost`]: the command client
//!
//! # Example
//!
//! ```rust
//! use blebridge_host::{BleHost, HostConfig, LoopbackLink};
//! use blebridge_module::{Interpreter, InterpreterConfig, RecordingPeripheral};
//!
//! let module = Interpreter::new(InterpreterConfig::default(), RecordingPeripheral::new("Tympan"));
//! let mut host = BleHost::new(LoopbackLink::new(module), HostConfig::default());
//!
//! host.set_name("HearAid1").unwrap();
//! assert_eq!(host.get_name().unwrap(), "HearAid1");
//!
//! let report = host.send_message(b"TEXT=BTN:gain:12dB").unwrap();
//! assert!(report.is_complete());
//! ```

mod client;
mod config;
mod error;
mod simulator;
pub mod telemetry;
mod transport;

pub use client::*;
pub use config::*;
pub use error::*;
pub use simulator::*;
pub use transport::*;
