//! BLE module side of the bridge.
//!
//! The module sits between the host's UART and a BLE characteristic. It reads
//! host bytes one at a time into a circular buffer, and when the `\r`
//! terminator arrives it classifies the line by verb, runs the handler and
//! produces exactly one reply.
//!
//! The radio itself is behind the [`BlePeripheral`] trait, so the same
//! interpreter runs against real hardware, the loopback simulator in
//! `blebridge-host`, or a test double.
//!
//! # Example
//!
//! ```rust
//! use blebridge_module::{Interpreter, InterpreterConfig, RecordingPeripheral};
//! use blebridge_protocol::Reply;
//!
//! let mut interp = Interpreter::new(InterpreterConfig::default(), RecordingPeripheral::new("Tympan"));
//! let replies = interp.on_bytes(b"SET NAME=HearAid1\rGET NAME\r");
//! assert_eq!(replies[1], Reply::ok_with("HearAid1"));
//! ```

mod config;
mod error;
mod interpreter;
mod peripheral;
pub mod telemetry;

pub use config::*;
pub use error::*;
pub use interpreter::*;
pub use peripheral::*;
