//! Host ↔ BLE module bridge protocol
//!
//! This crate provides the wire types shared by the host microcontroller and the
//! BLE radio module it talks to over a UART. The module relays notification text
//! from the host to a remote phone app over a single BLE characteristic.
//!
//! # Protocol Overview
//!
//! The serial link carries a small AT-style command language:
//!
//! - **Commands** (host → module): ASCII lines terminated with `\r`
//!   (`SEND <bytes>`, `SET <PARAM>=<value>`, `GET <PARAM>`, `VERSION`)
//! - **Replies** (module → host): `OK[ <text>]` or `FAIL <reason>`, also `\r`-terminated
//!
//! Text destined for the remote app is wrapped in an [`Envelope`] (magic preamble,
//! message type, bit-packed length) and cut into [`Fragment`]s small enough for
//! the characteristic. Every piece travels as the argument of its own `SEND`.
//!
//! ```text
//! byte 0-3: AB AD C0 DE     preamble
//! byte 4:   FF              message type (text notification)
//! byte 5-6: (len<<1)|0x8001 big-endian
//! fragment: F0|i, then up to 18 payload bytes
//! ```
//!
//! # Example
//!
//! ```rust
//! use blebridge_protocol::{Command, Envelope, FragmentPolicy, Parameter, Reply};
//!
//! let cmd = Command::Get { param: Parameter::Name };
//! assert_eq!(cmd.encode(), b"GET NAME\r");
//!
//! let reply = Reply::parse(b"OK HearAid1").unwrap();
//! assert_eq!(reply.text(), "HearAid1");
//!
//! let envelope = Envelope::text(b"TEXT=BTN:gain:12dB").unwrap();
//! let fragments = envelope.fragments(18, FragmentPolicy::Reject).unwrap();
//! assert_eq!(fragments.len(), 1);
//! ```

mod codec;
mod commands;
mod constants;
mod envelope;
mod error;
mod gui;
mod reassembly;
mod responses;
mod ring;

pub use codec::*;
pub use commands::*;
pub use constants::*;
pub use envelope::*;
pub use error::*;
pub use gui::*;
pub use reassembly::*;
pub use responses::*;
pub use ring::*;
