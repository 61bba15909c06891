//! In-process demonstration: host client, interpreter and phone in one process.

use blebridge_host::{BleHost, LoopbackLink, MessageReport};
use blebridge_module::{Interpreter, RecordingPeripheral};
use blebridge_protocol::{Reassembled, Reassembler};
use tracing::info;

use crate::config::RunnerConfig;
use crate::error::RunnerResult;

/// What one demo run produced.
#[derive(Debug, Clone)]
pub struct DemoReport {
    /// Host-side summary of the send.
    pub report: MessageReport,
    /// Notifications as they left the module (header first).
    pub notifications: Vec<Vec<u8>>,
    /// Payload the phone reassembled, if it completed.
    pub message: Option<Vec<u8>>,
}

/// Send `text` through a loopback module and reassemble it on the other side.
pub fn run_demo(text: &str, config: &RunnerConfig) -> RunnerResult<DemoReport> {
    let mut peripheral = RecordingPeripheral::new(&config.module.initial_name);
    peripheral.set_connected(config.connected);

    let interpreter = Interpreter::new(config.module.clone(), peripheral);
    let mut host_config = config.host.clone();
    // Both ends must agree on acks
    host_config.send_ack = config.module.send_ack;
    let mut host = BleHost::new(LoopbackLink::new(interpreter), host_config);

    info!("module version: {}", host.version()?);
    let report = host.send_message(text.as_bytes())?;
    let notifications = host.link_mut().peripheral_mut().take_notifications();

    let mut reassembler = Reassembler::new();
    let mut message = None;
    for notification in &notifications {
        if let Reassembled::Message { payload, .. } = reassembler.push(notification)? {
            message = Some(payload);
        }
    }

    Ok(DemoReport {
        report,
        notifications,
        message,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_demo_round_trip() {
        let mut config = RunnerConfig::default();
        config.host.fragment_delay_ms = 0;

        let demo = run_demo("TEXT=BTN:gain:12dB and some more text", &config).unwrap();
        assert!(demo.report.is_complete());
        assert_eq!(demo.notifications.len(), 1 + demo.report.fragments);
        assert_eq!(
            demo.message.as_deref(),
            Some(&b"TEXT=BTN:gain:12dB and some more text"[..])
        );
    }

    #[test]
    fn test_demo_disconnected() {
        let mut config = RunnerConfig::default();
        config.connected = false;
        config.host.fragment_delay_ms = 0;

        let demo = run_demo("hello", &config).unwrap();
        assert!(!demo.report.is_complete());
        assert!(demo.notifications.is_empty());
        assert_eq!(demo.message, None);
    }
}
