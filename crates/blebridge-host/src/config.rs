//! Host client configuration.

use std::time::Duration;

use blebridge_protocol::{FragmentPolicy, SendAck, DEFAULT_FRAGMENT_PAYLOAD_LEN};
use serde::{Deserialize, Serialize};

/// Configuration for [`BleHost`](crate::BleHost).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HostConfig {
    /// How long to wait for a reply line.
    pub reply_timeout_ms: u64,
    /// Pause before each envelope fragment.
    pub fragment_delay_ms: u64,
    /// Payload bytes per fragment (the marker byte comes on top).
    pub fragment_payload_len: usize,
    /// Handling of payloads that need more than 16 fragments.
    pub fragment_policy: FragmentPolicy,
    /// Acknowledgement mode the module is running with.
    pub send_ack: SendAck,
    /// In implicit-ack mode, how long to watch for a `FAIL` after each `SEND`.
    pub implicit_fail_window_ms: u64,
}

impl Default for HostConfig {
    fn default() -> Self {
        HostConfig {
            reply_timeout_ms: 2000,
            fragment_delay_ms: 4,
            fragment_payload_len: DEFAULT_FRAGMENT_PAYLOAD_LEN,
            fragment_policy: FragmentPolicy::Reject,
            send_ack: SendAck::Explicit,
            implicit_fail_window_ms: 20,
        }
    }
}

impl HostConfig {
    /// Reply timeout as a duration.
    pub fn reply_timeout(&self) -> Duration {
        Duration::from_millis(self.reply_timeout_ms)
    }

    /// Implicit-ack `FAIL` window as a duration.
    pub fn implicit_fail_window(&self) -> Duration {
        Duration::from_millis(self.implicit_fail_window_ms)
    }

    /// Inter-fragment delay as a duration.
    pub fn fragment_delay(&self) -> Duration {
        Duration::from_millis(self.fragment_delay_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_yaml_overrides() {
        let yaml = "reply_timeout_ms: 500\nfragment_policy: wrap\n";
        let config: HostConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.reply_timeout(), Duration::from_millis(500));
        assert_eq!(config.fragment_policy, FragmentPolicy::Wrap);
        assert_eq!(config.fragment_payload_len, 18);
        assert_eq!(config.fragment_delay(), Duration::from_millis(4));
        assert_eq!(config.implicit_fail_window(), Duration::from_millis(20));
    }
}
