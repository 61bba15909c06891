//! YAML configuration for the `blebridge` binary.
//!
//! ```yaml
//! listen: 127.0.0.1:4000
//! connected: true
//! module:
//!   initial_name: HearAid1
//!   send_ack: explicit
//! host:
//!   reply_timeout_ms: 2000
//!   fragment_policy: reject
//! ```

use std::path::Path;

use blebridge_host::HostConfig;
use blebridge_module::InterpreterConfig;
use serde::{Deserialize, Serialize};

use crate::error::RunnerResult;

/// Default address of the TCP UART bridge.
pub const DEFAULT_LISTEN: &str = "127.0.0.1:4000";

/// Runner configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunnerConfig {
    /// Address the bridge listens on.
    pub listen: String,
    /// Whether the simulated phone is connected at startup.
    pub connected: bool,
    /// Module-side settings.
    pub module: InterpreterConfig,
    /// Host-side settings.
    pub host: HostConfig,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        RunnerConfig {
            listen: DEFAULT_LISTEN.to_string(),
            connected: true,
            module: InterpreterConfig::default(),
            host: HostConfig::default(),
        }
    }
}

impl RunnerConfig {
    /// Parse a YAML document.
    pub fn from_yaml(yaml: &str) -> RunnerResult<RunnerConfig> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Load from a YAML file.
    pub fn load(path: &Path) -> RunnerResult<RunnerConfig> {
        let yaml = std::fs::read_to_string(path)?;
        Self::from_yaml(&yaml)
    }

    /// Load from `path` if given, defaults otherwise.
    pub fn load_or_default(path: Option<&Path>) -> RunnerResult<RunnerConfig> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(RunnerConfig::default()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use blebridge_protocol::{FragmentPolicy, SendAck};

    #[test]
    fn test_partial_yaml() {
        let yaml = r#"
listen: 0.0.0.0:5000
module:
  initial_name: HearAid1
  send_ack: implicit
host:
  fragment_policy: wrap
"#;
        let config = RunnerConfig::from_yaml(yaml).unwrap();
        assert_eq!(config.listen, "0.0.0.0:5000");
        assert!(config.connected);
        assert_eq!(config.module.initial_name, "HearAid1");
        assert_eq!(config.module.send_ack, SendAck::Implicit);
        assert_eq!(config.module.buffer_capacity, 512);
        assert_eq!(config.host.fragment_policy, FragmentPolicy::Wrap);
        assert_eq!(config.host.reply_timeout_ms, 2000);
    }

    #[test]
    fn test_bad_yaml() {
        assert!(RunnerConfig::from_yaml("host: [1, 2]").is_err());
    }

    #[test]
    fn test_missing_file() {
        assert!(RunnerConfig::load(Path::new("/nonexistent/blebridge.yaml")).is_err());
    }
}
