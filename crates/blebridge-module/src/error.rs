//! Error types for the module side.

use thiserror::Error;

/// Errors raised by a [`BlePeripheral`](crate::BlePeripheral).
///
/// The interpreter turns these into `FAIL` replies; they never stop it.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ModuleError {
    /// No central is connected.
    #[error("no BLE connection")]
    NotConnected,

    /// The characteristic write/notify failed.
    #[error("BLE notify failed: {0}")]
    NotifyFailed(String),

    /// The radio stack refused the new device name.
    #[error("BLE name rejected: {0}")]
    NameRejected(String),
}

/// Result type alias for module operations.
pub type ModuleResult<T> = Result<T, ModuleError>;
