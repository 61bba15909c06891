//! The radio seen from the interpreter.

use crate::error::{ModuleError, ModuleResult};

/// BLE radio operations the interpreter needs.
pub trait BlePeripheral {
    /// Whether a central is connected to the notification characteristic.
    fn is_connected(&self) -> bool;

    /// Whether the module is currently advertising.
    fn is_advertising(&self) -> bool;

    /// Current advertised device name.
    fn name(&self) -> Vec<u8>;

    /// Change the advertised device name.
    fn set_name(&mut self, name: &[u8]) -> ModuleResult<()>;

    /// Write `data` to the characteristic. Returns the number of bytes accepted.
    fn notify(&mut self, data: &[u8]) -> ModuleResult<usize>;
}

/// In-memory peripheral that records every notification.
///
/// Used by the loopback simulator and by tests.
#[derive(Debug, Clone, Default)]
pub struct RecordingPeripheral {
    name: Vec<u8>,
    connected: bool,
    advertising: bool,
    fail_notify: bool,
    notifications: Vec<Vec<u8>>,
}

impl RecordingPeripheral {
    /// Create a connected peripheral with the given name.
    pub fn new(name: &str) -> Self {
        RecordingPeripheral {
            name: name.as_bytes().to_vec(),
            connected: true,
            advertising: false,
            fail_notify: false,
            notifications: Vec::new(),
        }
    }

    /// Simulate a central connecting or disconnecting.
    pub fn set_connected(&mut self, connected: bool) {
        self.connected = connected;
        // A disconnected peripheral goes back to advertising
        self.advertising = !connected;
    }

    /// Make subsequent notifies fail (radio fault injection).
    pub fn set_fail_notify(&mut self, fail: bool) {
        self.fail_notify = fail;
    }

    /// Notifications received so far, oldest first.
    pub fn notifications(&self) -> &[Vec<u8>] {
        &self.notifications
    }

    /// Take and clear the recorded notifications.
    pub fn take_notifications(&mut self) -> Vec<Vec<u8>> {
        std::mem::take(&mut self.notifications)
    }
}

impl BlePeripheral for RecordingPeripheral {
    fn is_connected(&self) -> bool {
        self.connected
    }

    fn is_advertising(&self) -> bool {
        self.advertising
    }

    fn name(&self) -> Vec<u8> {
        self.name.clone()
    }

    fn set_name(&mut self, name: &[u8]) -> ModuleResult<()> {
        self.name = name.to_vec();
        Ok(())
    }

    fn notify(&mut self, data: &[u8]) -> ModuleResult<usize> {
        if !self.connected {
            return Err(ModuleError::NotConnected);
        }
        if self.fail_notify {
            return Err(ModuleError::NotifyFailed("injected fault".to_string()));
        }
        self.notifications.push(data.to_vec());
        Ok(data.len())
    }
}

impl<P: BlePeripheral + ?Sized> BlePeripheral for Box<P> {
    fn is_connected(&self) -> bool {
        (**self).is_connected()
    }

    fn is_advertising(&self) -> bool {
        (**self).is_advertising()
    }

    fn name(&self) -> Vec<u8> {
        (**self).name()
    }

    fn set_name(&mut self, name: &[u8]) -> ModuleResult<()> {
        (**self).set_name(name)
    }

    fn notify(&mut self, data: &[u8]) -> ModuleResult<usize> {
        (**self).notify(data)
    }
}
