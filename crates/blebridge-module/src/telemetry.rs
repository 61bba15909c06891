//! Metric names and recording helpers for the interpreter.
//!
//! Recording goes through the `metrics` facade; without an installed
//! recorder every call is a no-op.

use metrics::{counter, describe_counter, Unit};

/// Commands dispatched, labelled by `verb` (`unknown` for unrecognised lines).
pub const MODULE_COMMANDS: &str = "blebridge.module.commands";
/// `FAIL` replies sent, labelled by `reason`.
pub const MODULE_FAILURES: &str = "blebridge.module.failures";
/// Bytes written to the BLE characteristic.
pub const MODULE_NOTIFY_BYTES: &str = "blebridge.module.notify_bytes";
/// Bytes rejected because the command buffer was full.
pub const MODULE_OVERRUN_BYTES: &str = "blebridge.module.overrun_bytes";

/// Register metric descriptions with the installed recorder.
pub fn describe_metrics() {
    describe_counter!(MODULE_COMMANDS, Unit::Count, "Commands dispatched by verb");
    describe_counter!(MODULE_FAILURES, Unit::Count, "FAIL replies by reason");
    describe_counter!(
        MODULE_NOTIFY_BYTES,
        Unit::Bytes,
        "Bytes written to the BLE characteristic"
    );
    describe_counter!(
        MODULE_OVERRUN_BYTES,
        Unit::Bytes,
        "Bytes dropped because the command buffer was full"
    );
}

pub(crate) fn record_command(verb: &'static str) {
    counter!(MODULE_COMMANDS, "verb" => verb).increment(1);
}

pub(crate) fn record_failure(reason: &'static str) {
    counter!(MODULE_FAILURES, "reason" => reason).increment(1);
}

pub(crate) fn record_notify(bytes: usize) {
    counter!(MODULE_NOTIFY_BYTES).increment(bytes as u64);
}

pub(crate) fn record_overrun() {
    counter!(MODULE_OVERRUN_BYTES).increment(1);
}
