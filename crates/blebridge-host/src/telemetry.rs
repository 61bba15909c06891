//! Host-side metric names.

use metrics::{counter, describe_counter, Unit};

/// Envelopes sent with `send_message`.
pub const HOST_MESSAGES: &str = "blebridge.host.messages";
/// Envelope fragments sent.
pub const HOST_FRAGMENTS: &str = "blebridge.host.fragments";
/// Reply waits that ended without a terminated line.
pub const HOST_REPLY_TIMEOUTS: &str = "blebridge.host.reply_timeouts";

/// Register metric descriptions with the installed recorder.
pub fn describe_metrics() {
    describe_counter!(HOST_MESSAGES, Unit::Count, "Envelopes sent to the module");
    describe_counter!(HOST_FRAGMENTS, Unit::Count, "Envelope fragments sent");
    describe_counter!(
        HOST_REPLY_TIMEOUTS,
        Unit::Count,
        "Reply waits that timed out"
    );
}

pub(crate) fn record_message(fragments: usize) {
    counter!(HOST_MESSAGES).increment(1);
    counter!(HOST_FRAGMENTS).increment(fragments as u64);
}

pub(crate) fn record_timeout() {
    counter!(HOST_REPLY_TIMEOUTS).increment(1);
}
