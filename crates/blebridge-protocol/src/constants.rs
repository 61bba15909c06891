//! Protocol constants
//!
//! Byte values, verb literals and size limits shared by both ends of the serial
//! link and by the remote app.

// ============================================================================
// Line Framing
// ============================================================================

/// End-of-command byte. Terminates every command and every reply.
pub const TERMINATOR: u8 = b'\r';

/// Line feed. Some module firmwares emit it after the terminator; readers skip it.
pub const LINE_FEED: u8 = b'\n';

// ============================================================================
// Verbs (host → module)
// ============================================================================

/// Forward the rest of the line to the BLE characteristic.
pub const VERB_SEND: &[u8] = b"SEND ";
/// Write a module parameter.
pub const VERB_SET: &[u8] = b"SET ";
/// Read a module parameter.
pub const VERB_GET: &[u8] = b"GET ";
/// Ask for the module firmware version.
pub const VERB_VERSION: &[u8] = b"VERSION";

/// Separator between a `SET` parameter name and its value.
pub const SET_SEPARATOR: u8 = b'=';

// ============================================================================
// Replies (module → host)
// ============================================================================

/// Prefix of a successful reply.
pub const REPLY_OK: &[u8] = b"OK";
/// Prefix of a failed reply.
pub const REPLY_FAIL: &[u8] = b"FAIL";

// ============================================================================
// Module Limits
// ============================================================================

/// Size of the interpreter's circular command buffer.
/// One slot is always left empty, so at most `capacity - 1` bytes are pending.
pub const COMMAND_BUFFER_CAPACITY: usize = 512;

/// Longest BLE device name the module accepts; longer values are truncated.
pub const MAX_NAME_LEN: usize = 16;

// ============================================================================
// Envelope
// ============================================================================

/// Magic bytes opening every envelope header ("ABADCODE").
pub const ENVELOPE_PREAMBLE: [u8; 4] = [0xAB, 0xAD, 0xC0, 0xDE];

/// Message type tag for a text notification.
pub const MSG_TYPE_TEXT: u8 = 0xFF;

/// Total header size: preamble, type tag, two length bytes.
pub const ENVELOPE_HEADER_LEN: usize = 7;

/// Bits forced on in the packed length field.
/// The high bit keeps the first length byte away from NUL and `\r`; the low bit
/// keeps the second one odd.
pub const LENGTH_FIELD_FLAGS: u16 = 0x8001;

/// Payloads at or above this length cannot be packed into the length field
/// (one byte of headroom is kept for padding).
pub const MAX_ENVELOPE_PAYLOAD: usize = 0x4000 - 1;

/// Byte appended when the length field would contain a forbidden byte.
pub const PAD_BYTE: u8 = b' ';

// ============================================================================
// Fragments
// ============================================================================

/// High nibble of every fragment marker.
pub const FRAGMENT_MARKER_BASE: u8 = 0xF0;

/// Mask selecting the sequence index from a fragment marker.
pub const FRAGMENT_INDEX_MASK: u8 = 0x0F;

/// Number of distinct fragment indices the marker can carry.
pub const MAX_FRAGMENTS: usize = 16;

/// Payload bytes per fragment in the canonical firmware.
pub const DEFAULT_FRAGMENT_PAYLOAD_LEN: usize = 18;

/// Encode a fragment marker for the given index.
pub const fn fragment_marker(index: usize) -> u8 {
    FRAGMENT_MARKER_BASE | (index as u8 & FRAGMENT_INDEX_MASK)
}

/// Check whether a byte can be a fragment marker.
pub const fn is_fragment_marker(byte: u8) -> bool {
    byte & 0xF0 == FRAGMENT_MARKER_BASE
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fragment_marker_cycles() {
        assert_eq!(fragment_marker(0), 0xF0);
        assert_eq!(fragment_marker(15), 0xFF);
        assert_eq!(fragment_marker(16), 0xF0);
        assert!(is_fragment_marker(0xF7));
        assert!(!is_fragment_marker(ENVELOPE_PREAMBLE[0]));
    }
}
