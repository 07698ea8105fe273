//! Protocol error types.

use thiserror::Error;

/// Errors that can occur when building, reading, or framing messages.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    /// Not enough room left in the message buffer for the field.
    #[error("buffer full: field needs {needed} bytes, {remaining} remaining")]
    BufferFull {
        /// Bytes the TLV entry would occupy.
        needed: usize,
        /// Bytes of capacity still unwritten.
        remaining: usize,
    },

    /// Tag outside the application tag space.
    #[error("invalid tag 0x{0:02X}: reserved for ambient fields")]
    InvalidTag(u8),

    /// No TLV with the requested tag exists in the message.
    #[error("no field with tag 0x{0:02X}")]
    FieldNotFound(u8),

    /// Stored value length does not match the requested type's size.
    #[error("length mismatch for tag 0x{tag:02X}: expected {expected} bytes, stored {actual}")]
    LengthMismatch {
        /// Tag of the mismatched field.
        tag: u8,
        /// Size the requested type requires.
        expected: usize,
        /// Size actually stored on the wire.
        actual: usize,
    },

    /// Value exceeds the maximum TLV value size.
    #[error("value too long for tag 0x{tag:02X}: {len} bytes (max {max})")]
    ValueTooLong {
        /// Tag of the rejected field.
        tag: u8,
        /// Size of the rejected value.
        len: usize,
        /// Maximum allowed value size.
        max: usize,
    },

    /// Message header was never set.
    #[error("message header not set: call set_header before adding fields")]
    UninitializedMessage,

    /// Message was already pushed; sealed envelopes are read-only.
    #[error("message sealed: already pushed")]
    MessageSealed,

    /// Inbound frame could not be decoded.
    #[error("malformed frame: {0}")]
    MalformedFrame(String),

    /// Invalid UTF-8 in a string field.
    #[error("invalid UTF-8 in string field with tag 0x{0:02X}")]
    InvalidUtf8(u8),

    /// No narrowband output sink registered.
    #[error("no narrowband sink registered")]
    NoSinkRegistered,
}

impl ProtocolError {
    /// Create a malformed frame error.
    pub fn malformed(message: impl Into<String>) -> Self {
        ProtocolError::MalformedFrame(message.into())
    }
}
