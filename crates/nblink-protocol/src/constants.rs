//! Protocol constants
//!
//! These constants define the frame layout, message type markers, and the
//! tag space used by the nblink narrowband protocol.

// ============================================================================
// Frame Layout
// ============================================================================

/// Protocol version byte, first byte of every frame.
pub const FRAME_VERSION: u8 = 0x01;
/// Bytes before the body: version + msg_type + 2-byte length.
pub const FRAME_HEADER_SIZE: usize = 4;
/// Trailing checksum byte.
pub const FRAME_CHECKSUM_SIZE: usize = 1;
/// Smallest valid frame: header + ACK body (1 byte) + checksum.
pub const MIN_FRAME_SIZE: usize = FRAME_HEADER_SIZE + 1 + FRAME_CHECKSUM_SIZE;

// ============================================================================
// Message Type Markers
// ============================================================================

/// Device-to-platform telemetry uplink.
pub const MSG_TYPE_UP: u8 = 0xF0;
/// Platform acknowledgement of a prior uplink.
pub const MSG_TYPE_ACK: u8 = 0xF1;
/// Platform-issued command.
pub const MSG_TYPE_CMD: u8 = 0xF2;
/// Device-generated command response.
pub const MSG_TYPE_CMD_RSP: u8 = 0xF3;

// ============================================================================
// TLV Layout
// ============================================================================

/// Bytes per TLV entry before the value: tag + 2-byte length.
pub const TLV_HEADER_SIZE: usize = 3;
/// Maximum value size of a single TLV entry.
pub const MAX_TLV_VALUE_LEN: usize = 255;

// ============================================================================
// Tag Space
// ============================================================================

/// Highest tag available to application fields.
pub const MAX_APP_TAG: u8 = 0xEF;
/// Reserved tag: millisecond timestamp (i64), appended to uplinks.
pub const TAG_TIMESTAMP: u8 = 0xF0;
/// Reserved tag: battery level 0-100 (i8), appended to uplinks.
pub const TAG_BATTERY: u8 = 0xF1;
/// Reserved tag: signal strength in dBm (i32), appended to uplinks.
pub const TAG_SIGNAL: u8 = 0xF2;

// ============================================================================
// Sizes
// ============================================================================

/// Default capacity of an owned message buffer.
pub const DEFAULT_MESSAGE_CAPACITY: usize = 1024;
