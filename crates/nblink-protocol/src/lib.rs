//! nblink NB-IoT Message Protocol
//!
//! This crate provides the device-side message codec for the nblink
//! narrowband uplink protocol: a binary envelope carrying a stream of
//! typed, tagged fields (TLVs), transported as hex-encoded ASCII frames
//! over a constrained serial link.
//!
//! # Frame Format
//!
//! All multi-byte integers are big-endian.
//!
//! | Field    | Size (bytes) | Description                                    |
//! |----------|--------------|------------------------------------------------|
//! | version  | 1            | Protocol version, always `0x01`.               |
//! | msg_type | 1            | `0xF0` UP, `0xF1` ACK, `0xF2` CMD, `0xF3` RSP. |
//! | length   | 2            | Byte count of everything after this field.     |
//! | body     | variable     | Per-type body (see below).                     |
//! | checksum | 1            | Sum of all preceding frame bytes, mod 256.     |
//!
//! Bodies:
//!
//! - **ACK**: `msg_id(1)` — acknowledges a prior uplink, no TLVs.
//! - **UP**: `msg_id(1) | dtag(1) | tlv_len(2) | tlv stream`
//! - **CMD / CMD_RSP**: `msg_id(1) | dtag(1) | cmd_id(1) | tlv_len(2) | tlv stream`
//!
//! Each TLV entry is `tag(1) | len(2) | value(len)`. Values are big-endian;
//! the value type is implied by the tag (known to both ends), not encoded.
//! String values are raw bytes with no terminator.
//!
//! # Example
//!
//! ```rust,ignore
//! use nblink_protocol::{Message, MessageType, encode_frame_hex};
//!
//! let mut msg = Message::new();
//! msg.set_header(MessageType::Up, 1)?;
//! msg.add_f32(1, 123.123)?;
//! msg.add_str(5, "HELLO,WORLD")?;
//! let frame = encode_frame_hex(&msg);
//! ```

mod constants;
mod error;
mod frame;
mod message;
mod types;

pub use constants::*;
pub use error::*;
pub use frame::*;
pub use message::*;
pub use types::*;
