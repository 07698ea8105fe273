//! Common types used in the protocol.

use crate::constants::*;
use crate::error::ProtocolError;

/// Logical kind of a message envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageType {
    /// Device-to-platform telemetry uplink.
    Up,
    /// Platform acknowledgement of a prior uplink.
    Ack,
    /// Platform-issued command.
    Cmd,
    /// Device-generated command response.
    CmdRsp,
}

impl MessageType {
    /// Decode from the wire marker byte.
    pub fn from_byte(byte: u8) -> Result<Self, ProtocolError> {
        match byte {
            MSG_TYPE_UP => Ok(MessageType::Up),
            MSG_TYPE_ACK => Ok(MessageType::Ack),
            MSG_TYPE_CMD => Ok(MessageType::Cmd),
            MSG_TYPE_CMD_RSP => Ok(MessageType::CmdRsp),
            other => Err(ProtocolError::malformed(format!(
                "unknown message type 0x{:02X}",
                other
            ))),
        }
    }

    /// The wire marker byte for this type.
    pub fn to_byte(self) -> u8 {
        match self {
            MessageType::Up => MSG_TYPE_UP,
            MessageType::Ack => MSG_TYPE_ACK,
            MessageType::Cmd => MSG_TYPE_CMD,
            MessageType::CmdRsp => MSG_TYPE_CMD_RSP,
        }
    }

    /// Whether this type carries a command id byte in its body.
    pub fn has_cmd_id(self) -> bool {
        matches!(self, MessageType::Cmd | MessageType::CmdRsp)
    }

    /// Whether this type carries a TLV stream in its body.
    pub fn has_tlvs(self) -> bool {
        !matches!(self, MessageType::Ack)
    }
}

/// One decoded TLV entry, borrowing its value from the message buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TlvEntry<'a> {
    /// Field tag (parameter id).
    pub tag: u8,
    /// Raw value bytes, interpreted per the tag's type convention.
    pub value: &'a [u8],
}

/// Iterator over the TLV entries of a message buffer.
///
/// Stops at the first entry that does not fit the remaining bytes; the
/// frame decoder validates the stream up front, so a well-formed message
/// always yields every entry.
#[derive(Debug, Clone)]
pub struct TlvIter<'a> {
    data: &'a [u8],
}

impl<'a> TlvIter<'a> {
    /// Iterate the TLV entries serialized in `data`.
    pub fn new(data: &'a [u8]) -> Self {
        TlvIter { data }
    }
}

impl<'a> Iterator for TlvIter<'a> {
    type Item = TlvEntry<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.data.len() < TLV_HEADER_SIZE {
            return None;
        }
        let tag = self.data[0];
        let len = u16::from_be_bytes([self.data[1], self.data[2]]) as usize;
        if self.data.len() < TLV_HEADER_SIZE + len {
            return None;
        }
        let value = &self.data[TLV_HEADER_SIZE..TLV_HEADER_SIZE + len];
        self.data = &self.data[TLV_HEADER_SIZE + len..];
        Some(TlvEntry { tag, value })
    }
}

/// Validate that `data` is a whole number of TLV entries.
///
/// Returns the entry count, or an error naming the offset where the
/// stream stops lining up.
pub fn validate_tlv_stream(data: &[u8]) -> Result<usize, ProtocolError> {
    let mut offset = 0;
    let mut count = 0;
    while offset < data.len() {
        if data.len() - offset < TLV_HEADER_SIZE {
            return Err(ProtocolError::malformed(format!(
                "truncated TLV header at offset {}",
                offset
            )));
        }
        let len = u16::from_be_bytes([data[offset + 1], data[offset + 2]]) as usize;
        if data.len() - offset - TLV_HEADER_SIZE < len {
            return Err(ProtocolError::malformed(format!(
                "TLV value at offset {} overruns the stream",
                offset
            )));
        }
        offset += TLV_HEADER_SIZE + len;
        count += 1;
    }
    Ok(count)
}
