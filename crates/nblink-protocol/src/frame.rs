//! Frame encoding and decoding.
//!
//! An outbound envelope serializes to `version | msg_type | length |
//! body | checksum` and travels over the narrowband link as uppercase
//! ASCII hex. Inbound hex frames decode back into a [`Message`], using
//! either an owned buffer or a caller-supplied region.
//!
//! Decoding is all-or-nothing: a frame that fails any structural check
//! (hex syntax, version, type marker, length field, checksum, TLV
//! stream) produces [`ProtocolError::MalformedFrame`] and no partial
//! envelope.

use bytes::BufMut;

use crate::constants::*;
use crate::error::ProtocolError;
use crate::message::Message;
use crate::types::{validate_tlv_stream, MessageType};

/// Additive checksum over a byte run, modulo 256.
pub fn frame_checksum(bytes: &[u8]) -> u8 {
    bytes.iter().fold(0u8, |sum, b| sum.wrapping_add(*b))
}

/// Serialize a message to raw frame bytes.
pub fn encode_frame(msg: &Message<'_>) -> Vec<u8> {
    let tlvs = msg.tlv_bytes();
    let mut body = Vec::with_capacity(5 + tlvs.len());
    body.push(msg.msg_id());
    match msg.msg_type() {
        MessageType::Ack => {}
        msg_type => {
            body.push(msg.dtag());
            if msg_type.has_cmd_id() {
                body.push(msg.cmd_id());
            }
            body.put_u16(tlvs.len() as u16);
            body.extend_from_slice(tlvs);
        }
    }

    let mut buf = Vec::with_capacity(FRAME_HEADER_SIZE + body.len() + FRAME_CHECKSUM_SIZE);
    buf.push(FRAME_VERSION);
    buf.push(msg.msg_type().to_byte());
    buf.put_u16((body.len() + FRAME_CHECKSUM_SIZE) as u16);
    buf.extend_from_slice(&body);
    buf.push(frame_checksum(&buf));
    buf
}

/// Serialize a message to an uppercase hex frame for the narrowband link.
pub fn encode_frame_hex(msg: &Message<'_>) -> String {
    hex::encode_upper(encode_frame(msg))
}

/// Header fields and TLV region of a structurally valid raw frame.
struct RawFrame<'a> {
    msg_type: MessageType,
    msg_id: u8,
    dtag: u8,
    cmd_id: u8,
    tlvs: &'a [u8],
}

fn parse_frame(raw: &[u8]) -> Result<RawFrame<'_>, ProtocolError> {
    if raw.len() < MIN_FRAME_SIZE {
        return Err(ProtocolError::malformed(format!(
            "frame too short: {} bytes (min {})",
            raw.len(),
            MIN_FRAME_SIZE
        )));
    }
    if raw[0] != FRAME_VERSION {
        return Err(ProtocolError::malformed(format!(
            "unsupported version 0x{:02X}",
            raw[0]
        )));
    }
    let msg_type = MessageType::from_byte(raw[1])?;

    let declared = u16::from_be_bytes([raw[2], raw[3]]) as usize;
    let actual = raw.len() - FRAME_HEADER_SIZE;
    if declared != actual {
        return Err(ProtocolError::malformed(format!(
            "length field says {} bytes, frame carries {}",
            declared, actual
        )));
    }

    let expected = frame_checksum(&raw[..raw.len() - 1]);
    let found = raw[raw.len() - 1];
    if expected != found {
        return Err(ProtocolError::malformed(format!(
            "checksum mismatch: expected 0x{:02X}, found 0x{:02X}",
            expected, found
        )));
    }

    let body = &raw[FRAME_HEADER_SIZE..raw.len() - FRAME_CHECKSUM_SIZE];
    match msg_type {
        MessageType::Ack => {
            if body.len() != 1 {
                return Err(ProtocolError::malformed(format!(
                    "ACK body must be 1 byte, got {}",
                    body.len()
                )));
            }
            Ok(RawFrame {
                msg_type,
                msg_id: body[0],
                dtag: 0,
                cmd_id: 0,
                tlvs: &[],
            })
        }
        _ => {
            // msg_id + dtag [+ cmd_id] + 2-byte tlv_len
            let fixed = if msg_type.has_cmd_id() { 5 } else { 4 };
            if body.len() < fixed {
                return Err(ProtocolError::malformed(format!(
                    "{:?} body too short: {} bytes (min {})",
                    msg_type,
                    body.len(),
                    fixed
                )));
            }
            let msg_id = body[0];
            let dtag = body[1];
            let (cmd_id, len_at) = if msg_type.has_cmd_id() {
                (body[2], 3)
            } else {
                (0, 2)
            };
            let tlv_len = u16::from_be_bytes([body[len_at], body[len_at + 1]]) as usize;
            let tlvs = &body[len_at + 2..];
            if tlvs.len() != tlv_len {
                return Err(ProtocolError::malformed(format!(
                    "TLV length field says {} bytes, body carries {}",
                    tlv_len,
                    tlvs.len()
                )));
            }
            validate_tlv_stream(tlvs)?;
            Ok(RawFrame {
                msg_type,
                msg_id,
                dtag,
                cmd_id,
                tlvs,
            })
        }
    }
}

fn fill_message<'b>(
    mut msg: Message<'b>,
    raw: &RawFrame<'_>,
) -> Result<Message<'b>, ProtocolError> {
    msg.set_header(raw.msg_type, raw.msg_id)?;
    msg.set_dtag(raw.dtag);
    msg.set_cmd_id(raw.cmd_id);
    msg.load_tlv_bytes(raw.tlvs)?;
    log::trace!(
        "decoded {:?} frame: msg_id={} dtag={} {} TLV bytes",
        raw.msg_type,
        raw.msg_id,
        raw.dtag,
        raw.tlvs.len()
    );
    Ok(msg)
}

fn decode_hex(hex_frame: &str) -> Result<Vec<u8>, ProtocolError> {
    hex::decode(hex_frame.trim())
        .map_err(|e| ProtocolError::malformed(format!("invalid hex: {}", e)))
}

/// Decode raw frame bytes into a message with an owned buffer.
pub fn decode_frame(raw: &[u8]) -> Result<Message<'static>, ProtocolError> {
    let parsed = parse_frame(raw)?;
    fill_message(Message::with_capacity(parsed.tlvs.len()), &parsed)
}

/// Decode a hex frame into a message with an owned buffer.
pub fn decode_frame_hex(hex_frame: &str) -> Result<Message<'static>, ProtocolError> {
    let raw = decode_hex(hex_frame)?;
    decode_frame(&raw)
}

/// Decode a hex frame into a message backed by a caller-owned region.
///
/// Fails with [`ProtocolError::BufferFull`] when the region cannot hold
/// the frame's TLV stream.
pub fn decode_frame_hex_into<'b>(
    hex_frame: &str,
    region: &'b mut [u8],
) -> Result<Message<'b>, ProtocolError> {
    let raw = decode_hex(hex_frame)?;
    let parsed = parse_frame(&raw)?;
    fill_message(Message::with_region(region), &parsed)
}
