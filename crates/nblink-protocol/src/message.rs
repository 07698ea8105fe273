//! Message envelope with a dual-mode (owned or borrowed) TLV buffer.
//!
//! A [`Message`] is one logical envelope: header fields plus an ordered
//! stream of TLV entries written into a fixed-capacity byte region. The
//! region is either allocated by the message itself
//! ([`Message::new`]) or borrowed from the caller for the message's
//! lifetime ([`Message::with_region`]) — on constrained targets the
//! borrowed form lets one stack buffer serve many envelopes in sequence.
//! Every append fails rather than truncates when the region is full,
//! regardless of mode.
//!
//! A message moves through three states: header unset (appends fail with
//! [`ProtocolError::UninitializedMessage`]), ready, and sealed after push
//! (appends fail with [`ProtocolError::MessageSealed`]). Reads never
//! change state.

use crate::constants::*;
use crate::error::ProtocolError;
use crate::types::{MessageType, TlvEntry, TlvIter};

/// Backing storage for a message's TLV stream.
///
/// Destruction branches on the variant: an owned region is dropped with
/// the message, a borrowed region is handed back untouched.
#[derive(Debug)]
enum Region<'b> {
    /// Heap region owned by the message.
    Owned(Vec<u8>),
    /// Caller-supplied region borrowed for the message's lifetime.
    Borrowed(&'b mut [u8]),
}

impl Region<'_> {
    fn capacity(&self) -> usize {
        match self {
            Region::Owned(buf) => buf.len(),
            Region::Borrowed(buf) => buf.len(),
        }
    }

    fn as_slice(&self) -> &[u8] {
        match self {
            Region::Owned(buf) => buf,
            Region::Borrowed(buf) => buf,
        }
    }

    fn as_mut_slice(&mut self) -> &mut [u8] {
        match self {
            Region::Owned(buf) => buf,
            Region::Borrowed(buf) => buf,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    /// `set_header` has not been called yet.
    Unset,
    /// Header set, fields may be appended.
    Ready,
    /// Pushed; the envelope is read-only from here on.
    Sealed,
}

/// One logical message: header fields plus an ordered TLV stream.
#[derive(Debug)]
pub struct Message<'b> {
    msg_type: MessageType,
    msg_id: u8,
    dtag: u8,
    cmd_id: u8,
    region: Region<'b>,
    offset: usize,
    state: State,
}

impl Message<'static> {
    /// Create a message backed by an owned buffer of the default capacity.
    pub fn new() -> Self {
        Message::with_capacity(DEFAULT_MESSAGE_CAPACITY)
    }

    /// Create a message backed by an owned buffer of `capacity` bytes.
    pub fn with_capacity(capacity: usize) -> Self {
        Message {
            msg_type: MessageType::Up,
            msg_id: 0,
            dtag: 0,
            cmd_id: 0,
            region: Region::Owned(vec![0; capacity]),
            offset: 0,
            state: State::Unset,
        }
    }
}

impl Default for Message<'static> {
    fn default() -> Self {
        Message::new()
    }
}

impl<'b> Message<'b> {
    /// Create a message backed by a caller-owned region.
    ///
    /// The message never allocates; dropping it hands the region back
    /// with whatever bytes were written still in place. Capacity checks
    /// are identical to the owned form.
    pub fn with_region(region: &'b mut [u8]) -> Self {
        Message {
            msg_type: MessageType::Up,
            msg_id: 0,
            dtag: 0,
            cmd_id: 0,
            region: Region::Borrowed(region),
            offset: 0,
            state: State::Unset,
        }
    }

    /// Set the message type and id. Must be called before any append.
    ///
    /// Resets the write offset, so a reused borrowed region starts clean.
    pub fn set_header(&mut self, msg_type: MessageType, msg_id: u8) -> Result<(), ProtocolError> {
        if self.state == State::Sealed {
            return Err(ProtocolError::MessageSealed);
        }
        self.msg_type = msg_type;
        self.msg_id = msg_id;
        self.offset = 0;
        self.state = State::Ready;
        Ok(())
    }

    /// Set the dialogue tag, copied from a request into its response.
    pub fn set_dtag(&mut self, dtag: u8) {
        self.dtag = dtag;
    }

    /// Set the command id carried by CMD and CMD_RSP bodies.
    pub fn set_cmd_id(&mut self, cmd_id: u8) {
        self.cmd_id = cmd_id;
    }

    /// Message type. Meaningful once the header is set.
    pub fn msg_type(&self) -> MessageType {
        self.msg_type
    }

    /// Message id correlating a request with its response.
    pub fn msg_id(&self) -> u8 {
        self.msg_id
    }

    /// Dialogue tag.
    pub fn dtag(&self) -> u8 {
        self.dtag
    }

    /// Command id (CMD and CMD_RSP only).
    pub fn cmd_id(&self) -> u8 {
        self.cmd_id
    }

    /// Bytes of TLV stream written so far.
    pub fn used(&self) -> usize {
        self.offset
    }

    /// Total capacity of the backing region.
    pub fn capacity(&self) -> usize {
        self.region.capacity()
    }

    /// Whether the message has been pushed.
    pub fn is_sealed(&self) -> bool {
        self.state == State::Sealed
    }

    /// Whether `set_header` has been called.
    pub fn is_initialized(&self) -> bool {
        self.state != State::Unset
    }

    /// Mark the envelope read-only. Called by the transport after push.
    pub fn seal(&mut self) {
        self.state = State::Sealed;
    }

    /// The serialized TLV stream written so far.
    pub fn tlv_bytes(&self) -> &[u8] {
        &self.region.as_slice()[..self.offset]
    }

    /// Iterate the TLV entries in insertion order.
    pub fn tlvs(&self) -> TlvIter<'_> {
        TlvIter::new(self.tlv_bytes())
    }

    // ------------------------------------------------------------------
    // Typed appends
    // ------------------------------------------------------------------

    /// Append an int8 field.
    pub fn add_i8(&mut self, tag: u8, value: i8) -> Result<(), ProtocolError> {
        self.check_app_tag(tag)?;
        self.append_tlv(tag, &[value as u8])
    }

    /// Append an int16 field.
    pub fn add_i16(&mut self, tag: u8, value: i16) -> Result<(), ProtocolError> {
        self.check_app_tag(tag)?;
        self.append_tlv(tag, &value.to_be_bytes())
    }

    /// Append an int32 field.
    pub fn add_i32(&mut self, tag: u8, value: i32) -> Result<(), ProtocolError> {
        self.check_app_tag(tag)?;
        self.append_tlv(tag, &value.to_be_bytes())
    }

    /// Append an int64 field.
    pub fn add_i64(&mut self, tag: u8, value: i64) -> Result<(), ProtocolError> {
        self.check_app_tag(tag)?;
        self.append_tlv(tag, &value.to_be_bytes())
    }

    /// Append a float field (IEEE-754 single, big-endian).
    pub fn add_f32(&mut self, tag: u8, value: f32) -> Result<(), ProtocolError> {
        self.check_app_tag(tag)?;
        self.append_tlv(tag, &value.to_be_bytes())
    }

    /// Append a string field as raw bytes, no terminator.
    pub fn add_str(&mut self, tag: u8, value: &str) -> Result<(), ProtocolError> {
        self.check_app_tag(tag)?;
        self.append_tlv(tag, value.as_bytes())
    }

    /// Append a reserved ambient field (timestamp, battery, signal).
    ///
    /// Used by the transport while finalizing an uplink; application
    /// code appends through the typed methods, which reject these tags.
    pub fn add_ambient(&mut self, tag: u8, value: &[u8]) -> Result<(), ProtocolError> {
        if tag <= MAX_APP_TAG {
            return Err(ProtocolError::InvalidTag(tag));
        }
        self.append_tlv(tag, value)
    }

    // ------------------------------------------------------------------
    // Typed lookups
    // ------------------------------------------------------------------

    /// Read an int8 field by tag.
    pub fn get_i8(&self, tag: u8) -> Result<i8, ProtocolError> {
        let value = self.find_sized(tag, 1)?;
        Ok(value[0] as i8)
    }

    /// Read an int16 field by tag.
    pub fn get_i16(&self, tag: u8) -> Result<i16, ProtocolError> {
        let value = self.find_sized(tag, 2)?;
        Ok(i16::from_be_bytes([value[0], value[1]]))
    }

    /// Read an int32 field by tag.
    pub fn get_i32(&self, tag: u8) -> Result<i32, ProtocolError> {
        let value = self.find_sized(tag, 4)?;
        Ok(i32::from_be_bytes([value[0], value[1], value[2], value[3]]))
    }

    /// Read an int64 field by tag.
    pub fn get_i64(&self, tag: u8) -> Result<i64, ProtocolError> {
        let value = self.find_sized(tag, 8)?;
        let mut bytes = [0u8; 8];
        bytes.copy_from_slice(value);
        Ok(i64::from_be_bytes(bytes))
    }

    /// Read a float field by tag. Bit-exact for the 4-byte representation.
    pub fn get_f32(&self, tag: u8) -> Result<f32, ProtocolError> {
        let value = self.find_sized(tag, 4)?;
        Ok(f32::from_be_bytes([value[0], value[1], value[2], value[3]]))
    }

    /// Read a string field's raw bytes by tag.
    pub fn get_bytes(&self, tag: u8) -> Result<&[u8], ProtocolError> {
        Ok(self.find(tag)?.value)
    }

    /// Read a string field by tag, validating UTF-8.
    pub fn get_str(&self, tag: u8) -> Result<&str, ProtocolError> {
        let value = self.find(tag)?.value;
        std::str::from_utf8(value).map_err(|_| ProtocolError::InvalidUtf8(tag))
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    fn check_app_tag(&self, tag: u8) -> Result<(), ProtocolError> {
        if tag > MAX_APP_TAG {
            return Err(ProtocolError::InvalidTag(tag));
        }
        Ok(())
    }

    fn append_tlv(&mut self, tag: u8, value: &[u8]) -> Result<(), ProtocolError> {
        match self.state {
            State::Unset => return Err(ProtocolError::UninitializedMessage),
            State::Sealed => return Err(ProtocolError::MessageSealed),
            State::Ready => {}
        }
        if value.len() > MAX_TLV_VALUE_LEN {
            return Err(ProtocolError::ValueTooLong {
                tag,
                len: value.len(),
                max: MAX_TLV_VALUE_LEN,
            });
        }
        let needed = TLV_HEADER_SIZE + value.len();
        let remaining = self.region.capacity() - self.offset;
        if needed > remaining {
            return Err(ProtocolError::BufferFull { needed, remaining });
        }
        let buf = self.region.as_mut_slice();
        buf[self.offset] = tag;
        buf[self.offset + 1..self.offset + 3].copy_from_slice(&(value.len() as u16).to_be_bytes());
        buf[self.offset + TLV_HEADER_SIZE..self.offset + needed].copy_from_slice(value);
        self.offset += needed;
        Ok(())
    }

    /// Copy a decoded TLV stream into the region. Used by the frame decoder.
    pub(crate) fn load_tlv_bytes(&mut self, data: &[u8]) -> Result<(), ProtocolError> {
        let remaining = self.region.capacity();
        if data.len() > remaining {
            return Err(ProtocolError::BufferFull {
                needed: data.len(),
                remaining,
            });
        }
        self.region.as_mut_slice()[..data.len()].copy_from_slice(data);
        self.offset = data.len();
        Ok(())
    }

    fn find(&self, tag: u8) -> Result<TlvEntry<'_>, ProtocolError> {
        self.tlvs()
            .find(|entry| entry.tag == tag)
            .ok_or(ProtocolError::FieldNotFound(tag))
    }

    fn find_sized(&self, tag: u8, expected: usize) -> Result<&[u8], ProtocolError> {
        let entry = self.find(tag)?;
        if entry.value.len() != expected {
            return Err(ProtocolError::LengthMismatch {
                tag,
                expected,
                actual: entry.value.len(),
            });
        }
        Ok(entry.value)
    }
}
