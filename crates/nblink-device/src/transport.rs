//! Output sinks, ambient value providers, and outbound push.

use nblink_protocol::{
    encode_frame_hex, Message, MessageType, ProtocolError, TAG_BATTERY, TAG_SIGNAL, TAG_TIMESTAMP,
};

/// Millisecond timestamp provider.
pub type TimestampCb = Box<dyn Fn() -> i64>;
/// Battery level provider, 0-100.
pub type BatteryCb = Box<dyn Fn() -> u8>;
/// Signal strength provider, dBm.
pub type SignalCb = Box<dyn Fn() -> i32>;
/// Byte sink for an outbound representation of a frame.
pub type SinkCb = Box<dyn FnMut(&[u8])>;

/// Registered sinks and value providers, consulted at push time.
///
/// Created once at start-up and passed by reference into dispatch, so a
/// test can use a fresh instance per case instead of hidden globals.
/// Unset value providers substitute 0; an unset narrowband sink fails
/// the push with [`ProtocolError::NoSinkRegistered`]. The log sink is
/// auxiliary and skipping it is not an error.
#[derive(Default)]
pub struct Transport {
    timestamp_cb: Option<TimestampCb>,
    battery_cb: Option<BatteryCb>,
    signal_cb: Option<SignalCb>,
    log_sink: Option<SinkCb>,
    nb_sink: Option<SinkCb>,
}

impl Transport {
    /// Create a transport with nothing registered.
    pub fn new() -> Self {
        Transport::default()
    }

    /// Register the millisecond timestamp provider.
    pub fn set_timestamp_cb(&mut self, cb: impl Fn() -> i64 + 'static) {
        self.timestamp_cb = Some(Box::new(cb));
    }

    /// Register the battery level provider (0-100).
    pub fn set_battery_cb(&mut self, cb: impl Fn() -> u8 + 'static) {
        self.battery_cb = Some(Box::new(cb));
    }

    /// Register the signal strength provider (dBm).
    pub fn set_signal_cb(&mut self, cb: impl Fn() -> i32 + 'static) {
        self.signal_cb = Some(Box::new(cb));
    }

    /// Register the log serial sink. Receives a readable summary line.
    pub fn set_log_sink(&mut self, cb: impl FnMut(&[u8]) + 'static) {
        self.log_sink = Some(Box::new(cb));
    }

    /// Register the narrowband serial sink. Receives the hex frame text.
    pub fn set_nb_sink(&mut self, cb: impl FnMut(&[u8]) + 'static) {
        self.nb_sink = Some(Box::new(cb));
    }

    /// Finalize and transmit a message.
    ///
    /// Uplinks get the reserved ambient fields appended first, reading
    /// each registered provider and substituting 0 where none is set.
    /// The frame then goes to the narrowband sink as uppercase hex and
    /// to the log sink as a summary line. Push does not wait for
    /// delivery; the platform ACK arrives later as its own inbound
    /// frame, correlated by msg_id. On success the envelope is sealed.
    pub fn push(&mut self, msg: &mut Message<'_>) -> Result<(), ProtocolError> {
        if !msg.is_initialized() {
            return Err(ProtocolError::UninitializedMessage);
        }
        if msg.is_sealed() {
            return Err(ProtocolError::MessageSealed);
        }
        if self.nb_sink.is_none() {
            return Err(ProtocolError::NoSinkRegistered);
        }

        if msg.msg_type() == MessageType::Up {
            let timestamp = self.timestamp_cb.as_ref().map_or(0, |cb| cb());
            let battery = self.battery_cb.as_ref().map_or(0, |cb| cb());
            let signal = self.signal_cb.as_ref().map_or(0, |cb| cb());
            msg.add_ambient(TAG_TIMESTAMP, &timestamp.to_be_bytes())?;
            msg.add_ambient(TAG_BATTERY, &[battery])?;
            msg.add_ambient(TAG_SIGNAL, &signal.to_be_bytes())?;
        }

        let hex_frame = encode_frame_hex(msg);
        if let Some(log_sink) = self.log_sink.as_mut() {
            let line = format!(
                "TX {:?} msg_id={} dtag={} {}B {}\n",
                msg.msg_type(),
                msg.msg_id(),
                msg.dtag(),
                hex_frame.len() / 2,
                hex_frame
            );
            log_sink(line.as_bytes());
        }
        if let Some(nb_sink) = self.nb_sink.as_mut() {
            nb_sink(hex_frame.as_bytes());
        }

        msg.seal();
        log::debug!(
            "pushed {:?} msg_id={} ({} wire bytes)",
            msg.msg_type(),
            msg.msg_id(),
            hex_frame.len() / 2
        );
        Ok(())
    }
}
