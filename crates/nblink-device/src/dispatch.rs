//! Inbound frame ingestion and command dispatch.
//!
//! Each inbound frame moves through `Received → Decoding → {Dispatched |
//! Rejected}`. A frame that fails decoding is rejected without invoking
//! any handler; a decoded frame is routed exactly once and the outcome
//! reported as a [`Dispatch`]. Handler failures stay inside the handler
//! — the dispatcher's job ends at successful routing.

use std::collections::HashMap;

use nblink_protocol::{decode_frame_hex, decode_frame_hex_into, Message, MessageType, ProtocolError};

use crate::transport::Transport;

/// Handler for an inbound message. Receives the transport on loan so it
/// can build and push a response envelope before returning.
pub type Handler = Box<dyn FnMut(&mut Transport, &Message<'_>)>;

/// Routing outcome of one successfully decoded frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    /// ACK routed to the ack handler (or dropped when none is set).
    Acked {
        /// Id of the uplink being acknowledged.
        msg_id: u8,
    },
    /// CMD routed to the handler registered for its command id.
    Handled {
        /// Command id of the frame.
        cmd_id: u8,
    },
    /// CMD with no registered handler; logged and dropped.
    Unhandled {
        /// Command id of the frame.
        cmd_id: u8,
    },
}

/// Routes decoded inbound frames to the registered handlers.
///
/// Handlers are registered at start-up, before any frame is ingested;
/// re-registering a command id replaces the prior handler
/// (last-writer-wins). The dispatcher owns the [`Transport`] and lends
/// it to handlers during routing, so a handler's response push cannot
/// touch the request envelope or the dispatch table.
pub struct Dispatcher {
    transport: Transport,
    ack_handler: Option<Handler>,
    cmd_handlers: HashMap<u8, Handler>,
}

impl Dispatcher {
    /// Create a dispatcher around a configured transport.
    pub fn new(transport: Transport) -> Self {
        Dispatcher {
            transport,
            ack_handler: None,
            cmd_handlers: HashMap::new(),
        }
    }

    /// The owned transport, for direct uplink pushes.
    pub fn transport(&mut self) -> &mut Transport {
        &mut self.transport
    }

    /// Register the single ack handler, replacing any prior one.
    pub fn set_ack_handler(&mut self, handler: impl FnMut(&mut Transport, &Message<'_>) + 'static) {
        self.ack_handler = Some(Box::new(handler));
    }

    /// Register the handler for a command id, replacing any prior one.
    pub fn set_cmd_handler(
        &mut self,
        cmd_id: u8,
        handler: impl FnMut(&mut Transport, &Message<'_>) + 'static,
    ) {
        if self.cmd_handlers.insert(cmd_id, Box::new(handler)).is_some() {
            log::debug!("replaced handler for command 0x{:02X}", cmd_id);
        }
    }

    /// Decode an inbound hex frame into an owned buffer and dispatch it.
    pub fn ingest_hex(&mut self, hex_frame: &str) -> Result<Dispatch, ProtocolError> {
        let msg = decode_frame_hex(hex_frame)?;
        self.route(&msg)
    }

    /// Decode an inbound hex frame into a caller-owned region and
    /// dispatch it. The region is free for reuse as soon as this
    /// returns.
    pub fn ingest_hex_into(
        &mut self,
        hex_frame: &str,
        region: &mut [u8],
    ) -> Result<Dispatch, ProtocolError> {
        let msg = decode_frame_hex_into(hex_frame, region)?;
        self.route(&msg)
    }

    fn route(&mut self, msg: &Message<'_>) -> Result<Dispatch, ProtocolError> {
        match msg.msg_type() {
            MessageType::Ack => {
                if let Some(handler) = self.ack_handler.as_mut() {
                    handler(&mut self.transport, msg);
                } else {
                    log::debug!("ack for msg_id={} dropped: no ack handler", msg.msg_id());
                }
                Ok(Dispatch::Acked {
                    msg_id: msg.msg_id(),
                })
            }
            MessageType::Cmd => {
                let cmd_id = msg.cmd_id();
                match self.cmd_handlers.get_mut(&cmd_id) {
                    Some(handler) => {
                        handler(&mut self.transport, msg);
                        Ok(Dispatch::Handled { cmd_id })
                    }
                    None => {
                        log::warn!("unhandled command 0x{:02X}", cmd_id);
                        Ok(Dispatch::Unhandled { cmd_id })
                    }
                }
            }
            // UP and CMD_RSP only travel device-to-platform
            other => Err(ProtocolError::malformed(format!(
                "unexpected inbound message type {:?}",
                other
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    const ACK_FRAME: &str = "01F1000200F4";
    const CMD_SINGLE_FRAME: &str = "01F2000A00010300040300010009";

    #[test]
    fn test_ack_without_handler_still_acked() {
        let mut dispatcher = Dispatcher::new(Transport::new());
        let outcome = dispatcher.ingest_hex(ACK_FRAME).unwrap();
        assert_eq!(outcome, Dispatch::Acked { msg_id: 0 });
    }

    #[test]
    fn test_cmd_without_handler_is_unhandled() {
        let mut dispatcher = Dispatcher::new(Transport::new());
        let outcome = dispatcher.ingest_hex(CMD_SINGLE_FRAME).unwrap();
        assert_eq!(outcome, Dispatch::Unhandled { cmd_id: 3 });
    }

    #[test]
    fn test_malformed_frame_invokes_no_handler() {
        let hits = Rc::new(RefCell::new(0));
        let counter = hits.clone();

        let mut dispatcher = Dispatcher::new(Transport::new());
        dispatcher.set_cmd_handler(3, move |_, _| *counter.borrow_mut() += 1);

        // bad checksum
        let err = dispatcher.ingest_hex("01F2000A00010300040300010008");
        assert!(matches!(err, Err(ProtocolError::MalformedFrame(_))));
        assert_eq!(*hits.borrow(), 0);
    }

    #[test]
    fn test_inbound_up_rejected() {
        // a syntactically valid UP frame is not a platform-to-device kind
        let mut msg = Message::new();
        msg.set_header(MessageType::Up, 1).unwrap();
        let hex_frame = nblink_protocol::encode_frame_hex(&msg);

        let mut dispatcher = Dispatcher::new(Transport::new());
        let err = dispatcher.ingest_hex(&hex_frame);
        assert!(matches!(err, Err(ProtocolError::MalformedFrame(_))));
    }

    #[test]
    fn test_last_writer_wins_registration() {
        let first = Rc::new(RefCell::new(0));
        let second = Rc::new(RefCell::new(0));
        let first_counter = first.clone();
        let second_counter = second.clone();

        let mut dispatcher = Dispatcher::new(Transport::new());
        dispatcher.set_cmd_handler(3, move |_, _| *first_counter.borrow_mut() += 1);
        dispatcher.set_cmd_handler(3, move |_, _| *second_counter.borrow_mut() += 1);

        dispatcher.ingest_hex(CMD_SINGLE_FRAME).unwrap();
        assert_eq!(*first.borrow(), 0);
        assert_eq!(*second.borrow(), 1);
    }
}
