//! nblink Device Runtime
//!
//! This crate layers the device-side runtime on top of
//! [`nblink_protocol`]: a [`Transport`] owning the registered output
//! sinks and ambient value providers, and a [`Dispatcher`] routing
//! inbound hex frames to the registered ACK and command handlers.
//!
//! The model is single-threaded and cooperative. Registration happens
//! at start-up, before any frame is processed; decode-and-dispatch and
//! outbound push are synchronous calls with no suspension point. A
//! command handler receives the transport on loan and may build and
//! push a response envelope before returning.
//!
//! # Example
//!
//! ```rust,ignore
//! use nblink_device::{Dispatcher, Transport};
//! use nblink_protocol::{Message, MessageType};
//!
//! let mut transport = Transport::new();
//! transport.set_nb_sink(|frame| uart_write(frame));
//! transport.set_battery_cb(|| 99);
//!
//! let mut dispatcher = Dispatcher::new(transport);
//! dispatcher.set_cmd_handler(3, |transport, req| {
//!     let mut rsp = Message::new();
//!     let _ = rsp.set_header(MessageType::CmdRsp, req.msg_id());
//!     rsp.set_dtag(req.dtag());
//!     rsp.set_cmd_id(req.cmd_id());
//!     let _ = transport.push(&mut rsp);
//! });
//!
//! dispatcher.ingest_hex("01F2000A00010300040300010009")?;
//! ```

mod dispatch;
mod transport;

pub use dispatch::*;
pub use transport::*;
