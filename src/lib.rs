//! A client-side WebSocket protocol engine for synchronous, blocking I/O.
//!
//! Performs the HTTP/1.1 Upgrade handshake defined for WebSocket, then
//! exchanges [RFC 6455](https://datatracker.ietf.org/doc/html/rfc6455)
//! data frames — fragmented or unfragmented, text or binary — with full
//! client-side masking and control-frame (PING/PONG/CLOSE) handling.
//!
//! There is no async runtime here: every socket operation blocks up to a
//! configurable timeout, and a [`Connection`] is meant to be driven by one
//! thread at a time.
//!
//! ```no_run
//! use wsconduit::{ClientConfig, Connection, Message};
//!
//! let mut conn = Connection::connect("wss://example.com/socket", ClientConfig::default())?;
//! conn.send_message(Message::Text("hello".to_string()))?;
//! if let Some(msg) = conn.recv_message()? {
//!     println!("{:?}", msg);
//! }
//! conn.disconnect()?;
//! # Ok::<(), wsconduit::Error>(())
//! ```

pub mod buffer;
pub mod codec;
pub mod config;
pub mod connection;
pub mod control;
pub mod error;
pub mod frame;
pub mod handshake;
pub mod ingress;
pub mod message;
pub mod reassembler;
pub mod request;
pub mod socket;

pub use config::{ClientConfig, WebSocketConfig};
pub use connection::Connection;
pub use error::{Error, ErrorKind};
pub use frame::{Frame, OpCode};
pub use message::{CloseCode, Message};
pub use request::WsUrl;
