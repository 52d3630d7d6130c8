//! Connection lifecycle glue: owns the socket, receive buffer, reassembler,
//! and state flags, and exposes `connect`/`send_*`/`recv_*`/`disconnect`
//! (spec.md §3, §4.6).

use crate::buffer::RecvBuffer;
use crate::codec;
use crate::config::ClientConfig;
use crate::error::{set_last_error, Error, ErrorKind};
use crate::frame::Frame;
use crate::handshake;
use crate::ingress;
use crate::message::{CloseCode, Message};
use crate::reassembler::Reassembler;
use crate::request::WsUrl;
use crate::socket::{Socket, TcpSocket};
use std::io::{Read, Write};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Closed,
    Connected,
    Closing,
}

/// A single client-side WebSocket connection. Composition, not
/// inheritance (spec.md §9): owns a concrete `TcpSocket` directly rather
/// than embedding a base socket struct.
pub struct Connection {
    socket: TcpSocket,
    recv_buffer: RecvBuffer,
    reassembler: Reassembler,
    url: WsUrl,
    client_key: String,
    state: State,
    config: ClientConfig,
    on_disconnect: Option<Box<dyn FnMut()>>,
}

impl Connection {
    /// Opens the TCP/TLS connection and performs the handshake. On
    /// success the connection is left in the `CONNECTED` state.
    pub fn connect(raw_url: &str, config: ClientConfig) -> Result<Self, Error> {
        let url = WsUrl::parse(raw_url).map_err(set_last_error)?;

        let mut socket = TcpSocket::connect_with_ca(&url.host, url.port, url.use_tls, config.ca_file.as_deref())
            .map_err(set_last_error)?;
        socket.set_timeout(Some(config.timeout)).map_err(set_last_error)?;

        let client_key = handshake::generate_client_key().map_err(set_last_error)?;
        let mut recv_buffer = RecvBuffer::new();

        if let Err(e) = handshake::perform_client_handshake(&mut socket, &url, &client_key, &mut recv_buffer) {
            let _ = socket.shutdown();
            return Err(set_last_error(e));
        }

        log::debug!(
            "handshake complete for {}://{}:{}{}",
            if url.use_tls { "wss" } else { "ws" },
            url.host,
            url.port,
            url.path
        );

        Ok(Self {
            socket,
            recv_buffer,
            reassembler: Reassembler::new(),
            url,
            client_key,
            state: State::Connected,
            config,
            on_disconnect: None,
        })
    }

    /// Installs a hook run once, just before the socket is closed by
    /// `disconnect()` (spec.md §3's "user-supplied disconnect ... hooks").
    pub fn set_disconnect_hook(&mut self, hook: impl FnMut() + 'static) {
        self.on_disconnect = Some(Box::new(hook));
    }

    pub fn client_key(&self) -> &str {
        &self.client_key
    }

    pub fn url(&self) -> &WsUrl {
        &self.url
    }

    pub fn is_connected(&self) -> bool {
        self.state == State::Connected
    }

    /// Serializes and writes a single frame. Client-authored frames are
    /// always masked (spec.md §3, §6) regardless of `frame.mask`.
    pub fn send_frame(&mut self, mut frame: Frame) -> Result<(), Error> {
        if self.state != State::Connected {
            return Err(set_last_error(Error::ConnectionClosed));
        }
        if frame.payload.len() > self.config.web_socket_config.max_frame_size {
            return Err(set_last_error(Error::MaxFrameSizeExceeded(
                frame.payload.len() as u64,
                self.config.web_socket_config.max_frame_size,
            )));
        }
        frame.mask = true;
        let wire = codec::serialize(&frame).map_err(set_last_error)?;
        self.socket.write_all_timeout(&wire).map_err(set_last_error)
    }

    /// Splits `message` into frames bounded by `max_frame_size` and sends
    /// them in order.
    pub fn send_message(&mut self, message: Message) -> Result<(), Error> {
        if self.state != State::Connected {
            return Err(set_last_error(Error::ConnectionClosed));
        }
        let max_frame_size = self.config.web_socket_config.max_frame_size;
        for frame in message.to_frames(max_frame_size) {
            self.send_frame(frame)?;
        }
        Ok(())
    }

    /// Reads from the socket and runs the ingress parser until a complete
    /// logical message is available, a CLOSE is observed, or the read
    /// times out (spec.md §4.4's `RecvMessage`).
    pub fn recv_message(&mut self) -> Result<Option<Message>, Error> {
        loop {
            if let Some(message) = self.reassembler.pop_message().map_err(set_last_error)? {
                return Ok(Some(message));
            }

            if !self.wait_for_frame()? {
                // A CLOSE can arrive in the same read() batch as the FIN
                // frame that completes a message; `wait_for_frame` stops
                // at the CLOSE, but the completed message is still
                // sitting in the reassembler. Check once more before
                // reporting null, per spec.md §4.4.
                return self.reassembler.pop_message().map_err(set_last_error);
            }
        }
    }

    /// Returns the single oldest queued data frame, reading more from the
    /// socket until one is available (spec.md §4.4's `RecvFrame`).
    pub fn recv_frame(&mut self) -> Result<Option<Frame>, Error> {
        loop {
            if let Some(frame) = self.reassembler.pop_frame() {
                return Ok(Some(frame));
            }

            if !self.wait_for_frame()? {
                return Ok(self.reassembler.pop_frame());
            }
        }
    }

    /// Reads at most one buffer's worth from the socket and drains
    /// whatever whole frames are now parseable. Returns `false` once the
    /// connection has moved past `CONNECTED` (CLOSE observed, or the
    /// read timed out and the caller should stop waiting).
    fn wait_for_frame(&mut self) -> Result<bool, Error> {
        if self.state != State::Connected {
            return Ok(false);
        }

        let mut read_buf = [0u8; 4096];
        let n = match self.socket.read(&mut read_buf) {
            Ok(0) => {
                self.state = State::Closed;
                return Ok(false);
            }
            Ok(n) => n,
            Err(e) => {
                let err = Error::from(e);
                if err.kind() == ErrorKind::Timeout {
                    set_last_error(err);
                    return Ok(false);
                }
                self.state = State::Closed;
                return Err(set_last_error(err));
            }
        };
        self.recv_buffer.extend(&read_buf[..n]);

        let report = ingress::drain(&mut self.socket, &mut self.recv_buffer, &mut self.reassembler)
            .map_err(set_last_error)?;

        let max_message_size = self.config.web_socket_config.max_message_size;
        let queued = self.reassembler.queued_payload_len();
        if queued > max_message_size {
            self.state = State::Closed;
            return Err(set_last_error(Error::MaxMessageSizeExceeded(queued, max_message_size)));
        }

        if let Some(peer_code) = report.close_received {
            log::debug!("peer closed connection, status={:?}", peer_code);
            self.state = State::Closing;
            self.finish_close();
            return Ok(false);
        }

        Ok(true)
    }

    /// Gracefully closes the connection: runs the disconnect hook, sends
    /// a CLOSE frame with status 1000, and shuts down the socket.
    /// Idempotent (spec.md §4.6).
    pub fn disconnect(&mut self) -> Result<(), Error> {
        if self.state == State::Closed {
            return Ok(());
        }

        if let Some(hook) = self.on_disconnect.as_mut() {
            hook();
        }

        if self.state == State::Connected {
            let close = Frame::close(CloseCode::Normal);
            match codec::serialize(&close) {
                Ok(wire) => {
                    if let Err(e) = self.socket.write_all_timeout(&wire) {
                        log::warn!("failed to send CLOSE during disconnect: {}", e);
                    }
                }
                Err(e) => log::warn!("failed to serialize CLOSE during disconnect: {}", e),
            }
        }

        self.finish_close();
        Ok(())
    }

    fn finish_close(&mut self) {
        self.state = State::Closed;
        self.recv_buffer.clear();
        let _ = self.socket.shutdown();
    }
}

impl Drop for Connection {
    fn drop(&mut self) {
        let _ = self.disconnect();
    }
}
