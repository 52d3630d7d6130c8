//! The client handshake sub-protocol: key generation, GET Upgrade
//! request, response parsing via the external HTTP parser, and Accept
//! verification (spec.md §4.5).

use crate::buffer::RecvBuffer;
use crate::error::Error;
use crate::request::WsUrl;
use crate::socket::Socket;
use base64::prelude::*;
use rand::RngCore;
use sha1::{Digest, Sha1};
use std::io::Read;

const WEBSOCKET_GUID: &str = "258EAFA5-E914-47DA-95CA-C5AB0DC85B11";
const MAX_RESPONSE_BYTES: usize = 16 * 1024;

/// 16 cryptographically random bytes, Base64-encoded without newlines,
/// padding retained — 24 characters, per spec.md §4.5.
pub fn generate_client_key() -> Result<String, Error> {
    let mut nonce = [0u8; 16];
    rand::thread_rng().try_fill_bytes(&mut nonce).map_err(|e| Error::RngFailure(e.to_string()))?;
    Ok(BASE64_STANDARD.encode(nonce))
}

/// `Base64(SHA1(client_key || GUID))`, the value the server's
/// `Sec-WebSocket-Accept` header must match byte-for-byte.
pub fn compute_accept(client_key: &str) -> String {
    let mut hasher = Sha1::new();
    hasher.update(client_key.as_bytes());
    hasher.update(WEBSOCKET_GUID.as_bytes());
    BASE64_STANDARD.encode(hasher.finalize())
}

/// Builds the exact GET Upgrade request byte template from spec.md §4.5,
/// CRLF line endings throughout.
pub fn build_request(url: &WsUrl, client_key: &str) -> Vec<u8> {
    format!(
        "GET {path} HTTP/1.1\r\n\
         Host: {host}\r\n\
         Cache-Control: no-cache\r\n\
         Origin: {origin}\r\n\
         Upgrade: websocket\r\n\
         Connection: Upgrade\r\n\
         Sec-WebSocket-Key: {key}\r\n\
         Sec-WebSocket-Version: 13\r\n\
         \r\n",
        path = url.path,
        host = url.host_header(),
        origin = url.origin,
        key = client_key,
    )
    .into_bytes()
}

/// Performs the full client-side handshake over an already-connected
/// socket: sends the Upgrade request, reads and parses the HTTP
/// response via `httparse`, and verifies `Sec-WebSocket-Accept`. Bytes
/// read past the header terminator are left in `recv_buffer` — they are
/// the first bytes of the WebSocket-framed stream.
pub fn perform_client_handshake(
    socket: &mut dyn Socket,
    url: &WsUrl,
    client_key: &str,
    recv_buffer: &mut RecvBuffer,
) -> Result<(), Error> {
    let request = build_request(url, client_key);
    socket.write_all_timeout(&request)?;

    let mut raw = Vec::new();
    let mut read_buf = [0u8; 4096];
    let headers_end;
    loop {
        if raw.len() > MAX_RESPONSE_BYTES {
            return Err(Error::IncompleteHttpResponse);
        }

        let n = socket.read(&mut read_buf)?;
        if n == 0 {
            return Err(Error::IncompleteHttpResponse);
        }
        raw.extend_from_slice(&read_buf[..n]);

        let mut headers = [httparse::EMPTY_HEADER; 32];
        let mut response = httparse::Response::new(&mut headers);
        match response.parse(&raw)? {
            httparse::Status::Complete(consumed) => {
                headers_end = consumed;
                break;
            }
            httparse::Status::Partial => continue,
        }
    }

    // leftover bytes after the header terminator belong to the WebSocket
    // framed stream and must be preserved (spec.md §4.5)
    recv_buffer.extend(&raw[headers_end..]);

    let mut headers = [httparse::EMPTY_HEADER; 32];
    let mut response = httparse::Response::new(&mut headers);
    response.parse(&raw[..headers_end])?;

    if response.code != Some(101) {
        return Err(Error::NoUpgrade);
    }

    let get_header = |name: &str| -> Option<String> {
        response
            .headers
            .iter()
            .find(|h| h.name.eq_ignore_ascii_case(name))
            .and_then(|h| std::str::from_utf8(h.value).ok())
            .map(|s| s.to_string())
    };

    let upgrade = get_header("upgrade").ok_or(Error::NoUpgradeHeaderPresent)?;
    if !upgrade.eq_ignore_ascii_case("websocket") {
        return Err(Error::NoUpgradeHeaderPresent);
    }

    let connection = get_header("connection").ok_or(Error::NoConnectionHeaderPresent)?;
    if !connection.to_ascii_lowercase().contains("upgrade") {
        return Err(Error::NoConnectionHeaderPresent);
    }

    let accept = get_header("sec-websocket-accept").ok_or(Error::NoSecWebsocketAccept)?;
    let expected = compute_accept(client_key);
    if accept != expected {
        return Err(Error::InvalidAcceptKey);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_key_is_24_base64_characters() {
        let key = generate_client_key().unwrap();
        assert_eq!(key.len(), 24);
    }

    #[test]
    fn accept_matches_rfc6455_test_vector() {
        let accept = compute_accept("dGhlIHNhbXBsZSBub25jZQ==");
        assert_eq!(accept, "s3pPLMBiTxaQ9kYGzzhZRbK+xOo=");
    }

    #[test]
    fn request_template_matches_spec_byte_layout() {
        let url = WsUrl::parse("ws://example.com:8080/chat").unwrap();
        let request = String::from_utf8(build_request(&url, "dGhlIHNhbXBsZSBub25jZQ==")).unwrap();
        assert!(request.starts_with("GET /chat HTTP/1.1\r\n"));
        assert!(request.contains("Host: example.com:8080\r\n"));
        assert!(request.contains("Upgrade: websocket\r\n"));
        assert!(request.contains("Connection: Upgrade\r\n"));
        assert!(request.contains("Sec-WebSocket-Key: dGhlIHNhbXBsZSBub25jZQ==\r\n"));
        assert!(request.contains("Sec-WebSocket-Version: 13\r\n"));
        assert!(request.ends_with("\r\n\r\n"));
    }

    #[test]
    fn successful_handshake_verifies_accept_and_preserves_trailing_bytes() {
        let url = WsUrl::parse("ws://example.com/").unwrap();
        let client_key = "dGhlIHNhbXBsZSBub25jZQ==";
        let accept = compute_accept(client_key);
        let response = format!(
            "HTTP/1.1 101 Switching Protocols\r\n\
             Upgrade: websocket\r\n\
             Connection: Upgrade\r\n\
             Sec-WebSocket-Accept: {}\r\n\r\n",
            accept
        );
        let mut trailing = response.into_bytes();
        trailing.extend_from_slice(b"\x81\x05hello");

        let mut socket = crate::socket::tests::RecordingSocket::with_script(trailing);
        let mut recv_buffer = RecvBuffer::new();
        perform_client_handshake(&mut socket, &url, client_key, &mut recv_buffer).unwrap();

        assert_eq!(recv_buffer.as_slice(), b"\x81\x05hello");
    }

    #[test]
    fn mismatched_accept_fails_handshake() {
        let url = WsUrl::parse("ws://example.com/").unwrap();
        let client_key = "dGhlIHNhbXBsZSBub25jZQ==";
        let response = "HTTP/1.1 101 Switching Protocols\r\n\
             Upgrade: websocket\r\n\
             Connection: Upgrade\r\n\
             Sec-WebSocket-Accept: not-the-right-value\r\n\r\n";
        let mut socket = crate::socket::tests::RecordingSocket::with_script(response.as_bytes().to_vec());
        let mut recv_buffer = RecvBuffer::new();
        let result = perform_client_handshake(&mut socket, &url, client_key, &mut recv_buffer);
        assert!(matches!(result, Err(Error::InvalidAcceptKey)));
    }
}
