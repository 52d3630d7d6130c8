//! The TCP/TLS socket collaborator. Out of scope per spec.md §1 — this
//! module exists only because `Connection` needs a concrete type to hold
//! and the handshake needs somewhere to read/write through. Nothing here
//! is part of the protocol engine under test; `socket.c`/`vws_socket_*`
//! in the original C source is the analogous boundary.

use crate::error::Error;
use std::fs::File;
use std::io::{self, BufReader, Read, Write};
use std::net::{TcpStream, ToSocketAddrs};
use std::sync::Arc;
use std::time::Duration;

/// The narrow interface the protocol engine consumes from the socket
/// layer (spec.md §6): blocking reads/writes with a configurable
/// timeout, connect, and timeout reconfiguration.
pub trait Socket: Read + Write {
    fn set_timeout(&mut self, timeout: Option<Duration>) -> Result<(), Error>;

    /// Writes the entire buffer, looping until done or erroring, per
    /// spec.md §4.5's "sender loops until all bytes are written".
    fn write_all_timeout(&mut self, data: &[u8]) -> Result<(), Error> {
        self.write_all(data).map_err(Error::from)
    }
}

/// A plain-TCP or TLS-over-TCP stream, chosen at connect time by the
/// `ws`/`wss` URL scheme. Composition, not inheritance, per spec.md §9's
/// design note: `Connection` owns one of these rather than embedding a
/// base socket struct.
pub enum TcpSocket {
    Plain(TcpStream),
    Tls(Box<rustls::StreamOwned<rustls::ClientConnection, TcpStream>>),
}

impl TcpSocket {
    /// Opens a TCP connection to `host:port`, optionally wrapping it in a
    /// TLS client session when `use_tls` is set. Mirrors the C source's
    /// `vws_socket_connect(host, port, ssl)` signature.
    pub fn connect(host: &str, port: u16, use_tls: bool) -> Result<Self, Error> {
        Self::connect_with_ca(host, port, use_tls, None)
    }

    /// As `connect`, but additionally trusts the root certificates in the
    /// PEM file at `ca_file`, for servers using a private CA (carried
    /// over from the teacher's `ClientConfig::ca_file`).
    pub fn connect_with_ca(host: &str, port: u16, use_tls: bool, ca_file: Option<&str>) -> Result<Self, Error> {
        let addr = (host, port)
            .to_socket_addrs()
            .map_err(Error::from)?
            .next()
            .ok_or_else(|| Error::Socket(format!("no addresses resolved for {}:{}", host, port)))?;

        let stream = TcpStream::connect(addr).map_err(Error::from)?;

        if !use_tls {
            return Ok(TcpSocket::Plain(stream));
        }

        let mut root_store = rustls::RootCertStore::empty();
        root_store.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());
        if let Some(path) = ca_file {
            let file = File::open(path).map_err(Error::from)?;
            let mut reader = BufReader::new(file);
            for cert in rustls_pemfile::certs(&mut reader) {
                let cert = cert.map_err(Error::from)?;
                root_store
                    .add(cert)
                    .map_err(|e| Error::Tls(format!("invalid CA certificate in {}: {}", path, e)))?;
            }
        }
        let config = rustls::ClientConfig::builder()
            .with_root_certificates(root_store)
            .with_no_client_auth();

        let server_name = rustls::pki_types::ServerName::try_from(host.to_string())
            .map_err(|e| Error::Tls(e.to_string()))?;

        let conn = rustls::ClientConnection::new(Arc::new(config), server_name)
            .map_err(|e| Error::Tls(e.to_string()))?;

        Ok(TcpSocket::Tls(Box::new(rustls::StreamOwned::new(conn, stream))))
    }

    fn tcp_stream(&self) -> &TcpStream {
        match self {
            TcpSocket::Plain(s) => s,
            TcpSocket::Tls(s) => &s.sock,
        }
    }

    pub fn shutdown(&self) -> io::Result<()> {
        self.tcp_stream().shutdown(std::net::Shutdown::Both)
    }
}

impl Read for TcpSocket {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            TcpSocket::Plain(s) => s.read(buf),
            TcpSocket::Tls(s) => s.read(buf),
        }
    }
}

impl Write for TcpSocket {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            TcpSocket::Plain(s) => s.write(buf),
            TcpSocket::Tls(s) => s.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            TcpSocket::Plain(s) => s.flush(),
            TcpSocket::Tls(s) => s.flush(),
        }
    }
}

impl Socket for TcpSocket {
    fn set_timeout(&mut self, timeout: Option<Duration>) -> Result<(), Error> {
        self.tcp_stream()
            .set_read_timeout(timeout)
            .map_err(Error::from)?;
        self.tcp_stream()
            .set_write_timeout(timeout)
            .map_err(Error::from)
    }
}
