//! Parses a `ws://`/`wss://` URL into the components the handshake
//! engine needs, and builds the GET Upgrade request (spec.md §3, §4.5).

use crate::error::Error;
use url::Url;

/// The URL components the core consumes, per spec.md §3: scheme, host,
/// port (defaulting to 80/443), path, and a synthesized origin string.
#[derive(Debug, Clone)]
pub struct WsUrl {
    pub use_tls: bool,
    pub host: String,
    pub port: u16,
    pub path: String,
    pub origin: String,
    has_explicit_port: bool,
}

impl WsUrl {
    pub fn parse(raw: &str) -> Result<Self, Error> {
        let url = Url::parse(raw)?;

        let (use_tls, default_port) = match url.scheme() {
            "ws" => (false, 80u16),
            "wss" => (true, 443u16),
            _ => return Err(Error::InvalidSchemeUrl),
        };

        let host = url.host_str().ok_or(Error::UrlNoHost)?.to_string();
        let has_explicit_port = url.port().is_some();
        let port = url.port().unwrap_or(default_port);

        let path = match url.query() {
            Some(query) => format!("{}?{}", url.path(), query),
            None => url.path().to_string(),
        };

        let origin = format!("{}://{}:{}", if use_tls { "https" } else { "http" }, host, port);

        Ok(Self {
            use_tls,
            host,
            port,
            path,
            origin,
            has_explicit_port,
        })
    }

    /// `host[:port]` suitable for the `Host:` request header; the port is
    /// only included when the URL spelled it out explicitly, matching
    /// the teacher's request-construction behavior.
    pub fn host_header(&self) -> String {
        if self.has_explicit_port {
            format!("{}:{}", self.host, self.port)
        } else {
            self.host.clone()
        }
    }
}
