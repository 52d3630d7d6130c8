use std::time::Duration;

/// The default read/write timeout, per spec.md §5 ("milliseconds;
/// default 10,000").
pub const DEFAULT_TIMEOUT_MS: u64 = 10_000;

/// Client-side knobs: socket timeout and frame/message size limits.
/// `WebSocketConfig`'s defaults are carried over from the teacher's
/// `config.rs`; `timeout` is new, since the teacher's async sockets
/// never needed a client-held timeout value (tokio's `timeout()` wrapped
/// each call site instead).
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub web_socket_config: WebSocketConfig,
    pub timeout: Duration,
    /// Path to a PEM file of additional trusted root certificates,
    /// carried over from the teacher's `ClientConfig::ca_file` for
    /// connecting to servers with a private CA.
    pub ca_file: Option<String>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            web_socket_config: WebSocketConfig::default(),
            timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
            ca_file: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct WebSocketConfig {
    pub max_frame_size: usize,
    pub max_message_size: usize,
}

impl Default for WebSocketConfig {
    fn default() -> Self {
        WebSocketConfig {
            max_message_size: 64 << 20,
            max_frame_size: 16 << 20,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_timeout_is_ten_seconds() {
        assert_eq!(ClientConfig::default().timeout, Duration::from_secs(10));
    }
}
