use std::cell::RefCell;
use std::io;
use std::string::FromUtf8Error;
use thiserror::Error;
use url::ParseError;

/// Severity/retry classification surfaced to callers, per the error
/// taxonomy in spec.md §7. `None` is not produced by any `Error` variant;
/// it is only the thread-local last-error's cleared state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    None,
    Warn,
    Timeout,
    Sys,
    Rt,
    Socket,
    Mem,
    Fatal,
}

#[derive(Error, Debug)]
pub enum Error {
    /// Wraps any I/O failure from the socket collaborator. `kind()`
    /// reclassifies `io::ErrorKind::TimedOut`/`WouldBlock` as
    /// `ErrorKind::Timeout` and everything else as `ErrorKind::Socket`,
    /// matching spec.md §6's `write`/`read` timeout contract.
    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: io::Error,
    },

    #[error("socket I/O error: {0}")]
    Socket(String),

    #[error("TLS error: {0}")]
    Tls(String),

    #[error("{0}")]
    FromUtf8Error(#[from] FromUtf8Error),

    // Handshake errors
    #[error("server didn't respond with HTTP 101 Switching Protocols")]
    NoUpgrade,

    #[error("Upgrade: websocket header missing from server response")]
    NoUpgradeHeaderPresent,

    #[error("Connection: Upgrade header missing from server response")]
    NoConnectionHeaderPresent,

    #[error("Sec-WebSocket-Accept header missing from server response")]
    NoSecWebsocketAccept,

    #[error("Handshake verification failed: Sec-WebSocket-Accept did not match the computed value")]
    InvalidAcceptKey,

    #[error("{0}")]
    HttpParseError(String),

    #[error("HTTP response headers incomplete after reading the maximum handshake buffer")]
    IncompleteHttpResponse,

    // Framing errors
    #[error("reserved bit set with no extension negotiated")]
    RsvNotZero,

    #[error("control frames must not be fragmented")]
    ControlFrameFragmented,

    #[error("control frame payload size {0} exceeds 125 bytes")]
    ControlFramePayloadSize(usize),

    #[error("inbound frame was masked; servers must not mask frames")]
    UnexpectedMaskedFrame,

    #[error("invalid opcode: {0:#x}")]
    InvalidOpcode(u8),

    #[error("frame payload length {0} exceeds the configured maximum frame size {1}")]
    MaxFrameSizeExceeded(u64, usize),

    #[error("reassembled message size {0} exceeds the configured maximum message size {1}")]
    MaxMessageSizeExceeded(usize, usize),

    // Fragmentation errors
    #[error("a Text/Binary frame arrived while a fragmented message was already in progress")]
    FragmentedInProgress,

    #[error("a non-final Text/Binary frame arrived but the preceding message was not yet closed")]
    InvalidFrameFragmentation,

    #[error("a Continuation frame arrived with no fragmented message in progress")]
    InvalidContinuationFrame,

    // URL / handshake construction errors
    #[error("{0}")]
    UrlParseError(#[from] ParseError),

    #[error("URL scheme must be ws or wss")]
    InvalidSchemeUrl,

    #[error("URL has no host")]
    UrlNoHost,

    // Connection state errors
    #[error("operation attempted on a closed connection")]
    ConnectionClosed,

    #[error("connection is already open")]
    AlreadyConnected,

    #[error("random number generator failed: {0}")]
    RngFailure(String),

    #[error("allocation failure")]
    AllocationFailure,
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        use Error::*;
        match self {
            Io { source } => match source.kind() {
                io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock => ErrorKind::Timeout,
                _ => ErrorKind::Socket,
            },
            Socket(_) => ErrorKind::Socket,
            Tls(_) => ErrorKind::Socket,
            FromUtf8Error(_) => ErrorKind::Rt,
            NoUpgrade
            | NoUpgradeHeaderPresent
            | NoConnectionHeaderPresent
            | NoSecWebsocketAccept
            | InvalidAcceptKey
            | HttpParseError(_)
            | IncompleteHttpResponse => ErrorKind::Rt,
            RsvNotZero
            | ControlFrameFragmented
            | ControlFramePayloadSize(_)
            | UnexpectedMaskedFrame
            | InvalidOpcode(_)
            | FragmentedInProgress
            | InvalidFrameFragmentation
            | InvalidContinuationFrame => ErrorKind::Rt,
            MaxFrameSizeExceeded(_, _) | MaxMessageSizeExceeded(_, _) => ErrorKind::Rt,
            UrlParseError(_) | InvalidSchemeUrl | UrlNoHost => ErrorKind::Rt,
            ConnectionClosed | AlreadyConnected => ErrorKind::Rt,
            RngFailure(_) => ErrorKind::Rt,
            AllocationFailure => ErrorKind::Mem,
        }
    }
}

impl From<httparse::Error> for Error {
    fn from(source: httparse::Error) -> Self {
        Error::HttpParseError(source.to_string())
    }
}

thread_local! {
    static LAST_ERROR: RefCell<Option<(ErrorKind, String)>> = RefCell::new(None);
}

/// Records `err` as this thread's last error, mirroring the per-thread
/// last-error surface the C source keeps via thread-local storage
/// (spec.md §5, §9). Most callers should just propagate the `Result`;
/// this exists for the C-compatible boundary callers that poll a
/// sentinel return value instead. Returns `err` back to the caller so it
/// can be used in a `return Err(set_last_error(e))` chain without
/// dropping it.
pub fn set_last_error(err: Error) -> Error {
    let kind = err.kind();
    let message = err.to_string();
    log::debug!("last-error set: kind={:?} message={}", kind, message);
    LAST_ERROR.with(|cell| *cell.borrow_mut() = Some((kind, message)));
    err
}

/// Returns this thread's last error kind, or `ErrorKind::None` if clear.
pub fn last_error_kind() -> ErrorKind {
    LAST_ERROR.with(|cell| cell.borrow().as_ref().map(|(kind, _)| *kind).unwrap_or(ErrorKind::None))
}

/// Returns this thread's last error message, if any.
pub fn last_error_message() -> Option<String> {
    LAST_ERROR.with(|cell| cell.borrow().as_ref().map(|(_, msg)| msg.clone()))
}

pub fn clear_last_error() {
    LAST_ERROR.with(|cell| *cell.borrow_mut() = None);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_classification_spot_checks() {
        assert_eq!(Error::InvalidOpcode(0x3).kind(), ErrorKind::Rt);
        assert_eq!(Error::AllocationFailure.kind(), ErrorKind::Mem);
        assert_eq!(Error::Socket("reset".into()).kind(), ErrorKind::Socket);
    }

    #[test]
    fn last_error_starts_clear() {
        clear_last_error();
        assert_eq!(last_error_kind(), ErrorKind::None);
    }
}
