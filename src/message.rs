use crate::error::Error;
use crate::frame::{Frame, OpCode};

/// A logical application payload, reassembled from one or more frames of
/// the same non-control opcode, terminated by a FIN frame (spec.md §3).
#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    Text(String),
    Binary(Vec<u8>),
}

impl Message {
    /// Builds a `Message` from the opcode and concatenated payload the
    /// reassembler hands back. `opcode` must be `Text` or `Binary` — a
    /// lone `Continuation` never reaches here (see reassembler.rs).
    pub fn from_reassembled(opcode: OpCode, payload: Vec<u8>) -> Result<Self, Error> {
        match opcode {
            OpCode::Text => Ok(Message::Text(String::from_utf8(payload)?)),
            OpCode::Binary => Ok(Message::Binary(payload)),
            other => Err(Error::InvalidOpcode(other.as_u8())),
        }
    }

    pub fn as_binary(&self) -> Vec<u8> {
        match self {
            Message::Text(text) => text.as_bytes().to_vec(),
            Message::Binary(data) => data.clone(),
        }
    }

    pub fn as_text(&self) -> Result<String, Error> {
        match self {
            Message::Text(text) => Ok(text.clone()),
            Message::Binary(data) => Ok(String::from_utf8(data.clone())?),
        }
    }

    pub fn opcode(&self) -> OpCode {
        match self {
            Message::Text(_) => OpCode::Text,
            Message::Binary(_) => OpCode::Binary,
        }
    }

    /// Splits the message into wire-ready frames, chunked to at most
    /// `max_frame_size` payload bytes each, with the opcode on the first
    /// frame and `Continuation` on the rest. An empty payload still
    /// produces a single FIN frame.
    pub fn to_frames(self, max_frame_size: usize) -> Vec<Frame> {
        let opcode = self.opcode();
        let payload = match self {
            Message::Text(text) => text.into_bytes(),
            Message::Binary(data) => data,
        };

        if payload.is_empty() {
            return vec![Frame::new(true, opcode, payload)];
        }

        let mut frames = Vec::new();
        for chunk in payload.chunks(max_frame_size.max(1)) {
            let chunk_opcode = if frames.is_empty() {
                opcode
            } else {
                OpCode::Continuation
            };
            frames.push(Frame::new(false, chunk_opcode, chunk.to_vec()));
        }

        if let Some(last) = frames.last_mut() {
            last.fin = true;
        }

        frames
    }
}

/// RFC 6455 §7.4.1 close status codes. The C source this crate was
/// rewritten from (`websocket.c`) enumerates the full set even though
/// this engine only ever sends `Normal`; carrying the full enum lets the
/// control responder report the status code a peer actually closed with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseCode {
    Normal,
    GoingAway,
    ProtocolError,
    Unsupported,
    NoStatus,
    Abnormal,
    InvalidPayload,
    PolicyViolation,
    TooBig,
    MissingExtension,
    InternalError,
    ServiceRestart,
    TryAgainLater,
    BadGateway,
    TlsHandshake,
    Other(u16),
}

impl CloseCode {
    pub fn code(&self) -> u16 {
        match self {
            CloseCode::Normal => 1000,
            CloseCode::GoingAway => 1001,
            CloseCode::ProtocolError => 1002,
            CloseCode::Unsupported => 1003,
            CloseCode::NoStatus => 1005,
            CloseCode::Abnormal => 1006,
            CloseCode::InvalidPayload => 1007,
            CloseCode::PolicyViolation => 1008,
            CloseCode::TooBig => 1009,
            CloseCode::MissingExtension => 1010,
            CloseCode::InternalError => 1011,
            CloseCode::ServiceRestart => 1012,
            CloseCode::TryAgainLater => 1013,
            CloseCode::BadGateway => 1014,
            CloseCode::TlsHandshake => 1015,
            CloseCode::Other(code) => *code,
        }
    }

    pub fn from_code(code: u16) -> Self {
        match code {
            1000 => CloseCode::Normal,
            1001 => CloseCode::GoingAway,
            1002 => CloseCode::ProtocolError,
            1003 => CloseCode::Unsupported,
            1005 => CloseCode::NoStatus,
            1006 => CloseCode::Abnormal,
            1007 => CloseCode::InvalidPayload,
            1008 => CloseCode::PolicyViolation,
            1009 => CloseCode::TooBig,
            1010 => CloseCode::MissingExtension,
            1011 => CloseCode::InternalError,
            1012 => CloseCode::ServiceRestart,
            1013 => CloseCode::TryAgainLater,
            1014 => CloseCode::BadGateway,
            1015 => CloseCode::TlsHandshake,
            other => CloseCode::Other(other),
        }
    }

    /// The 2-byte big-endian status code a CLOSE frame's payload begins
    /// with (spec.md §3 invariant).
    pub fn to_payload(self) -> Vec<u8> {
        self.code().to_be_bytes().to_vec()
    }

    /// Parses the status code from a CLOSE frame's payload, if present.
    pub fn from_payload(payload: &[u8]) -> Option<Self> {
        if payload.len() < 2 {
            return None;
        }
        Some(Self::from_code(u16::from_be_bytes([payload[0], payload[1]])))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_to_frames_chunks_and_sets_fin() {
        let msg = Message::Text("abcdef".to_string());
        let frames = msg.to_frames(2);
        assert_eq!(frames.len(), 3);
        assert_eq!(frames[0].opcode, OpCode::Text);
        assert!(!frames[0].fin);
        assert_eq!(frames[1].opcode, OpCode::Continuation);
        assert_eq!(frames[2].opcode, OpCode::Continuation);
        assert!(frames[2].fin);
        assert_eq!(frames[2].payload, b"ef");
    }

    #[test]
    fn empty_payload_is_single_fin_frame() {
        let frames = Message::Binary(Vec::new()).to_frames(16);
        assert_eq!(frames.len(), 1);
        assert!(frames[0].fin);
    }

    #[test]
    fn close_code_roundtrip() {
        let payload = CloseCode::Normal.to_payload();
        assert_eq!(payload, vec![0x03, 0xE8]);
        assert_eq!(CloseCode::from_payload(&payload), Some(CloseCode::Normal));
    }

    #[test]
    fn from_reassembled_rejects_control_opcode() {
        let result = Message::from_reassembled(OpCode::Ping, vec![1, 2, 3]);
        assert!(result.is_err());
    }
}
