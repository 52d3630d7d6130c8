use crate::error::Error;

/// The 4-bit opcode tag carried in the low nibble of a frame's first byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpCode {
    Continuation,
    Text,
    Binary,
    Close,
    Ping,
    Pong,
}

impl OpCode {
    pub fn from_byte(byte: u8) -> Result<Self, Error> {
        match byte {
            0x0 => Ok(OpCode::Continuation),
            0x1 => Ok(OpCode::Text),
            0x2 => Ok(OpCode::Binary),
            0x8 => Ok(OpCode::Close),
            0x9 => Ok(OpCode::Ping),
            0xA => Ok(OpCode::Pong),
            _ => Err(Error::InvalidOpcode(byte)),
        }
    }

    pub fn as_u8(&self) -> u8 {
        match self {
            OpCode::Continuation => 0x0,
            OpCode::Text => 0x1,
            OpCode::Binary => 0x2,
            OpCode::Close => 0x8,
            OpCode::Ping => 0x9,
            OpCode::Pong => 0xA,
        }
    }

    /// CLOSE, PING, and PONG are control frames: unfragmentable, payload <= 125 bytes.
    pub fn is_control(&self) -> bool {
        matches!(self, OpCode::Close | OpCode::Ping | OpCode::Pong)
    }

    pub fn is_data(&self) -> bool {
        matches!(self, OpCode::Text | OpCode::Binary | OpCode::Continuation)
    }
}

/// The maximum payload size permitted on a control frame (RFC 6455 §5.5).
pub const MAX_CONTROL_PAYLOAD: usize = 125;

/// A single WebSocket protocol unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub fin: bool,
    pub opcode: OpCode,
    pub mask: bool,
    pub payload: Vec<u8>,
    /// Offset of the payload within the raw frame this was deserialized
    /// from. Diagnostic only; zero for frames constructed by the
    /// application rather than parsed off the wire.
    pub payload_offset: usize,
}

impl Frame {
    /// Construct an unfragmented data or control frame ready to be masked
    /// and serialized by the client.
    pub fn new(fin: bool, opcode: OpCode, payload: Vec<u8>) -> Self {
        Self {
            fin,
            opcode,
            mask: true,
            payload,
            payload_offset: 0,
        }
    }

    pub fn text(payload: impl Into<Vec<u8>>) -> Self {
        Self::new(true, OpCode::Text, payload.into())
    }

    pub fn binary(payload: impl Into<Vec<u8>>) -> Self {
        Self::new(true, OpCode::Binary, payload.into())
    }

    pub fn ping(payload: Vec<u8>) -> Self {
        Self::new(true, OpCode::Ping, payload)
    }

    pub fn pong(payload: Vec<u8>) -> Self {
        Self::new(true, OpCode::Pong, payload)
    }

    pub fn close(code: crate::message::CloseCode) -> Self {
        Self::new(true, OpCode::Close, code.to_payload())
    }

    /// Validates the invariants spec.md §3 places on control frames.
    pub fn check_invariants(&self) -> Result<(), Error> {
        if self.opcode.is_control() {
            if !self.fin {
                return Err(Error::ControlFrameFragmented);
            }
            if self.payload.len() > MAX_CONTROL_PAYLOAD {
                return Err(Error::ControlFramePayloadSize(self.payload.len()));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opcode_roundtrip() {
        for (byte, op) in [
            (0x0, OpCode::Continuation),
            (0x1, OpCode::Text),
            (0x2, OpCode::Binary),
            (0x8, OpCode::Close),
            (0x9, OpCode::Ping),
            (0xA, OpCode::Pong),
        ] {
            assert_eq!(OpCode::from_byte(byte).unwrap(), op);
            assert_eq!(op.as_u8(), byte);
        }
        assert!(OpCode::from_byte(0x3).is_err());
    }

    #[test]
    fn control_classification() {
        assert!(OpCode::Close.is_control());
        assert!(OpCode::Ping.is_control());
        assert!(OpCode::Pong.is_control());
        assert!(!OpCode::Text.is_control());
        assert!(!OpCode::Binary.is_control());
        assert!(!OpCode::Continuation.is_control());
    }

    #[test]
    fn rejects_fragmented_control_frame() {
        let frame = Frame {
            fin: false,
            opcode: OpCode::Ping,
            mask: true,
            payload: Vec::new(),
            payload_offset: 0,
        };
        assert!(matches!(
            frame.check_invariants(),
            Err(Error::ControlFrameFragmented)
        ));
    }

    #[test]
    fn rejects_oversized_control_payload() {
        let frame = Frame::new(true, OpCode::Ping, vec![0u8; 126]);
        assert!(matches!(
            frame.check_invariants(),
            Err(Error::ControlFramePayloadSize(126))
        ));
    }
}
