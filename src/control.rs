//! Control-frame dispatch: respond to PING, discard PONG, transition on
//! CLOSE (spec.md §4.3).

use crate::error::Error;
use crate::frame::{Frame, OpCode};
use crate::message::CloseCode;
use crate::socket::Socket;
use std::io::Write;

/// What the caller (`ingress.rs`) should do after a control frame has
/// been handled.
pub enum ControlOutcome {
    /// Frame was a data frame (or unknown opcode, already dropped) and
    /// should be handed to the reassembler / ignored respectively.
    NotControl,
    /// A PING was answered with a PONG.
    Ponged,
    /// A PONG was received and silently discarded.
    PongDiscarded,
    /// A CLOSE was received; the connection should transition to CLOSING
    /// and the caller should stop reading further frames.
    Closed { peer_code: Option<CloseCode> },
}

/// Dispatches a single inbound frame by opcode, per spec.md §4.3:
/// - TEXT/BINARY/CONTINUATION: not handled here, returns `NotControl`.
/// - PING: echoes the payload back as PONG.
/// - PONG: discarded.
/// - CLOSE: replies with status 1000 Normal.
/// - Unknown opcode: already rejected by the codec before this point.
///
/// All outbound control replies here are best-effort: a failed PONG/CLOSE
/// write is logged but not retried (spec.md §4.3, §7) — the connection
/// proceeds toward CLOSED on the next failed operation instead.
pub fn dispatch(socket: &mut dyn Socket, frame: &Frame) -> Result<ControlOutcome, Error> {
    match frame.opcode {
        OpCode::Text | OpCode::Binary | OpCode::Continuation => Ok(ControlOutcome::NotControl),
        OpCode::Ping => {
            let pong = Frame::pong(frame.payload.clone());
            if let Err(e) = crate::codec::serialize(&pong).and_then(|bytes| socket.write_all(&bytes)) {
                log::warn!("failed to send PONG in response to PING: {}", e);
            }
            Ok(ControlOutcome::Ponged)
        }
        OpCode::Pong => Ok(ControlOutcome::PongDiscarded),
        OpCode::Close => {
            let peer_code = CloseCode::from_payload(&frame.payload);
            let reply = Frame::close(CloseCode::Normal);
            if let Err(e) = crate::codec::serialize(&reply).and_then(|bytes| socket.write_all(&bytes)) {
                log::warn!("failed to send CLOSE reply: {}", e);
            }
            Ok(ControlOutcome::Closed { peer_code })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::socket::tests::RecordingSocket;

    #[test]
    fn ping_elicits_pong_with_identical_payload() {
        let mut socket = RecordingSocket::default();
        let ping = Frame::ping(b"x".to_vec());
        let outcome = dispatch(&mut socket, &ping).unwrap();
        assert!(matches!(outcome, ControlOutcome::Ponged));

        let written = socket.written_frame();
        assert_eq!(written.opcode, OpCode::Pong);
        assert_eq!(written.payload, b"x");
    }

    #[test]
    fn pong_is_discarded_with_no_reply() {
        let mut socket = RecordingSocket::default();
        let pong = Frame::pong(Vec::new());
        let outcome = dispatch(&mut socket, &pong).unwrap();
        assert!(matches!(outcome, ControlOutcome::PongDiscarded));
        assert!(socket.writes.is_empty());
    }

    #[test]
    fn close_elicits_normal_status_reply_and_closed_outcome() {
        let mut socket = RecordingSocket::default();
        let close = Frame::new(true, OpCode::Close, CloseCode::GoingAway.to_payload());
        let outcome = dispatch(&mut socket, &close).unwrap();
        match outcome {
            ControlOutcome::Closed { peer_code } => {
                assert_eq!(peer_code, Some(CloseCode::GoingAway))
            }
            _ => panic!("expected Closed"),
        }

        let written = socket.written_frame();
        assert_eq!(written.opcode, OpCode::Close);
        assert_eq!(CloseCode::from_payload(&written.payload), Some(CloseCode::Normal));
    }
}
