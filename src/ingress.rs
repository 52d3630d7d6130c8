//! Drains a connection's receive buffer, producing whole frames and
//! dispatching each one (spec.md §4.2).

use crate::buffer::RecvBuffer;
use crate::codec::{self, DecodeOutcome};
use crate::control::{self, ControlOutcome};
use crate::error::Error;
use crate::frame::OpCode;
use crate::message::CloseCode;
use crate::reassembler::Reassembler;
use crate::socket::Socket;

/// What happened while draining the buffer this call.
pub struct DrainReport {
    pub bytes_consumed: usize,
    pub close_received: Option<Option<CloseCode>>,
}

/// Repeatedly deserializes whole frames off the front of `buffer`,
/// dispatching control frames immediately via `control::dispatch` and
/// pushing data frames onto `reassembler`. Stops as soon as the buffer
/// yields `Incomplete` (partial frame, wait for more bytes) or a CLOSE is
/// observed (spec.md §4.2, §4.3).
///
/// Mirrors the ingress parser's "never mutate input, report total bytes
/// consumed this call" contract: on an `Error`, returns the error and the
/// caller treats the connection as heading toward timeout/disconnect
/// rather than retrying forever.
pub fn drain(
    socket: &mut dyn Socket,
    buffer: &mut RecvBuffer,
    reassembler: &mut Reassembler,
) -> Result<DrainReport, Error> {
    let mut bytes_consumed = 0;
    let mut close_received = None;

    loop {
        let outcome = codec::deserialize(buffer.as_slice())?;
        let (frame, consumed) = match outcome {
            DecodeOutcome::Complete { frame, consumed } => (frame, consumed),
            DecodeOutcome::Incomplete => break,
        };

        // Inbound frames from a server must never be masked (SPEC_FULL.md
        // §9 REDESIGN FLAG 2): accepting one would silently XOR server
        // data with whatever key bits happened to be on the wire.
        if frame.mask {
            return Err(Error::UnexpectedMaskedFrame);
        }

        log::trace!("parsed inbound frame: opcode={:?} fin={} len={}", frame.opcode, frame.fin, frame.payload.len());

        buffer.drain_front(consumed);
        bytes_consumed += consumed;

        match control::dispatch(socket, &frame)? {
            ControlOutcome::NotControl => {
                reassembler.push(frame)?;
            }
            ControlOutcome::Ponged | ControlOutcome::PongDiscarded => {}
            ControlOutcome::Closed { peer_code } => {
                close_received = Some(peer_code);
                break;
            }
        }
    }

    Ok(DrainReport {
        bytes_consumed,
        close_received,
    })
}
