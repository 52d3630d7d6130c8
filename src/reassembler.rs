//! The FIFO of inbound data frames and the logic that pops a complete
//! message off it (spec.md §4.4).

use crate::error::Error;
use crate::frame::{Frame, OpCode};
use crate::message::Message;
use std::collections::VecDeque;

/// Holds data frames (TEXT/BINARY/CONTINUATION) awaiting reassembly into
/// a logical message. Control frames never enter this queue — they are
/// handled entirely by `control.rs` before `ingress.rs` would otherwise
/// push them here.
///
/// spec.md §9 notes the source enqueues at the head and dequeues from
/// the tail; a `VecDeque` with push-back/pop-front is the same FIFO
/// contract expressed the straightforward way.
#[derive(Default)]
pub struct Reassembler {
    queue: VecDeque<Frame>,
    /// Opcode of the fragmented message currently being accumulated, if
    /// any. Tracked incrementally as frames are pushed (mirrors the
    /// teacher's `read.rs` `FragmentedMessage` field) so that a
    /// fragmentation-protocol violation is caught the moment the
    /// offending frame arrives, not only when a message is later popped.
    fragment_opcode: Option<OpCode>,
}

impl Reassembler {
    pub fn new() -> Self {
        Self {
            queue: VecDeque::new(),
            fragment_opcode: None,
        }
    }

    /// Enqueues a data frame in wire-arrival order, enforcing the
    /// fragmentation state machine spec.md §6 requires ("the protocol
    /// forbids interleaving data messages"):
    /// - a non-final Text/Binary while a fragmented message is already in
    ///   progress is `FragmentedInProgress` (teacher `read.rs:74`).
    /// - a final Text/Binary arriving mid-fragment is
    ///   `InvalidFrameFragmentation` (teacher `read.rs:127`).
    /// - a Continuation with no fragmented message in progress is
    ///   `InvalidContinuationFrame`.
    pub fn push(&mut self, frame: Frame) -> Result<(), Error> {
        match frame.opcode {
            OpCode::Text | OpCode::Binary => {
                if frame.fin {
                    if self.fragment_opcode.is_some() {
                        return Err(Error::InvalidFrameFragmentation);
                    }
                } else {
                    if self.fragment_opcode.is_some() {
                        return Err(Error::FragmentedInProgress);
                    }
                    self.fragment_opcode = Some(frame.opcode);
                }
            }
            OpCode::Continuation => {
                if self.fragment_opcode.is_none() {
                    return Err(Error::InvalidContinuationFrame);
                }
                if frame.fin {
                    self.fragment_opcode = None;
                }
            }
            _ => {}
        }

        self.queue.push_back(frame);
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Sum of payload bytes currently queued, used by `Connection` to
    /// enforce `max_message_size` without reassembling early.
    pub fn queued_payload_len(&self) -> usize {
        self.queue.iter().map(|f| f.payload.len()).sum()
    }

    /// Returns the single oldest queued frame without reassembling it,
    /// for callers that want raw frames (`Connection::recv_frame`).
    pub fn pop_frame(&mut self) -> Option<Frame> {
        self.queue.pop_front()
    }

    /// If the queue currently holds a complete message — one or more
    /// data frames ending in a FIN frame, with no interleaving of a
    /// foreign message — dequeues and reassembles it. Returns `Ok(None)`
    /// if no complete message is available yet.
    ///
    /// `push` already enforces that the queue never holds a lone
    /// `Continuation` at the head, or two interleaved fragmented
    /// messages, so this only has to reassemble.
    pub fn pop_message(&mut self) -> Result<Option<Message>, Error> {
        let has_fin = self.queue.iter().any(|f| f.fin);
        if !has_fin {
            return Ok(None);
        }

        let opcode = match self.queue.front() {
            Some(f) => f.opcode,
            None => return Ok(None),
        };
        let mut payload = Vec::new();

        loop {
            let frame = self
                .queue
                .pop_front()
                .expect("has_fin guarantees at least one frame remains");
            let is_fin = frame.fin;
            payload.extend(frame.payload);
            if is_fin {
                break;
            }
        }

        Message::from_reassembled(opcode, payload).map(Some)
    }
}
