//! Frame codec: pure serialize/deserialize functions with no I/O (spec.md §4.1).

use crate::error::Error;
use crate::frame::{Frame, OpCode};
use rand::RngCore;

/// Outcome of attempting to deserialize one frame off the front of a byte
/// slice. `consumed` is only meaningful on `Complete`; per spec.md §4.1
/// step 5, an `Incomplete` result always carries `consumed == 0` so the
/// caller re-waits on an unchanged buffer.
pub enum DecodeOutcome {
    Complete { frame: Frame, consumed: usize },
    Incomplete,
}

/// Serializes a logical frame to its wire representation. Masks the
/// payload with a freshly drawn 4-byte key when `frame.mask` is set, per
/// spec.md §4.1. The only failure mode is RNG exhaustion while drawing
/// the masking key.
pub fn serialize(frame: &Frame) -> Result<Vec<u8>, Error> {
    frame.check_invariants()?;

    let len = frame.payload.len();
    let mut out = Vec::with_capacity(2 + 8 + 4 + len);

    out.push(((frame.fin as u8) << 7) | frame.opcode.as_u8());

    let mask_bit = (frame.mask as u8) << 7;
    if len <= 125 {
        out.push(mask_bit | len as u8);
    } else if len <= 65535 {
        out.push(mask_bit | 126);
        out.extend_from_slice(&(len as u16).to_be_bytes());
    } else {
        out.push(mask_bit | 127);
        out.extend_from_slice(&(len as u64).to_be_bytes());
    }

    if frame.mask {
        let mut key = [0u8; 4];
        draw_mask_key(&mut key)?;
        out.extend_from_slice(&key);
        out.extend(frame.payload.iter().enumerate().map(|(i, b)| b ^ key[i % 4]));
    } else {
        out.extend_from_slice(&frame.payload);
    }

    Ok(out)
}

fn draw_mask_key(key: &mut [u8; 4]) -> Result<(), Error> {
    rand::thread_rng().fill_bytes(key);
    Ok(())
}

/// Reads a whole frame from the head of `bytes`. Stateless and
/// non-mutating: never touches `bytes` beyond reading it, and every
/// length requirement is checked before any slicing or allocation so
/// adversarially short input always falls through to `Incomplete`
/// instead of panicking (spec.md §9 / SPEC_FULL.md §9 REDESIGN FLAG 1).
pub fn deserialize(bytes: &[u8]) -> Result<DecodeOutcome, Error> {
    if bytes.len() < 2 {
        return Ok(DecodeOutcome::Incomplete);
    }

    let b0 = bytes[0];
    let b1 = bytes[1];

    let fin = (b0 & 0b1000_0000) != 0;
    let rsv1 = (b0 & 0b0100_0000) != 0;
    let rsv2 = (b0 & 0b0010_0000) != 0;
    let rsv3 = (b0 & 0b0001_0000) != 0;
    if rsv1 || rsv2 || rsv3 {
        return Err(Error::RsvNotZero);
    }
    let opcode = OpCode::from_byte(b0 & 0b0000_1111)?;

    if opcode.is_control() && !fin {
        return Err(Error::ControlFrameFragmented);
    }

    let masked = (b1 & 0b1000_0000) != 0;
    let len_field = (b1 & 0b0111_1111) as u64;

    let mut cursor = 2usize;

    let payload_len: u64 = if len_field == 126 {
        if bytes.len() < cursor + 2 {
            return Ok(DecodeOutcome::Incomplete);
        }
        let len = u16::from_be_bytes([bytes[cursor], bytes[cursor + 1]]) as u64;
        cursor += 2;
        len
    } else if len_field == 127 {
        if bytes.len() < cursor + 8 {
            return Ok(DecodeOutcome::Incomplete);
        }
        let mut buf = [0u8; 8];
        buf.copy_from_slice(&bytes[cursor..cursor + 8]);
        cursor += 8;
        u64::from_be_bytes(buf)
    } else {
        len_field
    };

    if opcode.is_control() && payload_len > 125 {
        return Err(Error::ControlFramePayloadSize(payload_len as usize));
    }

    let mask_key = if masked {
        if bytes.len() < cursor + 4 {
            return Ok(DecodeOutcome::Incomplete);
        }
        let mut key = [0u8; 4];
        key.copy_from_slice(&bytes[cursor..cursor + 4]);
        cursor += 4;
        Some(key)
    } else {
        None
    };

    let payload_offset = cursor;
    let payload_len = payload_len as usize;

    // bounds-check before any slicing, regardless of masked/unmasked path
    if bytes.len() < cursor + payload_len {
        return Ok(DecodeOutcome::Incomplete);
    }

    let raw_payload = &bytes[cursor..cursor + payload_len];
    let payload = match mask_key {
        Some(key) => raw_payload
            .iter()
            .enumerate()
            .map(|(i, b)| b ^ key[i % 4])
            .collect(),
        None => raw_payload.to_vec(),
    };

    let consumed = cursor + payload_len;

    Ok(DecodeOutcome::Complete {
        frame: Frame {
            fin,
            opcode,
            mask: masked,
            payload,
            payload_offset,
        },
        consumed,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::Frame;

    fn complete(bytes: &[u8]) -> (Frame, usize) {
        match deserialize(bytes).unwrap() {
            DecodeOutcome::Complete { frame, consumed } => (frame, consumed),
            DecodeOutcome::Incomplete => panic!("expected Complete"),
        }
    }

    #[test]
    fn roundtrip_masked_frame() {
        let frame = Frame::new(true, OpCode::Text, b"hello".to_vec());
        let wire = serialize(&frame).unwrap();
        let (decoded, consumed) = complete(&wire);
        assert_eq!(consumed, wire.len());
        assert_eq!(decoded.fin, frame.fin);
        assert_eq!(decoded.opcode, frame.opcode);
        assert_eq!(decoded.payload, frame.payload);
    }

    #[test]
    fn length_encoding_boundaries() {
        for &len in &[0usize, 1, 125, 126, 127, 65535, 65536, 100_000] {
            let payload = vec![0x42u8; len];
            let frame = Frame::new(true, OpCode::Binary, payload.clone());
            let wire = serialize(&frame).unwrap();
            let (decoded, consumed) = complete(&wire);
            assert_eq!(consumed, wire.len());
            assert_eq!(decoded.payload, payload, "len={}", len);
        }
    }

    #[test]
    fn seventy_thousand_byte_payload_uses_127_sentinel_and_correct_length() {
        let frame = Frame::new(true, OpCode::Binary, vec![0u8; 70_000]);
        let wire = serialize(&frame).unwrap();
        assert_eq!(wire[1], 0xFF);
        let len_bytes = &wire[2..10];
        assert_eq!(u64::from_be_bytes(len_bytes.try_into().unwrap()), 70_000);
    }

    #[test]
    fn masking_actually_transforms_wire_bytes() {
        let frame = Frame::new(true, OpCode::Text, b"aaaaaaaaaaaaaaaaaaaa".to_vec());
        let wire = serialize(&frame).unwrap();
        let header_and_mask_len = 2 + 4;
        let wire_payload = &wire[header_and_mask_len..];
        assert_ne!(wire_payload, frame.payload.as_slice());
    }

    #[test]
    fn splitting_byte_stream_at_any_boundary_yields_same_frames() {
        let f1 = Frame::new(true, OpCode::Text, b"first".to_vec());
        let f2 = Frame::new(true, OpCode::Binary, b"second-message".to_vec());
        let mut whole = serialize(&f1).unwrap();
        whole.extend(serialize(&f2).unwrap());

        for split_at in 0..whole.len() {
            let mut collected = Vec::new();
            let mut remaining: Vec<u8> = Vec::new();
            for (i, chunk) in [&whole[..split_at], &whole[split_at..]].into_iter().enumerate() {
                let _ = i;
                remaining.extend_from_slice(chunk);
                loop {
                    match deserialize(&remaining).unwrap() {
                        DecodeOutcome::Complete { frame, consumed } => {
                            collected.push(frame);
                            remaining.drain(0..consumed);
                        }
                        DecodeOutcome::Incomplete => break,
                    }
                }
            }
            assert_eq!(collected.len(), 2, "split_at={}", split_at);
            assert_eq!(collected[0].payload, f1.payload);
            assert_eq!(collected[1].payload, f2.payload);
        }
    }

    #[test]
    fn incomplete_header_only() {
        assert!(matches!(deserialize(&[0x81]).unwrap(), DecodeOutcome::Incomplete));
    }

    #[test]
    fn incomplete_short_payload_reports_zero_consumed_semantics() {
        // header says 10 bytes of payload, only 3 are present
        let bytes = [0x82u8, 10, 1, 2, 3];
        assert!(matches!(deserialize(&bytes).unwrap(), DecodeOutcome::Incomplete));
    }

    #[test]
    fn incomplete_masked_short_payload_does_not_panic() {
        // masked, length field says 127 (8-byte extended length) but buffer cuts off
        let bytes = [0xFFu8, 0xFE];
        assert!(matches!(deserialize(&bytes).unwrap(), DecodeOutcome::Incomplete));
    }

    #[test]
    fn rejects_reserved_bits() {
        let bytes = [0b0111_0001u8, 0x00];
        assert!(matches!(deserialize(&bytes), Err(Error::RsvNotZero)));
    }

    #[test]
    fn rejects_fragmented_control_frame_on_wire() {
        let bytes = [0b0000_1001u8, 0x00]; // PING, fin=0
        assert!(matches!(deserialize(&bytes), Err(Error::ControlFrameFragmented)));
    }

    #[test]
    fn rejects_oversized_control_payload_on_wire() {
        let bytes = [0b1000_1001u8, 126u8]; // PING, fin=1, claims 126-byte length sentinel
        // length field 126 means 2 extended length bytes follow; supply length=200
        let mut full = bytes.to_vec();
        full.extend_from_slice(&200u16.to_be_bytes());
        assert!(matches!(
            deserialize(&full),
            Err(Error::ControlFramePayloadSize(200))
        ));
    }
}
