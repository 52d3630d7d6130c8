//! The connection's receive-side byte buffer. Grows geometrically and
//! drains from the front as whole frames are parsed off it (spec.md §5
//! "Buffer discipline").

use bytes::BytesMut;

const GROWTH_FACTOR: f64 = 1.5;

/// A growable byte buffer matching the semantics spec.md §5 describes for
/// the generic buffer collaborator: factor-1.5 geometric growth, drained
/// from the front by a memmove-equivalent (`BytesMut::advance`) after
/// each complete frame parse, and explicitly clearable on disconnect.
pub struct RecvBuffer {
    inner: BytesMut,
}

impl RecvBuffer {
    pub fn new() -> Self {
        Self {
            inner: BytesMut::with_capacity(4096),
        }
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.inner
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Appends freshly read bytes, growing the backing allocation by
    /// factor 1.5 when the incoming data would overflow spare capacity.
    pub fn extend(&mut self, data: &[u8]) {
        let required = self.inner.len() + data.len();
        if required > self.inner.capacity() {
            let mut new_capacity = self.inner.capacity().max(4096);
            while new_capacity < required {
                new_capacity = ((new_capacity as f64) * GROWTH_FACTOR).ceil() as usize;
            }
            self.inner.reserve(new_capacity - self.inner.len());
        }
        self.inner.extend_from_slice(data);
    }

    /// Drains `consumed` bytes from the front of the buffer, shifting
    /// remaining bytes left rather than reallocating.
    pub fn drain_front(&mut self, consumed: usize) {
        let _ = self.inner.split_to(consumed.min(self.inner.len()));
    }

    /// Explicit clear, used on disconnect mid-handshake (spec.md §5) to
    /// avoid a subsequent connect seeing stale bytes.
    pub fn clear(&mut self) {
        self.inner.clear();
    }
}

impl Default for RecvBuffer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extend_then_drain_front_preserves_remaining_bytes() {
        let mut buf = RecvBuffer::new();
        buf.extend(b"hello world");
        buf.drain_front(6);
        assert_eq!(buf.as_slice(), b"world");
    }

    #[test]
    fn clear_empties_buffer() {
        let mut buf = RecvBuffer::new();
        buf.extend(b"leftover handshake bytes");
        buf.clear();
        assert!(buf.is_empty());
    }

    #[test]
    fn grows_to_fit_large_append() {
        let mut buf = RecvBuffer::new();
        let big = vec![0x7Au8; 1_000_000];
        buf.extend(&big);
        assert_eq!(buf.len(), big.len());
    }
}
