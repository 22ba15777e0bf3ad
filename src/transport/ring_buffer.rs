//! Ring buffer for envelope accumulation
//!
//! Transport reads arrive in arbitrary chunks; the envelope parser needs to
//! skip and consume from the front without shifting the remainder. A ring
//! buffer gives O(1) advance instead of `Vec::drain`'s O(n) shift.

/// Fixed-capacity byte ring buffer with O(1) advance
///
/// Generic const parameter `N` sets buffer capacity.
pub struct RingBuffer<const N: usize> {
    data: [u8; N],
    head: usize, // Write position (next empty slot)
    tail: usize, // Read position (first valid byte)
    len: usize,  // Number of bytes available
}

impl<const N: usize> RingBuffer<N> {
    /// Create a new empty ring buffer
    pub const fn new() -> Self {
        Self {
            data: [0u8; N],
            head: 0,
            tail: 0,
            len: 0,
        }
    }

    /// Append bytes, returning how many fit
    ///
    /// The caller sizes its transport reads by `free()`, so a short return
    /// only happens if it didn't.
    pub fn extend(&mut self, bytes: &[u8]) -> usize {
        let n = bytes.len().min(N - self.len);
        for &b in &bytes[..n] {
            self.data[self.head] = b;
            self.head = (self.head + 1) % N;
            self.len += 1;
        }
        n
    }

    /// Consume n bytes from the front
    #[inline]
    pub fn advance(&mut self, n: usize) {
        let n = n.min(self.len);
        self.tail = (self.tail + n) % N;
        self.len -= n;
    }

    /// Number of bytes available to read
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the buffer holds no bytes
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Free capacity
    #[inline]
    pub fn free(&self) -> usize {
        N - self.len
    }

    /// Read byte at logical index (handles wraparound)
    #[inline]
    pub fn get(&self, index: usize) -> Option<u8> {
        if index < self.len {
            Some(self.data[(self.tail + index) % N])
        } else {
            None
        }
    }

    /// Copy `out.len()` bytes starting at logical `start` into `out`
    ///
    /// Returns false without copying if that range is not available.
    pub fn copy_to(&self, start: usize, out: &mut [u8]) -> bool {
        if start + out.len() > self.len {
            return false;
        }
        for (i, slot) in out.iter_mut().enumerate() {
            *slot = self.data[(self.tail + start + i) % N];
        }
        true
    }
}

impl<const N: usize> Default for RingBuffer<N> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_operations() {
        let mut rb: RingBuffer<16> = RingBuffer::new();
        assert!(rb.is_empty());

        assert_eq!(rb.extend(&[1, 2, 3, 4, 5]), 5);
        assert_eq!(rb.len(), 5);
        assert_eq!(rb.get(0), Some(1));
        assert_eq!(rb.get(4), Some(5));
        assert_eq!(rb.get(5), None);
    }

    #[test]
    fn test_advance() {
        let mut rb: RingBuffer<16> = RingBuffer::new();
        rb.extend(&[1, 2, 3, 4, 5]);

        rb.advance(2);
        assert_eq!(rb.len(), 3);
        assert_eq!(rb.get(0), Some(3));
    }

    #[test]
    fn test_extend_respects_capacity() {
        let mut rb: RingBuffer<4> = RingBuffer::new();
        assert_eq!(rb.extend(&[1, 2, 3, 4, 5, 6]), 4);
        assert_eq!(rb.free(), 0);
        rb.advance(2);
        assert_eq!(rb.extend(&[7, 8, 9]), 2);
        assert_eq!(rb.get(0), Some(3));
        assert_eq!(rb.get(3), Some(8));
    }

    #[test]
    fn test_copy_to_wrapped() {
        let mut rb: RingBuffer<8> = RingBuffer::new();
        rb.extend(&[1, 2, 3, 4, 5, 6]);
        rb.advance(5); // tail near the end
        rb.extend(&[7, 8, 9]); // head wraps

        let mut out = [0u8; 4];
        assert!(rb.copy_to(0, &mut out));
        assert_eq!(out, [6, 7, 8, 9]);

        let mut too_much = [0u8; 5];
        assert!(!rb.copy_to(0, &mut too_much));
    }
}
