//! Bounds-checked byte-stream buffer shared by the generated pack/unpack code
// (c) Bakelite Contributors

// Capacities and lengths flow through this crate as `u32` (the wire format's own
// range) but are compared against `usize` buffer offsets here; this must never truncate.
static_assertions::const_assert!(usize::BITS >= u32::BITS);

/// A read/write/seek failure against a [`Buffer`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum BufferError {
    /// a write would run past the end of the buffer
    #[error("write past end of buffer")]
    Write,
    /// a read would run past the end of the buffer
    #[error("read past end of buffer")]
    Read,
    /// a seek target was outside `0..=size`
    #[error("seek target out of range")]
    Seek,
}

/// Convenience alias for buffer operation results
pub type BufferResult<T> = Result<T, BufferError>;

/// A mutable byte region with a cursor, used by generated `pack`/`unpack` functions.
///
/// Mirrors the tiny-backend runtimes' buffer type: every operation is bounds-checked and
/// failures never corrupt `pos` or `data`.
#[derive(Debug)]
pub struct Buffer<'a> {
    data: &'a mut [u8],
    pos: usize,
}

impl<'a> Buffer<'a> {
    /// Wraps `data`, with the cursor at the start
    #[must_use]
    pub fn new(data: &'a mut [u8]) -> Self {
        Self { data, pos: 0 }
    }

    /// Total capacity of the wrapped region
    #[must_use]
    pub fn size(&self) -> usize {
        self.data.len()
    }

    /// Current cursor position
    #[must_use]
    pub fn pos(&self) -> usize {
        self.pos
    }

    /// Bytes remaining between the cursor and the end of the region
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    /// Moves the cursor to `pos`, which must be `<= size()`
    ///
    /// # Errors
    /// Returns [`BufferError::Seek`] if `pos` is out of range.
    pub fn seek(&mut self, pos: usize) -> BufferResult<()> {
        if pos > self.data.len() {
            return Err(BufferError::Seek);
        }
        self.pos = pos;
        Ok(())
    }

    /// Writes `bytes` at the cursor and advances it
    ///
    /// # Errors
    /// Returns [`BufferError::Write`] without writing anything if `bytes` would not fit.
    pub fn write(&mut self, bytes: &[u8]) -> BufferResult<()> {
        if bytes.len() > self.remaining() {
            return Err(BufferError::Write);
        }
        let end = self.pos + bytes.len();
        self.data[self.pos..end].copy_from_slice(bytes);
        self.pos = end;
        Ok(())
    }

    /// Writes a single byte at the cursor and advances it
    ///
    /// # Errors
    /// Returns [`BufferError::Write`] if the buffer is full.
    pub fn write_u8(&mut self, byte: u8) -> BufferResult<()> {
        self.write(&[byte])
    }

    /// Reads exactly `len` bytes from the cursor and advances it
    ///
    /// # Errors
    /// Returns [`BufferError::Read`] if fewer than `len` bytes remain.
    pub fn read(&mut self, len: usize) -> BufferResult<&[u8]> {
        if len > self.remaining() {
            return Err(BufferError::Read);
        }
        let start = self.pos;
        self.pos += len;
        Ok(&self.data[start..self.pos])
    }

    /// Reads a single byte from the cursor and advances it
    ///
    /// # Errors
    /// Returns [`BufferError::Read`] if the buffer is exhausted.
    pub fn read_u8(&mut self) -> BufferResult<u8> {
        Ok(self.read(1)?[0])
    }

    /// The unread tail of the region, without advancing the cursor
    #[must_use]
    pub fn peek_remaining(&self) -> &[u8] {
        &self.data[self.pos..]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_then_read_roundtrips() {
        let mut storage = [0u8; 8];
        {
            let mut buf = Buffer::new(&mut storage);
            buf.write(&[1, 2, 3]).unwrap();
            assert_eq!(buf.pos(), 3);
        }
        let mut buf = Buffer::new(&mut storage);
        assert_eq!(buf.read(3).unwrap(), &[1, 2, 3]);
    }

    #[test]
    fn write_past_end_fails_without_partial_write() {
        let mut storage = [0u8; 2];
        let mut buf = Buffer::new(&mut storage);
        assert_eq!(buf.write(&[1, 2, 3]), Err(BufferError::Write));
        assert_eq!(buf.pos(), 0);
    }

    #[test]
    fn read_past_end_fails() {
        let mut storage = [1u8, 2];
        let mut buf = Buffer::new(&mut storage);
        assert_eq!(buf.read(5), Err(BufferError::Read));
    }

    #[test]
    fn seek_out_of_range_fails() {
        let mut storage = [0u8; 4];
        let mut buf = Buffer::new(&mut storage);
        assert_eq!(buf.seek(10), Err(BufferError::Seek));
        assert_eq!(buf.seek(4), Ok(()));
    }
}
