use crate::error::{Error, Result};
use std::io::{ErrorKind, Read};

/// Default refill buffer size
pub const DEFAULT_CAPACITY: usize = 64 * 1024;

/// Smallest refill buffer accepted; must hold the widest fixed-width value
const MIN_CAPACITY: usize = 8;

/// Buffered, byte-oriented reader over the compressed stream
///
/// Distinguishes a clean end of input (`Ok(None)` / `Ok(0)`) from a short
/// multi-byte value (`Error::Truncated`). A `WouldBlock` from the underlying
/// reader is returned as `Error::Io` without consuming anything, so the same
/// call can be repeated once the reader has data.
pub struct ByteSource<R: Read> {
    reader: R,
    buffer: Box<[u8]>,
    /// Next unread position in buffer
    pos: usize,
    /// End of valid data in buffer
    filled: usize,
    /// Total bytes handed out to callers
    bytes_read: u64,
}

impl<R: Read> ByteSource<R> {
    pub fn new(reader: R) -> Self {
        Self::with_capacity(reader, DEFAULT_CAPACITY)
    }

    pub fn with_capacity(reader: R, capacity: usize) -> Self {
        let capacity = capacity.max(MIN_CAPACITY);
        Self { reader, buffer: vec![0u8; capacity].into_boxed_slice(), pos: 0, filled: 0, bytes_read: 0 }
    }

    /// Make up to `n` bytes available in the buffer, returning how many are.
    ///
    /// Fewer than `n` only at end of input.
    fn ensure(&mut self, n: usize) -> Result<usize> {
        debug_assert!(n <= self.buffer.len());

        if self.filled - self.pos >= n {
            return Ok(n);
        }

        // Compact so the remaining bytes and the refill are contiguous
        self.buffer.copy_within(self.pos..self.filled, 0);
        self.filled -= self.pos;
        self.pos = 0;

        while self.filled < n {
            match self.reader.read(&mut self.buffer[self.filled..]) {
                Ok(0) => break,
                Ok(count) => self.filled += count,
                Err(e) if e.kind() == ErrorKind::Interrupted => {}
                Err(e) => return Err(Error::Io(e)),
            }
        }

        Ok(self.filled.min(n))
    }

    #[inline]
    fn consume(&mut self, n: usize) {
        self.pos += n;
        self.bytes_read += n as u64;
    }

    /// Read one byte, or `None` at a clean end of input
    pub fn read_u8(&mut self) -> Result<Option<u8>> {
        if self.ensure(1)? == 0 {
            return Ok(None);
        }
        let byte = self.buffer[self.pos];
        self.consume(1);
        Ok(Some(byte))
    }

    /// Read a little-endian unsigned integer `width` bytes wide (1-8).
    ///
    /// Returns `None` if the input ends before the first byte; ending
    /// anywhere after it is a truncation error.
    pub fn read_le(&mut self, width: usize) -> Result<Option<u64>> {
        debug_assert!((1..=8).contains(&width), "width must be 1-8 bytes");

        match self.ensure(width)? {
            0 => Ok(None),
            available if available < width => {
                Err(Error::Truncated { context: "reading a little-endian value" })
            }
            _ => {
                let value = self.buffer[self.pos..self.pos + width]
                    .iter()
                    .rev()
                    .fold(0u64, |acc, &b| (acc << 8) | b as u64);
                self.consume(width);
                Ok(Some(value))
            }
        }
    }

    /// Read a 16-bit little-endian value
    pub fn read_u16_le(&mut self) -> Result<Option<u16>> {
        Ok(self.read_le(2)?.map(|v| v as u16))
    }

    /// Copy up to `dst.len()` bytes into `dst`.
    ///
    /// Returns 0 only for an empty `dst` or at end of input.
    pub fn read_into(&mut self, dst: &mut [u8]) -> Result<usize> {
        if dst.is_empty() || self.ensure(1)? == 0 {
            return Ok(0);
        }
        let n = dst.len().min(self.filled - self.pos);
        dst[..n].copy_from_slice(&self.buffer[self.pos..self.pos + n]);
        self.consume(n);
        Ok(n)
    }

    /// Total bytes consumed from the stream (excludes read-ahead)
    pub fn bytes_read(&self) -> u64 {
        self.bytes_read
    }

    /// Bytes read ahead from the reader but not yet consumed
    pub fn buffered(&self) -> usize {
        self.filled - self.pos
    }

    /// Get the inner reader (consumes self); buffered bytes are dropped
    pub fn into_inner(self) -> R {
        self.reader
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::io;

    /// Reader that replays a script of chunks and errors
    struct ScriptedReader {
        steps: VecDeque<io::Result<Vec<u8>>>,
    }

    impl ScriptedReader {
        fn new(steps: Vec<io::Result<Vec<u8>>>) -> Self {
            Self { steps: steps.into() }
        }
    }

    impl Read for ScriptedReader {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            match self.steps.pop_front() {
                None => Ok(0),
                Some(Err(e)) => Err(e),
                Some(Ok(chunk)) => {
                    assert!(chunk.len() <= buf.len());
                    buf[..chunk.len()].copy_from_slice(&chunk);
                    Ok(chunk.len())
                }
            }
        }
    }

    #[test]
    fn test_read_u8_until_eof() {
        let data = vec![0x01, 0xFF];
        let mut source = ByteSource::new(data.as_slice());

        assert_eq!(source.read_u8().unwrap(), Some(0x01));
        assert_eq!(source.read_u8().unwrap(), Some(0xFF));
        assert_eq!(source.read_u8().unwrap(), None);
        assert_eq!(source.read_u8().unwrap(), None);
        assert_eq!(source.bytes_read(), 2);
    }

    #[test]
    fn test_read_u16_le() {
        let data = vec![0x34, 0x12]; // Little-endian 0x1234
        let mut source = ByteSource::new(data.as_slice());
        assert_eq!(source.read_u16_le().unwrap(), Some(0x1234));
        assert_eq!(source.read_u16_le().unwrap(), None);
    }

    #[test]
    fn test_read_le_widths() {
        let data = vec![0x78, 0x56, 0x34, 0x12, 0xAB];
        let mut source = ByteSource::new(data.as_slice());
        assert_eq!(source.read_le(4).unwrap(), Some(0x12345678));
        assert_eq!(source.read_le(1).unwrap(), Some(0xAB));
    }

    #[test]
    fn test_read_u16_le_truncated() {
        let data = vec![0x34];
        let mut source = ByteSource::new(data.as_slice());
        assert!(matches!(source.read_u16_le(), Err(Error::Truncated { .. })));
    }

    #[test]
    fn test_u16_spanning_reads() {
        // Value split across two reader calls and a buffer compaction
        let reader = ScriptedReader::new(vec![Ok(vec![0xAA, 0x34]), Ok(vec![0x12])]);
        let mut source = ByteSource::with_capacity(reader, 8);

        assert_eq!(source.read_u8().unwrap(), Some(0xAA));
        assert_eq!(source.read_u16_le().unwrap(), Some(0x1234));
        assert_eq!(source.bytes_read(), 3);
    }

    #[test]
    fn test_interrupted_is_retried() {
        let reader = ScriptedReader::new(vec![
            Err(io::ErrorKind::Interrupted.into()),
            Ok(vec![0x42]),
        ]);
        let mut source = ByteSource::new(reader);
        assert_eq!(source.read_u8().unwrap(), Some(0x42));
    }

    #[test]
    fn test_would_block_consumes_nothing() {
        let reader = ScriptedReader::new(vec![
            Ok(vec![0x34]),
            Err(io::ErrorKind::WouldBlock.into()),
            Ok(vec![0x12]),
        ]);
        let mut source = ByteSource::new(reader);

        let err = source.read_u16_le().unwrap_err();
        assert!(err.is_transient());
        assert_eq!(source.bytes_read(), 0);
        assert_eq!(source.buffered(), 1);

        assert_eq!(source.read_u16_le().unwrap(), Some(0x1234));
    }

    #[test]
    fn test_read_into() {
        let data: Vec<u8> = (0..10).collect();
        let mut source = ByteSource::with_capacity(data.as_slice(), 4);

        let mut out = [0u8; 3];
        assert_eq!(source.read_into(&mut out).unwrap(), 3);
        assert_eq!(out, [0, 1, 2]);

        let mut rest = Vec::new();
        let mut chunk = [0u8; 16];
        loop {
            let n = source.read_into(&mut chunk).unwrap();
            if n == 0 {
                break;
            }
            rest.extend_from_slice(&chunk[..n]);
        }
        assert_eq!(rest, (3..10).collect::<Vec<u8>>());
        assert_eq!(source.read_into(&mut []).unwrap(), 0);
    }
}
