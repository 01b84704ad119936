use crate::error::{Error, Result};
use crate::source::ByteSource;
use std::io::Read;

/// 64KB history, the full range of a 2-byte offset
pub const WINDOW_SIZE: usize = 1 << 16;
const WINDOW_MASK: usize = WINDOW_SIZE - 1;

/// The run currently being delivered to the caller
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Run {
    /// Nothing pending
    Idle,
    /// Raw bytes still to be copied from the source
    Literal { remaining: u64 },
    /// Bytes still to be copied from `offset` bytes behind the write cursor
    BackReference { offset: usize, remaining: u64 },
}

/// 64KB circular buffer holding the most recent decompressed output.
///
/// Knows nothing about the token format: it either passes literal bytes
/// through from the source or repeats earlier output, recording every
/// produced byte so later back-references can see it.
pub struct SlidingWindow {
    buffer: Box<[u8]>,
    /// Next write position (0-65535)
    write_pos: usize,
    /// Total bytes ever written
    total_written: u64,
    run: Run,
}

impl SlidingWindow {
    pub fn new() -> Self {
        Self {
            buffer: vec![0u8; WINDOW_SIZE].into_boxed_slice(),
            write_pos: 0,
            total_written: 0,
            run: Run::Idle,
        }
    }

    /// Record all of `bytes` as produced output
    fn push_bytes(&mut self, bytes: &[u8]) {
        // Only the trailing WINDOW_SIZE bytes can ever be referenced
        let skipped = bytes.len().saturating_sub(WINDOW_SIZE);
        let tail = &bytes[skipped..];
        self.write_pos = (self.write_pos + skipped) & WINDOW_MASK;

        let first = tail.len().min(WINDOW_SIZE - self.write_pos);
        self.buffer[self.write_pos..self.write_pos + first].copy_from_slice(&tail[..first]);
        self.buffer[..tail.len() - first].copy_from_slice(&tail[first..]);

        self.write_pos = (self.write_pos + tail.len()) & WINDOW_MASK;
        self.total_written += bytes.len() as u64;
    }

    /// Start a literal run of `length` bytes
    pub fn begin_literal(&mut self, length: u64) {
        self.run = if length == 0 { Run::Idle } else { Run::Literal { remaining: length } };
    }

    /// Copy up to `dst.len()` bytes of the active literal run from `source`
    /// into `dst` and the window.
    ///
    /// Returns 0 when `dst` is empty or no literal run is active. Input that
    /// ends inside the run is a truncation error.
    pub fn continue_literal<R: Read>(
        &mut self,
        source: &mut ByteSource<R>,
        dst: &mut [u8],
    ) -> Result<usize> {
        let Run::Literal { remaining } = self.run else {
            return Ok(0);
        };

        let want = remaining.min(dst.len() as u64) as usize;
        if want == 0 {
            return Ok(0);
        }

        let n = source.read_into(&mut dst[..want])?;
        if n == 0 {
            return Err(Error::Truncated { context: "reading literal" });
        }

        self.push_bytes(&dst[..n]);
        self.advance_run(n);
        Ok(n)
    }

    /// Start copying `length` bytes from `offset` bytes behind the write cursor
    pub fn begin_back_reference(&mut self, offset: usize, length: u64) -> Result<()> {
        if offset == 0 || offset > WINDOW_SIZE || offset as u64 > self.total_written {
            return Err(Error::IllegalOffset { offset, available: self.available() });
        }
        self.run =
            if length == 0 { Run::Idle } else { Run::BackReference { offset, remaining: length } };
        Ok(())
    }

    /// Copy up to `dst.len()` bytes of the active back-reference into `dst`
    /// and the window.
    ///
    /// Source and destination overlap whenever `offset` is shorter than the
    /// run, so bytes are moved strictly one at a time in increasing order:
    /// each byte written is visible to the read `offset` positions later.
    pub fn continue_back_reference(&mut self, dst: &mut [u8]) -> usize {
        let Run::BackReference { offset, remaining } = self.run else {
            return 0;
        };

        let n = remaining.min(dst.len() as u64) as usize;
        for out in &mut dst[..n] {
            let byte = self.buffer[(self.write_pos + WINDOW_SIZE - offset) & WINDOW_MASK];
            self.buffer[self.write_pos] = byte;
            self.write_pos = (self.write_pos + 1) & WINDOW_MASK;
            *out = byte;
        }
        self.total_written += n as u64;

        self.advance_run(n);
        n
    }

    fn advance_run(&mut self, produced: usize) {
        self.run = match self.run {
            Run::Literal { remaining } if remaining > produced as u64 => {
                Run::Literal { remaining: remaining - produced as u64 }
            }
            Run::BackReference { offset, remaining } if remaining > produced as u64 => {
                Run::BackReference { offset, remaining: remaining - produced as u64 }
            }
            _ => Run::Idle,
        };
    }

    /// Whether the active run still has undelivered bytes
    pub fn has_remaining_in_current_run(&self) -> bool {
        self.run != Run::Idle
    }

    pub fn run(&self) -> Run {
        self.run
    }

    /// Get available history size
    pub fn available(&self) -> usize {
        self.total_written.min(WINDOW_SIZE as u64) as usize
    }

    /// Get total bytes written
    pub fn total_written(&self) -> u64 {
        self.total_written
    }
}

impl Default for SlidingWindow {
    fn default() -> Self {
        Self::new()
    }
}
