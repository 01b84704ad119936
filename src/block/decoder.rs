use super::token::{read_extended_length, Token, MIN_MATCH};
use crate::error::{Error, Result};
use crate::source::ByteSource;
use crate::window::SlidingWindow;
use std::io::{self, Read};
use tracing::{debug, trace};

/// Position of the decoder within the sequence stream
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum State {
    /// Next read parses a fresh token
    NoBlock,
    /// Delivering the literal run of the current sequence
    InLiteral,
    /// Literals done; the match offset (or end of stream) comes next
    LookingForBackReference,
    /// Delivering the match of the current sequence
    InBackReference,
    /// Final sequence consumed
    Eof,
}

/// Upper bound on transitions within one read call
const STATE_COUNT: usize = 5;

/// Pull-based decoder for a stream of LZ4 block sequences
///
/// Output is produced on demand into caller buffers of any size; a run
/// interrupted by a small buffer resumes on the next call. Any error other
/// than a transient source condition leaves the decoder unusable.
pub struct BlockDecoder<R: Read> {
    source: ByteSource<R>,
    window: SlidingWindow,
    state: State,
    /// Match nibble of the current token, resolved once its literals are done
    next_back_reference_size: u8,
    /// Tokens parsed so far
    sequences: u64,
    poisoned: bool,
}

impl<R: Read> BlockDecoder<R> {
    pub fn new(reader: R) -> Self {
        Self::from_source(ByteSource::new(reader))
    }

    /// Create a decoder whose read-ahead buffer holds `capacity` bytes
    pub fn with_capacity(reader: R, capacity: usize) -> Self {
        Self::from_source(ByteSource::with_capacity(reader, capacity))
    }

    fn from_source(source: ByteSource<R>) -> Self {
        Self {
            source,
            window: SlidingWindow::new(),
            state: State::NoBlock,
            next_back_reference_size: 0,
            sequences: 0,
            poisoned: false,
        }
    }

    /// Decode up to `buf.len()` bytes into `buf`.
    ///
    /// Returns `Some(n)` with `n > 0` for a non-empty `buf`, `Some(0)` for an
    /// empty one (without touching the stream), and `None` once the final
    /// sequence has been delivered, on this and every later call.
    pub fn read_decoded(&mut self, buf: &mut [u8]) -> Result<Option<usize>> {
        if self.poisoned {
            return Err(Error::Poisoned);
        }
        if buf.is_empty() {
            return Ok(Some(0));
        }

        match self.step(buf) {
            Err(e) if !e.is_transient() => {
                debug!(
                    error = %e,
                    compressed_offset = self.source.bytes_read(),
                    "block stream rejected"
                );
                self.poisoned = true;
                Err(e)
            }
            other => other,
        }
    }

    fn step(&mut self, buf: &mut [u8]) -> Result<Option<usize>> {
        // A zero-length literal falls through to its match within the same
        // call; the longest chain is token -> literal -> offset -> match.
        for _ in 0..STATE_COUNT {
            match self.state {
                State::Eof => return Ok(None),
                State::NoBlock => {
                    let mark = self.source.bytes_read();
                    if let Err(e) = self.read_sizes() {
                        return Err(self.header_error(e, mark));
                    }
                }
                State::InLiteral => {
                    let produced = self.window.continue_literal(&mut self.source, buf)?;
                    if !self.window.has_remaining_in_current_run() {
                        self.state = State::LookingForBackReference;
                    }
                    if produced > 0 {
                        return Ok(Some(produced));
                    }
                }
                State::LookingForBackReference => {
                    let mark = self.source.bytes_read();
                    match self.initialize_back_reference() {
                        Ok(true) => {}
                        Ok(false) => {
                            debug!(
                                sequences = self.sequences,
                                compressed = self.source.bytes_read(),
                                uncompressed = self.window.total_written(),
                                "end of block stream"
                            );
                            self.state = State::Eof;
                            return Ok(None);
                        }
                        Err(e) => return Err(self.header_error(e, mark)),
                    }
                }
                State::InBackReference => {
                    let produced = self.window.continue_back_reference(buf);
                    if !self.window.has_remaining_in_current_run() {
                        self.state = State::NoBlock;
                    }
                    if produced > 0 {
                        return Ok(Some(produced));
                    }
                }
            }
        }

        Err(Error::UnknownState(format!(
            "{:?} still pending after {} transitions",
            self.state, STATE_COUNT
        )))
    }

    /// A transient failure is resumable only if no header byte was consumed
    fn header_error(&mut self, err: Error, mark: u64) -> Error {
        if err.is_transient() && self.source.bytes_read() != mark {
            self.poisoned = true;
        }
        err
    }

    fn read_sizes(&mut self) -> Result<()> {
        let token = match self.source.read_u8()? {
            Some(byte) => Token::new(byte),
            None => return Err(Error::Truncated { context: "looking for next block" }),
        };

        self.next_back_reference_size = token.match_nibble();
        let literal_len = read_extended_length(&mut self.source, token.literal_nibble(), "literal")?;
        trace!(literal_len, match_nibble = token.match_nibble(), "parsed token");

        self.window.begin_literal(literal_len);
        self.sequences += 1;
        self.state = State::InLiteral;
        Ok(())
    }

    /// Returns false if the stream ended cleanly after the final literals
    fn initialize_back_reference(&mut self) -> Result<bool> {
        let offset = match self.source.read_u16_le()? {
            Some(offset) => offset,
            // The last sequence carries no match
            None if self.next_back_reference_size == 0 => return Ok(false),
            None => return Err(Error::Truncated { context: "looking for back-reference offset" }),
        };

        let match_len = read_extended_length(&mut self.source, self.next_back_reference_size, "match")?
            .checked_add(MIN_MATCH)
            .ok_or(Error::LengthOverflow { field: "match" })?;
        trace!(offset, match_len, "parsed back-reference");

        self.window.begin_back_reference(offset as usize, match_len)?;
        self.state = State::InBackReference;
        Ok(true)
    }

    pub fn state(&self) -> State {
        self.state
    }

    /// Whether the final sequence has been delivered
    pub fn is_finished(&self) -> bool {
        self.state == State::Eof
    }

    /// Compressed bytes consumed so far
    pub fn compressed_bytes_read(&self) -> u64 {
        self.source.bytes_read()
    }

    /// Decompressed bytes produced so far
    pub fn uncompressed_bytes_written(&self) -> u64 {
        self.window.total_written()
    }

    /// Number of sequences (tokens) parsed so far
    pub fn sequences_decoded(&self) -> u64 {
        self.sequences
    }

    /// Get the inner reader (consumes self)
    pub fn into_inner(self) -> R {
        self.source.into_inner()
    }
}

impl<R: Read> Read for BlockDecoder<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        Ok(self.read_decoded(buf)?.unwrap_or(0))
    }
}
