use crate::error::{Error, Result};
use crate::source::ByteSource;
use std::io::Read;

/// Width of each length field in the token byte
pub const SIZE_BITS: u8 = 4;
/// Nibble value signalling that extension bytes follow
pub const LENGTH_MASK: u8 = (1 << SIZE_BITS) - 1;
/// Shortest encodable match; a match nibble of 0 means 4 bytes
pub const MIN_MATCH: u64 = 4;

/// The control byte at the start of every sequence
///
/// High nibble: literal length, low nibble: match length minus `MIN_MATCH`.
/// Either nibble at 15 is continued by extension bytes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Token(u8);

impl Token {
    pub fn new(byte: u8) -> Self {
        Self(byte)
    }

    #[inline]
    pub fn literal_nibble(&self) -> u8 {
        self.0 >> SIZE_BITS
    }

    #[inline]
    pub fn match_nibble(&self) -> u8 {
        self.0 & LENGTH_MASK
    }

    /// Whether a match follows the literals unconditionally.
    ///
    /// Only a zero match nibble allows the stream to end after the literals.
    #[inline]
    pub fn requires_match(&self) -> bool {
        self.match_nibble() != 0
    }
}

impl From<u8> for Token {
    fn from(byte: u8) -> Self {
        Self::new(byte)
    }
}

/// Resolve a length field starting from its token nibble.
///
/// A nibble of 15 is followed by extension bytes, each added to the total;
/// reading stops after the first byte below 255.
pub fn read_extended_length<R: Read>(
    source: &mut ByteSource<R>,
    nibble: u8,
    field: &'static str,
) -> Result<u64> {
    let mut length = nibble as u64;
    if nibble != LENGTH_MASK {
        return Ok(length);
    }

    loop {
        let byte = source
            .read_u8()?
            .ok_or(Error::Truncated { context: "parsing length" })?;
        length = length.checked_add(byte as u64).ok_or(Error::LengthOverflow { field })?;
        if byte != u8::MAX {
            return Ok(length);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_nibbles() {
        let token = Token::new(0xF3);
        assert_eq!(token.literal_nibble(), 15);
        assert_eq!(token.match_nibble(), 3);
        assert!(token.requires_match());
        assert!(!Token::from(0x70).requires_match());
    }

    #[test]
    fn test_short_length_reads_nothing() {
        let data = vec![0xAA];
        let mut source = ByteSource::new(data.as_slice());
        assert_eq!(read_extended_length(&mut source, 14, "literal").unwrap(), 14);
        assert_eq!(source.bytes_read(), 0);
    }

    #[test]
    fn test_extension_sum() {
        // 15 + 255 + 255 + 10 = 535
        let data = vec![255, 255, 10, 0xAA];
        let mut source = ByteSource::new(data.as_slice());
        assert_eq!(read_extended_length(&mut source, 15, "literal").unwrap(), 535);
        assert_eq!(source.bytes_read(), 3);
    }

    #[test]
    fn test_extension_terminated_by_zero() {
        let data = vec![0];
        let mut source = ByteSource::new(data.as_slice());
        assert_eq!(read_extended_length(&mut source, 15, "match").unwrap(), 15);
    }

    #[test]
    fn test_extension_truncated() {
        let data = vec![255, 255];
        let mut source = ByteSource::new(data.as_slice());
        assert!(matches!(
            read_extended_length(&mut source, 15, "literal"),
            Err(Error::Truncated { .. })
        ));
    }
}
