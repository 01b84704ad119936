pub mod block;
pub mod error;
pub mod source;
pub mod window;

pub use block::{BlockDecoder, State, Token};
pub use error::{Error, Result};
pub use source::ByteSource;
pub use window::{Run, SlidingWindow, WINDOW_SIZE};

use std::io::{Read, Write};

/// Configuration for stream decompression
#[derive(Clone, Debug)]
pub struct DecompressConfig {
    /// Size of the read-ahead buffer and of each chunk written to the output
    pub buffer_size: usize,
}

impl Default for DecompressConfig {
    fn default() -> Self {
        Self { buffer_size: 128 * 1024 }
    }
}

/// Statistics from a decompression operation
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DecompressStats {
    pub input_bytes: u64,
    pub output_bytes: u64,
    /// Number of sequences (token + literals + optional match) decoded
    pub sequences: u64,
}

/// Trait for the complete decompression operation
pub trait Decompressor {
    /// Decompress an LZ4 block stream from `input` into `output`
    fn decompress<R: Read, W: Write>(&mut self, input: R, output: W) -> Result<DecompressStats>;
}

/// Pumps a [`BlockDecoder`] into a writer chunk by chunk
pub struct StreamDecompressor {
    config: DecompressConfig,
}

impl StreamDecompressor {
    pub fn new(config: DecompressConfig) -> Self {
        Self { config }
    }
}

impl Decompressor for StreamDecompressor {
    fn decompress<R: Read, W: Write>(
        &mut self,
        input: R,
        mut output: W,
    ) -> Result<DecompressStats> {
        let buffer_size = self.config.buffer_size.max(1);
        let mut decoder = BlockDecoder::with_capacity(input, buffer_size);
        let mut buf = vec![0u8; buffer_size];

        while let Some(n) = decoder.read_decoded(&mut buf)? {
            output.write_all(&buf[..n])?;
        }
        output.flush()?;

        Ok(DecompressStats {
            input_bytes: decoder.compressed_bytes_read(),
            output_bytes: decoder.uncompressed_bytes_written(),
            sequences: decoder.sequences_decoded(),
        })
    }
}

/// Decompress a complete in-memory LZ4 block stream
pub fn decompress_to_vec(data: &[u8]) -> Result<Vec<u8>> {
    let mut output = Vec::new();
    StreamDecompressor::new(DecompressConfig::default()).decompress(data, &mut output)?;
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decompress_to_vec() {
        let data = [0x16, b'A', 0x01, 0x00, 0x30, b'x', b'y', b'z'];
        assert_eq!(decompress_to_vec(&data).unwrap(), b"AAAAAAAAAAAxyz");
    }

    #[test]
    fn test_stats() {
        let data = [0x16, b'A', 0x01, 0x00, 0x30, b'x', b'y', b'z'];
        let config = DecompressConfig { buffer_size: 3 };
        let mut output = Vec::new();

        let stats = StreamDecompressor::new(config).decompress(&data[..], &mut output).unwrap();

        assert_eq!(output.len(), 14);
        assert_eq!(
            stats,
            DecompressStats { input_bytes: data.len() as u64, output_bytes: 14, sequences: 2 }
        );
    }
}
