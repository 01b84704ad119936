#![no_main]

use libfuzzer_sys::fuzz_target;
use lz4block::{BlockDecoder, Error};

fuzz_target!(|data: &[u8]| {
    // First byte picks the caller buffer size, the rest is the stream
    let Some((&chunk, stream)) = data.split_first() else {
        return;
    };
    let mut buf = vec![0u8; chunk as usize + 1];
    let mut decoder = BlockDecoder::new(stream);

    // Decoding may fail on invalid input - that's OK
    // We're looking for panics, hangs and zero-byte reads
    loop {
        match decoder.read_decoded(&mut buf) {
            Ok(Some(n)) => assert!(n > 0 && n <= buf.len()),
            Ok(None) => {
                assert!(matches!(decoder.read_decoded(&mut buf), Ok(None)));
                break;
            }
            Err(_) => {
                assert!(matches!(decoder.read_decoded(&mut buf), Err(Error::Poisoned)));
                break;
            }
        }
    }
});
