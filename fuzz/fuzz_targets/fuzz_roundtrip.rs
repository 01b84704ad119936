#![no_main]

use libfuzzer_sys::fuzz_target;
use lz4block::decompress_to_vec;

fuzz_target!(|data: &[u8]| {
    // Limit data size to avoid slowdowns
    let data = if data.len() > 256 * 1024 { &data[..256 * 1024] } else { data };

    // Valid encoder output must always decode back to the input
    let compressed = lz4_flex::block::compress(data);
    let decompressed = decompress_to_vec(&compressed).expect("valid block stream rejected");
    assert_eq!(decompressed, data, "Round-trip mismatch");
});
