#![no_main]
use libfuzzer_sys::fuzz_target;
use lz_press::{compress, decompress, CompressionSettings};

fuzz_target!(|data: &[u8]| {
    let frame = compress(data);
    let roundtripped = decompress(&frame).expect("Could not decompress our own frame");
    assert!(roundtripped == data);

    // a tiny window and table shake out the eviction paths
    let frame = CompressionSettings::default()
        .window_size(16)
        .hash_bits(8)
        .search_depth(1)
        .compress(data)
        .expect("Could not compress input data");
    assert!(decompress(&frame).expect("Could not decompress small-window frame") == data);
});
