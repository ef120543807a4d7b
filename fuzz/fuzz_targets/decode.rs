#![no_main]
use libfuzzer_sys::fuzz_target;
use lz_press::{decompress, ErrorKind};

fuzz_target!(|data: &[u8]| {
    // random bytes are almost never a valid frame, so errors are expected here;
    // what must not happen is a panic or an I/O error coming out of a pure decode
    if let Err(e) = decompress(data) {
        assert_ne!(e.kind(), ErrorKind::Io);
    }
});
