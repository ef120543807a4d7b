//! A small, self-contained LZ77 compressor.
//!
//! The codec comes in two layers:
//!
//! * [`raw`] turns bytes into a stream of [`Token`]s (literal bytes and back-references)
//!   and back.
//! * [`framed`] wraps a token stream with a magic number and the uncompressed length,
//!   so a frame can be validated and decoded on its own.
//!
//! Most users only need the two functions at the top level:
//!
//! ```
//! let data = b"abracadabra, abracadabra, abracadabra";
//! let frame = lz_press::compress(data);
//! assert_eq!(lz_press::decompress(&frame).unwrap(), &data[..]);
//! ```
//!
//! Use [`CompressionSettings`] to tune the match finder.

#![forbid(unsafe_code)]

pub mod raw;
pub mod framed;
mod settings;

pub use framed::{DecompressionError, ErrorKind, Frame};
pub use raw::Token;
pub use settings::{CompressionError, CompressionSettings};

use std::io::Read;
use fehler::throws;

/// Compress `input` into a frame, using the default settings.
pub fn compress(input: &[u8]) -> Vec<u8> {
    let tokens = raw::compress(input);
    framed::encode_frame(&tokens, input.len() as u64)
}

/// Decompress a frame produced by [`compress`] (or any other valid frame).
///
/// Either all of the data comes back or an error does, never a partial result.
#[throws(DecompressionError)]
pub fn decompress(input: &[u8]) -> Vec<u8> {
    framed::decompress_frame(input)?
}

/// Read everything from `reader` and decompress it as a single frame.
#[throws(DecompressionError)]
pub fn decompress_from<R: Read>(mut reader: R) -> Vec<u8> {
    let mut input = Vec::new();
    reader.read_to_end(&mut input)?;
    decompress(&input)?
}
