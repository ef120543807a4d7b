//! The frame format: a small self-describing container around a token stream.
//!
//! ```text
//! +-------------+---------------------------+----------------------------+
//! | magic (4 B) | uncompressed length (8 B) | tokens until end of input  |
//! |   "LZP1"    |      u64, little endian   |                            |
//! +-------------+---------------------------+----------------------------+
//! ```
//!
//! A literal is the tag byte `0x00` followed by the byte itself. A copy is the tag byte `0x01`
//! followed by the offset and then the length, both as LEB128 varints.
//! There is no end marker: the token stream simply runs until the input is exhausted.

mod compress;
mod decompress;
mod varint;

pub use compress::*;
pub use decompress::*;

use crate::raw::Token;

/// The four magic bytes at the start of every frame ("LZP1" when written little endian).
const MAGIC: u32 = 0x3150_5A4C;
/// Magic plus the uncompressed length.
pub const HEADER_LEN: usize = 12;

const TAG_LITERAL: u8 = 0x00;
const TAG_COPY: u8 = 0x01;

/// A parsed frame.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Frame {
    /// What the header claims the tokens decode to.
    pub uncompressed_len: u64,
    pub tokens: Vec<Token>,
}
