use std::io::{self, Write, ErrorKind};
use std::ops::RangeInclusive;
use thiserror::Error;
use fehler::{throw, throws};

use crate::framed;
use crate::raw::{self, EncoderParams, Token, HASH_BITS, MINMATCH, SEARCH_DEPTH, WINDOW_SIZE};

const WINDOW_SIZES: RangeInclusive<usize> = 1..=16 * 1024 * 1024;
const MIN_MATCHES: RangeInclusive<usize> = MINMATCH..=64 * 1024;
const HASH_BIT_RANGE: RangeInclusive<u32> = 8..=18;
const SEARCH_DEPTHS: RangeInclusive<usize> = 1..=32;

/// Errors when compressing.
#[derive(Error, Debug)]
pub enum CompressionError {
    #[error("error writing to the output you gave me")]
    WriteError(#[from] io::Error),
    #[error("window size {0} is not supported (valid: 1 byte to 16 MiB)")]
    InvalidWindowSize(usize),
    #[error("minimum match length {0} is not supported (valid: 4 to 65536)")]
    InvalidMinMatch(usize),
    #[error("{0} hash bits are not supported (valid: 8 to 18)")]
    InvalidHashBits(u32),
    #[error("search depth {0} is not supported (valid: 1 to 32)")]
    InvalidSearchDepth(usize),
}
type Error = CompressionError; // do it this way for better docs
impl From<Error> for io::Error {
    fn from(e: Error) -> io::Error {
        io::Error::new(ErrorKind::Other, e)
    }
}

/// A builder-style struct that configures compression settings.
///
/// Create it using `Default::default()`. The defaults are what [`compress`](crate::compress) uses.
/// Settings only affect how hard the compressor looks for duplicates; any frame can be
/// decompressed without knowing them.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CompressionSettings {
    window_size: usize,
    min_match: usize,
    hash_bits: u32,
    search_depth: usize,
}
impl Default for CompressionSettings {
    fn default() -> Self {
        Self {
            window_size: WINDOW_SIZE,
            min_match: MINMATCH,
            hash_bits: HASH_BITS,
            search_depth: SEARCH_DEPTH,
        }
    }
}
impl CompressionSettings {
    /// How far back a copy may reach. Larger windows find more duplicates in large inputs.
    ///
    /// The default window size is 64 KiB, the maximum is 16 MiB.
    pub fn window_size(&mut self, v: usize) -> &mut Self {
        self.window_size = v;
        self
    }

    /// Duplicates shorter than this are emitted as literals instead.
    /// A copy costs at least three bytes on the wire, two literals cost four,
    /// so values below 4 would not pay off (and are rejected).
    ///
    /// The default is 4.
    pub fn min_match(&mut self, v: usize) -> &mut Self {
        self.min_match = v;
        self
    }

    /// log2 of the number of slots in the match table.
    /// More slots mean fewer hash collisions but more memory: the table takes
    /// `2^hash_bits * search_depth` words, 64 MiB at the largest allowed values.
    ///
    /// The default is 14.
    pub fn hash_bits(&mut self, v: u32) -> &mut Self {
        self.hash_bits = v;
        self
    }

    /// How many earlier positions are remembered, and tried, per table slot.
    /// Higher values find longer matches at the cost of speed.
    ///
    /// The default is 8.
    pub fn search_depth(&mut self, v: usize) -> &mut Self {
        self.search_depth = v;
        self
    }

    /// Check the settings and turn them into encoder parameters.
    #[throws]
    pub fn params(&self) -> EncoderParams {
        if !WINDOW_SIZES.contains(&self.window_size) {
            throw!(Error::InvalidWindowSize(self.window_size));
        }
        if !MIN_MATCHES.contains(&self.min_match) {
            throw!(Error::InvalidMinMatch(self.min_match));
        }
        if !HASH_BIT_RANGE.contains(&self.hash_bits) {
            throw!(Error::InvalidHashBits(self.hash_bits));
        }
        if !SEARCH_DEPTHS.contains(&self.search_depth) {
            throw!(Error::InvalidSearchDepth(self.search_depth));
        }

        EncoderParams {
            window_size: self.window_size,
            min_match: self.min_match,
            hash_bits: self.hash_bits,
            search_depth: self.search_depth,
        }
    }

    /// Compress `input` into a bare token stream.
    #[throws]
    pub fn compress_tokens(&self, input: &[u8]) -> Vec<Token> {
        raw::compress_with(input, &self.params()?)
    }

    /// Compress `input` into a complete frame.
    #[throws]
    pub fn compress(&self, input: &[u8]) -> Vec<u8> {
        let tokens = self.compress_tokens(input)?;
        let frame = framed::encode_frame(&tokens, input.len() as u64);
        tracing::debug!(input_len = input.len(), tokens = tokens.len(), frame_len = frame.len(), "compressed frame");
        frame
    }

    /// Compress `input` and write the frame to `writer`.
    #[throws]
    pub fn compress_to<W: Write>(&self, input: &[u8], writer: W) {
        let tokens = self.compress_tokens(input)?;
        framed::write_frame(writer, &tokens, input.len() as u64)?;
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert_eq!(CompressionSettings::default().params().unwrap(), EncoderParams::default());
    }

    #[test]
    fn rejects_out_of_range_values() {
        assert!(matches!(
            CompressionSettings::default().window_size(0).params(),
            Err(Error::InvalidWindowSize(0))
        ));
        assert!(matches!(
            CompressionSettings::default().window_size(32 * 1024 * 1024).params(),
            Err(Error::InvalidWindowSize(_))
        ));
        assert!(matches!(CompressionSettings::default().min_match(3).params(), Err(Error::InvalidMinMatch(3))));
        assert!(matches!(CompressionSettings::default().hash_bits(30).params(), Err(Error::InvalidHashBits(30))));
        assert!(matches!(
            CompressionSettings::default().search_depth(0).params(),
            Err(Error::InvalidSearchDepth(0))
        ));
    }

    #[test]
    fn builder_chains() {
        let params = CompressionSettings::default()
            .window_size(4096)
            .min_match(6)
            .hash_bits(10)
            .search_depth(2)
            .params()
            .unwrap();
        assert_eq!(params, EncoderParams { window_size: 4096, min_match: 6, hash_bits: 10, search_depth: 2 });
    }

    #[test]
    fn compress_to_matches_compress() {
        let input = b"to be or not to be, that is the question";
        let settings = CompressionSettings::default();
        let mut written = Vec::new();
        settings.compress_to(input, &mut written).unwrap();
        assert_eq!(written, settings.compress(input).unwrap());
        assert_eq!(crate::decompress(&written).unwrap(), &input[..]);
    }

    #[test]
    fn invalid_settings_write_nothing() {
        let mut written = Vec::new();
        CompressionSettings::default().search_depth(1000).compress_to(b"abc", &mut written).unwrap_err();
        assert!(written.is_empty());
    }
}
