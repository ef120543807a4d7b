use byteorder::{LE, ReadBytesExt};
use std::convert::TryFrom;
use std::io::{self, Cursor, ErrorKind as IoErrorKind};
use thiserror::Error;
use fehler::{throw, throws};

use super::varint::{read_varint, VarintError};
use super::{Frame, HEADER_LEN, MAGIC, TAG_COPY, TAG_LITERAL};
use crate::raw::{self, DecodeError, Token};

/// Errors when reading or decompressing a frame.
#[derive(Error, Debug)]
pub enum DecompressionError {
    #[error("error reading from the input you gave me")]
    InputError(#[from] io::Error),
    #[error("the token stream does not decode properly (data corruption?)")]
    CodecError(#[from] DecodeError),
    #[error("wrong magic bytes in frame header: {0:02x?}")]
    BadMagic(Vec<u8>),
    #[error("frame ends in the middle of the header or of the token starting at byte {position}")]
    TruncatedFrame { position: usize },
    #[error("unknown token tag {tag:#04x} at byte {position}")]
    InvalidTag { tag: u8, position: usize },
    #[error("varint in the token starting at byte {position} does not fit into 64 bits")]
    VarintOverflow { position: usize },
    #[error("copy token at byte {position} has a zero offset or length")]
    InvalidCopy { position: usize },
}
type Error = DecompressionError; // do it this way for better docs

impl From<Error> for io::Error {
    fn from(e: Error) -> io::Error {
        io::Error::new(IoErrorKind::Other, e)
    }
}

/// The coarse classes of failure, for callers that only need to tell them apart
/// (e.g. to pick an exit code).
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum ErrorKind {
    /// The tokens are malformed or do not decode to the declared length.
    CorruptStream,
    /// The input does not start with the frame magic.
    BadMagic,
    /// The input ends in the middle of the header or of a token.
    TruncatedFrame,
    /// Reading the input failed before decoding could start.
    Io,
}

impl DecompressionError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::InputError(_) => ErrorKind::Io,
            Error::BadMagic(_) => ErrorKind::BadMagic,
            Error::TruncatedFrame { .. } => ErrorKind::TruncatedFrame,
            Error::CodecError(_)
            | Error::InvalidTag { .. }
            | Error::VarintOverflow { .. }
            | Error::InvalidCopy { .. } => ErrorKind::CorruptStream,
        }
    }
}

/// Reads a frame token by token.
///
/// The header is checked when the reader is created, the tokens as they are pulled out.
/// Iteration stops after the first error.
pub struct FrameReader<'a> {
    reader: Cursor<&'a [u8]>,
    uncompressed_len: u64,
    failed: bool,
}

impl<'a> FrameReader<'a> {
    #[throws]
    pub fn new(input: &'a [u8]) -> Self {
        let mut reader = Cursor::new(input);
        let magic = match reader.read_u32::<LE>() {
            Ok(m) => m,
            Err(_) => throw!(Error::BadMagic(input.to_vec())),
        };
        if magic != MAGIC {
            throw!(Error::BadMagic(magic.to_le_bytes().to_vec()));
        }

        let uncompressed_len = match reader.read_u64::<LE>() {
            Ok(len) => len,
            Err(_) => throw!(Error::TruncatedFrame { position: input.len() }),
        };
        debug_assert_eq!(reader.position() as usize, HEADER_LEN);

        tracing::trace!(uncompressed_len, frame_len = input.len(), "parsed frame header");
        FrameReader { reader, uncompressed_len, failed: false }
    }

    /// The length the header declares for the decompressed data.
    pub fn uncompressed_len(&self) -> u64 { self.uncompressed_len }

    fn is_exhausted(&self) -> bool {
        self.reader.position() as usize >= self.reader.get_ref().len()
    }

    #[throws]
    fn read_size(&mut self, position: usize) -> usize {
        let v = match read_varint(&mut self.reader) {
            Ok(v) => v,
            Err(VarintError::Truncated) => throw!(Error::TruncatedFrame { position }),
            Err(VarintError::Overflow) => throw!(Error::VarintOverflow { position }),
        };
        // only reachable on targets where usize is narrower than 64 bits
        usize::try_from(v).or(Err(Error::VarintOverflow { position }))?
    }

    /// Decode the next token, or `None` once the input is used up.
    #[throws]
    pub fn read_token(&mut self) -> Option<Token> {
        if self.is_exhausted() {
            return None;
        }

        let position = self.reader.position() as usize;
        let tag = self.reader.read_u8()?;
        match tag {
            TAG_LITERAL => match self.reader.read_u8() {
                Ok(b) => Some(Token::Literal(b)),
                Err(_) => throw!(Error::TruncatedFrame { position }),
            },
            TAG_COPY => {
                let offset = self.read_size(position)?;
                let length = self.read_size(position)?;
                if offset == 0 || length == 0 {
                    throw!(Error::InvalidCopy { position });
                }
                Some(Token::Copy { offset, length })
            }
            tag => throw!(Error::InvalidTag { tag, position }),
        }
    }

    /// Read all remaining tokens.
    #[throws]
    pub fn into_frame(mut self) -> Frame {
        let mut tokens = Vec::new();
        while let Some(token) = self.read_token()? {
            tokens.push(token);
        }
        Frame { uncompressed_len: self.uncompressed_len, tokens }
    }
}

impl<'a> Iterator for FrameReader<'a> {
    type Item = Result<Token, Error>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        let result = self.read_token();
        self.failed = result.is_err();
        result.transpose()
    }
}

/// Parse a complete frame, validating the header and the encoding of every token.
///
/// This does not replay the tokens, so a frame whose copies reach too far back
/// or whose length is off still reads fine. [`decompress_frame`] catches those.
#[throws]
pub fn read_frame(input: &[u8]) -> Frame {
    FrameReader::new(input)?.into_frame()?
}

/// Parse and decompress a complete frame.
#[throws]
pub fn decompress_frame(input: &[u8]) -> Vec<u8> {
    let frame = read_frame(input)?;
    let output = raw::decompress(&frame.tokens, frame.uncompressed_len)?;
    tracing::debug!(frame_len = input.len(), output_len = output.len(), "decompressed frame");
    output
}
