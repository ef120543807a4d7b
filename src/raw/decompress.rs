use std::convert::TryFrom;
use thiserror::Error;
use fehler::{throw, throws};

use super::Token;

/// Never reserve more than this up front, whatever the caller claims the output size is.
const PREALLOC_LIMIT: u64 = 16 * 1024 * 1024;

/// Errors when replaying a token stream. Every one of them means the stream is corrupt.
#[derive(Error, Debug, Clone, Copy, Eq, PartialEq)]
pub enum DecodeError {
    /// The offset for a copy points before the start of the output (or is zero).
    #[error("copy offset {offset} is out of bounds, only {written} bytes were written so far")]
    InvalidOffset { offset: usize, written: usize },
    /// A token would push the output past the expected length.
    #[error("stream decodes to more than the expected {expected} bytes (at least {attempted})")]
    OutputOverflow { expected: u64, attempted: u64 },
    /// The stream ended before producing the expected number of bytes.
    #[error("stream decoded to {actual} bytes but {expected} were expected")]
    LengthMismatch { expected: u64, actual: u64 },
}
type Error = DecodeError;

fn copy_overlapping(offset: usize, match_len: usize, output: &mut Vec<u8>) {
    let old_len = output.len();
    match offset {
        // fastpath: memset if we repeat the same byte forever
        1 => output.resize(old_len + match_len, output[old_len - 1]),

        o if match_len <= o => {
            // fastpath: nonoverlapping
            // for borrowck reasons we have to extend with zeroes first and then memcpy
            // instead of simply using extend_from_slice
            output.resize(old_len + match_len, 0);
            let (head, tail) = output.split_at_mut(old_len);
            tail.copy_from_slice(&head[old_len - offset..][..match_len]);
        }
        _ => {
            // overlapping: later bytes of the copy read earlier bytes of the same copy
            output.reserve(match_len);
            for i in 0..match_len {
                let b = output[old_len - offset + i];
                output.push(b);
            }
        }
    }
}

/// Replay `tokens` and append the result to `output`.
///
/// `expected_len` is the total number of bytes the tokens must produce. The check happens
/// before each token is applied, so a forged copy length fails instead of eating all memory.
/// On error, `output` holds whatever was decoded so far and must be discarded.
#[throws]
pub fn decompress_into(tokens: &[Token], expected_len: u64, output: &mut Vec<u8>) {
    let base = output.len();
    for token in tokens {
        let written = output.len() - base;
        let attempted = (written as u64).saturating_add(token.output_len() as u64);
        if attempted > expected_len {
            throw!(Error::OutputOverflow { expected: expected_len, attempted });
        }

        match *token {
            Token::Literal(b) => output.push(b),
            Token::Copy { offset, length } => {
                if offset == 0 || offset > written {
                    throw!(Error::InvalidOffset { offset, written });
                }
                copy_overlapping(offset, length, output);
            }
        }
    }

    let actual = (output.len() - base) as u64;
    if actual != expected_len {
        throw!(Error::LengthMismatch { expected: expected_len, actual });
    }
}

/// Replay `tokens` into a fresh buffer of exactly `expected_len` bytes.
#[throws]
pub fn decompress(tokens: &[Token], expected_len: u64) -> Vec<u8> {
    let reserve = usize::try_from(expected_len.min(PREALLOC_LIMIT)).unwrap_or(0);
    let mut output = Vec::with_capacity(reserve);
    if let Err(e) = decompress_into(tokens, expected_len, &mut output) {
        tracing::debug!(error = %e, decoded = output.len(), "token stream rejected");
        throw!(e);
    }
    output
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::raw::Token::{Copy, Literal};

    #[test]
    fn aaaaaaaaaaa_lots_of_aaaaaaaaa() {
        let tokens = [Literal(b'a'), Copy { offset: 1, length: 9 }];
        assert_eq!(decompress(&tokens, 10).unwrap(), b"aaaaaaaaaa");
    }

    #[test]
    fn multiple_repeated_runs() {
        let tokens = [
            Literal(b'a'),
            Copy { offset: 1, length: 5 },
            Literal(b'b'),
            Literal(b'c'),
            Copy { offset: 2, length: 6 },
        ];
        assert_eq!(decompress(&tokens, 14).unwrap(), b"aaaaaabcbcbcbc");
    }

    #[test]
    fn nonoverlapping_copy() {
        let tokens = [Literal(b'x'), Literal(b'y'), Literal(b'z'), Copy { offset: 3, length: 2 }];
        assert_eq!(decompress(&tokens, 5).unwrap(), b"xyzxy");
    }

    #[test]
    fn overlapping_copy_with_longer_period() {
        let tokens = [Literal(b'1'), Literal(b'2'), Literal(b'3'), Copy { offset: 3, length: 7 }];
        assert_eq!(decompress(&tokens, 10).unwrap(), b"1231231231");
    }

    #[test]
    fn all_literal() {
        assert_eq!(decompress(&[Literal(b'a'), Literal(b'4'), Literal(b'9')], 3).unwrap(), b"a49");
    }

    #[test]
    fn empty() {
        assert_eq!(decompress(&[], 0).unwrap(), b"");
    }

    #[test]
    fn offset_oob() {
        assert_eq!(
            decompress(&[Literal(b'a'), Copy { offset: 2, length: 4 }], 5).unwrap_err(),
            DecodeError::InvalidOffset { offset: 2, written: 1 }
        );
        assert_eq!(
            decompress(&[Copy { offset: 1, length: 4 }], 4).unwrap_err(),
            DecodeError::InvalidOffset { offset: 1, written: 0 }
        );
        decompress(&[Literal(b'a'), Copy { offset: 0, length: 4 }], 5).unwrap_err();
    }

    #[test]
    fn length_mismatch() {
        assert_eq!(
            decompress(&[Literal(b'a')], 2).unwrap_err(),
            DecodeError::LengthMismatch { expected: 2, actual: 1 }
        );
        assert_eq!(
            decompress(&[Literal(b'a'), Literal(b'b')], 1).unwrap_err(),
            DecodeError::OutputOverflow { expected: 1, attempted: 2 }
        );
    }

    #[test]
    fn huge_copy_fails_before_allocating() {
        let tokens = [Literal(b'a'), Copy { offset: 1, length: usize::MAX / 2 }];
        assert!(matches!(
            decompress(&tokens, 100).unwrap_err(),
            DecodeError::OutputOverflow { expected: 100, .. }
        ));
    }

    #[test]
    fn appends_to_existing_output() {
        let mut output = b"prefix".to_vec();
        decompress_into(&[Literal(b'a'), Copy { offset: 1, length: 3 }], 4, &mut output).unwrap();
        assert_eq!(output, b"prefixaaaa");
    }
}
