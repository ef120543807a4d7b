use byteorder::{ByteOrder, LE};
use std::io::{self, Write};
use fehler::throws;

use super::varint::write_varint;
use super::{HEADER_LEN, MAGIC, TAG_COPY, TAG_LITERAL};
use crate::raw::Token;

fn encode_token(output: &mut Vec<u8>, token: &Token) {
    match *token {
        Token::Literal(b) => {
            output.push(TAG_LITERAL);
            output.push(b);
        }
        Token::Copy { offset, length } => {
            output.push(TAG_COPY);
            write_varint(output, offset as u64);
            write_varint(output, length as u64);
        }
    }
}

/// Serialize a token stream into a complete frame.
///
/// `uncompressed_len` must be the number of bytes the tokens decode to, this is not checked here.
pub fn encode_frame(tokens: &[Token], uncompressed_len: u64) -> Vec<u8> {
    let mut output = Vec::with_capacity(HEADER_LEN + tokens.len() * 2);

    let mut header = [0u8; HEADER_LEN];
    LE::write_u32(&mut header[..4], MAGIC);
    LE::write_u64(&mut header[4..], uncompressed_len);
    output.extend_from_slice(&header);

    for token in tokens {
        encode_token(&mut output, token);
    }
    output
}

/// Like [`encode_frame`], but hands the frame to a writer.
///
/// Either the whole frame is accepted by the writer or an error is returned.
#[throws(io::Error)]
pub fn write_frame<W: Write>(mut writer: W, tokens: &[Token], uncompressed_len: u64) {
    writer.write_all(&encode_frame(tokens, uncompressed_len))?;
    writer.flush()?;
}
