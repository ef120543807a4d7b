//! LEB128: seven bits per byte, least significant group first, high bit set on all but the last byte.

use std::io::Cursor;
use byteorder::ReadBytesExt;

/// A u64 never needs more than this many bytes.
pub const MAX_VARINT_LEN: usize = 10;

pub fn write_varint(output: &mut Vec<u8>, mut value: u64) {
    while value >= 0x80 {
        output.push(value as u8 | 0x80);
        value >>= 7;
    }
    output.push(value as u8);
}

#[derive(Debug, Eq, PartialEq)]
pub enum VarintError {
    /// The input ended while the continuation bit was still set.
    Truncated,
    /// More than 64 bits worth of payload.
    Overflow,
}

pub fn read_varint(reader: &mut Cursor<&[u8]>) -> Result<u64, VarintError> {
    let mut value = 0u64;
    for i in 0..MAX_VARINT_LEN {
        // a cursor only ever fails with UnexpectedEof
        let byte = reader.read_u8().map_err(|_| VarintError::Truncated)?;
        let shift = 7 * i as u32;
        let group = u64::from(byte & 0x7F);
        // the tenth byte only has room for the single top bit
        if i == MAX_VARINT_LEN - 1 && group > 1 {
            return Err(VarintError::Overflow);
        }
        value |= group << shift;
        if byte & 0x80 == 0 {
            return Ok(value);
        }
    }
    Err(VarintError::Overflow)
}
