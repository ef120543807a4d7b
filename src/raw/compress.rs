//! The compression algorithm.
//!
//! We use a hash table to find duplicates: every position with at least four bytes left is
//! hashed by its four-byte prefix, and each table slot remembers the most recent positions
//! with that hash (newest first). Filling up a slot pushes out its oldest position, so memory
//! use is fixed by the table dimensions and does not grow with the input.

use std::mem;
use byteorder::{ByteOrder, LE};
use cfg_if::cfg_if;

use super::{Token, MINMATCH, WINDOW_SIZE};

/// Default number of hash bits, i.e. the table has `1 << HASH_BITS` slots.
pub const HASH_BITS: u32 = 14;
/// Default number of positions remembered per slot.
pub const SEARCH_DEPTH: usize = 8;

const HASH_MULTIPLIER: u32 = 0x1e35a7bd;
const EMPTY: usize = usize::MAX;

/// Knobs for a single encoder run.
///
/// Nothing here is checked; [`CompressionSettings`](crate::CompressionSettings) does that.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct EncoderParams {
    pub window_size: usize,
    pub min_match: usize,
    pub hash_bits: u32,
    pub search_depth: usize,
}
impl Default for EncoderParams {
    fn default() -> Self {
        Self {
            window_size: WINDOW_SIZE,
            min_match: MINMATCH,
            hash_bits: HASH_BITS,
            search_depth: SEARCH_DEPTH,
        }
    }
}

/// Maps a four-byte prefix to the positions it was most recently seen at.
#[derive(Clone)]
pub struct MatchTable {
    slots: Vec<usize>,
    depth: usize,
    hash_bits: u32,
}
impl MatchTable {
    pub fn new(hash_bits: u32, depth: usize) -> Self {
        MatchTable { slots: vec![EMPTY; (1 << hash_bits) * depth], depth, hash_bits }
    }

    // input[pos..] must hold at least MINMATCH bytes
    fn bucket(&self, input: &[u8], pos: usize) -> usize {
        let v = LE::read_u32(&input[pos..]);
        let hash = v.wrapping_mul(HASH_MULTIPLIER) >> (32 - self.hash_bits);
        hash as usize * self.depth
    }

    /// Remember `pos` under the hash of its prefix, forgetting the oldest entry of that slot.
    pub fn insert(&mut self, input: &[u8], pos: usize) {
        let start = self.bucket(input, pos);
        let slot = &mut self.slots[start..start + self.depth];
        slot.rotate_right(1);
        slot[0] = pos;
    }

    /// Earlier positions whose prefix hashes like the one at `pos`, newest first.
    ///
    /// These are only candidates: a hash collision yields positions that do not match at all.
    pub fn candidates<'a>(&'a self, input: &[u8], pos: usize) -> impl Iterator<Item = usize> + 'a {
        let start = self.bucket(input, pos);
        self.slots[start..start + self.depth].iter().copied().take_while(|&p| p != EMPTY)
    }
}

#[derive(Copy, Clone, Debug)]
struct Duplicate {
    /// The number of bytes before our cursor, where the duplicate starts.
    offset: usize,
    length: usize,
}

fn count_matching_bytes(a: &[u8], b: &[u8]) -> usize {
    const REGSIZE: usize = mem::size_of::<usize>();
    fn read_usize(b: &[u8]) -> usize {
        let mut buf = [0u8; REGSIZE];
        buf.copy_from_slice(&b[..REGSIZE]);
        usize::from_ne_bytes(buf)
    }
    // index of the first differing byte within a nonzero xor of two native reads
    cfg_if! {
        if #[cfg(target_endian = "little")] {
            fn first_difference(xor: usize) -> usize { (xor.trailing_zeros() / 8) as usize }
        } else {
            fn first_difference(xor: usize) -> usize { (xor.leading_zeros() / 8) as usize }
        }
    }

    let mut matching_bytes = 0;
    // match in chunks of usize so we process a full register at a time instead of single bytes
    for (a, b) in a.chunks_exact(REGSIZE).zip(b.chunks_exact(REGSIZE)) {
        let xor = read_usize(a) ^ read_usize(b);
        if xor == 0 {
            matching_bytes += REGSIZE;
        } else {
            return matching_bytes + first_difference(xor);
        }
    }

    // ran out of full registers, the tail still needs a bytewise look
    let trailing_matches = a.iter().zip(b).skip(matching_bytes).take_while(|&(a, b)| a == b).count();
    matching_bytes + trailing_matches
}

// Both slices come from the input itself, so a candidate that overlaps the cursor
// (offset < length) is measured correctly without any special casing.
fn find_duplicate(input: &[u8], cursor: usize, table: &MatchTable, params: &EncoderParams) -> Option<Duplicate> {
    let remaining = input.len() - cursor;
    let mut best: Option<Duplicate> = None;
    for candidate in table.candidates(input, cursor) {
        let offset = cursor - candidate;
        if offset > params.window_size {
            // everything after this one is even older
            break;
        }

        let length = count_matching_bytes(&input[cursor..], &input[candidate..]);
        // strictly longer only: on a tie the newer candidate (smaller offset) stays
        if best.map_or(true, |b| length > b.length) {
            best = Some(Duplicate { offset, length });
            if length == remaining {
                break;
            }
        }
    }
    best.filter(|d| d.length >= params.min_match)
}

/// Compress `input` into a token stream using the default parameters.
pub fn compress(input: &[u8]) -> Vec<Token> {
    compress_with(input, &EncoderParams::default())
}

/// Compress `input` into a token stream.
///
/// Greedy: at every position the longest duplicate within the window wins, and
/// anything shorter than `params.min_match` is emitted as a literal.
pub fn compress_with(input: &[u8], params: &EncoderParams) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut table = MatchTable::new(params.hash_bits, params.search_depth);

    // positions from here on have fewer than MINMATCH bytes left and cannot be hashed
    let hashable_end = input.len().saturating_sub(MINMATCH - 1);

    let mut cursor = 0;
    while cursor < input.len() {
        if cursor >= hashable_end {
            tokens.push(Token::Literal(input[cursor]));
            cursor += 1;
            continue;
        }

        let duplicate = find_duplicate(input, cursor, &table, params);
        table.insert(input, cursor);

        match duplicate {
            Some(Duplicate { offset, length }) => {
                tokens.push(Token::Copy { offset, length });
                let match_end = cursor + length;
                for pos in cursor + 1..match_end.min(hashable_end) {
                    table.insert(input, pos);
                }
                cursor = match_end;
            }
            None => {
                tokens.push(Token::Literal(input[cursor]));
                cursor += 1;
            }
        }
    }

    tracing::trace!(input_len = input.len(), tokens = tokens.len(), "encoded token stream");
    tokens
}
