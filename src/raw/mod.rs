//! The raw token layer.
//!
//! Compression turns a byte buffer into a sequence of [`Token`]s, decompression replays them.
//! Nothing in here knows about magic numbers or length headers, so a token stream on its own
//! cannot tell you how much output to expect. If you want a self-describing artifact, use
//! the [`framed`](crate::framed) layer, which costs 12 bytes of header.

mod compress;
mod decompress;
mod token;

pub use compress::*;
pub use decompress::*;
pub use token::Token;

/// Default lookback window: copies never reach further back than this.
pub const WINDOW_SIZE: usize = 64 * 1024;
/// Shortest back-reference the encoder will emit. Also the width of the hashed prefix.
pub const MINMATCH: usize = 4;
