/// A single instruction of the compressed representation.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum Token {
    /// Append this byte to the output.
    Literal(u8),
    /// Append `length` bytes, starting `offset` bytes before the current end of the output.
    ///
    /// `offset < length` is perfectly fine: the copy then reads bytes it has just written,
    /// which is how runs are encoded.
    Copy { offset: usize, length: usize },
}

impl Token {
    /// Number of output bytes this token produces.
    pub fn output_len(&self) -> usize {
        match *self {
            Token::Literal(_) => 1,
            Token::Copy { length, .. } => length,
        }
    }
}
