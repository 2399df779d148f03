mod normalization;
mod tokenization;

use std::ops::Range;

pub use self::normalization::{get_shape, normalize};
pub use self::tokenization::{tokenize, tokenize_light};

#[derive(Debug, PartialEq, Clone)]
pub struct Token {
    pub value: String,
    /// Byte range in the original string
    pub range: Range<usize>,
    /// Character range in the original string
    pub char_range: Range<usize>,
}

impl Token {
    pub fn new(value: String, range: Range<usize>, char_range: Range<usize>) -> Self {
        Token {
            value,
            range,
            char_range,
        }
    }

    pub fn normalized_value(&self) -> String {
        normalize(&self.value)
    }

    /// Whether this token immediately follows `previous`, without any whitespace in between
    pub fn is_adjacent_to(&self, previous: &Token) -> bool {
        previous.char_range.end == self.char_range.start
    }
}
