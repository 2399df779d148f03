use std::iter::FromIterator;

use crate::preprocessing::Token;

pub fn get_word_chunk(
    word: &str,
    chunk_size: usize,
    chunk_start: usize,
    reverse: bool,
) -> Option<String> {
    if reverse && chunk_size > chunk_start {
        return None;
    }
    let start = if reverse {
        chunk_start - chunk_size
    } else {
        chunk_start
    };
    if start + chunk_size > word.chars().count() {
        None
    } else {
        Some(word.chars().skip(start).take(chunk_size).collect())
    }
}

/// Rebuilds a string in which every token sits at its original character offset
pub fn initial_string_from_tokens(tokens: &[Token]) -> String {
    let mut current_index = 0;
    let mut chunks: Vec<String> = Vec::with_capacity(2 * tokens.len());
    for token in tokens {
        if token.char_range.start > current_index {
            let nb_spaces = token.char_range.start - current_index;
            let spaces = String::from_iter(vec![' '; nb_spaces]);
            chunks.push(spaces);
        }
        chunks.push(token.value.clone());
        current_index = token.char_range.end;
    }
    chunks.join("")
}
