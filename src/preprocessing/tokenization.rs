use lazy_static::lazy_static;
use regex::Regex;

use crate::language::Language;

use super::Token;

lazy_static! {
    static ref TOKEN_REGEX: Regex = Regex::new(r"[\p{L}\p{M}\p{N}]+|\S").unwrap();
}

/// Splits the input into words and single punctuation or symbol characters. Whitespace never
/// produces tokens, and ranges always point into the original input.
pub fn tokenize(input: &str, _language: Language) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut char_index = 0;
    let mut byte_index = 0;
    for token_match in TOKEN_REGEX.find_iter(input) {
        char_index += input[byte_index..token_match.start()].chars().count();
        let nb_chars = token_match.as_str().chars().count();
        tokens.push(Token::new(
            token_match.as_str().to_string(),
            token_match.start()..token_match.end(),
            char_index..char_index + nb_chars,
        ));
        char_index += nb_chars;
        byte_index = token_match.end();
    }
    tokens
}

pub fn tokenize_light(input: &str, language: Language) -> Vec<String> {
    tokenize(input, language)
        .into_iter()
        .map(|token| token.value)
        .collect()
}
