use lazy_static::lazy_static;
use regex::Regex;

use crate::language::Language;
use crate::preprocessing::Token;

lazy_static! {
    static ref DIGIT_ORDINAL_REGEX: Regex = Regex::new(r"^(\d+)(st|nd|rd|th)$").unwrap();
}

/// A number spanning the tokens `start..end`
#[derive(Debug, Clone, PartialEq)]
pub struct NumberMatch {
    pub start: usize,
    pub end: usize,
    pub value: f64,
}

impl NumberMatch {
    pub fn is_integer(&self) -> bool {
        self.value.fract() == 0.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum NumberWord {
    Unit(f64),
    Tens(f64),
    Hundred,
    Scale(f64),
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum SpelledState {
    Start,
    Unit,
    Tens,
    Hundred,
    Scale,
}

pub fn is_digits(value: &str) -> bool {
    !value.is_empty() && value.chars().all(|c| c.is_ascii_digit())
}

fn number_word(word: &str) -> Option<NumberWord> {
    let word = match word {
        "zero" => NumberWord::Unit(0.),
        "one" => NumberWord::Unit(1.),
        "two" => NumberWord::Unit(2.),
        "three" => NumberWord::Unit(3.),
        "four" => NumberWord::Unit(4.),
        "five" => NumberWord::Unit(5.),
        "six" => NumberWord::Unit(6.),
        "seven" => NumberWord::Unit(7.),
        "eight" => NumberWord::Unit(8.),
        "nine" => NumberWord::Unit(9.),
        "ten" => NumberWord::Unit(10.),
        "eleven" => NumberWord::Unit(11.),
        "twelve" => NumberWord::Unit(12.),
        "thirteen" => NumberWord::Unit(13.),
        "fourteen" => NumberWord::Unit(14.),
        "fifteen" => NumberWord::Unit(15.),
        "sixteen" => NumberWord::Unit(16.),
        "seventeen" => NumberWord::Unit(17.),
        "eighteen" => NumberWord::Unit(18.),
        "nineteen" => NumberWord::Unit(19.),
        "twenty" => NumberWord::Tens(20.),
        "thirty" => NumberWord::Tens(30.),
        "forty" => NumberWord::Tens(40.),
        "fifty" => NumberWord::Tens(50.),
        "sixty" => NumberWord::Tens(60.),
        "seventy" => NumberWord::Tens(70.),
        "eighty" => NumberWord::Tens(80.),
        "ninety" => NumberWord::Tens(90.),
        "hundred" => NumberWord::Hundred,
        "thousand" => NumberWord::Scale(1e3),
        "million" => NumberWord::Scale(1e6),
        "billion" => NumberWord::Scale(1e9),
        _ => return None,
    };
    Some(word)
}

fn scale_multiplier(word: &str) -> Option<f64> {
    match number_word(word)? {
        NumberWord::Hundred => Some(100.),
        NumberWord::Scale(scale) => Some(scale),
        _ => None,
    }
}

/// Finds all the non overlapping numbers of the sentence, from left to right
pub fn match_numbers(tokens: &[Token], language: Language) -> Vec<NumberMatch> {
    let mut numbers = vec![];
    let mut start = 0;
    while start < tokens.len() {
        let number = match_digit_number(tokens, start, language).or_else(|| {
            if language == Language::EN {
                match_spelled_number(tokens, start)
            } else {
                None
            }
        });
        match number {
            Some(number) => {
                start = number.end;
                numbers.push(number);
            }
            None => start += 1,
        }
    }
    numbers
}

fn match_digit_number(tokens: &[Token], start: usize, language: Language) -> Option<NumberMatch> {
    if !is_digits(&tokens[start].value) {
        return None;
    }
    let joins = |separator_ix: usize| {
        separator_ix + 1 < tokens.len()
            && tokens[separator_ix].is_adjacent_to(&tokens[separator_ix - 1])
            && tokens[separator_ix + 1].is_adjacent_to(&tokens[separator_ix])
            && is_digits(&tokens[separator_ix + 1].value)
    };
    let mut digits = tokens[start].value.clone();
    let mut end = start + 1;
    while end < tokens.len()
        && tokens[end].value == ","
        && joins(end)
        && tokens[end + 1].value.len() == 3
    {
        digits.push_str(&tokens[end + 1].value);
        end += 2;
    }
    if end < tokens.len() && tokens[end].value == "." && joins(end) {
        digits.push('.');
        digits.push_str(&tokens[end + 1].value);
        end += 2;
    }
    let mut value = digits.parse::<f64>().ok()?;
    if language == Language::EN && end < tokens.len() {
        if let Some(multiplier) = scale_multiplier(&tokens[end].value) {
            value *= multiplier;
            end += 1;
        }
    }
    Some(NumberMatch { start, end, value })
}

fn match_spelled_number(tokens: &[Token], start: usize) -> Option<NumberMatch> {
    let word_at = |index: usize| tokens.get(index).and_then(|t| number_word(&t.value));
    if tokens[start].value == "zero" {
        return Some(NumberMatch {
            start,
            end: start + 1,
            value: 0.,
        });
    }

    let mut state = SpelledState::Start;
    let mut total = 0.;
    let mut current = 0.;
    let mut last_match: Option<NumberMatch> = None;
    let mut index = start;
    while index < tokens.len() {
        let token = &tokens[index];
        if let Some(word) = number_word(&token.value) {
            state = match (state, word) {
                (_, NumberWord::Unit(value)) if value == 0. => break,
                (SpelledState::Start, NumberWord::Unit(value))
                | (SpelledState::Hundred, NumberWord::Unit(value))
                | (SpelledState::Scale, NumberWord::Unit(value)) => {
                    current += value;
                    SpelledState::Unit
                }
                (SpelledState::Tens, NumberWord::Unit(value)) if value < 10. => {
                    current += value;
                    SpelledState::Unit
                }
                (SpelledState::Start, NumberWord::Tens(value))
                | (SpelledState::Hundred, NumberWord::Tens(value))
                | (SpelledState::Scale, NumberWord::Tens(value)) => {
                    current += value;
                    SpelledState::Tens
                }
                (SpelledState::Unit, NumberWord::Hundred)
                | (SpelledState::Tens, NumberWord::Hundred)
                    if current < 100. =>
                {
                    current *= 100.;
                    SpelledState::Hundred
                }
                (SpelledState::Unit, NumberWord::Scale(scale))
                | (SpelledState::Tens, NumberWord::Scale(scale))
                | (SpelledState::Hundred, NumberWord::Scale(scale)) => {
                    total += current * scale;
                    current = 0.;
                    SpelledState::Scale
                }
                _ => break,
            };
            last_match = Some(NumberMatch {
                start,
                end: index + 1,
                value: total + current,
            });
            index += 1;
            continue;
        }
        let next_is_unit = match word_at(index + 1) {
            Some(NumberWord::Unit(value)) => value > 0. && value < 10.,
            _ => false,
        };
        let next_is_unit_or_tens = next_is_unit
            || match word_at(index + 1) {
                Some(NumberWord::Unit(value)) => value > 0.,
                Some(NumberWord::Tens(_)) => true,
                _ => false,
            };
        let is_connector = match (state, &*token.value) {
            (SpelledState::Hundred, "and") | (SpelledState::Scale, "and") => next_is_unit_or_tens,
            (SpelledState::Tens, "-") => {
                next_is_unit
                    && token.is_adjacent_to(&tokens[index - 1])
                    && tokens[index + 1].is_adjacent_to(token)
            }
            _ => false,
        };
        if !is_connector {
            break;
        }
        index += 1;
    }
    last_match
}

/// Matches an ordinal starting at token `start`, returning its end token index and its value
pub fn match_ordinal(tokens: &[Token], start: usize) -> Option<(usize, i64)> {
    let value = &*tokens[start].value;
    if let Some(captures) = DIGIT_ORDINAL_REGEX.captures(value) {
        return captures[1].parse::<i64>().ok().map(|ordinal| (start + 1, ordinal));
    }
    let ordinal = match value {
        "first" => 1,
        "second" => 2,
        "third" => 3,
        "fourth" => 4,
        "fifth" => 5,
        "sixth" => 6,
        "seventh" => 7,
        "eighth" => 8,
        "ninth" => 9,
        "tenth" => 10,
        "eleventh" => 11,
        "twelfth" => 12,
        "thirteenth" => 13,
        "fourteenth" => 14,
        "fifteenth" => 15,
        "sixteenth" => 16,
        "seventeenth" => 17,
        "eighteenth" => 18,
        "nineteenth" => 19,
        "twentieth" => 20,
        "thirtieth" => 30,
        _ => return None,
    };
    Some((start + 1, ordinal))
}
