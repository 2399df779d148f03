use crate::language::Language;
use crate::ontology::*;
use crate::preprocessing::Token;

use super::numbers::NumberMatch;
use super::GrammarMatch;

const APPROXIMATION_WORDS: &[&str] = &["about", "around", "approximately", "roughly"];

fn token_value(tokens: &[Token], index: usize) -> Option<&str> {
    tokens.get(index).map(|token| &*token.value)
}

fn number_starting_at(numbers: &[NumberMatch], start: usize) -> Option<&NumberMatch> {
    numbers.iter().find(|number| number.start == start)
}

/// Extends the match to a preceding approximation word, if any
fn with_precision(tokens: &[Token], start: usize) -> (usize, Precision) {
    if start > 0 && APPROXIMATION_WORDS.contains(&&*tokens[start - 1].value) {
        (start - 1, Precision::Approximate)
    } else {
        (start, Precision::Exact)
    }
}

pub fn match_percentages(
    tokens: &[Token],
    numbers: &[NumberMatch],
    language: Language,
) -> Vec<GrammarMatch> {
    numbers
        .iter()
        .filter_map(|number| {
            let is_percentage = match token_value(tokens, number.end) {
                Some("%") => true,
                Some("percent") => language == Language::EN,
                _ => false,
            };
            if is_percentage {
                Some(GrammarMatch {
                    tokens: number.start..number.end + 1,
                    kind: BuiltinEntityKind::Percentage,
                    value: SlotValue::Percentage(PercentageValue {
                        value: number.value,
                    }),
                })
            } else {
                None
            }
        })
        .collect()
}

fn temperature_unit(value: &str) -> Option<&'static str> {
    match value {
        "c" | "celsius" => Some("celsius"),
        "f" | "fahrenheit" => Some("fahrenheit"),
        "k" | "kelvin" => Some("kelvin"),
        _ => None,
    }
}

pub fn match_temperatures(
    tokens: &[Token],
    numbers: &[NumberMatch],
    language: Language,
) -> Vec<GrammarMatch> {
    numbers
        .iter()
        .filter_map(|number| {
            let mut end = number.end;
            let mut unit = None;
            match token_value(tokens, end) {
                Some("°") => {
                    end += 1;
                }
                Some("degree") | Some("degrees") if language == Language::EN => {
                    end += 1;
                }
                Some(value @ "celsius") | Some(value @ "fahrenheit") | Some(value @ "kelvin")
                    if language == Language::EN =>
                {
                    unit = temperature_unit(value);
                    end += 1;
                }
                _ => return None,
            }
            if unit.is_none() {
                if let Some(value_unit) = token_value(tokens, end).and_then(temperature_unit) {
                    unit = Some(value_unit);
                    end += 1;
                }
            }
            Some(GrammarMatch {
                tokens: number.start..end,
                kind: BuiltinEntityKind::Temperature,
                value: SlotValue::Temperature(TemperatureValue {
                    value: number.value as f32,
                    unit: Some(unit.unwrap_or("degree").to_string()),
                }),
            })
        })
        .collect()
}

fn currency_symbol(value: &str) -> Option<&'static str> {
    match value {
        "$" => Some("$"),
        "€" => Some("€"),
        "£" => Some("£"),
        _ => None,
    }
}

fn currency_suffix(value: &str) -> Option<&'static str> {
    currency_symbol(value).or_else(|| match value {
        "dollar" | "dollars" | "usd" => Some("$"),
        "euro" | "euros" | "eur" => Some("€"),
        "pound" | "pounds" | "gbp" => Some("£"),
        "cent" | "cents" => Some("cent"),
        _ => None,
    })
}

pub fn match_amounts_of_money(tokens: &[Token], numbers: &[NumberMatch]) -> Vec<GrammarMatch> {
    numbers
        .iter()
        .filter_map(|number| {
            let prefixed_unit = if number.start > 0 {
                currency_symbol(&tokens[number.start - 1].value)
            } else {
                None
            };
            let (start, end, unit) = match prefixed_unit {
                Some(unit) => (number.start - 1, number.end, unit),
                None => {
                    let unit = token_value(tokens, number.end).and_then(currency_suffix)?;
                    (number.start, number.end + 1, unit)
                }
            };
            let (start, precision) = with_precision(tokens, start);
            Some(GrammarMatch {
                tokens: start..end,
                kind: BuiltinEntityKind::AmountOfMoney,
                value: SlotValue::AmountOfMoney(AmountOfMoneyValue {
                    value: number.value as f32,
                    precision,
                    unit: Some(unit.to_string()),
                }),
            })
        })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum DurationUnit {
    Second,
    Minute,
    Hour,
    Day,
    Week,
    Month,
    Quarter,
    Year,
}

fn duration_unit(value: &str) -> Option<DurationUnit> {
    match value {
        "second" | "seconds" | "sec" | "secs" => Some(DurationUnit::Second),
        "minute" | "minutes" | "min" | "mins" => Some(DurationUnit::Minute),
        "hour" | "hours" => Some(DurationUnit::Hour),
        "day" | "days" => Some(DurationUnit::Day),
        "week" | "weeks" => Some(DurationUnit::Week),
        "month" | "months" => Some(DurationUnit::Month),
        "quarter" | "quarters" => Some(DurationUnit::Quarter),
        "year" | "years" => Some(DurationUnit::Year),
        _ => None,
    }
}

fn add_duration(duration: &mut DurationValue, unit: DurationUnit, quantity: i64) {
    match unit {
        DurationUnit::Second => duration.seconds += quantity,
        DurationUnit::Minute => duration.minutes += quantity,
        DurationUnit::Hour => duration.hours += quantity,
        DurationUnit::Day => duration.days += quantity,
        DurationUnit::Week => duration.weeks += quantity,
        DurationUnit::Month => duration.months += quantity,
        DurationUnit::Quarter => duration.quarters += quantity,
        DurationUnit::Year => duration.years += quantity,
    }
}

/// Matches a single `<quantity> <unit>` element, returning its end and its content
fn match_duration_element(
    tokens: &[Token],
    numbers: &[NumberMatch],
    start: usize,
) -> Option<(usize, DurationUnit, i64)> {
    let (quantity_end, quantity) = match number_starting_at(numbers, start) {
        Some(number) if number.is_integer() => (number.end, number.value as i64),
        Some(_) => return None,
        None => match token_value(tokens, start) {
            Some("a") | Some("an") => (start + 1, 1),
            _ => return None,
        },
    };
    let unit = token_value(tokens, quantity_end).and_then(duration_unit)?;
    Some((quantity_end + 1, unit, quantity))
}

pub fn match_durations(tokens: &[Token], numbers: &[NumberMatch]) -> Vec<GrammarMatch> {
    let mut matches = vec![];
    let mut start = 0;
    while start < tokens.len() {
        let (mut end, unit, quantity) = match match_duration_element(tokens, numbers, start) {
            Some(element) => element,
            None => {
                start += 1;
                continue;
            }
        };
        let mut duration = DurationValue::default();
        add_duration(&mut duration, unit, quantity);
        while token_value(tokens, end) == Some("and") {
            match match_duration_element(tokens, numbers, end + 1) {
                Some((element_end, unit, quantity)) => {
                    add_duration(&mut duration, unit, quantity);
                    end = element_end;
                }
                None => break,
            }
        }
        let (match_start, precision) = with_precision(tokens, start);
        duration.precision = precision;
        matches.push(GrammarMatch {
            tokens: match_start..end,
            kind: BuiltinEntityKind::Duration,
            value: SlotValue::Duration(duration),
        });
        start = end;
    }
    matches
}
