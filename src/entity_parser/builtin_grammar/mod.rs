mod datetime;
mod numbers;
mod quantities;

use std::ops::Range;

use chrono::{DateTime, FixedOffset};

use crate::language::Language;
use crate::ontology::*;
use crate::preprocessing::tokenize;
use crate::utils::substring_with_char_range;

use self::numbers::{match_numbers, match_ordinal};

/// An entity spanning the tokens `tokens`
#[derive(Debug, Clone, PartialEq)]
pub struct GrammarMatch {
    pub tokens: Range<usize>,
    pub kind: BuiltinEntityKind,
    pub value: SlotValue,
}

/// Rule based extraction of the non gazetteer builtin entities
pub struct BuiltinGrammar {
    language: Language,
}

impl BuiltinGrammar {
    pub fn new(language: Language) -> Self {
        Self { language }
    }

    pub fn supported_entity_kinds(&self) -> &'static [BuiltinEntityKind] {
        match self.language {
            Language::EN => &[
                BuiltinEntityKind::AmountOfMoney,
                BuiltinEntityKind::Duration,
                BuiltinEntityKind::Number,
                BuiltinEntityKind::Ordinal,
                BuiltinEntityKind::Temperature,
                BuiltinEntityKind::Datetime,
                BuiltinEntityKind::Percentage,
            ],
            _ => &[
                BuiltinEntityKind::Number,
                BuiltinEntityKind::Temperature,
                BuiltinEntityKind::Percentage,
            ],
        }
    }

    /// Returns every match of the requested kinds, overlapping matches included
    pub fn extract_entities(
        &self,
        sentence: &str,
        entity_kinds: &[BuiltinEntityKind],
        reference_time: &DateTime<FixedOffset>,
    ) -> Vec<BuiltinEntity> {
        let tokens = tokenize(sentence, self.language);
        let numbers = match_numbers(&tokens, self.language);
        let mut matches = vec![];
        for kind in entity_kinds
            .iter()
            .filter(|kind| self.supported_entity_kinds().contains(*kind))
        {
            match kind {
                BuiltinEntityKind::Number => {
                    matches.extend(numbers.iter().map(|number| GrammarMatch {
                        tokens: number.start..number.end,
                        kind: BuiltinEntityKind::Number,
                        value: SlotValue::Number(NumberValue {
                            value: number.value,
                        }),
                    }))
                }
                BuiltinEntityKind::Ordinal => {
                    matches.extend((0..tokens.len()).filter_map(|start| {
                        match_ordinal(&tokens, start).map(|(end, value)| GrammarMatch {
                            tokens: start..end,
                            kind: BuiltinEntityKind::Ordinal,
                            value: SlotValue::Ordinal(OrdinalValue { value }),
                        })
                    }))
                }
                BuiltinEntityKind::Percentage => matches.extend(quantities::match_percentages(
                    &tokens,
                    &numbers,
                    self.language,
                )),
                BuiltinEntityKind::Temperature => matches.extend(
                    quantities::match_temperatures(&tokens, &numbers, self.language),
                ),
                BuiltinEntityKind::AmountOfMoney => {
                    matches.extend(quantities::match_amounts_of_money(&tokens, &numbers))
                }
                BuiltinEntityKind::Duration => {
                    matches.extend(quantities::match_durations(&tokens, &numbers))
                }
                BuiltinEntityKind::Datetime => {
                    matches.extend(datetime::match_datetimes(&tokens, reference_time))
                }
                BuiltinEntityKind::MusicAlbum
                | BuiltinEntityKind::MusicArtist
                | BuiltinEntityKind::MusicTrack => {}
            }
        }

        matches
            .into_iter()
            .map(|grammar_match| {
                let range = tokens[grammar_match.tokens.start].char_range.start
                    ..tokens[grammar_match.tokens.end - 1].char_range.end;
                BuiltinEntity {
                    value: substring_with_char_range(sentence, &range),
                    range,
                    entity: grammar_match.value,
                    entity_kind: grammar_match.kind,
                }
            })
            .collect()
    }
}
