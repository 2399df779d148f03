use std::collections::HashMap;
use std::fs::File;
use std::ops::Range;
use std::path::Path;

use failure::ResultExt;
use serde_derive::Deserialize;

use crate::errors::*;
use crate::language::Language;
use crate::preprocessing::tokenize;
use crate::utils::{substring_with_char_range, EntityName};

#[derive(Debug, Clone, PartialEq)]
pub struct GazetteerEntityMatch {
    pub value: String,
    pub resolved_value: String,
    /// Character range in the parsed sentence
    pub range: Range<usize>,
    pub entity_identifier: EntityName,
}

#[derive(Debug, Deserialize)]
struct GazetteerParserModel {
    entities: Vec<GazetteerEntityModel>,
}

#[derive(Debug, Deserialize)]
struct GazetteerEntityModel {
    entity_identifier: String,
    values: Vec<EntityValueModel>,
}

#[derive(Debug, Deserialize)]
struct EntityValueModel {
    raw_value: String,
    resolved_value: String,
}

struct GazetteerEntity {
    identifier: EntityName,
    values: HashMap<Vec<String>, String>,
    max_nb_tokens: usize,
}

/// Matches sentences against lists of entity values. Values are compared token by token, after
/// normalization.
pub struct GazetteerParser {
    language: Language,
    entities: Vec<GazetteerEntity>,
}

impl GazetteerParser {
    pub fn from_path<P: AsRef<Path>>(path: P, language: Language) -> Result<Self> {
        let parser_path = path.as_ref().join("parser.json");
        let parser_file = File::open(&parser_path)
            .with_context(|_| format!("Cannot open gazetteer parser file {:?}", parser_path))?;
        let model: GazetteerParserModel = serde_json::from_reader(parser_file)
            .with_context(|_| format!("Cannot deserialize gazetteer parser {:?}", parser_path))?;
        Ok(Self::new(model, language))
    }

    fn new(model: GazetteerParserModel, language: Language) -> Self {
        let entities = model
            .entities
            .into_iter()
            .map(|entity_model| {
                let mut values = HashMap::new();
                for value in entity_model.values {
                    let normalized_tokens = normalized_tokens(&value.raw_value, language);
                    if !normalized_tokens.is_empty() {
                        values
                            .entry(normalized_tokens)
                            .or_insert(value.resolved_value);
                    }
                }
                let max_nb_tokens = values.keys().map(|tokens| tokens.len()).max().unwrap_or(0);
                GazetteerEntity {
                    identifier: entity_model.entity_identifier,
                    values,
                    max_nb_tokens,
                }
            })
            .collect();
        Self { language, entities }
    }

    pub fn entity_identifiers(&self) -> Vec<EntityName> {
        self.entities
            .iter()
            .map(|entity| entity.identifier.clone())
            .collect()
    }

    /// For each entity, the sentence is scanned from left to right and the longest match
    /// starting at each position is kept. Matches of a single entity never overlap.
    pub fn extract_entities(
        &self,
        sentence: &str,
        filter_entities: Option<&[EntityName]>,
    ) -> Vec<GazetteerEntityMatch> {
        let tokens = tokenize(sentence, self.language);
        let normalized_values: Vec<String> = tokens
            .iter()
            .map(|token| token.normalized_value())
            .collect();
        let mut matches = vec![];
        for entity in self.entities.iter().filter(|entity| {
            filter_entities
                .map(|filter| filter.contains(&entity.identifier))
                .unwrap_or(true)
        }) {
            let mut start = 0;
            while start < tokens.len() {
                let max_end = tokens.len().min(start + entity.max_nb_tokens);
                let longest_match = (start + 1..=max_end).rev().find_map(|end| {
                    entity
                        .values
                        .get(&normalized_values[start..end])
                        .map(|resolved_value| (end, resolved_value))
                });
                if let Some((end, resolved_value)) = longest_match {
                    let range = tokens[start].char_range.start..tokens[end - 1].char_range.end;
                    matches.push(GazetteerEntityMatch {
                        value: substring_with_char_range(sentence, &range),
                        resolved_value: resolved_value.clone(),
                        range,
                        entity_identifier: entity.identifier.clone(),
                    });
                    start = end;
                } else {
                    start += 1;
                }
            }
        }
        matches.sort_by_key(|entity_match| entity_match.range.start);
        matches
    }
}

fn normalized_tokens(value: &str, language: Language) -> Vec<String> {
    tokenize(value, language)
        .iter()
        .map(|token| token.normalized_value())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parser() -> GazetteerParser {
        let model: GazetteerParserModel = serde_json::from_str(
            r#"{
                "entities": [
                    {
                        "entity_identifier": "Temperature",
                        "values": [
                            {"raw_value": "hot", "resolved_value": "hot"},
                            {"raw_value": "boiling", "resolved_value": "hot"},
                            {"raw_value": "iced", "resolved_value": "cold"}
                        ]
                    },
                    {
                        "entity_identifier": "Beverage",
                        "values": [
                            {"raw_value": "tea", "resolved_value": "tea"},
                            {"raw_value": "iced tea", "resolved_value": "iced tea"},
                            {"raw_value": "Café au lait", "resolved_value": "cafe au lait"}
                        ]
                    }
                ]
            }"#,
        )
        .unwrap();
        GazetteerParser::new(model, Language::EN)
    }

    #[test]
    fn test_extract_entities_takes_longest_match() {
        // Given
        let parser = parser();

        // When
        let entities = parser.extract_entities("I want an ICED tea and a boiling café au lait", None);

        // Then
        let expected_entities = vec![
            GazetteerEntityMatch {
                value: "ICED".to_string(),
                resolved_value: "cold".to_string(),
                range: 10..14,
                entity_identifier: "Temperature".to_string(),
            },
            GazetteerEntityMatch {
                value: "ICED tea".to_string(),
                resolved_value: "iced tea".to_string(),
                range: 10..18,
                entity_identifier: "Beverage".to_string(),
            },
            GazetteerEntityMatch {
                value: "boiling".to_string(),
                resolved_value: "hot".to_string(),
                range: 25..32,
                entity_identifier: "Temperature".to_string(),
            },
            GazetteerEntityMatch {
                value: "café au lait".to_string(),
                resolved_value: "cafe au lait".to_string(),
                range: 33..45,
                entity_identifier: "Beverage".to_string(),
            },
        ];
        assert_eq!(expected_entities, entities);
    }

    #[test]
    fn test_extract_entities_with_filter() {
        // Given
        let parser = parser();
        let filter = vec!["Beverage".to_string()];

        // When
        let entities = parser.extract_entities("hot tea please", Some(&filter));

        // Then
        assert_eq!(1, entities.len());
        assert_eq!("tea", entities[0].value);
        assert_eq!(4..7, entities[0].range);
    }

    #[test]
    fn test_extract_entities_does_not_match_partial_tokens() {
        assert!(parser().extract_entities("teapot hotter", None).is_empty());
    }
}
