use std::fs::File;
use std::path::Path;
use std::str::FromStr;
use std::sync::Mutex;

use failure::{format_err, ResultExt};
use log::info;
use serde_derive::Deserialize;

use super::builtin_grammar::BuiltinGrammar;
use super::gazetteer_parser::GazetteerParser;
use super::utils::{poisoned_cache_error, Cache};
use crate::config::{NluEngineConfig, ReferenceClock};
use crate::errors::*;
use crate::language::Language;
use crate::ontology::{BuiltinEntity, BuiltinEntityKind};
use crate::utils::{deduplicate_overlapping_items, ranges_overlap};

pub trait BuiltinEntityParser: Send + Sync {
    fn extract_entities(
        &self,
        sentence: &str,
        filter_entity_kinds: Option<&[BuiltinEntityKind]>,
        use_cache: bool,
    ) -> Result<Vec<BuiltinEntity>>;

    fn supported_entity_kinds(&self) -> Vec<BuiltinEntityKind>;
}

pub struct CachingBuiltinEntityParser {
    grammar: BuiltinGrammar,
    gazetteer_parser: Option<GazetteerParser>,
    clock: ReferenceClock,
    cache: Mutex<Cache<CacheKey, Vec<BuiltinEntity>>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CacheKey {
    input: String,
    kinds: Vec<BuiltinEntityKind>,
}

#[derive(Debug, Deserialize)]
struct BuiltinEntityParserMetadata {
    language: String,
    gazetteer_parser: Option<String>,
}

impl BuiltinEntityParser for CachingBuiltinEntityParser {
    fn extract_entities(
        &self,
        sentence: &str,
        filter_entity_kinds: Option<&[BuiltinEntityKind]>,
        use_cache: bool,
    ) -> Result<Vec<BuiltinEntity>> {
        let lowercased_sentence = lowercase(sentence);
        let kinds = filter_entity_kinds
            .map(|entity_kinds| entity_kinds.to_vec())
            .unwrap_or_else(|| self.supported_entity_kinds());
        // Relative datetimes depend on the current time
        let time_dependent =
            !self.clock.is_fixed() && kinds.contains(&BuiltinEntityKind::Datetime);
        if !use_cache || time_dependent {
            return self.parse(&lowercased_sentence, &kinds);
        }
        let cache_key = CacheKey {
            input: lowercased_sentence,
            kinds,
        };

        self.cache
            .lock()
            .map_err(|_| poisoned_cache_error())?
            .try_cache(&cache_key, |cache_key| {
                self.parse(&cache_key.input, &cache_key.kinds)
            })
    }

    fn supported_entity_kinds(&self) -> Vec<BuiltinEntityKind> {
        let mut kinds = self.grammar.supported_entity_kinds().to_vec();
        if let Some(gazetteer_parser) = self.gazetteer_parser.as_ref() {
            kinds.extend(
                gazetteer_parser
                    .entity_identifiers()
                    .iter()
                    .filter_map(|identifier| BuiltinEntityKind::from_identifier(identifier).ok()),
            );
        }
        kinds
    }
}

impl CachingBuiltinEntityParser {
    pub fn from_path<P: AsRef<Path>>(path: P, config: &NluEngineConfig) -> Result<Self> {
        info!("Loading builtin entity parser ({:?}) ...", path.as_ref());
        let metadata_path = path.as_ref().join("metadata.json");
        let metadata_file = File::open(&metadata_path).with_context(|_| {
            format!(
                "Cannot open metadata file for builtin entity parser at path: {:?}",
                metadata_path
            )
        })?;
        let metadata: BuiltinEntityParserMetadata = serde_json::from_reader(metadata_file)
            .with_context(|_| "Cannot deserialize builtin entity parser metadata")?;
        let language = Language::from_str(&metadata.language)?;
        let gazetteer_parser = metadata
            .gazetteer_parser
            .map(|directory| GazetteerParser::from_path(path.as_ref().join(directory), language))
            .transpose()?;
        if let Some(gazetteer_parser) = gazetteer_parser.as_ref() {
            for identifier in gazetteer_parser.entity_identifiers() {
                let kind = BuiltinEntityKind::from_identifier(&identifier)?;
                if !kind.is_gazetteer_entity() {
                    return Err(format_err!(
                        "Builtin entity '{}' cannot be resolved with a gazetteer",
                        identifier
                    ));
                }
            }
        }
        let parser = Self::new(language, gazetteer_parser, config);
        info!("Builtin entity parser loaded");
        Ok(parser)
    }

    fn new(
        language: Language,
        gazetteer_parser: Option<GazetteerParser>,
        config: &NluEngineConfig,
    ) -> Self {
        Self {
            grammar: BuiltinGrammar::new(language),
            gazetteer_parser,
            clock: ReferenceClock::from_config(config),
            cache: Mutex::new(Cache::new(config.builtin_entity_cache_capacity)),
        }
    }

    fn parse(&self, sentence: &str, kinds: &[BuiltinEntityKind]) -> Result<Vec<BuiltinEntity>> {
        let mut entities = self
            .grammar
            .extract_entities(sentence, kinds, &self.clock.now());
        if let Some(gazetteer_parser) = self.gazetteer_parser.as_ref() {
            let gazetteer_entities: Vec<String> = kinds
                .iter()
                .filter(|kind| kind.is_gazetteer_entity())
                .map(|kind| kind.identifier().to_string())
                .collect();
            if !gazetteer_entities.is_empty() {
                for entity_match in
                    gazetteer_parser.extract_entities(sentence, Some(&gazetteer_entities))
                {
                    let kind = BuiltinEntityKind::from_identifier(&entity_match.entity_identifier)?;
                    if let Some(value) = kind.gazetteer_value(entity_match.resolved_value) {
                        entities.push(BuiltinEntity {
                            value: entity_match.value,
                            range: entity_match.range,
                            entity: value,
                            entity_kind: kind,
                        });
                    }
                }
            }
        }
        Ok(deduplicate_builtin_entities(entities))
    }
}

/// Lowercases the sentence while keeping its length in characters, so that entity ranges are
/// valid in the original sentence
fn lowercase(sentence: &str) -> String {
    sentence
        .chars()
        .map(|c| c.to_lowercase().next().unwrap_or(c))
        .collect()
}

fn deduplicate_builtin_entities(entities: Vec<BuiltinEntity>) -> Vec<BuiltinEntity> {
    let entities_overlap = |lhs: &BuiltinEntity, rhs: &BuiltinEntity| {
        ranges_overlap(&lhs.range, &rhs.range)
    };
    let sort_key = |entity: &BuiltinEntity| {
        (
            -(entity.range.len() as i64),
            entity.range.start,
            entity.entity_kind,
        )
    };
    let mut deduplicated = deduplicate_overlapping_items(entities, entities_overlap, sort_key);
    deduplicated.sort_by_key(|entity| entity.range.start);
    deduplicated
}
