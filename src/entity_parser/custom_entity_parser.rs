use std::fs::File;
use std::path::Path;
use std::str::FromStr;
use std::sync::Mutex;

use failure::ResultExt;
use itertools::Itertools;
use log::info;
use serde_derive::Deserialize;

use super::gazetteer_parser::{GazetteerEntityMatch, GazetteerParser};
use super::utils::{poisoned_cache_error, Cache};
use crate::config::NluEngineConfig;
use crate::errors::*;
use crate::language::Language;
use crate::preprocessing::{tokenize, Token};
use crate::utils::{substring_with_char_range, EntityName};

pub type CustomEntity = GazetteerEntityMatch;

pub trait CustomEntityParser: Send + Sync {
    fn extract_entities(
        &self,
        sentence: &str,
        filter_entity_kinds: Option<&[EntityName]>,
    ) -> Result<Vec<CustomEntity>>;
}

pub struct CachingCustomEntityParser {
    language: Language,
    parser: GazetteerParser,
    cache: Mutex<Cache<CacheKey, Vec<CustomEntity>>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CacheKey {
    input: String,
    kinds: Option<Vec<EntityName>>,
}

#[derive(Debug, Deserialize)]
struct CustomEntityParserMetadata {
    language: String,
    parser_directory: String,
}

impl CustomEntityParser for CachingCustomEntityParser {
    fn extract_entities(
        &self,
        sentence: &str,
        filter_entity_kinds: Option<&[EntityName]>,
    ) -> Result<Vec<CustomEntity>> {
        let cache_key = CacheKey {
            input: sentence.to_string(),
            kinds: filter_entity_kinds.map(|entity_kinds| entity_kinds.to_vec()),
        };

        self.cache
            .lock()
            .map_err(|_| poisoned_cache_error())?
            .try_cache(&cache_key, |cache_key| {
                Ok(self.parse(&cache_key.input, cache_key.kinds.as_ref().map(|k| &**k)))
            })
    }
}

impl CachingCustomEntityParser {
    pub fn from_path<P: AsRef<Path>>(path: P, config: &NluEngineConfig) -> Result<Self> {
        info!("Loading custom entity parser ({:?}) ...", path.as_ref());
        let metadata_path = path.as_ref().join("metadata.json");
        let metadata_file = File::open(&metadata_path).with_context(|_| {
            format!(
                "Cannot open metadata file for custom entity parser at path: {:?}",
                metadata_path
            )
        })?;
        let metadata: CustomEntityParserMetadata = serde_json::from_reader(metadata_file)
            .with_context(|_| "Cannot deserialize custom entity parser metadata")?;
        let language = Language::from_str(&metadata.language)?;
        let parser = GazetteerParser::from_path(path.as_ref().join(&metadata.parser_directory), language)?;
        let cache = Mutex::new(Cache::new(config.custom_entity_cache_capacity));
        info!("Custom entity parser loaded");
        Ok(Self {
            language,
            parser,
            cache,
        })
    }

    /// Matches are searched in the tokens joined with single spaces, and their ranges are then
    /// mapped back onto the original sentence
    fn parse(&self, sentence: &str, filter_entity_kinds: Option<&[EntityName]>) -> Vec<CustomEntity> {
        let tokens = tokenize(sentence, self.language);
        let shifts = compute_char_shifts(&tokens);
        let cleaned_input = tokens.iter().map(|token| &*token.value).join(" ");
        self.parser
            .extract_entities(&cleaned_input, filter_entity_kinds)
            .into_iter()
            .map(|mut entity_match| {
                let range_start = entity_match.range.start;
                let range_end = entity_match.range.end;
                let remapped_range_start = (range_start as i32 - shifts[range_start]) as usize;
                let remapped_range_end = (range_end as i32 - shifts[range_end - 1]) as usize;
                entity_match.range = remapped_range_start..remapped_range_end;
                entity_match.value = substring_with_char_range(sentence, &entity_match.range);
                entity_match
            })
            .collect()
    }
}

/// Computes the shifts in characters that occur when comparing the original sentence with the
/// string made of all its tokens separated by a single space
///
/// # Examples
///
/// If "hello?world" is tokenized in ["hello", "?", "world"], then the character shifts between
/// "hello?world" and "hello ? world" are [0, 0, 0, 0, 0, 1, 1, 2, 2, 2, 2, 2, 2]
fn compute_char_shifts(tokens: &[Token]) -> Vec<i32> {
    let mut characters_shifts = vec![];
    let mut current_shift = 0;

    for (token_index, token) in tokens.iter().enumerate() {
        let (previous_token_end, previous_space_len) = if token_index == 0 {
            (0, 0)
        } else {
            (tokens[token_index - 1].char_range.end as i32, 1)
        };
        current_shift -= (token.char_range.start as i32 - previous_token_end) - previous_space_len;
        let token_len = token.char_range.len() as i32;
        let index_shift = token_len + previous_space_len;
        characters_shifts.extend((0..index_shift).map(|_| current_shift));
    }
    characters_shifts
}
