use std::collections::HashMap;
use std::sync::Arc;

use failure::format_err;
use itertools::Itertools;

use super::crf_utils::{get_scheme_prefix, TaggingScheme};
use super::feature_processor::{Feature, FeatureKindRepr};
use super::features_utils::{get_word_chunk, initial_string_from_tokens};
use crate::entity_parser::{BuiltinEntityParser, CustomEntityParser};
use crate::errors::*;
use crate::ontology::BuiltinEntityKind;
use crate::preprocessing::{get_shape, normalize, Token};
use crate::resources::gazetteer::Gazetteer;
use crate::resources::stemmer::Stemmer;
use crate::resources::word_clusterer::WordClusterer;
use crate::resources::SharedResources;
use crate::utils::{ranges_overlap, EntityName};

type FeatureArgs = HashMap<String, serde_json::Value>;

pub struct IsDigitFeature {}

impl Feature for IsDigitFeature {
    fn build_features(
        _args: &FeatureArgs,
        _shared_resources: Arc<SharedResources>,
    ) -> Result<Vec<Box<dyn Feature>>> {
        Ok(vec![Box::new(Self {})])
    }

    fn compute(&self, tokens: &[Token], token_index: usize) -> Result<Option<String>> {
        Ok(is_digit(&tokens[token_index].value))
    }
}

pub struct LengthFeature {}

impl Feature for LengthFeature {
    fn build_features(
        _args: &FeatureArgs,
        _shared_resources: Arc<SharedResources>,
    ) -> Result<Vec<Box<dyn Feature>>> {
        Ok(vec![Box::new(Self {})])
    }

    fn compute(&self, tokens: &[Token], token_index: usize) -> Result<Option<String>> {
        Ok(length(&tokens[token_index].value))
    }
}

pub struct IsFirstFeature {}

impl Feature for IsFirstFeature {
    fn build_features(
        _args: &FeatureArgs,
        _shared_resources: Arc<SharedResources>,
    ) -> Result<Vec<Box<dyn Feature>>> {
        Ok(vec![Box::new(Self {})])
    }

    fn compute(&self, _tokens: &[Token], token_index: usize) -> Result<Option<String>> {
        Ok(if token_index == 0 {
            Some("1".to_string())
        } else {
            None
        })
    }
}

pub struct IsLastFeature {}

impl Feature for IsLastFeature {
    fn build_features(
        _args: &FeatureArgs,
        _shared_resources: Arc<SharedResources>,
    ) -> Result<Vec<Box<dyn Feature>>> {
        Ok(vec![Box::new(Self {})])
    }

    fn compute(&self, tokens: &[Token], token_index: usize) -> Result<Option<String>> {
        Ok(if token_index + 1 == tokens.len() {
            Some("1".to_string())
        } else {
            None
        })
    }
}

pub struct NgramFeature {
    ngram_size: usize,
    opt_common_words_gazetteer: Option<Arc<dyn Gazetteer>>,
    opt_stemmer: Option<Arc<dyn Stemmer>>,
}

impl Feature for NgramFeature {
    fn name(&self) -> String {
        format!("{}_{}", self.feature_kind().identifier(), self.ngram_size)
    }

    fn build_features(
        args: &FeatureArgs,
        shared_resources: Arc<SharedResources>,
    ) -> Result<Vec<Box<dyn Feature>>> {
        let ngram_size = parse_as_u64(args, "n")? as usize;
        let common_words_gazetteer_name = parse_as_opt_string(args, "common_words_gazetteer_name")?;
        let opt_common_words_gazetteer = common_words_gazetteer_name
            .map(|gazetteer_name| {
                shared_resources
                    .gazetteers
                    .get(&gazetteer_name)
                    .cloned()
                    .ok_or_else(|| {
                        format_err!(
                            "Cannot find gazetteer '{}' in shared resources",
                            gazetteer_name
                        )
                    })
            })
            .transpose()?;
        let opt_stemmer = get_optional_stemmer(args, &shared_resources)?;
        Ok(vec![Box::new(Self {
            ngram_size,
            opt_common_words_gazetteer,
            opt_stemmer,
        })])
    }

    fn compute(&self, tokens: &[Token], token_index: usize) -> Result<Option<String>> {
        if token_index + self.ngram_size > tokens.len() {
            return Ok(None);
        }
        let ngram = tokens[token_index..token_index + self.ngram_size]
            .iter()
            .map(|token| {
                let stemmed_value = stem_normalized(&token.value, self.opt_stemmer.as_ref());
                match self.opt_common_words_gazetteer.as_ref() {
                    Some(gazetteer) if !gazetteer.contains(&stemmed_value) => {
                        "rare_word".to_string()
                    }
                    _ => stemmed_value,
                }
            })
            .join(" ");
        Ok(Some(ngram))
    }
}

pub struct ShapeNgramFeature {
    ngram_size: usize,
}

impl Feature for ShapeNgramFeature {
    fn name(&self) -> String {
        format!("{}_{}", self.feature_kind().identifier(), self.ngram_size)
    }

    fn build_features(
        args: &FeatureArgs,
        _shared_resources: Arc<SharedResources>,
    ) -> Result<Vec<Box<dyn Feature>>> {
        let ngram_size = parse_as_u64(args, "n")? as usize;
        Ok(vec![Box::new(Self { ngram_size })])
    }

    fn compute(&self, tokens: &[Token], token_index: usize) -> Result<Option<String>> {
        let end = token_index + self.ngram_size;
        Ok(if token_index < end && end <= tokens.len() {
            Some(
                tokens[token_index..end]
                    .iter()
                    .map(|token| get_shape(&token.value))
                    .join(" "),
            )
        } else {
            None
        })
    }
}

pub struct PrefixFeature {
    prefix_size: usize,
}

impl Feature for PrefixFeature {
    fn name(&self) -> String {
        format!("{}_{}", self.feature_kind().identifier(), self.prefix_size)
    }

    fn build_features(
        args: &FeatureArgs,
        _shared_resources: Arc<SharedResources>,
    ) -> Result<Vec<Box<dyn Feature>>> {
        let prefix_size = parse_as_u64(args, "prefix_size")? as usize;
        Ok(vec![Box::new(Self { prefix_size })])
    }

    fn compute(&self, tokens: &[Token], token_index: usize) -> Result<Option<String>> {
        Ok(prefix(&tokens[token_index].value, self.prefix_size))
    }
}

pub struct SuffixFeature {
    suffix_size: usize,
}

impl Feature for SuffixFeature {
    fn name(&self) -> String {
        format!("{}_{}", self.feature_kind().identifier(), self.suffix_size)
    }

    fn build_features(
        args: &FeatureArgs,
        _shared_resources: Arc<SharedResources>,
    ) -> Result<Vec<Box<dyn Feature>>> {
        let suffix_size = parse_as_u64(args, "suffix_size")? as usize;
        Ok(vec![Box::new(Self { suffix_size })])
    }

    fn compute(&self, tokens: &[Token], token_index: usize) -> Result<Option<String>> {
        Ok(suffix(&tokens[token_index].value, self.suffix_size))
    }
}

pub struct CustomEntityMatchFeature {
    entity: EntityName,
    tagging_scheme: TaggingScheme,
    custom_entity_parser: Arc<dyn CustomEntityParser>,
}

impl Feature for CustomEntityMatchFeature {
    fn name(&self) -> String {
        format!("{}_{}", self.feature_kind().identifier(), &self.entity)
    }

    fn build_features(
        args: &FeatureArgs,
        shared_resources: Arc<SharedResources>,
    ) -> Result<Vec<Box<dyn Feature>>> {
        let entities = parse_as_vec_string(args, "entities")?;
        let tagging_scheme_code = parse_as_u64(args, "tagging_scheme_code")? as u8;
        let tagging_scheme = TaggingScheme::from_u8(tagging_scheme_code)?;
        Ok(entities
            .into_iter()
            .map(|entity| {
                Box::new(Self {
                    entity,
                    tagging_scheme,
                    custom_entity_parser: shared_resources.custom_entity_parser.clone(),
                }) as Box<_>
            })
            .collect())
    }

    fn compute(&self, tokens: &[Token], token_index: usize) -> Result<Option<String>> {
        let text = initial_string_from_tokens(tokens);
        let entity_ranges = self
            .custom_entity_parser
            .extract_entities(&text, Some(&[self.entity.clone()]))?
            .into_iter()
            .map(|entity| entity.range)
            .collect_vec();
        Ok(find_entity_prefix(
            tokens,
            token_index,
            &entity_ranges,
            self.tagging_scheme,
        ))
    }
}

pub struct BuiltinEntityMatchFeature {
    tagging_scheme: TaggingScheme,
    builtin_entity_kind: BuiltinEntityKind,
    builtin_entity_parser: Arc<dyn BuiltinEntityParser>,
}

impl Feature for BuiltinEntityMatchFeature {
    fn name(&self) -> String {
        format!(
            "{}_{}",
            self.feature_kind().identifier(),
            self.builtin_entity_kind.identifier()
        )
    }

    fn build_features(
        args: &FeatureArgs,
        shared_resources: Arc<SharedResources>,
    ) -> Result<Vec<Box<dyn Feature>>> {
        let builtin_entity_labels = parse_as_vec_string(args, "entity_labels")?;
        let tagging_scheme_code = parse_as_u64(args, "tagging_scheme_code")? as u8;
        let tagging_scheme = TaggingScheme::from_u8(tagging_scheme_code)?;

        builtin_entity_labels
            .into_iter()
            .map(|label| {
                let builtin_entity_kind = BuiltinEntityKind::from_identifier(&label)?;
                Ok(Box::new(Self {
                    tagging_scheme,
                    builtin_entity_kind,
                    builtin_entity_parser: shared_resources.builtin_entity_parser.clone(),
                }) as Box<_>)
            })
            .collect()
    }

    fn compute(&self, tokens: &[Token], token_index: usize) -> Result<Option<String>> {
        let text = initial_string_from_tokens(tokens);
        let entity_ranges = self
            .builtin_entity_parser
            .extract_entities(&text, Some(&[self.builtin_entity_kind]), true)?
            .into_iter()
            .map(|entity| entity.range)
            .collect_vec();
        Ok(find_entity_prefix(
            tokens,
            token_index,
            &entity_ranges,
            self.tagging_scheme,
        ))
    }
}

pub struct WordClusterFeature {
    cluster_name: String,
    word_clusterer: Arc<dyn WordClusterer>,
}

impl Feature for WordClusterFeature {
    fn name(&self) -> String {
        format!("{}_{}", self.feature_kind().identifier(), self.cluster_name)
    }

    fn build_features(
        args: &FeatureArgs,
        shared_resources: Arc<SharedResources>,
    ) -> Result<Vec<Box<dyn Feature>>> {
        let cluster_name = parse_as_string(args, "cluster_name")?;
        let word_clusterer = shared_resources
            .word_clusterers
            .get(&cluster_name)
            .cloned()
            .ok_or_else(|| {
                format_err!(
                    "Cannot find word clusters '{}' in shared resources",
                    cluster_name
                )
            })?;
        Ok(vec![Box::new(Self {
            cluster_name,
            word_clusterer,
        })])
    }

    fn compute(&self, tokens: &[Token], token_index: usize) -> Result<Option<String>> {
        Ok(self
            .word_clusterer
            .get_cluster(&tokens[token_index].value.to_lowercase()))
    }
}

fn is_digit(value: &str) -> Option<String> {
    if !value.is_empty() && value.chars().all(|c| c.is_digit(10)) {
        Some("1".to_string())
    } else {
        None
    }
}

fn length(value: &str) -> Option<String> {
    Some(value.chars().count().to_string())
}

fn prefix(value: &str, prefix_size: usize) -> Option<String> {
    get_word_chunk(&normalize(value), prefix_size, 0, false)
}

fn suffix(value: &str, suffix_size: usize) -> Option<String> {
    let normalized = normalize(value);
    let chunk_start = normalized.chars().count();
    get_word_chunk(&normalized, suffix_size, chunk_start, true)
}

fn stem_normalized(value: &str, opt_stemmer: Option<&Arc<dyn Stemmer>>) -> String {
    let normalized = normalize(value);
    opt_stemmer
        .map(|stemmer| stemmer.stem(&normalized))
        .unwrap_or(normalized)
}

/// Scheme prefix of the token at `token_index` within the first entity overlapping it
fn find_entity_prefix(
    tokens: &[Token],
    token_index: usize,
    entity_ranges: &[std::ops::Range<usize>],
    tagging_scheme: TaggingScheme,
) -> Option<String> {
    entity_ranges
        .iter()
        .find(|range| ranges_overlap(range, &tokens[token_index].char_range))
        .map(|range| {
            let entity_token_indexes = (0..tokens.len())
                .filter(|i| ranges_overlap(&tokens[*i].char_range, range))
                .collect_vec();
            get_scheme_prefix(token_index, &entity_token_indexes, tagging_scheme).to_string()
        })
}

fn get_optional_stemmer(
    args: &FeatureArgs,
    shared_resources: &SharedResources,
) -> Result<Option<Arc<dyn Stemmer>>> {
    let use_stemming = parse_as_bool(args, "use_stemming")?;
    if !use_stemming {
        return Ok(None);
    }
    shared_resources
        .stemmer
        .as_ref()
        .cloned()
        .map(Some)
        .ok_or_else(|| format_err!("Cannot find stemmer in shared resources"))
}

fn parse_as_string(args: &FeatureArgs, arg_name: &str) -> Result<String> {
    Ok(args
        .get(arg_name)
        .ok_or_else(|| format_err!("can't retrieve '{}' parameter", arg_name))?
        .as_str()
        .ok_or_else(|| format_err!("'{}' isn't a string", arg_name))?
        .to_string())
}

fn parse_as_opt_string(args: &FeatureArgs, arg_name: &str) -> Result<Option<String>> {
    Ok(args
        .get(arg_name)
        .and_then(|value| value.as_str())
        .map(|s| s.to_string()))
}

fn parse_as_vec_string(args: &FeatureArgs, arg_name: &str) -> Result<Vec<String>> {
    args.get(arg_name)
        .ok_or_else(|| format_err!("can't retrieve '{}' parameter", arg_name))?
        .as_array()
        .ok_or_else(|| format_err!("'{}' isn't an array", arg_name))?
        .iter()
        .map(|v| {
            Ok(v.as_str()
                .ok_or_else(|| format_err!("'{}' is not a string", v))?
                .to_string())
        })
        .collect()
}

fn parse_as_bool(args: &FeatureArgs, arg_name: &str) -> Result<bool> {
    Ok(args
        .get(arg_name)
        .ok_or_else(|| format_err!("can't retrieve '{}' parameter", arg_name))?
        .as_bool()
        .ok_or_else(|| format_err!("'{}' isn't a bool", arg_name))?)
}

fn parse_as_u64(args: &FeatureArgs, arg_name: &str) -> Result<u64> {
    Ok(args
        .get(arg_name)
        .ok_or_else(|| format_err!("can't retrieve '{}' parameter", arg_name))?
        .as_u64()
        .ok_or_else(|| format_err!("'{}' isn't a u64", arg_name))?)
}

#[cfg(test)]
mod tests {
    use std::iter::FromIterator;

    use maplit::hashmap;
    use serde_json::json;

    use super::*;
    use crate::entity_parser::CustomEntity;
    use crate::language::Language;
    use crate::ontology::{BuiltinEntity, NumberValue, SlotValue};
    use crate::preprocessing::tokenize;
    use crate::resources::gazetteer::HashSetGazetteer;
    use crate::resources::stemmer::HashMapStemmer;
    use crate::resources::word_clusterer::HashMapWordClusterer;
    use crate::testutils::*;

    fn compute_all(feature: &dyn Feature, tokens: &[Token]) -> Vec<Option<String>> {
        (0..tokens.len())
            .map(|i| feature.compute(tokens, i).unwrap())
            .collect()
    }

    fn some(value: &str) -> Option<String> {
        Some(value.to_string())
    }

    #[test]
    fn test_is_digit() {
        // Given
        let inputs = vec!["e3", "abc", "42", "5r", ""];

        // When
        let results: Vec<Option<String>> = inputs.iter().map(|s| is_digit(s)).collect();

        // Then
        assert_eq!(vec![None, None, some("1"), None, None], results)
    }

    #[test]
    fn test_length() {
        // Given
        let inputs = vec!["hello", "こんにちは", "hello こんにちは", ""];

        // When
        let results: Vec<Option<String>> = inputs.iter().map(|s| length(s)).collect();

        // Then
        assert_eq!(vec![some("5"), some("5"), some("11"), some("0")], results);
    }

    #[test]
    fn test_prefix_and_suffix() {
        assert_eq!(some("hel"), prefix("Héllo", 3));
        assert_eq!(some("llo"), suffix("HeLLo", 3));
        assert_eq!(None, suffix("tea", 4));
    }

    #[test]
    fn test_ngram_feature() {
        // Given
        let resources = Arc::new(
            SharedResourcesBuilder::default()
                .stemmer(HashMapStemmer::from_iter(vec![(
                    "cups".to_string(),
                    "cup".to_string(),
                )]))
                .gazetteer(
                    "common_words",
                    HashSetGazetteer::from_iter(vec!["cup".to_string(), "of".to_string()]),
                )
                .build(),
        );
        let args = hashmap![
            "n".to_string() => json!(2),
            "common_words_gazetteer_name".to_string() => json!("common_words"),
            "use_stemming".to_string() => json!(true),
        ];
        let features = NgramFeature::build_features(&args, resources).unwrap();
        let tokens = tokenize("Two Cups of tea", Language::EN);

        // When
        let results = compute_all(features[0].as_ref(), &tokens);

        // Then
        assert_eq!("ngram_2", features[0].name());
        assert_eq!(
            vec![some("rare_word cup"), some("cup of"), some("of rare_word"), None],
            results
        );
    }

    #[test]
    fn test_ngram_feature_without_gazetteer() {
        // Given
        let args = hashmap![
            "n".to_string() => json!(1),
            "common_words_gazetteer_name".to_string() => serde_json::Value::Null,
            "use_stemming".to_string() => json!(false),
        ];
        let features =
            NgramFeature::build_features(&args, Arc::new(SharedResourcesBuilder::default().build()))
                .unwrap();
        let tokens = tokenize("Thé glacé", Language::FR);

        // When
        let results = compute_all(features[0].as_ref(), &tokens);

        // Then
        assert_eq!(vec![some("the"), some("glace")], results);
    }

    #[test]
    fn test_ngram_feature_fails_with_missing_stemmer() {
        // Given
        let args = hashmap![
            "n".to_string() => json!(1),
            "use_stemming".to_string() => json!(true),
        ];

        // When
        let features =
            NgramFeature::build_features(&args, Arc::new(SharedResourcesBuilder::default().build()));

        // Then
        assert!(features.is_err());
    }

    #[test]
    fn test_shape_ngram_feature() {
        // Given
        let args = hashmap!["n".to_string() => json!(2)];
        let features =
            ShapeNgramFeature::build_features(&args, Arc::new(SharedResourcesBuilder::default().build()))
                .unwrap();
        let tokens = tokenize("Make me TWO cups", Language::EN);

        // When
        let results = compute_all(features[0].as_ref(), &tokens);

        // Then
        assert_eq!(
            vec![some("Xxx xxx"), some("xxx XXX"), some("XXX xxx"), None],
            results
        );
    }

    #[test]
    fn test_custom_entity_match_feature() {
        // Given
        let text = "make me a boiling hot tea";
        let custom_entity_parser = MockedCustomEntityParser::from_iter(vec![(
            text.to_string(),
            vec![CustomEntity {
                value: "boiling hot".to_string(),
                resolved_value: "hot".to_string(),
                range: 10..21,
                entity_identifier: "Temperature".to_string(),
            }],
        )]);
        let resources = Arc::new(
            SharedResourcesBuilder::default()
                .custom_entity_parser(custom_entity_parser)
                .build(),
        );
        let args = hashmap![
            "entities".to_string() => json!(["Temperature"]),
            "tagging_scheme_code".to_string() => json!(2),
        ];
        let features = CustomEntityMatchFeature::build_features(&args, resources).unwrap();
        let tokens = tokenize(text, Language::EN);

        // When
        let results = compute_all(features[0].as_ref(), &tokens);

        // Then
        assert_eq!("entity_match_Temperature", features[0].name());
        assert_eq!(
            vec![None, None, None, some("B-"), some("L-"), None],
            results
        );
    }

    #[test]
    fn test_builtin_entity_match_feature() {
        // Given
        let text = "Make me 2 cups";
        let builtin_entity_parser = MockedBuiltinEntityParser::from_iter(vec![(
            text.to_string(),
            vec![BuiltinEntity {
                value: "2".to_string(),
                range: 8..9,
                entity: SlotValue::Number(NumberValue { value: 2.0 }),
                entity_kind: BuiltinEntityKind::Number,
            }],
        )]);
        let resources = Arc::new(
            SharedResourcesBuilder::default()
                .builtin_entity_parser(builtin_entity_parser)
                .build(),
        );
        let args = hashmap![
            "entity_labels".to_string() => json!(["snips/number"]),
            "tagging_scheme_code".to_string() => json!(1),
        ];
        let features = BuiltinEntityMatchFeature::build_features(&args, resources).unwrap();
        let tokens = tokenize(text, Language::EN);

        // When
        let results = compute_all(features[0].as_ref(), &tokens);

        // Then
        assert_eq!("builtin_entity_match_snips/number", features[0].name());
        assert_eq!(vec![None, None, some("B-"), None], results);
    }

    #[test]
    fn test_word_cluster_feature() {
        // Given
        let word_clusterer = HashMapWordClusterer::from_iter(vec![
            ("tea".to_string(), "0110".to_string()),
            ("coffee".to_string(), "0111".to_string()),
        ]);
        let resources = Arc::new(
            SharedResourcesBuilder::default()
                .word_clusterer("brown_clusters", word_clusterer)
                .build(),
        );
        let args = hashmap!["cluster_name".to_string() => json!("brown_clusters")];
        let features = WordClusterFeature::build_features(&args, resources).unwrap();
        let tokens = tokenize("Tea or coffee", Language::EN);

        // When
        let results = compute_all(features[0].as_ref(), &tokens);

        // Then
        assert_eq!("word_cluster_brown_clusters", features[0].name());
        assert_eq!(vec![some("0110"), None, some("0111")], results);
    }
}
