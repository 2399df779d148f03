use std::cmp::min;
use std::collections::{HashMap, HashSet};
use std::fs::File;
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;

use failure::{bail, format_err, ResultExt};
use itertools::Itertools;
use ndarray::prelude::*;

use crate::errors::*;
use crate::language::Language;
use crate::models::{CooccurrenceVectorizerModel, FeaturizerModel, TfidfVectorizerModel};
use crate::ontology::BuiltinEntityKind;
use crate::preprocessing::{normalize, tokenize_light};
use crate::resources::stemmer::Stemmer;
use crate::resources::word_clusterer::WordClusterer;
use crate::resources::SharedResources;
use crate::utils::{compute_all_ngrams, replace_entities, MatchedEntity};

type WordPair = (String, String);

/// Turns an utterance into the feature vector consumed by the intent classifier: tf-idf
/// features, followed by the optional word co-occurrence features
pub struct Featurizer {
    tfidf_vectorizer: TfidfVectorizer,
    cooccurrence_vectorizer: Option<CooccurrenceVectorizer>,
}

impl Featurizer {
    pub fn new(
        tfidf_vectorizer: TfidfVectorizer,
        cooccurrence_vectorizer: Option<CooccurrenceVectorizer>,
    ) -> Self {
        Self {
            tfidf_vectorizer,
            cooccurrence_vectorizer,
        }
    }

    pub fn from_path<P: AsRef<Path>>(
        path: P,
        shared_resources: Arc<SharedResources>,
    ) -> Result<Self> {
        let featurizer_model_path = path.as_ref().join("featurizer.json");
        let model_file = File::open(&featurizer_model_path).with_context(|_| {
            format!("Cannot open Featurizer file '{:?}'", &featurizer_model_path)
        })?;
        let model: FeaturizerModel = serde_json::from_reader(model_file)
            .with_context(|_| "Cannot deserialize FeaturizerModel json data")?;

        let tfidf_vectorizer_path = path.as_ref().join(model.tfidf_vectorizer);
        let tfidf_vectorizer =
            TfidfVectorizer::from_path(&tfidf_vectorizer_path, shared_resources.clone())?;

        let cooccurrence_vectorizer = model
            .cooccurrence_vectorizer
            .map(|cooccurrence_name| {
                let cooccurrence_vectorizer_path = path.as_ref().join(cooccurrence_name);
                CooccurrenceVectorizer::from_path(&cooccurrence_vectorizer_path, shared_resources)
            })
            .transpose()?;

        Ok(Self::new(tfidf_vectorizer, cooccurrence_vectorizer))
    }

    pub fn nb_features(&self) -> usize {
        self.tfidf_vectorizer.nb_features()
            + self
                .cooccurrence_vectorizer
                .as_ref()
                .map(|vectorizer| vectorizer.nb_features())
                .unwrap_or(0)
    }

    pub fn transform(&self, input: &str) -> Result<Array1<f32>> {
        let mut features = self.tfidf_vectorizer.transform(input)?;
        if let Some(vectorizer) = self.cooccurrence_vectorizer.as_ref() {
            features.extend(vectorizer.transform(input)?)
        };
        Ok(Array::from_vec(features))
    }
}

pub struct TfidfVectorizer {
    builtin_entity_scope: Vec<BuiltinEntityKind>,
    vocabulary: HashMap<String, usize>,
    idf_diag: Vec<f32>,
    word_clusterer: Option<Arc<dyn WordClusterer>>,
    stemmer: Option<Arc<dyn Stemmer>>,
    language: Language,
    shared_resources: Arc<SharedResources>,
}

impl TfidfVectorizer {
    pub fn from_path<P: AsRef<Path>>(
        path: P,
        shared_resources: Arc<SharedResources>,
    ) -> Result<Self> {
        let vectorizer_model_path = path.as_ref().join("vectorizer.json");
        let model_file = File::open(&vectorizer_model_path).with_context(|_| {
            format!(
                "Cannot open TfidfVectorizer file '{:?}'",
                &vectorizer_model_path
            )
        })?;
        let model: TfidfVectorizerModel = serde_json::from_reader(model_file)
            .with_context(|_| "Cannot deserialize TfidfVectorizer json data")?;
        Self::new(model, shared_resources)
    }

    pub fn new(
        model: TfidfVectorizerModel,
        shared_resources: Arc<SharedResources>,
    ) -> Result<Self> {
        let vocabulary = model.vectorizer.vocab;
        let idf_diag = model.vectorizer.idf_diag;
        if let Some((word, index)) = vocabulary.iter().find(|(_, index)| **index >= idf_diag.len())
        {
            bail!(
                "Index {} of word '{}' is out of the idf vector bounds ({})",
                index,
                word,
                idf_diag.len()
            );
        }

        let language = Language::from_str(&model.language_code)?;

        let word_clusterer = model
            .config
            .word_clusters_name
            .map(|clusters_name| {
                shared_resources
                    .word_clusterers
                    .get(&clusters_name)
                    .cloned()
                    .ok_or_else(|| {
                        format_err!(
                            "Cannot find word clusters '{}' in shared resources",
                            clusters_name
                        )
                    })
            })
            .transpose()?;

        let builtin_entity_scope = parse_builtin_entity_scope(&model.builtin_entity_scope)?;

        let stemmer = if model.config.use_stemming {
            Some(
                shared_resources
                    .stemmer
                    .as_ref()
                    .cloned()
                    .ok_or_else(|| format_err!("Cannot find stemmer in shared resources"))?,
            )
        } else {
            None
        };

        Ok(Self {
            builtin_entity_scope,
            vocabulary,
            idf_diag,
            word_clusterer,
            stemmer,
            language,
            shared_resources,
        })
    }

    fn nb_features(&self) -> usize {
        self.idf_diag.len()
    }

    pub fn transform(&self, utterance: &str) -> Result<Vec<f32>> {
        let tokens = tokenize_light(utterance, self.language);
        let normalized_tokens = normalize_stem(&tokens, self.stemmer.as_ref());

        // Builtin entities are extracted on the raw utterance
        let builtin_entities_features: Vec<String> = self
            .shared_resources
            .builtin_entity_parser
            .extract_entities(utterance, Some(&self.builtin_entity_scope[..]), true)?
            .iter()
            .map(|entity| get_builtin_entity_feature_name(entity.entity_kind, self.language))
            .sorted()
            .collect();

        // Custom entities are extracted on the normalized utterance
        let custom_entities_features: Vec<String> = self
            .shared_resources
            .custom_entity_parser
            .extract_entities(&normalized_tokens.join(" "), None)?
            .iter()
            .map(|entity| get_custom_entity_feature_name(&entity.entity_identifier, self.language))
            .collect();

        let word_clusters = self
            .word_clusterer
            .as_ref()
            .map(|clusterer| get_word_clusters(&tokens, clusterer.as_ref()))
            .unwrap_or_else(Vec::new);

        let features_it = &[
            normalized_tokens,
            builtin_entities_features,
            custom_entities_features,
            word_clusters,
        ];

        let mut features: Vec<f32> = vec![0.; self.nb_features()];
        let mut match_idx: HashSet<usize> = HashSet::new();
        for extracted_features in features_it.iter() {
            for word in extracted_features {
                if let Some(word_idx) = self.vocabulary.get(word) {
                    features[*word_idx] += 1.;
                    match_idx.insert(*word_idx);
                }
            }
        }

        for ix in match_idx {
            features[ix] *= self.idf_diag[ix]
        }

        let l2_norm: f32 = features.iter().fold(0., |norm, v| norm + v * v).sqrt();
        let safe_l2_norm = if l2_norm > 0. { l2_norm } else { 1. };
        Ok(features.iter().map(|c| *c / safe_l2_norm).collect())
    }
}

pub struct CooccurrenceVectorizer {
    language: Language,
    builtin_entity_scope: Vec<BuiltinEntityKind>,
    word_pairs: HashMap<WordPair, usize>,
    filter_stop_words: bool,
    window_size: Option<usize>,
    keep_order: bool,
    unknown_words_replacement_string: Option<String>,
    shared_resources: Arc<SharedResources>,
}

impl CooccurrenceVectorizer {
    pub fn from_path<P: AsRef<Path>>(
        path: P,
        shared_resources: Arc<SharedResources>,
    ) -> Result<Self> {
        let vectorizer_model_path = path.as_ref().join("vectorizer.json");
        let model_file = File::open(&vectorizer_model_path).with_context(|_| {
            format!(
                "Cannot open CooccurrenceVectorizer file '{:?}'",
                &vectorizer_model_path
            )
        })?;
        let model: CooccurrenceVectorizerModel = serde_json::from_reader(model_file)
            .with_context(|_| "Cannot deserialize CooccurrenceVectorizer json data")?;
        Self::new(model, shared_resources)
    }

    pub fn new(
        model: CooccurrenceVectorizerModel,
        shared_resources: Arc<SharedResources>,
    ) -> Result<Self> {
        let builtin_entity_scope = parse_builtin_entity_scope(&model.builtin_entity_scope)?;
        let nb_pairs = model.word_pairs.len();
        if let Some(index) = model.word_pairs.keys().find(|index| **index >= nb_pairs) {
            bail!("Word pair index {} is out of bounds ({})", index, nb_pairs);
        }
        let word_pairs = model
            .word_pairs
            .into_iter()
            .map(|(index, pair)| (pair, index))
            .collect();
        let language = Language::from_str(&model.language_code)?;

        Ok(Self {
            language,
            builtin_entity_scope,
            word_pairs,
            filter_stop_words: model.config.filter_stop_words,
            window_size: model.config.window_size,
            keep_order: model.config.keep_order,
            unknown_words_replacement_string: model.config.unknown_words_replacement_string,
            shared_resources,
        })
    }

    fn nb_features(&self) -> usize {
        self.word_pairs.len()
    }

    fn transform(&self, utterance: &str) -> Result<Vec<f32>> {
        let builtin_entities = self
            .shared_resources
            .builtin_entity_parser
            .extract_entities(utterance, Some(&self.builtin_entity_scope[..]), true)?;
        let custom_entities = self
            .shared_resources
            .custom_entity_parser
            .extract_entities(utterance, None)?;

        let matched_entities: Vec<MatchedEntity> = builtin_entities
            .into_iter()
            .map(|entity| entity.into())
            .chain(custom_entities.into_iter().map(|entity| entity.into()))
            .collect();

        let (_, enriched_utterance) = replace_entities(utterance, matched_entities, |entity| {
            self.placeholder_fn(entity)
        });

        let tokens = tokenize_light(&enriched_utterance, self.language);

        let mut features: Vec<f32> = vec![0.; self.nb_features()];
        for pair in self.extract_word_pairs(tokens) {
            if let Some(pair_index) = self.word_pairs.get(&pair) {
                features[*pair_index] = 1.0;
            }
        }
        Ok(features)
    }

    fn placeholder_fn(&self, entity_name: &str) -> String {
        alphanumeric_tokens(entity_name, self.language).to_uppercase()
    }

    fn extract_word_pairs(&self, tokens: Vec<String>) -> HashSet<WordPair> {
        let filtered_tokens: Vec<String> = tokens
            .into_iter()
            .filter(|t| {
                !(self.filter_stop_words && self.shared_resources.stop_words.contains(t))
                    && Some(t) != self.unknown_words_replacement_string.as_ref()
            })
            .collect();
        let num_tokens = filtered_tokens.len();
        filtered_tokens
            .iter()
            .enumerate()
            .flat_map(|(i, t)| {
                let max_index = self.window_size.map_or(num_tokens, |window_size| {
                    min(i + window_size + 1, num_tokens)
                });
                filtered_tokens[i + 1..max_index].iter().map(move |other| {
                    if self.keep_order || t < other {
                        (t.clone(), other.clone())
                    } else {
                        (other.clone(), t.clone())
                    }
                })
            })
            .collect()
    }
}

fn parse_builtin_entity_scope(scope: &[String]) -> Result<Vec<BuiltinEntityKind>> {
    scope
        .iter()
        .map(|entity| {
            BuiltinEntityKind::from_identifier(entity)
                .map_err(|_| format_err!("Unknown builtin entity {:?}", entity))
        })
        .collect()
}

/// Lowercase concatenation of the word tokens of an entity name: `snips/number` gives
/// `snipsnumber`
fn alphanumeric_tokens(entity_name: &str, language: Language) -> String {
    tokenize_light(entity_name, language)
        .into_iter()
        .filter(|token| token.chars().all(char::is_alphanumeric))
        .join("")
}

fn get_builtin_entity_feature_name(entity_kind: BuiltinEntityKind, language: Language) -> String {
    let e = alphanumeric_tokens(&entity_kind.identifier().to_lowercase(), language);
    format!("builtinentityfeature{}", e)
}

fn get_custom_entity_feature_name(entity_name: &str, language: Language) -> String {
    let e = alphanumeric_tokens(&entity_name.to_lowercase(), language);
    format!("entityfeature{}", e)
}

fn get_word_clusters(query_tokens: &[String], word_clusterer: &dyn WordClusterer) -> Vec<String> {
    let tokens_ref = query_tokens.iter().map(|t| t.as_ref()).collect_vec();
    compute_all_ngrams(tokens_ref.as_ref(), tokens_ref.len())
        .into_iter()
        .filter_map(|ngram| word_clusterer.get_cluster(&ngram.0.to_lowercase()))
        .sorted()
        .collect()
}

fn normalize_stem(tokens: &[String], opt_stemmer: Option<&Arc<dyn Stemmer>>) -> Vec<String> {
    opt_stemmer
        .map(|stemmer| tokens.iter().map(|t| stemmer.stem(&normalize(t))).collect())
        .unwrap_or_else(|| tokens.iter().map(|t| normalize(t)).collect())
}
