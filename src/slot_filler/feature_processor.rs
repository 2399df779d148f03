use std::collections::HashMap;
use std::sync::Arc;

use failure::bail;
use itertools::Itertools;

use crate::errors::*;
use crate::models::FeatureFactory;
use crate::preprocessing::Token;
use crate::resources::SharedResources;
use crate::slot_filler::features::*;

pub struct ProbabilisticFeatureProcessor {
    features_offsetters: Vec<FeatureOffsetter>,
}

impl ProbabilisticFeatureProcessor {
    pub fn new(
        feature_factories: &[FeatureFactory],
        shared_resources: Arc<SharedResources>,
    ) -> Result<ProbabilisticFeatureProcessor> {
        let features_offsetters = feature_factories
            .iter()
            .map(|f| get_features(f, shared_resources.clone()))
            .collect::<Result<Vec<Vec<_>>>>()?
            .into_iter()
            .flatten()
            .collect();

        Ok(ProbabilisticFeatureProcessor {
            features_offsetters,
        })
    }
}

impl ProbabilisticFeatureProcessor {
    /// Computes, for each token, the list of `(feature name, feature value)` pairs fed to the CRF.
    /// A feature computed on token `i` with offset `o` is attached to token `i - o`.
    pub fn compute_features(&self, tokens: &[Token]) -> Result<Vec<Vec<(String, String)>>> {
        let nb_tokens = tokens.len() as i32;
        let mut features = vec![vec![]; tokens.len()];
        for offsetter in self.features_offsetters.iter() {
            let offsets_with_name = offsetter.offsets_with_name();
            for i in 0..tokens.len() {
                if let Some(value) = offsetter.feature.compute(tokens, i)? {
                    offsets_with_name.iter().foreach(|(offset, key)| {
                        let target = i as i32 - offset;
                        if target >= 0 && target < nb_tokens {
                            features[target as usize].push((key.clone(), value.clone()));
                        }
                    });
                }
            }
        }
        Ok(features)
    }
}

struct FeatureOffsetter {
    feature: Box<dyn Feature>,
    offsets: Vec<i32>,
}

impl FeatureOffsetter {
    fn offsets_with_name(&self) -> Vec<(i32, String)> {
        self.offsets
            .iter()
            .map(|i| {
                (
                    *i,
                    if *i == 0 {
                        self.feature.name()
                    } else {
                        format!("{}[{:+}]", self.feature.name(), i)
                    },
                )
            })
            .collect()
    }
}

pub trait FeatureKindRepr {
    fn feature_kind(&self) -> FeatureKind;
}

pub trait Feature: FeatureKindRepr + Send + Sync {
    fn name(&self) -> String {
        self.feature_kind().identifier().to_string()
    }
    fn build_features(
        args: &HashMap<String, serde_json::Value>,
        shared_resources: Arc<SharedResources>,
    ) -> Result<Vec<Box<dyn Feature>>>
    where
        Self: Sized;
    fn compute(&self, tokens: &[Token], token_index: usize) -> Result<Option<String>>;
}

get_features!([
    (IsDigitFeature, is_digit),
    (LengthFeature, length),
    (IsFirstFeature, is_first),
    (IsLastFeature, is_last),
    (NgramFeature, ngram),
    (ShapeNgramFeature, shape_ngram),
    (PrefixFeature, prefix),
    (SuffixFeature, suffix),
    (CustomEntityMatchFeature, entity_match),
    (BuiltinEntityMatchFeature, builtin_entity_match),
    (WordClusterFeature, word_cluster)
]);

#[cfg(test)]
mod tests {
    use super::*;

    use maplit::hashmap;
    use serde_json::json;

    use crate::language::Language;
    use crate::preprocessing::tokenize;
    use crate::testutils::SharedResourcesBuilder;

    #[test]
    fn test_compute_features() {
        // Given
        let language = Language::EN;
        let fp = ProbabilisticFeatureProcessor {
            features_offsetters: vec![
                FeatureOffsetter {
                    offsets: vec![0],
                    feature: Box::new(IsDigitFeature {}) as Box<_>,
                },
                FeatureOffsetter {
                    offsets: vec![0],
                    feature: Box::new(LengthFeature {}) as Box<_>,
                },
            ],
        };
        let tokens = tokenize("I prefer 7 over 777", language);

        // When
        let computed_features = fp.compute_features(&tokens).unwrap();

        let expected_features = vec![
            vec![("length".to_string(), "1".to_string())],
            vec![("length".to_string(), "6".to_string())],
            vec![
                ("is_digit".to_string(), "1".to_string()),
                ("length".to_string(), "1".to_string()),
            ],
            vec![("length".to_string(), "4".to_string())],
            vec![
                ("is_digit".to_string(), "1".to_string()),
                ("length".to_string(), "3".to_string()),
            ],
        ];

        // Then
        assert_eq!(expected_features, computed_features);
    }

    #[test]
    fn test_offset() {
        // Given
        let language = Language::EN;
        let fp = ProbabilisticFeatureProcessor {
            features_offsetters: vec![
                FeatureOffsetter {
                    offsets: vec![-2, 0, 3],
                    feature: Box::new(IsDigitFeature {}) as Box<_>,
                },
                FeatureOffsetter {
                    offsets: vec![-1, 1],
                    feature: Box::new(LengthFeature {}) as Box<_>,
                },
            ],
        };
        let tokens = tokenize("I prefer 7 over 777", language);

        // When
        let computed_features = fp.compute_features(&tokens).unwrap();

        // Then
        let expected_features = vec![
            vec![("length[+1]".to_string(), "6".to_string())],
            vec![
                ("is_digit[+3]".to_string(), "1".to_string()),
                ("length[-1]".to_string(), "1".to_string()),
                ("length[+1]".to_string(), "1".to_string()),
            ],
            vec![
                ("is_digit".to_string(), "1".to_string()),
                ("length[-1]".to_string(), "6".to_string()),
                ("length[+1]".to_string(), "4".to_string()),
            ],
            vec![
                ("length[-1]".to_string(), "1".to_string()),
                ("length[+1]".to_string(), "3".to_string()),
            ],
            vec![
                ("is_digit[-2]".to_string(), "1".to_string()),
                ("is_digit".to_string(), "1".to_string()),
                ("length[-1]".to_string(), "4".to_string()),
            ],
        ];
        assert_eq!(expected_features, computed_features);
    }

    #[test]
    fn test_new_from_feature_factories() {
        // Given
        let feature_factories = vec![
            FeatureFactory {
                factory_name: "shape_ngram".to_string(),
                offsets: vec![0, 1],
                args: hashmap!["n".to_string() => json!(1)],
            },
            FeatureFactory {
                factory_name: "is_first".to_string(),
                offsets: vec![-1],
                args: hashmap![],
            },
        ];
        let resources = Arc::new(SharedResourcesBuilder::default().build());
        let fp = ProbabilisticFeatureProcessor::new(&feature_factories, resources).unwrap();
        let tokens = tokenize("Hello WORLD", Language::EN);

        // When
        let computed_features = fp.compute_features(&tokens).unwrap();

        // Then
        let expected_features = vec![
            vec![
                ("shape_ngram_1".to_string(), "Xxx".to_string()),
                ("shape_ngram_1[+1]".to_string(), "XXX".to_string()),
            ],
            vec![
                ("shape_ngram_1".to_string(), "XXX".to_string()),
                ("is_first[-1]".to_string(), "1".to_string()),
            ],
        ];
        assert_eq!(expected_features, computed_features);
    }

    #[test]
    fn test_new_fails_with_unknown_feature() {
        // Given
        let feature_factories = vec![FeatureFactory {
            factory_name: "unknown_feature".to_string(),
            offsets: vec![0],
            args: hashmap![],
        }];
        let resources = Arc::new(SharedResourcesBuilder::default().build());

        // When
        let fp = ProbabilisticFeatureProcessor::new(&feature_factories, resources);

        // Then
        assert!(fp.is_err());
    }
}
