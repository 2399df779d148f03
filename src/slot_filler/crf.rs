use std::collections::HashMap;
use std::f64::NEG_INFINITY;

use failure::{bail, format_err};
use itertools::Itertools;

use crate::errors::*;
use crate::models::CrfModel;
use crate::slot_filler::crf_utils::*;

/// Linear chain CRF whose state features are `attribute:value` strings
pub struct Crf {
    labels: Vec<String>,
    /// Prefix and slot name of each label, `None` for the outside label
    parsed_labels: Vec<Option<(&'static str, String)>>,
    /// Indexed by previous label then current label
    transitions: Vec<Vec<f64>>,
    state_features: HashMap<String, Vec<(usize, f64)>>,
}

impl Crf {
    pub fn new(model: CrfModel) -> Result<Self> {
        let nb_labels = model.labels.len();
        if nb_labels == 0 {
            bail!("CRF model has no labels");
        }
        if model.transitions.len() != nb_labels
            || model.transitions.iter().any(|row| row.len() != nb_labels)
        {
            bail!(
                "CRF transition matrix does not match the {} labels of the model",
                nb_labels
            );
        }
        let label_indexes: HashMap<&str, usize> = model
            .labels
            .iter()
            .enumerate()
            .map(|(index, label)| (label.as_str(), index))
            .collect();
        let state_features = model
            .state_features
            .into_iter()
            .map(|(attribute, weights)| {
                let indexed_weights = weights
                    .into_iter()
                    .map(|(label, weight)| {
                        label_indexes
                            .get(label.as_str())
                            .map(|index| (*index, weight))
                            .ok_or_else(|| {
                                format_err!(
                                    "Unknown label '{}' in the weights of attribute '{}'",
                                    label,
                                    attribute
                                )
                            })
                    })
                    .collect::<Result<Vec<_>>>()?;
                Ok((attribute, indexed_weights))
            })
            .collect::<Result<HashMap<_, _>>>()?;
        let parsed_labels = model
            .labels
            .iter()
            .map(|label| split_tag(label))
            .collect();

        Ok(Self {
            labels: model.labels,
            parsed_labels,
            transitions: model.transitions,
            state_features,
        })
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    /// Most likely sequence of labels, restricted to the sequences that are valid in the
    /// tagging scheme
    pub fn tag(
        &self,
        features: &[Vec<(String, String)>],
        tagging_scheme: TaggingScheme,
    ) -> Vec<String> {
        if features.is_empty() {
            return vec![];
        }
        let state_scores = self.state_scores(features);
        self.viterbi(&state_scores, Some(tagging_scheme))
            .or_else(|| self.viterbi(&state_scores, None))
            .unwrap_or_else(Vec::new)
            .into_iter()
            .map(|label_index| self.labels[label_index].clone())
            .collect()
    }

    /// Probability of a sequence of labels, computed with the forward algorithm
    pub fn sequence_probability(
        &self,
        features: &[Vec<(String, String)>],
        tags: &[String],
    ) -> Result<f64> {
        if features.len() != tags.len() {
            bail!(
                "Cannot score {} tags against {} tokens",
                tags.len(),
                features.len()
            );
        }
        if tags.is_empty() {
            return Ok(1.0);
        }
        let tag_indexes = tags
            .iter()
            .map(|tag| {
                self.labels
                    .iter()
                    .position(|label| label == tag)
                    .ok_or_else(|| format_err!("Unknown CRF label '{}'", tag))
            })
            .collect::<Result<Vec<usize>>>()?;
        let state_scores = self.state_scores(features);

        let sequence_score = tag_indexes
            .iter()
            .enumerate()
            .map(|(t, label)| {
                let transition = if t == 0 {
                    0.0
                } else {
                    self.transitions[tag_indexes[t - 1]][*label]
                };
                state_scores[t][*label] + transition
            })
            .sum::<f64>();

        let nb_labels = self.labels.len();
        let mut alphas = state_scores[0].clone();
        for scores in state_scores.iter().skip(1) {
            alphas = (0..nb_labels)
                .map(|label| {
                    let incoming = (0..nb_labels)
                        .map(|previous| alphas[previous] + self.transitions[previous][label])
                        .collect_vec();
                    log_sum_exp(&incoming) + scores[label]
                })
                .collect();
        }
        let log_partition = log_sum_exp(&alphas);
        Ok((sequence_score - log_partition).exp())
    }

    fn state_scores(&self, features: &[Vec<(String, String)>]) -> Vec<Vec<f64>> {
        features
            .iter()
            .map(|token_features| {
                let mut scores = vec![0.0; self.labels.len()];
                for (name, value) in token_features {
                    let attribute = format!("{}:{}", name, value);
                    if let Some(weights) = self.state_features.get(&attribute) {
                        for (label, weight) in weights {
                            scores[*label] += weight;
                        }
                    }
                }
                scores
            })
            .collect()
    }

    /// Returns `None` when no sequence satisfies the constraints
    fn viterbi(
        &self,
        state_scores: &[Vec<f64>],
        tagging_scheme: Option<TaggingScheme>,
    ) -> Option<Vec<usize>> {
        let nb_labels = self.labels.len();
        let is_allowed = |previous: Option<usize>, current: usize| {
            tagging_scheme
                .map(|scheme| self.is_allowed_transition(previous, current, scheme))
                .unwrap_or(true)
        };

        let mut scores: Vec<f64> = (0..nb_labels)
            .map(|label| {
                if is_allowed(None, label) {
                    state_scores[0][label]
                } else {
                    NEG_INFINITY
                }
            })
            .collect();
        let mut back_pointers: Vec<Vec<usize>> = Vec::with_capacity(state_scores.len());

        for token_scores in state_scores.iter().skip(1) {
            let mut new_scores = vec![NEG_INFINITY; nb_labels];
            let mut pointers = vec![0; nb_labels];
            for label in 0..nb_labels {
                for previous in 0..nb_labels {
                    if scores[previous] == NEG_INFINITY || !is_allowed(Some(previous), label) {
                        continue;
                    }
                    let score =
                        scores[previous] + self.transitions[previous][label] + token_scores[label];
                    // Strict comparison so that ties go to the lowest label index
                    if score > new_scores[label] {
                        new_scores[label] = score;
                        pointers[label] = previous;
                    }
                }
            }
            scores = new_scores;
            back_pointers.push(pointers);
        }

        let mut best_last: Option<(usize, f64)> = None;
        for (label, score) in scores.iter().enumerate() {
            let can_end = tagging_scheme
                .map(|scheme| self.can_end_sequence(label, scheme))
                .unwrap_or(true);
            if !can_end || *score == NEG_INFINITY {
                continue;
            }
            if best_last.map(|(_, best)| *score > best).unwrap_or(true) {
                best_last = Some((label, *score));
            }
        }

        let (mut label, _) = best_last?;
        let mut path = vec![label];
        for pointers in back_pointers.iter().rev() {
            label = pointers[label];
            path.push(label);
        }
        path.reverse();
        Some(path)
    }

    fn is_allowed_transition(
        &self,
        previous: Option<usize>,
        current: usize,
        tagging_scheme: TaggingScheme,
    ) -> bool {
        let previous = previous.and_then(|index| self.parsed_labels[index].as_ref());
        let current = self.parsed_labels[current].as_ref();
        let continues_slot = |prefixes: &[&str], slot_name: &str| {
            previous
                .map(|(previous_prefix, previous_slot)| {
                    prefixes.contains(previous_prefix) && previous_slot == slot_name
                })
                .unwrap_or(false)
        };
        match tagging_scheme {
            TaggingScheme::IO => true,
            TaggingScheme::BIO => match current {
                Some((INSIDE_PREFIX, slot_name)) => {
                    continues_slot(&[BEGINNING_PREFIX, INSIDE_PREFIX], slot_name.as_str())
                }
                _ => true,
            },
            TaggingScheme::BILOU => {
                let previous_is_open = previous
                    .map(|(prefix, _)| *prefix == BEGINNING_PREFIX || *prefix == INSIDE_PREFIX)
                    .unwrap_or(false);
                match current {
                    Some((INSIDE_PREFIX, slot_name)) | Some((LAST_PREFIX, slot_name)) => {
                        continues_slot(&[BEGINNING_PREFIX, INSIDE_PREFIX], slot_name.as_str())
                    }
                    _ => !previous_is_open,
                }
            }
        }
    }

    fn can_end_sequence(&self, label: usize, tagging_scheme: TaggingScheme) -> bool {
        match (tagging_scheme, self.parsed_labels[label].as_ref()) {
            (TaggingScheme::BILOU, Some((prefix, _))) => {
                *prefix != BEGINNING_PREFIX && *prefix != INSIDE_PREFIX
            }
            _ => true,
        }
    }
}

fn log_sum_exp(values: &[f64]) -> f64 {
    let max = values.iter().cloned().fold(NEG_INFINITY, f64::max);
    if max == NEG_INFINITY {
        return NEG_INFINITY;
    }
    max + values.iter().map(|v| (v - max).exp()).sum::<f64>().ln()
}
