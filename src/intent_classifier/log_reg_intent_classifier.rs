use std::cmp::Ordering;
use std::collections::HashSet;
use std::fs::File;
use std::path::Path;
use std::sync::Arc;

use failure::{bail, ResultExt};
use itertools::Itertools;
use log::debug;

use crate::errors::*;
use crate::intent_classifier::{Featurizer, IntentClassifier};
use crate::models::IntentClassifierModel;
use crate::ontology::IntentClassifierResult;
use crate::resources::SharedResources;
use crate::utils::IntentName;

use super::logreg::MulticlassLogisticRegression;

pub struct LogRegIntentClassifier {
    intent_list: Vec<Option<IntentName>>,
    featurizer: Option<Featurizer>,
    logreg: Option<MulticlassLogisticRegression>,
    null_intent_threshold: f32,
}

impl LogRegIntentClassifier {
    pub fn from_path<P: AsRef<Path>>(
        path: P,
        shared_resources: Arc<SharedResources>,
    ) -> Result<Self> {
        let classifier_model_path = path.as_ref().join("intent_classifier.json");
        let model_file = File::open(&classifier_model_path).with_context(|_| {
            format!(
                "Cannot open LogRegIntentClassifier file '{:?}'",
                &classifier_model_path
            )
        })?;
        let model: IntentClassifierModel = serde_json::from_reader(model_file)
            .with_context(|_| "Cannot deserialize LogRegIntentClassifier json data")?;

        let featurizer = model
            .featurizer
            .map(|featurizer_name| {
                let featurizer_path = path.as_ref().join(&featurizer_name);
                Featurizer::from_path(&featurizer_path, shared_resources)
            })
            .transpose()?;

        let logreg = match (model.intercept, model.coeffs) {
            (Some(intercept), Some(coeffs)) => {
                Some(MulticlassLogisticRegression::from_coeffs(intercept, coeffs)?)
            }
            _ => None,
        };

        Self::new(
            model.intent_list,
            featurizer,
            logreg,
            model.config.null_intent_threshold,
        )
    }

    pub fn new(
        intent_list: Vec<Option<IntentName>>,
        featurizer: Option<Featurizer>,
        logreg: Option<MulticlassLogisticRegression>,
        null_intent_threshold: f32,
    ) -> Result<Self> {
        if intent_list.len() > 1 {
            match (featurizer.as_ref(), logreg.as_ref()) {
                (Some(featurizer), Some(logreg)) => {
                    if featurizer.nb_features() != logreg.nb_features() {
                        bail!(
                            "Featurizer produces {} features while the logistic regression expects {}",
                            featurizer.nb_features(),
                            logreg.nb_features()
                        );
                    }
                    if logreg.nb_outputs() != intent_list.len() {
                        bail!(
                            "Logistic regression has {} outputs for {} intents",
                            logreg.nb_outputs(),
                            intent_list.len()
                        );
                    }
                }
                _ => bail!(
                    "Intent classifier with {} intents has no featurizer or no weights",
                    intent_list.len()
                ),
            }
        }
        Ok(Self {
            intent_list,
            featurizer,
            logreg,
            null_intent_threshold,
        })
    }

    fn rank_intents(
        &self,
        input: &str,
        intents_filter: Option<&HashSet<IntentName>>,
    ) -> Result<Vec<IntentClassifierResult>> {
        if self.intent_list.is_empty() {
            return Ok(vec![IntentClassifierResult::null_intent(1.0)]);
        }

        if input.trim().is_empty() {
            debug!("Empty input, falling back to the null intent");
            let named_intents = self
                .intent_names()
                .into_iter()
                .map(|intent_name| IntentClassifierResult {
                    intent_name: Some(intent_name),
                    confidence_score: 0.0,
                });
            return Ok(Some(IntentClassifierResult::null_intent(1.0))
                .into_iter()
                .chain(named_intents)
                .collect());
        }

        if self.intent_list.len() == 1 {
            return Ok(vec![IntentClassifierResult {
                intent_name: self.intent_list[0].clone(),
                confidence_score: 1.0,
            }]);
        }

        // Both are present as soon as there are several intents
        let (featurizer, logreg) = match (self.featurizer.as_ref(), self.logreg.as_ref()) {
            (Some(featurizer), Some(logreg)) => (featurizer, logreg),
            _ => {
                return Err(SnipsNluError::InternalError(
                    "Intent classifier has no featurizer or no weights".to_string(),
                )
                .into())
            }
        };

        let features = featurizer.transform(input)?;
        let filtered_out_indexes =
            get_filtered_out_intents_indexes(&self.intent_list, intents_filter);
        let probabilities = logreg.run(&features.view(), filtered_out_indexes)?;

        let mut results = self
            .intent_list
            .iter()
            .zip(probabilities.iter())
            .map(|(intent_name, probability)| IntentClassifierResult {
                intent_name: intent_name.clone(),
                confidence_score: *probability,
            })
            .collect_vec();

        // Stable sort, so that ties keep the model order
        results.sort_by(|a, b| {
            b.confidence_score
                .partial_cmp(&a.confidence_score)
                .unwrap_or(Ordering::Equal)
        });
        Ok(results)
    }

    fn apply_null_intent_threshold(
        &self,
        mut results: Vec<IntentClassifierResult>,
    ) -> Vec<IntentClassifierResult> {
        let top_score = results
            .first()
            .filter(|top| {
                !top.is_null_intent() && top.confidence_score < self.null_intent_threshold
            })
            .map(|top| top.confidence_score);
        let top_score = match top_score {
            Some(score) => score,
            None => return results,
        };
        debug!(
            "Top intent score {} is below the null intent threshold {}",
            top_score, self.null_intent_threshold
        );
        results.retain(|result| !result.is_null_intent());
        results.insert(0, IntentClassifierResult::null_intent(top_score));
        results
    }
}

impl IntentClassifier for LogRegIntentClassifier {
    fn intent_names(&self) -> Vec<IntentName> {
        self.intent_list.iter().flatten().cloned().collect()
    }

    fn get_intent(
        &self,
        input: &str,
        intents_filter: Option<&HashSet<IntentName>>,
    ) -> Result<IntentClassifierResult> {
        let results = self
            .rank_intents(input, intents_filter)?
            .into_iter()
            .filter(|result| match (result.intent_name.as_ref(), intents_filter) {
                (Some(intent_name), Some(filter)) => filter.contains(intent_name),
                _ => true,
            })
            .collect();
        Ok(self
            .apply_null_intent_threshold(results)
            .into_iter()
            .next()
            .unwrap_or_else(|| IntentClassifierResult::null_intent(1.0)))
    }

    fn get_intents(&self, input: &str) -> Result<Vec<IntentClassifierResult>> {
        let results = self.rank_intents(input, None)?;
        Ok(self.apply_null_intent_threshold(results))
    }
}

fn get_filtered_out_intents_indexes(
    intents_list: &[Option<IntentName>],
    intents_filter: Option<&HashSet<IntentName>>,
) -> Option<Vec<usize>> {
    intents_filter.map(|filter| {
        intents_list
            .iter()
            .enumerate()
            .filter_map(|(i, opt_intent)| match opt_intent {
                Some(intent) if !filter.contains(intent) => Some(i),
                _ => None,
            })
            .collect()
    })
}
