mod featurizer;
mod log_reg_intent_classifier;
mod logreg;

use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;

use failure::bail;

use crate::errors::*;
use crate::models::ProcessingUnitMetadata;
use crate::ontology::IntentClassifierResult;
use crate::resources::SharedResources;
use crate::utils::IntentName;

pub use self::featurizer::{CooccurrenceVectorizer, Featurizer, TfidfVectorizer};
pub use self::log_reg_intent_classifier::LogRegIntentClassifier;

pub trait IntentClassifier: Send + Sync {
    /// Named intents of the model, in model order
    fn intent_names(&self) -> Vec<IntentName>;

    /// Returns the most likely intent among the ones allowed by `intents_filter`, which may be
    /// the null intent
    fn get_intent(
        &self,
        input: &str,
        intents_filter: Option<&HashSet<IntentName>>,
    ) -> Result<IntentClassifierResult>;

    /// Returns every intent of the model, sorted by decreasing probability
    fn get_intents(&self, input: &str) -> Result<Vec<IntentClassifierResult>>;
}

pub fn build_intent_classifier<P: AsRef<Path>>(
    path: P,
    shared_resources: Arc<SharedResources>,
) -> Result<Box<dyn IntentClassifier>> {
    let metadata = ProcessingUnitMetadata::from_path(&path)?;
    match metadata {
        ProcessingUnitMetadata::LogRegIntentClassifier => Ok(Box::new(
            LogRegIntentClassifier::from_path(path, shared_resources)?,
        ) as _),
        _ => bail!("{:?} is not an intent classifier", metadata),
    }
}
