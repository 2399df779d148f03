pub mod probabilistic_intent_parser;

use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;

use failure::bail;

pub use self::probabilistic_intent_parser::ProbabilisticIntentParser;
use crate::errors::*;
use crate::models::ProcessingUnitMetadata;
use crate::ontology::IntentClassifierResult;
use crate::resources::SharedResources;
pub use crate::slot_utils::InternalSlot;
use crate::utils::IntentName;

#[derive(Debug, Clone, PartialEq)]
pub struct InternalParsingResult {
    pub intent: IntentClassifierResult,
    pub slots: Vec<InternalSlot>,
}

pub trait IntentParser: Send + Sync {
    /// Named intents that this parser can output
    fn intents(&self) -> Vec<IntentName>;

    fn parse(
        &self,
        input: &str,
        intents_whitelist: Option<&HashSet<IntentName>>,
    ) -> Result<InternalParsingResult>;

    fn get_intents(&self, input: &str) -> Result<Vec<IntentClassifierResult>>;

    fn get_slots(&self, input: &str, intent: &str) -> Result<Vec<InternalSlot>>;
}

pub fn build_intent_parser<P: AsRef<Path>>(
    path: P,
    shared_resources: Arc<SharedResources>,
) -> Result<Box<dyn IntentParser>> {
    let metadata = ProcessingUnitMetadata::from_path(&path)?;
    match metadata {
        ProcessingUnitMetadata::ProbabilisticIntentParser => Ok(Box::new(
            ProbabilisticIntentParser::from_path(path, shared_resources)?,
        ) as _),
        _ => bail!("{:?} is not an intent parser", metadata),
    }
}
