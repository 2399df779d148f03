use std::collections::{HashMap, HashSet};
use std::fs::File;
use std::path::Path;
use std::sync::Arc;

use failure::{bail, ResultExt};
use log::info;

use crate::errors::*;
use crate::intent_classifier::{build_intent_classifier, IntentClassifier};
use crate::models::ProbabilisticParserModel;
use crate::resources::SharedResources;
use crate::slot_filler::{build_slot_filler, SlotFiller};
use crate::utils::IntentName;

use super::{IntentClassifierResult, IntentParser, InternalParsingResult};
use crate::slot_utils::InternalSlot;

/// Intent classification followed by slot filling with the filler of the chosen intent
pub struct ProbabilisticIntentParser {
    intent_classifier: Box<dyn IntentClassifier>,
    slot_fillers: HashMap<IntentName, Box<dyn SlotFiller>>,
}

impl ProbabilisticIntentParser {
    pub fn from_path<P: AsRef<Path>>(
        path: P,
        shared_resources: Arc<SharedResources>,
    ) -> Result<Self> {
        let parser_model_path = path.as_ref().join("intent_parser.json");
        let model_file = File::open(&parser_model_path).with_context(|_| {
            format!(
                "Cannot open ProbabilisticIntentParser file '{:?}'",
                &parser_model_path
            )
        })?;
        let model: ProbabilisticParserModel = serde_json::from_reader(model_file)
            .with_context(|_| "Cannot deserialize ProbabilisticIntentParser json data")?;
        let intent_classifier_path = path.as_ref().join("intent_classifier");
        let intent_classifier =
            build_intent_classifier(intent_classifier_path, shared_resources.clone())
                .with_context(|_| "Cannot load intent classifier")?;
        let slot_fillers = model
            .slot_fillers
            .iter()
            .map(|metadata| {
                info!("Loading slot filler of intent '{}' ...", metadata.intent);
                let slot_filler_path = path.as_ref().join(&metadata.slot_filler_name);
                let slot_filler = build_slot_filler(slot_filler_path, shared_resources.clone())
                    .with_context(|_| {
                        format!("Cannot load slot filler of intent '{}'", metadata.intent)
                    })?;
                Ok((metadata.intent.to_string(), slot_filler))
            })
            .collect::<Result<HashMap<_, _>>>()?;
        Self::new(intent_classifier, slot_fillers)
    }

    pub fn new(
        intent_classifier: Box<dyn IntentClassifier>,
        slot_fillers: HashMap<IntentName, Box<dyn SlotFiller>>,
    ) -> Result<Self> {
        if let Some(intent) = intent_classifier
            .intent_names()
            .into_iter()
            .find(|intent| !slot_fillers.contains_key(intent))
        {
            bail!("Missing slot filler for intent '{}'", intent);
        }
        Ok(Self {
            intent_classifier,
            slot_fillers,
        })
    }

    fn slot_filler(&self, intent: &str) -> Result<&dyn SlotFiller> {
        self.slot_fillers
            .get(intent)
            .map(|slot_filler| &**slot_filler)
            .ok_or_else(|| SnipsNluError::UnknownIntent(intent.to_string()).into())
    }
}

impl IntentParser for ProbabilisticIntentParser {
    fn intents(&self) -> Vec<IntentName> {
        self.intent_classifier.intent_names()
    }

    fn parse(
        &self,
        input: &str,
        intents_whitelist: Option<&HashSet<IntentName>>,
    ) -> Result<InternalParsingResult> {
        let intent_result = self
            .intent_classifier
            .get_intent(input, intents_whitelist)?;
        let slots = if let Some(name) = intent_result.intent_name.as_ref() {
            self.slot_filler(name)?.get_slots(input)?
        } else {
            vec![]
        };
        Ok(InternalParsingResult {
            intent: intent_result,
            slots,
        })
    }

    fn get_intents(&self, input: &str) -> Result<Vec<IntentClassifierResult>> {
        self.intent_classifier.get_intents(input)
    }

    fn get_slots(&self, input: &str, intent: &str) -> Result<Vec<InternalSlot>> {
        self.slot_filler(intent)?.get_slots(input)
    }
}
