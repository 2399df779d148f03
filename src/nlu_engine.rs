use std::cmp::Ordering;
use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;

use failure::{bail, format_err, ResultExt};
use log::info;

use crate::config::NluEngineConfig;
use crate::errors::*;
use crate::intent_parser::*;
use crate::language::Language;
use crate::models::{DatasetMetadata, ModelVersion, NluEngineModel};
use crate::ontology::{
    BuiltinEntityKind, IntentClassifierResult, IntentParserAlternative, IntentParserResult, Slot,
};
use crate::resources::loading::load_shared_resources;
use crate::resources::SharedResources;
use crate::slot_utils::*;
use crate::utils::{extract_nlu_engine_zip_archive, IntentName};

pub struct SnipsNluEngine {
    dataset_metadata: DatasetMetadata,
    intent_parsers: Vec<Box<dyn IntentParser>>,
    shared_resources: Arc<SharedResources>,
}

impl SnipsNluEngine {
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::from_path_with_config(path, &NluEngineConfig::default())
    }

    pub fn from_path_with_config<P: AsRef<Path>>(path: P, config: &NluEngineConfig) -> Result<Self> {
        Self::load(path, config).map_err(into_model_load_error)
    }

    fn load<P: AsRef<Path>>(path: P, config: &NluEngineConfig) -> Result<Self> {
        info!("Loading nlu engine ({:?}) ...", path.as_ref());
        let model = SnipsNluEngine::load_model(&path)?;

        let language = Language::from_str(&model.dataset_metadata.language_code)?;
        info!("Nlu engine language: {}", language);

        let resources_path = path.as_ref().join("resources").join(language.to_string());
        let builtin_parser_path = path.as_ref().join(&model.builtin_entity_parser);
        let custom_parser_path = path.as_ref().join(&model.custom_entity_parser);

        let shared_resources = load_shared_resources(
            &resources_path,
            builtin_parser_path,
            custom_parser_path,
            config,
        )?;

        let parsers = Self::load_intent_parsers(path, &model, shared_resources.clone())?;

        let engine = SnipsNluEngine {
            dataset_metadata: model.dataset_metadata,
            intent_parsers: parsers,
            shared_resources,
        };
        engine.validate()?;
        info!("Nlu engine loaded");
        Ok(engine)
    }

    fn check_model_version<P: AsRef<Path>>(path: P) -> Result<()> {
        let model_file = fs::File::open(&path)
            .with_context(|_| format!("Could not open nlu engine file {:?}", path.as_ref()))?;

        let model_version: ModelVersion = serde_json::from_reader(model_file)
            .with_context(|_| format!("Invalid nlu engine file {:?}", path.as_ref()))?;
        if model_version.model_version != crate::MODEL_VERSION {
            return Err(SnipsNluError::WrongModelVersion {
                model: model_version.model_version,
                runner: crate::MODEL_VERSION,
            }
            .into());
        }
        Ok(())
    }

    fn load_model<P: AsRef<Path>>(path: P) -> Result<NluEngineModel> {
        let engine_model_path = path.as_ref().join("nlu_engine.json");
        Self::check_model_version(&engine_model_path)?;
        let model_file = fs::File::open(&engine_model_path)
            .with_context(|_| format!("Could not open nlu engine file {:?}", &engine_model_path))?;
        let model = serde_json::from_reader(model_file)
            .with_context(|_| format!("Invalid nlu engine file {:?}", &engine_model_path))?;
        Ok(model)
    }

    fn load_intent_parsers<P: AsRef<Path>>(
        engine_dir: P,
        model: &NluEngineModel,
        shared_resources: Arc<SharedResources>,
    ) -> Result<Vec<Box<dyn IntentParser>>> {
        model
            .intent_parsers
            .iter()
            .map(|parser_name| {
                let parser_path = engine_dir.as_ref().join(parser_name);
                Ok(build_intent_parser(parser_path, shared_resources.clone())
                    .with_context(|_| format!("Cannot load intent parser '{}'", parser_name))?)
            })
            .collect::<Result<Vec<_>>>()
    }

    /// Checks that every intent and entity referenced by the model can be handled
    fn validate(&self) -> Result<()> {
        let supported_builtin_kinds = self
            .shared_resources
            .builtin_entity_parser
            .supported_entity_kinds();
        for (intent, slot_mapping) in self.dataset_metadata.slot_name_mappings.iter() {
            for (slot_name, entity) in slot_mapping.iter() {
                if self.dataset_metadata.entities.contains_key(entity) {
                    continue;
                }
                match BuiltinEntityKind::from_identifier(entity) {
                    Ok(kind) if supported_builtin_kinds.contains(&kind) => {}
                    Ok(_) => bail!(
                        "Builtin entity '{}' of slot '{}' in intent '{}' is not available for this language",
                        entity,
                        slot_name,
                        intent
                    ),
                    Err(_) => bail!(
                        "Unknown entity '{}' for slot '{}' in intent '{}'",
                        entity,
                        slot_name,
                        intent
                    ),
                }
            }
        }
        for parser in self.intent_parsers.iter() {
            if let Some(intent) = parser
                .intents()
                .into_iter()
                .find(|intent| !self.dataset_metadata.slot_name_mappings.contains_key(intent))
            {
                bail!("Intent '{}' is missing from the slot name mappings", intent);
            }
        }
        Ok(())
    }
}

impl SnipsNluEngine {
    pub fn from_zip<R: io::Read + io::Seek>(reader: R) -> Result<Self> {
        Self::from_zip_with_config(reader, &NluEngineConfig::default())
    }

    pub fn from_zip_with_config<R: io::Read + io::Seek>(
        reader: R,
        config: &NluEngineConfig,
    ) -> Result<Self> {
        Self::load_zip(reader, config).map_err(into_model_load_error)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        Self::from_zip(io::Cursor::new(bytes))
    }

    fn load_zip<R: io::Read + io::Seek>(reader: R, config: &NluEngineConfig) -> Result<Self> {
        let temp_dir = tempfile::Builder::new().prefix("temp_dir_nlu_").tempdir()?;
        let temp_dir_path = temp_dir.path();
        let engine_dir_path = extract_nlu_engine_zip_archive(reader, temp_dir_path)?;
        Self::load(engine_dir_path, config)
    }

    /// Version of the model format that this engine can load
    pub fn model_version() -> &'static str {
        crate::MODEL_VERSION
    }

    pub fn engine_version() -> &'static str {
        crate::ENGINE_VERSION
    }
}

impl SnipsNluEngine {
    pub fn parse<'a, 'b, W, B>(
        &self,
        input: &str,
        intents_whitelist: W,
        intents_blacklist: B,
    ) -> Result<IntentParserResult>
    where
        W: Into<Option<Vec<&'a str>>>,
        B: Into<Option<Vec<&'b str>>>,
    {
        let intents_whitelist = self.get_intents_whitelist(intents_whitelist, intents_blacklist)?;
        self.parse_with_whitelist(input, intents_whitelist.as_ref())
    }

    fn parse_with_whitelist(
        &self,
        input: &str,
        intents_whitelist: Option<&HashSet<IntentName>>,
    ) -> Result<IntentParserResult> {
        let mut none_score: f32 = 1.0;
        for parser in &self.intent_parsers {
            let internal_parsing_result = parser.parse(input, intents_whitelist)?;
            if internal_parsing_result.intent.intent_name.is_some() {
                let resolved_slots = self
                    .resolve_slots(input, internal_parsing_result.slots)
                    .with_context(|_| "Cannot resolve slots".to_string())?;

                return Ok(IntentParserResult {
                    input: input.to_string(),
                    intent: internal_parsing_result.intent,
                    slots: resolved_slots,
                    alternatives: vec![],
                });
            } else {
                none_score = internal_parsing_result.intent.confidence_score;
            }
        }

        // When no parser extracts an intent, the score of the last one is used
        Ok(IntentParserResult {
            input: input.to_string(),
            intent: IntentClassifierResult::null_intent(none_score),
            slots: vec![],
            alternatives: vec![],
        })
    }

    /// Parses the input and adds up to `intents_alternatives` other intents, each with its
    /// own slots
    pub fn parse_with_alternatives<'a, 'b, W, B>(
        &self,
        input: &str,
        intents_whitelist: W,
        intents_blacklist: B,
        intents_alternatives: usize,
    ) -> Result<IntentParserResult>
    where
        W: Into<Option<Vec<&'a str>>>,
        B: Into<Option<Vec<&'b str>>>,
    {
        let intents_whitelist = self.get_intents_whitelist(intents_whitelist, intents_blacklist)?;
        let mut parsing_result = self.parse_with_whitelist(input, intents_whitelist.as_ref())?;
        if intents_alternatives == 0 {
            return Ok(parsing_result);
        }
        let top_intent = parsing_result.intent.intent_name.clone();

        let alternative_results = self
            .get_intents(input)?
            .into_iter()
            .filter(|res| res.intent_name != top_intent)
            .filter(|res| match (res.intent_name.as_ref(), intents_whitelist.as_ref()) {
                (Some(name), Some(whitelist)) => whitelist.contains(name),
                _ => true,
            })
            .take(intents_alternatives)
            .map(|res| {
                let slots = match res.intent_name.as_ref() {
                    Some(intent_name) => self.get_slots(input, intent_name)?,
                    None => vec![],
                };
                Ok(IntentParserAlternative { intent: res, slots })
            })
            .collect::<Result<Vec<_>>>()?;

        parsing_result.alternatives = alternative_results;
        Ok(parsing_result)
    }

    /// Merges the whitelist and the blacklist into a single whitelist
    fn get_intents_whitelist<'a, 'b, W, B>(
        &self,
        intents_whitelist: W,
        intents_blacklist: B,
    ) -> Result<Option<HashSet<IntentName>>>
    where
        W: Into<Option<Vec<&'a str>>>,
        B: Into<Option<Vec<&'b str>>>,
    {
        let intents_whitelist = intents_whitelist.into();
        let intents_blacklist = intents_blacklist.into();
        if let Some(unknown_intent) = vec![intents_whitelist.as_ref(), intents_blacklist.as_ref()]
            .into_iter()
            .flatten()
            .flatten()
            .find(|intent| !self.dataset_metadata.slot_name_mappings.contains_key(**intent))
        {
            return Err(SnipsNluError::UnknownIntent(unknown_intent.to_string()).into());
        };
        if intents_whitelist.is_none() && intents_blacklist.is_none() {
            return Ok(None);
        }
        let blacklist: HashSet<&str> = intents_blacklist.unwrap_or_else(Vec::new).into_iter().collect();
        let whitelist = match intents_whitelist {
            Some(whitelist) => whitelist
                .into_iter()
                .filter(|intent| !blacklist.contains(*intent))
                .map(|intent| intent.to_string())
                .collect(),
            None => self
                .dataset_metadata
                .slot_name_mappings
                .keys()
                .filter(|intent| !blacklist.contains(intent.as_str()))
                .cloned()
                .collect(),
        };
        Ok(Some(whitelist))
    }

    /// Ranks every intent of the model, the null intent included
    pub fn get_intents(&self, input: &str) -> Result<Vec<IntentClassifierResult>> {
        let mut results: Vec<IntentClassifierResult> = vec![];
        for parser in self.intent_parsers.iter() {
            for res in parser.get_intents(input)?.into_iter() {
                match results
                    .iter_mut()
                    .find(|existing| existing.intent_name == res.intent_name)
                {
                    Some(existing) => {
                        if res.confidence_score > existing.confidence_score {
                            existing.confidence_score = res.confidence_score;
                        }
                    }
                    None => results.push(res),
                }
            }
        }
        results.sort_by(|a, b| {
            b.confidence_score
                .partial_cmp(&a.confidence_score)
                .unwrap_or(Ordering::Equal)
        });
        Ok(results)
    }

    /// Extracts the slots of the given intent, bypassing intent classification
    pub fn get_slots(&self, input: &str, intent: &str) -> Result<Vec<Slot>> {
        if !self.dataset_metadata.slot_name_mappings.contains_key(intent) {
            return Err(SnipsNluError::UnknownIntent(intent.to_string()).into());
        }
        for parser in &self.intent_parsers {
            let slots = parser.get_slots(input, intent)?;
            if !slots.is_empty() {
                return self.resolve_slots(input, slots);
            }
        }
        Ok(vec![])
    }

    fn resolve_slots(&self, text: &str, slots: Vec<InternalSlot>) -> Result<Vec<Slot>> {
        resolve_slots(
            text,
            slots,
            &self.dataset_metadata.entities,
            &self.shared_resources,
        )
    }
}

impl SnipsNluEngine {
    /// Resolves a whole input as the value of a slot of an intent
    pub fn extract_slot(
        &self,
        input: &str,
        intent_name: &str,
        slot_name: &str,
    ) -> Result<Option<Slot>> {
        let entity_name = self
            .dataset_metadata
            .slot_name_mappings
            .get(intent_name)
            .ok_or_else(|| SnipsNluError::UnknownIntent(intent_name.to_string()))?
            .get(slot_name)
            .ok_or_else(|| format_err!("Unknown slot '{}' in intent '{}'", slot_name, intent_name))?;

        extract_slot_from_text(
            input,
            slot_name,
            entity_name,
            &self.dataset_metadata.entities,
            &self.shared_resources,
        )
    }
}
