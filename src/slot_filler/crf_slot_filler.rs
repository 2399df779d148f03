use std::collections::{BTreeMap, HashMap, HashSet};
use std::fs;
use std::ops::Range;
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;

use failure::ResultExt;
use itertools::Itertools;
use log::debug;

use crate::errors::*;
use crate::language::Language;
use crate::models::{CrfModel, SlotFillerModel};
use crate::ontology::{BuiltinEntity, BuiltinEntityKind};
use crate::preprocessing::{tokenize, Token};
use crate::resources::SharedResources;
use crate::slot_filler::crf::Crf;
use crate::slot_filler::crf_utils::*;
use crate::slot_filler::feature_processor::ProbabilisticFeatureProcessor;
use crate::slot_filler::SlotFiller;
use crate::slot_utils::*;
use crate::utils::{ranges_overlap, substring_with_char_range, EntityName, SlotName};

pub struct CRFSlotFiller {
    language: Language,
    tagging_scheme: TaggingScheme,
    crf: Option<Crf>,
    feature_processor: Option<ProbabilisticFeatureProcessor>,
    slot_name_mapping: HashMap<SlotName, EntityName>,
    shared_resources: Arc<SharedResources>,
    exhaustive_permutations_threshold: usize,
}

impl CRFSlotFiller {
    pub fn from_path<P: AsRef<Path>>(
        path: P,
        shared_resources: Arc<SharedResources>,
    ) -> Result<Self> {
        let slot_filler_model_path = path.as_ref().join("slot_filler.json");
        let model_file = fs::File::open(&slot_filler_model_path).with_context(|_| {
            format!(
                "Cannot open CRFSlotFiller file '{:?}'",
                &slot_filler_model_path
            )
        })?;
        let model: SlotFillerModel = serde_json::from_reader(model_file)
            .with_context(|_| "Cannot deserialize CRFSlotFiller json data")?;

        let tagging_scheme = TaggingScheme::from_u8(model.config.tagging_scheme)?;
        let intent = model.intent;
        let slot_name_mapping = model.slot_name_mapping;
        let (crf, feature_processor) = if let Some(crf_model_file) = model.crf_model_file.as_ref()
        {
            let crf_path = path.as_ref().join(crf_model_file);
            let crf_file = fs::File::open(&crf_path)
                .with_context(|_| format!("Cannot open CRF model file '{:?}'", &crf_path))?;
            let crf_model: CrfModel = serde_json::from_reader(crf_file)
                .with_context(|_| format!("Cannot deserialize CRF model '{:?}'", &crf_path))?;
            let crf = Crf::new(crf_model)
                .with_context(|_| format!("Invalid CRF model '{:?}'", &crf_path))?;
            for label in crf.labels() {
                validate_label(label, tagging_scheme, &slot_name_mapping)
                    .with_context(|_| format!("Invalid CRF model for intent '{}'", intent))?;
            }
            let feature_processor = ProbabilisticFeatureProcessor::new(
                &model.config.feature_factory_configs,
                shared_resources.clone(),
            )?;
            (Some(crf), Some(feature_processor))
        } else {
            debug!("No CRF model for intent '{}'", intent);
            (None, None)
        };
        let language = Language::from_str(&model.language_code)?;

        Ok(Self {
            language,
            tagging_scheme,
            crf,
            feature_processor,
            slot_name_mapping,
            shared_resources,
            exhaustive_permutations_threshold: model.config.exhaustive_permutations_threshold,
        })
    }

    /// Slots of this intent which are filled by builtin entities, sorted by slot name
    fn builtin_slots(&self) -> Vec<(SlotName, BuiltinEntityKind)> {
        self.slot_name_mapping
            .iter()
            .filter_map(|(slot_name, entity)| {
                BuiltinEntityKind::from_identifier(entity)
                    .ok()
                    .map(|kind| (slot_name.clone(), kind))
            })
            .sorted()
            .collect()
    }
}

impl SlotFiller for CRFSlotFiller {
    fn get_tagging_scheme(&self) -> TaggingScheme {
        self.tagging_scheme
    }

    fn get_slots(&self, text: &str) -> Result<Vec<InternalSlot>> {
        let (crf, feature_processor) = match (self.crf.as_ref(), self.feature_processor.as_ref()) {
            (Some(crf), Some(feature_processor)) => (crf, feature_processor),
            _ => return Ok(vec![]),
        };
        let tokens = tokenize(text, self.language);
        if tokens.is_empty() {
            return Ok(vec![]);
        }
        let features = feature_processor.compute_features(&tokens)?;
        let tags = crf.tag(&features, self.tagging_scheme);

        let builtin_slots = self.builtin_slots();
        if builtin_slots.is_empty() {
            return tags_to_slots(
                text,
                &tokens,
                &tags,
                self.tagging_scheme,
                &self.slot_name_mapping,
            );
        }

        let builtin_slot_names: HashSet<SlotName> = builtin_slots
            .iter()
            .map(|(slot_name, _)| slot_name.clone())
            .collect();
        let updated_tags = replace_builtin_tags(tags, &builtin_slot_names);
        let builtin_entity_kinds = builtin_slots
            .iter()
            .map(|(_, kind)| *kind)
            .unique()
            .collect_vec();
        let builtin_entities = self
            .shared_resources
            .builtin_entity_parser
            .extract_entities(text, Some(&builtin_entity_kinds), true)?;

        augment_slots(
            text,
            &tokens,
            &updated_tags,
            self,
            &self.slot_name_mapping,
            builtin_entities,
            &builtin_slots,
            self.exhaustive_permutations_threshold,
        )
    }

    fn get_sequence_probability(&self, tokens: &[Token], tags: Vec<String>) -> Result<f64> {
        if let (Some(crf), Some(feature_processor)) =
            (self.crf.as_ref(), self.feature_processor.as_ref())
        {
            let features = feature_processor.compute_features(tokens)?;
            let crf_labels = crf.labels().iter().map(|l| &**l).collect_vec();
            // Substitute tags that were not seen during training
            let cleaned_tags = tags
                .into_iter()
                .map(|t| {
                    if crf_labels.contains(&&*t) {
                        t
                    } else {
                        get_substitution_label(&crf_labels)
                    }
                })
                .collect_vec();
            crf.sequence_probability(&features, &cleaned_tags)
        } else {
            // No CRF corresponds to an intent without slots
            Ok(tags
                .into_iter()
                .find(|tag| tag != OUTSIDE)
                .map(|_| 0.0)
                .unwrap_or(1.0))
        }
    }
}

fn filter_overlapping_builtins(
    builtin_entities: Vec<BuiltinEntity>,
    tokens: &[Token],
    tags: &[String],
    tagging_scheme: TaggingScheme,
) -> Vec<BuiltinEntity> {
    let slots_ranges = tags_to_slot_ranges(tokens, tags, tagging_scheme);
    builtin_entities
        .into_iter()
        .filter(|entity| {
            !slots_ranges
                .iter()
                .any(|slot| ranges_overlap(&entity.range, &slot.char_range))
        })
        .collect()
}

/// Tags the builtin entities found in the text with the builtin slots of the intent, keeping,
/// for each entity kind, the assignment which the slot filler finds the most likely
fn augment_slots(
    text: &str,
    tokens: &[Token],
    tags: &[String],
    slot_filler: &dyn SlotFiller,
    intent_slots_mapping: &HashMap<SlotName, EntityName>,
    builtin_entities: Vec<BuiltinEntity>,
    missing_slots: &[(SlotName, BuiltinEntityKind)],
    exhaustive_permutations_threshold: usize,
) -> Result<Vec<InternalSlot>> {
    let tagging_scheme = slot_filler.get_tagging_scheme();
    let mut grouped_entities: BTreeMap<BuiltinEntityKind, Vec<BuiltinEntity>> = BTreeMap::new();
    for entity in filter_overlapping_builtins(builtin_entities, tokens, tags, tagging_scheme) {
        grouped_entities
            .entry(entity.entity_kind)
            .or_insert_with(Vec::new)
            .push(entity);
    }

    let mut augmented_tags = tags.to_vec();
    for (entity_kind, group) in grouped_entities.iter() {
        let spans_ranges = group.iter().map(|e| e.range.clone()).collect_vec();
        let tokens_indexes = spans_to_tokens_indexes(&spans_ranges, tokens);
        let related_slots = missing_slots
            .iter()
            .filter(|(_, kind)| kind == entity_kind)
            .map(|(slot_name, _)| &**slot_name)
            .collect_vec();

        let slots_permutations = generate_slots_permutations(
            spans_ranges.len(),
            &related_slots,
            exhaustive_permutations_threshold,
        );
        let mut best_updated_tags = augmented_tags.clone();
        let mut best_permutation_score: f64 = -1.0;
        for slots in &slots_permutations {
            let mut updated_tags = augmented_tags.clone();
            for (slot_index, slot) in slots.iter().enumerate() {
                let indexes = &tokens_indexes[slot_index];
                let sub_tags_sequence = positive_tagging(tagging_scheme, slot, indexes.len());
                for (index_position, index) in indexes.iter().enumerate() {
                    updated_tags[*index] = sub_tags_sequence[index_position].clone();
                }
            }
            let score = slot_filler.get_sequence_probability(tokens, updated_tags.clone())?;
            if score > best_permutation_score {
                best_updated_tags = updated_tags;
                best_permutation_score = score;
            }
        }
        augmented_tags = best_updated_tags;
    }
    let slots = tags_to_slots(
        text,
        tokens,
        &augmented_tags,
        tagging_scheme,
        intent_slots_mapping,
    )?;
    let filtered_builtin_entities = grouped_entities.into_iter().flat_map(|(_, e)| e).collect_vec();
    Ok(reconciliate_builtin_slots(
        text,
        slots,
        &filtered_builtin_entities,
    ))
}

/// Extends builtin slots to the builtin entity strictly containing them, if any
fn reconciliate_builtin_slots(
    text: &str,
    slots: Vec<InternalSlot>,
    builtin_entities: &[BuiltinEntity],
) -> Vec<InternalSlot> {
    slots
        .into_iter()
        .map(|slot| {
            let kind = match BuiltinEntityKind::from_identifier(&slot.entity) {
                Ok(kind) => kind,
                Err(_) => return slot,
            };
            let enclosing_entity = builtin_entities.iter().find(|entity| {
                entity.entity_kind == kind
                    && entity.range.start <= slot.char_range.start
                    && entity.range.end >= slot.char_range.end
                    && entity.range.len() > slot.char_range.len()
            });
            match enclosing_entity {
                Some(entity) => InternalSlot {
                    value: substring_with_char_range(text, &entity.range),
                    char_range: entity.range.clone(),
                    entity: slot.entity,
                    slot_name: slot.slot_name,
                },
                None => slot,
            }
        })
        .collect()
}

fn spans_to_tokens_indexes(spans: &[Range<usize>], tokens: &[Token]) -> Vec<Vec<usize>> {
    spans
        .iter()
        .map(|span| {
            tokens
                .iter()
                .enumerate()
                .filter(|(_, token)| ranges_overlap(span, &token.char_range))
                .map(|(i, _)| i)
                .collect()
        })
        .collect()
}
