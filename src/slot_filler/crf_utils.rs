use std::collections::{HashMap, HashSet};
use std::ops::Range;

use failure::{bail, format_err};
use itertools::Itertools;

use crate::errors::*;
use crate::preprocessing::Token;
use crate::slot_utils::InternalSlot;
use crate::utils::{suffix_from_char_index, EntityName, SlotName};

pub const BEGINNING_PREFIX: &str = "B-";
pub const INSIDE_PREFIX: &str = "I-";
pub const LAST_PREFIX: &str = "L-";
pub const UNIT_PREFIX: &str = "U-";
pub const OUTSIDE: &str = "O";

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum TaggingScheme {
    IO,
    BIO,
    BILOU,
}

impl TaggingScheme {
    pub fn from_u8(i: u8) -> Result<TaggingScheme> {
        match i {
            0 => Ok(TaggingScheme::IO),
            1 => Ok(TaggingScheme::BIO),
            2 => Ok(TaggingScheme::BILOU),
            _ => bail!("Unknown tagging scheme identifier: {}", i),
        }
    }

    /// Tag prefixes that this scheme can produce
    pub fn prefixes(&self) -> &'static [&'static str] {
        match self {
            TaggingScheme::IO => &[INSIDE_PREFIX],
            TaggingScheme::BIO => &[BEGINNING_PREFIX, INSIDE_PREFIX],
            TaggingScheme::BILOU => &[BEGINNING_PREFIX, INSIDE_PREFIX, LAST_PREFIX, UNIT_PREFIX],
        }
    }
}

pub fn get_substitution_label(labels: &[&str]) -> String {
    if labels.contains(&OUTSIDE) {
        OUTSIDE.to_string()
    } else {
        labels[0].to_string()
    }
}

/// Replaces with `O` every tag whose slot is filled by a builtin entity
pub fn replace_builtin_tags(
    tags: Vec<String>,
    builtin_slot_names: &HashSet<SlotName>,
) -> Vec<String> {
    tags.into_iter()
        .map(|tag| {
            if tag != OUTSIDE && builtin_slot_names.contains(&tag_name_to_slot_name(&tag)) {
                OUTSIDE.to_string()
            } else {
                tag
            }
        })
        .collect()
}

pub fn tag_name_to_slot_name(tag: &str) -> String {
    suffix_from_char_index(tag, 2)
}

/// Splits a tag into its scheme prefix and its slot name
pub fn split_tag(tag: &str) -> Option<(&'static str, String)> {
    [BEGINNING_PREFIX, INSIDE_PREFIX, LAST_PREFIX, UNIT_PREFIX]
        .iter()
        .find(|prefix| tag.starts_with(*prefix))
        .map(|prefix| (*prefix, tag_name_to_slot_name(tag)))
}

/// Checks that a label is either `O` or a prefix of the scheme followed by a known slot name
pub fn validate_label(
    label: &str,
    tagging_scheme: TaggingScheme,
    slot_name_mapping: &HashMap<SlotName, EntityName>,
) -> Result<()> {
    if label == OUTSIDE {
        return Ok(());
    }
    let (prefix, slot_name) =
        split_tag(label).ok_or_else(|| format_err!("Invalid CRF label '{}'", label))?;
    if !tagging_scheme.prefixes().contains(&prefix) {
        bail!(
            "CRF label '{}' is not compatible with the {:?} tagging scheme",
            label,
            tagging_scheme
        );
    }
    if !slot_name_mapping.contains_key(&slot_name) {
        bail!("CRF label '{}' refers to an unknown slot name", label);
    }
    Ok(())
}

fn is_start_of_io_slot(tags: &[String], i: usize) -> bool {
    if i == 0 {
        tags[i] != OUTSIDE
    } else if tags[i] == OUTSIDE {
        false
    } else {
        tags[i - 1] == OUTSIDE
    }
}

fn is_end_of_io_slot(tags: &[String], i: usize) -> bool {
    if i + 1 == tags.len() {
        tags[i] != OUTSIDE
    } else if tags[i] == OUTSIDE {
        false
    } else {
        tags[i + 1] == OUTSIDE
    }
}

fn is_start_of_bio_slot(tags: &[String], i: usize) -> bool {
    if i == 0 {
        tags[i] != OUTSIDE
    } else if tags[i] == OUTSIDE {
        false
    } else if tags[i].starts_with(BEGINNING_PREFIX) {
        true
    } else {
        tags[i - 1] == OUTSIDE
    }
}

fn is_end_of_bio_slot(tags: &[String], i: usize) -> bool {
    if i + 1 == tags.len() {
        tags[i] != OUTSIDE
    } else if tags[i] == OUTSIDE {
        false
    } else {
        !tags[i + 1].starts_with(INSIDE_PREFIX)
    }
}

fn is_start_of_bilou_slot(tags: &[String], i: usize) -> bool {
    if i == 0 {
        tags[i] != OUTSIDE
    } else if tags[i] == OUTSIDE {
        false
    } else if tags[i].starts_with(BEGINNING_PREFIX) || tags[i].starts_with(UNIT_PREFIX) {
        true
    } else if tags[i - 1].starts_with(UNIT_PREFIX) || tags[i - 1].starts_with(LAST_PREFIX) {
        true
    } else {
        tags[i - 1] == OUTSIDE
    }
}

fn is_end_of_bilou_slot(tags: &[String], i: usize) -> bool {
    if i + 1 == tags.len() {
        tags[i] != OUTSIDE
    } else if tags[i] == OUTSIDE {
        false
    } else if tags[i + 1] == OUTSIDE {
        true
    } else if tags[i].starts_with(LAST_PREFIX) || tags[i].starts_with(UNIT_PREFIX) {
        true
    } else {
        tags[i + 1].starts_with(BEGINNING_PREFIX) || tags[i + 1].starts_with(UNIT_PREFIX)
    }
}

pub struct SlotRange {
    slot_name: String,
    pub range: Range<usize>,
    pub char_range: Range<usize>,
}

fn _tags_to_slots<F1, F2>(
    tags: &[String],
    tokens: &[Token],
    is_start_of_slot: F1,
    is_end_of_slot: F2,
) -> Vec<SlotRange>
where
    F1: Fn(&[String], usize) -> bool,
    F2: Fn(&[String], usize) -> bool,
{
    let mut slots: Vec<SlotRange> = Vec::with_capacity(tags.len());

    let mut current_slot_start = 0;
    for (i, tag) in tags.iter().enumerate() {
        if is_start_of_slot(tags, i) {
            current_slot_start = i;
        }
        if is_end_of_slot(tags, i) {
            slots.push(SlotRange {
                range: tokens[current_slot_start].range.start..tokens[i].range.end,
                char_range: tokens[current_slot_start].char_range.start..tokens[i].char_range.end,
                slot_name: tag_name_to_slot_name(tag),
            });
            current_slot_start = i;
        }
    }
    slots
}

pub fn tags_to_slot_ranges(
    tokens: &[Token],
    tags: &[String],
    tagging_scheme: TaggingScheme,
) -> Vec<SlotRange> {
    match tagging_scheme {
        TaggingScheme::IO => _tags_to_slots(tags, tokens, is_start_of_io_slot, is_end_of_io_slot),
        TaggingScheme::BIO => {
            _tags_to_slots(tags, tokens, is_start_of_bio_slot, is_end_of_bio_slot)
        }
        TaggingScheme::BILOU => {
            _tags_to_slots(tags, tokens, is_start_of_bilou_slot, is_end_of_bilou_slot)
        }
    }
}

/// Converts the tags of a sequence of tokens into slots, whose value is the original text
/// spanned by the tagged tokens
pub fn tags_to_slots(
    text: &str,
    tokens: &[Token],
    tags: &[String],
    tagging_scheme: TaggingScheme,
    intent_slots_mapping: &HashMap<SlotName, EntityName>,
) -> Result<Vec<InternalSlot>> {
    tags_to_slot_ranges(tokens, tags, tagging_scheme)
        .into_iter()
        .map(|s| {
            Ok(InternalSlot {
                value: text[s.range.clone()].to_string(),
                entity: intent_slots_mapping
                    .get(&s.slot_name)
                    .ok_or_else(|| {
                        format_err!(
                            "Missing slot to entity mapping for slot name: {}",
                            s.slot_name
                        )
                    })?
                    .to_string(),
                char_range: s.char_range,
                slot_name: s.slot_name,
            })
        })
        .collect()
}

pub fn positive_tagging(
    tagging_scheme: TaggingScheme,
    slot_name: &str,
    slot_size: usize,
) -> Vec<String> {
    if slot_name == OUTSIDE {
        return vec![OUTSIDE.to_string(); slot_size];
    };

    match tagging_scheme {
        TaggingScheme::IO => vec![format!("{}{}", INSIDE_PREFIX, slot_name); slot_size],
        TaggingScheme::BIO => {
            if slot_size > 0 {
                let mut v1 = vec![format!("{}{}", BEGINNING_PREFIX, slot_name)];
                let mut v2 = vec![format!("{}{}", INSIDE_PREFIX, slot_name); slot_size - 1];
                v1.append(&mut v2);
                v1
            } else {
                vec![]
            }
        }
        TaggingScheme::BILOU => match slot_size {
            0 => vec![],
            1 => vec![format!("{}{}", UNIT_PREFIX, slot_name)],
            _ => {
                let mut v1 = vec![format!("{}{}", BEGINNING_PREFIX, slot_name)];
                let mut v2 = vec![format!("{}{}", INSIDE_PREFIX, slot_name); slot_size - 2];
                v1.append(&mut v2);
                v1.push(format!("{}{}", LAST_PREFIX, slot_name));
                v1
            }
        },
    }
}

/// Prefix of the token at `index` within an entity spanning the tokens at `indexes`
pub fn get_scheme_prefix(
    index: usize,
    indexes: &[usize],
    tagging_scheme: TaggingScheme,
) -> &'static str {
    match tagging_scheme {
        TaggingScheme::IO => INSIDE_PREFIX,
        TaggingScheme::BIO => {
            if indexes.first() == Some(&index) {
                BEGINNING_PREFIX
            } else {
                INSIDE_PREFIX
            }
        }
        TaggingScheme::BILOU => {
            if indexes.len() == 1 {
                UNIT_PREFIX
            } else if indexes.first() == Some(&index) {
                BEGINNING_PREFIX
            } else if indexes.last() == Some(&index) {
                LAST_PREFIX
            } else {
                INSIDE_PREFIX
            }
        }
    }
}

/// Candidate slot assignments for `nb_entities` detected builtin entities, each entity taking
/// one of `slot_names` or `O`.
///
/// All combinations are generated up to `exhaustive_permutations_threshold` entities. Past it,
/// only the assignments with at most one slotted entity are kept.
pub fn generate_slots_permutations(
    nb_entities: usize,
    slot_names: &[&str],
    exhaustive_permutations_threshold: usize,
) -> Vec<Vec<String>> {
    if nb_entities == 0 {
        return vec![];
    }
    let candidates = slot_names
        .iter()
        .cloned()
        .chain(std::iter::once(OUTSIDE))
        .map(|name| name.to_string())
        .collect_vec();
    if nb_entities <= exhaustive_permutations_threshold {
        return (0..nb_entities)
            .map(|_| candidates.clone())
            .multi_cartesian_product()
            .collect();
    }
    let outside = vec![OUTSIDE.to_string(); nb_entities];
    let mut permutations = (0..nb_entities)
        .flat_map(|index| {
            let outside = &outside;
            slot_names.iter().map(move |slot_name| {
                let mut permutation = outside.clone();
                permutation[index] = slot_name.to_string();
                permutation
            })
        })
        .collect_vec();
    permutations.push(outside);
    permutations
}
