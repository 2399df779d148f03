use std::collections::HashMap;
use std::fs;
use std::io;
use std::ops::Range;
use std::path::{Component, Path, PathBuf};

use failure::{format_err, ResultExt};
use zip::ZipArchive;

use crate::entity_parser::CustomEntity;
use crate::errors::*;
use crate::ontology::BuiltinEntity;

pub type IntentName = String;
pub type SlotName = String;
pub type EntityName = String;

pub fn ranges_overlap(lhs: &Range<usize>, rhs: &Range<usize>) -> bool {
    lhs.start < rhs.end && lhs.end > rhs.start
}

pub fn substring_with_char_range(input: &str, range: &Range<usize>) -> String {
    input
        .chars()
        .skip(range.start)
        .take(range.end.saturating_sub(range.start))
        .collect()
}

pub fn suffix_from_char_index(input: &str, index: usize) -> String {
    input.chars().skip(index).collect()
}

/// Returns all the ngrams of size at most `max_ngram_size`, along with the indexes of the tokens
/// they are made of
pub fn compute_all_ngrams(tokens: &[&str], max_ngram_size: usize) -> Vec<(String, Vec<usize>)> {
    let mut ngrams = Vec::new();
    for start in 0..tokens.len() {
        let mut ngram = String::new();
        let mut indexes = Vec::new();
        for end in start..tokens.len().min(start + max_ngram_size) {
            if !ngram.is_empty() {
                ngram.push(' ');
            }
            ngram.push_str(tokens[end]);
            indexes.push(end);
            ngrams.push((ngram.clone(), indexes.clone()));
        }
    }
    ngrams
}

/// Keeps items greedily in `sort_key_fn` order, dropping every item overlapping an item
/// already kept
pub fn deduplicate_overlapping_items<I, O, S, K>(
    items: Vec<I>,
    overlap: O,
    sort_key_fn: S,
) -> Vec<I>
where
    O: Fn(&I, &I) -> bool,
    S: FnMut(&I) -> K,
    K: Ord,
{
    let mut sorted_items = items;
    sorted_items.sort_by_key(sort_key_fn);
    let mut deduplicated_items: Vec<I> = Vec::with_capacity(sorted_items.len());
    for item in sorted_items {
        if !deduplicated_items
            .iter()
            .any(|dedup_item| overlap(dedup_item, &item))
        {
            deduplicated_items.push(item);
        }
    }
    deduplicated_items
}

pub fn extract_nlu_engine_zip_archive<R: io::Read + io::Seek>(
    zip_reader: R,
    dest_path: &Path,
) -> Result<PathBuf> {
    let mut archive =
        ZipArchive::new(zip_reader).with_context(|_| "Could not read nlu engine zip data")?;
    if archive.len() == 0 {
        return Err(format_err!("Trained engine archive is empty"));
    }
    for file_index in 0..archive.len() {
        let mut file = archive.by_index(file_index)?;
        let outpath = dest_path.join(file.sanitized_name());

        if file.name().ends_with('/') || file.name().ends_with('\\') {
            fs::create_dir_all(&outpath)?;
        } else {
            if let Some(parent) = outpath.parent() {
                if !parent.exists() {
                    fs::create_dir_all(&parent)?;
                }
            }
            let mut outfile = fs::File::create(&outpath)
                .with_context(|_| format!("Cannot create file {:?}", outpath))?;
            io::copy(&mut file, &mut outfile)
                .with_context(|_| format!("Cannot extract archive entry {:?}", file.name()))?;
        }
    }
    let first_archive_file = archive.by_index(0)?.sanitized_name();
    let engine_dir_name = first_archive_file
        .components()
        .find_map(|component| match component {
            Component::Normal(name) => Some(name),
            _ => None,
        })
        .ok_or_else(|| format_err!("Trained engine archive is incorrect"))?
        .to_str()
        .ok_or_else(|| format_err!("Engine directory name is not valid unicode"))?
        .to_string();
    Ok(dest_path.join(engine_dir_name))
}

#[derive(Debug, Clone, PartialEq)]
pub struct MatchedEntity {
    pub range: Range<usize>,
    pub entity_name: String,
}

impl From<BuiltinEntity> for MatchedEntity {
    fn from(entity: BuiltinEntity) -> MatchedEntity {
        MatchedEntity {
            range: entity.range,
            entity_name: entity.entity_kind.identifier().to_string(),
        }
    }
}

impl From<CustomEntity> for MatchedEntity {
    fn from(entity: CustomEntity) -> MatchedEntity {
        MatchedEntity {
            range: entity.range,
            entity_name: entity.entity_identifier,
        }
    }
}

/// Replaces matched entities with placeholders, keeping the largest match when several overlap.
/// Returns the mapping from ranges in the new text to ranges in the original text.
pub fn replace_entities<F>(
    text: &str,
    matched_entities: Vec<MatchedEntity>,
    placeholder_fn: F,
) -> (HashMap<Range<usize>, Range<usize>>, String)
where
    F: Fn(&str) -> String,
{
    if matched_entities.is_empty() {
        return (HashMap::new(), text.to_string());
    }

    let dedup_matches = deduplicate_overlapping_entities(matched_entities);

    let mut range_mapping: HashMap<Range<usize>, Range<usize>> = HashMap::new();
    let mut processed_text = String::with_capacity(text.len());
    let mut offset: i64 = 0;
    let mut current_ix = 0;

    for matched_entity in dedup_matches {
        let range_start = (matched_entity.range.start as i64 + offset) as usize;
        let prefix_text =
            substring_with_char_range(text, &(current_ix..matched_entity.range.start));
        let entity_text = placeholder_fn(&*matched_entity.entity_name);
        processed_text.push_str(&prefix_text);
        processed_text.push_str(&entity_text);
        offset += entity_text.chars().count() as i64 - matched_entity.range.len() as i64;
        let range_end = (matched_entity.range.end as i64 + offset) as usize;
        current_ix = matched_entity.range.end;
        range_mapping.insert(range_start..range_end, matched_entity.range);
    }

    processed_text.push_str(&suffix_from_char_index(text, current_ix));
    (range_mapping, processed_text)
}

fn deduplicate_overlapping_entities(entities: Vec<MatchedEntity>) -> Vec<MatchedEntity> {
    let entities_overlap = |lhs_entity: &MatchedEntity, rhs_entity: &MatchedEntity| {
        ranges_overlap(&lhs_entity.range, &rhs_entity.range)
    };
    let entity_sort_key = |entity: &MatchedEntity| {
        (
            -(entity.range.len() as i64),
            entity.range.start,
        )
    };
    let mut deduped = deduplicate_overlapping_items(entities, entities_overlap, entity_sort_key);
    deduped.sort_by_key(|entity| entity.range.start);
    deduped
}
