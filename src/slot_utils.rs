use std::cmp::Reverse;
use std::collections::HashMap;
use std::ops::Range;

use itertools::Itertools;
use log::debug;

use crate::entity_parser::CustomEntity;
use crate::errors::*;
use crate::models::nlu_engine::Entity;
use crate::ontology::{BuiltinEntity, BuiltinEntityKind, Slot, SlotValue};
use crate::resources::SharedResources;
use crate::utils::{substring_with_char_range, EntityName, SlotName};

/// Slot as tagged by a slot filler, before its value gets resolved
#[derive(Debug, Clone, PartialEq)]
pub struct InternalSlot {
    pub value: String,
    pub char_range: Range<usize>,
    pub entity: EntityName,
    pub slot_name: SlotName,
}

enum EntityCandidate {
    Builtin(BuiltinEntity),
    Custom(CustomEntity),
}

impl EntityCandidate {
    fn range(&self) -> &Range<usize> {
        match self {
            EntityCandidate::Builtin(entity) => &entity.range,
            EntityCandidate::Custom(entity) => &entity.range,
        }
    }

    /// Larger spans first, then builtin entities, then earlier starts
    fn ranking_key(&self) -> (Reverse<usize>, u8, usize) {
        let range = self.range();
        let kind_rank = match self {
            EntityCandidate::Builtin(_) => 0,
            EntityCandidate::Custom(_) => 1,
        };
        (Reverse(range.end - range.start), kind_rank, range.start)
    }

    fn into_slot_value(self) -> SlotValue {
        match self {
            EntityCandidate::Builtin(entity) => entity.entity,
            EntityCandidate::Custom(entity) => custom_slot_value(entity),
        }
    }
}

fn custom_slot_value(entity: CustomEntity) -> SlotValue {
    let builtin_gazetteer_kind = BuiltinEntityKind::from_identifier(&entity.entity_identifier)
        .ok()
        .filter(|kind| kind.is_gazetteer_entity());
    match builtin_gazetteer_kind {
        Some(kind) => kind
            .gazetteer_value(entity.resolved_value.clone())
            .unwrap_or_else(|| SlotValue::Custom(entity.resolved_value.into())),
        None => SlotValue::Custom(entity.resolved_value.into()),
    }
}

/// Resolves the values of tagged slots, dropping the slots that cannot be resolved
pub fn resolve_slots(
    text: &str,
    slots: Vec<InternalSlot>,
    entities: &HashMap<EntityName, Entity>,
    shared_resources: &SharedResources,
) -> Result<Vec<Slot>> {
    if slots.is_empty() {
        return Ok(vec![]);
    }
    let builtin_kinds = slots
        .iter()
        .filter_map(|slot| BuiltinEntityKind::from_identifier(&slot.entity).ok())
        .unique()
        .collect_vec();
    let custom_entity_names = slots
        .iter()
        .filter(|slot| entities.contains_key(&slot.entity))
        .map(|slot| slot.entity.clone())
        .unique()
        .collect_vec();
    let builtin_entities = if builtin_kinds.is_empty() {
        vec![]
    } else {
        shared_resources
            .builtin_entity_parser
            .extract_entities(text, Some(&builtin_kinds), true)?
    };
    let custom_entities = if custom_entity_names.is_empty() {
        vec![]
    } else {
        shared_resources
            .custom_entity_parser
            .extract_entities(text, Some(&custom_entity_names))?
    };

    let mut resolved_slots = Vec::with_capacity(slots.len());
    for slot in slots {
        if let Some(resolved_slot) = resolve_slot(
            slot,
            &builtin_entities,
            &custom_entities,
            entities,
            shared_resources,
        )? {
            resolved_slots.push(resolved_slot);
        }
    }
    Ok(resolved_slots)
}

pub fn resolve_slot(
    internal_slot: InternalSlot,
    builtin_entities: &[BuiltinEntity],
    custom_entities: &[CustomEntity],
    entities: &HashMap<EntityName, Entity>,
    shared_resources: &SharedResources,
) -> Result<Option<Slot>> {
    let opt_builtin_kind = BuiltinEntityKind::from_identifier(&internal_slot.entity).ok();
    let opt_custom_entity = entities.get(&internal_slot.entity);

    let mut candidates = vec![];
    if let Some(kind) = opt_builtin_kind {
        candidates.extend(
            builtin_entities
                .iter()
                .filter(|e| e.entity_kind == kind && e.range == internal_slot.char_range)
                .cloned()
                .map(EntityCandidate::Builtin),
        );
    }
    if opt_custom_entity.is_some() {
        candidates.extend(
            custom_entities
                .iter()
                .filter(|e| {
                    e.entity_identifier == internal_slot.entity
                        && e.range == internal_slot.char_range
                })
                .cloned()
                .map(EntityCandidate::Custom),
        );
    }

    if candidates.is_empty() {
        candidates = reparse_slot_value(
            &internal_slot,
            opt_builtin_kind,
            opt_custom_entity.is_some(),
            shared_resources,
        )?;
    }

    let best_candidate = candidates
        .into_iter()
        .min_by_key(|candidate| candidate.ranking_key());

    let slot_value = match best_candidate {
        Some(candidate) => candidate.into_slot_value(),
        None => match opt_custom_entity {
            Some(entity) if entity.automatically_extensible => {
                SlotValue::Custom(internal_slot.value.clone().into())
            }
            _ => {
                debug!(
                    "Cannot resolve slot '{}' with value '{}' as '{}'",
                    internal_slot.slot_name, internal_slot.value, internal_slot.entity
                );
                return Ok(None);
            }
        },
    };
    Ok(Some(Slot {
        raw_value: internal_slot.value,
        value: slot_value,
        range: internal_slot.char_range,
        entity: internal_slot.entity,
        slot_name: internal_slot.slot_name,
    }))
}

fn reparse_slot_value(
    internal_slot: &InternalSlot,
    opt_builtin_kind: Option<BuiltinEntityKind>,
    is_custom_entity: bool,
    shared_resources: &SharedResources,
) -> Result<Vec<EntityCandidate>> {
    let mut candidates = vec![];
    if let Some(kind) = opt_builtin_kind {
        candidates.extend(
            shared_resources
                .builtin_entity_parser
                .extract_entities(&internal_slot.value, Some(&[kind]), true)?
                .into_iter()
                .map(EntityCandidate::Builtin),
        );
    }
    if is_custom_entity {
        let whole_range = 0..internal_slot.value.chars().count();
        candidates.extend(
            shared_resources
                .custom_entity_parser
                .extract_entities(&internal_slot.value, Some(&[internal_slot.entity.clone()]))?
                .into_iter()
                .filter(|entity| entity.range == whole_range)
                .map(EntityCandidate::Custom),
        );
    }
    Ok(candidates)
}

/// Resolves a whole text as the value of a slot
pub fn extract_slot_from_text(
    text: &str,
    slot_name: &str,
    entity_name: &str,
    entities: &HashMap<EntityName, Entity>,
    shared_resources: &SharedResources,
) -> Result<Option<Slot>> {
    if let Ok(kind) = BuiltinEntityKind::from_identifier(entity_name) {
        return Ok(shared_resources
            .builtin_entity_parser
            .extract_entities(text, Some(&[kind]), true)?
            .into_iter()
            .next()
            .map(|entity| Slot {
                raw_value: substring_with_char_range(text, &entity.range),
                value: entity.entity,
                range: entity.range,
                entity: entity_name.to_string(),
                slot_name: slot_name.to_string(),
            }));
    }
    let entity = match entities.get(entity_name) {
        Some(entity) => entity,
        None => return Ok(None),
    };
    let largest_match = shared_resources
        .custom_entity_parser
        .extract_entities(text, Some(&[entity_name.to_string()]))?
        .into_iter()
        .min_by_key(|e| (Reverse(e.range.end - e.range.start), e.range.start));
    Ok(match largest_match {
        Some(custom_entity) => Some(Slot {
            raw_value: custom_entity.value.clone(),
            range: custom_entity.range.clone(),
            value: custom_slot_value(custom_entity),
            entity: entity_name.to_string(),
            slot_name: slot_name.to_string(),
        }),
        None if entity.automatically_extensible => Some(Slot {
            raw_value: text.to_string(),
            value: SlotValue::Custom(text.to_string().into()),
            range: 0..text.chars().count(),
            entity: entity_name.to_string(),
            slot_name: slot_name.to_string(),
        }),
        None => None,
    })
}

#[cfg(test)]
mod tests {
    use std::iter::FromIterator;

    use maplit::hashmap;

    use super::*;
    use crate::ontology::*;
    use crate::testutils::*;

    fn amount_of_money(value: f32) -> SlotValue {
        SlotValue::AmountOfMoney(AmountOfMoneyValue {
            value,
            precision: Precision::Exact,
            unit: Some("$".to_string()),
        })
    }

    fn user_type_entities(automatically_extensible: bool) -> HashMap<EntityName, Entity> {
        hashmap! {
            "userType".to_string() => Entity { automatically_extensible },
        }
    }

    fn subscriber_slot() -> InternalSlot {
        InternalSlot {
            value: "subscriber".to_string(),
            char_range: 27..37,
            entity: "userType".to_string(),
            slot_name: "userType".to_string(),
        }
    }

    #[test]
    fn should_resolve_builtin_slot() {
        // Given
        let internal_slot = InternalSlot {
            value: "8 dollars".to_string(),
            char_range: 22..31,
            slot_name: "amount".to_string(),
            entity: "snips/amountOfMoney".to_string(),
        };
        let builtin_entities = vec![
            BuiltinEntity {
                value: "5 dollars".to_string(),
                range: 5..14,
                entity: amount_of_money(5.0),
                entity_kind: BuiltinEntityKind::AmountOfMoney,
            },
            BuiltinEntity {
                value: "8 dollars".to_string(),
                range: 22..31,
                entity: amount_of_money(8.0),
                entity_kind: BuiltinEntityKind::AmountOfMoney,
            },
        ];
        let resources = SharedResourcesBuilder::default().build();

        // When
        let resolved_slot = resolve_slot(
            internal_slot,
            &builtin_entities,
            &[],
            &HashMap::new(),
            &resources,
        )
        .unwrap();

        // Then
        let expected_result = Some(Slot {
            raw_value: "8 dollars".to_string(),
            value: amount_of_money(8.0),
            range: 22..31,
            entity: "snips/amountOfMoney".to_string(),
            slot_name: "amount".to_string(),
        });
        assert_eq!(expected_result, resolved_slot);
    }

    #[test]
    fn should_resolve_builtin_slot_when_no_entities_found_on_whole_input() {
        // Given
        let internal_slot = InternalSlot {
            value: "5 dollars".to_string(),
            char_range: 5..14,
            slot_name: "amount".to_string(),
            entity: "snips/amountOfMoney".to_string(),
        };
        let mocked_entity_parser = MockedBuiltinEntityParser::from_iter(vec![(
            "5 dollars".to_string(),
            vec![BuiltinEntity {
                value: "5 dollars".to_string(),
                range: 0..9,
                entity: amount_of_money(5.0),
                entity_kind: BuiltinEntityKind::AmountOfMoney,
            }],
        )]);
        let resources = SharedResourcesBuilder::default()
            .builtin_entity_parser(mocked_entity_parser)
            .build();

        // When
        let resolved_slot =
            resolve_slot(internal_slot, &[], &[], &HashMap::new(), &resources).unwrap();

        // Then
        let expected_result = Some(Slot {
            raw_value: "5 dollars".to_string(),
            value: amount_of_money(5.0),
            range: 5..14,
            entity: "snips/amountOfMoney".to_string(),
            slot_name: "amount".to_string(),
        });
        assert_eq!(expected_result, resolved_slot);
    }

    #[test]
    fn should_drop_unresolved_builtin_slot() {
        // Given
        let internal_slot = InternalSlot {
            value: "many".to_string(),
            char_range: 5..9,
            slot_name: "number_of_cups".to_string(),
            entity: "snips/number".to_string(),
        };
        let resources = SharedResourcesBuilder::default().build();

        // When
        let resolved_slot =
            resolve_slot(internal_slot, &[], &[], &HashMap::new(), &resources).unwrap();

        // Then
        assert_eq!(None, resolved_slot);
    }

    #[test]
    fn should_resolve_custom_slot() {
        // Given
        let custom_entities = vec![
            CustomEntity {
                value: "publisher".to_string(),
                range: 7..16,
                resolved_value: "Publisher".to_string(),
                entity_identifier: "userType".to_string(),
            },
            CustomEntity {
                value: "subscriber".to_string(),
                range: 27..37,
                resolved_value: "Subscriber".to_string(),
                entity_identifier: "userType".to_string(),
            },
        ];
        let resources = SharedResourcesBuilder::default().build();

        // When
        let resolved_slot = resolve_slot(
            subscriber_slot(),
            &[],
            &custom_entities,
            &user_type_entities(false),
            &resources,
        )
        .unwrap();

        // Then
        let expected_result = Some(Slot {
            raw_value: "subscriber".to_string(),
            value: SlotValue::Custom("Subscriber".to_string().into()),
            range: 27..37,
            entity: "userType".to_string(),
            slot_name: "userType".to_string(),
        });
        assert_eq!(expected_result, resolved_slot);
    }

    #[test]
    fn should_resolve_custom_slot_when_no_entities_found_on_whole_input() {
        // Given
        let mocked_entity_parser = MockedCustomEntityParser::from_iter(vec![(
            "subscriber".to_string(),
            vec![CustomEntity {
                value: "subscriber".to_string(),
                range: 0..10,
                resolved_value: "Subscriber".to_string(),
                entity_identifier: "userType".to_string(),
            }],
        )]);
        let resources = SharedResourcesBuilder::default()
            .custom_entity_parser(mocked_entity_parser)
            .build();

        // When
        let resolved_slot = resolve_slot(
            subscriber_slot(),
            &[],
            &[],
            &user_type_entities(false),
            &resources,
        )
        .unwrap();

        // Then
        let expected_result = Some(Slot {
            raw_value: "subscriber".to_string(),
            value: SlotValue::Custom("Subscriber".to_string().into()),
            range: 27..37,
            entity: "userType".to_string(),
            slot_name: "userType".to_string(),
        });
        assert_eq!(expected_result, resolved_slot);
    }

    #[test]
    fn should_ignore_partial_custom_match_on_slot_value() {
        // Given
        let mocked_entity_parser = MockedCustomEntityParser::from_iter(vec![(
            "subscriber".to_string(),
            vec![CustomEntity {
                value: "sub".to_string(),
                range: 0..3,
                resolved_value: "Sub".to_string(),
                entity_identifier: "userType".to_string(),
            }],
        )]);
        let resources = SharedResourcesBuilder::default()
            .custom_entity_parser(mocked_entity_parser)
            .build();

        // When
        let resolved_slot = resolve_slot(
            subscriber_slot(),
            &[],
            &[],
            &user_type_entities(false),
            &resources,
        )
        .unwrap();

        // Then
        assert_eq!(None, resolved_slot);
    }

    #[test]
    fn should_resolve_custom_slot_when_automatically_extensible() {
        // Given
        let resources = SharedResourcesBuilder::default().build();

        // When
        let resolved_slot = resolve_slot(
            subscriber_slot(),
            &[],
            &[],
            &user_type_entities(true),
            &resources,
        )
        .unwrap();

        // Then
        let expected_result = Some(Slot {
            raw_value: "subscriber".to_string(),
            value: SlotValue::Custom("subscriber".to_string().into()),
            range: 27..37,
            entity: "userType".to_string(),
            slot_name: "userType".to_string(),
        });
        assert_eq!(expected_result, resolved_slot);
    }

    #[test]
    fn should_not_resolve_custom_slot_when_not_automatically_extensible() {
        // Given
        let resources = SharedResourcesBuilder::default().build();

        // When
        let resolved_slot = resolve_slot(
            subscriber_slot(),
            &[],
            &[],
            &user_type_entities(false),
            &resources,
        )
        .unwrap();

        // Then
        assert_eq!(None, resolved_slot);
    }

    #[test]
    fn should_resolve_gazetteer_identifier_to_music_value() {
        // Given
        let internal_slot = InternalSlot {
            value: "brew crew".to_string(),
            char_range: 9..18,
            entity: "snips/musicArtist".to_string(),
            slot_name: "artist".to_string(),
        };
        let entities = hashmap! {
            "snips/musicArtist".to_string() => Entity { automatically_extensible: false },
        };
        let custom_entities = vec![CustomEntity {
            value: "brew crew".to_string(),
            range: 9..18,
            resolved_value: "The Brew Crew".to_string(),
            entity_identifier: "snips/musicArtist".to_string(),
        }];
        let resources = SharedResourcesBuilder::default().build();

        // When
        let resolved_slot =
            resolve_slot(internal_slot, &[], &custom_entities, &entities, &resources).unwrap();

        // Then
        let expected_value = SlotValue::MusicArtist("The Brew Crew".to_string().into());
        assert_eq!(Some(expected_value), resolved_slot.map(|slot| slot.value));
    }

    #[test]
    fn should_resolve_slots_with_full_text_parses() {
        // Given
        let text = "make me two hot teas";
        let builtin_entity_parser = MockedBuiltinEntityParser::from_iter(vec![(
            text.to_string(),
            vec![BuiltinEntity {
                value: "two".to_string(),
                range: 8..11,
                entity: SlotValue::Number(NumberValue { value: 2.0 }),
                entity_kind: BuiltinEntityKind::Number,
            }],
        )]);
        let custom_entity_parser = MockedCustomEntityParser::from_iter(vec![(
            text.to_string(),
            vec![CustomEntity {
                value: "hot".to_string(),
                range: 12..15,
                resolved_value: "hot".to_string(),
                entity_identifier: "Temperature".to_string(),
            }],
        )]);
        let resources = SharedResourcesBuilder::default()
            .builtin_entity_parser(builtin_entity_parser)
            .custom_entity_parser(custom_entity_parser)
            .build();
        let entities = hashmap! {
            "Temperature".to_string() => Entity { automatically_extensible: false },
        };
        let slots = vec![
            InternalSlot {
                value: "two".to_string(),
                char_range: 8..11,
                entity: "snips/number".to_string(),
                slot_name: "number_of_cups".to_string(),
            },
            InternalSlot {
                value: "hot".to_string(),
                char_range: 12..15,
                entity: "Temperature".to_string(),
                slot_name: "beverage_temperature".to_string(),
            },
            InternalSlot {
                value: "teas".to_string(),
                char_range: 16..20,
                entity: "Temperature".to_string(),
                slot_name: "beverage_temperature".to_string(),
            },
        ];

        // When
        let resolved_slots = resolve_slots(text, slots, &entities, &resources).unwrap();

        // Then
        let expected_slots = vec![
            Slot {
                raw_value: "two".to_string(),
                value: SlotValue::Number(NumberValue { value: 2.0 }),
                range: 8..11,
                entity: "snips/number".to_string(),
                slot_name: "number_of_cups".to_string(),
            },
            Slot {
                raw_value: "hot".to_string(),
                value: SlotValue::Custom("hot".to_string().into()),
                range: 12..15,
                entity: "Temperature".to_string(),
                slot_name: "beverage_temperature".to_string(),
            },
        ];
        assert_eq!(expected_slots, resolved_slots);
    }

    #[test]
    fn should_extract_slot_from_whole_text() {
        // Given
        let text = "a boiling hot tea";
        let custom_entity_parser = MockedCustomEntityParser::from_iter(vec![(
            text.to_string(),
            vec![
                CustomEntity {
                    value: "hot".to_string(),
                    range: 10..13,
                    resolved_value: "hot".to_string(),
                    entity_identifier: "Temperature".to_string(),
                },
                CustomEntity {
                    value: "boiling hot".to_string(),
                    range: 2..13,
                    resolved_value: "boiling".to_string(),
                    entity_identifier: "Temperature".to_string(),
                },
            ],
        )]);
        let resources = SharedResourcesBuilder::default()
            .custom_entity_parser(custom_entity_parser)
            .build();
        let entities = hashmap! {
            "Temperature".to_string() => Entity { automatically_extensible: false },
            "Flavor".to_string() => Entity { automatically_extensible: true },
        };

        // When
        let temperature_slot = extract_slot_from_text(
            text,
            "beverage_temperature",
            "Temperature",
            &entities,
            &resources,
        )
        .unwrap();
        let flavor_slot =
            extract_slot_from_text(text, "flavor", "Flavor", &entities, &resources).unwrap();

        // Then
        let expected_temperature_slot = Some(Slot {
            raw_value: "boiling hot".to_string(),
            value: SlotValue::Custom("boiling".to_string().into()),
            range: 2..13,
            entity: "Temperature".to_string(),
            slot_name: "beverage_temperature".to_string(),
        });
        let expected_flavor_slot = Some(Slot {
            raw_value: text.to_string(),
            value: SlotValue::Custom(text.to_string().into()),
            range: 0..17,
            entity: "Flavor".to_string(),
            slot_name: "flavor".to_string(),
        });
        assert_eq!(expected_temperature_slot, temperature_slot);
        assert_eq!(expected_flavor_slot, flavor_slot);
    }

    fn number(value: f64) -> SlotValue {
        SlotValue::Number(NumberValue { value })
    }

    #[test]
    fn should_prefer_larger_builtin_match_when_reparsing_slot() {
        // Given
        let internal_slot = InternalSlot {
            value: "twenty five".to_string(),
            char_range: 10..21,
            slot_name: "number_of_cups".to_string(),
            entity: "snips/number".to_string(),
        };
        let mocked_entity_parser = MockedBuiltinEntityParser::from_iter(vec![(
            "twenty five".to_string(),
            vec![
                BuiltinEntity {
                    value: "twenty".to_string(),
                    range: 0..6,
                    entity: number(20.0),
                    entity_kind: BuiltinEntityKind::Number,
                },
                BuiltinEntity {
                    value: "five".to_string(),
                    range: 7..11,
                    entity: number(5.0),
                    entity_kind: BuiltinEntityKind::Number,
                },
                BuiltinEntity {
                    value: "twenty five".to_string(),
                    range: 0..11,
                    entity: number(25.0),
                    entity_kind: BuiltinEntityKind::Number,
                },
            ],
        )]);
        let resources = SharedResourcesBuilder::default()
            .builtin_entity_parser(mocked_entity_parser)
            .build();

        // When
        let resolved_slot =
            resolve_slot(internal_slot, &[], &[], &HashMap::new(), &resources).unwrap();

        // Then
        let expected_result = Some(Slot {
            raw_value: "twenty five".to_string(),
            value: number(25.0),
            range: 10..21,
            entity: "snips/number".to_string(),
            slot_name: "number_of_cups".to_string(),
        });
        assert_eq!(expected_result, resolved_slot);
    }

    #[test]
    fn should_prefer_earlier_builtin_match_on_equal_spans() {
        // Given
        let internal_slot = InternalSlot {
            value: "two or six".to_string(),
            char_range: 8..18,
            slot_name: "number_of_cups".to_string(),
            entity: "snips/number".to_string(),
        };
        let mocked_entity_parser = MockedBuiltinEntityParser::from_iter(vec![(
            "two or six".to_string(),
            vec![
                BuiltinEntity {
                    value: "six".to_string(),
                    range: 7..10,
                    entity: number(6.0),
                    entity_kind: BuiltinEntityKind::Number,
                },
                BuiltinEntity {
                    value: "two".to_string(),
                    range: 0..3,
                    entity: number(2.0),
                    entity_kind: BuiltinEntityKind::Number,
                },
            ],
        )]);
        let resources = SharedResourcesBuilder::default()
            .builtin_entity_parser(mocked_entity_parser)
            .build();

        // When
        let resolved_slot =
            resolve_slot(internal_slot, &[], &[], &HashMap::new(), &resources).unwrap();

        // Then
        assert_eq!(Some(number(2.0)), resolved_slot.map(|slot| slot.value));
    }

    #[test]
    fn should_prefer_builtin_over_custom_match_on_equal_spans() {
        // Given
        let internal_slot = InternalSlot {
            value: "brew crew".to_string(),
            char_range: 10..19,
            slot_name: "artist".to_string(),
            entity: "snips/musicArtist".to_string(),
        };
        let builtin_value = BuiltinEntityKind::MusicArtist
            .gazetteer_value("The Brew Crew".to_string())
            .unwrap();
        let builtin_entities = vec![BuiltinEntity {
            value: "brew crew".to_string(),
            range: 10..19,
            entity: builtin_value.clone(),
            entity_kind: BuiltinEntityKind::MusicArtist,
        }];
        let custom_entities = vec![CustomEntity {
            value: "brew crew".to_string(),
            range: 10..19,
            resolved_value: "Brew Crew Tribute Band".to_string(),
            entity_identifier: "snips/musicArtist".to_string(),
        }];
        let entities = hashmap! {
            "snips/musicArtist".to_string() => Entity { automatically_extensible: false },
        };
        let resources = SharedResourcesBuilder::default().build();

        // When
        let resolved_slot = resolve_slot(
            internal_slot,
            &builtin_entities,
            &custom_entities,
            &entities,
            &resources,
        )
        .unwrap();

        // Then
        assert_eq!(Some(builtin_value), resolved_slot.map(|slot| slot.value));
    }

    #[test]
    fn should_prefer_larger_custom_match_over_builtin_match() {
        // Given
        let internal_slot = InternalSlot {
            value: "brew crew live".to_string(),
            char_range: 10..24,
            slot_name: "artist".to_string(),
            entity: "snips/musicArtist".to_string(),
        };
        let mocked_builtin_parser = MockedBuiltinEntityParser::from_iter(vec![(
            "brew crew live".to_string(),
            vec![BuiltinEntity {
                value: "brew crew".to_string(),
                range: 0..9,
                entity: BuiltinEntityKind::MusicArtist
                    .gazetteer_value("The Brew Crew".to_string())
                    .unwrap(),
                entity_kind: BuiltinEntityKind::MusicArtist,
            }],
        )]);
        let mocked_custom_parser = MockedCustomEntityParser::from_iter(vec![(
            "brew crew live".to_string(),
            vec![CustomEntity {
                value: "brew crew live".to_string(),
                range: 0..14,
                resolved_value: "Brew Crew Live Band".to_string(),
                entity_identifier: "snips/musicArtist".to_string(),
            }],
        )]);
        let entities = hashmap! {
            "snips/musicArtist".to_string() => Entity { automatically_extensible: false },
        };
        let resources = SharedResourcesBuilder::default()
            .builtin_entity_parser(mocked_builtin_parser)
            .custom_entity_parser(mocked_custom_parser)
            .build();

        // When
        let resolved_slot = resolve_slot(internal_slot, &[], &[], &entities, &resources).unwrap();

        // Then
        let expected_value = BuiltinEntityKind::MusicArtist
            .gazetteer_value("Brew Crew Live Band".to_string())
            .unwrap();
        assert_eq!(Some(expected_value), resolved_slot.map(|slot| slot.value));
    }
}
