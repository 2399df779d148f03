use std::collections::HashMap;

use serde_derive::Deserialize;

use crate::utils::{EntityName, IntentName, SlotName};

#[derive(Debug, Deserialize)]
pub struct ModelVersion {
    pub model_version: String,
}

#[derive(Debug, Deserialize)]
pub struct NluEngineModel {
    pub dataset_metadata: DatasetMetadata,
    pub intent_parsers: Vec<String>,
    pub model_version: String,
    pub training_package_version: Option<String>,
    pub builtin_entity_parser: String,
    pub custom_entity_parser: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatasetMetadata {
    pub language_code: String,
    pub entities: HashMap<EntityName, Entity>,
    pub slot_name_mappings: HashMap<IntentName, HashMap<SlotName, EntityName>>,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct Entity {
    pub automatically_extensible: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_dataset_metadata() {
        // Given
        let data = r#"{
            "language_code": "en",
            "entities": {
                "Temperature": {"automatically_extensible": false}
            },
            "slot_name_mappings": {
                "MakeTea": {
                    "number_of_cups": "snips/number",
                    "beverage_temperature": "Temperature"
                }
            }
        }"#;

        // When
        let metadata: DatasetMetadata = serde_json::from_str(data).unwrap();

        // Then
        assert_eq!("en", metadata.language_code);
        assert!(!metadata.entities["Temperature"].automatically_extensible);
        assert_eq!(
            "Temperature",
            metadata.slot_name_mappings["MakeTea"]["beverage_temperature"]
        );
    }
}
