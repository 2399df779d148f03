use std::collections::HashMap;

use serde_derive::Deserialize;

use crate::utils::{EntityName, SlotName};

#[derive(Debug, Deserialize)]
pub struct SlotFillerModel {
    pub language_code: String,
    pub intent: String,
    pub slot_name_mapping: HashMap<SlotName, EntityName>,
    pub crf_model_file: Option<String>,
    pub config: SlotFillerConfiguration,
}

#[derive(Debug, Deserialize)]
pub struct SlotFillerConfiguration {
    pub tagging_scheme: u8,
    pub feature_factory_configs: Vec<FeatureFactory>,
    #[serde(default = "default_exhaustive_permutations_threshold")]
    pub exhaustive_permutations_threshold: usize,
}

fn default_exhaustive_permutations_threshold() -> usize {
    4
}

#[derive(Debug, Deserialize)]
pub struct FeatureFactory {
    pub factory_name: String,
    pub offsets: Vec<i32>,
    #[serde(default)]
    pub args: HashMap<String, serde_json::Value>,
}

/// Weights of a linear chain CRF
#[derive(Debug, Deserialize)]
pub struct CrfModel {
    pub labels: Vec<String>,
    /// Transition weights, indexed by previous label then current label
    pub transitions: Vec<Vec<f64>>,
    /// Weights of the `attribute:value` state features, per label
    pub state_features: HashMap<String, HashMap<String, f64>>,
}
