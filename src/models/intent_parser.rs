use serde_derive::Deserialize;

use crate::utils::IntentName;

#[derive(Debug, Deserialize)]
pub struct ProbabilisticParserModel {
    pub slot_fillers: Vec<SlotFillerMetadata>,
}

#[derive(Debug, Deserialize)]
pub struct SlotFillerMetadata {
    pub intent: IntentName,
    pub slot_filler_name: String,
}
