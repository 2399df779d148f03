use std::fs::File;
use std::path::Path;

use failure::ResultExt;
use serde_derive::Deserialize;

use crate::errors::*;

#[derive(Debug, Deserialize, Copy, Clone, PartialEq, Eq)]
#[serde(tag = "unit_name")]
#[serde(rename_all = "snake_case")]
pub enum ProcessingUnitMetadata {
    ProbabilisticIntentParser,
    CrfSlotFiller,
    LogRegIntentClassifier,
}

impl ProcessingUnitMetadata {
    /// Reads the `metadata.json` file found in the directory of a processing unit
    pub fn from_path<P: AsRef<Path>>(unit_dir: P) -> Result<Self> {
        let metadata_path = unit_dir.as_ref().join("metadata.json");
        let metadata_file = File::open(&metadata_path)
            .with_context(|_| format!("Cannot open metadata file '{:?}'", &metadata_path))?;
        Ok(serde_json::from_reader(metadata_file).with_context(|_| {
            format!("Cannot deserialize metadata file '{:?}'", &metadata_path)
        })?)
    }
}
