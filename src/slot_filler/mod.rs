#[macro_use]
mod macros;
mod crf;
pub mod crf_slot_filler;
mod crf_utils;
mod feature_processor;
mod features;
mod features_utils;

use std::path::Path;
use std::sync::Arc;

use failure::bail;

use crate::errors::*;
use crate::models::ProcessingUnitMetadata;
use crate::preprocessing::Token;
use crate::resources::SharedResources;
use crate::slot_utils::InternalSlot;

pub use self::crf_slot_filler::*;
pub use self::crf_utils::TaggingScheme;

pub trait SlotFiller: Send + Sync {
    fn get_tagging_scheme(&self) -> TaggingScheme;
    fn get_slots(&self, text: &str) -> Result<Vec<InternalSlot>>;
    fn get_sequence_probability(&self, tokens: &[Token], tags: Vec<String>) -> Result<f64>;
}

pub fn build_slot_filler<P: AsRef<Path>>(
    path: P,
    shared_resources: Arc<SharedResources>,
) -> Result<Box<dyn SlotFiller>> {
    let metadata = ProcessingUnitMetadata::from_path(&path)?;
    match metadata {
        ProcessingUnitMetadata::CrfSlotFiller => Ok(Box::new(CRFSlotFiller::from_path(
            path,
            shared_resources,
        )?) as _),
        _ => bail!("{:?} is not a slot filler", metadata),
    }
}
