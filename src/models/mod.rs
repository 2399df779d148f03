pub mod intent_classifier;
pub mod intent_parser;
pub mod nlu_engine;
pub mod processing_unit_metadata;
pub mod slot_filler;

pub use self::intent_classifier::*;
pub use self::intent_parser::*;
pub use self::nlu_engine::*;
pub use self::processing_unit_metadata::*;
pub use self::slot_filler::*;
