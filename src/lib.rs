mod config;
mod entity_parser;
pub mod errors;
mod intent_classifier;
mod intent_parser;
mod language;
mod models;
mod nlu_engine;
pub mod ontology;
mod preprocessing;
mod resources;
mod slot_filler;
mod slot_utils;
#[cfg(test)]
mod testutils;
mod utils;

/// Version of the trained model format supported by this engine
pub const MODEL_VERSION: &str = "0.20.0";
/// Version of this engine crate
pub const ENGINE_VERSION: &str = env!("CARGO_PKG_VERSION");

pub use crate::config::NluEngineConfig;
pub use crate::errors::*;
pub use crate::language::Language;
pub use crate::nlu_engine::SnipsNluEngine;
pub use crate::ontology::*;
