pub mod builtin_entity_parser;
mod builtin_grammar;
pub mod custom_entity_parser;
mod gazetteer_parser;
mod utils;

pub use self::builtin_entity_parser::{BuiltinEntityParser, CachingBuiltinEntityParser};
pub use self::custom_entity_parser::{
    CachingCustomEntityParser, CustomEntity, CustomEntityParser,
};
pub use self::gazetteer_parser::{GazetteerEntityMatch, GazetteerParser};
