use std::ops::Range;

use failure::format_err;
use serde_derive::{Deserialize, Serialize};

use crate::errors::*;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct IntentParserResult {
    pub input: String,
    pub intent: IntentClassifierResult,
    pub slots: Vec<Slot>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub alternatives: Vec<IntentParserAlternative>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct IntentParserAlternative {
    pub intent: IntentClassifierResult,
    pub slots: Vec<Slot>,
}

/// An intent together with its probability. A `None` intent name is the null intent.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct IntentClassifierResult {
    pub intent_name: Option<String>,
    pub confidence_score: f32,
}

impl IntentClassifierResult {
    pub fn null_intent(confidence_score: f32) -> Self {
        Self {
            intent_name: None,
            confidence_score,
        }
    }

    pub fn is_null_intent(&self) -> bool {
        self.intent_name.is_none()
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Slot {
    pub raw_value: String,
    pub value: SlotValue,
    /// Character range of the slot in the parsed input
    pub range: Range<usize>,
    pub entity: String,
    pub slot_name: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(tag = "kind")]
pub enum SlotValue {
    Custom(StringValue),
    Number(NumberValue),
    Ordinal(OrdinalValue),
    InstantTime(InstantTimeValue),
    TimeInterval(TimeIntervalValue),
    AmountOfMoney(AmountOfMoneyValue),
    Temperature(TemperatureValue),
    Duration(DurationValue),
    Percentage(PercentageValue),
    MusicAlbum(StringValue),
    MusicArtist(StringValue),
    MusicTrack(StringValue),
}

impl SlotValue {
    pub fn kind(&self) -> &'static str {
        match self {
            SlotValue::Custom(_) => "Custom",
            SlotValue::Number(_) => "Number",
            SlotValue::Ordinal(_) => "Ordinal",
            SlotValue::InstantTime(_) => "InstantTime",
            SlotValue::TimeInterval(_) => "TimeInterval",
            SlotValue::AmountOfMoney(_) => "AmountOfMoney",
            SlotValue::Temperature(_) => "Temperature",
            SlotValue::Duration(_) => "Duration",
            SlotValue::Percentage(_) => "Percentage",
            SlotValue::MusicAlbum(_) => "MusicAlbum",
            SlotValue::MusicArtist(_) => "MusicArtist",
            SlotValue::MusicTrack(_) => "MusicTrack",
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct StringValue {
    pub value: String,
}

impl From<String> for StringValue {
    fn from(value: String) -> Self {
        Self { value }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct NumberValue {
    pub value: f64,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct OrdinalValue {
    pub value: i64,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct PercentageValue {
    pub value: f64,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct InstantTimeValue {
    pub value: String,
    pub grain: Grain,
    pub precision: Precision,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct TimeIntervalValue {
    pub from: Option<String>,
    pub to: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct AmountOfMoneyValue {
    pub value: f32,
    pub precision: Precision,
    pub unit: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct TemperatureValue {
    pub value: f32,
    pub unit: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub struct DurationValue {
    pub years: i64,
    pub quarters: i64,
    pub months: i64,
    pub weeks: i64,
    pub days: i64,
    pub hours: i64,
    pub minutes: i64,
    pub seconds: i64,
    pub precision: Precision,
}

#[derive(Serialize, Deserialize, Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Grain {
    Year,
    Quarter,
    Month,
    Week,
    Day,
    Hour,
    Minute,
    Second,
}

#[derive(Serialize, Deserialize, Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Precision {
    Approximate,
    Exact,
}

impl Default for Precision {
    fn default() -> Self {
        Precision::Exact
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum BuiltinEntityKind {
    AmountOfMoney,
    Duration,
    Number,
    Ordinal,
    Temperature,
    Datetime,
    Percentage,
    MusicAlbum,
    MusicArtist,
    MusicTrack,
}

impl BuiltinEntityKind {
    pub fn all() -> &'static [BuiltinEntityKind] {
        &[
            BuiltinEntityKind::AmountOfMoney,
            BuiltinEntityKind::Duration,
            BuiltinEntityKind::Number,
            BuiltinEntityKind::Ordinal,
            BuiltinEntityKind::Temperature,
            BuiltinEntityKind::Datetime,
            BuiltinEntityKind::Percentage,
            BuiltinEntityKind::MusicAlbum,
            BuiltinEntityKind::MusicArtist,
            BuiltinEntityKind::MusicTrack,
        ]
    }

    pub fn identifier(&self) -> &'static str {
        match self {
            BuiltinEntityKind::AmountOfMoney => "snips/amountOfMoney",
            BuiltinEntityKind::Duration => "snips/duration",
            BuiltinEntityKind::Number => "snips/number",
            BuiltinEntityKind::Ordinal => "snips/ordinal",
            BuiltinEntityKind::Temperature => "snips/temperature",
            BuiltinEntityKind::Datetime => "snips/datetime",
            BuiltinEntityKind::Percentage => "snips/percentage",
            BuiltinEntityKind::MusicAlbum => "snips/musicAlbum",
            BuiltinEntityKind::MusicArtist => "snips/musicArtist",
            BuiltinEntityKind::MusicTrack => "snips/musicTrack",
        }
    }

    pub fn from_identifier(identifier: &str) -> Result<BuiltinEntityKind> {
        BuiltinEntityKind::all()
            .iter()
            .find(|kind| kind.identifier() == identifier)
            .cloned()
            .ok_or_else(|| format_err!("Unknown builtin entity kind: '{}'", identifier))
    }

    /// Gazetteer entities are resolved from lists of values rather than from grammar rules
    pub fn is_gazetteer_entity(&self) -> bool {
        match self {
            BuiltinEntityKind::MusicAlbum
            | BuiltinEntityKind::MusicArtist
            | BuiltinEntityKind::MusicTrack => true,
            _ => false,
        }
    }

    /// Builds the slot value of a gazetteer entity from its resolved string
    pub fn gazetteer_value(&self, resolved_value: String) -> Option<SlotValue> {
        match self {
            BuiltinEntityKind::MusicAlbum => Some(SlotValue::MusicAlbum(resolved_value.into())),
            BuiltinEntityKind::MusicArtist => Some(SlotValue::MusicArtist(resolved_value.into())),
            BuiltinEntityKind::MusicTrack => Some(SlotValue::MusicTrack(resolved_value.into())),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BuiltinEntity {
    pub value: String,
    pub range: Range<usize>,
    pub entity: SlotValue,
    pub entity_kind: BuiltinEntityKind,
}
