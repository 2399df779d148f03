use std::fmt;
use std::str::FromStr;

use failure::format_err;

use crate::errors::*;

#[allow(non_camel_case_types)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Language {
    DE,
    EN,
    ES,
    FR,
    IT,
    JA,
    KO,
    PT_PT,
    PT_BR,
}

impl Language {
    pub fn all() -> &'static [Language] {
        &[
            Language::DE,
            Language::EN,
            Language::ES,
            Language::FR,
            Language::IT,
            Language::JA,
            Language::KO,
            Language::PT_PT,
            Language::PT_BR,
        ]
    }

    pub fn code(&self) -> &'static str {
        match self {
            Language::DE => "de",
            Language::EN => "en",
            Language::ES => "es",
            Language::FR => "fr",
            Language::IT => "it",
            Language::JA => "ja",
            Language::KO => "ko",
            Language::PT_PT => "pt_pt",
            Language::PT_BR => "pt_br",
        }
    }
}

impl FromStr for Language {
    type Err = failure::Error;

    fn from_str(code: &str) -> Result<Language> {
        let lowercased = code.to_lowercase().replace('-', "_");
        Language::all()
            .iter()
            .find(|language| language.code() == lowercased)
            .cloned()
            .ok_or_else(|| format_err!("Unknown language code: '{}'", code))
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}
