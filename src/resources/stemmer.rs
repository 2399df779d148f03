use std::collections::HashMap;
use std::io::Read;
use std::iter::FromIterator;

use crate::errors::*;

pub trait Stemmer: Send + Sync {
    fn stem(&self, value: &str) -> String;
}

/// Stems read from lines of the form `stem,inflection1,inflection2,...`
pub struct HashMapStemmer {
    values: HashMap<String, String>,
}

impl HashMapStemmer {
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let mut values = HashMap::new();
        let mut csv_reader = csv::ReaderBuilder::new()
            .delimiter(b',')
            .quoting(false)
            .flexible(true)
            .has_headers(false)
            .from_reader(reader);

        for record in csv_reader.records() {
            let elements = record?;
            let stem = &elements[0];
            for value in elements.iter().skip(1) {
                values.insert(value.to_string(), stem.to_string());
            }
        }
        Ok(Self { values })
    }
}

impl FromIterator<(String, String)> for HashMapStemmer {
    fn from_iter<T: IntoIterator<Item = (String, String)>>(iter: T) -> Self {
        Self {
            values: iter.into_iter().collect(),
        }
    }
}

impl Stemmer for HashMapStemmer {
    fn stem(&self, value: &str) -> String {
        self.values
            .get(value)
            .cloned()
            .unwrap_or_else(|| value.to_string())
    }
}
