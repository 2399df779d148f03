use std::collections::HashSet;
use std::io::{BufRead, BufReader, Read};
use std::iter::FromIterator;

use crate::errors::*;

pub trait Gazetteer: Send + Sync {
    fn contains(&self, value: &str) -> bool;
}

pub struct HashSetGazetteer {
    values: HashSet<String>,
}

impl HashSetGazetteer {
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let reader = BufReader::new(reader);
        let mut values = HashSet::new();
        for line in reader.lines() {
            let word = line?;
            let word = word.trim();
            if !word.is_empty() {
                values.insert(word.to_string());
            }
        }
        Ok(Self { values })
    }
}

impl FromIterator<String> for HashSetGazetteer {
    fn from_iter<T: IntoIterator<Item = String>>(iter: T) -> Self {
        Self {
            values: iter.into_iter().collect(),
        }
    }
}

impl Gazetteer for HashSetGazetteer {
    fn contains(&self, value: &str) -> bool {
        self.values.contains(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hashset_gazetteer() {
        // Given
        let gazetteer: &[u8] = r#"
coffee
tea
hot chocolate
"#
        .as_ref();

        // When
        let gazetteer = HashSetGazetteer::from_reader(gazetteer);

        // Then
        assert!(gazetteer.is_ok());
        let gazetteer = gazetteer.unwrap();
        assert!(gazetteer.contains("coffee"));
        assert!(gazetteer.contains("hot chocolate"));
        assert!(!gazetteer.contains("water"));
        assert!(!gazetteer.contains(""));
    }
}
