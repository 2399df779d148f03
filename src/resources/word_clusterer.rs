use std::collections::HashMap;
use std::io::Read;
use std::iter::FromIterator;

use crate::errors::*;

pub trait WordClusterer: Send + Sync {
    fn get_cluster(&self, word: &str) -> Option<String>;
}

/// Clusters read from tab separated `word<TAB>cluster` lines
pub struct HashMapWordClusterer {
    values: HashMap<String, String>,
}

impl HashMapWordClusterer {
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .delimiter(b'\t')
            .quoting(false)
            .flexible(true)
            .has_headers(false)
            .from_reader(reader);
        let mut values = HashMap::new();
        for record in csv_reader.records() {
            let elements = record?;
            if elements.len() < 2 {
                continue;
            }
            values.insert(elements[0].to_string(), elements[1].to_string());
        }
        Ok(Self { values })
    }
}

impl FromIterator<(String, String)> for HashMapWordClusterer {
    fn from_iter<T: IntoIterator<Item = (String, String)>>(iter: T) -> Self {
        Self {
            values: iter.into_iter().collect(),
        }
    }
}

impl WordClusterer for HashMapWordClusterer {
    fn get_cluster(&self, word: &str) -> Option<String> {
        self.values.get(word).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hashmap_word_clusterer() {
        // Given
        let clusters: &[u8] = r#"
coffee	0110
tea	0110
hot chocolate	0111
two	1010"#
            .as_ref();

        // When
        let clusterer = HashMapWordClusterer::from_reader(clusters);

        // Then
        assert!(clusterer.is_ok());
        let clusterer = clusterer.unwrap();
        assert_eq!(Some("0110".to_string()), clusterer.get_cluster("tea"));
        assert_eq!(Some("0111".to_string()), clusterer.get_cluster("hot chocolate"));
        assert_eq!(None, clusterer.get_cluster("water"));
    }
}
