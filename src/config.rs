use chrono::{DateTime, FixedOffset, Local};

const DEFAULT_CACHE_CAPACITY: usize = 1000;

/// Engine wide settings, resolved once by the caller and handed to the constructors
#[derive(Debug, Clone, PartialEq)]
pub struct NluEngineConfig {
    /// Number of sentences kept in the builtin entity parser cache
    pub builtin_entity_cache_capacity: usize,
    /// Number of sentences kept in the custom entity parser cache
    pub custom_entity_cache_capacity: usize,
    /// Instant against which relative dates and times are resolved. When `None`, the local
    /// clock is read for every parse.
    pub reference_time: Option<DateTime<FixedOffset>>,
}

impl Default for NluEngineConfig {
    fn default() -> Self {
        Self {
            builtin_entity_cache_capacity: DEFAULT_CACHE_CAPACITY,
            custom_entity_cache_capacity: DEFAULT_CACHE_CAPACITY,
            reference_time: None,
        }
    }
}

impl NluEngineConfig {
    pub fn with_reference_time(mut self, reference_time: DateTime<FixedOffset>) -> Self {
        self.reference_time = Some(reference_time);
        self
    }

    pub fn with_cache_capacity(mut self, capacity: usize) -> Self {
        self.builtin_entity_cache_capacity = capacity;
        self.custom_entity_cache_capacity = capacity;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum ReferenceClock {
    Fixed(DateTime<FixedOffset>),
    Local,
}

impl ReferenceClock {
    pub fn from_config(config: &NluEngineConfig) -> Self {
        config
            .reference_time
            .map(ReferenceClock::Fixed)
            .unwrap_or(ReferenceClock::Local)
    }

    pub fn now(&self) -> DateTime<FixedOffset> {
        match self {
            ReferenceClock::Fixed(instant) => *instant,
            ReferenceClock::Local => {
                let now = Local::now();
                now.with_timezone(now.offset())
            }
        }
    }

    pub fn is_fixed(&self) -> bool {
        match self {
            ReferenceClock::Fixed(_) => true,
            ReferenceClock::Local => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        // When
        let config = NluEngineConfig::default();

        // Then
        assert_eq!(1000, config.builtin_entity_cache_capacity);
        assert_eq!(1000, config.custom_entity_cache_capacity);
        assert_eq!(None, config.reference_time);
    }

    #[test]
    fn test_fixed_reference_clock() {
        // Given
        let reference = DateTime::parse_from_rfc3339("2013-02-12T04:30:00+01:00").unwrap();
        let config = NluEngineConfig::default().with_reference_time(reference);

        // When
        let clock = ReferenceClock::from_config(&config);

        // Then
        assert!(clock.is_fixed());
        assert_eq!(reference, clock.now());
    }
}
