use lazy_static::lazy_static;
use regex::Regex;
use unicode_normalization::UnicodeNormalization;

lazy_static! {
    static ref COMBINING_DIACRITICAL_MARKS: Regex = Regex::new("[\u{0300}-\u{036F}]+").unwrap();
}

/// Lowercases the input and strips its accents
pub fn normalize(input: &str) -> String {
    COMBINING_DIACRITICAL_MARKS
        .replace_all(&input.nfd().collect::<String>(), "")
        .to_lowercase()
}

pub fn get_shape(input: &str) -> String {
    if input.chars().all(|c| !c.is_uppercase()) {
        "xxx".to_string()
    } else if input.chars().all(|c| !c.is_lowercase()) {
        "XXX".to_string()
    } else if is_title_case(input) {
        "Xxx".to_string()
    } else {
        "xX".to_string()
    }
}

fn is_title_case(input: &str) -> bool {
    let mut chars = input.chars();
    chars
        .next()
        .map(|first| first.is_uppercase() && chars.all(|c| !c.is_uppercase()))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize() {
        assert_eq!("hello", normalize("Hëllo"));
        assert_eq!("cafe creme", normalize("Café Crème"));
        assert_eq!("3", normalize("3"));
    }

    #[test]
    fn test_get_shape() {
        assert_eq!("xxx", get_shape("hello"));
        assert_eq!("Xxx", get_shape("Hello"));
        assert_eq!("XXX", get_shape("HELLO"));
        assert_eq!("xX", get_shape("hEllo"));
        assert_eq!("xxx", get_shape("42"));
    }
}
