//! Ignore-pattern filtering of listed keys.

use regex::Regex;

use super::TRACING_TARGET;

/// Decides which listed keys make it into the resource sequence.
///
/// A non-empty pattern is compiled as a regular expression; keys it matches
/// are dropped. A pattern that fails to compile falls back to plain substring
/// containment, so `a(b` drops every key containing the literal `a(b`.
#[derive(Debug, Clone, Default)]
pub enum KeyFilter {
    /// No ignore pattern was given.
    #[default]
    AcceptAll,
    /// Drop keys matching the expression.
    Regex(Regex),
    /// Drop keys containing the literal text.
    Substring(String),
}

impl KeyFilter {
    /// Builds a filter from a user-supplied ignore pattern.
    pub fn new(pattern: &str) -> Self {
        if pattern.is_empty() {
            return Self::AcceptAll;
        }

        match Regex::new(pattern) {
            Ok(regex) => Self::Regex(regex),
            Err(err) => {
                tracing::debug!(
                    target: TRACING_TARGET,
                    pattern,
                    error = %err,
                    "Ignore pattern is not a valid regex, matching it as plain text"
                );
                Self::Substring(pattern.to_owned())
            }
        }
    }

    /// Returns whether `key` should be kept.
    pub fn accept(&self, key: &str) -> bool {
        match self {
            Self::AcceptAll => true,
            Self::Regex(regex) => !regex.is_match(key),
            Self::Substring(text) => !key.contains(text.as_str()),
        }
    }

    /// Returns the pattern this filter was built from.
    pub fn pattern(&self) -> Option<&str> {
        match self {
            Self::AcceptAll => None,
            Self::Regex(regex) => Some(regex.as_str()),
            Self::Substring(text) => Some(text),
        }
    }
}

/// Returns whether `key` survives `ignore_pattern`.
pub fn accept(key: &str, ignore_pattern: &str) -> bool {
    KeyFilter::new(ignore_pattern).accept(key)
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEYS: [&str; 5] = [
        "photos/a.jpg",
        "photos/b.png",
        "videos/clip.mp4",
        "thumbs/a.jpg",
        "",
    ];

    #[test]
    fn test_empty_pattern_accepts_everything() {
        let filter = KeyFilter::new("");
        assert!(KEYS.iter().all(|key| filter.accept(key)));
        assert!(filter.pattern().is_none());
    }

    #[test]
    fn test_regex_rejects_exactly_the_matches() {
        let pattern = r"\.jpg$";
        let regex = Regex::new(pattern).unwrap();
        let filter = KeyFilter::new(pattern);
        assert!(matches!(filter, KeyFilter::Regex(_)));

        for key in KEYS {
            assert_eq!(filter.accept(key), !regex.is_match(key), "key {key:?}");
        }
    }

    #[test]
    fn test_regex_is_unanchored() {
        assert!(!accept("photos/thumbs/a.jpg", "thumbs"));
        assert!(accept("photos/a.jpg", "^thumbs"));
    }

    #[test]
    fn test_invalid_regex_falls_back_to_substring() {
        let filter = KeyFilter::new("raw(");
        assert!(matches!(filter, KeyFilter::Substring(_)));
        assert!(!filter.accept("exports/raw(1).csv"));
        assert!(filter.accept("exports/raw.csv"));
        assert_eq!(filter.pattern(), Some("raw("));
    }
}
