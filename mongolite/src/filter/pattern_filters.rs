use crate::collection::Document;
use crate::common::Value;
use crate::errors::{ErrorKind, MongoliteError, MongoliteResult};
use crate::filter::FilterProvider;
use regex::Regex;
use std::fmt::{Display, Formatter};

/// Regular expression filter (`$regex`).
///
/// The pattern is compiled once at construction; evaluation only matches
/// string fields, every other kind degrades to "no match".
pub(crate) struct RegexFilter {
    field: String,
    regex: Regex,
}

impl RegexFilter {
    /// Compiles the pattern with the given flag characters (`i`, `m`, `s`).
    /// An invalid pattern or unknown flag fails construction.
    pub fn new(field: String, pattern: &str, options: &str) -> MongoliteResult<Self> {
        let mut inline_flags = String::new();
        for flag in options.chars() {
            match flag {
                'i' | 'm' | 's' => inline_flags.push(flag),
                other => {
                    log::error!("Unknown regex option '{}'", other);
                    return Err(MongoliteError::new(
                        &format!("Unknown regex option '{}'", other),
                        ErrorKind::ValidationError,
                    ));
                }
            }
        }

        let full_pattern = if inline_flags.is_empty() {
            pattern.to_string()
        } else {
            format!("(?{}){}", inline_flags, pattern)
        };

        let regex = Regex::new(&full_pattern).map_err(|err| {
            log::error!("Invalid regex pattern '{}': {}", pattern, err);
            MongoliteError::new(
                &format!("Invalid regex pattern '{}': {}", pattern, err),
                ErrorKind::ValidationError,
            )
        })?;

        Ok(RegexFilter { field, regex })
    }
}

impl FilterProvider for RegexFilter {
    fn apply(&self, entry: &Document) -> MongoliteResult<bool> {
        match entry.get(&self.field) {
            Some(Value::String(text)) => Ok(self.regex.is_match(&text)),
            _ => Ok(false),
        }
    }
}

impl Display for RegexFilter {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "({} =~ /{}/)", self.field, self.regex.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::doc;

    #[test]
    fn test_matches_substring() {
        let entry = doc! { name: "Alice Doe" };
        let filter = RegexFilter::new("name".into(), "Doe$", "").unwrap();
        assert!(filter.apply(&entry).unwrap());

        let filter = RegexFilter::new("name".into(), "^Doe", "").unwrap();
        assert!(!filter.apply(&entry).unwrap());
    }

    #[test]
    fn test_case_insensitive_flag() {
        let entry = doc! { name: "ALICE" };
        let filter = RegexFilter::new("name".into(), "alice", "i").unwrap();
        assert!(filter.apply(&entry).unwrap());

        let filter = RegexFilter::new("name".into(), "alice", "").unwrap();
        assert!(!filter.apply(&entry).unwrap());
    }

    #[test]
    fn test_multiline_and_dotall_flags() {
        let entry = doc! { text: "first\nsecond" };
        let filter = RegexFilter::new("text".into(), "^second", "m").unwrap();
        assert!(filter.apply(&entry).unwrap());

        let filter = RegexFilter::new("text".into(), "first.second", "s").unwrap();
        assert!(filter.apply(&entry).unwrap());
    }

    #[test]
    fn test_non_string_field_never_matches() {
        let entry = doc! { n: 42 };
        let filter = RegexFilter::new("n".into(), "4", "").unwrap();
        assert!(!filter.apply(&entry).unwrap());
    }

    #[test]
    fn test_invalid_pattern_fails_construction() {
        let err = RegexFilter::new("f".into(), "(unclosed", "").err().unwrap();
        assert_eq!(err.kind(), &ErrorKind::ValidationError);
    }

    #[test]
    fn test_unknown_option_fails_construction() {
        let err = RegexFilter::new("f".into(), "a", "x").err().unwrap();
        assert_eq!(err.kind(), &ErrorKind::ValidationError);
    }
}
