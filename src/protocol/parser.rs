//! Delimited-text response parser.
//!
//! Turns `key:value,key:[a,b,c]` style responses into a [`ParsedResponse`].
//!
//! # Parse Steps
//!
//! 1. Blank input yields an empty result.
//! 2. Any case-insensitive occurrence of `error` fails with [`Error::Remote`].
//! 3. CR/LF characters are removed and the text is trimmed.
//! 4. The text is split on the pair separator, ignoring separators inside
//!    `[` … `]`.
//! 5. Each segment is split once on the key/value separator; segments without
//!    a separator or with a blank key are skipped.
//! 6. Bracketed values become arrays (elements always split on `,`), anything
//!    else is stored as a trimmed scalar.

// ============================================================================
// Imports
// ============================================================================

use crate::error::{Error, Result};

use super::response::{Field, ParsedResponse};

// ============================================================================
// Constants
// ============================================================================

/// Default separator between `key:value` pairs.
pub const DEFAULT_PAIR_SEPARATOR: &str = ",";

/// Default separator between a key and its value.
pub const DEFAULT_KEY_VALUE_SEPARATOR: &str = ":";

/// Substring that marks an inline failure report from the remote service.
const ERROR_SENTINEL: &str = "error";

/// Separator used between array elements, independent of the pair separator.
const ARRAY_ELEMENT_SEPARATOR: char = ',';

// ============================================================================
// Separators
// ============================================================================

/// Pair and key/value separators used when parsing a response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Separators {
    pair: String,
    key_value: String,
}

impl Default for Separators {
    fn default() -> Self {
        Self {
            pair: DEFAULT_PAIR_SEPARATOR.to_string(),
            key_value: DEFAULT_KEY_VALUE_SEPARATOR.to_string(),
        }
    }
}

impl Separators {
    /// Creates a separator set.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] if either separator is empty.
    pub fn new(pair: impl Into<String>, key_value: impl Into<String>) -> Result<Self> {
        let pair = pair.into();
        let key_value = key_value.into();

        if pair.is_empty() {
            return Err(Error::invalid_argument("pair separator must not be empty"));
        }
        if key_value.is_empty() {
            return Err(Error::invalid_argument(
                "key/value separator must not be empty",
            ));
        }

        Ok(Self { pair, key_value })
    }

    /// Returns the pair separator.
    #[inline]
    #[must_use]
    pub fn pair(&self) -> &str {
        &self.pair
    }

    /// Returns the key/value separator.
    #[inline]
    #[must_use]
    pub fn key_value(&self) -> &str {
        &self.key_value
    }
}

// ============================================================================
// Parsing
// ============================================================================

/// Parses a raw response into a [`ParsedResponse`].
///
/// # Errors
///
/// Returns [`Error::Remote`] if the response contains the error sentinel.
pub fn parse_response(raw: &str, separators: &Separators) -> Result<ParsedResponse> {
    let mut response = ParsedResponse::empty(raw);

    if raw.trim().is_empty() {
        return Ok(response);
    }

    if raw.to_lowercase().contains(ERROR_SENTINEL) {
        return Err(Error::remote(raw));
    }

    let cleaned = raw.replace(['\r', '\n'], "");

    for segment in split_top_level(cleaned.trim(), separators.pair()) {
        if segment.trim().is_empty() {
            continue;
        }

        let Some((key, value)) = segment.split_once(separators.key_value()) else {
            continue;
        };

        let key = key.trim();
        if key.is_empty() {
            continue;
        }

        response.insert(key, parse_value(value.trim()));
    }

    Ok(response)
}

/// Classifies a trimmed value as a scalar or a bracketed array.
fn parse_value(value: &str) -> Field {
    let Some(inner) = value
        .strip_prefix('[')
        .and_then(|rest| rest.strip_suffix(']'))
    else {
        return Field::Scalar(value.to_string());
    };

    if inner.trim().is_empty() {
        return Field::Array(Vec::new());
    }

    Field::Array(
        inner
            .split(ARRAY_ELEMENT_SEPARATOR)
            .map(|element| element.trim().to_string())
            .collect(),
    )
}

/// Splits on `separator` outside of bracketed sections.
///
/// Only nesting depth is tracked. Unbalanced brackets are tolerated: a stray
/// `]` drives the depth negative and splitting continues as at top level.
pub(crate) fn split_top_level<'a>(input: &'a str, separator: &str) -> Vec<&'a str> {
    let mut segments = Vec::new();
    let mut depth: i32 = 0;
    let mut start = 0;
    let mut idx = 0;

    while idx < input.len() {
        let rest = &input[idx..];

        if depth <= 0 && !separator.is_empty() && rest.starts_with(separator) {
            segments.push(&input[start..idx]);
            idx += separator.len();
            start = idx;
            continue;
        }

        let Some(ch) = rest.chars().next() else {
            break;
        };
        match ch {
            '[' => depth += 1,
            ']' => depth -= 1,
            _ => {}
        }
        idx += ch.len_utf8();
    }

    segments.push(&input[start..]);
    segments
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_respects_brackets() {
        let segments = split_top_level("A:[1,2,3],B:hi", ",");
        assert_eq!(segments, vec!["A:[1,2,3]", "B:hi"]);
    }

    #[test]
    fn test_split_multichar_separator() {
        let segments = split_top_level("A:1;;B:[x;;y];;C:3", ";;");
        assert_eq!(segments, vec!["A:1", "B:[x;;y]", "C:3"]);
    }

    #[test]
    fn test_split_nested_brackets() {
        let segments = split_top_level("A:[[1,2],[3]],B:4", ",");
        assert_eq!(segments, vec!["A:[[1,2],[3]]", "B:4"]);
    }

    #[test]
    fn test_split_tolerates_stray_closing_bracket() {
        let segments = split_top_level("A:1],B:2,C:3", ",");
        assert_eq!(segments, vec!["A:1]", "B:2", "C:3"]);
    }

    #[test]
    fn test_split_unclosed_bracket_swallows_rest() {
        let segments = split_top_level("A:[1,2,B:3", ",");
        assert_eq!(segments, vec!["A:[1,2,B:3"]);
    }

    #[test]
    fn test_parse_value_scalar() {
        assert_eq!(parse_value("hello"), Field::Scalar("hello".to_string()));
        assert_eq!(parse_value("[oops"), Field::Scalar("[oops".to_string()));
    }

    #[test]
    fn test_parse_value_arrays() {
        assert_eq!(parse_value("[]"), Field::Array(Vec::new()));
        assert_eq!(parse_value("[   ]"), Field::Array(Vec::new()));
        assert_eq!(
            parse_value("[ a , b ,c ]"),
            Field::Array(vec!["a".into(), "b".into(), "c".into()])
        );
    }

    #[test]
    fn test_separators_validation() {
        assert!(Separators::new("", ":").is_err());
        assert!(Separators::new(",", "").is_err());

        let seps = Separators::new(";", "=").expect("valid separators");
        assert_eq!(seps.pair(), ";");
        assert_eq!(seps.key_value(), "=");
    }

    #[test]
    fn test_error_sentinel_is_case_insensitive() {
        let err = parse_response("Status:ERROR", &Separators::default()).unwrap_err();
        assert!(matches!(err, Error::Remote { .. }));

        let err = parse_response("status error", &Separators::default()).unwrap_err();
        assert!(err.is_remote_error());
    }

    #[test]
    fn test_error_sentinel_ignores_separators() {
        let seps = Separators::new(";", "=").expect("valid separators");

        let err = parse_response("a=ERR_x;b=error", &seps).unwrap_err();
        assert!(matches!(err, Error::Remote { ref response } if response == "a=ERR_x;b=error"));

        let err = parse_response("code=0;msg=[Error,timeout]", &seps).unwrap_err();
        assert!(err.is_remote_error());
    }

    #[test]
    fn test_blank_input_is_empty() {
        let response = parse_response("  \r\n ", &Separators::default()).expect("parse");
        assert!(response.is_empty());
        assert_eq!(response.raw(), "  \r\n ");
    }

    #[test]
    fn test_skips_malformed_segments() {
        let response =
            parse_response("noseparator, :orphan ,A:1,,", &Separators::default()).expect("parse");
        assert_eq!(response.keys(), vec!["A"]);
    }

    #[test]
    fn test_value_keeps_later_separators() {
        let response = parse_response("time:12:30:45", &Separators::default()).expect("parse");
        assert_eq!(response.get_string("time").unwrap(), "12:30:45");
    }

    #[test]
    fn test_crlf_removed_before_split() {
        let response = parse_response("A:1,\r\nB:2\r\n", &Separators::default()).expect("parse");
        assert_eq!(response.get_int("A").unwrap(), 1);
        assert_eq!(response.get_int("B").unwrap(), 2);
    }

    #[test]
    fn test_custom_separators_arrays_still_use_comma() {
        let seps = Separators::new(";", "=").expect("valid separators");
        let response = parse_response("pts=[1,2];name=cam", &seps).expect("parse");
        assert_eq!(response.get_int_array("pts").unwrap(), vec![1, 2]);
        assert_eq!(response.get_string("name").unwrap(), "cam");
    }
}
