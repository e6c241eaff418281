//! Literal value search over flattened text.
//!
//! Matches are reported as character ranges (not byte ranges) so they index
//! the position map directly.

use crate::error::{Error, Result};
use lazy_static::lazy_static;
use regex::{Regex, RegexBuilder};
use std::ops::Range;

lazy_static! {
    /// Values made only of digits, an optional leading plus, and the usual
    /// phone-number separators.
    static ref RE_PHONE_LIKE: Regex = Regex::new(r"^\+?[0-9\s()./\-]+$").unwrap();
}

/// Minimum number of digits for a value to be searched in normalized form.
const MIN_NORMALIZED_DIGITS: usize = 5;

/// Longest value, in bytes, that is compiled into a search pattern.
pub const MAX_VALUE_LEN: usize = 64 * 1024;

/// Compiled size limit for a search pattern.
const MAX_PATTERN_SIZE: usize = 16 * (1 << 20);

/// Characters that delimit a token besides whitespace.
const BOUNDARY_PUNCTUATION: &[char] = &[
    '.', ',', ';', ':', '!', '?', '(', ')', '[', ']', '{', '}', '<', '>', '$', '"', '\'', '-',
];

/// A located occurrence of a value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Hit {
    /// Literal occurrence at a character range of the flattened text.
    Span(Range<usize>),
    /// Occurrence found only after reducing both sides to digits. Carries no
    /// span and is never styled.
    Normalized,
}

impl Hit {
    /// The character range, for literal hits.
    pub fn span(&self) -> Option<Range<usize>> {
        match self {
            Hit::Span(range) => Some(range.clone()),
            Hit::Normalized => None,
        }
    }
}

/// Options for value search.
#[derive(Debug, Clone, Default)]
pub struct SearchOptions {
    /// Case insensitive search
    pub case_insensitive: bool,
    /// Reject hits that are not delimited by token boundaries
    pub whole_word: bool,
    /// Fall back to digits-only matching for phone-like values
    pub normalized: bool,
}

impl SearchOptions {
    /// Create new default search options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set case sensitivity.
    pub fn with_case_insensitive(mut self, value: bool) -> Self {
        self.case_insensitive = value;
        self
    }

    /// Match whole tokens only.
    pub fn with_whole_word(mut self, value: bool) -> Self {
        self.whole_word = value;
        self
    }

    /// Enable the normalized fallback for phone-like values.
    pub fn with_normalized(mut self, value: bool) -> Self {
        self.normalized = value;
        self
    }
}

/// Finds occurrences of literal values in flattened text.
#[derive(Debug, Clone, Default)]
pub struct Locator {
    options: SearchOptions,
}

impl Locator {
    /// Create a locator with the given options.
    pub fn new(options: SearchOptions) -> Self {
        Self { options }
    }

    /// The options in use.
    pub fn options(&self) -> &SearchOptions {
        &self.options
    }

    /// Find all non-overlapping occurrences of `value`, left to right.
    ///
    /// Each match consumes its region before the next one is searched. With
    /// `whole_word` set, matches without a token boundary on both sides are
    /// dropped after matching. An empty value matches nothing.
    pub fn find_all(&self, text: &str, value: &str) -> Result<Vec<Range<usize>>> {
        if value.is_empty() {
            return Ok(Vec::new());
        }

        let regex = Self::build_regex(value, &self.options)?;
        let mut counter = CharCounter::new(text);
        let mut results = Vec::new();

        for mat in regex.find_iter(text) {
            if self.options.whole_word && !token_boundary_at(text, mat.start(), mat.end()) {
                log::trace!("rejecting interior match of '{}' at byte {}", value, mat.start());
                continue;
            }

            let start = counter.char_index(mat.start());
            let end = counter.char_index(mat.end());
            results.push(start..end);
        }

        Ok(results)
    }

    /// Locate `value`, falling back to normalized matching.
    ///
    /// Literal hits are returned as [`Hit::Span`]. When there are none, the
    /// normalized fallback is enabled, and the value is phone-like, a single
    /// [`Hit::Normalized`] reports that the digits occur somewhere.
    pub fn locate(&self, text: &str, value: &str) -> Result<Vec<Hit>> {
        let spans = self.find_all(text, value)?;
        if !spans.is_empty() {
            return Ok(spans.into_iter().map(Hit::Span).collect());
        }

        if self.options.normalized && is_phone_like(value) {
            let needle = normalize_digits(value);
            if normalize_digits(text).contains(&needle) {
                return Ok(vec![Hit::Normalized]);
            }
        }

        Ok(Vec::new())
    }

    /// Build a literal regex from a value and options.
    fn build_regex(value: &str, options: &SearchOptions) -> Result<Regex> {
        if value.len() > MAX_VALUE_LEN {
            return Err(Error::InvalidPattern(format!(
                "value of {} bytes exceeds the limit of {} bytes",
                value.len(),
                MAX_VALUE_LEN
            )));
        }
        RegexBuilder::new(&regex::escape(value))
            .case_insensitive(options.case_insensitive)
            .size_limit(MAX_PATTERN_SIZE)
            .build()
            .map_err(|e| Error::InvalidPattern(format!("'{}': {}", value, e)))
    }
}

/// Converts ascending byte offsets to character offsets in one pass.
struct CharCounter<'a> {
    text: &'a str,
    byte: usize,
    chars: usize,
}

impl<'a> CharCounter<'a> {
    fn new(text: &'a str) -> Self {
        Self {
            text,
            byte: 0,
            chars: 0,
        }
    }

    fn char_index(&mut self, byte: usize) -> usize {
        if byte < self.byte {
            self.byte = 0;
            self.chars = 0;
        }
        self.chars += self.text[self.byte..byte].chars().count();
        self.byte = byte;
        self.chars
    }
}

/// True if `c` delimits a token.
pub fn is_boundary_char(c: char) -> bool {
    c.is_whitespace() || BOUNDARY_PUNCTUATION.contains(&c)
}

/// True iff the characters just before `start` and at `end` are absent or
/// boundary characters. `start` and `end` are character indices.
pub fn has_token_boundary(text: &str, start: usize, end: usize) -> bool {
    let before = start.checked_sub(1).and_then(|i| text.chars().nth(i));
    let after = text.chars().nth(end);
    before.map_or(true, is_boundary_char) && after.map_or(true, is_boundary_char)
}

/// Byte-offset variant of [`has_token_boundary`].
fn token_boundary_at(text: &str, start: usize, end: usize) -> bool {
    let before = text[..start].chars().next_back();
    let after = text[end..].chars().next();
    before.map_or(true, is_boundary_char) && after.map_or(true, is_boundary_char)
}

/// True for values that look like phone or other long numbers.
pub fn is_phone_like(value: &str) -> bool {
    let value = value.trim();
    RE_PHONE_LIKE.is_match(value)
        && value.chars().filter(char::is_ascii_digit).count() >= MIN_NORMALIZED_DIGITS
}

/// Reduce text to its digits, keeping a plus sign only where it directly
/// precedes a digit.
pub fn normalize_digits(text: &str) -> String {
    let mut out = String::new();
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        if c.is_ascii_digit() {
            out.push(c);
        } else if c == '+' && chars.peek().is_some_and(char::is_ascii_digit) {
            out.push(c);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn whole_word() -> Locator {
        Locator::new(SearchOptions::new().with_whole_word(true))
    }

    #[test]
    fn test_search_options_builder() {
        let opts = SearchOptions::new()
            .with_case_insensitive(true)
            .with_whole_word(true)
            .with_normalized(true);

        assert!(opts.case_insensitive);
        assert!(opts.whole_word);
        assert!(opts.normalized);
    }

    #[test]
    fn test_find_all_non_overlapping() {
        let locator = Locator::default();
        assert_eq!(locator.find_all("aaaa", "aa").unwrap(), vec![0..2, 2..4]);
        assert_eq!(locator.find_all("aaa", "aa").unwrap(), vec![0..2]);
    }

    #[test]
    fn test_find_all_is_literal() {
        let locator = Locator::default();
        assert_eq!(locator.find_all("a.b axb", "a.b").unwrap(), vec![0..3]);
        assert!(locator.find_all("(030)", "(03").unwrap().len() == 1);
    }

    #[test]
    fn test_find_all_char_offsets() {
        let locator = Locator::default();
        let hits = locator.find_all("Dr. Andreas König, König", "König").unwrap();
        assert_eq!(hits, vec![12..17, 19..24]);
    }

    #[test]
    fn test_interior_match_rejected() {
        assert_eq!(Locator::default().find_all("startup", "art").unwrap(), vec![2..5]);
        assert!(whole_word().find_all("startup", "art").unwrap().is_empty());
        assert!(!has_token_boundary("startup", 2, 5));
    }

    #[test]
    fn test_boundary_accepts_punctuation_and_edges() {
        assert!(has_token_boundary("art", 0, 3));
        assert!(has_token_boundary("(art)", 1, 4));
        assert!(has_token_boundary("mr. art-deco", 4, 7));
        assert!(has_token_boundary("€ \"art\"", 3, 6));
        assert_eq!(whole_word().find_all("art, party art", "art").unwrap(), vec![0..3, 11..14]);
    }

    #[test]
    fn test_case_insensitive() {
        let locator = Locator::new(SearchOptions::new().with_case_insensitive(true));
        assert_eq!(locator.find_all("Hello HELLO", "hello").unwrap(), vec![0..5, 6..11]);
        assert!(Locator::default().find_all("HELLO", "hello").unwrap().is_empty());
    }

    #[test]
    fn test_every_occurrence_returned() {
        let hits = Locator::default().find_all(&"x ".repeat(500), "x").unwrap();
        assert_eq!(hits.len(), 500);
        assert_eq!(hits[499], 998..999);
    }

    #[test]
    fn test_oversized_value_rejected() {
        let value = "x".repeat(MAX_VALUE_LEN + 1);
        let err = Locator::default().find_all("xyz", &value).unwrap_err();
        assert!(matches!(err, Error::InvalidPattern(_)));
        assert!(Locator::default()
            .find_all("xyz", &"x".repeat(MAX_VALUE_LEN))
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_empty_value() {
        assert!(Locator::default().find_all("abc", "").unwrap().is_empty());
    }

    #[test]
    fn test_phone_like() {
        assert!(is_phone_like("+49 (30) 123-456"));
        assert!(is_phone_like("030/1234567"));
        assert!(!is_phone_like("1234"));
        assert!(!is_phone_like("Andreas"));
        assert!(!is_phone_like("12 34 ab"));
    }

    #[test]
    fn test_normalize_digits() {
        assert_eq!(normalize_digits("+49 (30) 123-456"), "+4930123456");
        assert_eq!(normalize_digits("Tel.: 030 / 12 34"), "0301234");
        assert_eq!(normalize_digits("a + b"), "");
    }

    #[test]
    fn test_locate_normalized_fallback() {
        let locator = Locator::new(SearchOptions::new().with_normalized(true));
        let text = "Telefon: +49 30 1234 5678";

        let literal = locator.locate(text, "+49 30 1234 5678").unwrap();
        assert_eq!(literal, vec![Hit::Span(9..25)]);

        let normalized = locator.locate(text, "+49 (30) 12345678").unwrap();
        assert_eq!(normalized, vec![Hit::Normalized]);
        assert_eq!(normalized[0].span(), None);

        assert!(locator.locate(text, "+49 30 9999 0000").unwrap().is_empty());
        assert!(Locator::default()
            .locate(text, "+49 (30) 12345678")
            .unwrap()
            .is_empty());
    }
}
