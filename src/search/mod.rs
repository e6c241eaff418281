//! Value search over flattened document text.
//!
//! This module finds literal occurrences of detection values and validates
//! them against token boundaries. Supports:
//! - Non-overlapping, left-to-right literal search
//! - Case-insensitive search
//! - Token-boundary validation (rejects "art" inside "startup")
//! - Digits-only presence checks for phone-like values
//!
//! ## Example
//!
//! ```
//! use docx_annotator::search::{Locator, SearchOptions};
//!
//! let locator = Locator::new(SearchOptions::new().with_whole_word(true));
//! let hits = locator.find_all("Dr. Andreas König", "Andreas König").unwrap();
//! assert_eq!(hits, vec![4..17]);
//! ```

mod locator;

pub use locator::{
    has_token_boundary, is_boundary_char, is_phone_like, normalize_digits, Hit, Locator,
    SearchOptions, MAX_VALUE_LEN,
};
