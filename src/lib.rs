// Allow some clippy lints that are too pedantic for this project
#![allow(clippy::too_many_arguments)]
#![allow(clippy::should_implement_trait)]

//! # DOCX Annotator
//!
//! Restyles every occurrence of detected values (names, addresses, phone
//! numbers, ...) in a Word document without disturbing anything else.
//!
//! ## How it works
//!
//! Values are located in a single flattened view of the document text and
//! the matching character spans are mapped back to the runs that hold them:
//!
//! 1. **Flatten**: concatenate run texts into one string, with a
//!    character-to-run position map. Control markers and inserted join
//!    spaces occupy synthetic positions.
//! 2. **Locate**: find whole-token, non-overlapping occurrences of each value.
//! 3. **Splice**: split the runs covering each occurrence into
//!    before/middle/after fragments and apply an overlay to the middle one.
//!
//! Runs that already carry the ground-truth style (bold, red) receive the
//! confirmed overlay; all others receive the unconfirmed one.
//!
//! ## Example
//!
//! ```
//! use docx_annotator::model::{Document, Paragraph, Property, Run, RunProperties, BOLD, COLOR};
//! use docx_annotator::{Annotator, Detection, MatchStatus};
//!
//! let bold_red = RunProperties::from_properties(vec![
//!     Property::toggle(BOLD),
//!     Property::with_val(COLOR, "FF0000"),
//! ]);
//! let mut doc = Document::from_paragraphs(vec![Paragraph::new(vec![
//!     Run::text("Dr. Andreas König").with_properties(bold_red),
//! ])]);
//!
//! let report = Annotator::default()
//!     .annotate(&mut doc, &[Detection::new("PERSON", "Andreas König")])
//!     .unwrap();
//!
//! assert_eq!(report.detections[0].status, MatchStatus::Styled);
//! assert!(report.detections[0].ranges[0].ground_truth);
//! assert_eq!(doc.paragraphs()[0].runs.len(), 2);
//! ```

#![warn(missing_docs)]

// Error handling
pub mod error;

// Configuration
pub mod config;

// Document model
pub mod model;

// Flatten, locate, splice
pub mod flatten;
pub mod search;
pub mod splice;
pub mod style;

// Orchestration
pub mod annotate;

// DOCX packages
pub mod docx;

pub use annotate::{
    AnnotationReport, Annotator, Detection, DetectionOutcome, MatchStatus, StyledRange,
};
pub use config::AnnotatorConfig;
pub use docx::{annotate_docx, annotate_package, DocxPackage};
pub use error::{Error, Result};
pub use flatten::{FlatText, Flattener, JoinPolicy, Position};
pub use search::{Hit, Locator, SearchOptions};
pub use splice::{SpliceReport, Splicer};
pub use style::{GroundTruthRule, Overlay, StyleClassifier};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }

    #[test]
    fn test_name() {
        assert_eq!(NAME, "docx_annotator");
    }
}
