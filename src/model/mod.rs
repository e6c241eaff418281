//! In-memory document model: paragraphs of runs.
//!
//! The model is plain data. A [`Document`] owns its paragraphs; each
//! [`Paragraph`] owns an ordered vector of [`Run`]s. Markup between
//! paragraphs (section properties, table structure, ...) is kept verbatim in
//! the document layout so that serializing an unmodified document reproduces
//! it structurally.
//!
//! ```text
//! Document
//!   layout: [Markup, Paragraph, Markup, Paragraph, Paragraph, Markup]
//!   paragraphs: [P0, P1, P2]          (one per Paragraph slot, in order)
//!     P1.runs: [R0, R1, R2]
//! ```

mod properties;
mod run;

pub use properties::{Property, RunProperties, BOLD, COLOR, HIGHLIGHT, ITALIC, UNDERLINE};
pub use run::{Marker, MarkerKind, Run, RunContent, RUN_TAG};

use serde::{Deserialize, Serialize};

/// Default start tag for paragraphs built in code.
pub const PARAGRAPH_TAG: &str = "<w:p>";
/// Default end tag for paragraphs built in code.
pub const PARAGRAPH_END: &str = "</w:p>";

/// One slot of the document layout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Segment {
    /// Verbatim markup outside any paragraph
    Markup(String),
    /// The next paragraph in [`Document::paragraphs`]
    Paragraph,
}

/// A paragraph: an ordered sequence of runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Paragraph {
    /// Verbatim start tag
    pub open: String,
    /// Runs in document order
    pub runs: Vec<Run>,
    /// Markup after the last run, end tag included
    pub tail: String,
}

impl Default for Paragraph {
    fn default() -> Self {
        Self {
            open: PARAGRAPH_TAG.to_string(),
            runs: Vec::new(),
            tail: PARAGRAPH_END.to_string(),
        }
    }
}

impl Paragraph {
    /// Create a paragraph from runs.
    pub fn new(runs: Vec<Run>) -> Self {
        Self {
            runs,
            ..Default::default()
        }
    }

    /// Concatenated text of all text runs (markers excluded).
    pub fn text(&self) -> String {
        self.runs.iter().filter_map(Run::text_content).collect()
    }

    /// Replace run `index` with `fragments`, in order.
    ///
    /// Returns `false` (and leaves the paragraph untouched) when `index` is out
    /// of bounds.
    pub fn replace_run(&mut self, index: usize, fragments: Vec<Run>) -> bool {
        if index >= self.runs.len() {
            return false;
        }
        self.runs.splice(index..=index, fragments);
        true
    }
}

/// A parsed document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    layout: Vec<Segment>,
    paragraphs: Vec<Paragraph>,
}

impl Document {
    /// Create an empty document.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a document made only of `paragraphs`.
    pub fn from_paragraphs(paragraphs: Vec<Paragraph>) -> Self {
        Self {
            layout: vec![Segment::Paragraph; paragraphs.len()],
            paragraphs,
        }
    }

    /// Append verbatim markup to the layout.
    pub fn push_markup(&mut self, markup: impl Into<String>) {
        let markup = markup.into();
        if markup.is_empty() {
            return;
        }
        // Adjacent markup segments are merged.
        if let Some(Segment::Markup(last)) = self.layout.last_mut() {
            last.push_str(&markup);
        } else {
            self.layout.push(Segment::Markup(markup));
        }
    }

    /// Append a paragraph to the layout.
    pub fn push_paragraph(&mut self, paragraph: Paragraph) {
        self.layout.push(Segment::Paragraph);
        self.paragraphs.push(paragraph);
    }

    /// Layout segments in document order.
    pub fn layout(&self) -> &[Segment] {
        &self.layout
    }

    /// Paragraphs in document order.
    pub fn paragraphs(&self) -> &[Paragraph] {
        &self.paragraphs
    }

    /// Paragraph by index.
    pub fn paragraph(&self, index: usize) -> Option<&Paragraph> {
        self.paragraphs.get(index)
    }

    /// Mutable paragraph by index.
    pub fn paragraph_mut(&mut self, index: usize) -> Option<&mut Paragraph> {
        self.paragraphs.get_mut(index)
    }

    /// Run `run` of paragraph `paragraph`.
    pub fn run(&self, paragraph: usize, run: usize) -> Option<&Run> {
        self.paragraph(paragraph).and_then(|p| p.runs.get(run))
    }

    /// Number of paragraphs.
    pub fn paragraph_count(&self) -> usize {
        self.paragraphs.len()
    }

    /// Total number of runs across all paragraphs.
    pub fn run_count(&self) -> usize {
        self.paragraphs.iter().map(|p| p.runs.len()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_paragraphs_layout() {
        let doc = Document::from_paragraphs(vec![
            Paragraph::new(vec![Run::text("a")]),
            Paragraph::new(vec![Run::text("b"), Run::text("c")]),
        ]);
        assert_eq!(doc.layout(), &[Segment::Paragraph, Segment::Paragraph]);
        assert_eq!(doc.paragraph_count(), 2);
        assert_eq!(doc.run_count(), 3);
        assert_eq!(doc.run(1, 1).and_then(Run::text_content), Some("c"));
        assert!(doc.run(2, 0).is_none());
    }

    #[test]
    fn test_push_markup_merges() {
        let mut doc = Document::new();
        doc.push_markup("<w:body>");
        doc.push_markup("");
        doc.push_markup("<w:tbl>");
        doc.push_paragraph(Paragraph::default());
        doc.push_markup("</w:tbl>");

        assert_eq!(
            doc.layout(),
            &[
                Segment::Markup("<w:body><w:tbl>".to_string()),
                Segment::Paragraph,
                Segment::Markup("</w:tbl>".to_string()),
            ]
        );
    }

    #[test]
    fn test_replace_run() {
        let mut para = Paragraph::new(vec![Run::text("ab"), Run::text("c")]);
        assert!(para.replace_run(0, vec![Run::text("a"), Run::text("b")]));
        assert_eq!(para.runs.len(), 3);
        assert_eq!(para.text(), "abc");
        assert!(!para.replace_run(5, vec![]));
    }

    #[test]
    fn test_paragraph_text_skips_markers() {
        let para = Paragraph::new(vec![
            Run::text("a"),
            Run::markers([MarkerKind::Tab]),
            Run::text("b"),
        ]);
        assert_eq!(para.text(), "ab");
    }
}
