//! Flattened text view of a document with a per-character position map.
//!
//! The flattener walks paragraphs and runs in order and produces one string
//! plus, for every character of it, a [`Position`] pointing back into the
//! document. Characters copied from run text are [`Position::Real`];
//! separators generated for control markers and run joins are
//! [`Position::Synthetic`].
//!
//! The map is stored as one slice per paragraph. Splitting a run only touches
//! its own paragraph, so [`FlatText::refresh_paragraph`] rebuilds that slice
//! and leaves the rest of the map alone.
//!
//! ```text
//! runs:      "Dr."  <tab>  "König"
//! text:      D r .  ␠      K ö n i g
//! positions: R R R  S      R R R R R
//! ```

use crate::error::Error;
use crate::model::{Document, Paragraph, RunContent};
use serde::{Deserialize, Serialize};
use std::ops::Range;
use std::str::FromStr;

/// Where a character of the flattened text comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Position {
    /// Character `offset` (in chars) of the text of run `run` in paragraph
    /// `paragraph`.
    Real {
        /// Paragraph index
        paragraph: usize,
        /// Run index within the paragraph
        run: usize,
        /// Character offset within the run text
        offset: usize,
    },
    /// Generated separator attributed to a run but not backed by its text.
    Synthetic {
        /// Paragraph index
        paragraph: usize,
        /// Run index within the paragraph
        run: usize,
    },
}

impl Position {
    /// Paragraph index.
    pub fn paragraph(&self) -> usize {
        match *self {
            Position::Real { paragraph, .. } | Position::Synthetic { paragraph, .. } => paragraph,
        }
    }

    /// Run index within the paragraph.
    pub fn run(&self) -> usize {
        match *self {
            Position::Real { run, .. } | Position::Synthetic { run, .. } => run,
        }
    }

    /// True for positions backed by run text.
    pub fn is_real(&self) -> bool {
        matches!(self, Position::Real { .. })
    }
}

/// When to insert a join space between two adjacent text runs.
///
/// A join is only ever considered before a run that starts a new markup run;
/// fragments produced by splitting never get one, so restyling a range never
/// changes the flattened text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JoinPolicy {
    /// Plain concatenation.
    Never,
    /// A space between every pair of non-empty text runs.
    Always,
    /// A space only where a letter or digit is followed by a run starting
    /// with neither whitespace nor punctuation.
    #[default]
    AlnumBoundary,
}

impl JoinPolicy {
    /// Whether a join space goes between `last` (end of the accumulated text)
    /// and `first` (start of the next run).
    pub fn joins(self, last: char, first: char) -> bool {
        match self {
            JoinPolicy::Never => false,
            JoinPolicy::Always => true,
            JoinPolicy::AlnumBoundary => {
                last.is_alphanumeric() && !first.is_whitespace() && !is_punctuation(first)
            },
        }
    }
}

impl FromStr for JoinPolicy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "never" | "none" => Ok(JoinPolicy::Never),
            "always" => Ok(JoinPolicy::Always),
            "alnum" | "alnum_boundary" | "alnum-boundary" => Ok(JoinPolicy::AlnumBoundary),
            other => Err(Error::Config(format!("unknown join policy '{}'", other))),
        }
    }
}

fn is_punctuation(c: char) -> bool {
    c.is_ascii_punctuation()
        || matches!(
            c,
            '\u{2010}'..='\u{2027}' | '\u{2030}'..='\u{205E}' | '«' | '»' | '¿' | '¡' | '§'
        )
}

/// Produces [`FlatText`] views of documents.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Flattener {
    policy: JoinPolicy,
}

impl Flattener {
    /// Create a flattener using `policy` for run joins.
    pub fn new(policy: JoinPolicy) -> Self {
        Self { policy }
    }

    /// The join policy in use.
    pub fn policy(&self) -> JoinPolicy {
        self.policy
    }

    /// Flatten a whole document.
    ///
    /// Paragraphs are concatenated without a separator, and no join space is
    /// ever inserted across a paragraph boundary.
    pub fn flatten(&self, doc: &Document) -> FlatText {
        let mut text = String::new();
        let mut slices = Vec::with_capacity(doc.paragraph_count());
        let mut char_start = 0;

        for (index, paragraph) in doc.paragraphs().iter().enumerate() {
            let (para_text, entries) = self.flatten_paragraph(index, paragraph);
            let char_len = entries.len();
            slices.push(ParagraphSlice {
                char_start,
                byte_start: text.len(),
                byte_len: para_text.len(),
                entries,
            });
            char_start += char_len;
            text.push_str(&para_text);
        }

        FlatText {
            flattener: *self,
            text,
            slices,
        }
    }

    /// Flatten one paragraph.
    ///
    /// Join decisions only see text accumulated inside this paragraph, so the
    /// first text run never gets a join space.
    pub fn flatten_paragraph(
        &self,
        index: usize,
        paragraph: &Paragraph,
    ) -> (String, Vec<Position>) {
        let mut text = String::new();
        let mut entries = Vec::new();
        let mut last: Option<char> = None;

        for (r, run) in paragraph.runs.iter().enumerate() {
            match &run.content {
                RunContent::Markers(markers) => {
                    for _ in markers {
                        text.push(' ');
                        entries.push(Position::Synthetic {
                            paragraph: index,
                            run: r,
                        });
                        last = Some(' ');
                    }
                },
                RunContent::Text(run_text) => {
                    let Some(first) = run_text.chars().next() else {
                        continue;
                    };
                    if let Some(prev) = last {
                        if !run.continuation && self.policy.joins(prev, first) {
                            text.push(' ');
                            entries.push(Position::Synthetic {
                                paragraph: index,
                                run: r,
                            });
                        }
                    }
                    for (offset, c) in run_text.chars().enumerate() {
                        text.push(c);
                        entries.push(Position::Real {
                            paragraph: index,
                            run: r,
                            offset,
                        });
                    }
                    last = run_text.chars().next_back();
                },
                RunContent::Empty => {},
            }
        }

        (text, entries)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct ParagraphSlice {
    char_start: usize,
    byte_start: usize,
    byte_len: usize,
    entries: Vec<Position>,
}

impl ParagraphSlice {
    fn char_end(&self) -> usize {
        self.char_start + self.entries.len()
    }
}

/// Flattened text of a document and its position map.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlatText {
    flattener: Flattener,
    text: String,
    slices: Vec<ParagraphSlice>,
}

impl FlatText {
    /// The flattened text.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Length in characters (equal to the length of the position map).
    pub fn len(&self) -> usize {
        self.slices.last().map_or(0, ParagraphSlice::char_end)
    }

    /// True if the document has no flattened content.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The flattener that produced this view.
    pub fn flattener(&self) -> Flattener {
        self.flattener
    }

    /// Position of character `index`.
    pub fn position(&self, index: usize) -> Option<Position> {
        let slice_index = self.slices.partition_point(|s| s.char_end() <= index);
        let slice = self.slices.get(slice_index)?;
        slice.entries.get(index.checked_sub(slice.char_start)?).copied()
    }

    /// Iterate the whole position map in order.
    pub fn positions(&self) -> impl Iterator<Item = Position> + '_ {
        self.slices.iter().flat_map(|s| s.entries.iter().copied())
    }

    /// The whole position map as a vector.
    pub fn position_map(&self) -> Vec<Position> {
        self.positions().collect()
    }

    /// Character range occupied by paragraph `paragraph`.
    pub fn paragraph_range(&self, paragraph: usize) -> Option<Range<usize>> {
        self.slices
            .get(paragraph)
            .map(|s| s.char_start..s.char_end())
    }

    /// Text of the character range `range`.
    pub fn slice(&self, range: Range<usize>) -> String {
        self.text
            .chars()
            .skip(range.start)
            .take(range.end.saturating_sub(range.start))
            .collect()
    }

    /// Re-derive the map entries of one paragraph after its runs changed.
    ///
    /// Only that paragraph's slice is rebuilt. If the paragraph's text changed
    /// as well (which splitting never does), the whole view is rebuilt so the
    /// offsets of later paragraphs stay correct. Returns `false` if the
    /// paragraph does not exist.
    pub fn refresh_paragraph(&mut self, doc: &Document, paragraph: usize) -> bool {
        let (Some(para), Some(slice)) = (doc.paragraph(paragraph), self.slices.get(paragraph))
        else {
            return false;
        };

        let (text, entries) = self.flattener.flatten_paragraph(paragraph, para);

        let old = &self.text[slice.byte_start..slice.byte_start + slice.byte_len];
        if old == text {
            self.slices[paragraph].entries = entries;
        } else {
            log::debug!(
                "paragraph {} text changed while refreshing; rebuilding flattened view",
                paragraph
            );
            *self = self.flattener.flatten(doc);
        }
        true
    }
}
