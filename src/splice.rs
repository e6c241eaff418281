//! Restyling of an absolute character range.
//!
//! The splicer walks a range of the flattened text. Every run touched by a
//! real character is split into up to three fragments (before, middle,
//! after); only the middle fragment receives the overlay. After each split
//! the position map of that paragraph is re-derived, so the next lookup in
//! the same paragraph sees the new run indices.
//!
//! ```text
//! range:          [-------)
//! text:      D r . ␠ A n d r e a s
//! run 0:     "Dr. Andreas"
//! after:     run 0 "Dr. "   run 1 "Andreas" (overlay)
//! ```
//!
//! Synthetic positions inside the range are skipped: they are never styled
//! and never cause a split. A range that starts or ends on a synthetic
//! position is not trimmed.

use crate::error::{Error, Result};
use crate::flatten::{FlatText, Position};
use crate::model::{Document, Run, RunProperties};
use crate::style::StyleClassifier;
use serde::{Deserialize, Serialize};
use std::ops::Range;

/// Outcome of one [`Splicer::apply_style`] call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpliceReport {
    /// Number of runs whose middle fragment received an overlay
    pub styled_runs: usize,
    /// How many of those runs carried the ground-truth style
    pub ground_truth_runs: usize,
    /// Absolute positions that could not be resolved to a run and were
    /// skipped
    pub skipped: Vec<usize>,
}

impl SpliceReport {
    /// True if every real character in the range belonged to a ground-truth
    /// run (and there was at least one).
    pub fn all_ground_truth(&self) -> bool {
        self.styled_runs > 0 && self.ground_truth_runs == self.styled_runs
    }
}

/// Splits and restyles runs covered by a range.
#[derive(Debug, Clone, Copy)]
pub struct Splicer<'a> {
    classifier: &'a StyleClassifier,
}

impl<'a> Splicer<'a> {
    /// Create a splicer classifying runs with `classifier`.
    pub fn new(classifier: &'a StyleClassifier) -> Self {
        Self { classifier }
    }

    /// Apply `choose_overlay` to every run covering a real character of
    /// `range`.
    ///
    /// `choose_overlay` receives the original properties of the run and
    /// whether they matched the ground-truth style, and returns the properties
    /// of the middle fragment. Characters outside the range keep their
    /// properties and text.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidRange`] unless `range.start < range.end <= flat.len()`.
    /// Unresolvable positions are not errors; they are listed in
    /// [`SpliceReport::skipped`].
    pub fn apply_style<F>(
        &self,
        doc: &mut Document,
        flat: &mut FlatText,
        range: Range<usize>,
        mut choose_overlay: F,
    ) -> Result<SpliceReport>
    where
        F: FnMut(Option<&RunProperties>, bool) -> RunProperties,
    {
        let len = flat.len();
        if range.start >= range.end || range.end > len {
            return Err(Error::InvalidRange {
                start: range.start,
                end: range.end,
                len,
            });
        }

        let mut report = SpliceReport::default();
        let mut i = range.start;

        while i < range.end {
            let (paragraph, run_index, offset) = match flat.position(i) {
                Some(Position::Real {
                    paragraph,
                    run,
                    offset,
                }) => (paragraph, run, offset),
                Some(Position::Synthetic { .. }) => {
                    i += 1;
                    continue;
                },
                None => {
                    log::warn!("no position map entry for character {}", i);
                    report.skipped.push(i);
                    i += 1;
                    continue;
                },
            };

            let Some((fragments, take, was_ground_truth)) =
                self.split_run(doc, paragraph, run_index, offset, range.end - i, &mut choose_overlay)
            else {
                log::warn!(
                    "character {} maps to missing run {}:{} offset {}; skipping",
                    i,
                    paragraph,
                    run_index,
                    offset
                );
                report.skipped.push(i);
                i += 1;
                continue;
            };

            if let Some(para) = doc.paragraph_mut(paragraph) {
                para.replace_run(run_index, fragments);
            }
            flat.refresh_paragraph(doc, paragraph);

            report.styled_runs += 1;
            if was_ground_truth {
                report.ground_truth_runs += 1;
            }
            i += take;
        }

        Ok(report)
    }

    /// Build the replacement fragments for one run.
    ///
    /// Returns `None` when the run or offset does not exist. Otherwise returns
    /// the fragments, the number of characters of the range they cover, and
    /// the classification of the original run.
    fn split_run<F>(
        &self,
        doc: &Document,
        paragraph: usize,
        run_index: usize,
        offset: usize,
        remaining: usize,
        choose_overlay: &mut F,
    ) -> Option<(Vec<Run>, usize, bool)>
    where
        F: FnMut(Option<&RunProperties>, bool) -> RunProperties,
    {
        let run = doc.run(paragraph, run_index)?;
        let text = run.text_content()?;
        let char_len = text.chars().count();
        if offset >= char_len {
            return None;
        }

        let take = (char_len - offset).min(remaining);
        let was_ground_truth = self.classifier.matches_ground_truth(run.properties.as_ref());

        let before: String = text.chars().take(offset).collect();
        let middle: String = text.chars().skip(offset).take(take).collect();
        let after: String = text.chars().skip(offset + take).collect();

        let mut fragments = Vec::with_capacity(3);
        if !before.is_empty() {
            fragments.push(run.fragment(before, run.properties.clone(), true));
        }
        let styled = choose_overlay(run.properties.as_ref(), was_ground_truth);
        let first = fragments.is_empty();
        fragments.push(run.fragment(middle, Some(styled), first));
        if !after.is_empty() {
            fragments.push(run.fragment(after, run.properties.clone(), false));
        }

        Some((fragments, take, was_ground_truth))
    }
}
