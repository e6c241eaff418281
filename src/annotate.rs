//! Detection-driven annotation of a document.
//!
//! For every detection the annotator locates the value in the current
//! flattened text and restyles each occurrence through the [`Splicer`]. The
//! flattened text and its position map are carried from one detection to the
//! next, so later detections see the runs split by earlier ones. A value that
//! does not occur leaves the document untouched and is reported as
//! [`MatchStatus::NotFound`].

use crate::config::AnnotatorConfig;
use crate::error::Result;
use crate::flatten::{FlatText, Flattener};
use crate::model::Document;
use crate::search::{Hit, Locator, SearchOptions};
use crate::splice::Splicer;
use crate::style::StyleClassifier;
use serde::{Deserialize, Serialize};

/// A value to find, with the detector's type label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Detection {
    /// Detector type label (e.g. `name`, `phone`); not interpreted
    #[serde(rename = "type", default)]
    pub kind: String,
    /// Literal text to find
    pub value: String,
}

impl Detection {
    /// Create a detection.
    pub fn new(kind: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            value: value.into(),
        }
    }
}

/// What happened to one detection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchStatus {
    /// At least one literal occurrence was restyled
    Styled,
    /// Only a digits-only occurrence exists; nothing was restyled
    NormalizedOnly,
    /// The value does not occur
    NotFound,
    /// The value was empty and skipped
    Empty,
}

impl MatchStatus {
    fn rank(self) -> u8 {
        match self {
            MatchStatus::Empty => 0,
            MatchStatus::NotFound => 1,
            MatchStatus::NormalizedOnly => 2,
            MatchStatus::Styled => 3,
        }
    }
}

/// One restyled occurrence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StyledRange {
    /// Document part the range belongs to, when annotating a package
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub part: Option<String>,
    /// Start character index in the flattened text
    pub start: usize,
    /// End character index (exclusive)
    pub end: usize,
    /// Every styled run in the range carried the ground-truth style
    pub ground_truth: bool,
    /// Number of runs that received an overlay
    pub runs_styled: usize,
    /// Positions that could not be resolved and were skipped
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub skipped: Vec<usize>,
}

/// Result for one detection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetectionOutcome {
    /// Detector type label
    #[serde(rename = "type")]
    pub kind: String,
    /// The searched value
    pub value: String,
    /// Overall status
    pub status: MatchStatus,
    /// Restyled occurrences in document order
    pub ranges: Vec<StyledRange>,
}

impl DetectionOutcome {
    fn new(detection: &Detection, status: MatchStatus) -> Self {
        Self {
            kind: detection.kind.clone(),
            value: detection.value.clone(),
            status,
            ranges: Vec::new(),
        }
    }

    /// Positions skipped while styling any range of this detection.
    pub fn skipped_positions(&self) -> impl Iterator<Item = usize> + '_ {
        self.ranges.iter().flat_map(|r| r.skipped.iter().copied())
    }
}

/// Per-detection results, in input order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnnotationReport {
    /// One outcome per input detection
    pub detections: Vec<DetectionOutcome>,
}

impl AnnotationReport {
    /// Outcomes whose value was not found anywhere.
    pub fn not_found(&self) -> impl Iterator<Item = &DetectionOutcome> {
        self.detections
            .iter()
            .filter(|d| d.status == MatchStatus::NotFound)
    }

    /// Total number of restyled ranges.
    pub fn styled_ranges(&self) -> usize {
        self.detections.iter().map(|d| d.ranges.len()).sum()
    }

    /// Label every range with the part it came from.
    pub fn with_part(mut self, part: &str) -> Self {
        for range in self.detections.iter_mut().flat_map(|d| d.ranges.iter_mut()) {
            range.part = Some(part.to_string());
        }
        self
    }

    /// Fold the report of another part over the same detections into this one.
    ///
    /// Statuses combine to the strongest one (styled over normalized-only over
    /// not-found); ranges are appended.
    pub fn merge(&mut self, other: AnnotationReport) {
        if self.detections.is_empty() {
            *self = other;
            return;
        }
        for (mine, theirs) in self.detections.iter_mut().zip(other.detections) {
            if theirs.status.rank() > mine.status.rank() {
                mine.status = theirs.status;
            }
            mine.ranges.extend(theirs.ranges);
        }
    }
}

/// Applies detections to documents.
#[derive(Debug, Clone)]
pub struct Annotator {
    config: AnnotatorConfig,
    flattener: Flattener,
    locator: Locator,
    classifier: StyleClassifier,
}

impl Default for Annotator {
    fn default() -> Self {
        Self::new(AnnotatorConfig::default())
    }
}

impl Annotator {
    /// Create an annotator from configuration.
    pub fn new(config: AnnotatorConfig) -> Self {
        let locator = Locator::new(
            SearchOptions::new()
                .with_case_insensitive(config.case_insensitive)
                .with_whole_word(config.require_token_boundary)
                .with_normalized(config.normalized_matching),
        );
        let classifier = StyleClassifier::new(
            config.ground_truth.clone(),
            config.confirmed_overlay.clone(),
            config.unconfirmed_overlay.clone(),
        );
        Self {
            flattener: Flattener::new(config.join_policy),
            locator,
            classifier,
            config,
        }
    }

    /// The configuration in use.
    pub fn config(&self) -> &AnnotatorConfig {
        &self.config
    }

    /// The classifier in use.
    pub fn classifier(&self) -> &StyleClassifier {
        &self.classifier
    }

    /// Flatten a document with the configured join policy.
    pub fn flatten(&self, doc: &Document) -> FlatText {
        self.flattener.flatten(doc)
    }

    /// Apply `detections` to `doc` in order.
    pub fn annotate(&self, doc: &mut Document, detections: &[Detection]) -> Result<AnnotationReport> {
        let mut flat = self.flatten(doc);
        log::debug!(
            "annotating {} paragraphs ({} chars) with {} detections",
            doc.paragraph_count(),
            flat.len(),
            detections.len()
        );

        let mut report = AnnotationReport::default();
        for detection in detections {
            let outcome = self.annotate_one(doc, &mut flat, detection)?;
            report.detections.push(outcome);
        }
        Ok(report)
    }

    /// Apply one detection against the current flattened view.
    ///
    /// Occurrences are restyled back to front. A value that cannot be searched
    /// is logged and reported as [`MatchStatus::NotFound`].
    pub fn annotate_one(
        &self,
        doc: &mut Document,
        flat: &mut FlatText,
        detection: &Detection,
    ) -> Result<DetectionOutcome> {
        if detection.value.trim().is_empty() {
            return Ok(DetectionOutcome::new(detection, MatchStatus::Empty));
        }

        let hits = match self.locator.locate(flat.text(), &detection.value) {
            Ok(hits) => hits,
            Err(e) => {
                log::warn!(
                    "{} '{}': search failed: {}",
                    detection.kind,
                    detection.value,
                    e
                );
                return Ok(DetectionOutcome::new(detection, MatchStatus::NotFound));
            },
        };
        let spans: Vec<_> = hits.iter().filter_map(Hit::span).collect();

        if spans.is_empty() {
            let status = if hits.contains(&Hit::Normalized) {
                MatchStatus::NormalizedOnly
            } else {
                MatchStatus::NotFound
            };
            log::info!("{} '{}': {:?}", detection.kind, detection.value, status);
            return Ok(DetectionOutcome::new(detection, status));
        }

        let splicer = Splicer::new(&self.classifier);
        let mut outcome = DetectionOutcome::new(detection, MatchStatus::Styled);

        for span in spans.into_iter().rev() {
            let report = splicer.apply_style(doc, flat, span.clone(), |props, ground_truth| {
                self.classifier.choose_overlay(props, ground_truth)
            })?;
            outcome.ranges.push(StyledRange {
                part: None,
                start: span.start,
                end: span.end,
                ground_truth: report.all_ground_truth(),
                runs_styled: report.styled_runs,
                skipped: report.skipped,
            });
        }
        outcome.ranges.reverse();

        log::info!(
            "{} '{}': styled {} occurrence(s)",
            detection.kind,
            detection.value,
            outcome.ranges.len()
        );
        Ok(outcome)
    }
}
