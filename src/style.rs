//! Ground-truth classification and overlay transforms for run properties.
//!
//! Everything here is a pure function of a run's properties. Missing or
//! malformed properties never fail: they simply do not match.

use crate::model::{Property, RunProperties, BOLD, COLOR, HIGHLIGHT, ITALIC, UNDERLINE};
use serde::{Deserialize, Serialize};

/// Red variants accepted as ground-truth colors by default.
pub const DEFAULT_GROUND_TRUTH_COLORS: &[&str] = &[
    "FF0000", "C00000", "E00000", "EE0000", "CC0000", "D00000", "DC143C", "B22222", "FF3333",
    "E60000", "C0504D",
];

/// Predicate deciding whether a run carries the ground-truth style.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GroundTruthRule {
    /// Require the bold toggle to be on
    pub require_bold: bool,
    /// Accepted hex colors (compared case-insensitively, optional `#`)
    pub colors: Vec<String>,
}

impl Default for GroundTruthRule {
    fn default() -> Self {
        Self {
            require_bold: true,
            colors: DEFAULT_GROUND_TRUTH_COLORS
                .iter()
                .map(|c| c.to_string())
                .collect(),
        }
    }
}

impl GroundTruthRule {
    /// Evaluate the rule. Absent properties never match.
    pub fn matches(&self, properties: Option<&RunProperties>) -> bool {
        let Some(props) = properties else {
            return false;
        };
        if self.require_bold && !props.is_bold() {
            return false;
        }
        if self.colors.is_empty() {
            return true;
        }
        let Some(color) = props.color().map(normalize_hex) else {
            return false;
        };
        self.colors.iter().any(|c| normalize_hex(c) == color)
    }
}

fn normalize_hex(color: &str) -> String {
    color.trim().trim_start_matches('#').to_ascii_uppercase()
}

/// A set of forced property values.
///
/// Applying an overlay returns a copy of the input properties with the forced
/// keys set and every other key unchanged. Forcing is idempotent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Overlay {
    /// Force bold on or off
    pub bold: Option<bool>,
    /// Force italic on or off
    pub italic: Option<bool>,
    /// Force an underline style (`single`, `double`, `wave`, ...)
    pub underline: Option<String>,
    /// Force a hex text color
    pub color: Option<String>,
    /// Force a highlight color (`yellow`, `green`, ...)
    pub highlight: Option<String>,
}

impl Overlay {
    /// Overlay for runs that carried the ground-truth style: italic, double
    /// underline. Bold and color are left alone so the run still matches.
    pub fn confirmed() -> Self {
        Self {
            italic: Some(true),
            underline: Some("double".to_string()),
            ..Default::default()
        }
    }

    /// Overlay for all other runs: single underline in brown.
    pub fn unconfirmed() -> Self {
        Self {
            underline: Some("single".to_string()),
            color: Some("8B4513".to_string()),
            ..Default::default()
        }
    }

    /// Apply the overlay to `properties` (absent properties start empty).
    pub fn apply(&self, properties: Option<&RunProperties>) -> RunProperties {
        let mut props = properties.cloned().unwrap_or_default();

        if let Some(on) = self.bold {
            props.set(toggle(BOLD, on));
        }
        if let Some(on) = self.italic {
            props.set(toggle(ITALIC, on));
        }
        if let Some(underline) = &self.underline {
            props.set(Property::with_val(UNDERLINE, underline.as_str()));
        }
        if let Some(color) = &self.color {
            props.set(Property::with_val(COLOR, normalize_hex(color)));
        }
        if let Some(highlight) = &self.highlight {
            props.set(Property::with_val(HIGHLIGHT, highlight.as_str()));
        }

        props
    }
}

fn toggle(name: &str, on: bool) -> Property {
    if on {
        Property::toggle(name)
    } else {
        Property::with_val(name, "0")
    }
}

/// Ground-truth predicate plus the two overlays it selects between.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StyleClassifier {
    rule: GroundTruthRule,
    confirmed: Overlay,
    unconfirmed: Overlay,
}

impl Default for StyleClassifier {
    fn default() -> Self {
        Self::new(
            GroundTruthRule::default(),
            Overlay::confirmed(),
            Overlay::unconfirmed(),
        )
    }
}

impl StyleClassifier {
    /// Create a classifier.
    pub fn new(rule: GroundTruthRule, confirmed: Overlay, unconfirmed: Overlay) -> Self {
        Self {
            rule,
            confirmed,
            unconfirmed,
        }
    }

    /// Does a run with these properties carry the ground-truth style?
    pub fn matches_ground_truth(&self, properties: Option<&RunProperties>) -> bool {
        self.rule.matches(properties)
    }

    /// Overlay applied to ground-truth runs.
    pub fn overlay_confirmed(&self, properties: Option<&RunProperties>) -> RunProperties {
        self.confirmed.apply(properties)
    }

    /// Overlay applied to every other run.
    pub fn overlay_unconfirmed(&self, properties: Option<&RunProperties>) -> RunProperties {
        self.unconfirmed.apply(properties)
    }

    /// Pick the overlay by classification.
    pub fn choose_overlay(
        &self,
        properties: Option<&RunProperties>,
        was_ground_truth: bool,
    ) -> RunProperties {
        if was_ground_truth {
            self.overlay_confirmed(properties)
        } else {
            self.overlay_unconfirmed(properties)
        }
    }
}
