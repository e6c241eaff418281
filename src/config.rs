//! Configuration for document annotation.

use crate::error::{Error, Result};
use crate::flatten::JoinPolicy;
use crate::style::{GroundTruthRule, Overlay};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Annotation configuration.
///
/// Every field has a default, so a JSON configuration only needs to name the
/// values it changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnnotatorConfig {
    /// Join-space policy used by the flattener.
    pub join_policy: JoinPolicy,

    /// Reject hits that are not delimited by token boundaries.
    pub require_token_boundary: bool,

    /// Case-insensitive value matching.
    pub case_insensitive: bool,

    /// Report digits-only occurrences of phone-like values.
    pub normalized_matching: bool,

    /// Also annotate headers, footers, footnotes and endnotes.
    pub include_headers_footers: bool,

    /// Predicate selecting the confirmed overlay.
    pub ground_truth: GroundTruthRule,

    /// Overlay for runs that match the ground-truth rule.
    pub confirmed_overlay: Overlay,

    /// Overlay for all other runs.
    pub unconfirmed_overlay: Overlay,
}

impl Default for AnnotatorConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl AnnotatorConfig {
    /// Create new configuration with defaults.
    pub fn new() -> Self {
        Self {
            join_policy: JoinPolicy::default(),
            require_token_boundary: true,
            case_insensitive: false,
            normalized_matching: true,
            include_headers_footers: true,
            ground_truth: GroundTruthRule::default(),
            confirmed_overlay: Overlay::confirmed(),
            unconfirmed_overlay: Overlay::unconfirmed(),
        }
    }

    /// Parse a JSON configuration.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a JSON configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path.as_ref())?;
        Self::from_json_str(&json)
    }

    /// Check values that serde cannot.
    pub fn validate(&self) -> Result<()> {
        for color in self
            .ground_truth
            .colors
            .iter()
            .chain(self.confirmed_overlay.color.iter())
            .chain(self.unconfirmed_overlay.color.iter())
        {
            let hex = color.trim().trim_start_matches('#');
            if hex.len() != 6 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
                return Err(Error::Config(format!("'{}' is not a RRGGBB color", color)));
            }
        }
        Ok(())
    }

    /// Set the join policy.
    pub fn with_join_policy(mut self, policy: JoinPolicy) -> Self {
        self.join_policy = policy;
        self
    }

    /// Require token boundaries around hits.
    pub fn with_token_boundary(mut self, enable: bool) -> Self {
        self.require_token_boundary = enable;
        self
    }

    /// Match case-insensitively.
    pub fn with_case_insensitive(mut self, enable: bool) -> Self {
        self.case_insensitive = enable;
        self
    }

    /// Enable normalized matching for phone-like values.
    pub fn with_normalized_matching(mut self, enable: bool) -> Self {
        self.normalized_matching = enable;
        self
    }

    /// Annotate headers, footers, footnotes and endnotes too.
    pub fn with_headers_footers(mut self, enable: bool) -> Self {
        self.include_headers_footers = enable;
        self
    }

    /// Set the ground-truth rule.
    pub fn with_ground_truth(mut self, rule: GroundTruthRule) -> Self {
        self.ground_truth = rule;
        self
    }

    /// Set both overlays.
    pub fn with_overlays(mut self, confirmed: Overlay, unconfirmed: Overlay) -> Self {
        self.confirmed_overlay = confirmed;
        self.unconfirmed_overlay = unconfirmed;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AnnotatorConfig::default();
        assert_eq!(config.join_policy, JoinPolicy::AlnumBoundary);
        assert!(config.require_token_boundary);
        assert!(!config.case_insensitive);
        assert!(config.normalized_matching);
        assert!(config.include_headers_footers);
        assert_eq!(config.unconfirmed_overlay.color.as_deref(), Some("8B4513"));
    }

    #[test]
    fn test_builder() {
        let config = AnnotatorConfig::new()
            .with_join_policy(JoinPolicy::Never)
            .with_token_boundary(false)
            .with_case_insensitive(true)
            .with_normalized_matching(false)
            .with_headers_footers(false);

        assert_eq!(config.join_policy, JoinPolicy::Never);
        assert!(!config.require_token_boundary);
        assert!(config.case_insensitive);
        assert!(!config.normalized_matching);
        assert!(!config.include_headers_footers);
    }

    #[test]
    fn test_partial_json() {
        let config =
            AnnotatorConfig::from_json_str(r#"{"join_policy": "never", "case_insensitive": true}"#)
                .unwrap();
        assert_eq!(config.join_policy, JoinPolicy::Never);
        assert!(config.case_insensitive);
        assert!(config.require_token_boundary);
        assert_eq!(config.ground_truth, GroundTruthRule::default());
    }

    #[test]
    fn test_json_overlay() {
        let config = AnnotatorConfig::from_json_str(
            r#"{"unconfirmed_overlay": {"highlight": "yellow"}}"#,
        )
        .unwrap();
        assert_eq!(config.unconfirmed_overlay.highlight.as_deref(), Some("yellow"));
        assert_eq!(config.unconfirmed_overlay.color, None);
    }

    #[test]
    fn test_invalid_color_rejected() {
        let err = AnnotatorConfig::from_json_str(r#"{"ground_truth": {"colors": ["red"]}}"#)
            .unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_unknown_join_policy_rejected() {
        assert!(AnnotatorConfig::from_json_str(r#"{"join_policy": "sometimes"}"#).is_err());
    }

    #[test]
    fn test_json_roundtrip() {
        let config = AnnotatorConfig::new().with_join_policy(JoinPolicy::Always);
        let json = serde_json::to_string(&config).unwrap();
        assert_eq!(AnnotatorConfig::from_json_str(&json).unwrap(), config);
    }
}
