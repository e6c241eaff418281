//! Runs: the atomic styleable unit of a paragraph.

use super::properties::RunProperties;
use serde::{Deserialize, Serialize};

/// Default start tag for runs built in code.
pub const RUN_TAG: &str = "<w:r>";

/// Kind of an inline control marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MarkerKind {
    /// `<w:tab/>`
    Tab,
    /// `<w:br/>` (line, column or page break)
    Break,
    /// `<w:cr/>`
    CarriageReturn,
}

impl MarkerKind {
    /// Markup emitted for a marker built in code.
    pub fn default_xml(self) -> &'static str {
        match self {
            MarkerKind::Tab => "<w:tab/>",
            MarkerKind::Break => "<w:br/>",
            MarkerKind::CarriageReturn => "<w:cr/>",
        }
    }
}

/// An inline control marker together with its verbatim markup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Marker {
    /// What the marker represents
    pub kind: MarkerKind,
    /// Verbatim markup, attributes included (e.g. `<w:br w:type="page"/>`)
    pub xml: String,
}

impl Marker {
    /// Create a marker with default markup.
    pub fn new(kind: MarkerKind) -> Self {
        Self {
            kind,
            xml: kind.default_xml().to_string(),
        }
    }
}

/// Payload of a run.
///
/// A run carries either text or control markers, never both. `Text("")` and
/// `Empty` are distinct: the first serializes an empty text element, the
/// second none at all.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunContent {
    /// Text payload
    Text(String),
    /// One or more control markers
    Markers(Vec<Marker>),
    /// No payload (only opaque children, if any)
    Empty,
}

/// A run with its formatting, payload and opaque children.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Run {
    /// Verbatim start tag of the run element
    pub tag: String,
    /// Paragraph-level markup that precedes this run (hyperlink starts,
    /// bookmarks, paragraph properties, ...)
    pub leading: String,
    /// Formatting properties; `None` when the run has no `w:rPr`
    pub properties: Option<RunProperties>,
    /// Opaque children emitted between the properties and the payload
    pub opaque: Vec<String>,
    /// Text or markers
    pub content: RunContent,
    /// True if this run continues the previous run without a boundary of its
    /// own (a split fragment, or a later segment of one markup run)
    pub continuation: bool,
}

impl Default for Run {
    fn default() -> Self {
        Self {
            tag: RUN_TAG.to_string(),
            leading: String::new(),
            properties: None,
            opaque: Vec::new(),
            content: RunContent::Empty,
            continuation: false,
        }
    }
}

impl Run {
    /// A text run without properties.
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            content: RunContent::Text(text.into()),
            ..Default::default()
        }
    }

    /// A control-marker run.
    pub fn markers(kinds: impl IntoIterator<Item = MarkerKind>) -> Self {
        Self {
            content: RunContent::Markers(kinds.into_iter().map(Marker::new).collect()),
            ..Default::default()
        }
    }

    /// Set the properties.
    pub fn with_properties(mut self, properties: RunProperties) -> Self {
        self.properties = Some(properties);
        self
    }

    /// Text payload, if this is a text-bearing run.
    pub fn text_content(&self) -> Option<&str> {
        match &self.content {
            RunContent::Text(text) => Some(text),
            _ => None,
        }
    }

    /// Control markers (empty for text runs).
    pub fn marker_list(&self) -> &[Marker] {
        match &self.content {
            RunContent::Markers(markers) => markers,
            _ => &[],
        }
    }

    /// Number of characters of text (0 for non-text runs).
    pub fn char_len(&self) -> usize {
        self.text_content().map_or(0, |t| t.chars().count())
    }

    /// A fragment of this run carrying `text` and `properties`.
    ///
    /// The first fragment of a split takes over the leading markup, the opaque
    /// children and the continuation flag; later fragments start clean and are
    /// marked as continuations.
    pub fn fragment(&self, text: String, properties: Option<RunProperties>, first: bool) -> Self {
        Self {
            tag: self.tag.clone(),
            leading: if first {
                self.leading.clone()
            } else {
                String::new()
            },
            properties,
            opaque: if first { self.opaque.clone() } else { Vec::new() },
            content: RunContent::Text(text),
            continuation: if first { self.continuation } else { true },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_run() {
        let run = Run::text("Grüße");
        assert_eq!(run.text_content(), Some("Grüße"));
        assert_eq!(run.char_len(), 5);
        assert!(run.marker_list().is_empty());
        assert_eq!(run.tag, RUN_TAG);
    }

    #[test]
    fn test_marker_run() {
        let run = Run::markers([MarkerKind::Tab, MarkerKind::Break]);
        assert_eq!(run.text_content(), None);
        assert_eq!(run.char_len(), 0);
        assert_eq!(run.marker_list().len(), 2);
        assert_eq!(run.marker_list()[1].xml, "<w:br/>");
    }

    #[test]
    fn test_empty_text_is_not_absent_text() {
        assert_eq!(Run::text("").text_content(), Some(""));
        assert_eq!(Run::default().text_content(), None);
    }

    #[test]
    fn test_fragment_ownership() {
        let mut run = Run::text("abc");
        run.leading = "<w:bookmarkStart w:id=\"0\"/>".to_string();
        run.opaque.push("<w:lastRenderedPageBreak/>".to_string());

        let first = run.fragment("a".to_string(), None, true);
        let second = run.fragment("bc".to_string(), None, false);

        assert_eq!(first.leading, run.leading);
        assert_eq!(first.opaque, run.opaque);
        assert!(!first.continuation);
        assert!(second.leading.is_empty());
        assert!(second.opaque.is_empty());
        assert!(second.continuation);
    }
}
