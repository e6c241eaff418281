//! Run formatting properties.
//!
//! A run's properties are kept as an ordered map from the qualified element
//! name (`w:b`, `w:color`, ...) to the parsed element. Keys that the library
//! never touches are carried through unchanged, including any nested markup.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Property key for bold.
pub const BOLD: &str = "w:b";
/// Property key for italic.
pub const ITALIC: &str = "w:i";
/// Property key for underline.
pub const UNDERLINE: &str = "w:u";
/// Property key for text color.
pub const COLOR: &str = "w:color";
/// Property key for highlight.
pub const HIGHLIGHT: &str = "w:highlight";

/// Attribute carrying the value of most run properties.
const VAL: &str = "w:val";

/// Canonical order of the children of `w:rPr`.
///
/// Word tolerates other orders, but strict consumers validate against it, so
/// newly inserted keys are placed according to this table.
const SCHEMA_ORDER: &[&str] = &[
    "w:rStyle",
    "w:rFonts",
    "w:b",
    "w:bCs",
    "w:i",
    "w:iCs",
    "w:caps",
    "w:smallCaps",
    "w:strike",
    "w:dstrike",
    "w:outline",
    "w:shadow",
    "w:emboss",
    "w:imprint",
    "w:noProof",
    "w:snapToGrid",
    "w:vanish",
    "w:webHidden",
    "w:color",
    "w:spacing",
    "w:w",
    "w:kern",
    "w:position",
    "w:sz",
    "w:szCs",
    "w:highlight",
    "w:u",
    "w:effect",
    "w:bdr",
    "w:shd",
    "w:fitText",
    "w:vertAlign",
    "w:rtl",
    "w:cs",
    "w:em",
    "w:lang",
    "w:eastAsianLayout",
    "w:specVanish",
    "w:oMath",
    "w:rPrChange",
];

fn schema_rank(name: &str) -> Option<usize> {
    SCHEMA_ORDER.iter().position(|&k| k == name)
}

/// A single formatting property element such as `<w:color w:val="FF0000"/>`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Property {
    /// Qualified element name
    pub name: String,
    /// Attributes in document order, values unescaped
    pub attributes: Vec<(String, String)>,
    /// Verbatim inner markup for properties that have children
    pub children: Option<String>,
}

impl Property {
    /// Create a property with no attributes (an "on" toggle such as `<w:b/>`).
    pub fn toggle(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: Vec::new(),
            children: None,
        }
    }

    /// Create a property with a single `w:val` attribute.
    pub fn with_val(name: impl Into<String>, val: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: vec![(VAL.to_string(), val.into())],
            children: None,
        }
    }

    /// Look up an attribute by qualified name.
    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// The `w:val` attribute, if present.
    pub fn val(&self) -> Option<&str> {
        self.attribute(VAL)
    }

    /// Interpret the property as an OOXML on/off toggle.
    ///
    /// A missing `w:val` means "on"; `0`, `false`, `off` and `none` mean "off".
    pub fn is_on(&self) -> bool {
        match self.val() {
            None => true,
            Some(v) => !matches!(
                v.trim().to_ascii_lowercase().as_str(),
                "0" | "false" | "off" | "none"
            ),
        }
    }
}

/// Ordered formatting properties of a run (the children of `w:rPr`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunProperties {
    entries: IndexMap<String, Property>,
}

impl RunProperties {
    /// Create an empty property set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a property set from properties, keeping their order.
    pub fn from_properties(properties: impl IntoIterator<Item = Property>) -> Self {
        let mut entries = IndexMap::new();
        for property in properties {
            entries.insert(property.name.clone(), property);
        }
        Self { entries }
    }

    /// Number of properties.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if no property is set.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Look up a property by qualified name.
    pub fn get(&self, name: &str) -> Option<&Property> {
        self.entries.get(name)
    }

    /// True if a property with this name is present (whatever its value).
    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Iterate properties in document order.
    pub fn iter(&self) -> impl Iterator<Item = &Property> {
        self.entries.values()
    }

    /// Set a property.
    ///
    /// An existing property with the same name is replaced in place. A new one
    /// is inserted before the first existing key that follows it in schema
    /// order, or appended when no such key exists.
    pub fn set(&mut self, property: Property) {
        if let Some(existing) = self.entries.get_mut(&property.name) {
            *existing = property;
            return;
        }

        let index = schema_rank(&property.name).and_then(|rank| {
            self.entries
                .keys()
                .position(|k| schema_rank(k).is_some_and(|r| r > rank))
        });

        match index {
            Some(index) => {
                self.entries
                    .shift_insert(index, property.name.clone(), property);
            },
            None => {
                self.entries.insert(property.name.clone(), property);
            },
        }
    }

    /// Remove a property, keeping the order of the remaining ones.
    pub fn remove(&mut self, name: &str) -> Option<Property> {
        self.entries.shift_remove(name)
    }

    /// True if the toggle property `name` is present and on.
    pub fn is_on(&self, name: &str) -> bool {
        self.get(name).is_some_and(Property::is_on)
    }

    /// Bold toggle.
    pub fn is_bold(&self) -> bool {
        self.is_on(BOLD)
    }

    /// Italic toggle.
    pub fn is_italic(&self) -> bool {
        self.is_on(ITALIC)
    }

    /// Underline style (`w:u/@w:val`), if any.
    pub fn underline(&self) -> Option<&str> {
        self.get(UNDERLINE).and_then(Property::val)
    }

    /// Text color value (`w:color/@w:val`), if any.
    pub fn color(&self) -> Option<&str> {
        self.get(COLOR).and_then(Property::val)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keys(props: &RunProperties) -> Vec<&str> {
        props.iter().map(|p| p.name.as_str()).collect()
    }

    #[test]
    fn test_toggle_semantics() {
        assert!(Property::toggle(BOLD).is_on());
        assert!(Property::with_val(BOLD, "1").is_on());
        assert!(Property::with_val(BOLD, "true").is_on());
        assert!(!Property::with_val(BOLD, "0").is_on());
        assert!(!Property::with_val(BOLD, "false").is_on());
        assert!(!Property::with_val(UNDERLINE, "none").is_on());
    }

    #[test]
    fn test_set_inserts_in_schema_order() {
        let mut props = RunProperties::new();
        props.set(Property::with_val("w:sz", "24"));
        props.set(Property::toggle(BOLD));
        props.set(Property::with_val(COLOR, "FF0000"));
        props.set(Property::with_val(UNDERLINE, "single"));
        props.set(Property::toggle(ITALIC));

        assert_eq!(keys(&props), vec!["w:b", "w:i", "w:color", "w:sz", "w:u"]);
    }

    #[test]
    fn test_set_replaces_in_place() {
        let mut props = RunProperties::from_properties(vec![
            Property::with_val(COLOR, "000000"),
            Property::with_val("w:sz", "20"),
        ]);
        props.set(Property::with_val(COLOR, "8B4513"));

        assert_eq!(keys(&props), vec!["w:color", "w:sz"]);
        assert_eq!(props.color(), Some("8B4513"));
    }

    #[test]
    fn test_unknown_keys_are_appended() {
        let mut props = RunProperties::from_properties(vec![Property::toggle(BOLD)]);
        props.set(Property::toggle("w14:glow"));
        props.set(Property::toggle(ITALIC));

        assert_eq!(keys(&props), vec!["w:b", "w:i", "w14:glow"]);
    }

    #[test]
    fn test_remove_keeps_order() {
        let mut props = RunProperties::from_properties(vec![
            Property::toggle(BOLD),
            Property::toggle(ITALIC),
            Property::with_val(COLOR, "FF0000"),
        ]);
        assert!(props.remove(ITALIC).is_some());
        assert_eq!(keys(&props), vec!["w:b", "w:color"]);
        assert!(props.remove(ITALIC).is_none());
    }

    #[test]
    fn test_accessors_on_missing_values() {
        let props = RunProperties::from_properties(vec![Property::toggle(COLOR)]);
        assert_eq!(props.color(), None);
        assert!(!props.is_bold());
        assert_eq!(props.underline(), None);
    }
}
