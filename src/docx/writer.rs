//! [`Document`] back to WordprocessingML markup.
//!
//! Layout markup, paragraph framing and opaque run children are written
//! verbatim. Run properties and text are re-emitted from the model; text
//! always carries `xml:space="preserve"` so split fragments keep their edge
//! whitespace.

use crate::model::{Document, Paragraph, Property, Run, RunContent, RunProperties, Segment};
use quick_xml::escape::escape;

/// Serialize a document part.
pub fn write_document(doc: &Document) -> String {
    let mut out = String::new();
    let mut paragraphs = doc.paragraphs().iter();

    for segment in doc.layout() {
        match segment {
            Segment::Markup(xml) => out.push_str(xml),
            Segment::Paragraph => {
                if let Some(paragraph) = paragraphs.next() {
                    write_paragraph(&mut out, paragraph);
                }
            },
        }
    }

    out
}

fn write_paragraph(out: &mut String, paragraph: &Paragraph) {
    out.push_str(&paragraph.open);
    for run in &paragraph.runs {
        write_run(out, run);
    }
    out.push_str(&paragraph.tail);
}

/// Serialize one run, preceded by its leading paragraph markup.
pub fn write_run(out: &mut String, run: &Run) {
    out.push_str(&run.leading);
    out.push_str(&run.tag);

    if let Some(properties) = &run.properties {
        write_properties(out, properties);
    }
    for xml in &run.opaque {
        out.push_str(xml);
    }

    match &run.content {
        RunContent::Text(text) => {
            out.push_str(r#"<w:t xml:space="preserve">"#);
            out.push_str(&escape(text.as_str()));
            out.push_str("</w:t>");
        },
        RunContent::Markers(markers) => {
            for marker in markers {
                out.push_str(&marker.xml);
            }
        },
        RunContent::Empty => {},
    }

    out.push_str("</w:r>");
}

fn write_properties(out: &mut String, properties: &RunProperties) {
    if properties.is_empty() {
        out.push_str("<w:rPr/>");
        return;
    }
    out.push_str("<w:rPr>");
    for property in properties.iter() {
        write_property(out, property);
    }
    out.push_str("</w:rPr>");
}

fn write_property(out: &mut String, property: &Property) {
    out.push('<');
    out.push_str(&property.name);
    for (key, value) in &property.attributes {
        out.push(' ');
        out.push_str(key);
        out.push_str("=\"");
        out.push_str(&escape(value.as_str()));
        out.push('"');
    }
    match &property.children {
        Some(children) => {
            out.push('>');
            out.push_str(children);
            out.push_str("</");
            out.push_str(&property.name);
            out.push('>');
        },
        None => out.push_str("/>"),
    }
}
