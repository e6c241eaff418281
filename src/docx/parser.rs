//! WordprocessingML markup to [`Document`].
//!
//! Paragraphs (`w:p`) are recognised anywhere outside a run, which covers
//! body text, tables and content controls. Inside a paragraph every `w:r` is
//! parsed into the model, including runs nested in hyperlinks, field-simple
//! wrappers or revision marks; the surrounding markup is kept verbatim as the
//! run's leading markup or the paragraph tail.
//!
//! Within a run, `w:rPr` becomes the properties, `w:t` the text, and
//! `w:tab`/`w:br`/`w:cr` control markers. Any other child is opaque. A markup
//! run that mixes text with markers, or has opaque children after its
//! payload, is segmented into consecutive model runs that share its
//! properties.

use crate::error::{Error, Result};
use crate::model::{
    Document, Marker, MarkerKind, Paragraph, Property, Run, RunContent, RunProperties,
};
use quick_xml::events::{BytesStart, Event};
use quick_xml::{Reader, Writer};

const PARAGRAPH: &[u8] = b"w:p";
const RUN: &[u8] = b"w:r";
const RUN_PROPERTIES: &[u8] = b"w:rPr";
const TEXT: &[u8] = b"w:t";

/// Parse a WordprocessingML part (`word/document.xml`, a header, ...).
pub fn parse_document(xml: &str) -> Result<Document> {
    let mut reader = Reader::from_str(xml);
    let mut doc = Document::new();
    let mut markup = MarkupBuffer::new();

    loop {
        match reader.read_event()? {
            Event::Start(e) if e.name().as_ref() == PARAGRAPH => {
                doc.push_markup(markup.take()?);
                let paragraph = parse_paragraph(&mut reader, &e)?;
                doc.push_paragraph(paragraph);
            },
            Event::Eof => break,
            event => markup.write(event)?,
        }
    }
    doc.push_markup(markup.take()?);

    log::debug!(
        "parsed {} paragraphs with {} runs",
        doc.paragraph_count(),
        doc.run_count()
    );
    Ok(doc)
}

/// Parse a paragraph whose start tag has just been read.
fn parse_paragraph(reader: &mut Reader<&[u8]>, start: &BytesStart) -> Result<Paragraph> {
    let open = event_to_string(Event::Start(start.borrow()))?;
    let mut runs = Vec::new();
    let mut markup = MarkupBuffer::new();
    let mut depth = 0usize;

    loop {
        match reader.read_event()? {
            Event::Start(e) if e.name().as_ref() == RUN => {
                let leading = markup.take()?;
                runs.extend(parse_run(reader, &e, leading)?);
            },
            Event::Start(e) => {
                depth += 1;
                markup.write(Event::Start(e))?;
            },
            Event::End(e) => {
                markup.write(Event::End(e))?;
                if depth == 0 {
                    break;
                }
                depth -= 1;
            },
            Event::Eof => {
                return Err(Error::Xml(
                    "unexpected end of markup inside a paragraph".to_string(),
                ))
            },
            event => markup.write(event)?,
        }
    }

    Ok(Paragraph {
        open,
        runs,
        tail: markup.take()?,
    })
}

/// Parse a run whose start tag has just been read.
fn parse_run(reader: &mut Reader<&[u8]>, start: &BytesStart, leading: String) -> Result<Vec<Run>> {
    let mut segments = RunSegments::new(event_to_string(Event::Start(start.borrow()))?, leading);
    let mut properties = None;

    loop {
        match reader.read_event()? {
            Event::Start(e) => {
                let name = e.name();
                if name.as_ref() == RUN_PROPERTIES {
                    properties = Some(parse_properties(reader)?);
                } else if name.as_ref() == TEXT {
                    segments.push_text(read_text(reader)?);
                } else {
                    let kind = marker_kind(name.as_ref());
                    let xml = capture_element(reader, &e)?;
                    match kind {
                        Some(kind) => segments.push_marker(Marker { kind, xml }),
                        None => segments.push_opaque(xml),
                    }
                }
            },
            Event::Empty(e) => {
                let name = e.name();
                if name.as_ref() == RUN_PROPERTIES {
                    properties = Some(RunProperties::new());
                } else if name.as_ref() == TEXT {
                    segments.push_text(String::new());
                } else {
                    let kind = marker_kind(name.as_ref());
                    let xml = event_to_string(Event::Empty(e.borrow()))?;
                    match kind {
                        Some(kind) => segments.push_marker(Marker { kind, xml }),
                        None => segments.push_opaque(xml),
                    }
                }
            },
            Event::End(_) => break,
            // whitespace between run children is not content
            Event::Text(_) => {},
            Event::Eof => {
                return Err(Error::Xml("unexpected end of markup inside a run".to_string()))
            },
            event => segments.push_opaque(event_to_string(event)?),
        }
    }

    Ok(segments.finish(properties))
}

/// Accumulates the model runs produced by one markup run.
struct RunSegments {
    tag: String,
    done: Vec<Run>,
    current: Run,
}

impl RunSegments {
    fn new(tag: String, leading: String) -> Self {
        Self {
            current: Run {
                tag: tag.clone(),
                leading,
                ..Default::default()
            },
            tag,
            done: Vec::new(),
        }
    }

    /// Close the current segment and start a continuation.
    fn flush(&mut self) {
        let next = Run {
            tag: self.tag.clone(),
            continuation: true,
            ..Default::default()
        };
        self.done.push(std::mem::replace(&mut self.current, next));
    }

    fn push_text(&mut self, text: String) {
        match &mut self.current.content {
            RunContent::Text(existing) => existing.push_str(&text),
            RunContent::Empty => self.current.content = RunContent::Text(text),
            RunContent::Markers(_) => {
                self.flush();
                self.current.content = RunContent::Text(text);
            },
        }
    }

    fn push_marker(&mut self, marker: Marker) {
        match &mut self.current.content {
            RunContent::Markers(markers) => markers.push(marker),
            RunContent::Empty => self.current.content = RunContent::Markers(vec![marker]),
            RunContent::Text(_) => {
                self.flush();
                self.current.content = RunContent::Markers(vec![marker]);
            },
        }
    }

    fn push_opaque(&mut self, xml: String) {
        if self.current.content != RunContent::Empty {
            self.flush();
        }
        self.current.opaque.push(xml);
    }

    fn finish(mut self, properties: Option<RunProperties>) -> Vec<Run> {
        self.done.push(self.current);
        for run in &mut self.done {
            run.properties = properties.clone();
        }
        self.done
    }
}

fn marker_kind(name: &[u8]) -> Option<MarkerKind> {
    match name {
        b"w:tab" => Some(MarkerKind::Tab),
        b"w:br" => Some(MarkerKind::Break),
        b"w:cr" => Some(MarkerKind::CarriageReturn),
        _ => None,
    }
}

/// Parse the children of `w:rPr` up to its end tag.
fn parse_properties(reader: &mut Reader<&[u8]>) -> Result<RunProperties> {
    let mut properties = Vec::new();

    loop {
        match reader.read_event()? {
            Event::Empty(e) => properties.push(property_from(&e)?),
            Event::Start(e) => {
                let mut property = property_from(&e)?;
                property.children = Some(capture_inner(reader)?);
                properties.push(property);
            },
            Event::End(_) => break,
            Event::Eof => {
                return Err(Error::Xml(
                    "unexpected end of markup inside run properties".to_string(),
                ))
            },
            _ => {},
        }
    }

    Ok(RunProperties::from_properties(properties))
}

fn property_from(e: &BytesStart) -> Result<Property> {
    let mut attributes = Vec::new();
    for attr in e.attributes() {
        let attr = attr.map_err(|err| Error::Xml(format!("bad attribute: {}", err)))?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let value = attr.unescape_value()?.into_owned();
        attributes.push((key, value));
    }
    Ok(Property {
        name: String::from_utf8_lossy(e.name().as_ref()).into_owned(),
        attributes,
        children: None,
    })
}

/// Read the unescaped text of a `w:t` element up to its end tag.
fn read_text(reader: &mut Reader<&[u8]>) -> Result<String> {
    let mut text = String::new();
    loop {
        match reader.read_event()? {
            Event::Text(t) => text.push_str(&t.unescape()?),
            Event::CData(c) => text.push_str(&String::from_utf8_lossy(&c)),
            Event::Start(e) => {
                capture_element(reader, &e)?;
            },
            Event::End(_) => break,
            Event::Eof => {
                return Err(Error::Xml("unexpected end of markup inside text".to_string()))
            },
            _ => {},
        }
    }
    Ok(text)
}

/// Serialize an element whose start tag has just been read, with its subtree.
fn capture_element(reader: &mut Reader<&[u8]>, start: &BytesStart) -> Result<String> {
    let mut buffer = MarkupBuffer::new();
    buffer.write(Event::Start(start.borrow()))?;
    buffer.append(&capture_inner(reader)?);
    let end = start.to_end().into_owned();
    buffer.write(Event::End(end))?;
    buffer.take()
}

/// Serialize everything up to (not including) the end tag of the element
/// whose start tag has just been read. The end tag is consumed.
fn capture_inner(reader: &mut Reader<&[u8]>) -> Result<String> {
    let mut buffer = MarkupBuffer::new();
    let mut depth = 0usize;
    loop {
        let event = reader.read_event()?;
        match &event {
            Event::Start(_) => depth += 1,
            Event::End(_) if depth == 0 => break,
            Event::End(_) => depth -= 1,
            Event::Eof => {
                return Err(Error::Xml(
                    "unexpected end of markup inside an element".to_string(),
                ))
            },
            _ => {},
        }
        buffer.write(event)?;
    }
    buffer.take()
}

fn event_to_string(event: Event<'_>) -> Result<String> {
    let mut buffer = MarkupBuffer::new();
    buffer.write(event)?;
    buffer.take()
}

/// Re-serializes events verbatim into a string.
struct MarkupBuffer {
    writer: Writer<Vec<u8>>,
}

impl MarkupBuffer {
    fn new() -> Self {
        Self {
            writer: Writer::new(Vec::new()),
        }
    }

    fn write(&mut self, event: Event<'_>) -> Result<()> {
        self.writer
            .write_event(event)
            .map_err(|e| Error::Xml(e.to_string()))
    }

    fn append(&mut self, raw: &str) {
        self.writer.get_mut().extend_from_slice(raw.as_bytes());
    }

    fn take(&mut self) -> Result<String> {
        let bytes = std::mem::take(self.writer.get_mut());
        String::from_utf8(bytes).map_err(|e| Error::Xml(e.to_string()))
    }
}
