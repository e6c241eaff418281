//! DOCX packages.
//!
//! A `.docx` file is a ZIP archive of Open XML parts. The main content is in
//! `word/document.xml`; headers, footers, footnotes and endnotes live in
//! sibling parts with the same paragraph and run markup. Only parts that were
//! actually restyled are rewritten; every other entry is copied through
//! unchanged.

pub mod parser;
pub mod writer;

pub use parser::parse_document;
pub use writer::write_document;

use crate::annotate::{AnnotationReport, Annotator, Detection};
use crate::config::AnnotatorConfig;
use crate::error::{Error, Result};
use crate::model::Document;
use indexmap::IndexMap;
use std::io::{Cursor, Read, Write};
use std::path::Path;
use zip::result::ZipError;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

/// Name of the primary document part.
pub const DOCUMENT_PART: &str = "word/document.xml";

const SECONDARY_PREFIXES: &[&str] = &["word/header", "word/footer"];
const SECONDARY_PARTS: &[&str] = &["word/footnotes.xml", "word/endnotes.xml"];

/// An opened DOCX archive with pending part replacements.
#[derive(Debug, Clone)]
pub struct DocxPackage {
    bytes: Vec<u8>,
    names: Vec<String>,
    replaced: IndexMap<String, String>,
}

impl DocxPackage {
    /// Open a package from archive bytes.
    ///
    /// # Errors
    ///
    /// [`Error::Archive`] if the bytes are not a ZIP archive and
    /// [`Error::MissingPart`] if it has no `word/document.xml`.
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self> {
        let mut archive = ZipArchive::new(Cursor::new(bytes.as_slice()))?;
        let mut names = Vec::with_capacity(archive.len());
        for i in 0..archive.len() {
            names.push(archive.by_index_raw(i)?.name().to_string());
        }
        if !names.iter().any(|n| n == DOCUMENT_PART) {
            return Err(Error::MissingPart(DOCUMENT_PART.to_string()));
        }

        log::debug!("opened package with {} entries", names.len());
        Ok(Self {
            bytes,
            names,
            replaced: IndexMap::new(),
        })
    }

    /// Open a package from a file.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::from_bytes(std::fs::read(path.as_ref())?)
    }

    /// Entry names in archive order.
    pub fn part_names(&self) -> &[String] {
        &self.names
    }

    /// Parts carrying annotatable text, the main document first.
    pub fn text_parts(&self, include_headers_footers: bool) -> Vec<String> {
        let mut parts = vec![DOCUMENT_PART.to_string()];
        if !include_headers_footers {
            return parts;
        }

        let mut secondary: Vec<String> = self
            .names
            .iter()
            .filter(|name| is_secondary_part(name))
            .cloned()
            .collect();
        secondary.sort();
        parts.extend(secondary);
        parts
    }

    /// Read a part as text, seeing earlier replacements.
    pub fn read_part(&self, name: &str) -> Result<String> {
        if let Some(xml) = self.replaced.get(name) {
            return Ok(xml.clone());
        }

        let mut archive = ZipArchive::new(Cursor::new(self.bytes.as_slice()))?;
        let mut file = match archive.by_name(name) {
            Ok(file) => file,
            Err(ZipError::FileNotFound) => return Err(Error::MissingPart(name.to_string())),
            Err(e) => return Err(e.into()),
        };
        let mut content = String::new();
        file.read_to_string(&mut content)?;
        Ok(content)
    }

    /// Replace (or add) a part.
    pub fn set_part(&mut self, name: impl Into<String>, xml: String) {
        self.replaced.insert(name.into(), xml);
    }

    /// Read and parse a part.
    pub fn read_document(&self, name: &str) -> Result<Document> {
        parse_document(&self.read_part(name)?)
    }

    /// Serialize a document into a part.
    pub fn write_document(&mut self, name: &str, doc: &Document) {
        self.set_part(name, write_document(doc));
    }

    /// Names of parts that will be rewritten on save.
    pub fn modified_parts(&self) -> impl Iterator<Item = &str> {
        self.replaced.keys().map(String::as_str)
    }

    /// Build the output archive.
    ///
    /// Unmodified entries are copied raw, so their compressed bytes are
    /// untouched. Replaced parts keep their position in the archive.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut archive = ZipArchive::new(Cursor::new(self.bytes.as_slice()))?;
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

        for i in 0..archive.len() {
            let file = archive.by_index_raw(i)?;
            match self.replaced.get(file.name()) {
                Some(xml) => {
                    writer.start_file(file.name().to_string(), options)?;
                    writer.write_all(xml.as_bytes())?;
                },
                None => writer.raw_copy_file(file)?,
            }
        }
        for (name, xml) in &self.replaced {
            if !self.names.contains(name) {
                writer.start_file(name.clone(), options)?;
                writer.write_all(xml.as_bytes())?;
            }
        }

        Ok(writer.finish()?.into_inner())
    }

    /// Write the output archive to a file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        std::fs::write(path.as_ref(), self.to_bytes()?)?;
        Ok(())
    }
}

fn is_secondary_part(name: &str) -> bool {
    if SECONDARY_PARTS.contains(&name) {
        return true;
    }
    SECONDARY_PREFIXES.iter().any(|prefix| {
        name.strip_prefix(prefix)
            .and_then(|rest| rest.strip_suffix(".xml"))
            .is_some_and(|n| n.chars().all(|c| c.is_ascii_digit()))
    })
}

/// Annotate every text part of `package` and record the rewritten parts.
///
/// The main document must parse. A secondary part that fails to parse is
/// left untouched and logged.
pub fn annotate_package(
    package: &mut DocxPackage,
    annotator: &Annotator,
    detections: &[Detection],
) -> Result<AnnotationReport> {
    let mut report = AnnotationReport::default();

    for part in package.text_parts(annotator.config().include_headers_footers) {
        let mut doc = match package.read_document(&part) {
            Ok(doc) => doc,
            Err(e) if part != DOCUMENT_PART => {
                log::warn!("skipping part {}: {}", part, e);
                continue;
            },
            Err(e) => return Err(e),
        };

        let part_report = annotator.annotate(&mut doc, detections)?.with_part(&part);
        if part_report.styled_ranges() > 0 {
            log::info!("{}: {} ranges restyled", part, part_report.styled_ranges());
            package.write_document(&part, &doc);
        }
        report.merge(part_report);
    }

    Ok(report)
}

/// Annotate DOCX bytes, returning the new archive and the report.
pub fn annotate_docx(
    bytes: Vec<u8>,
    detections: &[Detection],
    config: &AnnotatorConfig,
) -> Result<(Vec<u8>, AnnotationReport)> {
    let mut package = DocxPackage::from_bytes(bytes)?;
    let annotator = Annotator::new(config.clone());
    let report = annotate_package(&mut package, &annotator, detections)?;
    Ok((package.to_bytes()?, report))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotate::MatchStatus;

    fn build(entries: &[(&str, &str)]) -> Vec<u8> {
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        let options = SimpleFileOptions::default();
        for (name, content) in entries {
            writer.start_file(name.to_string(), options).unwrap();
            writer.write_all(content.as_bytes()).unwrap();
        }
        writer.finish().unwrap().into_inner()
    }

    fn paragraph_xml(text: &str) -> String {
        format!(
            r#"<w:document><w:body><w:p><w:r><w:rPr><w:b/><w:color w:val="FF0000"/></w:rPr><w:t>{}</w:t></w:r></w:p></w:body></w:document>"#,
            text
        )
    }

    #[test]
    fn test_secondary_part_names() {
        assert!(is_secondary_part("word/header1.xml"));
        assert!(is_secondary_part("word/footer.xml"));
        assert!(is_secondary_part("word/footnotes.xml"));
        assert!(!is_secondary_part("word/footerX.xml"));
        assert!(!is_secondary_part("word/_rels/header1.xml.rels"));
        assert!(!is_secondary_part("word/styles.xml"));
    }

    #[test]
    fn test_missing_document_part() {
        let bytes = build(&[("word/styles.xml", "<w:styles/>")]);
        let err = DocxPackage::from_bytes(bytes).unwrap_err();
        assert!(matches!(err, Error::MissingPart(_)));
    }

    #[test]
    fn test_not_an_archive() {
        let err = DocxPackage::from_bytes(b"plain text".to_vec()).unwrap_err();
        assert!(matches!(err, Error::Archive(_)));
    }

    #[test]
    fn test_text_parts_order() {
        let doc = paragraph_xml("x");
        let bytes = build(&[
            ("[Content_Types].xml", "<Types/>"),
            ("word/footer1.xml", doc.as_str()),
            (DOCUMENT_PART, doc.as_str()),
            ("word/header1.xml", doc.as_str()),
        ]);
        let package = DocxPackage::from_bytes(bytes).unwrap();
        assert_eq!(
            package.text_parts(true),
            vec![DOCUMENT_PART, "word/footer1.xml", "word/header1.xml"]
        );
        assert_eq!(package.text_parts(false), vec![DOCUMENT_PART]);
    }

    #[test]
    fn test_replaced_part_visible_and_saved() {
        let bytes = build(&[
            ("[Content_Types].xml", "<Types/>"),
            (DOCUMENT_PART, "<w:document/>"),
        ]);
        let mut package = DocxPackage::from_bytes(bytes).unwrap();
        package.set_part(DOCUMENT_PART, "<w:document><w:body/></w:document>".to_string());
        assert_eq!(package.read_part(DOCUMENT_PART).unwrap(), "<w:document><w:body/></w:document>");

        let reopened = DocxPackage::from_bytes(package.to_bytes().unwrap()).unwrap();
        assert_eq!(reopened.part_names(), package.part_names());
        assert_eq!(
            reopened.read_part(DOCUMENT_PART).unwrap(),
            "<w:document><w:body/></w:document>"
        );
        assert_eq!(reopened.read_part("[Content_Types].xml").unwrap(), "<Types/>");
    }

    #[test]
    fn test_annotate_docx_header_and_body() {
        let body = paragraph_xml("Contact Anna Berg today");
        let header = paragraph_xml("Anna Berg");
        let bytes = build(&[(DOCUMENT_PART, body.as_str()), ("word/header1.xml", header.as_str())]);

        let (out, report) = annotate_docx(
            bytes,
            &[Detection::new("PERSON", "Anna Berg")],
            &AnnotatorConfig::default(),
        )
        .unwrap();

        let outcome = &report.detections[0];
        assert_eq!(outcome.status, MatchStatus::Styled);
        assert_eq!(outcome.ranges.len(), 2);
        assert_eq!(outcome.ranges[0].part.as_deref(), Some(DOCUMENT_PART));
        assert_eq!(outcome.ranges[1].part.as_deref(), Some("word/header1.xml"));
        assert!(outcome.ranges.iter().all(|r| r.ground_truth));

        let package = DocxPackage::from_bytes(out).unwrap();
        let doc = package.read_document(DOCUMENT_PART).unwrap();
        let texts: Vec<_> = doc.paragraphs()[0]
            .runs
            .iter()
            .filter_map(|r| r.text_content())
            .collect();
        assert_eq!(texts, vec!["Contact ", "Anna Berg", " today"]);
        assert!(doc.run(0, 1).unwrap().properties.as_ref().unwrap().is_italic());
    }

    #[test]
    fn test_untouched_parts_not_rewritten() {
        let body = paragraph_xml("nothing here");
        let bytes = build(&[(DOCUMENT_PART, body.as_str())]);
        let mut package = DocxPackage::from_bytes(bytes).unwrap();

        let report = annotate_package(
            &mut package,
            &Annotator::default(),
            &[Detection::new("PERSON", "Zzyzx")],
        )
        .unwrap();

        assert_eq!(report.detections[0].status, MatchStatus::NotFound);
        assert_eq!(package.modified_parts().count(), 0);
        assert_eq!(package.read_part(DOCUMENT_PART).unwrap(), body);
    }

    #[test]
    fn test_broken_header_is_skipped() {
        let body = paragraph_xml("Anna Berg");
        let bytes = build(&[(DOCUMENT_PART, body.as_str()), ("word/header1.xml", "<w:hdr><w:p>")]);
        let mut package = DocxPackage::from_bytes(bytes).unwrap();

        let report = annotate_package(
            &mut package,
            &Annotator::default(),
            &[Detection::new("PERSON", "Anna Berg")],
        )
        .unwrap();

        assert_eq!(report.styled_ranges(), 1);
        assert_eq!(package.modified_parts().collect::<Vec<_>>(), vec![DOCUMENT_PART]);
    }
}
