//! Property tests for the flatten / splice invariants.

use docx_annotator::model::{
    Document, MarkerKind, Paragraph, Property, Run, RunProperties, BOLD, COLOR, ITALIC,
};
use docx_annotator::{Annotator, Detection, Flattener, JoinPolicy, Position, Splicer};
use docx_annotator::{MatchStatus, StyleClassifier};
use proptest::prelude::*;

#[derive(Debug, Clone)]
enum RunSpec {
    Text(String, u8),
    Tab,
}

fn properties(style: u8) -> Option<RunProperties> {
    match style {
        0 => None,
        1 => Some(RunProperties::from_properties(vec![Property::toggle(ITALIC)])),
        _ => Some(RunProperties::from_properties(vec![
            Property::toggle(BOLD),
            Property::with_val(COLOR, "FF0000"),
        ])),
    }
}

fn build(paragraphs: Vec<Vec<RunSpec>>) -> Document {
    Document::from_paragraphs(
        paragraphs
            .into_iter()
            .map(|runs| {
                Paragraph::new(
                    runs.into_iter()
                        .map(|spec| match spec {
                            RunSpec::Text(text, style) => {
                                let mut run = Run::text(text);
                                run.properties = properties(style);
                                run
                            },
                            RunSpec::Tab => Run::markers([MarkerKind::Tab]),
                        })
                        .collect(),
                )
            })
            .collect(),
    )
}

fn run_spec() -> impl Strategy<Value = RunSpec> {
    prop_oneof![
        4 => ("[a-mÄö .,]{0,8}", 0u8..3).prop_map(|(text, style)| RunSpec::Text(text, style)),
        1 => Just(RunSpec::Tab),
    ]
}

fn document() -> impl Strategy<Value = Document> {
    prop::collection::vec(prop::collection::vec(run_spec(), 0..5), 0..4).prop_map(build)
}

fn policy() -> impl Strategy<Value = JoinPolicy> {
    prop_oneof![
        Just(JoinPolicy::Never),
        Just(JoinPolicy::Always),
        Just(JoinPolicy::AlnumBoundary),
    ]
}

/// Pick a non-empty range inside `0..len` from two arbitrary numbers.
fn pick_range(len: usize, a: usize, b: usize) -> std::ops::Range<usize> {
    let start = a % len;
    let end = start + 1 + b % (len - start);
    start..end
}

proptest! {
    #[test]
    fn text_and_map_have_equal_length(doc in document(), policy in policy()) {
        let flat = Flattener::new(policy).flatten(&doc);
        prop_assert_eq!(flat.len(), flat.text().chars().count());
        prop_assert_eq!(flat.len(), flat.position_map().len());
    }

    #[test]
    fn real_offsets_are_contiguous(doc in document(), policy in policy()) {
        let flat = Flattener::new(policy).flatten(&doc);
        let chars: Vec<char> = flat.text().chars().collect();

        for (p, paragraph) in doc.paragraphs().iter().enumerate() {
            for (r, run) in paragraph.runs.iter().enumerate() {
                let offsets: Vec<usize> = flat
                    .positions()
                    .filter_map(|pos| match pos {
                        Position::Real { paragraph, run, offset } if paragraph == p && run == r => {
                            Some(offset)
                        },
                        _ => None,
                    })
                    .collect();
                prop_assert_eq!(offsets, (0..run.char_len()).collect::<Vec<_>>());
            }
        }

        for (i, pos) in flat.positions().enumerate() {
            if let Position::Real { paragraph, run, offset } = pos {
                let text = doc.run(paragraph, run).and_then(|r| r.text_content()).unwrap();
                prop_assert_eq!(text.chars().nth(offset), Some(chars[i]));
            }
        }
    }

    #[test]
    fn splice_preserves_text(doc in document(), policy in policy(), a in 0usize..64, b in 0usize..64) {
        let flattener = Flattener::new(policy);
        let mut flat = flattener.flatten(&doc);
        prop_assume!(!flat.is_empty());

        let original = flat.text().to_string();
        let range = pick_range(flat.len(), a, b);
        let classifier = StyleClassifier::default();
        let mut doc = doc;

        let report = Splicer::new(&classifier)
            .apply_style(&mut doc, &mut flat, range, |p, gt| classifier.choose_overlay(p, gt))
            .unwrap();

        prop_assert!(report.skipped.is_empty());
        prop_assert_eq!(flat.text(), original.as_str());
        prop_assert_eq!(flattener.flatten(&doc), flat);
    }

    #[test]
    fn overlay_twice_equals_once(doc in document(), a in 0usize..64, b in 0usize..64) {
        let mut flat = Flattener::default().flatten(&doc);
        prop_assume!(!flat.is_empty());

        let range = pick_range(flat.len(), a, b);
        let classifier = StyleClassifier::default();
        let splicer = Splicer::new(&classifier);
        let mut doc = doc;

        splicer
            .apply_style(&mut doc, &mut flat, range.clone(), |p, gt| classifier.choose_overlay(p, gt))
            .unwrap();
        let once = doc.clone();
        splicer
            .apply_style(&mut doc, &mut flat, range, |p, gt| classifier.choose_overlay(p, gt))
            .unwrap();

        prop_assert_eq!(doc, once);
    }

    #[test]
    fn absent_value_leaves_document_unchanged(doc in document()) {
        let mut annotated = doc.clone();
        let report = Annotator::default()
            .annotate(&mut annotated, &[Detection::new("PERSON", "Zzyzx")])
            .unwrap();

        prop_assert_eq!(report.detections[0].status, MatchStatus::NotFound);
        prop_assert_eq!(annotated, doc);
    }
}
