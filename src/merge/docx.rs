//! Word page-fragment merger.
//!
//! Given per-page .docx files in page order, compose one document that
//! preserves styles, tables, and images, with a page break between
//! consecutive pages.
//!
//! ## Why two strategies?
//!
//! Appending body nodes alone is enough to carry the *content* across, but
//! paragraph and table nodes refer to styles and numbering definitions by id.
//! If the master lacks a definition an appended page uses, Word silently
//! falls back to defaults — the text survives, the formatting does not.
//! [`DocxMergeStrategy::Styled`] therefore also folds each source's style
//! and numbering parts into the master before appending its body.
//! [`DocxMergeStrategy::Raw`] skips that step; it exists as an explicit
//! lower-fidelity escape hatch, not an equivalent substitute.

use crate::error::{ConvertError, FragmentError};
use crate::merge::{DocxMergeStrategy, MergeReport};
use docx_rs::{read_docx, BreakType, Docx, DocumentChild, Numberings, Paragraph, Run, Styles};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Merge `inputs` (in the given order) into a single document at `output`.
///
/// Unreadable fragments are skipped and recorded in the returned
/// [`MergeReport`]; the merge never fails because of one bad fragment.
///
/// # Errors
/// - [`ConvertError::EmptyMerge`] when `inputs` is empty
/// - [`ConvertError::AllFragmentsUnreadable`] when no fragment parsed
/// - write/pack failures on the output path
pub fn merge_docx_files(
    inputs: &[PathBuf],
    output: &Path,
    strategy: DocxMergeStrategy,
) -> Result<MergeReport, ConvertError> {
    if inputs.is_empty() {
        return Err(ConvertError::EmptyMerge {
            output: output.to_path_buf(),
        });
    }

    let mut master: Option<Docx> = None;
    let mut merged = 0usize;
    let mut skipped = Vec::new();

    for path in inputs {
        let doc = match read_fragment(path) {
            Ok(doc) => doc,
            Err(e) => {
                warn!("Skipping Word fragment: {e}");
                skipped.push(e);
                continue;
            }
        };

        match master {
            // First readable fragment becomes the master document; its
            // styles, numbering, and section properties carry through.
            None => master = Some(doc),
            Some(ref mut m) => append_fragment(m, doc, strategy),
        }
        merged += 1;
    }

    let master = match master {
        Some(m) => m,
        None => {
            return Err(ConvertError::AllFragmentsUnreadable {
                output: output.to_path_buf(),
                total: inputs.len(),
            })
        }
    };

    let file = std::fs::File::create(output).map_err(|e| ConvertError::OutputWrite {
        path: output.to_path_buf(),
        source: e,
    })?;
    master
        .build()
        .pack(file)
        .map_err(|e| ConvertError::DocxWrite {
            path: output.to_path_buf(),
            detail: e.to_string(),
        })?;

    debug!(
        "Merged {merged}/{} Word fragments into {}",
        inputs.len(),
        output.display()
    );
    Ok(MergeReport { merged, skipped })
}

/// Read and parse one fragment, mapping both failure modes to [`FragmentError`].
fn read_fragment(path: &Path) -> Result<Docx, FragmentError> {
    let bytes = std::fs::read(path).map_err(|e| FragmentError::ReadFailed {
        path: path.to_path_buf(),
        detail: e.to_string(),
    })?;
    read_docx(&bytes).map_err(|e| FragmentError::ParseFailed {
        path: path.to_path_buf(),
        detail: format!("{e:?}"),
    })
}

/// Append `doc` to the master: page break, then (for Styled) definition
/// absorption, then the body nodes.
fn append_fragment(master: &mut Docx, doc: Docx, strategy: DocxMergeStrategy) {
    let Docx {
        document,
        styles,
        numberings,
        ..
    } = doc;

    if strategy == DocxMergeStrategy::Styled {
        absorb_styles(master, styles);
        absorb_numberings(master, numberings);
    }

    master.document.children.push(page_break());
    master.document.children.extend(document.children);
}

/// A paragraph containing nothing but a hard page break.
fn page_break() -> DocumentChild {
    DocumentChild::Paragraph(Box::new(
        Paragraph::new().add_run(Run::new().add_break(BreakType::Page)),
    ))
}

/// Fold `styles` into the master, keeping the master's definition on id
/// collision. First-id-wins matches how Word resolves duplicates and keeps
/// page 1's look authoritative for shared style names.
fn absorb_styles(master: &mut Docx, styles: Styles) {
    let existing: HashSet<String> = master
        .styles
        .styles
        .iter()
        .map(|s| s.style_id.clone())
        .collect();
    for style in styles.styles {
        if !existing.contains(&style.style_id) {
            master.styles.styles.push(style);
        }
    }
}

/// Fold numbering definitions into the master, first id wins.
fn absorb_numberings(master: &mut Docx, numberings: Numberings) {
    let have_abstract: HashSet<usize> = master
        .numberings
        .abstract_nums
        .iter()
        .map(|a| a.id)
        .collect();
    for abs in numberings.abstract_nums {
        if !have_abstract.contains(&abs.id) {
            master.numberings.abstract_nums.push(abs);
        }
    }

    let have_concrete: HashSet<usize> = master
        .numberings
        .numberings
        .iter()
        .map(|n| n.id)
        .collect();
    for num in numberings.numberings {
        if !have_concrete.contains(&num.id) {
            master.numberings.numberings.push(num);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use docx_rs::{ParagraphChild, RunChild};
    use std::fs;

    fn write_fragment(path: &Path, text: &str) {
        let file = fs::File::create(path).unwrap();
        Docx::new()
            .add_paragraph(Paragraph::new().add_run(Run::new().add_text(text)))
            .build()
            .pack(file)
            .unwrap();
    }

    /// Visible paragraph texts of a document, in body order.
    fn paragraph_texts(path: &Path) -> Vec<String> {
        let doc = read_docx(&fs::read(path).unwrap()).unwrap();
        doc.document
            .children
            .iter()
            .filter_map(|child| match child {
                DocumentChild::Paragraph(p) => {
                    let mut text = String::new();
                    for pc in &p.children {
                        if let ParagraphChild::Run(run) = pc {
                            for rc in &run.children {
                                if let RunChild::Text(t) = rc {
                                    text.push_str(&t.text);
                                }
                            }
                        }
                    }
                    (!text.is_empty()).then_some(text)
                }
                _ => None,
            })
            .collect()
    }

    #[test]
    fn merges_fragments_in_given_order() {
        let dir = tempfile::tempdir().unwrap();
        let paths: Vec<PathBuf> = (0..3)
            .map(|i| {
                let p = dir.path().join(format!("doc_{i}.docx"));
                write_fragment(&p, &format!("page {i}"));
                p
            })
            .collect();
        let out = dir.path().join("merged.docx");

        let report = merge_docx_files(&paths, &out, DocxMergeStrategy::Styled).unwrap();
        assert_eq!(report.merged, 3);
        assert!(report.skipped.is_empty());
        assert_eq!(paragraph_texts(&out), vec!["page 0", "page 1", "page 2"]);
    }

    #[test]
    fn unreadable_fragment_is_skipped_not_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let good_a = dir.path().join("doc_0.docx");
        let bad = dir.path().join("doc_1.docx");
        let good_b = dir.path().join("doc_2.docx");
        write_fragment(&good_a, "alpha");
        fs::write(&bad, b"this is not a zip archive").unwrap();
        write_fragment(&good_b, "beta");
        let out = dir.path().join("merged.docx");

        let report = merge_docx_files(
            &[good_a, bad.clone(), good_b],
            &out,
            DocxMergeStrategy::Styled,
        )
        .unwrap();

        assert_eq!(report.merged, 2);
        assert_eq!(report.skipped.len(), 1);
        assert_eq!(report.skipped[0].path(), &bad);
        assert_eq!(paragraph_texts(&out), vec!["alpha", "beta"]);
    }

    #[test]
    fn unreadable_first_fragment_still_merges_rest() {
        let dir = tempfile::tempdir().unwrap();
        let bad = dir.path().join("doc_0.docx");
        let good = dir.path().join("doc_1.docx");
        fs::write(&bad, b"garbage").unwrap();
        write_fragment(&good, "only page");
        let out = dir.path().join("merged.docx");

        let report =
            merge_docx_files(&[bad, good], &out, DocxMergeStrategy::Styled).unwrap();
        assert_eq!(report.merged, 1);
        assert_eq!(report.skipped.len(), 1);
        assert_eq!(paragraph_texts(&out), vec!["only page"]);
    }

    #[test]
    fn empty_input_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("merged.docx");
        let err = merge_docx_files(&[], &out, DocxMergeStrategy::Styled);
        assert!(matches!(err, Err(ConvertError::EmptyMerge { .. })));
    }

    #[test]
    fn all_unreadable_is_an_error_and_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let bad = dir.path().join("doc_0.docx");
        fs::write(&bad, b"nope").unwrap();
        let out = dir.path().join("merged.docx");

        let err = merge_docx_files(&[bad], &out, DocxMergeStrategy::Styled);
        assert!(matches!(
            err,
            Err(ConvertError::AllFragmentsUnreadable { total: 1, .. })
        ));
        assert!(!out.exists());
    }

    #[test]
    fn raw_strategy_appends_body_nodes() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("doc_0.docx");
        let b = dir.path().join("doc_1.docx");
        write_fragment(&a, "first");
        write_fragment(&b, "second");
        let out = dir.path().join("merged.docx");

        let report = merge_docx_files(&[a, b], &out, DocxMergeStrategy::Raw).unwrap();
        assert_eq!(report.merged, 2);
        assert_eq!(paragraph_texts(&out), vec!["first", "second"]);
    }
}
