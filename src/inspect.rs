//! Merged-document statistics.
//!
//! A structural summary of a Word document: paragraph, table, and hard
//! page-break counts. Merging is lossy when fragments are skipped, and the
//! engines occasionally emit empty pages; these counts make it cheap to
//! check a merged document against expectations without opening Word.

use crate::error::ConvertError;
use docx_rs::{read_docx, BreakType, DocumentChild, ParagraphChild, RunChild};
use serde::Serialize;
use std::path::Path;

/// Structural counts for one Word document.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DocxStats {
    /// Top-level paragraphs (paragraphs inside table cells not included).
    pub paragraphs: usize,
    /// Top-level tables.
    pub tables: usize,
    /// Hard page breaks.
    pub page_breaks: usize,
}

impl DocxStats {
    /// Page count implied by the hard page breaks.
    pub fn implied_pages(&self) -> usize {
        self.page_breaks + 1
    }
}

/// Read `path` and count its body-level structure.
pub fn docx_stats(path: &Path) -> Result<DocxStats, ConvertError> {
    let bytes = std::fs::read(path).map_err(|e| ConvertError::DocxRead {
        path: path.to_path_buf(),
        detail: e.to_string(),
    })?;
    let doc = read_docx(&bytes).map_err(|e| ConvertError::DocxRead {
        path: path.to_path_buf(),
        detail: format!("{e:?}"),
    })?;

    let mut stats = DocxStats::default();
    for child in &doc.document.children {
        match child {
            DocumentChild::Paragraph(p) => {
                stats.paragraphs += 1;
                for pc in &p.children {
                    if let ParagraphChild::Run(run) = pc {
                        for rc in &run.children {
                            if let RunChild::Break(b) = rc {
                                if *b == docx_rs::Break::new(BreakType::Page) {
                                    stats.page_breaks += 1;
                                }
                            }
                        }
                    }
                }
            }
            DocumentChild::Table(_) => stats.tables += 1,
            _ => {}
        }
    }
    Ok(stats)
}
