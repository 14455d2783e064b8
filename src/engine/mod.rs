//! External conversion engines.
//!
//! All PDF understanding (OCR, layout detection, parsing) is delegated to
//! third-party tools invoked as child processes. The [`PdfEngine`] trait is
//! the seam: the batch driver holds an `Arc<dyn PdfEngine>` and never knows
//! which tool is behind it, which also makes the driver testable with a
//! scripted mock.
//!
//! Two engines ship:
//!
//! 1. [`StructureEngine`] — `paddleocr pp_structurev3`, the OCR-based
//!    structure-analysis tool; emits per-page docx/md fragments and debug
//!    files that [`crate::organize`] later merges
//! 2. [`LayoutEngine`]    — `pdf2docx`, the layout-parsing converter; emits
//!    a single docx per input and offers a relaxed option set (lattice-table
//!    parsing off) for the retry path

pub mod layout;
pub mod structure;

pub use layout::LayoutEngine;
pub use structure::StructureEngine;

use crate::error::ConvertError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Options forwarded to an engine invocation.
///
/// One flat struct for both engines; each engine reads the fields it
/// understands and ignores the rest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineOptions {
    /// Run inference on the GPU. Default: false.
    pub use_gpu: bool,
    /// Enable table recognition (structure engine). Default: true.
    pub table_recognition: bool,
    /// Parse tables from visible gridlines (layout engine). Default: true.
    ///
    /// The known-bad case: PDFs with partial or decorative gridlines make
    /// lattice parsing mis-detect table cells and abort the conversion.
    /// This is the flag the fallback retry turns off.
    pub lattice_tables: bool,
    /// Convert pages in parallel worker processes (layout engine). Default: false.
    pub multiprocessing: bool,
    /// Ask the engine for layout-analysis debug output. Default: false.
    pub debug: bool,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            use_gpu: false,
            table_recognition: true,
            lattice_tables: true,
            multiprocessing: false,
            debug: false,
        }
    }
}

/// An external PDF conversion engine.
///
/// Implementations run one input to completion per call; the driver invokes
/// them strictly serially.
#[async_trait]
pub trait PdfEngine: Send + Sync {
    /// Short tool name for logs and error messages.
    fn name(&self) -> &'static str;

    /// Convert `pdf`, writing everything under `out_dir`.
    async fn convert(
        &self,
        pdf: &Path,
        out_dir: &Path,
        opts: &EngineOptions,
    ) -> Result<(), ConvertError>;

    /// A relaxed option set worth one retry after a failure, if the engine
    /// has one for the given options. Returning `None` means a failure is
    /// final.
    fn relaxed_options(&self, opts: &EngineOptions) -> Option<EngineOptions> {
        let _ = opts;
        None
    }

    /// Whether a successful run leaves per-page artifacts that need the
    /// reorganiser.
    fn produces_page_artifacts(&self) -> bool {
        false
    }

    /// The single final document a successful run produces, for engines
    /// that write one directly instead of page artifacts.
    fn output_document(&self, pdf: &Path, out_dir: &Path) -> Option<PathBuf> {
        let _ = (pdf, out_dir);
        None
    }
}

/// Last few lines of a child process's stderr, for error messages.
/// Engines print pages of progress chatter; only the tail names the failure.
pub(crate) fn stderr_tail(stderr: &[u8]) -> String {
    let text = String::from_utf8_lossy(stderr);
    let trimmed = text.trim_end();
    if trimmed.is_empty() {
        return "conversion failed (no diagnostic output)".to_string();
    }
    let lines: Vec<&str> = trimmed.lines().collect();
    let start = lines.len().saturating_sub(5);
    lines[start..].join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn structure_engine_has_no_relaxed_options() {
        let engine = StructureEngine::new();
        assert!(engine.relaxed_options(&EngineOptions::default()).is_none());
        assert!(engine.produces_page_artifacts());
    }

    #[test]
    fn layout_engine_relaxes_lattice_parsing_once() {
        let engine = LayoutEngine::new();
        let opts = EngineOptions::default();
        let relaxed = engine.relaxed_options(&opts).expect("lattice was on");
        assert!(!relaxed.lattice_tables);
        // already relaxed: nothing further to try
        assert!(engine.relaxed_options(&relaxed).is_none());
        assert!(!engine.produces_page_artifacts());
        assert_eq!(
            engine.output_document(Path::new("in/report.pdf"), Path::new("out")),
            Some(PathBuf::from("out/report.docx"))
        );
    }

    #[test]
    fn stderr_tail_keeps_last_lines() {
        let noise: String = (0..20).map(|i| format!("progress {i}\n")).collect();
        let tail = stderr_tail(format!("{noise}Traceback: boom\n").as_bytes());
        assert!(tail.contains("Traceback: boom"));
        assert!(!tail.contains("progress 0"));
    }

    #[test]
    fn stderr_tail_empty_output() {
        assert!(stderr_tail(b"").contains("no diagnostic output"));
    }
}
