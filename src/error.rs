//! Error types for the pdf2word library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`ConvertError`] — **Fatal**: the operation cannot proceed at all
//!   (missing input, engine binary not found, reorganisation I/O failure).
//!   Returned as `Err(ConvertError)` from the top-level functions.
//!
//! * [`FragmentError`] — **Non-fatal**: a single page fragment could not be
//!   read during a merge. Stored inside [`crate::merge::MergeReport`] so the
//!   merge continues with the remaining fragments and callers can inspect
//!   partial success afterwards.
//!
//! Batch runs never propagate per-file engine failures as `Err`: each file's
//! outcome lands in a [`crate::report::FileReport`] and the run carries on
//! (unless the stop-on-error policy is configured).

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the pdf2word library.
///
/// Per-fragment merge failures use [`FragmentError`] and are stored in
/// [`crate::merge::MergeReport`] rather than propagated here.
#[derive(Debug, Error)]
pub enum ConvertError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file or directory was not found at the given path.
    #[error("Input not found: '{path}'\nCheck the path exists and is readable.")]
    InputNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The file exists and was read, but is not a PDF.
    #[error("File is not a valid PDF: '{path}'\nFirst bytes: {magic:?}")]
    NotAPdf { path: PathBuf, magic: [u8; 4] },

    /// Scanning the input directory for PDF files failed partway.
    #[error("Failed to scan '{dir}' for PDF files: {source}")]
    InputScan {
        dir: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Engine errors ─────────────────────────────────────────────────────
    /// The engine binary could not be started at all.
    #[error(
        "Failed to launch the '{engine}' engine: {source}\n\
         Check the tool is installed and on PATH."
    )]
    EngineSpawn {
        engine: String,
        #[source]
        source: std::io::Error,
    },

    /// The engine ran but exited with a failure status.
    #[error("Engine '{engine}' failed on '{input}': {detail}")]
    EngineFailed {
        engine: String,
        input: PathBuf,
        detail: String,
    },

    // ── Merge errors ──────────────────────────────────────────────────────
    /// A merge was requested with no input fragments.
    #[error("Nothing to merge into '{output}': no page fragments given")]
    EmptyMerge { output: PathBuf },

    /// Every fragment was unreadable; no output was written.
    #[error("Merge into '{output}' failed: none of the {total} fragments could be read")]
    AllFragmentsUnreadable { output: PathBuf, total: usize },

    /// The composed Word document could not be serialised or packed.
    #[error("Failed to write Word document '{path}': {detail}")]
    DocxWrite { path: PathBuf, detail: String },

    /// An existing Word document could not be read or parsed.
    #[error("Failed to read Word document '{path}': {detail}")]
    DocxRead { path: PathBuf, detail: String },

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not create or write an output file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A filesystem operation failed while reorganising an output directory.
    ///
    /// Fatal to that directory's reorganisation pass; a batch sweep records
    /// it and moves on to the next directory.
    #[error("Reorganisation of '{dir}' failed: {source}")]
    Reorganize {
        dir: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// The configuration file could not be read.
    #[error("Failed to read config file '{path}': {source}")]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The configuration file was read but is not valid JSON.
    #[error("Invalid config file '{path}': {detail}")]
    ConfigParse { path: PathBuf, detail: String },

    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// A non-fatal error for a single page fragment.
///
/// Stored in [`crate::merge::MergeReport::skipped`] when a fragment cannot
/// be read. The overall merge continues unless ALL fragments fail.
#[derive(Debug, Clone, Error, serde::Serialize, serde::Deserialize)]
pub enum FragmentError {
    /// The fragment file could not be read from disk.
    #[error("Fragment '{path}': read failed: {detail}")]
    ReadFailed { path: PathBuf, detail: String },

    /// The fragment was read but is not a parseable Word document.
    #[error("Fragment '{path}': not a valid Word document: {detail}")]
    ParseFailed { path: PathBuf, detail: String },
}

impl FragmentError {
    /// Path of the fragment that was skipped.
    pub fn path(&self) -> &PathBuf {
        match self {
            FragmentError::ReadFailed { path, .. } => path,
            FragmentError::ParseFailed { path, .. } => path,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn engine_failed_display() {
        let e = ConvertError::EngineFailed {
            engine: "paddleocr".into(),
            input: PathBuf::from("report.pdf"),
            detail: "exit status 2".into(),
        };
        let msg = e.to_string();
        assert!(msg.contains("paddleocr"), "got: {msg}");
        assert!(msg.contains("report.pdf"));
    }

    #[test]
    fn all_fragments_unreadable_display() {
        let e = ConvertError::AllFragmentsUnreadable {
            output: PathBuf::from("final/report.docx"),
            total: 4,
        };
        assert!(e.to_string().contains("4 fragments"));
    }

    #[test]
    fn not_a_pdf_display() {
        let e = ConvertError::NotAPdf {
            path: PathBuf::from("notes.txt"),
            magic: *b"PK\x03\x04",
        };
        assert!(e.to_string().contains("notes.txt"));
    }

    #[test]
    fn fragment_error_path_accessor() {
        let e = FragmentError::ParseFailed {
            path: PathBuf::from("report_3.docx"),
            detail: "bad zip".into(),
        };
        assert_eq!(e.path(), &PathBuf::from("report_3.docx"));
        assert!(e.to_string().contains("report_3.docx"));
    }
}
