//! Per-file and per-run result records.
//!
//! Batch runs never abort on a single bad file; instead every outcome is
//! captured as a [`FileReport`] and aggregated into [`BatchStats`]. The
//! rendered [`BatchSummary`] text file is how a batch invocation — which
//! always exits zero — communicates partial failure.

use crate::error::ConvertError;
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Outcome of converting one input file.
#[derive(Debug, Clone, Serialize)]
pub struct FileReport {
    /// The input PDF.
    pub input: PathBuf,
    /// Whether a final document was produced.
    pub success: bool,
    /// Human-readable status or error text.
    pub message: String,
    /// Final document paths (empty on failure).
    pub outputs: Vec<PathBuf>,
    /// Whether the relaxed-options retry produced the result.
    pub used_fallback: bool,
    /// Wall-clock time spent on this file, engine retry included.
    pub duration_ms: u64,
}

impl FileReport {
    /// A not-yet-successful report for `input`; the driver fills in the rest.
    pub fn new(input: &Path) -> Self {
        Self {
            input: input.to_path_buf(),
            success: false,
            message: String::new(),
            outputs: Vec::new(),
            used_fallback: false,
            duration_ms: 0,
        }
    }
}

/// Aggregate counters for one batch run.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct BatchStats {
    pub total: usize,
    pub success: usize,
    pub failed: usize,
    /// Successes that needed the relaxed-options retry.
    pub fallback: usize,
    pub total_duration_ms: u64,
}

impl BatchStats {
    fn record(&mut self, report: &FileReport) {
        self.total += 1;
        if report.success {
            self.success += 1;
            if report.used_fallback {
                self.fallback += 1;
            }
        } else {
            self.failed += 1;
        }
        self.total_duration_ms += report.duration_ms;
    }

    /// Mean per-file duration; zero when nothing was attempted.
    pub fn average_duration_ms(&self) -> u64 {
        if self.total == 0 {
            0
        } else {
            self.total_duration_ms / self.total as u64
        }
    }
}

/// All file reports of a run plus the aggregate counters.
#[derive(Debug, Default, Serialize)]
pub struct BatchSummary {
    pub reports: Vec<FileReport>,
    pub stats: BatchStats,
}

impl BatchSummary {
    /// Record one file's outcome.
    pub fn push(&mut self, report: FileReport) {
        self.stats.record(&report);
        self.reports.push(report);
    }

    /// Render the summary as the text written to `summary.txt`.
    pub fn render_text(&self) -> String {
        let mut out = String::from("Conversion summary\n");
        out.push_str(&"=".repeat(60));
        out.push_str("\n\n");

        for report in &self.reports {
            out.push_str(&format!("Input:  {}\n", report.input.display()));
            if report.success {
                let note = if report.used_fallback {
                    " (relaxed options)"
                } else {
                    ""
                };
                out.push_str(&format!("Status: success{note}\n"));
                for output in &report.outputs {
                    out.push_str(&format!("  Output: {}\n", output.display()));
                }
            } else {
                out.push_str("Status: failed\n");
                out.push_str(&format!("  Error: {}\n", report.message));
            }
            out.push('\n');
        }

        out.push_str(&"-".repeat(60));
        out.push('\n');
        out.push_str(&format!(
            "Total: {}  Success: {}  Failed: {}  Fallback: {}\n",
            self.stats.total, self.stats.success, self.stats.failed, self.stats.fallback
        ));
        out.push_str(&format!(
            "Total time: {:.2}s  Average: {:.2}s\n",
            self.stats.total_duration_ms as f64 / 1000.0,
            self.stats.average_duration_ms() as f64 / 1000.0
        ));
        out
    }

    /// Write the rendered summary to `path`, creating parent directories.
    pub fn write_to(&self, path: &Path) -> Result<(), ConvertError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| ConvertError::OutputWrite {
                path: path.to_path_buf(),
                source: e,
            })?;
        }
        std::fs::write(path, self.render_text()).map_err(|e| ConvertError::OutputWrite {
            path: path.to_path_buf(),
            source: e,
        })
    }
}
