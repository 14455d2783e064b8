//! Serial batch conversion driver.
//!
//! [`BatchRunner`] walks an input directory, runs every PDF through the
//! configured engine, retries once with relaxed options when the engine
//! offers them, and hands page-artifact output to the reorganiser. One bad
//! file never sinks the batch unless `continue_on_error` is off; each
//! outcome is collected into a [`BatchSummary`] instead.

use crate::config::ConvertConfig;
use crate::engine::PdfEngine;
use crate::error::ConvertError;
use crate::input;
use crate::organize::{self, OrganizeOutcome};
use crate::progress::ProgressCallback;
use crate::report::{BatchSummary, FileReport};
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info, warn};

/// Drives one engine over a directory of PDFs.
pub struct BatchRunner {
    engine: Arc<dyn PdfEngine>,
    config: ConvertConfig,
    progress: Option<ProgressCallback>,
}

impl BatchRunner {
    pub fn new(engine: Arc<dyn PdfEngine>, config: ConvertConfig) -> Self {
        Self {
            engine,
            config,
            progress: None,
        }
    }

    /// Attach a progress observer for file-level events.
    pub fn with_progress(mut self, progress: ProgressCallback) -> Self {
        self.progress = Some(progress);
        self
    }

    pub fn config(&self) -> &ConvertConfig {
        &self.config
    }

    /// Convert every PDF under `input_dir`, serially.
    ///
    /// An empty directory is not an error: it yields an empty summary after
    /// a warning. Only input-directory access problems are fatal.
    pub async fn run(&self, input_dir: &Path) -> Result<BatchSummary, ConvertError> {
        let pdfs = input::find_pdfs(input_dir, self.config.recursive_scan)?;
        let mut summary = BatchSummary::default();

        if pdfs.is_empty() {
            warn!("No PDF files found in {}", input_dir.display());
            return Ok(summary);
        }

        info!(
            "Converting {} file(s) from {} with {}",
            pdfs.len(),
            input_dir.display(),
            self.engine.name()
        );
        if let Some(cb) = &self.progress {
            cb.on_batch_start(pdfs.len());
        }

        let total = pdfs.len();
        for (i, pdf) in pdfs.iter().enumerate() {
            let name = pdf
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            if let Some(cb) = &self.progress {
                cb.on_file_start(i + 1, total, &name);
            }

            let report = self.convert_single(pdf).await;

            if let Some(cb) = &self.progress {
                if report.success {
                    cb.on_file_complete(i + 1, total, &name, report.duration_ms, report.used_fallback);
                } else {
                    cb.on_file_error(i + 1, total, &name, &report.message);
                }
            }

            let stop = !report.success && !self.config.continue_on_error;
            summary.push(report);
            if stop {
                error!("Stopping batch after failure: continue_on_error is disabled");
                break;
            }
        }

        if let Some(cb) = &self.progress {
            cb.on_batch_complete(&summary.stats);
        }
        Ok(summary)
    }

    /// Convert one PDF. Never returns an error; every failure mode lands in
    /// the report's `message` so batch callers treat all files uniformly.
    pub async fn convert_single(&self, pdf: &Path) -> FileReport {
        let started = Instant::now();
        let mut report = FileReport::new(pdf);
        self.convert_inner(pdf, &mut report).await;
        report.duration_ms = started.elapsed().as_millis() as u64;
        report
    }

    async fn convert_inner(&self, pdf: &Path, report: &mut FileReport) {
        if let Err(e) = input::validate_pdf(pdf) {
            report.message = e.to_string();
            return;
        }

        let stem = pdf
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "output".to_string());
        let out_dir = self.config.output_dir.join(&stem);
        if let Err(e) = std::fs::create_dir_all(&out_dir) {
            report.message = format!("cannot create {}: {e}", out_dir.display());
            return;
        }

        let mut outcome = self
            .engine
            .convert(pdf, &out_dir, &self.config.engine)
            .await;

        // One retry with relaxed options, if the engine offers a relaxation
        // for the current option set.
        if let Err(ref first) = outcome {
            if self.config.enable_fallback {
                if let Some(relaxed) = self.engine.relaxed_options(&self.config.engine) {
                    warn!(
                        "{} failed on {} ({first}), retrying with relaxed options",
                        self.engine.name(),
                        pdf.display()
                    );
                    outcome = self.engine.convert(pdf, &out_dir, &relaxed).await;
                    if outcome.is_ok() {
                        report.used_fallback = true;
                    }
                }
            }
        }

        match outcome {
            Err(e) => report.message = e.to_string(),
            Ok(()) => {
                if self.engine.produces_page_artifacts() {
                    match organize::organize_directory(&out_dir, self.config.merge_strategy) {
                        Ok(OrganizeOutcome::Organized(org)) => {
                            report.outputs = org.outputs();
                            report.success = true;
                            report.message = "converted".to_string();
                        }
                        Ok(OrganizeOutcome::AlreadyOrganized) => {
                            report.success = true;
                            report.message = "output already organised".to_string();
                        }
                        Err(e) => {
                            report.message =
                                format!("conversion succeeded but reorganisation failed: {e}");
                        }
                    }
                } else {
                    report.outputs = self
                        .engine
                        .output_document(pdf, &out_dir)
                        .into_iter()
                        .collect();
                    report.success = true;
                    report.message = "converted".to_string();
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::EngineOptions;
    use async_trait::async_trait;

    /// Engine that always succeeds and writes nothing.
    struct InertEngine;

    #[async_trait]
    impl PdfEngine for InertEngine {
        fn name(&self) -> &'static str {
            "inert"
        }

        async fn convert(
            &self,
            _pdf: &Path,
            _out_dir: &Path,
            _opts: &EngineOptions,
        ) -> Result<(), ConvertError> {
            Ok(())
        }
    }

    fn runner(output_dir: &Path) -> BatchRunner {
        let config = ConvertConfig::builder()
            .output_dir(output_dir)
            .build()
            .unwrap();
        BatchRunner::new(Arc::new(InertEngine), config)
    }

    #[tokio::test]
    async fn rejects_non_pdf_input_without_running_the_engine() {
        let dir = tempfile::tempdir().unwrap();
        let bogus = dir.path().join("notes.pdf");
        std::fs::write(&bogus, b"plain text").unwrap();

        let report = runner(dir.path()).convert_single(&bogus).await;
        assert!(!report.success);
        assert!(report.message.contains("not a valid PDF"));
    }

    #[tokio::test]
    async fn output_lands_in_per_stem_subdirectory() {
        let dir = tempfile::tempdir().unwrap();
        let pdf = dir.path().join("invoice.pdf");
        std::fs::write(&pdf, b"%PDF-1.7\n").unwrap();
        let out = dir.path().join("out");

        let report = runner(&out).convert_single(&pdf).await;
        assert!(report.success);
        assert!(out.join("invoice").is_dir());
    }
}
