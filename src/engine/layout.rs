//! The layout-parsing engine (`pdf2docx`).
//!
//! Parses the PDF's own layout data (no OCR) and writes a single docx per
//! input — no per-page fragments, so successful runs skip the reorganiser.
//!
//! This is the engine with a useful retry: lattice-table parsing trips over
//! PDFs whose tables have partial or decorative gridlines, and rerunning
//! with it disabled rescues most of those files at the cost of table
//! fidelity. [`PdfEngine::relaxed_options`] exposes exactly that one step.

use crate::engine::{stderr_tail, EngineOptions, PdfEngine};
use crate::error::ConvertError;
use async_trait::async_trait;
use std::path::Path;
use tokio::process::Command;
use tracing::{debug, info};

/// Child-process wrapper around the `pdf2docx` CLI.
#[derive(Debug, Default)]
pub struct LayoutEngine;

impl LayoutEngine {
    pub fn new() -> Self {
        Self
    }

    /// Where this engine writes the converted document for `pdf`.
    pub fn docx_path(pdf: &Path, out_dir: &Path) -> std::path::PathBuf {
        let stem = pdf
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "output".to_string());
        out_dir.join(format!("{stem}.docx"))
    }
}

#[async_trait]
impl PdfEngine for LayoutEngine {
    fn name(&self) -> &'static str {
        "pdf2docx"
    }

    fn output_document(&self, pdf: &Path, out_dir: &Path) -> Option<std::path::PathBuf> {
        Some(Self::docx_path(pdf, out_dir))
    }

    fn relaxed_options(&self, opts: &EngineOptions) -> Option<EngineOptions> {
        if opts.lattice_tables {
            Some(EngineOptions {
                lattice_tables: false,
                ..opts.clone()
            })
        } else {
            None
        }
    }

    async fn convert(
        &self,
        pdf: &Path,
        out_dir: &Path,
        opts: &EngineOptions,
    ) -> Result<(), ConvertError> {
        let docx = Self::docx_path(pdf, out_dir);

        let mut cmd = Command::new("pdf2docx");
        cmd.arg("convert").arg(pdf).arg(&docx);
        if !opts.lattice_tables {
            cmd.arg("--parse_lattice_table=False");
        }
        if opts.multiprocessing {
            cmd.arg("--multi_processing=True");
        }
        if opts.debug {
            cmd.arg("--debug=True");
        }

        info!("Running pdf2docx on {}", pdf.display());
        debug!("Command: {:?}", cmd.as_std());

        let output = cmd.output().await.map_err(|e| ConvertError::EngineSpawn {
            engine: self.name().to_string(),
            source: e,
        })?;

        if output.status.success() && docx.is_file() {
            Ok(())
        } else {
            Err(ConvertError::EngineFailed {
                engine: self.name().to_string(),
                input: pdf.to_path_buf(),
                detail: stderr_tail(&output.stderr),
            })
        }
    }
}
