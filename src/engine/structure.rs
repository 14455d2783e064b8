//! The OCR-based structure-analysis engine (`paddleocr pp_structurev3`).
//!
//! The tool rasterises and OCRs each page, then writes one docx and one
//! markdown fragment per page into the save path, alongside layout/OCR
//! visualisation PNGs, raw JSON dumps, formula `.tex` files, and an `imgs/`
//! directory. It knows nothing about merging — that is
//! [`crate::organize`]'s job after this engine returns.

use crate::engine::{stderr_tail, EngineOptions, PdfEngine};
use crate::error::ConvertError;
use async_trait::async_trait;
use std::path::Path;
use tokio::process::Command;
use tracing::{debug, info};

/// Child-process wrapper around the `paddleocr` CLI.
#[derive(Debug, Default)]
pub struct StructureEngine;

impl StructureEngine {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl PdfEngine for StructureEngine {
    fn name(&self) -> &'static str {
        "paddleocr"
    }

    fn produces_page_artifacts(&self) -> bool {
        true
    }

    async fn convert(
        &self,
        pdf: &Path,
        out_dir: &Path,
        opts: &EngineOptions,
    ) -> Result<(), ConvertError> {
        let mut cmd = Command::new("paddleocr");
        cmd.arg("pp_structurev3")
            .arg("--input")
            .arg(pdf)
            .arg("--save_path")
            .arg(out_dir)
            .arg("--device")
            .arg(if opts.use_gpu { "gpu" } else { "cpu" });
        if opts.table_recognition {
            cmd.arg("--use_table_recognition").arg("True");
        }

        info!("Running pp_structurev3 on {}", pdf.display());
        debug!("Command: {:?}", cmd.as_std());

        let output = cmd.output().await.map_err(|e| ConvertError::EngineSpawn {
            engine: self.name().to_string(),
            source: e,
        })?;

        if output.status.success() {
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
