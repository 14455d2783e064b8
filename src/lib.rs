//! PDF → Word/Markdown conversion by orchestrating external engines.
//!
//! This crate does not parse PDFs itself. It drives two third-party tools
//! as child processes and turns their raw output into a clean document
//! tree:
//!
//! ```text
//! PDF files ──► engine (paddleocr | pdf2docx) ──► raw artifacts
//!                                                      │
//!                          merge (docx / markdown) ◄───┤ per-page fragments
//!                                                      │
//!                          organize ──► final/ pages/ images/ debug/
//! ```
//!
//! Two pipelines share the machinery:
//!
//! - **Structure pipeline** (`ppocr2word` binary): runs PaddleOCR's
//!   `pp_structurev3`, which emits per-page docx and markdown fragments,
//!   then merges the pages and reorganises the output directory.
//! - **Layout pipeline** (`pdf2word` binary): runs `pdf2docx`, which writes
//!   a single docx per input, with an automatic one-shot retry that turns
//!   lattice-table parsing off when a conversion fails.
//!
//! # Quick start
//!
//! ```no_run
//! use pdf2word::{BatchRunner, ConvertConfig, StructureEngine};
//! use std::sync::Arc;
//!
//! # async fn run() -> Result<(), pdf2word::ConvertError> {
//! let config = ConvertConfig::builder()
//!     .output_dir("converted")
//!     .build()?;
//! let runner = BatchRunner::new(Arc::new(StructureEngine::new()), config);
//! let summary = runner.run("pdf_data".as_ref()).await?;
//! println!("{}", summary.render_text());
//! # Ok(())
//! # }
//! ```
//!
//! The merge and organize layers are usable on their own, e.g. to re-merge
//! a directory of fragments an earlier run left behind:
//!
//! ```no_run
//! use pdf2word::{organize_directory, DocxMergeStrategy};
//!
//! # fn run() -> Result<(), pdf2word::ConvertError> {
//! organize_directory("output/report".as_ref(), DocxMergeStrategy::Styled)?;
//! # Ok(())
//! # }
//! ```
//!
//! # Feature flags
//!
//! - `cli` (default) — pulls in clap, indicatif, anyhow and
//!   tracing-subscriber for the two binaries. Library consumers can disable
//!   it.

pub mod batch;
pub mod config;
pub mod engine;
pub mod error;
pub mod inspect;
pub mod input;
pub mod merge;
pub mod organize;
pub mod progress;
pub mod report;

pub use batch::BatchRunner;
pub use config::{ConvertConfig, ConvertConfigBuilder};
pub use engine::{EngineOptions, LayoutEngine, PdfEngine, StructureEngine};
pub use error::{ConvertError, FragmentError};
pub use inspect::{docx_stats, DocxStats};
pub use merge::{
    docx::merge_docx_files, markdown::merge_markdown_files, DocxMergeStrategy, MergeReport,
};
pub use organize::{
    organize_all, organize_directory, OrganizeOutcome, OrganizeReport, SweepReport,
};
pub use progress::{BatchProgressCallback, NoopProgressCallback, ProgressCallback};
pub use report::{BatchStats, BatchSummary, FileReport};
