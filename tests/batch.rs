//! End-to-end batch driver tests with a scripted engine.
//!
//! The real engines shell out to external tools; these tests swap in a mock
//! that records every invocation, so retry counts, error handling and the
//! reorganiser hand-off can be asserted without paddleocr or pdf2docx
//! installed.

use async_trait::async_trait;
use pdf2word::{
    BatchRunner, ConvertConfig, ConvertError, EngineOptions, PdfEngine,
};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

/// Scripted engine: fails on chosen stems, optionally only while
/// lattice-table parsing is on, and records every call it receives.
#[derive(Default)]
struct ScriptedEngine {
    /// Stems that fail regardless of options.
    fail_always: HashSet<String>,
    /// Stems that fail only while `lattice_tables` is on.
    fail_with_lattice: HashSet<String>,
    /// Whether the engine offers a relaxed retry (mimics pdf2docx).
    relaxable: bool,
    /// Whether successful runs write per-page markdown fragments.
    write_artifacts: bool,
    calls: Mutex<Vec<(String, EngineOptions)>>,
}

impl ScriptedEngine {
    fn calls_for(&self, stem: &str) -> Vec<EngineOptions> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|(s, _)| s == stem)
            .map(|(_, o)| o.clone())
            .collect()
    }
}

#[async_trait]
impl PdfEngine for ScriptedEngine {
    fn name(&self) -> &'static str {
        "scripted"
    }

    fn produces_page_artifacts(&self) -> bool {
        self.write_artifacts
    }

    fn relaxed_options(&self, opts: &EngineOptions) -> Option<EngineOptions> {
        if self.relaxable && opts.lattice_tables {
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
        let stem = pdf.file_stem().unwrap().to_string_lossy().into_owned();
        self.calls.lock().unwrap().push((stem.clone(), opts.clone()));

        let failing = self.fail_always.contains(&stem)
            || (self.fail_with_lattice.contains(&stem) && opts.lattice_tables);
        if failing {
            return Err(ConvertError::EngineFailed {
                engine: "scripted".to_string(),
                input: pdf.to_path_buf(),
                detail: "scripted failure".to_string(),
            });
        }

        if self.write_artifacts {
            std::fs::write(out_dir.join(format!("{stem}_1.md")), "page one").unwrap();
            std::fs::write(out_dir.join(format!("{stem}_2.md")), "page two").unwrap();
        }
        Ok(())
    }
}

fn stems(set: &[&str]) -> HashSet<String> {
    set.iter().map(|s| s.to_string()).collect()
}

fn make_pdfs(dir: &Path, names: &[&str]) {
    for name in names {
        std::fs::write(dir.join(format!("{name}.pdf")), b"%PDF-1.7\n").unwrap();
    }
}

fn config(input: &Path, output: &Path) -> ConvertConfig {
    ConvertConfig::builder()
        .input_dir(input)
        .output_dir(output)
        .build()
        .unwrap()
}

#[tokio::test]
async fn batch_continues_past_a_failed_file() {
    let tmp = TempDir::new().unwrap();
    let input = tmp.path().join("in");
    let output = tmp.path().join("out");
    std::fs::create_dir(&input).unwrap();
    make_pdfs(&input, &["a", "b", "c"]);

    let engine = Arc::new(ScriptedEngine {
        fail_always: stems(&["b"]),
        ..Default::default()
    });
    let runner = BatchRunner::new(engine.clone(), config(&input, &output));
    let summary = runner.run(&input).await.unwrap();

    assert_eq!(summary.stats.total, 3);
    assert_eq!(summary.stats.success, 2);
    assert_eq!(summary.stats.failed, 1);
    // Inputs are visited in sorted order; only b failed.
    let failed: Vec<_> = summary
        .reports
        .iter()
        .filter(|r| !r.success)
        .map(|r| r.input.clone())
        .collect();
    assert_eq!(failed, [input.join("b.pdf")]);
    // Every file was attempted exactly once (no relaxation offered).
    for stem in ["a", "b", "c"] {
        assert_eq!(engine.calls_for(stem).len(), 1, "stem {stem}");
    }
}

#[tokio::test]
async fn batch_stops_on_failure_when_configured() {
    let tmp = TempDir::new().unwrap();
    let input = tmp.path().join("in");
    let output = tmp.path().join("out");
    std::fs::create_dir(&input).unwrap();
    make_pdfs(&input, &["a", "b", "c"]);

    let engine = Arc::new(ScriptedEngine {
        fail_always: stems(&["b"]),
        ..Default::default()
    });
    let mut cfg = config(&input, &output);
    cfg.continue_on_error = false;
    let runner = BatchRunner::new(engine.clone(), cfg);
    let summary = runner.run(&input).await.unwrap();

    // a succeeded, b failed, c was never attempted.
    assert_eq!(summary.stats.total, 2);
    assert_eq!(summary.stats.failed, 1);
    assert!(engine.calls_for("c").is_empty());
}

#[tokio::test]
async fn relaxed_retry_runs_exactly_once_and_is_counted() {
    let tmp = TempDir::new().unwrap();
    let input = tmp.path().join("in");
    let output = tmp.path().join("out");
    std::fs::create_dir(&input).unwrap();
    make_pdfs(&input, &["good", "tricky"]);

    let engine = Arc::new(ScriptedEngine {
        fail_with_lattice: stems(&["tricky"]),
        relaxable: true,
        ..Default::default()
    });
    let runner = BatchRunner::new(engine.clone(), config(&input, &output));
    let summary = runner.run(&input).await.unwrap();

    assert_eq!(summary.stats.success, 2);
    assert_eq!(summary.stats.fallback, 1);

    let calls = engine.calls_for("tricky");
    assert_eq!(calls.len(), 2);
    assert!(calls[0].lattice_tables);
    assert!(!calls[1].lattice_tables);
    assert!(engine.calls_for("good").len() == 1);

    let tricky = summary
        .reports
        .iter()
        .find(|r| r.input.ends_with("tricky.pdf"))
        .unwrap();
    assert!(tricky.used_fallback);
}

#[tokio::test]
async fn no_retry_when_fallback_is_disabled() {
    let tmp = TempDir::new().unwrap();
    let input = tmp.path().join("in");
    let output = tmp.path().join("out");
    std::fs::create_dir(&input).unwrap();
    make_pdfs(&input, &["tricky"]);

    let engine = Arc::new(ScriptedEngine {
        fail_with_lattice: stems(&["tricky"]),
        relaxable: true,
        ..Default::default()
    });
    let mut cfg = config(&input, &output);
    cfg.enable_fallback = false;
    let runner = BatchRunner::new(engine.clone(), cfg);
    let summary = runner.run(&input).await.unwrap();

    assert_eq!(summary.stats.failed, 1);
    assert_eq!(engine.calls_for("tricky").len(), 1);
}

#[tokio::test]
async fn no_retry_when_the_relaxed_attempt_also_fails() {
    let tmp = TempDir::new().unwrap();
    let input = tmp.path().join("in");
    let output = tmp.path().join("out");
    std::fs::create_dir(&input).unwrap();
    make_pdfs(&input, &["doomed"]);

    let engine = Arc::new(ScriptedEngine {
        fail_always: stems(&["doomed"]),
        relaxable: true,
        ..Default::default()
    });
    let runner = BatchRunner::new(engine.clone(), config(&input, &output));
    let summary = runner.run(&input).await.unwrap();

    assert_eq!(summary.stats.failed, 1);
    // One original attempt plus exactly one relaxed attempt, never more.
    assert_eq!(engine.calls_for("doomed").len(), 2);
    assert!(!summary.reports[0].used_fallback);
}

#[tokio::test]
async fn page_artifacts_are_merged_and_organized() {
    let tmp = TempDir::new().unwrap();
    let input = tmp.path().join("in");
    let output = tmp.path().join("out");
    std::fs::create_dir(&input).unwrap();
    make_pdfs(&input, &["report"]);

    let engine = Arc::new(ScriptedEngine {
        write_artifacts: true,
        ..Default::default()
    });
    let runner = BatchRunner::new(engine, config(&input, &output));
    let summary = runner.run(&input).await.unwrap();

    assert_eq!(summary.stats.success, 1);

    let doc_dir = output.join("report");
    let final_md = doc_dir.join("final").join("report.md");
    assert_eq!(summary.reports[0].outputs, [final_md.clone()]);

    let merged = std::fs::read_to_string(&final_md).unwrap();
    assert_eq!(merged, "page one\n\n---\n\n# 第 2 页\n\npage two");

    // Fragments were archived, not left in the working directory.
    assert!(doc_dir.join("pages").join("page_1.md").is_file());
    assert!(!doc_dir.join("report_1.md").exists());
}

#[tokio::test]
async fn empty_input_directory_yields_empty_summary() {
    let tmp = TempDir::new().unwrap();
    let input = tmp.path().join("in");
    let output = tmp.path().join("out");
    std::fs::create_dir(&input).unwrap();

    let runner = BatchRunner::new(Arc::new(ScriptedEngine::default()), config(&input, &output));
    let summary = runner.run(&input).await.unwrap();
    assert_eq!(summary.stats.total, 0);
    assert!(summary.reports.is_empty());
}

#[tokio::test]
async fn missing_input_directory_is_fatal() {
    let tmp = TempDir::new().unwrap();
    let input = tmp.path().join("nope");
    let output = tmp.path().join("out");

    let runner = BatchRunner::new(Arc::new(ScriptedEngine::default()), config(&input, &output));
    assert!(matches!(
        runner.run(&input).await,
        Err(ConvertError::InputNotFound { .. })
    ));
}
