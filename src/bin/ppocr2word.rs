//! CLI binary for the OCR structure pipeline.
//!
//! A thin shim over the library crate: maps CLI flags to `ConvertConfig`,
//! runs PaddleOCR's `pp_structurev3` through `BatchRunner`, and prints
//! results.

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use pdf2word::{
    organize_all, organize_directory, BatchProgressCallback, BatchRunner, BatchStats,
    ConvertConfig, DocxMergeStrategy, OrganizeOutcome, ProgressCallback, StructureEngine,
};
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress callback: one bar for the whole batch, one log line
/// per converted file.
struct CliProgressCallback {
    bar: ProgressBar,
}

impl CliProgressCallback {
    /// Bar length is set by `on_batch_start` once the directory scan is done.
    fn new_dynamic() -> Arc<Self> {
        let bar = ProgressBar::new(0);
        let spinner_style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);
        bar.set_style(spinner_style);
        bar.set_prefix("Preparing");
        bar.set_message("Scanning for PDF files…");
        bar.enable_steady_tick(Duration::from_millis(80));
        Arc::new(Self { bar })
    }
}

impl BatchProgressCallback for CliProgressCallback {
    fn on_batch_start(&self, total: usize) {
        let style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  \
             [{bar:42.green/238}] {pos:>3}/{len} files  \
             ⏱ {elapsed_precise}  ETA {eta_precise}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);
        self.bar.set_length(total as u64);
        self.bar.set_style(style);
        self.bar.set_prefix("Converting");
        self.bar.reset_eta();
        self.bar.println(format!(
            "{} {}",
            cyan("◆"),
            bold(&format!("Starting conversion of {total} file(s)…"))
        ));
    }

    fn on_file_start(&self, _index: usize, _total: usize, name: &str) {
        self.bar.set_message(name.to_string());
    }

    fn on_file_complete(
        &self,
        index: usize,
        total: usize,
        name: &str,
        duration_ms: u64,
        used_fallback: bool,
    ) {
        let note = if used_fallback { " (relaxed)" } else { "" };
        self.bar.println(format!(
            "  {} {:>3}/{:<3}  {}  {}{}",
            green("✓"),
            index,
            total,
            name,
            dim(&format!("{:.1}s", duration_ms as f64 / 1000.0)),
            dim(note),
        ));
        self.bar.inc(1);
    }

    fn on_file_error(&self, index: usize, total: usize, name: &str, error: &str) {
        let msg = truncate_message(error, 80);
        self.bar.println(format!(
            "  {} {:>3}/{:<3}  {}  {}",
            red("✗"),
            index,
            total,
            name,
            red(&msg),
        ));
        self.bar.inc(1);
    }

    fn on_batch_complete(&self, stats: &BatchStats) {
        self.bar.finish_and_clear();
        if stats.failed == 0 {
            eprintln!(
                "{} {} file(s) converted successfully",
                green("✔"),
                bold(&stats.success.to_string())
            );
        } else {
            eprintln!(
                "{} {}/{} file(s) converted  ({} failed)",
                if stats.success == 0 { red("✘") } else { cyan("⚠") },
                bold(&stats.success.to_string()),
                stats.total,
                red(&stats.failed.to_string()),
            );
        }
    }
}

/// Truncate a long error message to at most `max_chars` characters.
/// Engine stderr is frequently CJK text, so cutting at a byte index is not
/// an option; count characters instead.
fn truncate_message(error: &str, max_chars: usize) -> String {
    let mut chars = error.char_indices();
    match chars.nth(max_chars.saturating_sub(1)) {
        Some((idx, _)) if chars.next().is_some() => format!("{}\u{2026}", &error[..idx]),
        _ => error.to_string(),
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Convert one PDF (output under pp_structure_output/<stem>/)
  ppocr2word report.pdf

  # Convert a whole directory tree, writing summary.txt at the end
  ppocr2word pdf_data/ -o converted/

  # GPU inference, table recognition off
  ppocr2word --gpu --no-table scans/ -o converted/

  # Re-run only the output reorganisation (merge + final/ layout)
  ppocr2word --organize-only converted/

  # Plain body-only docx merging (skip style/numbering carry-over)
  ppocr2word --raw-merge thesis.pdf

  # Structure statistics for a merged Word document
  ppocr2word --stats converted/report/final/report.docx

OUTPUT LAYOUT (per input file):
  <out>/<stem>/final/<stem>.docx    merged Word document
  <out>/<stem>/final/<stem>.md      merged Markdown
  <out>/<stem>/pages/page_<n>.*     per-page fragments, archived
  <out>/<stem>/images/              extracted figures
  <out>/<stem>/debug/               engine JSON + layout dumps

REQUIREMENTS:
  The `paddleocr` command-line tool (PaddleOCR 3.x with PP-StructureV3)
  must be installed and on PATH:
      pip install "paddleocr[all]"

ENVIRONMENT VARIABLES:
  PPOCR2WORD_OUTPUT   Default output directory
  RUST_LOG            Tracing filter override (e.g. pdf2word=debug)
"#;

/// Convert PDFs to Word/Markdown with PaddleOCR structure analysis.
#[derive(Parser, Debug)]
#[command(
    name = "ppocr2word",
    version,
    about = "Convert PDFs to Word and Markdown using PaddleOCR PP-StructureV3",
    long_about = "Runs PaddleOCR's pp_structurev3 pipeline on each PDF, merges the \
per-page docx and Markdown fragments it emits, and reorganises the output into a \
clean final/pages/images/debug layout.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// A PDF file, or a directory of PDFs to convert in batch.
    input: PathBuf,

    /// Output directory (one subdirectory is created per input file).
    #[arg(short, long, env = "PPOCR2WORD_OUTPUT", default_value = "pp_structure_output")]
    output: PathBuf,

    /// Load settings from a JSON config file (CLI flags take precedence).
    #[arg(long)]
    config: Option<PathBuf>,

    /// Run OCR inference on the GPU.
    #[arg(long)]
    gpu: bool,

    /// Disable table structure recognition.
    #[arg(long)]
    no_table: bool,

    /// Merge docx fragments body-only, without style/numbering carry-over.
    #[arg(long)]
    raw_merge: bool,

    /// Stop the batch at the first failed file.
    #[arg(long)]
    stop_on_error: bool,

    /// Skip conversion; reorganise existing engine output under INPUT.
    #[arg(long)]
    organize_only: bool,

    /// Skip conversion; print structure statistics for the Word document
    /// at INPUT (paragraphs, tables, page breaks).
    #[arg(long, conflicts_with = "organize_only")]
    stats: bool,

    /// Disable the progress bar.
    #[arg(long)]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long)]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long)]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The progress bar owns the terminal during a batch; keep library INFO
    // logs quiet unless the user asked for them.
    let show_progress = !cli.quiet && !cli.no_progress;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    // ── Build config ─────────────────────────────────────────────────────
    let mut config = match cli.config {
        Some(ref path) => ConvertConfig::from_file(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => ConvertConfig::default(),
    };
    config.output_dir = cli.output.clone();
    config.recursive_scan = true;
    config.verbose = cli.verbose;
    if cli.gpu {
        config.engine.use_gpu = true;
    }
    if cli.no_table {
        config.engine.table_recognition = false;
    }
    if cli.raw_merge {
        config.merge_strategy = DocxMergeStrategy::Raw;
    }
    if cli.stop_on_error {
        config.continue_on_error = false;
    }

    // ── Organize-only mode ───────────────────────────────────────────────
    // Works on raw engine output a previous (possibly interrupted) run left
    // behind; no engine invocation at all.
    if cli.organize_only {
        return run_organize_only(&cli, config.merge_strategy);
    }

    // ── Stats mode ───────────────────────────────────────────────────────
    if cli.stats {
        let stats = pdf2word::docx_stats(&cli.input)
            .with_context(|| format!("Failed to inspect {}", cli.input.display()))?;
        println!("File:        {}", cli.input.display());
        println!("Paragraphs:  {}", stats.paragraphs);
        println!("Tables:      {}", stats.tables);
        println!("Page breaks: {}  ({} pages)", stats.page_breaks, stats.implied_pages());
        return Ok(());
    }

    let progress: Option<ProgressCallback> = if show_progress {
        Some(CliProgressCallback::new_dynamic() as Arc<dyn BatchProgressCallback>)
    } else {
        None
    };

    let engine = Arc::new(StructureEngine::new());

    // ── Single-file mode ─────────────────────────────────────────────────
    if cli.input.is_file() {
        let runner = BatchRunner::new(engine, config);
        let report = runner.convert_single(&cli.input).await;
        if report.success {
            if !cli.quiet {
                eprintln!(
                    "{}  {}  {}ms",
                    green("✔"),
                    bold(&cli.input.display().to_string()),
                    report.duration_ms
                );
                for output in &report.outputs {
                    eprintln!("   {}", dim(&output.display().to_string()));
                }
            }
            return Ok(());
        }
        anyhow::bail!("{}: {}", cli.input.display(), report.message);
    }

    // ── Batch mode ───────────────────────────────────────────────────────
    let summary_path = config.output_dir.join("summary.txt");
    let mut runner = BatchRunner::new(engine, config);
    if let Some(cb) = progress {
        runner = runner.with_progress(cb);
    }

    let summary = runner
        .run(&cli.input)
        .await
        .with_context(|| format!("Failed to scan {}", cli.input.display()))?;

    if summary.stats.total > 0 {
        summary
            .write_to(&summary_path)
            .context("Failed to write batch summary")?;
        if !cli.quiet {
            eprintln!("   {}", dim(&format!("summary → {}", summary_path.display())));
        }
    }

    // Per-file failures are reported in the summary; the batch itself
    // succeeded, so exit zero either way.
    Ok(())
}

fn run_organize_only(cli: &Cli, strategy: DocxMergeStrategy) -> Result<()> {
    if cli.input.is_dir() && !pdf2word::organize::has_page_artifacts(&cli.input) {
        // A parent directory holding one subdirectory per converted file.
        let report = organize_all(&cli.input, strategy)
            .with_context(|| format!("Failed to organise {}", cli.input.display()))?;
        if !cli.quiet {
            eprintln!(
                "{} {} organised, {} already organised, {} failed",
                if report.failed.is_empty() { green("✔") } else { cyan("⚠") },
                bold(&report.organized.len().to_string()),
                report.already_organized.len(),
                report.failed.len(),
            );
            for (dir, error) in &report.failed {
                eprintln!("  {} {}  {}", red("✗"), dir.display(), red(&error.to_string()));
            }
        }
        return Ok(());
    }

    match organize_directory(&cli.input, strategy)
        .with_context(|| format!("Failed to organise {}", cli.input.display()))?
    {
        OrganizeOutcome::AlreadyOrganized => {
            if !cli.quiet {
                eprintln!("{} already organised, nothing to do", dim("─"));
            }
        }
        OrganizeOutcome::Organized(report) => {
            if !cli.quiet {
                eprintln!(
                    "{} merged {} docx / {} md page(s)",
                    green("✔"),
                    bold(&report.docx_pages.to_string()),
                    report.md_pages
                );
                for output in report.outputs() {
                    eprintln!("   {}", dim(&output.display().to_string()));
                }
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_messages_pass_through_untruncated() {
        assert_eq!(truncate_message("engine exited with status 2", 80), "engine exited with status 2");
    }

    #[test]
    fn exactly_max_chars_is_not_truncated() {
        let msg = "x".repeat(80);
        assert_eq!(truncate_message(&msg, 80), msg);
    }

    #[test]
    fn long_cjk_messages_truncate_on_character_boundaries() {
        // Engine diagnostics are multi-byte text; a fixed byte cut would
        // split a character and panic.
        let msg = format!(
            "Engine 'paddleocr' failed on 'scans/report1.pdf': {}",
            "错误：无法识别页面结构，表格检测模块在第三页上超时并中止了整个识别流程".repeat(3)
        );
        let truncated = truncate_message(&msg, 80);
        assert_eq!(truncated.chars().count(), 80);
        assert!(truncated.ends_with('\u{2026}'));
        assert!(msg.starts_with(truncated.trim_end_matches('\u{2026}')));
    }
}
