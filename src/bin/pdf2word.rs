//! CLI binary for the layout-parsing pipeline.
//!
//! Drives `pdf2docx` over a directory of PDFs (or one file), with the
//! automatic lattice-table fallback retry, and prints a stats block at the
//! end. Settings come from an optional JSON config file; flags override it.

use anyhow::{Context, Result};
use clap::Parser;
use pdf2word::{
    BatchProgressCallback, BatchRunner, BatchStats, ConvertConfig, LayoutEngine, ProgressCallback,
};
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
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

// ── Console progress callback ────────────────────────────────────────────────

/// One log line per file; suits piped output better than a live bar since
/// pdf2docx batches tend to be long-running and unattended.
struct ConsoleProgress;

impl BatchProgressCallback for ConsoleProgress {
    fn on_file_start(&self, index: usize, total: usize, name: &str) {
        eprintln!("{} [{index}/{total}] {name}", cyan("▶"));
    }

    fn on_file_complete(
        &self,
        _index: usize,
        _total: usize,
        name: &str,
        duration_ms: u64,
        used_fallback: bool,
    ) {
        let note = if used_fallback {
            " (lattice parsing disabled)"
        } else {
            ""
        };
        eprintln!(
            "  {} {name}  {}{}",
            green("✓"),
            dim(&format!("{:.1}s", duration_ms as f64 / 1000.0)),
            dim(note),
        );
    }

    fn on_file_error(&self, _index: usize, _total: usize, name: &str, error: &str) {
        eprintln!("  {} {name}  {}", red("✗"), red(error));
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Convert every PDF in ./pdf_data to ./output/<stem>/<stem>.docx
  pdf2word

  # Explicit directories
  pdf2word -i scans/ -o converted/

  # One file
  pdf2word --single contract.pdf -o converted/

  # Settings file (flags still win)
  pdf2word --config convert.json

  # Layout-analysis debug output alongside each docx
  pdf2word --debug -i scans/

FALLBACK:
  When a conversion fails with lattice-table parsing enabled, the file is
  retried once with it disabled. Files converted that way keep their text
  but may lose table borders; they are counted under "Fallback" in the
  final stats. Disable with --no-fallback.

REQUIREMENTS:
  The `pdf2docx` command-line tool must be installed and on PATH:
      pip install pdf2docx

ENVIRONMENT VARIABLES:
  RUST_LOG   Tracing filter override (e.g. pdf2word=debug)
"#;

/// Convert PDFs to Word documents with pdf2docx layout parsing.
#[derive(Parser, Debug)]
#[command(
    name = "pdf2word",
    version,
    about = "Convert PDFs to Word documents using pdf2docx layout parsing",
    long_about = "Runs the pdf2docx converter on each PDF in a directory. No OCR: the \
PDF's own layout data is parsed directly, which is fast and faithful for born-digital \
documents. Failed conversions are retried once with lattice-table parsing disabled.",
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Directory of PDFs to convert (not scanned recursively).
    #[arg(short, long)]
    input_dir: Option<PathBuf>,

    /// Output directory (one subdirectory is created per input file).
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Convert a single PDF instead of a directory.
    #[arg(long, conflicts_with = "input_dir")]
    single: Option<PathBuf>,

    /// JSON config file with conversion settings.
    #[arg(long, default_value = "convert.json")]
    config: PathBuf,

    /// Ask pdf2docx for layout-analysis debug output.
    #[arg(long)]
    debug: bool,

    /// Convert pages in parallel worker processes.
    #[arg(long)]
    multiprocessing: bool,

    /// Disable the relaxed-options retry for failed files.
    #[arg(long)]
    no_fallback: bool,

    /// Stop the batch at the first failed file.
    #[arg(long)]
    stop_on_error: bool,

    /// Suppress the per-file progress lines.
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
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet {
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
    // A missing config file is fine (defaults apply); a malformed one is not.
    let mut config = ConvertConfig::from_file(&cli.config)
        .with_context(|| format!("Failed to load config from {}", cli.config.display()))?;
    if let Some(ref dir) = cli.input_dir {
        config.input_dir = dir.clone();
    }
    if let Some(ref dir) = cli.output_dir {
        config.output_dir = dir.clone();
    }
    config.recursive_scan = false;
    config.verbose = cli.verbose;
    if cli.debug {
        config.engine.debug = true;
    }
    if cli.multiprocessing {
        config.engine.multiprocessing = true;
    }
    if cli.no_fallback {
        config.enable_fallback = false;
    }
    if cli.stop_on_error {
        config.continue_on_error = false;
    }

    let engine = Arc::new(LayoutEngine::new());

    // ── Single-file mode ─────────────────────────────────────────────────
    if let Some(ref pdf) = cli.single {
        let runner = BatchRunner::new(engine, config);
        let report = runner.convert_single(pdf).await;
        if report.success {
            if !cli.quiet {
                let note = if report.used_fallback {
                    " (lattice parsing disabled)"
                } else {
                    ""
                };
                eprintln!(
                    "{}  {}  {}ms{}",
                    green("✔"),
                    bold(&pdf.display().to_string()),
                    report.duration_ms,
                    dim(note),
                );
                for output in &report.outputs {
                    eprintln!("   {}", dim(&output.display().to_string()));
                }
            }
            return Ok(());
        }
        anyhow::bail!("{}: {}", pdf.display(), report.message);
    }

    // ── Batch mode ───────────────────────────────────────────────────────
    let input_dir = config.input_dir.clone();
    let summary_path = config.output_dir.join("summary.txt");
    let mut runner = BatchRunner::new(engine, config);
    if !cli.quiet && !cli.no_progress {
        runner = runner.with_progress(Arc::new(ConsoleProgress) as ProgressCallback);
    }

    let summary = runner
        .run(&input_dir)
        .await
        .with_context(|| format!("Failed to scan {}", input_dir.display()))?;

    if summary.stats.total > 0 {
        summary
            .write_to(&summary_path)
            .context("Failed to write batch summary")?;
    }
    if !cli.quiet {
        print_stats(&summary.stats);
        if summary.stats.total > 0 {
            eprintln!("   {}", dim(&format!("summary → {}", summary_path.display())));
        }
    }

    // Per-file failures live in the summary; a completed batch exits zero.
    Ok(())
}

fn print_stats(stats: &BatchStats) {
    let verdict = if stats.total == 0 {
        dim("─")
    } else if stats.failed == 0 {
        green("✔")
    } else if stats.success == 0 {
        red("✘")
    } else {
        cyan("⚠")
    };
    eprintln!();
    eprintln!("{verdict} {}", bold("Conversion finished"));
    eprintln!("   Total:     {}", stats.total);
    eprintln!("   Success:   {}", stats.success);
    eprintln!("   Failed:    {}", stats.failed);
    eprintln!("   Fallback:  {}", stats.fallback);
    eprintln!(
        "   Time:      {:.2}s total, {:.2}s average",
        stats.total_duration_ms as f64 / 1000.0,
        stats.average_duration_ms() as f64 / 1000.0,
    );
}
