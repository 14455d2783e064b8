//! Output reorganisation for the structure-analysis pipeline.
//!
//! The engine drops everything for one input into a single directory: per-page
//! Word and Markdown fragments named `{basename}_{page}.{docx,md}`, loose
//! visualisation PNGs, raw JSON structure dumps, recognised-formula `.tex`
//! files, and an `imgs/` directory of extracted images. This module turns
//! that flat pile into:
//!
//! ```text
//! {dir}/
//!   final/    {basename}.docx  {basename}.md  README.txt
//!   pages/    page_{n}.docx    page_{n}.md
//!   images/   *.png            extracted/
//!   debug/    json/*.json      tex/*.tex
//! ```
//!
//! Page fragments are classified by their trailing numeric suffix and merged
//! in ascending page order — numeric order, so page 10 follows page 9, not
//! page 1. Re-running on an already-organised directory is detected up front
//! (non-empty `final/`) and is a no-op: nothing is re-merged or moved twice.

use crate::error::{ConvertError, FragmentError};
use crate::merge::{self, DocxMergeStrategy};
use once_cell::sync::Lazy;
use regex::Regex;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Trailing `_<digits>` page suffix on a file stem.
static RE_PAGE_SUFFIX: Lazy<Regex> = Lazy::new(|| Regex::new(r"_(\d+)$").unwrap());

/// One per-page engine output file, classified by its numeric suffix.
#[derive(Debug, Clone)]
pub struct PageArtifact {
    /// Page index parsed from the filename suffix (0-indexed in practice;
    /// we preserve whatever the engine wrote).
    pub index: usize,
    pub path: PathBuf,
}

/// Result of organising one directory.
#[derive(Debug)]
pub enum OrganizeOutcome {
    /// `final/` already held a non-empty file; nothing was touched.
    AlreadyOrganized,
    Organized(OrganizeReport),
}

/// What an organisation pass produced and moved.
#[derive(Debug, Default)]
pub struct OrganizeReport {
    pub final_docx: Option<PathBuf>,
    pub final_md: Option<PathBuf>,
    pub docx_pages: usize,
    pub md_pages: usize,
    pub images_moved: usize,
    pub debug_files_moved: usize,
    /// Fragments the mergers skipped as unreadable.
    pub skipped_fragments: Vec<FragmentError>,
}

impl OrganizeReport {
    /// Paths of the final merged documents that were actually written.
    pub fn outputs(&self) -> Vec<PathBuf> {
        self.final_docx
            .iter()
            .chain(self.final_md.iter())
            .cloned()
            .collect()
    }
}

/// Result of a batch sweep over a root of output directories.
#[derive(Debug, Default)]
pub struct SweepReport {
    pub organized: Vec<PathBuf>,
    pub already_organized: Vec<PathBuf>,
    pub failed: Vec<(PathBuf, ConvertError)>,
}

/// Organise one engine output directory.
///
/// Filesystem failures are fatal to this directory's pass
/// ([`ConvertError::Reorganize`]); merge failures are logged and leave that
/// artifact kind's page files in place so a later rerun can retry them.
pub fn organize_directory(
    dir: &Path,
    strategy: DocxMergeStrategy,
) -> Result<OrganizeOutcome, ConvertError> {
    if !dir.is_dir() {
        return Err(ConvertError::InputNotFound {
            path: dir.to_path_buf(),
        });
    }

    if is_organized(dir) {
        info!("{} is already organised, skipping", dir.display());
        return Ok(OrganizeOutcome::AlreadyOrganized);
    }

    let ctx = |e: std::io::Error| ConvertError::Reorganize {
        dir: dir.to_path_buf(),
        source: e,
    };

    let final_dir = dir.join("final");
    let pages_dir = dir.join("pages");
    let images_dir = dir.join("images");
    let debug_dir = dir.join("debug");
    std::fs::create_dir_all(&final_dir).map_err(ctx)?;
    std::fs::create_dir_all(&pages_dir).map_err(ctx)?;
    std::fs::create_dir_all(&images_dir).map_err(ctx)?;
    std::fs::create_dir_all(debug_dir.join("json")).map_err(ctx)?;
    std::fs::create_dir_all(debug_dir.join("tex")).map_err(ctx)?;

    // The engine names fragments after the directory, which it names after
    // the input PDF's stem.
    let base = dir
        .file_name()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();

    let mut report = OrganizeReport::default();

    // ── Word fragments ───────────────────────────────────────────────────
    let docx_pages = collect_page_artifacts(dir, &base, "docx").map_err(ctx)?;
    if !docx_pages.is_empty() {
        let inputs: Vec<PathBuf> = docx_pages.iter().map(|a| a.path.clone()).collect();
        let target = final_dir.join(format!("{base}.docx"));
        match merge::merge_docx_files(&inputs, &target, strategy) {
            Ok(merge_report) => {
                report.docx_pages = docx_pages.len();
                report.final_docx = Some(target);
                report.skipped_fragments.extend(merge_report.skipped);
                archive_pages(&docx_pages, &pages_dir, "docx").map_err(ctx)?;
            }
            Err(e) => warn!("Word merge failed for {}: {e}", dir.display()),
        }
    }

    // ── Markdown fragments ───────────────────────────────────────────────
    let md_pages = collect_page_artifacts(dir, &base, "md").map_err(ctx)?;
    if !md_pages.is_empty() {
        let inputs: Vec<PathBuf> = md_pages.iter().map(|a| a.path.clone()).collect();
        let target = final_dir.join(format!("{base}.md"));
        match merge::merge_markdown_files(&inputs, &target) {
            Ok(merge_report) => {
                report.md_pages = md_pages.len();
                report.final_md = Some(target);
                report.skipped_fragments.extend(merge_report.skipped);
                archive_pages(&md_pages, &pages_dir, "md").map_err(ctx)?;
            }
            Err(e) => warn!("Markdown merge failed for {}: {e}", dir.display()),
        }
    }

    // ── Loose debug/visualisation files ──────────────────────────────────
    report.images_moved = relocate_by_extension(dir, "png", &images_dir).map_err(ctx)?;
    report.debug_files_moved =
        relocate_by_extension(dir, "json", &debug_dir.join("json")).map_err(ctx)?;
    report.debug_files_moved +=
        relocate_by_extension(dir, "tex", &debug_dir.join("tex")).map_err(ctx)?;

    // ── Extracted-images directory ───────────────────────────────────────
    let imgs_src = dir.join("imgs");
    if imgs_src.is_dir() {
        let imgs_target = images_dir.join("extracted");
        if imgs_target.exists() {
            std::fs::remove_dir_all(&imgs_target).map_err(ctx)?;
        }
        std::fs::rename(&imgs_src, &imgs_target).map_err(ctx)?;
    }

    // No manifest when nothing merged: the directory stays retryable.
    if report.final_docx.is_some() || report.final_md.is_some() {
        write_manifest(&final_dir, &base, &report)?;
    }

    info!(
        "Organised {}: {} Word pages, {} Markdown pages",
        dir.display(),
        report.docx_pages,
        report.md_pages
    );
    Ok(OrganizeOutcome::Organized(report))
}

/// Sweep every subdirectory of `base` that looks like engine output.
///
/// Per-directory failures are recorded, not propagated — one broken output
/// directory must not block the rest of the sweep.
pub fn organize_all(
    base: &Path,
    strategy: DocxMergeStrategy,
) -> Result<SweepReport, ConvertError> {
    if !base.is_dir() {
        return Err(ConvertError::InputNotFound {
            path: base.to_path_buf(),
        });
    }

    let mut report = SweepReport::default();
    let mut candidates: Vec<PathBuf> = std::fs::read_dir(base)
        .map_err(|e| ConvertError::Reorganize {
            dir: base.to_path_buf(),
            source: e,
        })?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| p.is_dir() && (has_page_artifacts(p) || is_organized(p)))
        .collect();
    candidates.sort();

    for dir in candidates {
        match organize_directory(&dir, strategy) {
            Ok(OrganizeOutcome::Organized(_)) => report.organized.push(dir),
            Ok(OrganizeOutcome::AlreadyOrganized) => report.already_organized.push(dir),
            Err(e) => {
                warn!("Failed to organise {}: {e}", dir.display());
                report.failed.push((dir, e));
            }
        }
    }

    Ok(report)
}

// ── Internal helpers ─────────────────────────────────────────────────────

/// A directory counts as organised when `final/` holds at least one
/// non-empty merged document. The manifest alone does not count: a pass
/// whose merges all failed must stay retryable.
fn is_organized(dir: &Path) -> bool {
    let final_dir = dir.join("final");
    let Ok(entries) = std::fs::read_dir(&final_dir) else {
        return false;
    };
    entries.filter_map(|e| e.ok()).any(|e| {
        let merged = e
            .path()
            .extension()
            .and_then(|x| x.to_str())
            .is_some_and(|x| x == "docx" || x == "md");
        merged
            && e.metadata()
                .map(|m| m.is_file() && m.len() > 0)
                .unwrap_or(false)
    })
}

/// Whether `dir` contains any page-suffixed docx/md fragment.
pub fn has_page_artifacts(dir: &Path) -> bool {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return false;
    };
    entries.filter_map(|e| e.ok()).any(|e| {
        let path = e.path();
        let ext_ok = path
            .extension()
            .and_then(|x| x.to_str())
            .is_some_and(|x| x == "docx" || x == "md");
        ext_ok
            && path
                .file_stem()
                .and_then(|s| s.to_str())
                .is_some_and(|s| RE_PAGE_SUFFIX.is_match(s))
    })
}

/// Collect `{base}_{n}.{ext}` fragments in `dir`, sorted by numeric page
/// index. Enumeration order is irrelevant; only the parsed suffix counts.
fn collect_page_artifacts(
    dir: &Path,
    base: &str,
    ext: &str,
) -> std::io::Result<Vec<PageArtifact>> {
    let prefix = format!("{base}_");
    let mut artifacts = Vec::new();

    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if !path.is_file() || path.extension().and_then(|x| x.to_str()) != Some(ext) {
            continue;
        }
        let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
            continue;
        };
        if !stem.starts_with(&prefix) {
            continue;
        }
        let Some(caps) = RE_PAGE_SUFFIX.captures(stem) else {
            continue;
        };
        // Absurdly long digit runs fail the parse; not worth erroring over.
        let Ok(index) = caps[1].parse::<usize>() else {
            continue;
        };
        artifacts.push(PageArtifact { index, path });
    }

    artifacts.sort_by_key(|a| a.index);
    Ok(artifacts)
}

/// Archive page fragments as `pages/page_{n}.{ext}`, removing the originals.
fn archive_pages(
    artifacts: &[PageArtifact],
    pages_dir: &Path,
    ext: &str,
) -> std::io::Result<()> {
    for artifact in artifacts {
        let target = pages_dir.join(format!("page_{}.{ext}", artifact.index));
        std::fs::copy(&artifact.path, &target)?;
        std::fs::remove_file(&artifact.path)?;
    }
    Ok(())
}

/// Move every top-level `*.{ext}` file in `dir` into `target`; returns the
/// count moved.
fn relocate_by_extension(dir: &Path, ext: &str, target: &Path) -> std::io::Result<usize> {
    let mut moved = 0;
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_file() && path.extension().and_then(|x| x.to_str()) == Some(ext) {
            let Some(name) = path.file_name() else {
                continue;
            };
            std::fs::rename(&path, target.join(name))?;
            moved += 1;
        }
    }
    Ok(moved)
}

/// Human-readable manifest describing the organised layout.
fn write_manifest(
    final_dir: &Path,
    base: &str,
    report: &OrganizeReport,
) -> Result<(), ConvertError> {
    let timestamp = chrono::Local::now().format("%Y-%m-%d %H:%M:%S");
    let manifest = format!(
        "==============================================\n\
         \x20 {base} — conversion results\n\
         ==============================================\n\
         \n\
         final/\n\
         \x20 {base}.docx    merged Word document\n\
         \x20 {base}.md      merged Markdown document\n\
         \n\
         pages/\n\
         \x20 page_{{n}}.docx / page_{{n}}.md    one file per page\n\
         \n\
         images/\n\
         \x20 *_layout_det_res.png     layout detection overlays\n\
         \x20 *_overall_ocr_res.png    OCR result overlays\n\
         \x20 extracted/               images extracted from the PDF\n\
         \n\
         debug/\n\
         \x20 json/    raw structure data\n\
         \x20 tex/     recognised formulae\n\
         \n\
         Word pages merged:     {docx}\n\
         Markdown pages merged: {md}\n\
         \n\
         Generated: {timestamp}\n\
         ==============================================\n",
        docx = report.docx_pages,
        md = report.md_pages,
    );

    let path = final_dir.join("README.txt");
    std::fs::write(&path, manifest).map_err(|e| ConvertError::OutputWrite { path, source: e })
}
