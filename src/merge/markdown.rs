//! Markdown page-fragment merger.
//!
//! Plain concatenation in page order, with a horizontal rule and a page
//! heading before every fragment beyond the first. The heading text (第 N 页,
//! "page N") matches what the upstream OCR toolchain emits elsewhere in its
//! own output, so merged documents read consistently.

use crate::error::{ConvertError, FragmentError};
use crate::merge::MergeReport;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Separator + heading inserted before the fragment at 1-indexed `ordinal`.
fn page_heading(ordinal: usize) -> String {
    format!("\n\n---\n\n# 第 {ordinal} 页\n\n")
}

/// Merge `inputs` (in the given order) into a single Markdown file.
///
/// The page number in each heading is the fragment's 1-indexed position in
/// `inputs` — a skipped fragment does not renumber the pages after it.
///
/// Unreadable fragments are skipped and recorded; the call fails only when
/// `inputs` is empty, nothing at all was readable, or the output cannot be
/// written.
pub fn merge_markdown_files(
    inputs: &[PathBuf],
    output: &Path,
) -> Result<MergeReport, ConvertError> {
    if inputs.is_empty() {
        return Err(ConvertError::EmptyMerge {
            output: output.to_path_buf(),
        });
    }

    let mut assembled = String::new();
    let mut merged = 0usize;
    let mut skipped = Vec::new();

    for (i, path) in inputs.iter().enumerate() {
        match std::fs::read_to_string(path) {
            Ok(content) => {
                if i > 0 {
                    assembled.push_str(&page_heading(i + 1));
                }
                assembled.push_str(&content);
                merged += 1;
            }
            Err(e) => {
                let err = FragmentError::ReadFailed {
                    path: path.to_path_buf(),
                    detail: e.to_string(),
                };
                warn!("Skipping Markdown fragment: {err}");
                skipped.push(err);
            }
        }
    }

    if merged == 0 {
        return Err(ConvertError::AllFragmentsUnreadable {
            output: output.to_path_buf(),
            total: inputs.len(),
        });
    }

    std::fs::write(output, &assembled).map_err(|e| ConvertError::OutputWrite {
        path: output.to_path_buf(),
        source: e,
    })?;

    debug!(
        "Merged {merged}/{} Markdown fragments into {}",
        inputs.len(),
        output.display()
    );
    Ok(MergeReport { merged, skipped })
}
