//! Page-fragment merging.
//!
//! Each submodule merges one artifact kind:
//!
//! 1. [`docx`]     — Word fragments, composed into a single document with a
//!    page break between pages
//! 2. [`markdown`] — Markdown fragments, concatenated with a visible
//!    separator and page heading
//!
//! Both mergers share the same failure contract: an unreadable fragment is
//! skipped, logged, and recorded in [`MergeReport::skipped`] — the merge
//! call itself only fails when there is nothing at all to write.

pub mod docx;
pub mod markdown;

pub use docx::merge_docx_files;
pub use markdown::merge_markdown_files;

use crate::error::FragmentError;
use serde::{Deserialize, Serialize};

/// How Word fragments are combined.
///
/// The strategy is picked once at startup (from config) rather than probed
/// per call, so a run is either entirely style-aware or entirely raw and
/// the two cannot interleave within one document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocxMergeStrategy {
    /// Style-aware composition: body content is appended AND each source's
    /// style/numbering definitions are folded into the master (first id
    /// wins), so style references in appended pages stay resolvable. (default)
    #[default]
    Styled,
    /// Raw body-node copy-append. Style-id collisions across source
    /// documents are possible; pages referencing styles the master lacks
    /// render with defaults. A deliberate lower-fidelity mode, kept for
    /// documents whose style parts fail to parse.
    Raw,
}

/// Outcome of one merge call.
#[derive(Debug, Clone, Default, Serialize)]
pub struct MergeReport {
    /// Fragments successfully folded into the output.
    pub merged: usize,
    /// Fragments skipped because they could not be read; one entry per
    /// skipped fragment, in input order.
    pub skipped: Vec<FragmentError>,
}
