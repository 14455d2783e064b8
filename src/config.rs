//! Configuration types for PDF-to-Word/Markdown conversion.
//!
//! All behaviour is controlled through [`ConvertConfig`], built via its
//! [`ConvertConfigBuilder`] or loaded from a JSON config file. Keeping every
//! knob in one struct makes it trivial to share configs between the two
//! pipelines, serialise them for logging, and diff two runs to understand
//! why their outputs differ.
//!
//! # Design choice: builder over constructor
//! A ten-field constructor is unreadable and breaks on every new field.
//! The builder lets callers set only what they care about and rely on
//! documented defaults for the rest.

use crate::engine::EngineOptions;
use crate::error::ConvertError;
use crate::merge::DocxMergeStrategy;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::warn;

/// Configuration shared by the batch driver, the engines, and the
/// reorganizer.
///
/// Built via [`ConvertConfig::builder()`], [`ConvertConfig::default()`], or
/// [`ConvertConfig::from_file()`].
///
/// # Example
/// ```rust
/// use pdf2word::ConvertConfig;
///
/// let config = ConvertConfig::builder()
///     .output_dir("output")
///     .use_gpu(true)
///     .continue_on_error(false)
///     .build()
///     .unwrap();
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConvertConfig {
    /// Directory scanned for input PDFs when no explicit input is given.
    /// Default: `pdf_data`.
    pub input_dir: PathBuf,

    /// Root directory for conversion output. Each input gets a
    /// `{output_dir}/{stem}/` subdirectory. Default: `output`.
    pub output_dir: PathBuf,

    /// Options forwarded to the external engine on every invocation.
    pub engine: EngineOptions,

    /// Retry a failed conversion once with relaxed engine options. Default: true.
    ///
    /// Whether a relaxed option set exists is up to the engine: the layout
    /// engine disables lattice-table parsing (a known failure source on PDFs
    /// with partial gridlines), the structure engine offers nothing. The
    /// retry happens at most once per file.
    pub enable_fallback: bool,

    /// Keep processing remaining files after one fails. Default: true.
    ///
    /// When false, the batch stops at the first failed file; files already
    /// processed keep their reports.
    pub continue_on_error: bool,

    /// Scan the input directory recursively for `*.pdf`. Default: false.
    ///
    /// The structure pipeline scans recursively, the layout pipeline scans
    /// only the top level; each binary sets this accordingly.
    pub recursive_scan: bool,

    /// How per-page Word fragments are merged. Default: [`DocxMergeStrategy::Styled`].
    ///
    /// Selected here, once, at startup — the merge code never probes for
    /// capabilities at call time.
    pub merge_strategy: DocxMergeStrategy,

    /// Emit verbose (INFO-level) progress logging. Default: true.
    pub verbose: bool,
}

impl Default for ConvertConfig {
    fn default() -> Self {
        Self {
            input_dir: PathBuf::from("pdf_data"),
            output_dir: PathBuf::from("output"),
            engine: EngineOptions::default(),
            enable_fallback: true,
            continue_on_error: true,
            recursive_scan: false,
            merge_strategy: DocxMergeStrategy::default(),
            verbose: true,
        }
    }
}

impl ConvertConfig {
    /// Create a new builder for `ConvertConfig`.
    pub fn builder() -> ConvertConfigBuilder {
        ConvertConfigBuilder {
            config: Self::default(),
        }
    }

    /// Load configuration from a JSON file.
    ///
    /// A missing file is not an error: the defaults are returned and a
    /// warning is logged, matching how the tools behave when run from a
    /// fresh checkout. A file that exists but does not parse IS an error —
    /// silently ignoring a typo in a config the user wrote is worse than
    /// failing.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConvertError> {
        let path = path.as_ref();
        if !path.exists() {
            warn!("Config file '{}' not found, using defaults", path.display());
            return Ok(Self::default());
        }

        let raw = std::fs::read_to_string(path).map_err(|e| ConvertError::ConfigRead {
            path: path.to_path_buf(),
            source: e,
        })?;

        let file: ConfigFile =
            serde_json::from_str(&raw).map_err(|e| ConvertError::ConfigParse {
                path: path.to_path_buf(),
                detail: e.to_string(),
            })?;

        Ok(file.into())
    }
}

/// Builder for [`ConvertConfig`].
#[derive(Debug)]
pub struct ConvertConfigBuilder {
    config: ConvertConfig,
}

impl ConvertConfigBuilder {
    pub fn input_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.input_dir = dir.into();
        self
    }

    pub fn output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.output_dir = dir.into();
        self
    }

    pub fn use_gpu(mut self, v: bool) -> Self {
        self.config.engine.use_gpu = v;
        self
    }

    pub fn table_recognition(mut self, v: bool) -> Self {
        self.config.engine.table_recognition = v;
        self
    }

    pub fn lattice_tables(mut self, v: bool) -> Self {
        self.config.engine.lattice_tables = v;
        self
    }

    pub fn multiprocessing(mut self, v: bool) -> Self {
        self.config.engine.multiprocessing = v;
        self
    }

    pub fn debug(mut self, v: bool) -> Self {
        self.config.engine.debug = v;
        self
    }

    pub fn enable_fallback(mut self, v: bool) -> Self {
        self.config.enable_fallback = v;
        self
    }

    pub fn continue_on_error(mut self, v: bool) -> Self {
        self.config.continue_on_error = v;
        self
    }

    pub fn recursive_scan(mut self, v: bool) -> Self {
        self.config.recursive_scan = v;
        self
    }

    pub fn merge_strategy(mut self, strategy: DocxMergeStrategy) -> Self {
        self.config.merge_strategy = strategy;
        self
    }

    pub fn verbose(mut self, v: bool) -> Self {
        self.config.verbose = v;
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ConvertConfig, ConvertError> {
        let c = &self.config;
        if c.output_dir.as_os_str().is_empty() {
            return Err(ConvertError::InvalidConfig(
                "output_dir must not be empty".into(),
            ));
        }
        if c.input_dir.as_os_str().is_empty() {
            return Err(ConvertError::InvalidConfig(
                "input_dir must not be empty".into(),
            ));
        }
        Ok(self.config)
    }
}

// ── Config file schema ───────────────────────────────────────────────────
//
// The on-disk layout groups related keys into sections; every key is
// optional and falls back to its default.

#[derive(Debug, Default, Deserialize)]
struct ConfigFile {
    input_dir: Option<PathBuf>,
    output_dir: Option<PathBuf>,
    #[serde(default)]
    conversion: ConversionSection,
    #[serde(default)]
    debug: DebugSection,
    #[serde(default)]
    error_handling: ErrorHandlingSection,
    #[serde(default)]
    merge: MergeSection,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct ConversionSection {
    lattice_tables: bool,
    multiprocessing: bool,
    table_recognition: bool,
    use_gpu: bool,
}

impl Default for ConversionSection {
    fn default() -> Self {
        let opts = EngineOptions::default();
        Self {
            lattice_tables: opts.lattice_tables,
            multiprocessing: opts.multiprocessing,
            table_recognition: opts.table_recognition,
            use_gpu: opts.use_gpu,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct DebugSection {
    enable: bool,
    verbose: bool,
}

impl Default for DebugSection {
    fn default() -> Self {
        Self {
            enable: false,
            verbose: true,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct ErrorHandlingSection {
    enable_fallback: bool,
    continue_on_error: bool,
}

impl Default for ErrorHandlingSection {
    fn default() -> Self {
        Self {
            enable_fallback: true,
            continue_on_error: true,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct MergeSection {
    strategy: DocxMergeStrategy,
}

impl From<ConfigFile> for ConvertConfig {
    fn from(f: ConfigFile) -> Self {
        let defaults = ConvertConfig::default();
        ConvertConfig {
            input_dir: f.input_dir.unwrap_or(defaults.input_dir),
            output_dir: f.output_dir.unwrap_or(defaults.output_dir),
            engine: EngineOptions {
                use_gpu: f.conversion.use_gpu,
                table_recognition: f.conversion.table_recognition,
                lattice_tables: f.conversion.lattice_tables,
                multiprocessing: f.conversion.multiprocessing,
                debug: f.debug.enable,
            },
            enable_fallback: f.error_handling.enable_fallback,
            continue_on_error: f.error_handling.continue_on_error,
            recursive_scan: defaults.recursive_scan,
            merge_strategy: f.merge.strategy,
            verbose: f.debug.verbose,
        }
    }
}
