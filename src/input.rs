//! Input validation and PDF discovery.
//!
//! The external engines give unhelpful errors when handed a non-PDF (or
//! nothing at all), so we validate the `%PDF` magic bytes up front and fail
//! with a message that names the actual problem.

use crate::error::ConvertError;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Validate that `path` exists, is readable, and starts with the PDF magic.
pub fn validate_pdf(path: &Path) -> Result<(), ConvertError> {
    if !path.exists() {
        return Err(ConvertError::InputNotFound {
            path: path.to_path_buf(),
        });
    }

    match std::fs::File::open(path) {
        Ok(mut f) => {
            use std::io::Read;
            let mut magic = [0u8; 4];
            if f.read_exact(&mut magic).is_ok() && &magic != b"%PDF" {
                return Err(ConvertError::NotAPdf {
                    path: path.to_path_buf(),
                    magic,
                });
            }
        }
        Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
            return Err(ConvertError::PermissionDenied {
                path: path.to_path_buf(),
            });
        }
        Err(_) => {
            return Err(ConvertError::InputNotFound {
                path: path.to_path_buf(),
            });
        }
    }

    debug!("Validated PDF: {}", path.display());
    Ok(())
}

/// Find all `*.pdf` files under `dir`, sorted by path.
///
/// `recursive` controls whether subdirectories are descended into; the
/// structure pipeline scans recursively, the layout pipeline does not.
/// A missing directory is fatal. An empty result is not — the caller
/// decides whether zero inputs is worth a warning or an error.
pub fn find_pdfs(dir: &Path, recursive: bool) -> Result<Vec<PathBuf>, ConvertError> {
    if !dir.is_dir() {
        return Err(ConvertError::InputNotFound {
            path: dir.to_path_buf(),
        });
    }

    let mut pdfs = Vec::new();
    collect_pdfs(dir, recursive, &mut pdfs).map_err(|e| ConvertError::InputScan {
        dir: dir.to_path_buf(),
        source: e,
    })?;
    pdfs.sort();

    debug!("Found {} PDF files under {}", pdfs.len(), dir.display());
    Ok(pdfs)
}

fn collect_pdfs(dir: &Path, recursive: bool, out: &mut Vec<PathBuf>) -> std::io::Result<()> {
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_dir() {
            if recursive {
                collect_pdfs(&path, recursive, out)?;
            }
        } else if path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"))
        {
            out.push(path);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn validate_accepts_pdf_magic() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("doc.pdf");
        fs::write(&path, b"%PDF-1.7\n...").unwrap();
        assert!(validate_pdf(&path).is_ok());
    }

    #[test]
    fn validate_rejects_missing_file() {
        let err = validate_pdf(Path::new("/no/such/file.pdf"));
        assert!(matches!(err, Err(ConvertError::InputNotFound { .. })));
    }

    #[test]
    fn validate_rejects_wrong_magic() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("doc.pdf");
        fs::write(&path, b"PK\x03\x04zipzip").unwrap();
        assert!(matches!(
            validate_pdf(&path),
            Err(ConvertError::NotAPdf { .. })
        ));
    }

    #[test]
    fn find_pdfs_flat_skips_subdirectories() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("b.pdf"), b"%PDF").unwrap();
        fs::write(dir.path().join("a.pdf"), b"%PDF").unwrap();
        fs::write(dir.path().join("notes.txt"), b"x").unwrap();
        fs::create_dir(dir.path().join("sub")).unwrap();
        fs::write(dir.path().join("sub/c.pdf"), b"%PDF").unwrap();

        let found = find_pdfs(dir.path(), false).unwrap();
        let names: Vec<_> = found
            .iter()
            .map(|p| p.file_name().unwrap().to_str().unwrap().to_string())
            .collect();
        assert_eq!(names, vec!["a.pdf", "b.pdf"]);
    }

    #[test]
    fn find_pdfs_recursive_descends() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("x/y")).unwrap();
        fs::write(dir.path().join("x/y/deep.pdf"), b"%PDF").unwrap();
        fs::write(dir.path().join("top.PDF"), b"%PDF").unwrap();

        let found = find_pdfs(dir.path(), true).unwrap();
        assert_eq!(found.len(), 2);
    }

    #[test]
    fn find_pdfs_missing_dir_is_fatal() {
        let err = find_pdfs(Path::new("/no/such/dir"), true);
        assert!(matches!(err, Err(ConvertError::InputNotFound { .. })));
    }
}
