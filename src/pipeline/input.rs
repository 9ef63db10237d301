//! Input validation: check the user-supplied path is a readable PDF.
//!
//! We validate the PDF magic bytes (`%PDF`) before handing the path to
//! pdfium so callers get a meaningful error rather than a cryptic engine
//! failure. This is the cheapest of the precondition checks and runs before
//! any rendering or inference work.

use crate::error::Pdf2XlsxError;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Resolve a local file path, validating existence and PDF magic bytes.
pub fn resolve_local(path_str: &str) -> Result<PathBuf, Pdf2XlsxError> {
    let path = PathBuf::from(path_str);

    if !path.exists() {
        return Err(Pdf2XlsxError::FileNotFound { path });
    }

    // Check read permission by attempting to open
    match std::fs::File::open(&path) {
        Ok(mut f) => {
            use std::io::Read;
            let mut magic = [0u8; 4];
            if f.read_exact(&mut magic).is_ok() && &magic != b"%PDF" {
                return Err(Pdf2XlsxError::NotAPdf { path, magic });
            }
        }
        Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
            return Err(Pdf2XlsxError::PermissionDenied { path });
        }
        Err(_) => {
            return Err(Pdf2XlsxError::FileNotFound { path });
        }
    }

    debug!("Resolved local PDF: {}", path.display());
    Ok(path)
}

/// Check the output path against the overwrite policy.
///
/// Runs before any expensive work so a forgotten `--overwrite` fails in
/// milliseconds, not after a full inference pass.
pub fn check_output(path: &Path, overwrite: bool) -> Result<(), Pdf2XlsxError> {
    if path.exists() && !overwrite {
        return Err(Pdf2XlsxError::OutputExists {
            path: path.to_path_buf(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn missing_file_is_precondition() {
        let err = resolve_local("/definitely/not/here.pdf").unwrap_err();
        assert!(matches!(err, Pdf2XlsxError::FileNotFound { .. }));
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn non_pdf_magic_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fake.pdf");
        std::fs::File::create(&path)
            .unwrap()
            .write_all(b"PK\x03\x04 not a pdf")
            .unwrap();
        let err = resolve_local(path.to_str().unwrap()).unwrap_err();
        assert!(matches!(err, Pdf2XlsxError::NotAPdf { .. }));
    }

    #[test]
    fn pdf_magic_is_accepted() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ok.pdf");
        std::fs::File::create(&path)
            .unwrap()
            .write_all(b"%PDF-1.7\n")
            .unwrap();
        assert!(resolve_local(path.to_str().unwrap()).is_ok());
    }

    #[test]
    fn existing_output_requires_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.xlsx");
        std::fs::File::create(&path).unwrap();

        let err = check_output(&path, false).unwrap_err();
        assert!(matches!(err, Pdf2XlsxError::OutputExists { .. }));
        assert_eq!(err.exit_code(), 2);

        assert!(check_output(&path, true).is_ok());
        assert!(check_output(&dir.path().join("fresh.xlsx"), false).is_ok());
    }
}
