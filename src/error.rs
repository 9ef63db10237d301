//! Error types for the pdf2xlsx library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`Pdf2XlsxError`] is **fatal**: the run cannot proceed at all (bad input
//!   file, output already present, rasterisation failure, no provider).
//!   Returned as `Err(Pdf2XlsxError)` from the top-level `extract*` functions.
//!
//! * [`PageError`] is **non-fatal**: a single page failed after exhausting its
//!   retries but all other pages are fine. Stored inside
//!   [`crate::output::PageResult`] so the run continues and the workbook
//!   simply omits that sheet.
//!
//! The separation lets callers decide their own tolerance: abort on the first
//! page failure, log and continue, or collect all errors for a post-run report.

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the pdf2xlsx library.
///
/// Page-level failures use [`PageError`] and are stored in
/// [`crate::output::PageResult`] rather than propagated here.
#[derive(Debug, Error)]
pub enum Pdf2XlsxError {
    // ── Precondition errors ───────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("PDF file not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The file exists and was read, but is not a PDF.
    #[error("File is not a valid PDF: '{path}'\nFirst bytes: {magic:?}")]
    NotAPdf { path: PathBuf, magic: [u8; 4] },

    /// Output file already exists and overwriting was not permitted.
    #[error("Output file already exists: '{path}'\nPass --overwrite to replace it.")]
    OutputExists { path: PathBuf },

    /// The page expression resolved to zero pages within the document.
    #[error("No valid pages selected by '{expression}' (document has {total} pages)")]
    EmptySelection { expression: String, total: usize },

    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── PDF errors ────────────────────────────────────────────────────────
    /// PDF header/trailer/xref is corrupt and cannot be parsed.
    #[error("PDF '{path}' is corrupt: {detail}")]
    CorruptPdf { path: PathBuf, detail: String },

    /// PDF requires a password but none was provided.
    #[error("PDF '{path}' is encrypted and requires a password.\nProvide it with --password <PASSWORD>.")]
    PasswordRequired { path: PathBuf },

    /// A password was provided but it is wrong.
    #[error("Wrong password for PDF '{path}'")]
    WrongPassword { path: PathBuf },

    /// pdfium-render returned an error for a specific page.
    #[error("Rasterisation failed for page {page}: {detail}")]
    RasterisationFailed { page: usize, detail: String },

    /// The document produced no page images at all.
    #[error("No pages rendered from '{path}'")]
    NoPagesRendered { path: PathBuf },

    // ── Inference errors ──────────────────────────────────────────────────
    /// The configured provider is not initialised (missing API key etc.).
    #[error("LLM provider '{provider}' is not configured.\n{hint}")]
    ProviderNotConfigured { provider: String, hint: String },

    /// Every page failed after all retries; the workbook would be empty.
    #[error("All {total} pages failed after {retries} retries each.\nFirst error: {first_error}")]
    AllPagesFailed {
        total: usize,
        retries: u32,
        first_error: String,
    },

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not create or write the output workbook.
    #[error("Failed to write workbook '{path}': {detail}")]
    OutputWriteFailed { path: PathBuf, detail: String },

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Pdf2XlsxError {
    /// Whether this error is a precondition failure: detectable before any
    /// rendering or inference work starts.
    pub fn is_precondition(&self) -> bool {
        matches!(
            self,
            Pdf2XlsxError::FileNotFound { .. }
                | Pdf2XlsxError::PermissionDenied { .. }
                | Pdf2XlsxError::NotAPdf { .. }
                | Pdf2XlsxError::OutputExists { .. }
                | Pdf2XlsxError::EmptySelection { .. }
                | Pdf2XlsxError::InvalidConfig(_)
        )
    }

    /// Process exit status for the CLI: 2 for precondition failures,
    /// 1 for everything that fails mid-pipeline.
    pub fn exit_code(&self) -> u8 {
        if self.is_precondition() {
            2
        } else {
            1
        }
    }
}

/// A non-fatal error for a single page.
///
/// Stored alongside [`crate::output::PageResult`] when a page fails.
/// The overall run continues unless ALL pages fail.
#[derive(Debug, Clone, Error, serde::Serialize, serde::Deserialize)]
pub enum PageError {
    /// Vision inference failed after retries.
    #[error("Page {page}: extraction failed after {retries} attempts: {detail}")]
    ExtractFailed {
        page: usize,
        retries: u32,
        detail: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_selection_display() {
        let e = Pdf2XlsxError::EmptySelection {
            expression: "90-99".into(),
            total: 10,
        };
        let msg = e.to_string();
        assert!(msg.contains("90-99"), "got: {msg}");
        assert!(msg.contains("10 pages"), "got: {msg}");
    }

    #[test]
    fn precondition_errors_exit_2() {
        let errs = [
            Pdf2XlsxError::FileNotFound {
                path: "a.pdf".into(),
            },
            Pdf2XlsxError::OutputExists {
                path: "out.xlsx".into(),
            },
            Pdf2XlsxError::EmptySelection {
                expression: "abc".into(),
                total: 3,
            },
            Pdf2XlsxError::InvalidConfig("dpi".into()),
        ];
        for e in errs {
            assert_eq!(e.exit_code(), 2, "{e}");
        }
    }

    #[test]
    fn pipeline_errors_exit_1() {
        let errs = [
            Pdf2XlsxError::RasterisationFailed {
                page: 3,
                detail: "bad page".into(),
            },
            Pdf2XlsxError::AllPagesFailed {
                total: 4,
                retries: 3,
                first_error: "timeout".into(),
            },
            Pdf2XlsxError::OutputWriteFailed {
                path: "out.xlsx".into(),
                detail: "disk full".into(),
            },
        ];
        for e in errs {
            assert_eq!(e.exit_code(), 1, "{e}");
        }
    }

    #[test]
    fn all_pages_failed_display() {
        let e = Pdf2XlsxError::AllPagesFailed {
            total: 5,
            retries: 3,
            first_error: "HTTP 500".into(),
        };
        let msg = e.to_string();
        assert!(msg.contains("5 pages"), "got: {msg}");
        assert!(msg.contains("HTTP 500"), "got: {msg}");
    }

    #[test]
    fn page_error_display() {
        let e = PageError::ExtractFailed {
            page: 7,
            retries: 3,
            detail: "connection reset".into(),
        };
        assert!(e.to_string().contains("Page 7"));
        assert!(e.to_string().contains("3 attempts"));
    }
}
