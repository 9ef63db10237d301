//! # pdf2xlsx
//!
//! Convert PDF pages into structured Excel workbooks using Vision Language
//! Models (VLMs).
//!
//! ## Why this crate?
//!
//! Traditional PDF table extractors depend on embedded text and line
//! geometry, which scanned or visually complex pages rarely provide. This
//! crate rasterises each page into a PNG and lets a VLM read it as a human
//! would, returning the page's headings, paragraphs, and tables as JSON that
//! is then laid out as one styled worksheet per page.
//!
//! ## Pipeline Overview
//!
//! ```text
//! PDF
//!  │
//!  ├─ 1. Select  resolve the page-range expression against the page count
//!  ├─ 2. Render  rasterise pages via pdfium (CPU-bound, spawn_blocking)
//!  ├─ 3. Encode  page image → PNG bytes
//!  ├─ 4. Infer   sequential VLM calls with retry/backoff
//!  ├─ 5. Recover tolerant JSON parsing of each reply
//!  └─ 6. Write   one styled sheet per page via rust_xlsxwriter
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use pdf2xlsx::{extract_to_workbook, ExtractionConfig, PageSelection};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Provider auto-detected from OPENAI_API_KEY / ANTHROPIC_API_KEY / …
//!     let config = ExtractionConfig::builder()
//!         .pages(PageSelection::Expression("1,3,5-8".into()))
//!         .build()?;
//!     let output = extract_to_workbook("document.pdf", "document.xlsx", &config).await?;
//!     eprintln!(
//!         "{}/{} pages extracted",
//!         output.stats.processed_pages,
//!         output.stats.processed_pages + output.stats.failed_pages
//!     );
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `pdf2xlsx` binary (clap + anyhow + indicatif + tracing-subscriber) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! pdf2xlsx = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod convert;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod prompts;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{ExtractionConfig, ExtractionConfigBuilder, PageSelection};
pub use convert::{extract, extract_pages, extract_to_workbook};
pub use error::{PageError, Pdf2XlsxError};
pub use output::{
    ExtractionOutput, ExtractionStats, Heading, PageResult, PageStructure, TableBlock,
};
pub use pipeline::infer::{
    ExtractedPage, InferenceError, InferenceReply, ProviderInference, VisionInference,
};
pub use pipeline::recover::recover_structure;
pub use pipeline::workbook::write_workbook;
pub use progress::{ExtractionProgressCallback, ProgressCallback};
