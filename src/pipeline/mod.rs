//! Pipeline stages for PDF-to-workbook extraction.
//!
//! Each submodule implements exactly one transformation step.
//! Keeping stages separate makes each independently testable and lets us
//! swap implementations (e.g. switch the rendering backend) without touching
//! other stages.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ render ──▶ encode ──▶ infer ──▶ recover ──▶ workbook
//! (path)    (pdfium)   (PNG)      (VLM)     (JSON)      (xlsx)
//! ```
//!
//! 1. [`input`]    validates the user-supplied path as a readable PDF
//! 2. [`render`]   rasterises selected pages; runs in `spawn_blocking`
//!    because pdfium is not async-safe
//! 3. [`encode`]   PNG-encodes each rendered page for the multimodal
//!    request body
//! 4. [`infer`]    drives the VLM call with retry/backoff; the only stage
//!    with network I/O
//! 5. [`recover`]  does tolerant text-to-structure parsing of the model reply
//! 6. [`workbook`] renders structure records into styled worksheets

pub mod encode;
pub mod infer;
pub mod input;
pub mod recover;
pub mod render;
pub mod workbook;
