//! Progress-callback trait for per-page extraction events.
//!
//! Inject an [`Arc<dyn ExtractionProgressCallback>`] via
//! [`crate::config::ExtractionConfigBuilder::progress_callback`] to receive
//! events as the pipeline processes each page.
//!
//! # Why callbacks instead of channels?
//!
//! The callback approach is the least-invasive integration point: callers can
//! forward events to a channel, a WebSocket, a database record, or a terminal
//! progress bar without the library knowing anything about how the host
//! application communicates. The trait is `Send + Sync` so a future
//! concurrent page loop would not need an API change.

use std::sync::Arc;

/// Shared handle to a progress observer.
pub type ProgressCallback = Arc<dyn ExtractionProgressCallback>;

/// Called by the extraction pipeline as it processes each page.
///
/// All methods have default no-op implementations so callers only override
/// what they care about. Pages are processed sequentially in ascending page
/// order, so events for one page never interleave with another's.
pub trait ExtractionProgressCallback: Send + Sync {
    /// Called once before any page is sent to the model.
    ///
    /// # Arguments
    /// * `total_pages`: number of pages that will be processed
    fn on_run_start(&self, total_pages: usize) {
        let _ = total_pages;
    }

    /// Called just before the inference request is sent for a page.
    fn on_page_start(&self, page_num: usize, total_pages: usize) {
        let _ = (page_num, total_pages);
    }

    /// Called when a page produced a structure record.
    ///
    /// `retries` is the number of failed attempts before the success.
    fn on_page_complete(&self, page_num: usize, total_pages: usize, retries: u32) {
        let _ = (page_num, total_pages, retries);
    }

    /// Called when a page exhausted its retries and will be skipped.
    fn on_page_error(&self, page_num: usize, total_pages: usize, error: &str) {
        let _ = (page_num, total_pages, error);
    }

    /// Called once after the last page, before the workbook is written.
    fn on_run_complete(&self, total_pages: usize, success_count: usize) {
        let _ = (total_pages, success_count);
    }
}
