//! Configuration types for PDF-to-workbook extraction.
//!
//! All run behaviour is controlled through [`ExtractionConfig`], built via
//! its [`ExtractionConfigBuilder`]. Keeping every knob in one struct makes it
//! trivial to share configs, log them, and diff two runs to understand why
//! their outputs differ.
//!
//! # Design choice: builder over constructor
//! A dozen-field constructor is unreadable and breaks on every new field.
//! The builder pattern lets callers set only what they care about and rely on
//! well-documented defaults for the rest.

use crate::error::Pdf2XlsxError;
use crate::progress::ProgressCallback;
use edgequake_llm::LLMProvider;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Configuration for a PDF-to-workbook extraction run.
///
/// Built via [`ExtractionConfig::builder()`] or using
/// [`ExtractionConfig::default()`].
///
/// # Example
/// ```rust
/// use pdf2xlsx::{ExtractionConfig, PageSelection};
///
/// let config = ExtractionConfig::builder()
///     .dpi(150)
///     .model("gpt-4o-mini")
///     .pages(PageSelection::Expression("1,3,5-8".into()))
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct ExtractionConfig {
    /// Rendering DPI used when rasterising each PDF page. Range: 72–400. Default: 200.
    ///
    /// 150–250 is the typical window: text stays sharp enough for a VLM to
    /// read reliably while image payloads stay well below API upload limits.
    pub dpi: u32,

    /// Maximum rendered image dimension (width or height) in pixels. Default: 2000.
    ///
    /// A safety cap independent of DPI. A 200-DPI render of an A0 poster
    /// would produce a five-figure pixel edge and exhaust memory; this caps
    /// either dimension, scaling the other proportionally.
    pub max_rendered_pixels: u32,

    /// LLM model identifier, e.g. "gpt-4o-mini", "claude-sonnet-4-20250514".
    /// If None, uses the provider default.
    pub model: Option<String>,

    /// LLM provider name (e.g. "openai", "anthropic", "ollama").
    /// If None along with `provider`, the provider is auto-detected from the
    /// environment.
    pub provider_name: Option<String>,

    /// Pre-constructed LLM provider. Takes precedence over `provider_name`.
    ///
    /// Injecting the provider here keeps the extractor testable with stubs
    /// and lets hosts add middleware (caching, rate limiting).
    pub provider: Option<Arc<dyn LLMProvider>>,

    /// Sampling temperature for the completion. Default: 0.2.
    ///
    /// Low temperature keeps the model faithful to what it sees on the page,
    /// which is what structure transcription needs.
    pub temperature: f32,

    /// Maximum tokens the model may generate per page. Default: 4096.
    pub max_tokens: usize,

    /// Total inference attempts per page, counting the first. Default: 3.
    ///
    /// Transport and API errors are retried; parse trouble is not, because
    /// response recovery always yields a usable record.
    pub max_retries: u32,

    /// Base retry delay in milliseconds (exponential backoff). Default: 2000.
    ///
    /// The wait after failed attempt `i` (zero-indexed) is
    /// `retry_backoff_ms * 2^i`: 2 s, then 4 s with the defaults.
    pub retry_backoff_ms: u64,

    /// PDF user password for encrypted documents.
    pub password: Option<String>,

    /// Custom system prompt. If None, uses the built-in default.
    pub system_prompt: Option<String>,

    /// Page selection. Default: all pages.
    pub pages: PageSelection,

    /// Replace the output file when it already exists. Default: false.
    pub overwrite: bool,

    /// Optional per-page progress observer.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            dpi: 200,
            max_rendered_pixels: 2000,
            model: None,
            provider_name: None,
            provider: None,
            temperature: 0.2,
            max_tokens: 4096,
            max_retries: 3,
            retry_backoff_ms: 2000,
            password: None,
            system_prompt: None,
            pages: PageSelection::default(),
            overwrite: false,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for ExtractionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExtractionConfig")
            .field("dpi", &self.dpi)
            .field("max_rendered_pixels", &self.max_rendered_pixels)
            .field("model", &self.model)
            .field("provider_name", &self.provider_name)
            .field("provider", &self.provider.as_ref().map(|_| "<dyn LLMProvider>"))
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("max_retries", &self.max_retries)
            .field("retry_backoff_ms", &self.retry_backoff_ms)
            .field("pages", &self.pages)
            .field("overwrite", &self.overwrite)
            .finish()
    }
}

impl ExtractionConfig {
    /// Create a new builder for `ExtractionConfig`.
    pub fn builder() -> ExtractionConfigBuilder {
        ExtractionConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`ExtractionConfig`].
#[derive(Debug)]
pub struct ExtractionConfigBuilder {
    config: ExtractionConfig,
}

impl ExtractionConfigBuilder {
    pub fn dpi(mut self, dpi: u32) -> Self {
        self.config.dpi = dpi.clamp(72, 400);
        self
    }

    pub fn max_rendered_pixels(mut self, px: u32) -> Self {
        self.config.max_rendered_pixels = px.max(100);
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = Some(model.into());
        self
    }

    pub fn provider_name(mut self, name: impl Into<String>) -> Self {
        self.config.provider_name = Some(name.into());
        self
    }

    pub fn provider(mut self, provider: Arc<dyn LLMProvider>) -> Self {
        self.config.provider = Some(provider);
        self
    }

    pub fn temperature(mut self, t: f32) -> Self {
        self.config.temperature = t.clamp(0.0, 2.0);
        self
    }

    pub fn max_tokens(mut self, n: usize) -> Self {
        self.config.max_tokens = n;
        self
    }

    pub fn max_retries(mut self, n: u32) -> Self {
        self.config.max_retries = n.max(1);
        self
    }

    pub fn retry_backoff_ms(mut self, ms: u64) -> Self {
        self.config.retry_backoff_ms = ms;
        self
    }

    pub fn password(mut self, pwd: impl Into<String>) -> Self {
        self.config.password = Some(pwd.into());
        self
    }

    pub fn system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.config.system_prompt = Some(prompt.into());
        self
    }

    pub fn pages(mut self, selection: PageSelection) -> Self {
        self.config.pages = selection;
        self
    }

    pub fn overwrite(mut self, v: bool) -> Self {
        self.config.overwrite = v;
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ExtractionConfig, Pdf2XlsxError> {
        let c = &self.config;
        if c.dpi < 72 || c.dpi > 400 {
            return Err(Pdf2XlsxError::InvalidConfig(format!(
                "DPI must be 72-400, got {}",
                c.dpi
            )));
        }
        if c.max_retries == 0 {
            return Err(Pdf2XlsxError::InvalidConfig(
                "max_retries must be >= 1".into(),
            ));
        }
        Ok(self.config)
    }
}

// ── Page selection ───────────────────────────────────────────────────────

/// Specifies which pages of the PDF to process.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub enum PageSelection {
    /// Process all pages (default).
    #[default]
    All,
    /// Process the pages named by a range expression such as `"1,3,5-8"`.
    ///
    /// Tokens are comma-separated; each is a single page number or a
    /// `start-end` pair. Resolution is lenient: whitespace is trimmed, empty
    /// tokens are skipped, inverted ranges are swapped, and tokens that do
    /// not parse are silently dropped.
    Expression(String),
}

impl PageSelection {
    /// Whether this selection covers the whole document.
    pub fn is_all(&self) -> bool {
        matches!(self, PageSelection::All)
    }

    /// Expand the selection into an ascending, duplicate-free list of
    /// 1-indexed page numbers, all within `[1, total_pages]`.
    ///
    /// An expression that yields nothing returns an empty list; the caller
    /// decides whether that is fatal (see
    /// [`crate::error::Pdf2XlsxError::EmptySelection`]).
    pub fn resolve(&self, total_pages: usize) -> Vec<usize> {
        match self {
            PageSelection::All => (1..=total_pages).collect(),
            PageSelection::Expression(expr) => expand_expression(expr, total_pages),
        }
    }
}

/// Expand a range expression into concrete page numbers.
fn expand_expression(expr: &str, total_pages: usize) -> Vec<usize> {
    let mut selected: Vec<usize> = Vec::new();
    for token in expr.split(',') {
        let token = token.trim();
        if token.is_empty() {
            continue;
        }
        if let Some((start, end)) = parse_token(token) {
            selected.extend(start..=end);
        }
    }
    selected.retain(|&p| p >= 1 && p <= total_pages);
    selected.sort_unstable();
    selected.dedup();
    selected
}

/// Parse one token into an inclusive `(start, end)` range.
///
/// This is the single place where malformed input is dropped; tightening the
/// leniency (e.g. reporting bad tokens) only touches this function.
fn parse_token(token: &str) -> Option<(usize, usize)> {
    if let Some((start_s, end_s)) = token.split_once('-') {
        let start: usize = start_s.trim().parse().ok()?;
        let end: usize = end_s.trim().parse().ok()?;
        if start > end {
            Some((end, start))
        } else {
            Some((start, end))
        }
    } else {
        let page: usize = token.parse().ok()?;
        Some((page, page))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn expr(s: &str) -> PageSelection {
        PageSelection::Expression(s.to_string())
    }

    #[test]
    fn all_selects_every_page() {
        assert_eq!(PageSelection::All.resolve(4), vec![1, 2, 3, 4]);
        assert_eq!(PageSelection::All.resolve(0), Vec::<usize>::new());
    }

    #[test]
    fn single_and_list() {
        assert_eq!(expr("2").resolve(10), vec![2]);
        assert_eq!(expr("1,3,5").resolve(10), vec![1, 3, 5]);
    }

    #[test]
    fn inverted_range_is_swapped() {
        assert_eq!(expr("3-1").resolve(10), vec![1, 2, 3]);
    }

    #[test]
    fn out_of_range_pages_are_dropped() {
        assert_eq!(expr("1,3,5-8,99").resolve(10), vec![1, 3, 5, 6, 7, 8]);
    }

    #[test]
    fn malformed_tokens_are_dropped_silently() {
        assert_eq!(expr("abc,2").resolve(10), vec![2]);
        assert_eq!(expr("1-x,4").resolve(10), vec![4]);
        assert_eq!(expr("x-3,4").resolve(10), vec![4]);
        assert_eq!(expr("1-2-3,4").resolve(10), vec![4]);
    }

    #[test]
    fn whitespace_and_empty_tokens_are_ignored() {
        assert_eq!(expr(" 1 , , 3 - 5 ,").resolve(10), vec![1, 3, 4, 5]);
    }

    #[test]
    fn duplicates_are_removed() {
        assert_eq!(expr("3,1-4,3").resolve(10), vec![1, 2, 3, 4]);
    }

    #[test]
    fn zero_clamps_out() {
        assert_eq!(expr("0-3").resolve(10), vec![1, 2, 3]);
        assert_eq!(expr("0").resolve(10), Vec::<usize>::new());
    }

    #[test]
    fn fully_invalid_expression_yields_empty() {
        assert_eq!(expr("abc,,x-y").resolve(10), Vec::<usize>::new());
        assert_eq!(expr("99").resolve(10), Vec::<usize>::new());
    }

    #[test]
    fn result_is_always_ascending_dedup_in_range() {
        let cases = ["8-2,5,5,1", "10,9,8", "2-2,2", "1-10"];
        for c in cases {
            let out = expr(c).resolve(10);
            let mut sorted = out.clone();
            sorted.sort_unstable();
            sorted.dedup();
            assert_eq!(out, sorted, "{c}");
            assert!(out.iter().all(|&p| (1..=10).contains(&p)), "{c}");
        }
    }

    #[test]
    fn builder_clamps_and_validates() {
        let c = ExtractionConfig::builder()
            .dpi(9999)
            .max_retries(0)
            .temperature(5.0)
            .build()
            .unwrap();
        assert_eq!(c.dpi, 400);
        assert_eq!(c.max_retries, 1);
        assert!((c.temperature - 2.0).abs() < f32::EPSILON);
    }

    #[test]
    fn defaults_match_documented_values() {
        let c = ExtractionConfig::default();
        assert_eq!(c.dpi, 200);
        assert_eq!(c.max_retries, 3);
        assert_eq!(c.retry_backoff_ms, 2000);
        assert!((c.temperature - 0.2).abs() < f32::EPSILON);
        assert!(c.pages.is_all());
        assert!(!c.overwrite);
    }
}
