//! Extraction entry points: run the whole pipeline for a document.
//!
//! [`extract`] performs selection, rendering, and per-page inference and
//! returns the structured results; [`extract_to_workbook`] adds the
//! output-file precondition check and the workbook write. The per-page loop
//! lives in [`extract_pages`], which operates on already-rendered images so
//! tests and embedders can drive it with a fake [`VisionInference`].
//!
//! Pages are processed strictly sequentially in ascending page order. Each
//! page's extraction is independent, so this loop is the natural place to
//! add concurrency later; output ordering is already fixed by page number.

use crate::config::{ExtractionConfig, PageSelection};
use crate::error::{PageError, Pdf2XlsxError};
use crate::output::{ExtractionOutput, ExtractionStats, PageResult};
use crate::pipeline::infer::{self, ProviderInference, VisionInference};
use crate::pipeline::{encode, input, render, workbook};
use edgequake_llm::{LLMProvider, ProviderFactory};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Extract structure records from a PDF's selected pages.
///
/// This is the primary entry point for the library.
///
/// # Returns
/// `Ok(ExtractionOutput)` on success, even if some pages failed
/// (check `output.stats.failed_pages`).
///
/// # Errors
/// Returns `Err(Pdf2XlsxError)` only for run-fatal errors:
/// - Input missing, unreadable, or not a PDF
/// - Empty page selection
/// - Rasterisation failure (rendering is all-or-nothing per run)
/// - Every selected page failing extraction
pub async fn extract(
    input_path: impl AsRef<str>,
    config: &ExtractionConfig,
) -> Result<ExtractionOutput, Pdf2XlsxError> {
    let total_start = Instant::now();
    let input_path = input_path.as_ref();
    info!("Starting extraction: {}", input_path);

    // ── Step 1: Validate input ───────────────────────────────────────────
    let pdf_path = input::resolve_local(input_path)?;

    // ── Step 2: Resolve page selection against the page count ───────────
    // Runs before provider resolution so an empty selection surfaces as the
    // precondition failure it is, not as a missing-API-key error.
    let total_pages = render::page_count(&pdf_path, config.password.as_deref()).await?;
    info!("PDF has {} pages", total_pages);

    let selected = config.pages.resolve(total_pages);
    if selected.is_empty() {
        return Err(match &config.pages {
            PageSelection::Expression(expr) => Pdf2XlsxError::EmptySelection {
                expression: expr.clone(),
                total: total_pages,
            },
            PageSelection::All => Pdf2XlsxError::NoPagesRendered { path: pdf_path },
        });
    }
    debug!("Selected {} pages for extraction", selected.len());

    // ── Step 3: Get/create provider ──────────────────────────────────────
    let provider = resolve_provider(config)?;
    let inference = ProviderInference::new(provider, config);

    // ── Step 4: Rasterise selected pages ─────────────────────────────────
    let render_start = Instant::now();
    let images = render::render_pages(&pdf_path, config, Some(&selected)).await?;
    let render_duration_ms = render_start.elapsed().as_millis() as u64;
    if images.is_empty() {
        return Err(Pdf2XlsxError::NoPagesRendered { path: pdf_path });
    }
    info!("Rendered {} pages in {}ms", images.len(), render_duration_ms);

    // ── Step 5: Encode to PNG ────────────────────────────────────────────
    let mut encoded: BTreeMap<usize, Vec<u8>> = BTreeMap::new();
    for (page_num, image) in &images {
        let png = encode::encode_page(image).map_err(|e| Pdf2XlsxError::RasterisationFailed {
            page: *page_num,
            detail: format!("Image encoding failed: {}", e),
        })?;
        encoded.insert(*page_num, png);
    }

    // ── Step 6: Per-page inference ───────────────────────────────────────
    let infer_start = Instant::now();
    let pages = extract_pages(&encoded, &inference, config).await;
    let inference_duration_ms = infer_start.elapsed().as_millis() as u64;

    // ── Step 7: Gate on total failure and assemble stats ─────────────────
    let processed = pages.iter().filter(|p| p.is_success()).count();
    let failed = pages.len() - processed;

    if processed == 0 {
        let first_error = pages
            .iter()
            .find_map(|p| p.error.as_ref())
            .map(|e| e.to_string())
            .unwrap_or_else(|| "Unknown error".to_string());
        return Err(Pdf2XlsxError::AllPagesFailed {
            total: pages.len(),
            retries: config.max_retries,
            first_error,
        });
    }

    let stats = ExtractionStats {
        total_pages,
        processed_pages: processed,
        failed_pages: failed,
        total_input_tokens: pages.iter().map(|p| p.input_tokens).sum(),
        total_output_tokens: pages.iter().map(|p| p.output_tokens).sum(),
        total_duration_ms: total_start.elapsed().as_millis() as u64,
        render_duration_ms,
        inference_duration_ms,
    };

    info!(
        "Extraction complete: {}/{} pages, {}ms total",
        processed,
        pages.len(),
        stats.total_duration_ms
    );

    Ok(ExtractionOutput { pages, stats })
}

/// Extract a PDF and write the workbook to `output_path`.
///
/// The output precondition (file exists and overwrite not permitted) is
/// checked before any rendering or inference work starts.
pub async fn extract_to_workbook(
    input_path: impl AsRef<str>,
    output_path: impl AsRef<Path>,
    config: &ExtractionConfig,
) -> Result<ExtractionOutput, Pdf2XlsxError> {
    let output_path = output_path.as_ref();
    input::check_output(output_path, config.overwrite)?;

    let output = extract(input_path, config).await?;
    workbook::write_workbook(&output.structures(), output_path)?;
    Ok(output)
}

/// Run per-page inference over already-rendered PNG images.
///
/// Pages are processed in ascending page order. A page that exhausts its
/// retries is recorded with its error and excluded from the workbook; the
/// loop continues with the next page.
pub async fn extract_pages(
    images: &BTreeMap<usize, Vec<u8>>,
    inference: &dyn VisionInference,
    config: &ExtractionConfig,
) -> Vec<PageResult> {
    let total = images.len();
    if let Some(cb) = &config.progress_callback {
        cb.on_run_start(total);
    }

    let mut results = Vec::with_capacity(total);

    for (&page_num, png) in images {
        if let Some(cb) = &config.progress_callback {
            cb.on_page_start(page_num, total);
        }
        info!("Processing page {}...", page_num);
        let page_start = Instant::now();

        let result = match infer::extract_structure(inference, page_num, png, config).await {
            Ok(page) => {
                if let Some(cb) = &config.progress_callback {
                    cb.on_page_complete(page_num, total, page.retries);
                }
                PageResult {
                    page_num,
                    structure: Some(page.structure),
                    input_tokens: page.input_tokens,
                    output_tokens: page.output_tokens,
                    duration_ms: page_start.elapsed().as_millis() as u64,
                    retries: page.retries,
                    error: None,
                }
            }
            Err(e) => {
                warn!("Failed to extract page {}: {}", page_num, e);
                if let Some(cb) = &config.progress_callback {
                    cb.on_page_error(page_num, total, &e.to_string());
                }
                PageResult {
                    page_num,
                    structure: None,
                    input_tokens: 0,
                    output_tokens: 0,
                    duration_ms: page_start.elapsed().as_millis() as u64,
                    retries: config.max_retries,
                    error: Some(PageError::ExtractFailed {
                        page: page_num,
                        retries: config.max_retries,
                        detail: e.to_string(),
                    }),
                }
            }
        };
        results.push(result);
    }

    if let Some(cb) = &config.progress_callback {
        let processed = results.iter().filter(|p| p.is_success()).count();
        cb.on_run_complete(total, processed);
    }

    results
}

// ── Internal helpers ─────────────────────────────────────────────────────

/// Instantiate a named provider with the given model.
fn create_vision_provider(
    provider_name: &str,
    model: &str,
) -> Result<Arc<dyn LLMProvider>, Pdf2XlsxError> {
    ProviderFactory::create_llm_provider(provider_name, model).map_err(|e| {
        Pdf2XlsxError::ProviderNotConfigured {
            provider: provider_name.to_string(),
            hint: format!("{e}"),
        }
    })
}

/// Resolve the LLM provider, from most-specific to least-specific.
///
/// 1. **Pre-built provider** (`config.provider`): the caller constructed
///    and configured the provider entirely; used as-is. This is the hook
///    for tests and for hosts that need custom middleware.
///
/// 2. **Named provider + model** (`config.provider_name`): the factory
///    reads the corresponding API key (`OPENAI_API_KEY`, etc.) from the
///    environment.
///
/// 3. **OpenAI preference**: when `OPENAI_API_KEY` is set, default to
///    OpenAI so users with several provider keys get a deterministic choice.
///
/// 4. **Full auto-detection** (`ProviderFactory::from_env`): the factory
///    scans all known API key variables and picks the first available
///    provider.
fn resolve_provider(config: &ExtractionConfig) -> Result<Arc<dyn LLMProvider>, Pdf2XlsxError> {
    // 1) User-provided provider takes priority
    if let Some(ref provider) = config.provider {
        return Ok(Arc::clone(provider));
    }

    let default_model = config.model.as_deref().unwrap_or("gpt-4o-mini");

    // 2) Provider name + model
    if let Some(ref name) = config.provider_name {
        return create_vision_provider(name, default_model);
    }

    // 3) Prefer OpenAI explicitly when an OpenAI API key is present.
    if let Ok(openai_key) = std::env::var("OPENAI_API_KEY") {
        if !openai_key.is_empty() {
            return create_vision_provider("openai", default_model);
        }
    }

    // 4) Auto-detect from environment
    let (llm_provider, _embedding) =
        ProviderFactory::from_env().map_err(|e| Pdf2XlsxError::ProviderNotConfigured {
            provider: "auto".to_string(),
            hint: format!(
                "No LLM provider could be auto-detected from environment.\n\
                Set OPENAI_API_KEY, ANTHROPIC_API_KEY, or configure a provider.\n\
                Error: {}",
                e
            ),
        })?;

    Ok(llm_provider)
}
