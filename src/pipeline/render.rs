//! PDF rasterisation: render selected pages to `DynamicImage` via pdfium.
//!
//! ## Why spawn_blocking?
//!
//! The `pdfium-render` crate wraps the pdfium C++ library, which uses
//! thread-local state internally and is not safe to call from async contexts.
//! `tokio::task::spawn_blocking` moves the work onto a dedicated thread pool
//! thread designed for blocking operations, preventing the Tokio worker
//! threads from stalling during CPU-heavy rendering.
//!
//! ## Sizing
//!
//! The target pixel width is derived from the page's physical width and the
//! configured DPI (points are 1/72 inch), then capped by
//! `max_rendered_pixels` so an oversized page cannot exhaust memory.

use crate::config::ExtractionConfig;
use crate::error::Pdf2XlsxError;
use image::DynamicImage;
use pdfium_render::prelude::*;
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{debug, info, warn};

/// Read the document's page count without rasterising anything.
///
/// Lets the page selection resolve before any expensive rendering starts.
pub async fn page_count(
    pdf_path: &Path,
    password: Option<&str>,
) -> Result<usize, Pdf2XlsxError> {
    let path = pdf_path.to_path_buf();
    let pwd = password.map(|s| s.to_string());

    tokio::task::spawn_blocking(move || {
        let pdfium = Pdfium::default();
        let document = load_document(&pdfium, &path, pwd.as_deref())?;
        Ok(document.pages().len() as usize)
    })
    .await
    .map_err(|e| Pdf2XlsxError::Internal(format!("Page-count task panicked: {}", e)))?
}

/// Rasterise pages of a PDF into images keyed by 1-indexed page number.
///
/// `pages = None` renders every page. An explicitly empty request yields an
/// empty map, not an error. Page numbers outside the document are skipped.
///
/// This runs inside `spawn_blocking` since pdfium operations are CPU-bound.
pub async fn render_pages(
    pdf_path: &Path,
    config: &ExtractionConfig,
    pages: Option<&[usize]>,
) -> Result<BTreeMap<usize, DynamicImage>, Pdf2XlsxError> {
    let path = pdf_path.to_path_buf();
    let dpi = config.dpi;
    let max_pixels = config.max_rendered_pixels;
    let password = config.password.clone();
    let requested = pages.map(|p| p.to_vec());

    tokio::task::spawn_blocking(move || {
        render_pages_blocking(&path, dpi, max_pixels, password.as_deref(), requested.as_deref())
    })
    .await
    .map_err(|e| Pdf2XlsxError::Internal(format!("Render task panicked: {}", e)))?
}

/// Blocking implementation of page rendering.
fn render_pages_blocking(
    pdf_path: &Path,
    dpi: u32,
    max_pixels: u32,
    password: Option<&str>,
    requested: Option<&[usize]>,
) -> Result<BTreeMap<usize, DynamicImage>, Pdf2XlsxError> {
    let pdfium = Pdfium::default();
    let document = load_document(&pdfium, pdf_path, password)?;

    let pages = document.pages();
    let total_pages = pages.len() as usize;
    info!("PDF loaded: {} pages", total_pages);

    let target_pages: Vec<usize> = match requested {
        None => (1..=total_pages).collect(),
        Some(nums) => {
            let mut valid: Vec<usize> = nums
                .iter()
                .copied()
                .filter(|&p| {
                    let ok = p >= 1 && p <= total_pages;
                    if !ok {
                        warn!("Skipping page {} (out of range, total={})", p, total_pages);
                    }
                    ok
                })
                .collect();
            valid.sort_unstable();
            valid.dedup();
            valid
        }
    };
    if target_pages.is_empty() {
        return Ok(BTreeMap::new());
    }

    let mut images = BTreeMap::new();

    for page_num in target_pages {
        let page = pages
            .get((page_num - 1) as u16)
            .map_err(|e| Pdf2XlsxError::RasterisationFailed {
                page: page_num,
                detail: format!("{:?}", e),
            })?;

        // Points are 1/72 inch; cap the derived width so oversized pages
        // stay within memory bounds.
        let width_px = (page.width().value / 72.0 * dpi as f32).round() as i32;
        let width_px = width_px.clamp(1, max_pixels as i32);

        let render_config = PdfRenderConfig::new()
            .set_target_width(width_px)
            .set_maximum_height(max_pixels as i32);

        let bitmap = page.render_with_config(&render_config).map_err(|e| {
            Pdf2XlsxError::RasterisationFailed {
                page: page_num,
                detail: format!("{:?}", e),
            }
        })?;

        let image = bitmap.as_image();
        debug!(
            "Rendered page {} at {}x{} px",
            page_num,
            image.width(),
            image.height()
        );

        images.insert(page_num, image);
    }

    Ok(images)
}

/// Open a document, mapping pdfium's password failures onto our taxonomy.
fn load_document<'a>(
    pdfium: &'a Pdfium,
    pdf_path: &Path,
    password: Option<&'a str>,
) -> Result<PdfDocument<'a>, Pdf2XlsxError> {
    pdfium.load_pdf_from_file(pdf_path, password).map_err(|e| {
        let err_str = format!("{:?}", e);
        if err_str.contains("Password") || err_str.contains("password") {
            if password.is_some() {
                Pdf2XlsxError::WrongPassword {
                    path: pdf_path.to_path_buf(),
                }
            } else {
                Pdf2XlsxError::PasswordRequired {
                    path: pdf_path.to_path_buf(),
                }
            }
        } else {
            Pdf2XlsxError::CorruptPdf {
                path: pdf_path.to_path_buf(),
                detail: err_str,
            }
        }
    })
}
