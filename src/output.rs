//! Output types: the page structure record and run-level results.
//!
//! [`PageStructure`] is the central output unit, one per successfully
//! extracted page. Every field is `#[serde(default)]` so a record always
//! carries all three sequences even when the model's JSON omits one, which
//! is the invariant the workbook writer relies on.

use crate::error::PageError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One heading on a page, in visual order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Heading {
    /// Heading level 1 to 3. Defaults to 1 when the model leaves it out.
    #[serde(default = "default_heading_level")]
    pub level: u8,
    /// Heading text.
    #[serde(default)]
    pub text: String,
}

fn default_heading_level() -> u8 {
    1
}

/// One table on a page, in visual order.
///
/// Row widths are not required to agree with each other or with the header
/// count; the workbook writer sizes the table by the widest row when no
/// headers are present.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TableBlock {
    /// Optional caption rendered above the table.
    #[serde(default)]
    pub caption: Option<String>,
    /// Header cells; empty when the table has no header row.
    #[serde(default)]
    pub headers: Vec<String>,
    /// Data rows, outer sequence in visual order.
    #[serde(default)]
    pub rows: Vec<Vec<String>>,
}

impl TableBlock {
    /// Column count used for layout and borders: header count when headers
    /// exist, otherwise the widest data row, never less than 1.
    pub fn column_count(&self) -> usize {
        if !self.headers.is_empty() {
            self.headers.len()
        } else {
            self.rows.iter().map(Vec::len).max().unwrap_or(1).max(1)
        }
    }
}

/// Normalized extraction result for one document page.
///
/// All three sequences are always present; an empty page yields three empty
/// sequences, not an absent record.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PageStructure {
    #[serde(default)]
    pub headings: Vec<Heading>,
    #[serde(default)]
    pub paragraphs: Vec<String>,
    #[serde(default)]
    pub tables: Vec<TableBlock>,
}

impl PageStructure {
    /// Fallback record preserving the raw response as a single paragraph.
    ///
    /// Used when the response cannot be parsed as JSON at all, so the
    /// pipeline degrades to plain text instead of dropping the page.
    pub fn fallback_from_text(text: &str) -> Self {
        Self {
            headings: Vec::new(),
            paragraphs: vec![text.trim().to_string()],
            tables: Vec::new(),
        }
    }
}

/// Result of processing a single page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageResult {
    /// 1-indexed page number.
    pub page_num: usize,
    /// Extracted structure; `None` when the page failed after retries.
    pub structure: Option<PageStructure>,
    /// Prompt tokens consumed by the successful attempt.
    pub input_tokens: u64,
    /// Completion tokens produced by the successful attempt.
    pub output_tokens: u64,
    /// Wall-clock time spent on this page, including backoff sleeps.
    pub duration_ms: u64,
    /// Number of failed attempts before the outcome (0 = first try worked).
    pub retries: u32,
    /// Set when the page exhausted its retries.
    pub error: Option<PageError>,
}

impl PageResult {
    /// Whether this page produced a structure record.
    pub fn is_success(&self) -> bool {
        self.structure.is_some() && self.error.is_none()
    }
}

/// Run-level statistics.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExtractionStats {
    /// Pages in the source document.
    pub total_pages: usize,
    /// Pages that produced a structure record.
    pub processed_pages: usize,
    /// Pages that exhausted retries and were skipped.
    pub failed_pages: usize,
    /// Prompt tokens across all successful pages.
    pub total_input_tokens: u64,
    /// Completion tokens across all successful pages.
    pub total_output_tokens: u64,
    /// End-to-end wall-clock time.
    pub total_duration_ms: u64,
    /// Time spent rasterising.
    pub render_duration_ms: u64,
    /// Time spent in inference calls and backoff.
    pub inference_duration_ms: u64,
}

/// Full output of an extraction run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionOutput {
    /// Per-page results, sorted by ascending page number.
    pub pages: Vec<PageResult>,
    /// Run statistics.
    pub stats: ExtractionStats,
}

impl ExtractionOutput {
    /// Successful records keyed by 1-indexed page number, ascending.
    ///
    /// Failed pages are absent from the map, not present-with-error; this is
    /// exactly the mapping the workbook writer consumes.
    pub fn structures(&self) -> BTreeMap<usize, &PageStructure> {
        self.pages
            .iter()
            .filter_map(|p| p.structure.as_ref().map(|s| (p.page_num, s)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_fill_missing_fields() {
        let s: PageStructure = serde_json::from_str(r#"{"paragraphs":["hello"]}"#).unwrap();
        assert!(s.headings.is_empty());
        assert_eq!(s.paragraphs, vec!["hello"]);
        assert!(s.tables.is_empty());
    }

    #[test]
    fn heading_level_defaults_to_one() {
        let h: Heading = serde_json::from_str(r#"{"text":"Intro"}"#).unwrap();
        assert_eq!(h.level, 1);
    }

    #[test]
    fn column_count_prefers_headers() {
        let t = TableBlock {
            caption: None,
            headers: vec!["a".into(), "b".into()],
            rows: vec![vec!["1".into(), "2".into(), "3".into()]],
        };
        assert_eq!(t.column_count(), 2);
    }

    #[test]
    fn column_count_uses_widest_row_without_headers() {
        let t = TableBlock {
            caption: None,
            headers: vec![],
            rows: vec![vec!["1".into()], vec!["1".into(), "2".into(), "3".into()]],
        };
        assert_eq!(t.column_count(), 3);
    }

    #[test]
    fn column_count_floor_is_one() {
        assert_eq!(TableBlock::default().column_count(), 1);
    }

    #[test]
    fn structures_skips_failed_pages() {
        let ok = PageResult {
            page_num: 1,
            structure: Some(PageStructure::default()),
            input_tokens: 0,
            output_tokens: 0,
            duration_ms: 0,
            retries: 0,
            error: None,
        };
        let failed = PageResult {
            page_num: 2,
            structure: None,
            input_tokens: 0,
            output_tokens: 0,
            duration_ms: 0,
            retries: 3,
            error: Some(crate::error::PageError::ExtractFailed {
                page: 2,
                retries: 3,
                detail: "boom".into(),
            }),
        };
        let out = ExtractionOutput {
            pages: vec![ok, failed],
            stats: ExtractionStats::default(),
        };
        let map = out.structures();
        assert_eq!(map.len(), 1);
        assert!(map.contains_key(&1));
        assert!(!map.contains_key(&2));
    }

    #[test]
    fn fallback_trims_text() {
        let s = PageStructure::fallback_from_text("  raw model prose \n");
        assert_eq!(s.paragraphs, vec!["raw model prose"]);
        assert!(s.headings.is_empty());
        assert!(s.tables.is_empty());
    }
}
