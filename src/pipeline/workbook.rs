//! Workbook rendering: one styled worksheet per extracted page.
//!
//! The layout is deterministic: given the same structure records, the same
//! workbook comes out. Headings, paragraphs, and tables are written in
//! record order, which preserves the visual top-to-bottom order of the page.
//!
//! Styling constants mirror a print-like hierarchy: bold headings whose font
//! size steps down per level, tall wrapped paragraph rows, and bordered
//! table boxes with a shaded header row.

use crate::error::Pdf2XlsxError;
use crate::output::{PageStructure, TableBlock};
use rust_xlsxwriter::{Color, Format, FormatAlign, FormatBorder, Workbook, Worksheet, XlsxError};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{debug, info};

/// Fixed width applied to the first few columns of every sheet.
const COLUMN_WIDTH: f64 = 28.0;
/// Number of leading columns that get [`COLUMN_WIDTH`].
const STYLED_COLUMNS: u16 = 9;
/// Largest heading font size; each level steps down by 2.
const HEADING_BASE_SIZE: f64 = 16.0;
/// Headings never render smaller than this.
const HEADING_MIN_SIZE: f64 = 10.0;

const HEADER_FILL: Color = Color::RGB(0xEEEEEE);
const CAPTION_COLOR: Color = Color::RGB(0x555555);

/// Write one sheet per record into a new workbook at `path`.
///
/// Sheets are named `Page {n}` and appear in ascending page order (the map
/// iterates in key order). No default blank sheet is created. The caller
/// guarantees at least one record; an all-failed run aborts before reaching
/// this writer.
pub fn write_workbook(
    pages: &BTreeMap<usize, &PageStructure>,
    path: &Path,
) -> Result<(), Pdf2XlsxError> {
    let mut workbook = Workbook::new();

    for (page_num, structure) in pages {
        let sheet = workbook.add_worksheet();
        sheet
            .set_name(format!("Page {}", page_num))
            .map_err(|e| write_error(path, e))?;
        write_sheet(sheet, structure).map_err(|e| write_error(path, e))?;
        debug!("Laid out sheet for page {}", page_num);
    }

    workbook.save(path).map_err(|e| write_error(path, e))?;
    info!("Wrote workbook with {} sheets: {}", pages.len(), path.display());
    Ok(())
}

fn write_error(path: &Path, e: XlsxError) -> Pdf2XlsxError {
    Pdf2XlsxError::OutputWriteFailed {
        path: path.to_path_buf(),
        detail: e.to_string(),
    }
}

/// Lay out one page's structure record on a worksheet.
fn write_sheet(sheet: &mut Worksheet, content: &PageStructure) -> Result<(), XlsxError> {
    for col in 0..STYLED_COLUMNS {
        sheet.set_column_width(col, COLUMN_WIDTH)?;
    }

    let mut row: u32 = 0;

    for heading in &content.headings {
        let text = heading.text.trim();
        if text.is_empty() {
            continue;
        }
        let format = Format::new()
            .set_bold()
            .set_font_size(heading_font_size(heading.level))
            .set_text_wrap();
        sheet.write_string_with_format(row, 0, text, &format)?;
        sheet.set_row_height(row, 20.0)?;
        // One spacer row after each heading.
        row += 2;
    }

    let paragraph_format = Format::new().set_text_wrap().set_align(FormatAlign::Top);
    for paragraph in &content.paragraphs {
        let text = paragraph.trim();
        if text.is_empty() {
            continue;
        }
        sheet.write_string_with_format(row, 0, text, &paragraph_format)?;
        sheet.set_row_height(row, 40.0)?;
        row += 1;
    }

    for table in &content.tables {
        row = write_table(sheet, row, table)?;
    }

    Ok(())
}

/// Font size for a heading level: 16, 14, 12, floored at 10.
fn heading_font_size(level: u8) -> f64 {
    (HEADING_BASE_SIZE - (level.saturating_sub(1) as f64) * 2.0).max(HEADING_MIN_SIZE)
}

/// Write one table block starting at `row`; returns the next free row.
///
/// The border box covers the header row plus all data rows, `column_count`
/// columns wide. Short rows are padded with blank bordered cells so the box
/// stays rectangular; values past the box (rows wider than the headers) are
/// still written, just without borders.
fn write_table(sheet: &mut Worksheet, mut row: u32, table: &TableBlock) -> Result<u32, XlsxError> {
    let num_cols = table.column_count();

    if let Some(caption) = table
        .caption
        .as_deref()
        .map(str::trim)
        .filter(|c| !c.is_empty())
    {
        let format = Format::new().set_italic().set_font_color(CAPTION_COLOR);
        sheet.write_string_with_format(row, 0, caption, &format)?;
        sheet.set_row_height(row, 18.0)?;
        row += 1;
    }

    let header_format = Format::new()
        .set_bold()
        .set_align(FormatAlign::Center)
        .set_background_color(HEADER_FILL)
        .set_border(FormatBorder::Thin);
    let boxed_format = Format::new()
        .set_text_wrap()
        .set_align(FormatAlign::Top)
        .set_border(FormatBorder::Thin);
    let overflow_format = Format::new().set_text_wrap().set_align(FormatAlign::Top);

    if !table.headers.is_empty() {
        for (col, header) in table.headers.iter().enumerate() {
            sheet.write_string_with_format(row, col as u16, header, &header_format)?;
        }
        row += 1;
    }

    for values in &table.rows {
        for col in 0..num_cols.max(values.len()) {
            match values.get(col) {
                Some(value) => {
                    let format = if col < num_cols {
                        &boxed_format
                    } else {
                        &overflow_format
                    };
                    sheet.write_string_with_format(row, col as u16, value, format)?;
                }
                None => {
                    sheet.write_blank(row, col as u16, &boxed_format)?;
                }
            }
        }
        row += 1;
    }

    // Two spacer rows after each table.
    Ok(row + 2)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::Heading;

    fn sample_structure() -> PageStructure {
        PageStructure {
            headings: vec![
                Heading {
                    level: 1,
                    text: "Quarterly Report".into(),
                },
                Heading {
                    level: 3,
                    text: "Revenue".into(),
                },
            ],
            paragraphs: vec!["Revenue grew in all regions.".into(), "  ".into()],
            tables: vec![TableBlock {
                caption: Some("Table 1: by region".into()),
                headers: vec!["Region".into(), "Revenue".into()],
                rows: vec![
                    vec!["EMEA".into(), "1.2M".into()],
                    vec!["APAC".into()],
                    vec!["AMER".into(), "2.1M".into(), "note".into()],
                ],
            }],
        }
    }

    #[test]
    fn heading_sizes_step_down_with_floor() {
        assert_eq!(heading_font_size(1), 16.0);
        assert_eq!(heading_font_size(2), 14.0);
        assert_eq!(heading_font_size(3), 12.0);
        assert_eq!(heading_font_size(4), 10.0);
        assert_eq!(heading_font_size(9), 10.0);
        assert_eq!(heading_font_size(0), 16.0);
    }

    #[test]
    fn writes_workbook_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.xlsx");

        let structure = sample_structure();
        let mut pages = BTreeMap::new();
        pages.insert(1, &structure);
        pages.insert(3, &structure);

        write_workbook(&pages, &path).unwrap();

        let bytes = std::fs::read(&path).unwrap();
        // xlsx is a ZIP container
        assert_eq!(&bytes[..2], b"PK");
    }

    #[test]
    fn empty_structure_produces_valid_sheet() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.xlsx");

        let structure = PageStructure::default();
        let mut pages = BTreeMap::new();
        pages.insert(2, &structure);

        write_workbook(&pages, &path).unwrap();
        assert!(path.exists());
    }

    #[test]
    fn unwritable_path_maps_to_output_write_failed() {
        let structure = PageStructure::default();
        let mut pages = BTreeMap::new();
        pages.insert(1, &structure);

        let err = write_workbook(&pages, Path::new("/no/such/dir/out.xlsx")).unwrap_err();
        assert!(matches!(err, Pdf2XlsxError::OutputWriteFailed { .. }));
        assert_eq!(err.exit_code(), 1);
    }

    #[test]
    fn ragged_table_layout_is_accepted() {
        // Headerless table sized by its widest row.
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ragged.xlsx");

        let structure = PageStructure {
            headings: vec![],
            paragraphs: vec![],
            tables: vec![TableBlock {
                caption: None,
                headers: vec![],
                rows: vec![
                    vec!["a".into()],
                    vec!["b".into(), "c".into(), "d".into()],
                ],
            }],
        };
        let mut pages = BTreeMap::new();
        pages.insert(1, &structure);

        write_workbook(&pages, &path).unwrap();
        assert!(path.exists());
    }
}
