//! System prompts for VLM-based page-structure extraction.
//!
//! Centralising every prompt here serves two purposes:
//!
//! 1. **Single source of truth**: changing the response contract (e.g.
//!    adding a field or tweaking table handling) requires editing exactly
//!    one place.
//!
//! 2. **Testability**: unit tests can import and inspect prompts directly
//!    without spinning up a real VLM, making prompt regressions easy to catch.
//!
//! Callers can override the default via
//! [`crate::config::ExtractionConfig::system_prompt`]; the constants here are
//! used only when no override is provided.

/// Default system prompt fixing the JSON response contract.
///
/// The model must answer with minified JSON carrying exactly three top-level
/// keys (`headings`, `paragraphs`, `tables`), each in visual top-to-bottom
/// order. Used when `ExtractionConfig::system_prompt` is `None`.
pub const DEFAULT_SYSTEM_PROMPT: &str = "\
You are a meticulous document parser. Extract the document structure from the image. \
Return ONLY valid minified JSON with keys: headings, paragraphs, tables. \
- headings: array of objects: {level: 1|2|3, text: string} in visual order.\n\
- paragraphs: array of strings, preserving original paragraph boundaries and order.\n\
- tables: array of objects: {caption?: string, headers: string[], rows: string[][]} in visual order.\n\
Keep text accurate, fix obvious OCR errors if trivial. Do not invent content.";

/// Short text directive attached to the user message alongside the image.
///
/// VLM APIs require at least one user turn; the image carries the content,
/// this line restates the output contract.
pub const USER_DIRECTIVE: &str = "Extract structure and return JSON only.";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_names_all_three_fields() {
        for key in ["headings", "paragraphs", "tables"] {
            assert!(DEFAULT_SYSTEM_PROMPT.contains(key), "missing {key}");
        }
    }

    #[test]
    fn prompt_demands_json_only() {
        assert!(DEFAULT_SYSTEM_PROMPT.contains("ONLY valid minified JSON"));
        assert!(USER_DIRECTIVE.contains("JSON only"));
    }
}
