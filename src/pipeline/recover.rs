//! Response recovery: tolerant parsing of the model's reply into a
//! [`PageStructure`].
//!
//! Vision models are prompted for bare minified JSON but routinely wrap the
//! payload in markdown fences, preface it with prose, or return something
//! that is not JSON at all. Recovery is an ordered chain of strategies, each
//! either producing a value or passing control to the next:
//!
//! 1. fenced block: prefer the inner content of a ``` block (optionally
//!    tagged `json`), else the trimmed full response
//! 2. prefix scan: if the candidate does not open with `{` or `[`, cut it
//!    at the first occurrence of either, discarding leading prose
//! 3. JSON parse: an object deserialises directly (missing fields default
//!    to empty); a bare array is wrapped as the `tables` field
//! 4. fallback: the trimmed original response becomes a single paragraph
//!
//! The final strategy always succeeds, so [`recover_structure`] is total:
//! the pipeline never loses the raw signal even when structure extraction
//! fails, degrading to plain text rather than dropping the page.

use crate::output::{PageStructure, TableBlock};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

static RE_FENCED_BLOCK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?si)```(?:json)?\n(.*?)```").unwrap());

/// Parse a model response into a structure record. Never fails.
pub fn recover_structure(text: &str) -> PageStructure {
    let candidate = fenced_block(text).unwrap_or_else(|| text.trim().to_string());
    let candidate = isolate_structured_prefix(&candidate);
    parse_candidate(candidate).unwrap_or_else(|| PageStructure::fallback_from_text(text))
}

/// Strategy 1: extract the inner content of the first fenced block.
fn fenced_block(text: &str) -> Option<String> {
    RE_FENCED_BLOCK
        .captures(text)
        .map(|caps| caps[1].trim().to_string())
}

/// Strategy 2: drop prose before the first `{` or `[`.
///
/// Leaves the candidate untouched when it already opens with a structural
/// character or contains none at all (the parse step will then fail and the
/// fallback takes over).
fn isolate_structured_prefix(candidate: &str) -> &str {
    if candidate.trim_start().starts_with(['{', '[']) {
        return candidate;
    }
    let brace = candidate.find('{');
    let bracket = candidate.find('[');
    match (brace, bracket) {
        (Some(a), Some(b)) => &candidate[a.min(b)..],
        (Some(a), None) => &candidate[a..],
        (None, Some(b)) => &candidate[b..],
        (None, None) => candidate,
    }
}

/// Strategy 3: parse the candidate as JSON.
///
/// An object maps onto [`PageStructure`] with per-field defaults; a bare
/// array is treated as the `tables` sequence. Anything else (scalar JSON,
/// type mismatches inside the value) yields `None` for the fallback to
/// handle.
fn parse_candidate(candidate: &str) -> Option<PageStructure> {
    let value: Value = serde_json::from_str(candidate).ok()?;
    match value {
        Value::Object(_) => serde_json::from_value(value).ok(),
        Value::Array(_) => {
            let tables: Vec<TableBlock> = serde_json::from_value(value).ok()?;
            Some(PageStructure {
                headings: Vec::new(),
                paragraphs: Vec::new(),
                tables,
            })
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::Heading;

    #[test]
    fn fenced_object_parses_exactly() {
        let text = "```json\n{\"headings\":[{\"level\":2,\"text\":\"Results\"}],\"paragraphs\":[\"p1\"],\"tables\":[]}\n```";
        let s = recover_structure(text);
        assert_eq!(
            s.headings,
            vec![Heading {
                level: 2,
                text: "Results".into()
            }]
        );
        assert_eq!(s.paragraphs, vec!["p1"]);
        assert!(s.tables.is_empty());
    }

    #[test]
    fn untagged_fence_and_mixed_case_tag_work() {
        for text in [
            "```\n{\"paragraphs\":[\"x\"]}\n```",
            "```JSON\n{\"paragraphs\":[\"x\"]}\n```",
        ] {
            let s = recover_structure(text);
            assert_eq!(s.paragraphs, vec!["x"], "input: {text}");
        }
    }

    #[test]
    fn bare_minified_object_parses() {
        let s = recover_structure(r#"{"headings":[],"paragraphs":["a","b"],"tables":[]}"#);
        assert_eq!(s.paragraphs, vec!["a", "b"]);
    }

    #[test]
    fn leading_prose_before_object_is_discarded() {
        let s = recover_structure("Sure! Here is the structure: {\"paragraphs\":[\"ok\"]}");
        assert_eq!(s.paragraphs, vec!["ok"]);
        assert!(s.headings.is_empty());
    }

    #[test]
    fn missing_fields_default_to_empty() {
        let s = recover_structure(r#"{"headings":[{"text":"T"}]}"#);
        assert_eq!(s.headings.len(), 1);
        assert_eq!(s.headings[0].level, 1);
        assert!(s.paragraphs.is_empty());
        assert!(s.tables.is_empty());
    }

    #[test]
    fn bare_array_lands_under_tables() {
        let s = recover_structure(r#"[{"headers":["A"],"rows":[["1"]]}]"#);
        assert!(s.headings.is_empty());
        assert!(s.paragraphs.is_empty());
        assert_eq!(s.tables.len(), 1);
        assert_eq!(s.tables[0].headers, vec!["A"]);
    }

    #[test]
    fn unparsable_prose_falls_back_to_single_paragraph() {
        let text = "  The page shows a chart with no extractable structure. \n";
        let s = recover_structure(text);
        assert!(s.headings.is_empty());
        assert!(s.tables.is_empty());
        assert_eq!(
            s.paragraphs,
            vec!["The page shows a chart with no extractable structure."]
        );
    }

    #[test]
    fn scalar_json_falls_back() {
        let s = recover_structure("42");
        assert_eq!(s.paragraphs, vec!["42"]);
    }

    #[test]
    fn fallback_preserves_full_text_not_candidate() {
        // The prefix scan truncates the candidate, but a parse failure must
        // fall back to the whole original response.
        let text = "intro text { this is not json";
        let s = recover_structure(text);
        assert_eq!(s.paragraphs, vec!["intro text { this is not json"]);
    }

    #[test]
    fn array_of_non_tables_falls_back() {
        let s = recover_structure(r#"["just", "strings"]"#);
        assert_eq!(s.paragraphs, vec![r#"["just", "strings"]"#]);
        assert!(s.tables.is_empty());
    }

    #[test]
    fn fence_takes_priority_over_surrounding_prose() {
        let text = "Model says:\n```json\n{\"paragraphs\":[\"inner\"]}\n```\nHope this helps!";
        let s = recover_structure(text);
        assert_eq!(s.paragraphs, vec!["inner"]);
    }
}
