//! Parsing model output into task suggestions.
//!
//! Models are asked for a bare JSON array but often wrap it in a markdown
//! fence, return a single object, or emit almost-JSON. Parsing never fails:
//! well-formed JSON is read directly, anything else goes through a regex
//! scan for quoted `"title"` / `"reason"` pairs, and unusable text yields an
//! empty list.

use regex_lite::{Match, Regex};
use serde_json::Value;
use std::sync::LazyLock;
use tracing::debug;

use crate::types::SuggestedTask;

static TITLE_RE: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r#""title"\s*:\s*"((?:[^"\\]|\\.)*)""#).ok());
static REASON_RE: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r#""reason"\s*:\s*"((?:[^"\\]|\\.)*)""#).ok());

/// Extract suggestions from raw model output.
pub fn parse_suggestions(raw: &str) -> Vec<SuggestedTask> {
    let body = strip_fences(raw).trim();

    match serde_json::from_str::<Value>(body) {
        Ok(value) => from_json(value),
        Err(e) => {
            debug!(error = %e, "Model output is not valid JSON, scanning for fields");
            scan_fields(body)
        }
    }
}

/// Return the contents of the first ```` ```json ```` fence, else the first
/// plain fence, else the input unchanged.
fn strip_fences(raw: &str) -> &str {
    let inner = if let Some((_, rest)) = raw.split_once("```json") {
        rest
    } else if let Some((_, rest)) = raw.split_once("```") {
        rest
    } else {
        return raw;
    };
    inner.split_once("```").map_or(inner, |(body, _)| body)
}

fn from_json(value: Value) -> Vec<SuggestedTask> {
    let items = match value {
        Value::Array(items) => items,
        obj @ Value::Object(_) => vec![obj],
        _ => return Vec::new(),
    };

    items
        .iter()
        .filter_map(|item| {
            let obj = item.as_object()?;
            let title = obj.get("title")?.as_str()?.trim();
            if title.is_empty() {
                return None;
            }
            let reason = obj
                .get("reason")
                .and_then(Value::as_str)
                .map(str::trim)
                .filter(|r| !r.is_empty())
                .map(str::to_string);
            Some(SuggestedTask {
                title: title.to_string(),
                reason,
            })
        })
        .collect()
}

/// Decode JSON string escapes in a captured value, keeping the raw text if
/// the escapes are invalid.
fn unescape(captured: &str) -> String {
    serde_json::from_str::<String>(&format!("\"{captured}\"")).unwrap_or_else(|_| captured.to_string())
}

fn captured(m: Match<'_>) -> String {
    unescape(m.as_str()).trim().to_string()
}

/// Regex fallback for malformed JSON. Each title is paired with the first
/// reason inside its own object span: from the nearest `{` before the title
/// to the first `}` after it, never crossing a neighbouring title.
fn scan_fields(text: &str) -> Vec<SuggestedTask> {
    let (Some(title_re), Some(reason_re)) = (TITLE_RE.as_ref(), REASON_RE.as_ref()) else {
        return Vec::new();
    };

    // (whole match, capture group)
    let titles: Vec<(Match<'_>, Match<'_>)> = title_re
        .captures_iter(text)
        .filter_map(|c| Some((c.get(0)?, c.get(1)?)))
        .collect();
    let reasons: Vec<(Match<'_>, Match<'_>)> = reason_re
        .captures_iter(text)
        .filter_map(|c| Some((c.get(0)?, c.get(1)?)))
        .collect();

    let mut suggestions = Vec::new();
    for (i, (whole, title)) in titles.iter().enumerate() {
        let title = captured(*title);
        if title.is_empty() {
            continue;
        }

        let lower = if i == 0 { 0 } else { titles[i - 1].0.end() };
        let upper = titles.get(i + 1).map_or(text.len(), |(next, _)| next.start());
        // Braces inside a reason value are not object delimiters.
        let in_reason = |pos: usize| reasons.iter().any(|(r, _)| r.start() <= pos && pos < r.end());
        // Without an opening brace only look forward.
        let from = text[lower..whole.start()]
            .rmatch_indices('{')
            .map(|(pos, _)| lower + pos)
            .find(|pos| !in_reason(*pos))
            .unwrap_or(whole.start());
        let to = text[whole.end()..upper]
            .match_indices('}')
            .map(|(pos, _)| whole.end() + pos)
            .find(|pos| !in_reason(*pos))
            .map_or(upper, |pos| pos + 1);

        let reason = reasons
            .iter()
            .find(|(r, _)| r.start() >= from && r.end() <= to)
            .map(|(_, value)| captured(*value))
            .filter(|r| !r.is_empty());

        suggestions.push(SuggestedTask { title, reason });
    }

    debug!(count = suggestions.len(), "Recovered suggestions from malformed output");
    suggestions
}

#[cfg(test)]
mod tests {
    use super::*;

    fn task(title: &str, reason: Option<&str>) -> SuggestedTask {
        SuggestedTask {
            title: title.to_string(),
            reason: reason.map(str::to_string),
        }
    }

    #[test]
    fn test_plain_array() {
        let raw = r#"[{"title": "Write tests", "reason": "Confidence"}, {"title": "Refactor"}]"#;
        assert_eq!(
            parse_suggestions(raw),
            vec![task("Write tests", Some("Confidence")), task("Refactor", None)]
        );
    }

    #[test]
    fn test_json_fence_preferred() {
        let raw = "Sure!\n```json\n[{\"title\": \"A\", \"reason\": \"B\"}]\n```\nDone.";
        assert_eq!(parse_suggestions(raw), vec![task("A", Some("B"))]);
    }

    #[test]
    fn test_plain_fence() {
        let raw = "```\n[{\"title\": \"A\"}]\n```";
        assert_eq!(parse_suggestions(raw), vec![task("A", None)]);
    }

    #[test]
    fn test_single_object_wrapped() {
        let raw = r#"{"title": "Only one", "reason": "Focus"}"#;
        assert_eq!(parse_suggestions(raw), vec![task("Only one", Some("Focus"))]);
    }

    #[test]
    fn test_items_without_title_dropped() {
        let raw = r#"[{"reason": "no title"}, {"title": ""}, "text", 3, {"title": "Keep"}]"#;
        assert_eq!(parse_suggestions(raw), vec![task("Keep", None)]);
    }

    #[test]
    fn test_non_collection_json_is_empty() {
        assert!(parse_suggestions("42").is_empty());
        assert!(parse_suggestions("\"just a string\"").is_empty());
    }

    #[test]
    fn test_truncated_json_recovers_complete_entries() {
        let raw = r#"[
          {"title": "Read chapter 3", "reason": "Keeps the streak"},
          {"title": "Email mentor", "reason": "Unblock the project"},
          {"title": "Plan sprint", "rea"#;
        assert_eq!(
            parse_suggestions(raw),
            vec![
                task("Read chapter 3", Some("Keeps the streak")),
                task("Email mentor", Some("Unblock the project")),
                task("Plan sprint", None),
            ]
        );
    }

    #[test]
    fn test_fallback_does_not_borrow_next_reason() {
        let raw = r#"[{"title": "A"}, {"title": "B", "reason": "for B"}, oops"#;
        assert_eq!(
            parse_suggestions(raw),
            vec![task("A", None), task("B", Some("for B"))]
        );
    }

    #[test]
    fn test_fallback_reason_before_title() {
        let raw = r#"[{"reason": "r1", "title": "T1"}, {"reason": "r2", "title": "T2"},"#;
        assert_eq!(
            parse_suggestions(raw),
            vec![task("T1", Some("r1")), task("T2", Some("r2"))]
        );
    }

    #[test]
    fn test_fallback_reason_stays_in_its_object() {
        let raw = r#"[{"title": "A"}, {"reason": "for B", "title": "B"}, oops"#;
        assert_eq!(
            parse_suggestions(raw),
            vec![task("A", None), task("B", Some("for B"))]
        );
    }

    #[test]
    fn test_fallback_mixed_key_order() {
        let raw = r#"[{"reason": "r1", "title": "T1"}, {"title": "T2", "reason": "r2"}, oops"#;
        assert_eq!(
            parse_suggestions(raw),
            vec![task("T1", Some("r1")), task("T2", Some("r2"))]
        );
    }

    #[test]
    fn test_fallback_braces_inside_reason() {
        let raw = r#"[{"title": "Tidy", "reason": "close the } and { gaps"}, {"title": "Rest"} oops"#;
        assert_eq!(
            parse_suggestions(raw),
            vec![task("Tidy", Some("close the } and { gaps")), task("Rest", None)]
        );
    }

    #[test]
    fn test_fallback_decodes_escapes() {
        let raw = r#"{"title": "Say \"hi\"", "reason": "line\nbreak" trailing"#;
        assert_eq!(
            parse_suggestions(raw),
            vec![task("Say \"hi\"", Some("line\nbreak"))]
        );
    }

    #[test]
    fn test_unparsable_text_is_empty() {
        assert!(parse_suggestions("I cannot help with that.").is_empty());
        assert!(parse_suggestions("").is_empty());
    }
}
