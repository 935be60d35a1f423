//! Lenient parsing of model output into suggestions.
//!
//! Model text is free-form: it may be fenced, prefixed with chatter, or not JSON at all.
//! [`parse_suggestions`] never fails; it degrades to an empty list and logs why.

use linksuggest_core::Suggestion;
use serde_json::Value;

pub const MAX_SUGGESTIONS: usize = 3;

/// Strip one leading ```` ``` ```` / ```` ```json ```` fence line and one trailing fence.
pub fn strip_code_fence(text: &str) -> &str {
    let mut s = text.trim();
    if let Some(rest) = s.strip_prefix("```") {
        // Drop the info string ("json", "JSON", ...) up to the end of the fence line.
        s = match rest.find('\n') {
            Some(nl) => &rest[nl + 1..],
            None => rest.trim_start_matches(|c: char| c.is_ascii_alphanumeric()),
        };
    }
    if let Some(rest) = s.trim_end().strip_suffix("```") {
        s = rest;
    }
    s.trim()
}

/// First `[` through last `]`, if both exist in that order.
fn bracketed_array(text: &str) -> Option<&str> {
    let start = text.find('[')?;
    let end = text.rfind(']')?;
    (end > start).then(|| &text[start..=end])
}

fn parse_value(text: &str) -> Option<Value> {
    let cleaned = strip_code_fence(text);
    if let Ok(v) = serde_json::from_str::<Value>(cleaned) {
        return Some(v);
    }
    let slice = bracketed_array(text)?;
    match serde_json::from_str::<Value>(slice) {
        Ok(v) => {
            tracing::warn!(
                raw_chars = text.chars().count(),
                "model output was not clean JSON; recovered embedded array"
            );
            Some(v)
        }
        Err(e) => {
            tracing::warn!(error = %e, "embedded array in model output did not parse");
            None
        }
    }
}

fn suggestion_from_value(v: &Value) -> Option<Suggestion> {
    let obj = v.as_object()?;
    Some(Suggestion {
        original_text: obj.get("originalText")?.as_str()?.to_string(),
        suggested_change: obj.get("suggestedChange")?.as_str()?.to_string(),
    })
}

/// Parse model output, keep well-shaped entries, cap at `max`.
pub fn parse_suggestions_capped(text: &str, max: usize) -> Vec<Suggestion> {
    let Some(value) = parse_value(text) else {
        tracing::warn!(
            raw_chars = text.chars().count(),
            "model output contained no parseable JSON array; returning no suggestions"
        );
        return Vec::new();
    };
    let Some(items) = value.as_array() else {
        tracing::warn!("model output parsed as JSON but was not an array");
        return Vec::new();
    };
    items
        .iter()
        .filter_map(suggestion_from_value)
        .take(max)
        .collect()
}

pub fn parse_suggestions(text: &str) -> Vec<Suggestion> {
    parse_suggestions_capped(text, MAX_SUGGESTIONS)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn s(a: &str, b: &str) -> Suggestion {
        Suggestion {
            original_text: a.to_string(),
            suggested_change: b.to_string(),
        }
    }

    #[test]
    fn parses_fenced_json() {
        let raw = "```json\n[{\"originalText\":\"a\",\"suggestedChange\":\"b\"}]\n```";
        assert_eq!(parse_suggestions(raw), vec![s("a", "b")]);
    }

    #[test]
    fn parses_bare_fence_without_info_string() {
        let raw = "```\n[{\"originalText\":\"a\",\"suggestedChange\":\"b\"}]```";
        assert_eq!(parse_suggestions(raw), vec![s("a", "b")]);
    }

    #[test]
    fn garbage_without_brackets_yields_empty() {
        assert!(parse_suggestions("I could not find a good spot, sorry.").is_empty());
        assert!(parse_suggestions("").is_empty());
    }

    #[test]
    fn unbalanced_brackets_yield_empty() {
        assert!(parse_suggestions("] backwards [").is_empty());
        assert!(parse_suggestions("[not json at all]").is_empty());
    }

    #[test]
    fn recovers_array_embedded_in_prose() {
        let raw = "Sure! Here you go:\n[{\"originalText\":\"x\",\"suggestedChange\":\"y <a href=\\\"u\\\">t</a>\"}]\nHope this helps.";
        let out = parse_suggestions(raw);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].suggested_change, "y <a href=\"u\">t</a>");
    }

    #[test]
    fn truncates_to_three() {
        let items: Vec<Value> = (0..5)
            .map(|i| serde_json::json!({"originalText": format!("o{i}"), "suggestedChange": format!("c{i}")}))
            .collect();
        let raw = serde_json::to_string(&items).unwrap();
        let out = parse_suggestions(&raw);
        assert_eq!(out, vec![s("o0", "c0"), s("o1", "c1"), s("o2", "c2")]);
    }

    #[test]
    fn drops_entries_with_missing_or_non_string_fields() {
        let raw = r#"[
            {"originalText": "keep", "suggestedChange": "me"},
            {"originalText": "missing change"},
            {"originalText": 1, "suggestedChange": "number"},
            null,
            "string entry",
            {"originalText": "also", "suggestedChange": "kept", "extra": true}
        ]"#;
        assert_eq!(
            parse_suggestions(raw),
            vec![s("keep", "me"), s("also", "kept")]
        );
    }

    #[test]
    fn non_array_json_yields_empty() {
        assert!(parse_suggestions(r#"{"originalText":"a","suggestedChange":"b"}"#).is_empty());
    }

    #[test]
    fn strip_code_fence_leaves_plain_text_alone() {
        assert_eq!(strip_code_fence("  [1, 2]  "), "[1, 2]");
        assert_eq!(strip_code_fence("```json\n[]\n```"), "[]");
    }

    proptest! {
        #[test]
        fn never_panics_and_never_exceeds_cap(raw in any::<String>()) {
            prop_assert!(parse_suggestions(&raw).len() <= MAX_SUGGESTIONS);
        }
    }
}
