//! Prompt assembly for the suggestion completion call.

use crate::extract::truncate_chars;
use linksuggest_core::ScoredCandidate;

pub struct PromptInput<'a> {
    pub anchor_text: &'a str,
    pub target_url: &'a str,
    pub target_summary: &'a str,
    pub candidates: &'a [ScoredCandidate],
}

/// `CANDIDATE_1:\n...` blocks separated by `---` rules, in ranked order.
pub fn candidate_blocks(candidates: &[ScoredCandidate]) -> String {
    candidates
        .iter()
        .enumerate()
        .map(|(i, c)| format!("CANDIDATE_{}:\n{}", i + 1, c.text))
        .collect::<Vec<_>>()
        .join("\n\n---\n\n")
}

/// The exact anchor markup every suggestion must contain.
pub fn anchor_markup(target_url: &str, anchor_text: &str) -> String {
    format!(r#"<a href="{target_url}">{anchor_text}</a>"#)
}

pub fn build_prompt(input: &PromptInput<'_>) -> String {
    format!(
        r#"You suggest natural hyperlink insertions.

Anchor Text: "{anchor}"
Target URL: {target_url}

Target Article Summary:
{summary}

Candidate paragraphs from source:
{candidates}

Rules:
- Return ONLY JSON in this format:
[
  {{ "originalText": "...", "suggestedChange": "..." }}
]
- 1 to 3 suggestions only.
- Each suggestedChange MUST include:
  {markup}
"#,
        anchor = input.anchor_text,
        target_url = input.target_url,
        summary = input.target_summary,
        candidates = candidate_blocks(input.candidates),
        markup = anchor_markup(input.target_url, input.anchor_text),
    )
}

/// Text used to embed the target page: title line, then a bounded body prefix.
pub fn target_embedding_text(title: Option<&str>, body: &str, max_chars: usize) -> String {
    format!("{}\n{}", title.unwrap_or(""), truncate_chars(body, max_chars))
}
