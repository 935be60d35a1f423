//! Split extracted article text into candidate paragraphs.

use linksuggest_core::Paragraph;

/// Segments at or below this many chars are treated as noise (captions, nav remnants).
pub const MIN_PARAGRAPH_CHARS: usize = 30;

/// Split on blank-line boundaries, trim, and drop short fragments.
///
/// Indices are assigned after filtering, so they are dense and start at 0.
pub fn split_paragraphs(text: &str) -> Vec<Paragraph> {
    let normalized = text.replace("\r\n", "\n").replace('\r', "\n");
    let mut out = Vec::new();
    let mut cur = String::new();
    let mut newlines = 0usize;

    let flush = |cur: &mut String, out: &mut Vec<Paragraph>| {
        let t = cur.trim();
        if t.chars().count() > MIN_PARAGRAPH_CHARS {
            out.push(Paragraph {
                index: out.len(),
                text: t.to_string(),
            });
        }
        cur.clear();
    };

    for ch in normalized.chars() {
        if ch == '\n' {
            newlines += 1;
            continue;
        }
        if newlines >= 2 {
            flush(&mut cur, &mut out);
        } else if newlines == 1 {
            cur.push('\n');
        }
        newlines = 0;
        cur.push(ch);
    }
    flush(&mut cur, &mut out);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const LONG_A: &str = "This is the first paragraph and it is long enough.";
    const LONG_B: &str = "Here is a second paragraph that also clears the bar.";

    #[test]
    fn splits_on_blank_lines_and_drops_short_fragments() {
        let text = format!("{LONG_A}\n\nshort caption\n\n\n  {LONG_B}  \n");
        let ps = split_paragraphs(&text);
        assert_eq!(ps.len(), 2);
        assert_eq!(ps[0], Paragraph { index: 0, text: LONG_A.to_string() });
        assert_eq!(ps[1], Paragraph { index: 1, text: LONG_B.to_string() });
    }

    #[test]
    fn normalizes_crlf() {
        let text = format!("{LONG_A}\r\n\r\n{LONG_B}");
        assert_eq!(split_paragraphs(&text).len(), 2);
    }

    #[test]
    fn single_newline_keeps_paragraph_together() {
        let text = format!("{LONG_A}\n{LONG_B}");
        let ps = split_paragraphs(&text);
        assert_eq!(ps.len(), 1);
        assert_eq!(ps[0].text, format!("{LONG_A}\n{LONG_B}"));
    }

    #[test]
    fn exactly_thirty_chars_is_dropped() {
        let thirty = "a".repeat(30);
        assert!(split_paragraphs(&thirty).is_empty());
        let thirty_one = "a".repeat(31);
        assert_eq!(split_paragraphs(&thirty_one).len(), 1);
    }

    #[test]
    fn empty_text_yields_nothing() {
        assert!(split_paragraphs("").is_empty());
        assert!(split_paragraphs("\n\n\n").is_empty());
    }

    proptest! {
        #[test]
        fn single_block_is_idempotent(s in "[a-zA-Z ,.]{0,80}") {
            let ps = split_paragraphs(&s);
            let t = s.trim();
            if t.chars().count() > MIN_PARAGRAPH_CHARS {
                prop_assert_eq!(ps.len(), 1);
                prop_assert_eq!(&ps[0].text, t);
                let again = split_paragraphs(&ps[0].text);
                prop_assert_eq!(again, ps);
            } else {
                prop_assert!(ps.is_empty());
            }
        }

        #[test]
        fn every_paragraph_is_trimmed_and_long(s in "[a-z \n\r]{0,300}") {
            for (i, p) in split_paragraphs(&s).iter().enumerate() {
                prop_assert_eq!(p.index, i);
                prop_assert_eq!(p.text.trim(), p.text.as_str());
                prop_assert!(p.text.chars().count() > MIN_PARAGRAPH_CHARS);
                prop_assert!(!p.text.contains("\n\n"));
            }
        }
    }
}
