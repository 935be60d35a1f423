//! HTML → readable article text.
//!
//! Strategies, tried in order:
//! 1. "readability": pick the densest non-boilerplate container, keep its block elements
//!    and loose text runs in document order, separated by blank lines.
//! 2. "paragraphs": every `<p>` in the document, bounded to [`PARAGRAPH_FALLBACK_MAX_CHARS`].
//! 3. "html2text": plain rendering of the whole document.
//!
//! Nothing here returns an error: malformed or empty input yields an empty article.

use html_scraper::{ElementRef, Html, Selector};
use linksuggest_core::ExtractedArticle;
use std::io::Cursor;

pub const PARAGRAPH_FALLBACK_MAX_CHARS: usize = 8_000;

const BLOCK_TAGS: &[&str] = &[
    "p", "h1", "h2", "h3", "h4", "h5", "h6", "li", "blockquote", "pre",
];

const INVISIBLE_TAGS: &[&str] = &["script", "style", "noscript", "template"];

fn norm_ws(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn has_any_text(s: &str) -> bool {
    s.chars().any(|c| !c.is_whitespace())
}

/// Char-safe prefix of at most `max_chars` characters.
pub fn truncate_chars(s: &str, max_chars: usize) -> &str {
    match s.char_indices().nth(max_chars) {
        Some((byte, _)) => &s[..byte],
        None => s,
    }
}

fn selector(css: &str) -> Option<Selector> {
    Selector::parse(css).ok()
}

/// Text of an element, skipping script/style content.
fn visible_text(el: &ElementRef) -> String {
    let mut out = String::new();
    for node in el.descendants() {
        let Some(text) = node.value().as_text() else {
            continue;
        };
        let hidden = node.ancestors().any(|a| {
            a.value()
                .as_element()
                .is_some_and(|e| INVISIBLE_TAGS.contains(&e.name()))
        });
        if hidden {
            continue;
        }
        out.push_str(text);
        out.push(' ');
    }
    norm_ws(&out)
}

fn class_or_id_lc(el: &ElementRef) -> String {
    let mut out = String::new();
    if let Some(c) = el.value().attr("class") {
        out.push_str(c);
        out.push(' ');
    }
    if let Some(i) = el.value().attr("id") {
        out.push_str(i);
    }
    out.to_ascii_lowercase()
}

fn is_generic_boilerplate_container(el: &ElementRef) -> bool {
    let s = class_or_id_lc(el);
    if s.is_empty() {
        return false;
    }
    [
        "nav",
        "navbar",
        "menu",
        "sidebar",
        "footer",
        "header",
        "banner",
        "cookie",
        "consent",
        "ads",
        "advert",
        "promo",
        "subscribe",
        "newsletter",
        "comment",
    ]
    .iter()
    .any(|bad| s.contains(bad))
}

fn link_text_chars(el: &ElementRef, links: &Selector) -> usize {
    el.select(links)
        .map(|a| visible_text(&a).chars().count())
        .sum()
}

fn extract_title(doc: &Html) -> Option<String> {
    if let Some(sel) = selector(r#"meta[property="og:title"]"#) {
        if let Some(t) = doc
            .select(&sel)
            .filter_map(|m| m.value().attr("content"))
            .map(norm_ws)
            .find(|t| !t.is_empty())
        {
            return Some(t);
        }
    }
    for css in ["title", "h1"] {
        let Some(sel) = selector(css) else { continue };
        if let Some(t) = doc
            .select(&sel)
            .map(|el| visible_text(&el))
            .find(|t| !t.is_empty())
        {
            return Some(t);
        }
    }
    None
}

fn pick_main_container<'a>(doc: &'a Html, max_elems: usize) -> Option<ElementRef<'a>> {
    let sel = selector("article, main, section, div")?;
    let links = selector("a")?;
    let mut best_score: i64 = 0;
    let mut best: Option<ElementRef<'a>> = None;

    for el in doc.select(&sel).take(max_elems) {
        if is_generic_boilerplate_container(&el) {
            continue;
        }
        let txt = visible_text(&el).chars().count();
        if txt < 20 {
            continue;
        }
        let link_txt = link_text_chars(&el, &links);
        // Dense non-link text wins; link text is usually navigation.
        let mut score = txt as i64 - 2 * (link_txt as i64);
        match el.value().name() {
            "article" => score += 500,
            "main" => score += 300,
            _ => {}
        }
        if link_txt > txt / 2 {
            score -= 500;
        }
        if score > best_score {
            best_score = score;
            best = Some(el);
        }
    }
    best
}

/// Elements that flow inside a line of text rather than starting a new block.
const INLINE_TAGS: &[&str] = &[
    "a", "abbr", "b", "bdi", "bdo", "br", "cite", "code", "data", "del", "dfn", "em", "font",
    "i", "img", "ins", "kbd", "mark", "q", "s", "samp", "small", "span", "strong", "sub",
    "sup", "time", "u", "var", "wbr",
];

fn flush_run(run: &mut String, out: &mut Vec<String>) {
    let t = norm_ws(run);
    if !t.is_empty() {
        out.push(t);
    }
    run.clear();
}

/// Walk `el` in document order: block elements become one entry each, runs of loose text
/// and inline elements between them become their own entries, other wrappers are descended.
fn collect_blocks(el: &ElementRef, run: &mut String, out: &mut Vec<String>) {
    for child in el.children() {
        if let Some(text) = child.value().as_text() {
            run.push_str(text);
            run.push(' ');
            continue;
        }
        let Some(child_el) = ElementRef::wrap(child) else {
            continue;
        };
        let name = child_el.value().name();
        if INVISIBLE_TAGS.contains(&name) {
            continue;
        }
        if INLINE_TAGS.contains(&name) {
            run.push_str(&visible_text(&child_el));
            run.push(' ');
        } else if BLOCK_TAGS.contains(&name) {
            flush_run(run, out);
            let t = visible_text(&child_el);
            if !t.is_empty() {
                out.push(t);
            }
        } else {
            flush_run(run, out);
            collect_blocks(&child_el, run, out);
            flush_run(run, out);
        }
    }
}

/// Block texts of `container`, blank-line separated.
fn container_blocks(container: &ElementRef) -> String {
    let mut blocks = Vec::new();
    let mut run = String::new();
    collect_blocks(container, &mut run, &mut blocks);
    flush_run(&mut run, &mut blocks);
    blocks.join("\n\n")
}

/// All `<p>` texts in the document, blank-line separated and bounded.
pub fn paragraph_text(doc: &Html, max_chars: usize) -> String {
    let Some(sel) = selector("p") else {
        return String::new();
    };
    let joined = doc
        .select(&sel)
        .map(|el| visible_text(&el))
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join("\n\n");
    truncate_chars(&joined, max_chars).to_string()
}

pub fn html_to_text(html: &str, width: usize) -> String {
    html2text::from_read(Cursor::new(html.as_bytes()), width).unwrap_or_default()
}

/// Reduce raw HTML to the page's title and main readable text.
pub fn extract_article(html: &str) -> ExtractedArticle {
    if !has_any_text(html) {
        return ExtractedArticle::empty();
    }
    let doc = Html::parse_document(html);
    let title = extract_title(&doc);

    if let Some(main) = pick_main_container(&doc, 20_000) {
        let text = container_blocks(&main);
        if has_any_text(&text) {
            return ExtractedArticle {
                title,
                text,
                engine: "readability",
            };
        }
    }

    let text = paragraph_text(&doc, PARAGRAPH_FALLBACK_MAX_CHARS);
    if has_any_text(&text) {
        return ExtractedArticle {
            title,
            text,
            engine: "paragraphs",
        };
    }

    let text = html_to_text(html, 100);
    if has_any_text(&text) {
        return ExtractedArticle {
            title,
            text: text.trim().to_string(),
            engine: "html2text",
        };
    }

    ExtractedArticle {
        title,
        ..ExtractedArticle::empty()
    }
}
