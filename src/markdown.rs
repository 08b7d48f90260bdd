//! Markdown title detection and plain-text conversion.

use pulldown_cmark::{Event, Options, Parser, Tag, TagEnd};
use regex::Regex;
use std::sync::LazyLock;

static ATX_H1: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^#[ \t]+(.+)$").expect("static regex"));
static SETEXT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^(.+)\n[=\-]+[ \t]*$").expect("static regex"));
static HTML_TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]+>").expect("static regex"));
static MARKUP_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[#*`_\[\]()]+").expect("static regex"));
static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").expect("static regex"));

/// Find the document title: the first `# heading`, else the first underlined
/// heading. `None` means the caller falls back to the filename.
pub fn extract_title(source: &str) -> Option<String> {
    let normalized = source.replace("\r\n", "\n");
    let found = ATX_H1
        .captures(&normalized)
        .or_else(|| SETEXT.captures(&normalized))?;
    let title = found[1].trim();
    (!title.is_empty()).then(|| title.to_string())
}

/// Render markdown to whitespace-collapsed plain text.
///
/// Uses the structured parser first and falls back to stripping markup
/// characters when the parser yields nothing for non-blank input (e.g. a
/// document that is entirely raw HTML comments).
pub fn to_plain_text(source: &str) -> String {
    match render_text(source) {
        Some(text) => text,
        None => {
            tracing::debug!("markdown conversion produced no text, using naive strip");
            naive_strip(source)
        }
    }
}

fn render_text(source: &str) -> Option<String> {
    let mut out = String::with_capacity(source.len());
    let parser = Parser::new_ext(source, Options::ENABLE_STRIKETHROUGH | Options::ENABLE_TABLES);
    for event in parser {
        match event {
            Event::Text(t) | Event::Code(t) => out.push_str(&t),
            Event::Html(h) | Event::InlineHtml(h) => {
                out.push_str(&HTML_TAG.replace_all(&h, " "));
            }
            Event::SoftBreak | Event::HardBreak | Event::Rule => out.push(' '),
            Event::Start(Tag::Item) | Event::End(TagEnd::Paragraph | TagEnd::Heading(_)) => {
                out.push(' ')
            }
            Event::End(TagEnd::TableCell | TagEnd::Item | TagEnd::CodeBlock) => out.push(' '),
            _ => {}
        }
    }

    let text = collapse_whitespace(&out);
    if text.is_empty() && !source.trim().is_empty() {
        None
    } else {
        Some(text)
    }
}

fn naive_strip(source: &str) -> String {
    collapse_whitespace(&MARKUP_CHARS.replace_all(source, ""))
}

/// Collapse runs of whitespace to single spaces and trim.
pub fn collapse_whitespace(text: &str) -> String {
    WHITESPACE.replace_all(text, " ").trim().to_string()
}
