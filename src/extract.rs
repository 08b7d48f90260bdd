//! Text extraction for PDF documents.
//!
//! Two strategies are tried in order: layout-aware extraction via
//! `pdf-extract`, then page-by-page extraction via `lopdf`. Extraction
//! returns raw text with line structure intact; [`clean_pdf_text`] produces
//! the normalized form stored on content items.

use regex::Regex;
use std::panic::{self, AssertUnwindSafe};
use std::sync::LazyLock;

use crate::error::ExtractError;
use crate::markdown::collapse_whitespace;

/// Minimum non-whitespace characters for a PDF to be accepted.
pub const MIN_PDF_CHARS: usize = 10;

static DISALLOWED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"[^\w\s.,!?;:()\-'"]+"#).expect("static regex"));

/// Extract text from PDF bytes, falling back to the page-by-page strategy
/// when the layout-aware pass fails or finds too little text.
pub fn extract_pdf_text(bytes: &[u8], min_chars: usize) -> Result<String, ExtractError> {
    extract_with(bytes, min_chars, extract_layout, extract_pages)
}

type Strategy = fn(&[u8]) -> Result<String, ExtractError>;

fn extract_with(
    bytes: &[u8],
    min_chars: usize,
    primary: Strategy,
    fallback: Strategy,
) -> Result<String, ExtractError> {
    let layout = guarded(|| primary(bytes));
    match &layout {
        Ok(text) if meaningful_chars(text) >= min_chars => {
            tracing::debug!(chars = text.len(), "extracted PDF text with layout strategy");
            return layout;
        }
        Ok(_) => tracing::debug!("layout strategy found no usable text, trying page strategy"),
        Err(e) => tracing::debug!(error = %e, "layout strategy failed, trying page strategy"),
    }

    let pages = guarded(|| fallback(bytes));
    let best = match (layout, pages) {
        (_, Ok(text)) if meaningful_chars(&text) >= min_chars => {
            tracing::debug!(chars = text.len(), "extracted PDF text with page strategy");
            return Ok(text);
        }
        (Ok(a), Ok(b)) => meaningful_chars(&a).max(meaningful_chars(&b)),
        (Ok(text), Err(_)) | (Err(_), Ok(text)) => meaningful_chars(&text),
        (Err(_), Err(e)) => return Err(e),
    };

    Err(ExtractError::NoText {
        found: best,
        min: min_chars,
    })
}

fn extract_layout(bytes: &[u8]) -> Result<String, ExtractError> {
    pdf_extract::extract_text_from_mem(bytes).map_err(|e| ExtractError::Pdf(e.to_string()))
}

fn extract_pages(bytes: &[u8]) -> Result<String, ExtractError> {
    let doc = lopdf::Document::load_mem(bytes)
        .map_err(|e| ExtractError::Pdf(format!("failed to load PDF: {}", e)))?;

    let mut parts = Vec::new();
    for page in doc.get_pages().keys() {
        match doc.extract_text(&[*page]) {
            Ok(text) if !text.trim().is_empty() => parts.push(text),
            Ok(_) => {}
            Err(e) => tracing::debug!(page, error = %e, "skipping unreadable PDF page"),
        }
    }
    Ok(parts.join("\n\n"))
}

/// pdf-extract and lopdf panic on some malformed inputs.
fn guarded<F>(f: F) -> Result<String, ExtractError>
where
    F: FnOnce() -> Result<String, ExtractError>,
{
    panic::catch_unwind(AssertUnwindSafe(f))
        .unwrap_or_else(|_| Err(ExtractError::Pdf("extractor panicked".to_string())))
}

fn meaningful_chars(text: &str) -> usize {
    text.chars().filter(|c| !c.is_whitespace()).count()
}

/// Replace characters outside the printable allow-list with spaces and
/// collapse whitespace.
pub fn clean_pdf_text(raw: &str) -> String {
    collapse_whitespace(&DISALLOWED.replace_all(raw, " "))
}

/// Guess a title from the first lines of extracted PDF text.
///
/// Prefers one of the first five non-empty lines that is 6–99 characters,
/// not all caps, and under 30% digits. Otherwise takes the first line of
/// 11–149 characters, truncated to 100.
pub fn pdf_title(raw: &str) -> Option<String> {
    let lines: Vec<&str> = raw
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect();

    let preferred = lines.iter().take(5).find(|line| {
        let len = line.chars().count();
        let digits = line.chars().filter(|c| c.is_numeric()).count();
        (6..100).contains(&len) && !is_all_caps(line) && (digits as f64) < len as f64 * 0.3
    });
    if let Some(line) = preferred {
        return Some(line.to_string());
    }

    lines
        .iter()
        .find(|line| (11..150).contains(&line.chars().count()))
        .map(|line| line.chars().take(100).collect())
}

fn is_all_caps(line: &str) -> bool {
    let mut cased = line.chars().filter(|c| c.is_lowercase() || c.is_uppercase());
    let mut any = false;
    let all_upper = cased.all(|c| {
        any = true;
        c.is_uppercase()
    });
    any && all_upper
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_pdf_returns_error() {
        let err = extract_pdf_text(b"not a pdf", MIN_PDF_CHARS).unwrap_err();
        assert!(matches!(err, ExtractError::Pdf(_)));
    }

    fn too_short(_: &[u8]) -> Result<String, ExtractError> {
        Ok("  abc \n".to_string())
    }

    fn slightly_longer(_: &[u8]) -> Result<String, ExtractError> {
        Ok("abcdefg".to_string())
    }

    fn full_page(_: &[u8]) -> Result<String, ExtractError> {
        Ok("Soil Health in Urban Gardens\nCompost matters.".to_string())
    }

    fn unparseable(_: &[u8]) -> Result<String, ExtractError> {
        Err(ExtractError::Pdf("bad xref".to_string()))
    }

    fn panicking(_: &[u8]) -> Result<String, ExtractError> {
        panic!("malformed font table")
    }

    #[test]
    fn test_layout_text_used_when_sufficient() {
        let text = extract_with(b"", MIN_PDF_CHARS, full_page, panicking).unwrap();
        assert!(text.starts_with("Soil Health"));
    }

    #[test]
    fn test_page_strategy_used_when_layout_too_short() {
        let text = extract_with(b"", MIN_PDF_CHARS, too_short, full_page).unwrap();
        assert!(text.contains("Compost matters."));
    }

    #[test]
    fn test_page_strategy_used_when_layout_fails() {
        let text = extract_with(b"", MIN_PDF_CHARS, unparseable, full_page).unwrap();
        assert!(text.contains("Compost"));
    }

    #[test]
    fn test_no_text_reports_best_count() {
        let err = extract_with(b"", MIN_PDF_CHARS, too_short, slightly_longer).unwrap_err();
        assert!(matches!(err, ExtractError::NoText { found: 7, min: MIN_PDF_CHARS }));

        let err = extract_with(b"", MIN_PDF_CHARS, slightly_longer, too_short).unwrap_err();
        assert!(matches!(err, ExtractError::NoText { found: 7, .. }));

        let err = extract_with(b"", MIN_PDF_CHARS, unparseable, too_short).unwrap_err();
        assert!(matches!(err, ExtractError::NoText { found: 3, .. }));
    }

    #[test]
    fn test_panicking_strategy_is_contained() {
        let text = extract_with(b"", MIN_PDF_CHARS, panicking, full_page).unwrap();
        assert!(text.contains("Compost"));

        let err = extract_with(b"", MIN_PDF_CHARS, unparseable, panicking).unwrap_err();
        assert!(matches!(err, ExtractError::Pdf(msg) if msg.contains("panicked")));
    }

    #[test]
    fn test_clean_strips_artifacts_and_collapses() {
        let cleaned = clean_pdf_text("Résumé\u{2022}  line one\n\n© 2024 — \"quoted\" (ok)!");
        assert_eq!(cleaned, "Résumé line one 2024 \"quoted\" (ok)!");
    }

    #[test]
    fn test_title_prefers_early_mixed_case_line() {
        let raw = "12\nANNUAL REPORT\nSoil Health in Urban Gardens\nBody text follows here.";
        assert_eq!(pdf_title(raw).as_deref(), Some("Soil Health in Urban Gardens"));
    }

    #[test]
    fn test_title_rejects_digit_heavy_lines() {
        let raw = "2024-01-15 10:30\nMeeting notes for the team";
        assert_eq!(pdf_title(raw).as_deref(), Some("Meeting notes for the team"));
    }

    #[test]
    fn test_title_falls_back_to_long_line_truncated() {
        let long = "x".repeat(120);
        let raw = format!("ABSTRACT\nPAGE\n{}", long);
        let title = pdf_title(&raw).unwrap();
        assert_eq!(title.chars().count(), 100);
    }

    #[test]
    fn test_title_none_when_nothing_qualifies() {
        assert_eq!(pdf_title("A\nB\nCD"), None);
        assert_eq!(pdf_title(""), None);
    }

    #[test]
    fn test_all_caps_detection() {
        assert!(is_all_caps("TABLE OF CONTENTS 2"));
        assert!(!is_all_caps("Table of Contents"));
        assert!(!is_all_caps("1234"));
    }
}
