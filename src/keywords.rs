//! Frequency-based keyword extraction shared by every content type.

use regex::Regex;
use std::collections::HashMap;
use std::sync::LazyLock;

/// Default number of keywords kept per item.
pub const DEFAULT_MAX_KEYWORDS: usize = 10;

static NON_WORD: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^\w\s]").expect("static regex"));

/// Common English function words and pronouns.
const STOP_WORDS: &[&str] = &[
    "the", "a", "an", "and", "or", "but", "in", "on", "at", "to", "for", "of", "with", "by", "is",
    "are", "was", "were", "be", "been", "being", "have", "has", "had", "do", "does", "did", "will",
    "would", "could", "should", "may", "might", "must", "can", "this", "that", "these", "those",
    "i", "you", "he", "she", "it", "we", "they", "me", "him", "her", "us", "them", "my", "your",
    "his", "its", "our", "their",
];

/// Extract up to `max_keywords` keywords from `text`.
///
/// Tokens are lower-cased words longer than two characters that are neither
/// numeric nor stop words. Results are ordered by frequency, most frequent
/// first; equal counts keep the order in which the words first appear.
pub fn extract_keywords(text: &str, max_keywords: usize) -> Vec<String> {
    if text.is_empty() || max_keywords == 0 {
        return Vec::new();
    }

    let lowered = text.to_lowercase();
    let cleaned = NON_WORD.replace_all(&lowered, " ");

    let mut counts: Vec<(&str, usize)> = Vec::new();
    let mut positions: HashMap<&str, usize> = HashMap::new();

    for word in cleaned.split_whitespace() {
        if !is_candidate(word) {
            continue;
        }
        match positions.get(word) {
            Some(&pos) => counts[pos].1 += 1,
            None => {
                positions.insert(word, counts.len());
                counts.push((word, 1));
            }
        }
    }

    // Stable: ties stay in first-occurrence order.
    counts.sort_by(|a, b| b.1.cmp(&a.1));
    counts
        .into_iter()
        .take(max_keywords)
        .map(|(word, _)| word.to_string())
        .collect()
}

fn is_candidate(word: &str) -> bool {
    word.chars().count() > 2
        && !word.chars().all(char::is_numeric)
        && !STOP_WORDS.contains(&word)
}

/// Append `extra` to `keywords`, skipping anything already present.
pub fn merge_unique(keywords: &mut Vec<String>, extra: impl IntoIterator<Item = String>) {
    for word in extra {
        if !keywords.contains(&word) {
            keywords.push(word);
        }
    }
}
