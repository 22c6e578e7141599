//! Low-level text helpers: word and sentence segmentation, URL detection.

use std::sync::LazyLock;

use regex::Regex;
use unicode_segmentation::UnicodeSegmentation;

static URL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(?:https?://\S+|www\.\S+\.\S+|[a-z0-9-]+(?:\.[a-z0-9-]+)*\.[a-z]{2,}/\S*)$")
        .expect("valid URL pattern")
});

/// Alphabetic words. Contractions are split at the apostrophe ("what's" → "what", "s").
pub fn words(text: &str) -> impl Iterator<Item = &str> {
    text.unicode_words()
        .flat_map(|w| w.split(['\'', '’']))
        .filter(|w| !w.is_empty() && w.chars().all(char::is_alphabetic))
}

/// Sentences on Unicode sentence boundaries, trimmed, empties dropped.
pub fn sentences(text: &str) -> Vec<String> {
    text.unicode_sentences()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

pub fn is_url(token: &str) -> bool {
    URL_RE.is_match(token.trim())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_words_are_alphabetic() {
        let w: Vec<&str> = words("What's AI? It's 2024, e-mail me at x@y.com!").collect();
        assert!(w.contains(&"What"));
        assert!(w.contains(&"s"));
        assert!(w.contains(&"AI"));
        assert!(!w.iter().any(|t| t.chars().any(|c| c.is_ascii_digit())));
    }

    #[test]
    fn test_sentences() {
        let s = sentences("Artificial intelligence is a field. It studies agents!  Does it work?");
        assert_eq!(s.len(), 3);
        assert_eq!(s[0], "Artificial intelligence is a field.");
        assert_eq!(s[2], "Does it work?");
        assert!(sentences("   ").is_empty());
    }

    #[test]
    fn test_url_detection() {
        assert!(is_url("https://example.com/page"));
        assert!(is_url("http://a.b"));
        assert!(is_url("www.rust-lang.org"));
        assert!(is_url("en.wikipedia.org/wiki/Rust"));
        assert!(!is_url("hello"));
        assert!(!is_url("end."));
        assert!(!is_url("Artificial intelligence"));
    }
}
