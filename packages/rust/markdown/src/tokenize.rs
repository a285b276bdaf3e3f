//! Lexical tokenizer for the inverted index.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;

/// Shortest token kept.
pub const MIN_TOKEN_LEN: usize = 2;

/// Longest token kept; longer matches are discarded, not truncated.
pub const MAX_TOKEN_LEN: usize = 64;

static WORD_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b\p{L}[\p{L}\p{N}_-]*").expect("valid regex"));

/// Common English function words never indexed.
const STOPWORDS: &[&str] = &[
    "a", "about", "above", "after", "again", "against", "all", "also", "am", "an", "and", "any",
    "are", "as", "at", "be", "because", "been", "before", "being", "below", "between", "both",
    "but", "by", "can", "could", "did", "do", "does", "doing", "down", "during", "each", "few",
    "for", "from", "further", "had", "has", "have", "having", "he", "her", "here", "hers",
    "herself", "him", "himself", "his", "how", "i", "if", "in", "into", "is", "it", "its",
    "itself", "just", "me", "more", "most", "my", "myself", "no", "nor", "not", "now", "of",
    "off", "on", "once", "only", "or", "other", "our", "ours", "ourselves", "out", "over", "own",
    "same", "she", "should", "so", "some", "such", "than", "that", "the", "their", "theirs",
    "them", "themselves", "then", "there", "these", "they", "this", "those", "through", "to",
    "too", "under", "until", "up", "use", "used", "using", "very", "was", "we", "were", "what",
    "when", "where", "which", "while", "who", "whom", "why", "will", "with", "would", "you",
    "your", "yours", "yourself", "yourselves",
];

fn stopwords() -> &'static HashSet<&'static str> {
    static SET: LazyLock<HashSet<&'static str>> =
        LazyLock::new(|| STOPWORDS.iter().copied().collect());
    &SET
}

/// Whether `token` (already lowercase) is a stopword.
pub fn is_stopword(token: &str) -> bool {
    stopwords().contains(token)
}

/// Lowercase word tokens of `text`, stopwords removed. Duplicates are kept.
pub fn tokenize(text: &str) -> Vec<String> {
    let lowered = text.to_lowercase();
    WORD_RE
        .find_iter(&lowered)
        .map(|m| m.as_str())
        .filter(|t| {
            let len = t.chars().count();
            (MIN_TOKEN_LEN..=MAX_TOKEN_LEN).contains(&len)
        })
        .filter(|t| !is_stopword(t))
        .map(str::to_string)
        .collect()
}
