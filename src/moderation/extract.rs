use once_cell::sync::Lazy;
use regex::Regex;

// Deliberately loose: everything up to the next whitespace counts, trailing punctuation included.
static URL_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"https?://(?:www\.)?[^\s/$.?#].[^\s]*").expect("valid url regex")
});

/// Returns every http(s) URL in `text`, in order of appearance. Duplicates are kept.
pub fn extract_urls(text: &str) -> Vec<String> {
    URL_REGEX
        .find_iter(text)
        .map(|m| m.as_str().to_string())
        .collect()
}
