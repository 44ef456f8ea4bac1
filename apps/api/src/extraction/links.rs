use std::collections::HashSet;
use std::sync::OnceLock;

use regex::Regex;

fn url_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r#"https?://[^\s)>"']+"#).expect("static URL regex"))
}

/// Finds `http(s)://` URLs embedded in plain text, de-duplicated, first-seen order.
pub fn find_text_links(text: &str) -> Vec<String> {
    dedup(url_pattern().find_iter(text).map(|m| m.as_str().trim().to_string()))
}

/// Union of two link sets with duplicates removed.
pub fn union_links(annotation_links: Vec<String>, text_links: Vec<String>) -> Vec<String> {
    dedup(annotation_links.into_iter().chain(text_links))
}

fn dedup(links: impl Iterator<Item = String>) -> Vec<String> {
    let mut seen = HashSet::new();
    links
        .filter(|l| !l.is_empty())
        .filter(|l| seen.insert(l.clone()))
        .collect()
}
