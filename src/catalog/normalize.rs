//! Title canonicalization and price sentinels.

use regex::Regex;
use std::sync::LazyLock;

/// Price labels that mean the game is free; such listings have no purchase link.
pub const FREE_PRICE_LABELS: &[&str] = &["Free", "Ücretsiz"];

/// Matches "<word> Edition" fragments, e.g. "Deluxe Edition".
static EDITION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b[\w'-]+\s+edition\b").unwrap());

/// Canonicalizes a display title into a comparison key.
///
/// Trims surrounding whitespace and lower-cases. Idempotent.
pub fn normalize(display: &str) -> String {
    display.trim().to_lowercase()
}

/// Returns true when a table price is absent, empty, or exactly one of the free labels.
pub fn is_free_or_absent(price: Option<&str>) -> bool {
    match price {
        None | Some("") => true,
        Some(p) => FREE_PRICE_LABELS.contains(&p),
    }
}

/// Looser check for scraped price text: trimmed and case-insensitive.
pub fn is_free_label(price: &str) -> bool {
    let price = price.trim().to_lowercase();
    price.is_empty() || FREE_PRICE_LABELS.iter().any(|label| label.to_lowercase() == price)
}

/// Removes every "<word> Edition" fragment from a title.
pub fn strip_edition(title: &str) -> String {
    let mut cleaned = title.trim().to_string();
    while EDITION.is_match(&cleaned) {
        cleaned = EDITION.replace_all(&cleaned, "").trim().to_string();
    }
    collapse_whitespace(&cleaned)
}

fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}
