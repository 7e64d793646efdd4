//! Excluded-keyword title filtering.

use super::Filter;
use crate::collect::RawItem;

/// Drops listings whose title contains any excluded keyword (case-insensitive).
pub struct KeywordFilter {
    excluded: Vec<String>,
}

impl KeywordFilter {
    /// Blank keywords are ignored; they would match every title.
    pub fn new<I, S>(keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let excluded = keywords
            .into_iter()
            .map(|k| k.as_ref().trim().to_lowercase())
            .filter(|k| !k.is_empty())
            .collect();
        Self { excluded }
    }

    pub fn is_empty(&self) -> bool {
        self.excluded.is_empty()
    }
}

impl Filter for KeywordFilter {
    fn matches(&self, item: &RawItem) -> bool {
        let title = item.title.to_lowercase();
        !self.excluded.iter().any(|k| title.contains(k.as_str()))
    }

    fn description(&self) -> String {
        format!("Excluding: {}", self.excluded.join(", "))
    }
}
