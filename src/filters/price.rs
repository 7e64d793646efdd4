//! Free and missing price filter.

use super::Filter;
use crate::catalog::normalize::is_free_label;
use crate::collect::RawItem;

/// Keeps only items that carry a paid price.
#[derive(Debug, Default)]
pub struct PricedFilter;

impl PricedFilter {
    pub fn new() -> Self {
        Self
    }
}

impl Filter for PricedFilter {
    fn matches(&self, item: &RawItem) -> bool {
        !item.price.as_deref().is_none_or(is_free_label)
    }

    fn description(&self) -> String {
        "Priced only".to_string()
    }
}
