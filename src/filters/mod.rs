//! Composable item filters applied before validation.

pub mod keyword;
pub mod price;

use crate::collect::RawItem;

pub use keyword::KeywordFilter;
pub use price::PricedFilter;

/// Trait for filtering raw listings.
pub trait Filter: Send + Sync {
    /// Returns true if the item passes the filter.
    fn matches(&self, item: &RawItem) -> bool;

    /// Returns a description of this filter.
    fn description(&self) -> String;
}

/// A chain of filters that must all pass.
pub struct FilterChain {
    filters: Vec<Box<dyn Filter>>,
}

impl FilterChain {
    /// Creates an empty filter chain.
    pub fn new() -> Self {
        Self { filters: Vec::new() }
    }

    /// Adds a filter to the chain.
    pub fn add(&mut self, filter: impl Filter + 'static) -> &mut Self {
        self.filters.push(Box::new(filter));
        self
    }

    /// Checks if an item passes all filters.
    pub fn matches(&self, item: &RawItem) -> bool {
        self.filters.iter().all(|f| f.matches(item))
    }

    /// Returns true if no filters are configured.
    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    /// Returns descriptions of all filters.
    pub fn descriptions(&self) -> Vec<String> {
        self.filters.iter().map(|f| f.description()).collect()
    }
}

impl Default for FilterChain {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for constructing a FilterChain from configuration.
pub struct FilterChainBuilder {
    chain: FilterChain,
}

impl FilterChainBuilder {
    /// Creates a new builder.
    pub fn new() -> Self {
        Self { chain: FilterChain::new() }
    }

    /// Drops items whose price is free or missing.
    pub fn priced_only(mut self, enabled: bool) -> Self {
        if enabled {
            self.chain.add(PricedFilter::new());
        }
        self
    }

    /// Drops items whose title contains any of `keywords`.
    pub fn exclude_keywords(mut self, keywords: &[String]) -> Self {
        let filter = KeywordFilter::new(keywords);
        if !filter.is_empty() {
            self.chain.add(filter);
        }
        self
    }

    /// Builds the filter chain.
    pub fn build(self) -> FilterChain {
        self.chain
    }
}

impl Default for FilterChainBuilder {
    fn default() -> Self {
        Self::new()
    }
}
