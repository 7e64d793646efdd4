//! Data models for source listings and merged catalog entries.

use crate::catalog::normalize::normalize;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Listing sources known to the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    /// Primary storefront; its display names become canonical names.
    Steam,
    /// Critic-score source.
    Metacritic,
    /// Secondary storefront.
    Epic,
}

impl Source {
    /// Whether listings from this source carry a purchase price.
    pub fn is_storefront(&self) -> bool {
        matches!(self, Source::Steam | Source::Epic)
    }

    /// Label of the second column in this source's table.
    pub fn value_column(&self) -> &'static str {
        if self.is_storefront() {
            "price"
        } else {
            "score"
        }
    }

    /// Short description for listings.
    pub fn role(&self) -> &'static str {
        match self {
            Source::Steam => "primary storefront",
            Source::Metacritic => "critic scores",
            Source::Epic => "secondary storefront",
        }
    }

    /// Returns all sources.
    pub fn all() -> &'static [Source] {
        &[Source::Steam, Source::Metacritic, Source::Epic]
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Source::Steam => "steam",
            Source::Metacritic => "metacritic",
            Source::Epic => "epic",
        };
        write!(f, "{}", name)
    }
}

impl FromStr for Source {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "steam" => Ok(Source::Steam),
            "metacritic" | "mc" => Ok(Source::Metacritic),
            "epic" => Ok(Source::Epic),
            _ => Err(format!("Unknown source: {}. Use: steam, metacritic, epic", s)),
        }
    }
}

/// One listing collected from a source. Immutable once created.
#[derive(Debug, Clone, PartialEq)]
pub struct ListingRecord {
    source: Source,
    display_name: String,
    normalized_name: String,
    price: Option<String>,
    url: Option<String>,
    score: Option<u32>,
}

impl ListingRecord {
    /// Creates a record; the comparison key is derived from `display_name`.
    pub fn new(
        source: Source,
        display_name: impl Into<String>,
        price: Option<String>,
        url: Option<String>,
        score: Option<u32>,
    ) -> Self {
        let display_name = display_name.into();
        let normalized_name = normalize(&display_name);
        Self { source, display_name, normalized_name, price, url, score }
    }

    /// Storefront listing with a price.
    pub fn storefront(
        source: Source,
        display_name: impl Into<String>,
        price: Option<&str>,
        url: Option<&str>,
    ) -> Self {
        Self::new(source, display_name, price.map(String::from), url.map(String::from), None)
    }

    /// Critic listing with a score.
    pub fn critic(display_name: impl Into<String>, score: Option<u32>, url: Option<&str>) -> Self {
        Self::new(Source::Metacritic, display_name, None, url.map(String::from), score)
    }

    pub fn source(&self) -> Source {
        self.source
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    /// Comparison key. Used for matching only, never written to output.
    pub fn normalized_name(&self) -> &str {
        &self.normalized_name
    }

    pub fn price(&self) -> Option<&str> {
        self.price.as_deref()
    }

    pub fn url(&self) -> Option<&str> {
        self.url.as_deref()
    }

    pub fn score(&self) -> Option<u32> {
        self.score
    }
}

/// Price and purchase link for one storefront in a merged entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Offer {
    pub price: Option<String>,
    pub url: Option<String>,
}

impl Offer {
    /// An offer with neither price nor link.
    pub fn absent() -> Self {
        Self::default()
    }

    pub fn is_priced(&self) -> bool {
        self.price.is_some()
    }
}

/// One merged catalog row per primary-source game. Write-once.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogEntry {
    /// Canonical name, always the primary source's display name
    pub name: String,
    /// Storefront offers keyed by source
    pub offers: BTreeMap<Source, Offer>,
    /// Critic score if any matched source carries one
    pub score: Option<u32>,
}

impl CatalogEntry {
    /// Returns the offer for a storefront, or an absent offer.
    pub fn offer(&self, source: Source) -> Offer {
        self.offers.get(&source).cloned().unwrap_or_default()
    }

    pub fn price(&self, source: Source) -> Option<&str> {
        self.offers.get(&source).and_then(|o| o.price.as_deref())
    }

    pub fn url(&self, source: Source) -> Option<&str> {
        self.offers.get(&source).and_then(|o| o.url.as_deref())
    }

    /// True if at least one storefront lists a paid price.
    pub fn has_any_price(&self) -> bool {
        self.offers.values().any(Offer::is_priced)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_derives_normalized_name() {
        let record =
            ListingRecord::storefront(Source::Steam, "  Hades II ", Some("₺199,99"), None);
        assert_eq!(record.display_name(), "  Hades II ");
        assert_eq!(record.normalized_name(), "hades ii");
        assert_eq!(record.price(), Some("₺199,99"));
        assert!(record.url().is_none());
        assert!(record.score().is_none());
    }

    #[test]
    fn test_critic_record() {
        let record = ListingRecord::critic("Hades", Some(93), Some("https://mc/game/hades"));
        assert_eq!(record.source(), Source::Metacritic);
        assert_eq!(record.score(), Some(93));
        assert!(record.price().is_none());
    }

    #[test]
    fn test_source_parsing() {
        assert_eq!("steam".parse::<Source>().unwrap(), Source::Steam);
        assert_eq!("EPIC".parse::<Source>().unwrap(), Source::Epic);
        assert_eq!("mc".parse::<Source>().unwrap(), Source::Metacritic);

        let err = "gog".parse::<Source>().unwrap_err();
        assert!(err.contains("Unknown source"));
    }

    #[test]
    fn test_source_roles() {
        assert!(Source::Steam.is_storefront());
        assert!(Source::Epic.is_storefront());
        assert!(!Source::Metacritic.is_storefront());
        assert_eq!(Source::Metacritic.value_column(), "score");
        assert_eq!(Source::all().len(), 3);
        assert_eq!(Source::Epic.to_string(), "epic");
    }

    #[test]
    fn test_entry_accessors() {
        let mut offers = BTreeMap::new();
        offers.insert(
            Source::Steam,
            Offer { price: Some("₺99".to_string()), url: Some("https://s/1".to_string()) },
        );
        offers.insert(Source::Epic, Offer::absent());
        let entry = CatalogEntry { name: "Portal 2".to_string(), offers, score: Some(95) };

        assert_eq!(entry.price(Source::Steam), Some("₺99"));
        assert_eq!(entry.url(Source::Steam), Some("https://s/1"));
        assert!(entry.price(Source::Epic).is_none());
        assert_eq!(entry.offer(Source::Metacritic), Offer::absent());
        assert!(entry.has_any_price());
    }

    #[test]
    fn test_entry_without_prices() {
        let entry =
            CatalogEntry { name: "Dota 2".to_string(), offers: BTreeMap::new(), score: None };
        assert!(!entry.has_any_price());
    }
}
