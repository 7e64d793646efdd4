//! Paginated collection: source capability, scheduler, and output sinks.

pub mod scheduler;
pub mod sink;

use crate::catalog::models::{ListingRecord, Source};
use crate::error::{ExtractionError, FetchError, ValidationError};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

pub use scheduler::{CollectionScheduler, RunReport, ScheduleOptions, Termination};
pub use sink::{CsvSink, ListingSink, MemorySink};

/// One raw listing as extracted from a source page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawItem {
    pub title: String,
    pub price: Option<String>,
    pub url: Option<String>,
    pub score: Option<u32>,
}

impl RawItem {
    /// Storefront item with a price.
    pub fn priced(title: impl Into<String>, price: Option<&str>, url: Option<&str>) -> Self {
        Self {
            title: title.into(),
            price: price.map(String::from),
            url: url.map(String::from),
            score: None,
        }
    }

    /// Converts into an immutable listing record for `source`.
    pub fn into_record(self, source: Source) -> ListingRecord {
        ListingRecord::new(source, self.title, self.price, self.url, self.score)
    }
}

/// One fetched page. Each item is parsed independently.
#[derive(Debug, Default)]
pub struct Page {
    pub items: Vec<Result<RawItem, ExtractionError>>,
    /// The source reported that no further pages exist.
    pub exhausted: bool,
}

impl Page {
    pub fn new(items: Vec<Result<RawItem, ExtractionError>>) -> Self {
        Self { items, exhausted: false }
    }

    pub fn last(items: Vec<Result<RawItem, ExtractionError>>) -> Self {
        Self { items, exhausted: true }
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// A paginated listing source. Implemented by HTTP adapters and test mocks.
#[async_trait]
pub trait ListingSource: Send + Sync {
    /// Which source this adapter collects.
    fn source(&self) -> Source;

    /// Fetches page `index` (zero-based).
    async fn fetch_page(&self, index: u32) -> Result<Page, FetchError>;

    /// Secondary check for one item. `Ok(true)` excludes it.
    async fn validate_item(&self, item: &RawItem) -> Result<bool, ValidationError>;
}

/// What to do with an item whose validation did not produce a verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValidationPolicy {
    /// Keep the item (fail-open).
    Accept,
    /// Drop the item (fail-closed).
    Reject,
}

impl ValidationPolicy {
    pub fn excludes(&self) -> bool {
        matches!(self, ValidationPolicy::Reject)
    }
}

impl FromStr for ValidationPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "accept" | "open" => Ok(ValidationPolicy::Accept),
            "reject" | "closed" => Ok(ValidationPolicy::Reject),
            _ => Err(format!("Unknown validation policy: {}. Use: accept, reject", s)),
        }
    }
}

impl fmt::Display for ValidationPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationPolicy::Accept => write!(f, "accept"),
            ValidationPolicy::Reject => write!(f, "reject"),
        }
    }
}

/// Cooperative cancellation checked between pages.
#[derive(Debug, Clone, Default)]
pub struct Cancellation {
    flag: Arc<AtomicBool>,
}

impl Cancellation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raw_item_into_record() {
        let item = RawItem::priced(" Portal 2 ", Some("₺50"), Some("https://s/portal2"));
        let record = item.into_record(Source::Steam);
        assert_eq!(record.display_name(), " Portal 2 ");
        assert_eq!(record.normalized_name(), "portal 2");
        assert_eq!(record.price(), Some("₺50"));
    }

    #[test]
    fn test_page_constructors() {
        assert!(!Page::new(Vec::new()).exhausted);
        assert!(Page::last(Vec::new()).exhausted);
        assert!(Page::default().is_empty());
    }

    #[test]
    fn test_validation_policy_parsing() {
        assert_eq!("accept".parse::<ValidationPolicy>().unwrap(), ValidationPolicy::Accept);
        assert_eq!("CLOSED".parse::<ValidationPolicy>().unwrap(), ValidationPolicy::Reject);
        assert!("maybe".parse::<ValidationPolicy>().unwrap_err().contains("Unknown"));
        assert!(ValidationPolicy::Reject.excludes());
        assert!(!ValidationPolicy::Accept.excludes());
        assert_eq!(ValidationPolicy::Reject.to_string(), "reject");
    }

    #[test]
    fn test_cancellation_shared() {
        let cancel = Cancellation::new();
        let handle = cancel.clone();
        assert!(!cancel.is_cancelled());
        handle.cancel();
        assert!(cancel.is_cancelled());
    }
}
