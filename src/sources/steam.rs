//! Steam storefront adapter: paginated top-seller search plus a DLC check on
//! each candidate's app page.

use crate::catalog::models::Source;
use crate::collect::{ListingSource, Page, RawItem};
use crate::config::Config;
use crate::error::{ExtractionError, FetchError, ValidationError};
use crate::sources::selectors::steam;
use crate::sources::{fill_template, origin, resolve_url, HttpFetcher};
use async_trait::async_trait;
use scraper::{ElementRef, Html};
use tracing::{debug, info};

pub struct SteamStore {
    http: HttpFetcher,
    search_url: String,
    page_size: u32,
    term: Option<String>,
}

impl SteamStore {
    pub fn new(http: HttpFetcher, config: &Config) -> Self {
        Self {
            http,
            search_url: config.steam_search_url.clone(),
            page_size: config.page_size,
            term: None,
        }
    }

    /// Restricts the search to a query term.
    pub fn with_term(mut self, term: Option<String>) -> Self {
        self.term = term.filter(|t| !t.trim().is_empty());
        self
    }

    fn page_url(&self, index: u32) -> String {
        let start = index.saturating_mul(self.page_size);
        let mut url = fill_template(
            &self.search_url,
            &[("start", start.to_string()), ("count", self.page_size.to_string())],
        );

        if let Some(term) = &self.term {
            url.push(if url.contains('?') { '&' } else { '?' });
            url.push_str("term=");
            url.push_str(&urlencoding::encode(term));
        }
        url
    }
}

#[async_trait]
impl ListingSource for SteamStore {
    fn source(&self) -> Source {
        Source::Steam
    }

    async fn fetch_page(&self, index: u32) -> Result<Page, FetchError> {
        let url = self.page_url(index);
        info!("Fetching Steam page {} ({})", index, url);

        let html = self.http.get_page(&url).await?;
        Ok(Page::new(parse_search_results(&html, origin(&self.search_url))))
    }

    /// Excludes downloadable content.
    async fn validate_item(&self, item: &RawItem) -> Result<bool, ValidationError> {
        let Some(url) = item.url.as_deref() else {
            return Err(ValidationError::Failed("listing has no store page URL".to_string()));
        };

        let html =
            self.http.get(url).await.map_err(|e| ValidationError::Failed(e.to_string()))?;

        let dlc = is_dlc_page(&html);
        if dlc {
            debug!("DLC: {}", item.title);
        }
        Ok(dlc)
    }
}

/// Extracts every search result row in document order.
pub fn parse_search_results(html: &str, origin: &str) -> Vec<Result<RawItem, ExtractionError>> {
    let document = Html::parse_document(html);
    document.select(&steam::RESULT_ROW).map(|row| parse_row(row, origin)).collect()
}

fn parse_row(row: ElementRef, origin: &str) -> Result<RawItem, ExtractionError> {
    let title = row
        .select(&steam::TITLE)
        .next()
        .map(|el| el.text().collect::<String>().trim().to_string())
        .filter(|t| !t.is_empty())
        .ok_or_else(|| ExtractionError::missing("title"))?;

    let price = row
        .select(&steam::FINAL_PRICE)
        .next()
        .map(|el| el.text().collect::<String>().trim().to_string())
        .filter(|p| !p.is_empty());

    let url = row.value().attr("href").map(|href| resolve_url(origin, href));

    Ok(RawItem { title, price, url, score: None })
}

/// True when an app page carries the DLC notice in its purchase area.
pub fn is_dlc_page(html: &str) -> bool {
    Html::parse_document(html).select(&steam::DLC_BUBBLE).next().is_some()
}
