//! Metacritic browse adapter. Pages are 1-based on the site; the scheduler's
//! zero-based index is shifted on the way out.

use crate::catalog::models::Source;
use crate::catalog::table::parse_score;
use crate::collect::{ListingSource, Page, RawItem};
use crate::config::Config;
use crate::error::{ExtractionError, FetchError, ValidationError};
use crate::sources::selectors::metacritic;
use crate::sources::{fill_template, origin, resolve_url, HttpFetcher};
use async_trait::async_trait;
use scraper::{ElementRef, Html};
use tracing::info;

pub struct MetacriticBrowse {
    http: HttpFetcher,
    browse_url: String,
}

impl MetacriticBrowse {
    pub fn new(http: HttpFetcher, config: &Config) -> Self {
        Self { http, browse_url: config.metacritic_browse_url.clone() }
    }

    fn page_url(&self, index: u32) -> String {
        fill_template(&self.browse_url, &[("page", (index + 1).to_string())])
    }
}

#[async_trait]
impl ListingSource for MetacriticBrowse {
    fn source(&self) -> Source {
        Source::Metacritic
    }

    async fn fetch_page(&self, index: u32) -> Result<Page, FetchError> {
        let url = self.page_url(index);
        info!("Fetching Metacritic page {} ({})", index + 1, url);

        let html = self.http.get_page(&url).await?;
        Ok(Page::new(parse_browse_page(&html, origin(&self.browse_url))))
    }

    async fn validate_item(&self, _item: &RawItem) -> Result<bool, ValidationError> {
        Ok(false)
    }
}

/// Extracts every product card in document order. Scores that are not numbers
/// (`tbd`) become `None`.
pub fn parse_browse_page(html: &str, origin: &str) -> Vec<Result<RawItem, ExtractionError>> {
    let document = Html::parse_document(html);
    document.select(&metacritic::CARD).map(|card| parse_card(card, origin)).collect()
}

fn parse_card(card: ElementRef, origin: &str) -> Result<RawItem, ExtractionError> {
    let title = card
        .select(&metacritic::TITLE)
        .next()
        .and_then(|el| el.value().attr(metacritic::TITLE_ATTR))
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .ok_or_else(|| ExtractionError::missing("title"))?;

    let score = card
        .select(&metacritic::SCORE)
        .next()
        .and_then(|el| parse_score(el.text().collect::<String>().trim()));

    let url = card
        .select(&metacritic::LINK)
        .next()
        .and_then(|el| el.value().attr("href"))
        .map(|href| resolve_url(origin, href));

    Ok(RawItem { title, price: None, url, score })
}
