//! CSS selectors for storefront and critic HTML parsing.
//!
//! Update this file when a site changes its markup, and add a fixture to the
//! adapter tests alongside.

use scraper::Selector;
use std::sync::LazyLock;

/// Steam search results and app pages.
pub mod steam {
    use super::*;

    /// One search result row; the row itself is the link to the app page.
    pub static RESULT_ROW: LazyLock<Selector> =
        LazyLock::new(|| Selector::parse("a.search_result_row").unwrap());

    pub static TITLE: LazyLock<Selector> =
        LazyLock::new(|| Selector::parse("span.title").unwrap());

    /// Current price after discounts.
    pub static FINAL_PRICE: LazyLock<Selector> =
        LazyLock::new(|| Selector::parse("div.discount_final_price").unwrap());

    /// Present on an app page when the item is downloadable content.
    pub static DLC_BUBBLE: LazyLock<Selector> = LazyLock::new(|| {
        Selector::parse("div.game_area_purchase div.game_area_dlc_bubble").unwrap()
    });
}

/// Metacritic browse pages.
pub mod metacritic {
    use super::*;

    pub static CARD: LazyLock<Selector> =
        LazyLock::new(|| Selector::parse("div.c-finderProductCard").unwrap());

    /// Element carrying the game name in its `data-title` attribute.
    pub static TITLE: LazyLock<Selector> =
        LazyLock::new(|| Selector::parse("div[data-title]").unwrap());

    pub static TITLE_ATTR: &str = "data-title";

    pub static SCORE: LazyLock<Selector> =
        LazyLock::new(|| Selector::parse("div.c-siteReviewScore span").unwrap());

    pub static LINK: LazyLock<Selector> = LazyLock::new(|| Selector::parse("a[href]").unwrap());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_selectors_parse() {
        // Forces every LazyLock so a malformed selector fails here
        let _ = &*steam::RESULT_ROW;
        let _ = &*steam::TITLE;
        let _ = &*steam::FINAL_PRICE;
        let _ = &*steam::DLC_BUBBLE;
        let _ = &*metacritic::CARD;
        let _ = &*metacritic::TITLE;
        let _ = &*metacritic::SCORE;
        let _ = &*metacritic::LINK;
    }
}
