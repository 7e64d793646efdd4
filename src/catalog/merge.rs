//! Reconciles per-source listings into one catalog entry per primary game.

use crate::catalog::matcher::{CandidatePool, DEFAULT_THRESHOLD};
use crate::catalog::models::{CatalogEntry, ListingRecord, Offer, Source};
use crate::catalog::normalize::is_free_or_absent;
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, info, trace};

/// Sources whose offers appear in merged output, in column order.
pub const OFFER_SOURCES: [Source; 2] = [Source::Steam, Source::Epic];

/// Normalized-name index over one secondary source.
struct SourceIndex<'a> {
    records: &'a [ListingRecord],
    by_key: HashMap<&'a str, usize>,
    pool: CandidatePool,
}

impl<'a> SourceIndex<'a> {
    fn new(records: &'a [ListingRecord]) -> Self {
        let mut by_key = HashMap::with_capacity(records.len());
        for (idx, record) in records.iter().enumerate() {
            // First occurrence wins for duplicate keys
            by_key.entry(record.normalized_name()).or_insert(idx);
        }
        let pool = CandidatePool::new(records.iter().map(|r| r.normalized_name()));
        Self { records, by_key, pool }
    }

    /// Exact lookup first, fuzzy resolution over all keys second.
    fn find(&self, key: &str, threshold: u8) -> Option<(&'a ListingRecord, MatchKind)> {
        if let Some(&idx) = self.by_key.get(key) {
            return Some((&self.records[idx], MatchKind::Exact));
        }

        let candidate = self.pool.resolve(key, threshold)?;
        let idx = self.by_key.get(candidate.key).copied().unwrap_or(candidate.index);
        trace!("Fuzzy matched '{}' -> '{}' ({:.1})", key, candidate.key, candidate.score);
        Some((&self.records[idx], MatchKind::Fuzzy))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MatchKind {
    Exact,
    Fuzzy,
}

/// Counts of how each primary record was matched.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeStats {
    pub exact: usize,
    pub fuzzy: usize,
    pub unmatched: usize,
}

impl MergeStats {
    fn record(&mut self, kind: Option<MatchKind>) {
        match kind {
            Some(MatchKind::Exact) => self.exact += 1,
            Some(MatchKind::Fuzzy) => self.fuzzy += 1,
            None => self.unmatched += 1,
        }
    }
}

/// Merges a primary storefront with a critic source and a second storefront.
#[derive(Debug, Clone, Copy)]
pub struct CatalogMerger {
    threshold: u8,
}

impl Default for CatalogMerger {
    fn default() -> Self {
        Self::new(DEFAULT_THRESHOLD)
    }
}

impl CatalogMerger {
    /// Creates a merger with the given fuzzy-match threshold (0-100).
    pub fn new(threshold: u8) -> Self {
        Self { threshold: threshold.min(100) }
    }

    pub fn threshold(&self) -> u8 {
        self.threshold
    }

    /// Emits one entry per primary record, in primary order.
    pub fn merge(
        &self,
        primary: &[ListingRecord],
        critic: &[ListingRecord],
        storefront: &[ListingRecord],
    ) -> Vec<CatalogEntry> {
        self.merge_with_stats(primary, critic, storefront).0
    }

    /// Like [`merge`](Self::merge), also reporting per-source match counts.
    pub fn merge_with_stats(
        &self,
        primary: &[ListingRecord],
        critic: &[ListingRecord],
        storefront: &[ListingRecord],
    ) -> (Vec<CatalogEntry>, [MergeStats; 2]) {
        let critic_index = SourceIndex::new(critic);
        let store_index = SourceIndex::new(storefront);
        let mut critic_stats = MergeStats::default();
        let mut store_stats = MergeStats::default();

        let entries = primary
            .iter()
            .map(|record| {
                let key = record.normalized_name();

                let critic_match = critic_index.find(key, self.threshold);
                critic_stats.record(critic_match.map(|(_, kind)| kind));

                let store_match = store_index.find(key, self.threshold);
                store_stats.record(store_match.map(|(_, kind)| kind));

                let critic_record = critic_match.map(|(r, _)| r);
                let store_record = store_match.map(|(r, _)| r);

                let mut offers = BTreeMap::new();
                offers.insert(record.source(), offer_for(record));
                if let Some(store) = store_record {
                    offers.insert(store.source(), offer_for(store));
                } else if let Some(source) = storefront.first().map(ListingRecord::source) {
                    offers.insert(source, Offer::absent());
                }

                let score = critic_record
                    .and_then(ListingRecord::score)
                    .or(record.score())
                    .or(store_record.and_then(ListingRecord::score));

                CatalogEntry { name: record.display_name().to_string(), offers, score }
            })
            .collect::<Vec<_>>();

        debug!("Critic matches: {:?}", critic_stats);
        debug!("Storefront matches: {:?}", store_stats);
        info!("Merged {} catalog entries", entries.len());

        (entries, [critic_stats, store_stats])
    }
}

/// Price and link for a storefront record; free or missing prices drop both.
fn offer_for(record: &ListingRecord) -> Offer {
    if is_free_or_absent(record.price()) {
        return Offer::absent();
    }
    Offer { price: record.price().map(String::from), url: record.url().map(String::from) }
}

/// Merges with the conventional source roles and a given threshold.
pub fn merge(
    primary: &[ListingRecord],
    critic: &[ListingRecord],
    storefront: &[ListingRecord],
    threshold: u8,
) -> Vec<CatalogEntry> {
    CatalogMerger::new(threshold).merge(primary, critic, storefront)
}
